#![allow(dead_code)]

use crossbeam_channel::{unbounded, Receiver};
use modmon::domain::{Export, ExportKind, Module};
use modmon::host::{AddressResolver, ExportEnumerator};
use modmon::ModuleMonitor;
use modmon_common::OutboundMessage;
use std::collections::HashMap;

/// In-memory host: exports keyed by module path, symbols keyed by address
#[derive(Clone, Default)]
pub struct FakeHost {
    pub exports: HashMap<String, Vec<Export>>,
    pub symbols: HashMap<u64, String>,
}

impl FakeHost {
    pub fn with_export(mut self, path: &str, name: &str, kind: ExportKind, address: u64) -> Self {
        self.exports.entry(path.to_string()).or_default().push(Export {
            name: name.to_string(),
            kind,
            address,
        });
        self
    }

    pub fn with_symbol(mut self, address: u64, name: &str) -> Self {
        self.symbols.insert(address, name.to_string());
        self
    }
}

impl ExportEnumerator for FakeHost {
    fn enumerate_exports(&self, module: &Module) -> Vec<Export> {
        self.exports.get(&module.path).cloned().unwrap_or_default()
    }
}

impl AddressResolver for FakeHost {
    fn symbol_name_at(&self, address: u64) -> Option<String> {
        self.symbols.get(&address).cloned()
    }
}

pub fn module(name: &str, base: u64, size: u64, path: &str) -> Module {
    Module { name: name.to_string(), base, size, path: path.to_string() }
}

/// `main.exe` at 0x1000 followed by `lib.so` at 0x5000
pub fn scenario_snapshot() -> Vec<Module> {
    vec![
        module("main.exe", 0x1000, 0x2000, "/bin/main.exe"),
        module("lib.so", 0x5000, 0x800, "/lib/lib.so"),
    ]
}

/// `lib.so` exports `foo` (function) and `bar` (data); only 0x5010 has a symbol
pub fn scenario_host() -> FakeHost {
    FakeHost::default()
        .with_export("/lib/lib.so", "foo", ExportKind::Function, 0x5010)
        .with_export("/lib/lib.so", "bar", ExportKind::Data, 0x5020)
        .with_symbol(0x5010, "foo")
}

pub type FakeMonitor = ModuleMonitor<FakeHost, FakeHost>;

pub fn monitor_with(modules: &[Module], host: &FakeHost) -> (FakeMonitor, Receiver<OutboundMessage>) {
    let (tx, rx) = unbounded();
    let monitor = ModuleMonitor::new(modules, host.clone(), host.clone(), &tx);
    (monitor, rx)
}
