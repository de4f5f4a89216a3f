use crossbeam_channel::unbounded;
use modmon::domain::{ExportKind, Module, Pid};
use modmon::host::{AddressResolver, ExportEnumerator, SnapshotProvider};
use modmon::symbolization::{attach, ElfSymbolizer, ProcessMaps};
use modmon_common::{ModuleRef, OutboundMessage, ResolveSymbolsQuery};
use std::io::Write;

#[inline(never)]
fn modmon_test_marker(x: u64) -> u64 {
    x.wrapping_mul(31).wrapping_add(7)
}

#[test]
fn test_attach_to_self_publishes_main_module() {
    let (tx, rx) = unbounded();
    let monitor = attach(Pid::current(), &tx).expect("Failed to attach to own process");

    let messages: Vec<OutboundMessage> = rx.try_iter().collect();
    assert_eq!(messages.len(), 1);
    let OutboundMessage::ModulesUpdate(records) = &messages[0];

    let exe = std::env::current_exe().expect("Failed to get current exe");
    assert_eq!(records[0].path, exe.to_string_lossy());
    assert!(records[0].is_main());
    assert!(records[1..].iter().all(|r| r.main.is_none()));
    assert_eq!(records.len(), monitor.snapshot().len());
}

#[test]
fn test_resolves_own_function() {
    let (tx, _rx) = unbounded();
    let monitor = attach(Pid::current(), &tx).expect("Failed to attach to own process");

    let main = &monitor.snapshot().modules()[0];
    assert_eq!(modmon_test_marker(1), 38);
    let address = modmon_test_marker as usize as u64;
    assert!(main.range().contains(address), "marker not inside {}", main.path);

    let offset = i64::try_from(address - main.base).unwrap();
    let symbols = monitor
        .resolve_symbols(&ResolveSymbolsQuery { module: main.path.clone(), offsets: vec![offset, offset] })
        .unwrap();

    assert_eq!(symbols.len(), 2);
    let name = symbols[0].as_deref().expect("marker address did not resolve");
    assert!(name.ends_with("modmon_test_marker"), "resolved to {name}");
    assert_eq!(symbols[0], symbols[1]);
}

#[test]
fn test_libc_exports_malloc() {
    let maps = ProcessMaps::capture(Pid::current()).expect("Failed to read own maps");
    let Some(libc) = maps.modules().into_iter().find(|m| m.name.starts_with("libc.so")) else {
        println!("libc is not dynamically mapped here, skipping");
        return;
    };

    let (tx, _rx) = unbounded();
    let monitor = attach(Pid::current(), &tx).expect("Failed to attach to own process");

    let functions = monitor.get_functions(&ModuleRef { name: libc.name.clone() }).unwrap();
    let malloc = functions.iter().find(|f| f.name() == "malloc").expect("malloc not exported");
    assert!(malloc.offset() > 0);

    // Data exports never show up as functions
    let symbolizer = ElfSymbolizer::for_snapshot(&maps);
    let data: Vec<String> = symbolizer
        .enumerate_exports(&libc)
        .into_iter()
        .filter(|e| e.kind == ExportKind::Data)
        .map(|e| e.name)
        .collect();
    assert!(functions.iter().all(|f| !data.iter().any(|d| d == f.name())));

    let symbols = monitor
        .resolve_symbols(&ResolveSymbolsQuery {
            module: libc.path.clone(),
            offsets: vec![i64::from(malloc.offset())],
        })
        .unwrap();
    let name = symbols[0].as_deref().expect("malloc address did not resolve");
    assert!(name.contains("malloc"), "resolved to {name}");
}

#[test]
fn test_libc_exports_indirect_and_versioned_functions() {
    let maps = ProcessMaps::capture(Pid::current()).expect("Failed to read own maps");
    let Some(libc) = maps.modules().into_iter().find(|m| m.name.starts_with("libc.so")) else {
        println!("libc is not dynamically mapped here, skipping");
        return;
    };

    let (tx, _rx) = unbounded();
    let monitor = attach(Pid::current(), &tx).expect("Failed to attach to own process");
    let functions = monitor.get_functions(&ModuleRef { name: libc.name.clone() }).unwrap();

    // glibc dispatches these through GNU indirect functions
    for name in ["strlen", "memset", "strcmp"] {
        assert!(functions.iter().any(|f| f.name() == name), "{name} not exported");
    }

    // memcpy carries more than one symbol version; each one is a function
    let memcpy: Vec<_> = functions.iter().filter(|f| f.name() == "memcpy").collect();
    assert!(!memcpy.is_empty(), "memcpy not exported");
    assert!(memcpy.iter().all(|f| f.offset() > 0));

    let symbolizer = ElfSymbolizer::for_snapshot(&maps);
    let strlen = symbolizer
        .enumerate_exports(&libc)
        .into_iter()
        .find(|e| e.name == "strlen")
        .expect("strlen missing from exports");
    assert_eq!(strlen.kind, ExportKind::Function);

    let offset = functions.iter().find(|f| f.name() == "strlen").map(|f| i64::from(f.offset()));
    let symbols = monitor
        .resolve_symbols(&ResolveSymbolsQuery { module: libc.path.clone(), offsets: offset.into_iter().collect() })
        .unwrap();
    assert!(symbols[0].is_some(), "strlen address did not resolve");
}

#[test]
fn test_unparsable_module_yields_nothing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"definitely not an ELF file").unwrap();
    let path = file.path().to_string_lossy().into_owned();

    let module = Module { name: "garbage.so".to_string(), base: 0x10_0000, size: 0x1000, path };
    let symbolizer = ElfSymbolizer::new(vec![module.clone()]);

    assert!(symbolizer.enumerate_exports(&module).is_empty());
    assert!(symbolizer.symbol_name_at(0x10_0010).is_none());
    // Cached failure answers the same way
    assert!(symbolizer.enumerate_exports(&module).is_empty());
}

#[test]
fn test_missing_module_file_yields_nothing() {
    let module = Module {
        name: "gone.so".to_string(),
        base: 0x20_0000,
        size: 0x1000,
        path: "/nonexistent/path/gone.so".to_string(),
    };
    let symbolizer = ElfSymbolizer::new(vec![module.clone()]);

    assert!(symbolizer.enumerate_exports(&module).is_empty());
    assert!(symbolizer.symbol_name_at(0x20_0000).is_none());
}

#[test]
fn test_binary_exports_are_rebased() {
    let binary_path = env!("CARGO_BIN_EXE_modmon");
    let base = 0x5555_0000_0000;
    let module =
        Module { name: "modmon".to_string(), base, size: 0x1000_0000, path: binary_path.to_string() };
    let symbolizer = ElfSymbolizer::new(vec![module.clone()]);

    for export in symbolizer.enumerate_exports(&module) {
        assert!(export.address >= base, "{} at 0x{:x}", export.name, export.address);
    }
}
