//! ELF symbol tables as a host environment
//!
//! Reads each module's file from disk to answer two questions: what does the
//! module export, and which function covers a given runtime address. Runtime
//! addresses are translated to link-time addresses through the module base
//! and the lowest loadable segment, which covers both PIE/shared objects
//! (linked at 0) and fixed-address executables.

use addr2line::Context;
use anyhow::{Context as _, Result};
use gimli::{EndianRcSlice, RunTimeEndian};
use log::{debug, warn};
use object::elf::STT_GNU_IFUNC;
use object::{
    Object, ObjectSection, ObjectSegment, ObjectSymbol, SymbolFlags, SymbolKind, SymbolScope, SymbolSection,
};
use rustc_demangle::demangle;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::rc::Rc;

use crate::domain::{Export, ExportKind, HostError, Module};
use crate::host::{AddressResolver, ExportEnumerator, SnapshotProvider};

const PAGE_MASK: u64 = !0xfff;

/// ELF-backed export enumeration and address symbolization
///
/// Each module's file is parsed on first use and kept for the lifetime of
/// the symbolizer. Files that cannot be read or parsed are remembered as
/// empty so the warning is only logged once.
pub struct ElfSymbolizer {
    modules: Vec<Module>,
    /// Parsed symbol tables by module path
    cache: RefCell<HashMap<String, Option<Rc<ModuleSymbols>>>>,
}

impl ElfSymbolizer {
    /// Create a symbolizer covering the given modules
    #[must_use]
    pub fn new(modules: Vec<Module>) -> Self {
        Self { modules, cache: RefCell::new(HashMap::new()) }
    }

    /// Create a symbolizer covering every module the provider reports
    pub fn for_snapshot<P: SnapshotProvider + ?Sized>(provider: &P) -> Self {
        Self::new(provider.modules())
    }

    /// Demangle a Rust symbol name; other names pass through unchanged
    #[must_use]
    pub fn demangle_symbol(symbol: &str) -> String {
        format!("{:#}", demangle(symbol))
    }

    fn module_at(&self, address: u64) -> Option<&Module> {
        self.modules.iter().find(|m| m.range().contains(address))
    }

    fn symbols_for(&self, module: &Module) -> Option<Rc<ModuleSymbols>> {
        if let Some(cached) = self.cache.borrow().get(&module.path) {
            return cached.clone();
        }

        let loaded = match ModuleSymbols::load(&module.path) {
            Ok(symbols) => {
                debug!(
                    "{}: {} exports, {} function symbols, dwarf: {}",
                    module.path,
                    symbols.exports.len(),
                    symbols.functions.len(),
                    symbols.dwarf.is_some()
                );
                Some(Rc::new(symbols))
            }
            Err(e) => {
                warn!("{e}");
                None
            }
        };

        self.cache.borrow_mut().insert(module.path.clone(), loaded.clone());
        loaded
    }
}

impl ExportEnumerator for ElfSymbolizer {
    fn enumerate_exports(&self, module: &Module) -> Vec<Export> {
        let Some(symbols) = self.symbols_for(module) else {
            return Vec::new();
        };

        symbols
            .exports
            .iter()
            .map(|export| Export {
                name: export.name.clone(),
                kind: export.kind,
                address: symbols.to_runtime(module, export.address),
            })
            .collect()
    }
}

impl AddressResolver for ElfSymbolizer {
    fn symbol_name_at(&self, address: u64) -> Option<String> {
        let module = self.module_at(address)?;
        let symbols = self.symbols_for(module)?;
        let link_addr = symbols.to_link(module, address);

        symbols
            .function_at(link_addr)
            .map(|f| Self::demangle_symbol(&f.name))
            .or_else(|| symbols.dwarf_function_at(link_addr))
    }
}

/// Export as found in the file, at its link-time address
struct LinkedExport {
    name: String,
    kind: ExportKind,
    address: u64,
}

/// Function symbol from `.symtab` or `.dynsym`, at its link-time address
struct FunctionSymbol {
    start: u64,
    size: u64,
    name: String,
}

/// Everything needed to answer queries about one module file
struct ModuleSymbols {
    /// Page-aligned address of the lowest loadable segment
    link_base: u64,
    exports: Vec<LinkedExport>,
    /// Sorted by start address, one entry per address
    functions: Vec<FunctionSymbol>,
    dwarf: Option<Context<EndianRcSlice<RunTimeEndian>>>,
}

impl ModuleSymbols {
    fn load(path: &str) -> Result<Self, HostError> {
        let binary_data = fs::read(path)
            .map_err(|source| HostError::BinaryUnreadable { path: path.to_string(), source })?;

        let obj = object::File::parse(&*binary_data).map_err(|e| HostError::BinaryUnparsable {
            path: path.to_string(),
            reason: e.to_string(),
        })?;

        let link_base = obj.segments().map(|s| s.address()).min().unwrap_or(0) & PAGE_MASK;

        let exports = obj
            .dynamic_symbols()
            .filter(|sym| is_defined(sym) && sym.scope() == SymbolScope::Dynamic)
            .filter_map(|sym| {
                let name = sym.name().ok().filter(|n| !n.is_empty())?;
                Some(LinkedExport {
                    name: name.to_string(),
                    kind: export_kind(sym.kind(), elf_type(&sym)),
                    address: sym.address(),
                })
            })
            .collect();

        let mut functions: Vec<FunctionSymbol> = obj
            .symbols()
            .chain(obj.dynamic_symbols())
            .filter(|sym| {
                is_defined(sym) && export_kind(sym.kind(), elf_type(sym)) == ExportKind::Function
            })
            .filter_map(|sym| {
                let name = sym.name().ok().filter(|n| !n.is_empty())?;
                Some(FunctionSymbol { start: sym.address(), size: sym.size(), name: name.to_string() })
            })
            .collect();
        // Stable sort keeps .symtab names ahead of .dynsym aliases
        functions.sort_by_key(|f| f.start);
        functions.dedup_by_key(|f| f.start);

        let has_debug_info = obj.section_by_name(".debug_info").is_some_and(|s| s.size() > 0);
        let dwarf = if has_debug_info {
            load_dwarf(&obj).map_err(|e| warn!("{path}: {e:#}")).ok()
        } else {
            None
        };

        Ok(Self { link_base, exports, functions, dwarf })
    }

    fn to_runtime(&self, module: &Module, link_addr: u64) -> u64 {
        module.base.wrapping_add(link_addr.wrapping_sub(self.link_base))
    }

    fn to_link(&self, module: &Module, runtime_addr: u64) -> u64 {
        runtime_addr.wrapping_sub(module.base).wrapping_add(self.link_base)
    }

    /// Function whose extent covers `addr`; zero-sized symbols only match exactly
    fn function_at(&self, addr: u64) -> Option<&FunctionSymbol> {
        let idx = self.functions.partition_point(|f| f.start <= addr);
        let candidate = self.functions.get(idx.checked_sub(1)?)?;
        let end = candidate.start.saturating_add(candidate.size.max(1));
        (addr < end).then_some(candidate)
    }

    /// Outermost (non-inlined) function DWARF places at `addr`
    fn dwarf_function_at(&self, addr: u64) -> Option<String> {
        let ctx = self.dwarf.as_ref()?;
        let mut frame_iter = ctx.find_frames(addr).skip_all_loads().ok()?;

        let mut outermost = None;
        while let Ok(Some(frame)) = frame_iter.next() {
            if let Some(function) = frame.function.and_then(|f| f.demangle().ok().map(|s| s.to_string())) {
                outermost = Some(function);
            }
        }
        outermost
    }
}

/// Backed by a section of the file; undefined, absolute and common symbols are not
fn is_defined<'data>(sym: &impl ObjectSymbol<'data>) -> bool {
    !sym.is_undefined() && matches!(sym.section(), SymbolSection::Section(_))
}

/// Raw ELF `st_type` of the symbol
fn elf_type<'data>(sym: &impl ObjectSymbol<'data>) -> Option<u8> {
    match sym.flags() {
        SymbolFlags::Elf { st_info, .. } => Some(st_info & 0xf),
        _ => None,
    }
}

// IFUNC resolvers (strlen, memcpy, ... in glibc) are called like any other function
fn export_kind(kind: SymbolKind, elf_type: Option<u8>) -> ExportKind {
    if elf_type == Some(STT_GNU_IFUNC) {
        return ExportKind::Function;
    }
    match kind {
        SymbolKind::Text => ExportKind::Function,
        SymbolKind::Data | SymbolKind::Tls => ExportKind::Data,
        _ => ExportKind::Other,
    }
}

fn load_dwarf(obj: &object::File<'_>) -> Result<Context<EndianRcSlice<RunTimeEndian>>> {
    let endian = if obj.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

    let load_section = |id: gimli::SectionId| -> Result<EndianRcSlice<RunTimeEndian>, gimli::Error> {
        let data = obj
            .section_by_name(id.name())
            .and_then(|section| section.uncompressed_data().ok())
            .unwrap_or(std::borrow::Cow::Borrowed(&[][..]));
        Ok(EndianRcSlice::new(Rc::from(&*data), endian))
    };

    let dwarf = gimli::Dwarf::load(&load_section)?;
    Context::from_dwarf(dwarf).context("Failed to load DWARF debug information")
}
