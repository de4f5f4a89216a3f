//! # Linux Host Environment
//!
//! Real implementations of the [`crate::host`] traits for a live Linux
//! process:
//!
//! - **`memory_maps`**: Module discovery
//!   - Parses `/proc/<pid>/maps` into one [`Module`](crate::domain::Module) per mapped file
//!   - Puts the file behind `/proc/<pid>/exe` first, so it becomes the main module
//!
//! - **`symbolizer`**: Exports and symbol names from ELF files on disk
//!   - Dynamic symbol table for exports (function / data / other)
//!   - `.symtab` + `.dynsym` function extents for address lookup
//!   - DWARF fallback through `addr2line` when debug info is present
//!
//! ## Address Translation
//!
//! Symbol tables use link-time addresses, but the monitor deals in runtime
//! addresses. With `base` being the lowest mapping of the file and
//! `link_base` the page-aligned lowest loadable segment address:
//!
//! ```text
//! runtime = base + (link - link_base)
//! link    = runtime - base + link_base
//! ```
//!
//! For PIE executables and shared objects `link_base` is 0; fixed-address
//! executables typically link at `0x400000` and are mapped there too.

pub mod memory_maps;
pub mod symbolizer;

use crossbeam_channel::Sender;
use modmon_common::OutboundMessage;
use std::rc::Rc;

pub use memory_maps::{parse_module_maps, promote_main, ProcessMaps};
pub use symbolizer::ElfSymbolizer;

use crate::domain::{HostError, Pid};
use crate::monitor::ModuleMonitor;

/// Monitor over a live Linux process; one shared symbolizer plays both host roles
///
/// The symbolizer caches parsed files in a `RefCell`, so this monitor stays
/// on the thread that built it.
pub type LinuxMonitor = ModuleMonitor<Rc<ElfSymbolizer>, Rc<ElfSymbolizer>>;

/// Build a monitor for a live process, publishing its modules on `outbound`
///
/// # Errors
/// Returns an error if the process's memory maps cannot be read
pub fn attach(pid: Pid, outbound: &Sender<OutboundMessage>) -> Result<LinuxMonitor, HostError> {
    let maps = ProcessMaps::capture(pid)?;
    let symbolizer = Rc::new(ElfSymbolizer::for_snapshot(&maps));
    Ok(ModuleMonitor::new(&maps, Rc::clone(&symbolizer), symbolizer, outbound))
}
