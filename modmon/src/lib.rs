//! # modmon - Module Monitor Agent
//!
//! modmon is the query-and-notification core of a process-introspection
//! agent. It runs against a live target process and:
//!
//! 1. **Announces** the loaded modules to a controller once, at startup
//!    (`modules:update`)
//! 2. **Answers** two queries for the rest of its lifetime:
//!    - `module:get-functions`: a module's exported functions as
//!      `(name, offset from base)` pairs
//!    - `module:resolve-symbols`: symbol names for offsets into a module
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Host Environment                         │
//! │  SnapshotProvider    ExportEnumerator    AddressResolver     │
//! │  (/proc/pid/maps)    (ELF .dynsym)       (.symtab / DWARF)   │
//! └──────┬──────────────────────┬──────────────────┬─────────────┘
//!        │ modules              │ exports          │ names
//!        ▼                      ▼                  ▼
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ModuleMonitor                           │
//! │  ModuleSnapshot ──▶ publisher ──▶ Sender<OutboundMessage>    │
//! │        │                                                     │
//! │        └──▶ get_functions / resolve_symbols ◀── dispatch     │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`monitor`]: The service, its immutable snapshot, and the query handlers
//! - [`dispatch`]: Operation → handler routing, typed and by name
//! - [`host`]: Capability traits the monitor is built on
//! - [`symbolization`]: Linux implementations of those traits
//! - [`domain`]: Module/export records, newtypes, and error enums
//! - [`cli`], [`preflight`], [`process_lookup`]: The `modmon` binary's plumbing
//!
//! Wire types shared with the controller live in the `modmon-common` crate.
//!
//! ## Snapshot Lifetime
//!
//! The snapshot is taken exactly once, in [`ModuleMonitor::new`]. Queries
//! look modules up in that snapshot only, so a library loaded later is not
//! found until a new monitor is built.

pub mod cli;
pub mod dispatch;
pub mod domain;
pub mod host;
pub mod monitor;
pub mod preflight;
pub mod process_lookup;
pub mod symbolization;

pub use monitor::{ModuleMonitor, ModuleSnapshot};
