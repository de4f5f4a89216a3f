//! Domain model for modmon
//!
//! Core types shared by the monitor, its host implementations and the CLI:
//! - Newtypes for process identity
//! - Loaded-module and export records handed over by the host
//! - Structured error enums

pub mod errors;
pub mod types;

pub use types::{Export, ExportKind, MemoryRange, Module, Pid};

pub use errors::{DispatchError, HostError, MonitorError};
