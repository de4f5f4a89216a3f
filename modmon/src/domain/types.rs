//! Domain types for loaded modules and their exports

use modmon_common::EnrichedModule;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pid(pub u32);

impl Pid {
    /// The process this agent is running in
    #[must_use]
    pub fn current() -> Self {
        Pid(std::process::id())
    }
}

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PID:{}", self.0)
    }
}

/// Half-open address range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    pub start: u64,
    pub end: u64,
}

impl MemoryRange {
    /// Check if an address falls within this memory range
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end
    }
}

/// A binary mapped into the target process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    pub name: String,
    pub base: u64,
    pub size: u64,
    pub path: String,
}

impl Module {
    #[must_use]
    pub fn range(&self) -> MemoryRange {
        MemoryRange { start: self.base, end: self.base.saturating_add(self.size) }
    }

    /// Wire record for this module; `main` is left unset
    #[must_use]
    pub fn to_enriched(&self) -> EnrichedModule {
        EnrichedModule {
            name: self.name.clone(),
            base: self.base,
            size: self.size,
            path: self.path.clone(),
            main: None,
        }
    }
}

/// What an exported symbol refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    Function,
    Data,
    Other,
}

/// A named entry a module exposes, at its absolute runtime address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
    pub address: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_range_contains() {
        let range = MemoryRange { start: 0x1000, end: 0x2000 };

        assert!(range.contains(0x1000));
        assert!(range.contains(0x1FFF));
        assert!(!range.contains(0x0FFF));
        assert!(!range.contains(0x2000));
    }

    #[test]
    fn test_module_range_saturates() {
        let module = Module {
            name: "top".to_string(),
            base: u64::MAX - 0x10,
            size: 0x100,
            path: "/top".to_string(),
        };
        assert_eq!(module.range().end, u64::MAX);
    }

    #[test]
    fn test_to_enriched_copies_fields() {
        let module = Module {
            name: "lib.so".to_string(),
            base: 0x5000,
            size: 0x800,
            path: "/lib/lib.so".to_string(),
        };
        let record = module.to_enriched();
        assert_eq!(record.name, "lib.so");
        assert_eq!(record.base, 0x5000);
        assert_eq!(record.size, 0x800);
        assert_eq!(record.path, "/lib/lib.so");
        assert_eq!(record.main, None);
    }

    #[test]
    fn test_pid_display() {
        assert_eq!(Pid(1234).to_string(), "PID:1234");
    }
}
