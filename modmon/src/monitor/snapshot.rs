//! Module snapshot captured once at service construction

use modmon_common::EnrichedModule;

use crate::domain::Module;
use crate::host::SnapshotProvider;

/// Ordered, immutable view of the modules loaded when the monitor started
///
/// Lookups never rescan the host, so modules loaded afterwards stay
/// invisible until a new snapshot is captured.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleSnapshot {
    modules: Vec<Module>,
}

impl ModuleSnapshot {
    /// Capture the provider's current module list
    pub fn capture<P: SnapshotProvider + ?Sized>(provider: &P) -> Self {
        Self { modules: provider.modules() }
    }

    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// First module whose display name equals `name` exactly
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// First module whose path equals `path` exactly
    #[must_use]
    pub fn find_by_path(&self, path: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.path == path)
    }

    /// Wire records in snapshot order, with index 0 flagged as main
    #[must_use]
    pub fn enriched(&self) -> Vec<EnrichedModule> {
        self.modules
            .iter()
            .enumerate()
            .map(|(i, module)| {
                let mut record = module.to_enriched();
                if i == 0 {
                    record.main = Some(true);
                }
                record
            })
            .collect()
    }
}

impl From<Vec<Module>> for ModuleSnapshot {
    fn from(modules: Vec<Module>) -> Self {
        Self { modules }
    }
}
