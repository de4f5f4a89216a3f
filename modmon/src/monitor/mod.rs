//! # Module Monitor Service
//!
//! One [`ModuleMonitor`] is created per monitored process. Construction does
//! two things, in order:
//!
//! 1. Captures a [`ModuleSnapshot`] from the host's [`SnapshotProvider`]
//! 2. Publishes that snapshot once as a `modules:update` message
//!
//! After that the monitor only answers queries (see [`queries`]) against the
//! same snapshot. Nothing is rescanned and the outbound channel is never
//! written again.
//!
//! ```text
//! SnapshotProvider ──▶ ModuleSnapshot ──▶ enriched() ──▶ Sender<OutboundMessage>
//!                            │
//!   Request ──▶ dispatch ──▶ get_functions   ──▶ ExportEnumerator
//!                        └─▶ resolve_symbols ──▶ AddressResolver
//! ```

pub mod queries;
pub mod snapshot;

use crossbeam_channel::Sender;
use log::{info, warn};
use modmon_common::OutboundMessage;

use crate::host::{AddressResolver, ExportEnumerator, SnapshotProvider};

pub use queries::{absolute_address, relative_offset};
pub use snapshot::ModuleSnapshot;

/// Module-tracking and symbol-resolution service
///
/// Generic over its export enumerator `E` and address resolver `R`. The
/// monitor is `Send`/`Sync` exactly when both collaborators are, so queries
/// can run from several threads at once against a thread-safe host.
pub struct ModuleMonitor<E, R> {
    snapshot: ModuleSnapshot,
    exports: E,
    resolver: R,
}

impl<E: ExportEnumerator, R: AddressResolver> ModuleMonitor<E, R> {
    /// Capture the module snapshot and publish it on `outbound`
    ///
    /// Publishing is fire-and-forget: if the receiving side is gone the
    /// failure is logged and the monitor is still returned.
    pub fn new<P: SnapshotProvider + ?Sized>(
        provider: &P,
        exports: E,
        resolver: R,
        outbound: &Sender<OutboundMessage>,
    ) -> Self {
        let monitor = Self { snapshot: ModuleSnapshot::capture(provider), exports, resolver };
        monitor.publish_modules(outbound);
        monitor
    }

    /// The snapshot every query is answered against
    #[must_use]
    pub fn snapshot(&self) -> &ModuleSnapshot {
        &self.snapshot
    }

    fn publish_modules(&self, outbound: &Sender<OutboundMessage>) {
        let records = self.snapshot.enriched();
        let count = records.len();
        match outbound.send(OutboundMessage::ModulesUpdate(records)) {
            Ok(()) => info!("Published {count} modules"),
            Err(e) => warn!("Failed to publish module snapshot: {e}"),
        }
    }
}
