//! Query handlers: exported functions and offset symbolization

use log::debug;
use modmon_common::{ModuleFunction, ModuleRef, ResolveSymbolsQuery, ResolveSymbolsResult};

use super::ModuleMonitor;
use crate::domain::{ExportKind, MonitorError};
use crate::host::{AddressResolver, ExportEnumerator};

/// Offset of `address` from `base`, truncated to 32 bits
///
/// No overflow check: spans past 2 GiB wrap.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn relative_offset(address: u64, base: u64) -> i32 {
    address.wrapping_sub(base) as i32
}

/// Absolute address `offset` bytes from `base`
#[must_use]
pub fn absolute_address(base: u64, offset: i64) -> u64 {
    base.wrapping_add_signed(offset)
}

impl<E: ExportEnumerator, R: AddressResolver> ModuleMonitor<E, R> {
    /// List the exported functions of the module named `name`
    ///
    /// Order follows the host's export enumeration. Data and other export
    /// kinds are dropped.
    ///
    /// # Errors
    /// [`MonitorError::ModuleNotFoundByName`] if no snapshot module has that name
    pub fn get_functions(&self, query: &ModuleRef) -> Result<Vec<ModuleFunction>, MonitorError> {
        let module = self
            .snapshot
            .find_by_name(&query.name)
            .ok_or_else(|| MonitorError::ModuleNotFoundByName(query.name.clone()))?;

        let functions: Vec<ModuleFunction> = self
            .exports
            .enumerate_exports(module)
            .into_iter()
            .filter(|export| export.kind == ExportKind::Function)
            .map(|export| ModuleFunction(export.name, relative_offset(export.address, module.base)))
            .collect();

        debug!("{}: {} exported functions", module.name, functions.len());
        Ok(functions)
    }

    /// Resolve each offset, relative to the module at `query.module`, to a symbol name
    ///
    /// The result has one entry per offset, in input order.
    ///
    /// # Errors
    /// [`MonitorError::ModuleNotFoundByPath`] if no snapshot module has that path
    pub fn resolve_symbols(
        &self,
        query: &ResolveSymbolsQuery,
    ) -> Result<Vec<ResolveSymbolsResult>, MonitorError> {
        let module = self
            .snapshot
            .find_by_path(&query.module)
            .ok_or_else(|| MonitorError::ModuleNotFoundByPath(query.module.clone()))?;

        let symbols: Vec<ResolveSymbolsResult> = query
            .offsets
            .iter()
            .map(|&offset| self.resolver.symbol_name_at(absolute_address(module.base, offset)))
            .collect();

        debug!(
            "{}: resolved {}/{} offsets",
            module.path,
            symbols.iter().filter(|s| s.is_some()).count(),
            symbols.len()
        );
        Ok(symbols)
    }
}
