//! Inbound dispatch
//!
//! Maps each [`Operation`] to its handler on [`ModuleMonitor`]. Hosts with
//! typed messages call [`ModuleMonitor::dispatch`]; hosts that route by name
//! with JSON params call [`ModuleMonitor::dispatch_json`].

use log::debug;
use modmon_common::{ModuleRef, Operation, Request, ResolveSymbolsQuery, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::{DispatchError, MonitorError};
use crate::host::{AddressResolver, ExportEnumerator};
use crate::monitor::ModuleMonitor;

/// Operations this agent answers, in registration order
#[must_use]
pub fn registered_operations() -> &'static [Operation] {
    &Operation::ALL
}

impl<E: ExportEnumerator, R: AddressResolver> ModuleMonitor<E, R> {
    /// Run a typed request against its handler
    ///
    /// # Errors
    /// Whatever the handler reports, see [`MonitorError`]
    pub fn dispatch(&self, request: &Request) -> Result<Response, MonitorError> {
        debug!("Dispatching {}", request.operation());
        match request {
            Request::GetFunctions(module) => self.get_functions(module).map(Response::Functions),
            Request::ResolveSymbols(query) => self.resolve_symbols(query).map(Response::Symbols),
        }
    }

    /// Run a request addressed by operation name, with JSON params
    ///
    /// Returns the handler's bare result as JSON (an array of pairs for
    /// `module:get-functions`, an array of names/nulls for
    /// `module:resolve-symbols`).
    ///
    /// # Errors
    /// - [`DispatchError::UnknownOperation`] for an unregistered name
    /// - [`DispatchError::InvalidParams`] if `params` does not fit the operation
    /// - [`DispatchError::Monitor`] if the handler fails
    pub fn dispatch_json(&self, operation: &str, params: Value) -> Result<Value, DispatchError> {
        let operation: Operation = operation.parse()?;
        let request = match operation {
            Operation::GetFunctions => {
                Request::GetFunctions(decode_params::<ModuleRef>(operation, params)?)
            }
            Operation::ResolveSymbols => {
                Request::ResolveSymbols(decode_params::<ResolveSymbolsQuery>(operation, params)?)
            }
        };

        let result = match self.dispatch(&request)? {
            Response::Functions(functions) => serde_json::to_value(functions)?,
            Response::Symbols(symbols) => serde_json::to_value(symbols)?,
        };
        Ok(result)
    }
}

fn decode_params<T: DeserializeOwned>(
    operation: Operation,
    params: Value,
) -> Result<T, DispatchError> {
    serde_json::from_value(params)
        .map_err(|source| DispatchError::InvalidParams { operation: operation.name(), source })
}
