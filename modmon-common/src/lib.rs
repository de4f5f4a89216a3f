//! # Shared Wire Types (Agent ↔ Controller)
//!
//! Defines the messages exchanged between the in-process agent and the
//! external controller. Everything here is plain data with `serde` derives;
//! framing and transport belong to whoever carries the bytes.
//!
//! ## Message Shapes
//!
//! ```text
//! outbound   {"name":"modules:update","payload":[EnrichedModule, ...]}
//! request    {"operation":"module:get-functions","params":{"name":"libc.so.6"}}
//! request    {"operation":"module:resolve-symbols","params":{"module":"/lib/libc.so.6","offsets":[16]}}
//! response   {"operation":"module:get-functions","result":[["malloc",41216], ...]}
//! response   {"operation":"module:resolve-symbols","result":["malloc",null]}
//! ```
//!
//! ## Key Types
//!
//! - [`EnrichedModule`] - Module record published at startup
//! - [`Operation`] - The closed set of inbound query names
//! - [`Request`] / [`Response`] - Typed query inputs and outputs
//! - [`OutboundMessage`] - Fire-and-forget notifications

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Message Names
// ============================================================================

/// Outbound notification carrying the module snapshot
pub const MODULES_UPDATE: &str = "modules:update";

/// Inbound query: list a module's exported functions
pub const GET_FUNCTIONS: &str = "module:get-functions";

/// Inbound query: resolve module-relative offsets to symbol names
pub const RESOLVE_SYMBOLS: &str = "module:resolve-symbols";

// ============================================================================
// Module Records
// ============================================================================

/// Wire projection of a loaded module
///
/// `main` is only ever `Some(true)`, and only on the first record of a
/// snapshot. All other records leave the key out entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedModule {
    pub name: String,
    #[serde(with = "hex_address")]
    pub base: u64,
    pub size: u64,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<bool>,
}

impl EnrichedModule {
    /// Whether this record is flagged as the process's main module
    #[must_use]
    pub fn is_main(&self) -> bool {
        self.main == Some(true)
    }
}

/// Identifies a module by its display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleRef {
    pub name: String,
}

/// Exported function as `(name, offset from module base)`
///
/// Serializes as a two-element JSON array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleFunction(pub String, pub i32);

impl ModuleFunction {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn offset(&self) -> i32 {
        self.1
    }
}

/// Offsets to resolve against the module at `module` (a filesystem path)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveSymbolsQuery {
    pub module: String,
    pub offsets: Vec<i64>,
}

/// Symbol name at an address, or `None` when nothing is known there
pub type ResolveSymbolsResult = Option<String>;

// ============================================================================
// Dispatch
// ============================================================================

/// Inbound operations the agent registers with the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    GetFunctions,
    ResolveSymbols,
}

impl Operation {
    /// Every registered operation, in registration order
    pub const ALL: [Operation; 2] = [Operation::GetFunctions, Operation::ResolveSymbols];

    /// Name the controller uses to address this operation
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Operation::GetFunctions => GET_FUNCTIONS,
            Operation::ResolveSymbols => RESOLVE_SYMBOLS,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown operation \"{0}\"")]
pub struct UnknownOperation(pub String);

impl FromStr for Operation {
    type Err = UnknownOperation;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == s)
            .ok_or_else(|| UnknownOperation(s.to_string()))
    }
}

/// A typed inbound query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "params")]
pub enum Request {
    #[serde(rename = "module:get-functions")]
    GetFunctions(ModuleRef),
    #[serde(rename = "module:resolve-symbols")]
    ResolveSymbols(ResolveSymbolsQuery),
}

impl Request {
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Request::GetFunctions(_) => Operation::GetFunctions,
            Request::ResolveSymbols(_) => Operation::ResolveSymbols,
        }
    }
}

/// The typed result of a successful query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "operation", content = "result")]
pub enum Response {
    #[serde(rename = "module:get-functions")]
    Functions(Vec<ModuleFunction>),
    #[serde(rename = "module:resolve-symbols")]
    Symbols(Vec<ResolveSymbolsResult>),
}

impl Response {
    #[must_use]
    pub fn operation(&self) -> Operation {
        match self {
            Response::Functions(_) => Operation::GetFunctions,
            Response::Symbols(_) => Operation::ResolveSymbols,
        }
    }
}

/// Fire-and-forget notifications sent from agent to controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", content = "payload")]
pub enum OutboundMessage {
    #[serde(rename = "modules:update")]
    ModulesUpdate(Vec<EnrichedModule>),
}

impl OutboundMessage {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            OutboundMessage::ModulesUpdate(_) => MODULES_UPDATE,
        }
    }
}

// ============================================================================
// Address Encoding
// ============================================================================

/// Addresses travel as `0x`-prefixed hex strings
///
/// Decoding also accepts a bare JSON number for controllers that send
/// integers.
pub mod hex_address {
    use serde::{de, Deserialize, Deserializer, Serializer};

    #[allow(clippy::trivially_copy_pass_by_ref)] // signature fixed by serde(with)
    pub fn serialize<S: Serializer>(addr: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{addr:x}"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(n),
            Raw::Text(s) => parse(&s).map_err(de::Error::custom),
        }
    }

    /// Parse `0x`-prefixed hex or plain decimal
    ///
    /// # Errors
    /// Returns a message naming the rejected input
    pub fn parse(s: &str) -> Result<u64, String> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16),
            None => s.parse(),
        };
        parsed.map_err(|e| format!("invalid address \"{s}\": {e}"))
    }
}
