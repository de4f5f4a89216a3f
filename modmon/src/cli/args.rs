//! CLI argument definitions

use clap::{Parser, Subcommand};
use modmon_common::hex_address;

#[derive(Parser)]
#[command(
    name = "modmon",
    about = "Publish a process's loaded modules and answer symbol queries",
    after_help = "\
EXAMPLES:
    modmon modules                                  Modules of modmon itself
    modmon --pid 1234 functions libc.so.6           Exported functions of libc
    modmon my-app resolve /usr/bin/my-app 0x1130    Symbolize an offset
    modmon --pid 1234 call module:get-functions '{\"name\":\"libc.so.6\"}'"
)]
pub struct Args {
    /// Process name to inspect (auto-detects PID)
    #[arg(value_name = "PROCESS", conflicts_with = "pid")]
    pub process: Option<String>,

    /// Process ID to inspect (defaults to modmon's own process)
    #[arg(short, long)]
    pub pid: Option<u32>,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the modules:update message published at startup (default)
    Modules,

    /// List exported functions of a module, by module name
    Functions {
        /// Module name, e.g. libc.so.6
        name: String,
    },

    /// Resolve offsets relative to a module to symbol names
    Resolve {
        /// Module path, e.g. /usr/lib/libc.so.6
        module: String,

        /// Offsets from the module base (decimal or 0x-prefixed hex)
        #[arg(value_parser = parse_offset, allow_hyphen_values = true)]
        offsets: Vec<i64>,
    },

    /// Dispatch a registered operation by name with JSON params
    Call {
        /// Operation name, e.g. module:resolve-symbols
        operation: String,

        /// JSON params for the operation
        params: String,
    },
}

/// Parse an offset as decimal or 0x-prefixed hex, optionally negative
fn parse_offset(s: &str) -> Result<i64, String> {
    let (negative, magnitude) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let magnitude = i128::from(hex_address::parse(magnitude)?);
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).map_err(|e| format!("offset \"{s}\" out of range: {e}"))
}
