//! # modmon - Main Entry Point
//!
//! Builds a [`LinuxMonitor`] for a live process and runs one operation
//! against it:
//! - **modules** (default): print the `modules:update` message published at startup
//! - **functions** / **resolve**: the two registered queries with CLI arguments
//! - **call**: any registered query by name, with JSON params

use anyhow::{Context, Result};
use clap::Parser;
use crossbeam_channel::unbounded;
use log::info;
use modmon_common::{ModuleRef, Request, ResolveSymbolsQuery};
use serde::Serialize;

use modmon::cli::{Args, Command};
use modmon::domain::Pid;
use modmon::preflight::run_preflight_checks;
use modmon::process_lookup::find_process_by_name;
use modmon::symbolization::{self, LinuxMonitor};

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;
const EXIT_NOPERM: i32 = 77;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    let msg = format!("{err:#}").to_lowercase();
    if msg.contains("permission denied") {
        EXIT_NOPERM
    } else if msg.contains("unknown operation") || msg.contains("invalid params") {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

/// Resolve the target PID: by name, explicitly, or this process
fn resolve_pid(args: &Args) -> Result<Pid> {
    if let Some(ref name) = args.process {
        let info = find_process_by_name(name)?;
        info!("Found {} at {} ({})", info.command, info.pid, info.exe_path.display());
        return Ok(info.pid);
    }
    Ok(args.pid.map_or_else(Pid::current, Pid))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run() -> Result<()> {
    let args = Args::parse();
    let pid = resolve_pid(&args)?;
    run_preflight_checks(pid)?;

    let (outbound_tx, outbound_rx) = unbounded();
    let monitor = symbolization::attach(pid, &outbound_tx)
        .with_context(|| format!("Failed to attach to process {}", pid.0))?;
    drop(outbound_tx);

    let command = args.command.clone().unwrap_or(Command::Modules);

    // The startup notification is always drained; it is only shown when asked for
    let published: Vec<_> = outbound_rx.try_iter().collect();
    if command == Command::Modules {
        for message in &published {
            print_json(message)?;
        }
        return Ok(());
    }
    if !args.quiet {
        eprintln!("{}: {} modules", pid, monitor.snapshot().len());
    }

    run_query(&monitor, command)
}

fn run_query(monitor: &LinuxMonitor, command: Command) -> Result<()> {
    match command {
        Command::Modules => Ok(()),
        Command::Functions { name } => {
            let response = monitor.dispatch(&Request::GetFunctions(ModuleRef { name }))?;
            print_json(&response)
        }
        Command::Resolve { module, offsets } => {
            let response =
                monitor.dispatch(&Request::ResolveSymbols(ResolveSymbolsQuery { module, offsets }))?;
            print_json(&response)
        }
        Command::Call { operation, params } => {
            let params: serde_json::Value =
                serde_json::from_str(&params).context("Invalid params: not valid JSON")?;
            let result = monitor.dispatch_json(&operation, params)?;
            print_json(&result)
        }
    }
}
