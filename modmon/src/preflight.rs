//! Pre-flight checks for modmon
//!
//! Validates that the target process can be inspected before the monitor
//! is built, with actionable error messages when it can't.

use anyhow::{bail, Context, Result};
use std::path::Path;

use crate::domain::Pid;

/// Run all pre-flight checks for the target process
///
/// # Errors
/// Returns an error describing the first failed check
pub fn run_preflight_checks(pid: Pid) -> Result<()> {
    check_process_exists(pid)?;
    check_proc_access(pid)?;
    Ok(())
}

/// Check if the target process exists
///
/// # Errors
/// Returns an error if `/proc/<pid>` is missing
pub fn check_process_exists(pid: Pid) -> Result<()> {
    let proc_path = format!("/proc/{}", pid.0);
    if !Path::new(&proc_path).exists() {
        bail!(
            "Process {} not found.\n\n\
             Is the process still running? Check with: ps -p {}",
            pid.0,
            pid.0
        );
    }
    Ok(())
}

/// Check if we can read the process's memory maps
///
/// # Errors
/// Returns an error if `/proc/<pid>/maps` cannot be read
pub fn check_proc_access(pid: Pid) -> Result<()> {
    let maps_path = format!("/proc/{}/maps", pid.0);
    std::fs::read_to_string(&maps_path).with_context(|| {
        format!(
            "Cannot read {maps_path}\n\n\
             This usually means:\n\
             - The process doesn't exist (check: ps -p {})\n\
             - Permission denied (run as the process owner or with sudo)\n\
             - /proc is not mounted",
            pid.0
        )
    })?;
    Ok(())
}
