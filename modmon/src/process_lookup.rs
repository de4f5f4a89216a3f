//! Auto-detect a process PID from its name.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::Pid;

/// Result of process lookup.
#[derive(Debug)]
pub struct ProcessInfo {
    pub pid: Pid,
    pub exe_path: PathBuf,
    pub command: String,
}

/// Find a single process by name.
///
/// Matches against the command name from `/proc/<pid>/stat` and the
/// executable basename from `/proc/<pid>/exe`. Exact matches win over
/// substring matches.
///
/// # Errors
/// - No processes found
/// - Multiple processes found (ambiguous)
pub fn find_process_by_name(name: &str) -> Result<ProcessInfo> {
    let mut exact: Vec<ProcessInfo> = Vec::new();
    let mut partial: Vec<ProcessInfo> = Vec::new();
    let own_pid = std::process::id();

    let proc_dir = fs::read_dir("/proc").context("Failed to read /proc")?;

    for entry in proc_dir.flatten() {
        let Ok(pid) = entry.file_name().to_string_lossy().parse::<u32>() else {
            continue;
        };
        if pid == own_pid {
            continue;
        }

        // Skip kernel threads and inaccessible processes
        let Ok(exe_path) = resolve_exe_path(Pid(pid)) else {
            continue;
        };
        let Ok(stat_content) = fs::read_to_string(format!("/proc/{pid}/stat")) else {
            continue;
        };
        let Ok(command) = extract_comm(&stat_content) else {
            continue;
        };

        let info = ProcessInfo { pid: Pid(pid), exe_path, command };
        match match_kind(&info.command, &info.exe_path, name) {
            Some(MatchKind::Exact) => exact.push(info),
            Some(MatchKind::Partial) => partial.push(info),
            None => {}
        }
    }

    let mut matches = if exact.is_empty() { partial } else { exact };
    match matches.len() {
        0 => bail!(
            "No process matching '{name}' found.\n\
             Check running processes with: ps aux | grep {name}"
        ),
        1 => Ok(matches.remove(0)),
        _ => {
            let list: Vec<String> =
                matches.iter().map(|m| format!("  {} ({})", m.pid.0, m.command)).collect();
            bail!(
                "Multiple processes match '{name}':\n{}\n\n\
                 Specify PID explicitly: modmon --pid <PID>",
                list.join("\n")
            )
        }
    }
}

/// Resolve binary path from PID via `/proc/<pid>/exe`.
///
/// # Errors
/// Returns error if the process doesn't exist or `/proc/<pid>/exe` is not readable.
pub fn resolve_exe_path(pid: Pid) -> Result<PathBuf> {
    let exe_link = format!("/proc/{}/exe", pid.0);
    fs::read_link(&exe_link).with_context(|| format!("Cannot read {exe_link}"))
}

/// Extract command name from `/proc/<pid>/stat`.
/// Format: "pid (comm) state ..."
fn extract_comm(stat_line: &str) -> Result<String> {
    let open = stat_line.find('(').context("Invalid stat format")?;
    let close = stat_line.rfind(')').context("Invalid stat format")?;
    if open >= close {
        bail!("Invalid stat format");
    }
    Ok(stat_line[open + 1..close].to_string())
}

#[derive(Debug, PartialEq, Eq)]
enum MatchKind {
    Exact,
    Partial,
}

fn match_kind(command: &str, exe_path: &Path, pattern: &str) -> Option<MatchKind> {
    let exe_basename = exe_path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let pattern_basename =
        Path::new(pattern).file_name().and_then(|n| n.to_str()).unwrap_or(pattern);

    if command == pattern_basename || exe_basename == pattern_basename {
        Some(MatchKind::Exact)
    } else if command.contains(pattern) || exe_basename.contains(pattern) {
        Some(MatchKind::Partial)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_comm() {
        let stat = "1234 (my-app) S 1 1234 1234 0 -1 4194304";
        assert_eq!(extract_comm(stat).unwrap(), "my-app");

        // comm may itself contain parentheses
        let stat = "42 (weird (name)) R 1";
        assert_eq!(extract_comm(stat).unwrap(), "weird (name)");

        assert!(extract_comm("garbage").is_err());
    }

    #[test]
    fn test_match_kind() {
        let exe = Path::new("/usr/bin/my-server");
        assert_eq!(match_kind("my-server", exe, "my-server"), Some(MatchKind::Exact));
        assert_eq!(match_kind("other", exe, "/usr/bin/my-server"), Some(MatchKind::Exact));
        assert_eq!(match_kind("my-server", exe, "server"), Some(MatchKind::Partial));
        assert_eq!(match_kind("my-server", exe, "nginx"), None);
    }

    #[test]
    fn test_resolve_own_exe() {
        let exe = resolve_exe_path(Pid::current()).unwrap();
        assert_eq!(exe, std::env::current_exe().unwrap());
    }

    #[test]
    fn test_no_match() {
        let err = find_process_by_name("definitely-not-a-running-process-xyz").unwrap_err();
        assert!(err.to_string().contains("No process matching"));
    }
}
