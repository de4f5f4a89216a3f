//! Structured error types for modmon
//!
//! Using thiserror for automatic Display implementation and error chaining.

use super::types::Pid;
use thiserror::Error;

/// Failures a query handler reports back to the controller
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MonitorError {
    #[error("Module \"{0}\" not in map")]
    ModuleNotFoundByName(String),

    #[error("Module at path \"{0}\" not in map")]
    ModuleNotFoundByPath(String),
}

/// Failures routing a name-keyed request to its handler
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error(transparent)]
    UnknownOperation(#[from] modmon_common::UnknownOperation),

    #[error("Invalid params for {operation}: {source}")]
    InvalidParams { operation: &'static str, source: serde_json::Error },

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Failures talking to the Linux host environment
#[derive(Error, Debug)]
pub enum HostError {
    #[error("Process {0} not found")]
    ProcessNotFound(Pid),

    #[error("Failed to read memory maps of {pid}: {source}")]
    MemoryMapsUnreadable { pid: Pid, source: std::io::Error },

    #[error("Failed to read binary {path}: {source}")]
    BinaryUnreadable { path: String, source: std::io::Error },

    #[error("Failed to parse binary {path}: {reason}")]
    BinaryUnparsable { path: String, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_errors_name_the_key() {
        let err = MonitorError::ModuleNotFoundByName("libfoo.so".to_string());
        assert!(err.to_string().contains("libfoo.so"));

        let err = MonitorError::ModuleNotFoundByPath("/usr/lib/libfoo.so".to_string());
        assert!(err.to_string().contains("/usr/lib/libfoo.so"));
    }

    #[test]
    fn test_host_error_display() {
        let err = HostError::ProcessNotFound(Pid(1234));
        assert_eq!(err.to_string(), "Process PID:1234 not found");

        let err = HostError::BinaryUnparsable {
            path: "/tmp/garbage".to_string(),
            reason: "bad magic".to_string(),
        };
        assert!(err.to_string().contains("/tmp/garbage"));
        assert!(err.to_string().contains("bad magic"));
    }

    #[test]
    fn test_monitor_error_passes_through_dispatch() {
        let err: DispatchError = MonitorError::ModuleNotFoundByName("x".to_string()).into();
        assert_eq!(err.to_string(), "Module \"x\" not in map");
    }
}
