//! Memory mapping utilities for process address space analysis
//!
//! This module parses /proc/pid/maps into the list of file-backed modules
//! loaded in a process. Every mapping of the same file is folded into one
//! module spanning from its lowest start to its highest end.

use log::{debug, info};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::domain::{HostError, Module, Pid};
use crate::host::SnapshotProvider;

const DELETED_SUFFIX: &str = " (deleted)";

/// Modules mapped into a process, captured from /proc/pid/maps
#[derive(Debug, Clone)]
pub struct ProcessMaps {
    pid: Pid,
    modules: Vec<Module>,
}

impl ProcessMaps {
    /// Read the process's memory maps, main executable first
    ///
    /// # Errors
    /// Returns an error if the process does not exist or its maps cannot be read
    pub fn capture(pid: Pid) -> Result<Self, HostError> {
        if !Path::new(&format!("/proc/{}", pid.0)).exists() {
            return Err(HostError::ProcessNotFound(pid));
        }

        let maps_path = format!("/proc/{}/maps", pid.0);
        let maps = fs::read_to_string(&maps_path)
            .map_err(|source| HostError::MemoryMapsUnreadable { pid, source })?;

        let mut modules = parse_module_maps(&maps);
        if let Ok(exe) = fs::read_link(format!("/proc/{}/exe", pid.0)) {
            promote_main(&mut modules, strip_deleted(&exe.to_string_lossy()));
        }

        info!("{pid}: {} modules mapped", modules.len());
        Ok(Self { pid, modules })
    }

    #[must_use]
    pub fn pid(&self) -> Pid {
        self.pid
    }
}

impl SnapshotProvider for ProcessMaps {
    fn modules(&self) -> Vec<Module> {
        self.modules.clone()
    }
}

/// Fold /proc/pid/maps text into one module per mapped file
///
/// Modules come out in the order their first mapping appears. Anonymous
/// regions and pseudo-files like `[heap]` or `[vdso]` are skipped.
#[must_use]
pub fn parse_module_maps(maps: &str) -> Vec<Module> {
    let mut modules: Vec<Module> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for line in maps.lines() {
        // Parse the line: "start-end perms offset dev inode pathname"
        // The pathname is everything after the padding, spaces included
        let mut fields = line.splitn(6, char::is_whitespace);
        let (Some(range), Some(path)) = (fields.next(), fields.nth(4)) else {
            continue;
        };

        let path = strip_deleted(path.trim_start());
        if !path.starts_with('/') {
            continue;
        }

        let Some((start, end)) = parse_range(range) else {
            debug!("Skipping malformed maps line: {line}");
            continue;
        };

        if let Some(&i) = index.get(path) {
            let module = &mut modules[i];
            let module_end = module.base.saturating_add(module.size).max(end);
            module.base = module.base.min(start);
            module.size = module_end - module.base;
        } else {
            index.insert(path.to_string(), modules.len());
            modules.push(Module {
                name: module_name(path),
                base: start,
                size: end.saturating_sub(start),
                path: path.to_string(),
            });
        }
    }

    modules
}

/// Move the module mapped from `exe_path` to the front, keeping the rest in order
pub fn promote_main(modules: &mut Vec<Module>, exe_path: &str) {
    if let Some(i) = modules.iter().position(|m| m.path == exe_path) {
        let main = modules.remove(i);
        modules.insert(0, main);
    }
}

fn parse_range(range: &str) -> Option<(u64, u64)> {
    let (start, end) = range.split_once('-')?;
    let start = u64::from_str_radix(start, 16).ok()?;
    let end = u64::from_str_radix(end, 16).ok()?;
    (start <= end).then_some((start, end))
}

fn strip_deleted(path: &str) -> &str {
    path.strip_suffix(DELETED_SUFFIX).unwrap_or(path)
}

fn module_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map_or_else(|| path.to_string(), |name| name.to_string_lossy().into_owned())
}
