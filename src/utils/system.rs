// src/utils/system.rs: System functions

use std::env;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use sysinfo::System;


/// Number of physical cores, falling back to 1 when the platform will not say.
pub fn detect_physical_cores() -> usize {
    System::physical_core_count().unwrap_or(1)
}

/// Warns when the requested thread count exceeds the physical cores.
/// The value is passed to the external tools untouched either way.
///
/// # Arguments
///
/// * `requested` - Thread count from the command line.
/// * `physical_cores` - Result of `detect_physical_cores`.
///
/// # Returns
/// true if the request fits within the physical cores.
pub fn check_thread_count(requested: usize, physical_cores: usize) -> bool {
    debug!("Detected {} physical cores; {} threads requested", physical_cores, requested);
    if requested > physical_cores {
        warn!(
            "Requested {} threads but only {} physical cores detected; tools may oversubscribe the CPU",
            requested, physical_cores
        );
        return false;
    }
    true
}

/// Searches PATH for an executable named `tool`.
///
/// # Returns
/// Full path of the first match, or None.
pub fn find_executable(tool: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var)
        .map(|dir| dir.join(tool))
        .find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
