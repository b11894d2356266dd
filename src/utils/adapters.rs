// src/utils/adapters.rs: Locating the ILLUMINACLIP adapter FASTA

use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::defs::{PipelineError, ADAPTER_DIR, PE_ADAPTER_FILE, SE_ADAPTER_FILE, TRIMMOMATIC_TAG};
use crate::utils::system::find_executable;


/// Where adapter files are looked for when none is given explicitly.
#[derive(Debug, Clone, Default)]
pub struct AdapterSearch {
    /// Adapter directories shipped with the installed trimmer.
    pub toolchain_dirs: Vec<PathBuf>,
    /// Adapter directories shipped with this repository.
    pub bundled_dirs: Vec<PathBuf>,
}

impl AdapterSearch {
    /// Builds the search from the trimmer found on PATH and the locations of this binary and crate.
    pub fn from_environment() -> Self {
        let toolchain_dirs = find_executable(TRIMMOMATIC_TAG)
            .map(|bin| toolchain_adapter_dirs(&bin))
            .unwrap_or_default();

        let mut bundled_dirs = Vec::new();
        if let Some(exe_dir) = std::env::current_exe().ok().and_then(|p| p.parent().map(Path::to_path_buf)) {
            bundled_dirs.push(exe_dir.join(ADAPTER_DIR));
        }
        bundled_dirs.push(Path::new(env!("CARGO_MANIFEST_DIR")).join(ADAPTER_DIR));

        AdapterSearch { toolchain_dirs, bundled_dirs }
    }
}

/// Adapter directories relative to a trimmer executable, covering the conda layout
/// `<prefix>/bin/trimmomatic -> <prefix>/share/trimmomatic-<ver>/trimmomatic`.
fn toolchain_adapter_dirs(bin: &Path) -> Vec<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(real) = fs::canonicalize(bin) {
        if let Some(parent) = real.parent() {
            dirs.push(parent.join(ADAPTER_DIR));
        }
    }

    if let Some(share) = bin.parent().and_then(Path::parent).map(|prefix| prefix.join("share")) {
        dirs.push(share.join(TRIMMOMATIC_TAG).join(ADAPTER_DIR));
        if let Ok(entries) = fs::read_dir(&share) {
            let mut versioned: Vec<PathBuf> = entries
                .flatten()
                .map(|e| e.path())
                .filter(|p| {
                    p.file_name()
                        .and_then(|n| n.to_str())
                        .map(|n| n.starts_with(TRIMMOMATIC_TAG))
                        .unwrap_or(false)
                })
                .map(|p| p.join(ADAPTER_DIR))
                .collect();
            versioned.sort();
            dirs.extend(versioned);
        }
    }

    dirs.dedup();
    dirs
}

pub fn default_adapter_name(paired_end: bool) -> &'static str {
    if paired_end { PE_ADAPTER_FILE } else { SE_ADAPTER_FILE }
}

/// Resolves the adapter file for the run: explicit file, then toolchain-bundled,
/// then repository-bundled.
///
/// # Arguments
///
/// * `explicit` - Path given with `--adapters`; must exist when given.
/// * `paired_end` - Chooses the TruSeq3 PE or SE file for the default lookups.
/// * `search` - Directories for the two fallback tiers.
///
/// # Returns
/// The adapter file path, or InvalidConfig when no tier yields a file.
pub fn resolve_adapter_file(
    explicit: Option<&Path>,
    paired_end: bool,
    search: &AdapterSearch,
) -> Result<PathBuf, PipelineError> {
    if let Some(path) = explicit {
        if path.is_file() {
            info!("Using adapter file {}", path.display());
            return Ok(path.to_path_buf());
        }
        return Err(PipelineError::InvalidConfig(format!(
            "Adapter file {} does not exist",
            path.display()
        )));
    }

    let name = default_adapter_name(paired_end);
    for (origin, dirs) in [("toolchain", &search.toolchain_dirs), ("bundled", &search.bundled_dirs)] {
        for dir in dirs {
            let candidate = dir.join(name);
            debug!("Looking for {} adapter file at {}", origin, candidate.display());
            if candidate.is_file() {
                info!("Using {} adapter file {}", origin, candidate.display());
                return Ok(candidate);
            }
        }
    }

    Err(PipelineError::InvalidConfig(format!(
        "No adapter file found: pass --adapters, or install {} with its bundled {}",
        TRIMMOMATIC_TAG, name
    )))
}
