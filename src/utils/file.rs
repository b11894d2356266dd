use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::config::defs::{
    FASTQC_RAW_DIR, FASTQC_TRIMMED_DIR, FASTQ_EXTS, LOG_DIR, PAIRED_DIR, SUMMARY_FILE, TEMP_DIR,
    TRIMMED_DIR, TRIMMED_EXT, UNPAIRED_DIR,
};


/// Splits a read file name into its stem and recognized extension.
/// The extension comparison ignores ASCII case; the returned slices keep the original text.
///
/// # Arguments
///
/// * `file_name` - Bare file name, no directory components.
///
/// # Returns
/// Some((stem, extension)) with the leading dot kept on the extension, or None if the
/// name does not end in a recognized FASTQ extension.
///
pub fn split_fastq_extension(file_name: &str) -> Option<(&str, &str)> {
    for ext in FASTQ_EXTS {
        if file_name.len() <= ext.len() {
            continue;
        }
        let split_at = file_name.len() - ext.len();
        if !file_name.is_char_boundary(split_at) {
            continue;
        }
        let (stem, tail) = file_name.split_at(split_at);
        if tail.eq_ignore_ascii_case(ext) {
            return Some((stem, tail));
        }
    }
    None
}

pub fn is_fastq_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| split_fastq_extension(n).is_some())
        .unwrap_or(false)
}

/// Lists regular files with a recognized FASTQ extension directly inside `dir`,
/// sorted by path so discovery order is deterministic.
pub fn list_fastq_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_fastq_file(&path) {
            files.push(path);
        } else {
            debug!("Ignoring non-FASTQ file {}", path.display());
        }
    }
    files.sort();
    Ok(files)
}

/// Completion predicate used by resume: the file exists and has non-zero size.
/// Content is not validated.
pub fn is_non_empty_file(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}


/// Every directory and per-sample artifact name under the run's output directory.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    pub root: PathBuf,
    pub fastqc_raw: PathBuf,
    pub fastqc_trimmed: PathBuf,
    pub trimmed_paired: PathBuf,
    pub trimmed_unpaired: PathBuf,
    pub logs: PathBuf,
    pub temp: PathBuf,
}

impl OutputLayout {
    pub fn new(root: &Path) -> Self {
        let trimmed = root.join(TRIMMED_DIR);
        OutputLayout {
            root: root.to_path_buf(),
            fastqc_raw: root.join(FASTQC_RAW_DIR),
            fastqc_trimmed: root.join(FASTQC_TRIMMED_DIR),
            trimmed_paired: trimmed.join(PAIRED_DIR),
            trimmed_unpaired: trimmed.join(UNPAIRED_DIR),
            logs: root.join(LOG_DIR),
            temp: root.join(TEMP_DIR),
        }
    }

    pub fn directories(&self) -> [&PathBuf; 6] {
        [
            &self.fastqc_raw,
            &self.fastqc_trimmed,
            &self.trimmed_paired,
            &self.trimmed_unpaired,
            &self.logs,
            &self.temp,
        ]
    }

    pub fn create_all(&self) -> io::Result<()> {
        for dir in self.directories() {
            fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    pub fn summary_path(&self) -> PathBuf {
        self.root.join(SUMMARY_FILE)
    }

    pub fn paired_outputs(&self, sample_id: &str) -> PairedOutputs {
        PairedOutputs {
            r1_paired: self.trimmed_paired.join(format!("{}_R1_paired.{}", sample_id, TRIMMED_EXT)),
            r1_unpaired: self.trimmed_unpaired.join(format!("{}_R1_unpaired.{}", sample_id, TRIMMED_EXT)),
            r2_paired: self.trimmed_paired.join(format!("{}_R2_paired.{}", sample_id, TRIMMED_EXT)),
            r2_unpaired: self.trimmed_unpaired.join(format!("{}_R2_unpaired.{}", sample_id, TRIMMED_EXT)),
        }
    }

    pub fn single_output(&self, sample_id: &str) -> PathBuf {
        self.trimmed_paired.join(format!("{}_trimmed.{}", sample_id, TRIMMED_EXT))
    }

    pub fn tool_log(&self, name: &str) -> PathBuf {
        self.logs.join(format!("{}.log", name))
    }

    /// Best-effort removal of everything inside temp/; the directory itself stays.
    pub fn clear_temp(&self) {
        let entries = match fs::read_dir(&self.temp) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Could not read temp directory {}: {}", self.temp.display(), e);
                return;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            let result = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            if let Err(e) = result {
                warn!("Could not remove temp entry {}: {}", path.display(), e);
            }
        }
    }
}

/// Trimmomatic's four PE outputs for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct PairedOutputs {
    pub r1_paired: PathBuf,
    pub r1_unpaired: PathBuf,
    pub r2_paired: PathBuf,
    pub r2_unpaired: PathBuf,
}
