// src/utils/pairing.rs: Sample discovery and R1/R2 mate pairing

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::config::defs::PipelineError;
use crate::utils::file::{list_fastq_files, split_fastq_extension};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum NamingPattern {
    /// `<id>_R1<rest>` / `<id>_R2<rest>`
    SchemeA,
    /// `<id>_1.<ext>` or `<id>_1_<rest>` / `_2`
    SchemeB,
    Unknown,
}

impl NamingPattern {
    pub fn label(&self) -> &'static str {
        match self {
            NamingPattern::SchemeA => "_R1/_R2",
            NamingPattern::SchemeB => "_1/_2",
            NamingPattern::Unknown => "unknown",
        }
    }
}

impl fmt::Display for NamingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One row of the mate naming table. `locate` finds the mate1 marker in a file name,
/// `locate_mate` finds the mate2 marker of the same shape.
struct NamingRule {
    pattern: NamingPattern,
    marker: &'static str,
    mate_marker: &'static str,
    locate: fn(&str) -> Option<usize>,
    locate_mate: fn(&str) -> Option<usize>,
    replace_all: bool,
}

/// A read marker only counts when a `_` or `.` follows it, so `_R12` is not `_R1`.
fn is_bounded(name: &str, idx: usize, marker: &str) -> bool {
    matches!(name.as_bytes().get(idx + marker.len()), Some(b'_') | Some(b'.'))
}

fn find_bounded(name: &str, marker: &str) -> Option<usize> {
    name.match_indices(marker)
        .map(|(idx, _)| idx)
        .find(|&idx| is_bounded(name, idx, marker))
}

/// Swaps every bounded `marker` for `mate_marker`, leaving look-alikes such as `_R12` alone.
fn replace_bounded(name: &str, marker: &str, mate_marker: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last = 0;
    for (idx, _) in name.match_indices(marker) {
        if is_bounded(name, idx, marker) {
            out.push_str(&name[last..idx]);
            out.push_str(mate_marker);
            last = idx + marker.len();
        }
    }
    out.push_str(&name[last..]);
    out
}

fn find_r1(name: &str) -> Option<usize> {
    find_bounded(name, "_R1")
}

fn find_r2(name: &str) -> Option<usize> {
    find_bounded(name, "_R2")
}

fn find_1_dot(name: &str) -> Option<usize> {
    name.rfind("_1.")
}

fn find_2_dot(name: &str) -> Option<usize> {
    name.rfind("_2.")
}

fn find_1_underscore(name: &str) -> Option<usize> {
    name.rfind("_1_")
}

fn find_2_underscore(name: &str) -> Option<usize> {
    name.rfind("_2_")
}

// Precedence is table order; first match wins.
const NAMING_RULES: [NamingRule; 3] = [
    NamingRule {
        pattern: NamingPattern::SchemeA,
        marker: "_R1",
        mate_marker: "_R2",
        locate: find_r1,
        locate_mate: find_r2,
        replace_all: true,
    },
    NamingRule {
        pattern: NamingPattern::SchemeB,
        marker: "_1.",
        mate_marker: "_2.",
        locate: find_1_dot,
        locate_mate: find_2_dot,
        replace_all: false,
    },
    NamingRule {
        pattern: NamingPattern::SchemeB,
        marker: "_1_",
        mate_marker: "_2_",
        locate: find_1_underscore,
        locate_mate: find_2_underscore,
        replace_all: false,
    },
];


/// Result of matching one file name against the naming table.
#[derive(Debug, Clone, PartialEq)]
pub struct NameMatch {
    pub pattern: NamingPattern,
    pub sample_id: String,
    /// File name of the expected mate; None for `Unknown`.
    pub mate_file_name: Option<String>,
    pub extension: String,
}

/// Matches a bare file name against the mate1 naming rules in precedence order.
///
/// # Arguments
///
/// * `file_name` - Basename of a read file.
///
/// # Returns
/// None if the extension is not a recognized FASTQ extension. Otherwise the detected
/// pattern, the derived sample id and the mate file name. Names matching no rule, or
/// whose marker leaves an empty id, come back as `Unknown` with the stem as id.
///
pub fn match_file_name(file_name: &str) -> Option<NameMatch> {
    let (stem, extension) = split_fastq_extension(file_name)?;

    for rule in NAMING_RULES.iter() {
        let Some(idx) = (rule.locate)(file_name) else { continue };
        // the marker has to sit in the stem, not straddle into the extension
        if idx + rule.marker.len() > stem.len() + 1 {
            continue;
        }
        let sample_id = &file_name[..idx];
        if sample_id.is_empty() {
            continue;
        }
        let mate_file_name = if rule.replace_all {
            replace_bounded(file_name, rule.marker, rule.mate_marker)
        } else {
            format!("{}{}{}", sample_id, rule.mate_marker, &file_name[idx + rule.marker.len()..])
        };
        return Some(NameMatch {
            pattern: rule.pattern,
            sample_id: sample_id.to_string(),
            mate_file_name: Some(mate_file_name),
            extension: extension.to_string(),
        });
    }

    Some(NameMatch {
        pattern: NamingPattern::Unknown,
        sample_id: stem.to_string(),
        mate_file_name: None,
        extension: extension.to_string(),
    })
}

/// True when the name looks like a second-read file (`_R2`, `_2.`, `_2_`) and not like
/// a first-read file. Mate1 shapes take precedence.
pub fn is_mate2_shape(file_name: &str) -> bool {
    match match_file_name(file_name) {
        Some(m) if m.pattern == NamingPattern::Unknown => {
            let stem_len = file_name.len() - m.extension.len();
            NAMING_RULES.iter().any(|rule| {
                (rule.locate_mate)(file_name)
                    .map(|idx| idx > 0 && idx + rule.mate_marker.len() <= stem_len + 1)
                    .unwrap_or(false)
            })
        }
        _ => false,
    }
}

/// Rebuilds the mate1 file name for a sample id under a pattern.
pub fn mate1_file_name(sample_id: &str, pattern: NamingPattern, extension: &str) -> String {
    match pattern {
        NamingPattern::SchemeA => format!("{}_R1{}", sample_id, extension),
        NamingPattern::SchemeB => format!("{}_1{}", sample_id, extension),
        NamingPattern::Unknown => format!("{}{}", sample_id, extension),
    }
}


/// A discovered sample. Never mutated after discovery.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRecord {
    pub id: String,
    pub mate1_path: PathBuf,
    pub mate2_path: Option<PathBuf>,
    pub naming_pattern: NamingPattern,
    pub complete: bool,
}

impl SampleRecord {
    pub fn input_paths(&self) -> Vec<PathBuf> {
        let mut paths = vec![self.mate1_path.clone()];
        if let Some(mate2) = &self.mate2_path {
            paths.push(mate2.clone());
        }
        paths
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiscoveryMode {
    DirectoryScan,
    SampleList,
}

/// Non-fatal findings. Each one is also logged at warn level when raised.
#[derive(Debug, Clone, PartialEq)]
pub enum DiscoveryWarning {
    MissingMate { sample_id: String, expected: PathBuf },
    UnknownPattern { path: PathBuf },
    SampleNotFound { sample_id: String },
    DuplicateId { sample_id: String, path: PathBuf },
    MateFileIgnored { path: PathBuf },
    NoCompleteSamples,
}

impl fmt::Display for DiscoveryWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryWarning::MissingMate { sample_id, expected } => {
                write!(f, "Sample {} is incomplete: mate file {} not found; excluding it", sample_id, expected.display())
            }
            DiscoveryWarning::UnknownPattern { path } => {
                write!(f, "File {} matches no _R1/_R2 or _1/_2 naming pattern; excluding it", path.display())
            }
            DiscoveryWarning::SampleNotFound { sample_id } => {
                write!(f, "No read file found for listed sample {}", sample_id)
            }
            DiscoveryWarning::DuplicateId { sample_id, path } => {
                write!(f, "Sample id {} already taken; ignoring {}", sample_id, path.display())
            }
            DiscoveryWarning::MateFileIgnored { path } => {
                write!(f, "File {} looks like a second-read file; single-end mode ignores it", path.display())
            }
            DiscoveryWarning::NoCompleteSamples => write!(f, "No complete samples found"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Discovery {
    pub mode: DiscoveryMode,
    /// Every sample considered, complete or not, in discovery order.
    pub samples: Vec<SampleRecord>,
    pub warnings: Vec<DiscoveryWarning>,
}

impl Discovery {
    pub fn complete_samples(&self) -> impl Iterator<Item = &SampleRecord> {
        self.samples.iter().filter(|s| s.complete)
    }

    pub fn complete_count(&self) -> usize {
        self.complete_samples().count()
    }

    pub fn incomplete_count(&self) -> usize {
        self.samples.len() - self.complete_count()
    }

    /// Complete samples per detected naming pattern.
    pub fn pattern_counts(&self) -> BTreeMap<NamingPattern, usize> {
        let mut counts = BTreeMap::new();
        for sample in self.complete_samples() {
            *counts.entry(sample.naming_pattern).or_insert(0) += 1;
        }
        counts
    }

    fn warn(&mut self, warning: DiscoveryWarning) {
        warn!("{}", warning);
        self.warnings.push(warning);
    }
}


/// Parses sample list text: one id per line, blank lines and `#` lines ignored,
/// repeated ids kept once.
pub fn parse_sample_list(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for line in text.lines() {
        let id = line.trim();
        if id.is_empty() || id.starts_with('#') {
            continue;
        }
        if !seen.insert(id.to_string()) {
            warn!("Sample {} listed more than once; using the first entry", id);
            continue;
        }
        ids.push(id.to_string());
    }
    ids
}

pub fn read_sample_list(path: &Path) -> Result<Vec<String>, PipelineError> {
    let text = fs::read_to_string(path).map_err(|e| {
        PipelineError::InvalidConfig(format!("Cannot read sample list {}: {}", path.display(), e))
    })?;
    let ids = parse_sample_list(&text);
    if ids.is_empty() {
        warn!("Sample list {} contains no sample ids", path.display());
    }
    Ok(ids)
}


/// Resolves `input_dir` (or a list of sample ids) into sample records.
///
/// # Arguments
///
/// * `input_dir` - Directory holding the read files. Not searched recursively.
/// * `paired_end` - Pair mate1 files with their mate2 files when true.
/// * `sample_ids` - Optional ordered ids from a sample list.
///
/// # Returns
/// Discovery with every sample considered. Errors only in directory-scan mode when
/// there is no recognized file at all, or no mate1-shaped (single-end: usable) file.
///
pub fn discover_samples(
    input_dir: &Path,
    paired_end: bool,
    sample_ids: Option<&[String]>,
) -> Result<Discovery, PipelineError> {
    let files = list_fastq_files(input_dir).map_err(|e| {
        PipelineError::IOError(format!("Cannot list input directory {}: {}", input_dir.display(), e))
    })?;
    debug!("Found {} recognized read files in {}", files.len(), input_dir.display());

    let mut discovery = match sample_ids {
        None => {
            if files.is_empty() {
                return Err(PipelineError::NoInputFiles(input_dir.to_path_buf()));
            }
            let discovery = scan_directory(&files, paired_end);
            if discovery.samples.is_empty() && !has_candidates(&files, paired_end) {
                return Err(PipelineError::NoPairingCandidates(input_dir.to_path_buf()));
            }
            discovery
        }
        Some(ids) => match_sample_list(&files, ids, paired_end),
    };

    if discovery.complete_count() == 0 {
        discovery.warn(DiscoveryWarning::NoCompleteSamples);
    }

    info!(
        "Discovery: {} complete, {} incomplete",
        discovery.complete_count(),
        discovery.incomplete_count()
    );
    for (pattern, count) in discovery.pattern_counts() {
        info!("  {} sample(s) with {} naming", count, pattern);
    }
    Ok(discovery)
}

fn file_name_of(path: &Path) -> Option<&str> {
    path.file_name().and_then(|n| n.to_str())
}

fn has_candidates(files: &[PathBuf], paired_end: bool) -> bool {
    files.iter().filter_map(|p| file_name_of(p)).any(|name| {
        match match_file_name(name) {
            Some(m) if m.pattern != NamingPattern::Unknown => true,
            Some(_) => !paired_end && !is_mate2_shape(name),
            None => false,
        }
    })
}

/// Builds a record for `path`, checking the mate on disk in paired mode.
fn build_record(
    discovery: &mut Discovery,
    sample_id: &str,
    path: &Path,
    name_match: &NameMatch,
    paired_end: bool,
) -> SampleRecord {
    if !paired_end {
        return SampleRecord {
            id: sample_id.to_string(),
            mate1_path: path.to_path_buf(),
            mate2_path: None,
            naming_pattern: name_match.pattern,
            complete: true,
        };
    }

    let mate_path = name_match
        .mate_file_name
        .as_ref()
        .map(|mate| path.with_file_name(mate));
    match mate_path {
        Some(mate) if mate.is_file() => {
            info!("Sample {}: paired using {} pattern", sample_id, name_match.pattern);
            SampleRecord {
                id: sample_id.to_string(),
                mate1_path: path.to_path_buf(),
                mate2_path: Some(mate),
                naming_pattern: name_match.pattern,
                complete: true,
            }
        }
        Some(mate) => {
            discovery.warn(DiscoveryWarning::MissingMate {
                sample_id: sample_id.to_string(),
                expected: mate,
            });
            SampleRecord {
                id: sample_id.to_string(),
                mate1_path: path.to_path_buf(),
                mate2_path: None,
                naming_pattern: name_match.pattern,
                complete: false,
            }
        }
        None => SampleRecord {
            id: sample_id.to_string(),
            mate1_path: path.to_path_buf(),
            mate2_path: None,
            naming_pattern: name_match.pattern,
            complete: false,
        },
    }
}

fn scan_directory(files: &[PathBuf], paired_end: bool) -> Discovery {
    let mut discovery = Discovery {
        mode: DiscoveryMode::DirectoryScan,
        samples: Vec::new(),
        warnings: Vec::new(),
    };

    let matched: Vec<(&PathBuf, NameMatch)> = files
        .iter()
        .filter_map(|p| file_name_of(p).and_then(match_file_name).map(|m| (p, m)))
        .collect();

    // Files named as some candidate's mate are consumed by that candidate, whatever they match.
    let claimed: HashSet<PathBuf> = if paired_end {
        matched
            .iter()
            .filter_map(|(path, m)| m.mate_file_name.as_ref().map(|mate| path.with_file_name(mate)))
            .filter(|mate| mate.is_file())
            .collect()
    } else {
        HashSet::new()
    };

    let mut seen_ids = HashSet::new();
    for (path, name_match) in &matched {
        if claimed.contains(*path) {
            continue;
        }
        if name_match.pattern == NamingPattern::Unknown {
            let name = file_name_of(path).unwrap_or_default();
            if paired_end {
                discovery.warn(DiscoveryWarning::UnknownPattern { path: path.to_path_buf() });
                continue;
            }
            if is_mate2_shape(name) {
                discovery.warn(DiscoveryWarning::MateFileIgnored { path: path.to_path_buf() });
                continue;
            }
        }
        if !seen_ids.insert(name_match.sample_id.clone()) {
            discovery.warn(DiscoveryWarning::DuplicateId {
                sample_id: name_match.sample_id.clone(),
                path: path.to_path_buf(),
            });
            continue;
        }
        let record = build_record(&mut discovery, &name_match.sample_id, path, name_match, paired_end);
        discovery.samples.push(record);
    }
    discovery
}

fn match_sample_list(files: &[PathBuf], ids: &[String], paired_end: bool) -> Discovery {
    let mut discovery = Discovery {
        mode: DiscoveryMode::SampleList,
        samples: Vec::new(),
        warnings: Vec::new(),
    };

    let matched: Vec<(&PathBuf, &str, NameMatch)> = files
        .iter()
        .filter_map(|p| {
            let name = file_name_of(p)?;
            let m = match_file_name(name)?;
            let usable = if paired_end {
                m.pattern != NamingPattern::Unknown
            } else {
                m.pattern != NamingPattern::Unknown || !is_mate2_shape(name)
            };
            usable.then_some((p, name, m))
        })
        .collect();

    for id in ids {
        let mut prefixed = matched.iter().filter(|(_, name, _)| name.starts_with(id.as_str()));
        let exact = prefixed.clone().find(|(_, _, m)| m.sample_id == *id);
        let Some((path, _, name_match)) = exact.or_else(|| prefixed.next()) else {
            discovery.warn(DiscoveryWarning::SampleNotFound { sample_id: id.clone() });
            continue;
        };
        let record = build_record(&mut discovery, id, path, name_match, paired_end);
        discovery.samples.push(record);
    }
    discovery
}


#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    fn touch(dir: &Path, names: &[&str]) -> Result<()> {
        for name in names {
            fs::write(dir.join(name), b"@r1\nACGT\n+\nIIII\n")?;
        }
        Ok(())
    }

    #[test]
    fn test_match_scheme_a() {
        let m = match_file_name("S1_L001_R1_001.fastq.gz").unwrap();
        assert_eq!(m.pattern, NamingPattern::SchemeA);
        assert_eq!(m.sample_id, "S1_L001");
        assert_eq!(m.mate_file_name.as_deref(), Some("S1_L001_R2_001.fastq.gz"));
        assert_eq!(m.pattern.label(), "_R1/_R2");
    }

    #[test]
    fn test_match_scheme_b() {
        let m = match_file_name("s2_1.fq").unwrap();
        assert_eq!(m.pattern, NamingPattern::SchemeB);
        assert_eq!(m.sample_id, "s2");
        assert_eq!(m.mate_file_name.as_deref(), Some("s2_2.fq"));
        assert_eq!(m.pattern.label(), "_1/_2");

        let m = match_file_name("run_7_1_val.fq.gz").unwrap();
        assert_eq!(m.pattern, NamingPattern::SchemeB);
        assert_eq!(m.sample_id, "run_7");
        assert_eq!(m.mate_file_name.as_deref(), Some("run_7_2_val.fq.gz"));
    }

    #[test]
    fn test_scheme_a_takes_precedence() {
        let m = match_file_name("lib_R1_1.fastq").unwrap();
        assert_eq!(m.pattern, NamingPattern::SchemeA);
        assert_eq!(m.sample_id, "lib");
        assert_eq!(m.mate_file_name.as_deref(), Some("lib_R2_1.fastq"));
    }

    #[test]
    fn test_scheme_a_marker_must_be_bounded() {
        let m = match_file_name("lib_R12_R1.fq").unwrap();
        assert_eq!(m.pattern, NamingPattern::SchemeA);
        assert_eq!(m.sample_id, "lib_R12");
        assert_eq!(m.mate_file_name.as_deref(), Some("lib_R12_R2.fq"));
        assert_eq!(match_file_name("lib_R13_R1.fq").unwrap().sample_id, "lib_R13");

        // `_R1` glued to more text is not a marker
        assert_eq!(match_file_name("run_R1x.fq").unwrap().pattern, NamingPattern::Unknown);
        assert!(!is_mate2_shape("lib_R22.fq"));
    }

    #[test]
    fn test_distinct_r1_lookalikes_are_separate_samples() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["lib_R12_R1.fq", "lib_R12_R2.fq", "lib_R13_R1.fq", "lib_R13_R2.fq"])?;
        let discovery = discover_samples(dir.path(), true, None)?;
        let ids: Vec<_> = discovery.samples.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["lib_R12", "lib_R13"]);
        assert_eq!(discovery.complete_count(), 2);
        assert!(discovery.warnings.is_empty());
        Ok(())
    }

    #[test]
    fn test_unknown_and_unrecognized() {
        let m = match_file_name("control.fastq").unwrap();
        assert_eq!(m.pattern, NamingPattern::Unknown);
        assert_eq!(m.sample_id, "control");
        assert!(m.mate_file_name.is_none());
        assert!(match_file_name("s1_R1.bam").is_none());
        // marker with nothing before it cannot name a sample
        assert_eq!(match_file_name("_R1.fq").unwrap().pattern, NamingPattern::Unknown);
    }

    #[test]
    fn test_mate2_shape() {
        assert!(is_mate2_shape("s1_R2.fastq.gz"));
        assert!(is_mate2_shape("s2_2.fq"));
        assert!(is_mate2_shape("s2_2_val.fq"));
        assert!(!is_mate2_shape("s1_R1.fastq.gz"));
        assert!(!is_mate2_shape("lib_R1_2.fq"));
        assert!(!is_mate2_shape("control.fq"));
    }

    #[test]
    fn test_id_round_trip() {
        for name in ["abc_def_R1.fastq.gz", "x_1.fq", "S_9_R1.fq.gz", "t_1.fastq"] {
            let m = match_file_name(name).unwrap();
            let rebuilt = mate1_file_name(&m.sample_id, m.pattern, &m.extension);
            let again = match_file_name(&rebuilt).unwrap();
            assert_eq!(again.sample_id, m.sample_id, "{}", name);
            assert_eq!(again.pattern, m.pattern, "{}", name);
        }
    }

    #[test]
    fn test_directory_scan_mixed_patterns() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["s1_R1.fastq.gz", "s1_R2.fastq.gz", "s2_1.fq", "s2_2.fq", "s3_R1.fastq"])?;

        let discovery = discover_samples(dir.path(), true, None)?;
        assert_eq!(discovery.mode, DiscoveryMode::DirectoryScan);
        assert_eq!(discovery.complete_count(), 2);
        assert_eq!(discovery.incomplete_count(), 1);

        let complete: Vec<_> = discovery.complete_samples().collect();
        assert_eq!(complete[0].id, "s1");
        assert_eq!(complete[0].naming_pattern, NamingPattern::SchemeA);
        assert_eq!(complete[0].mate2_path, Some(dir.path().join("s1_R2.fastq.gz")));
        assert_eq!(complete[1].id, "s2");
        assert_eq!(complete[1].naming_pattern, NamingPattern::SchemeB);

        let missing: Vec<_> = discovery
            .warnings
            .iter()
            .filter(|w| matches!(w, DiscoveryWarning::MissingMate { .. }))
            .collect();
        assert_eq!(missing.len(), 1);
        assert!(matches!(missing[0], DiscoveryWarning::MissingMate { sample_id, .. } if sample_id == "s3"));
        let incomplete = discovery.samples.iter().find(|s| s.id == "s3").unwrap();
        assert!(!incomplete.complete);
        assert!(incomplete.mate2_path.is_none());
        Ok(())
    }

    #[test]
    fn test_directory_scan_no_files_is_fatal() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["notes.txt"])?;
        let err = discover_samples(dir.path(), true, None).unwrap_err();
        assert!(matches!(err, PipelineError::NoInputFiles(_)));
        assert!(err.is_config_error());
        Ok(())
    }

    #[test]
    fn test_directory_scan_no_mate1_is_fatal() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["a_R2.fq", "control.fastq"])?;
        let err = discover_samples(dir.path(), true, None).unwrap_err();
        assert!(matches!(err, PipelineError::NoPairingCandidates(_)));
        Ok(())
    }

    #[test]
    fn test_directory_scan_all_incomplete_is_not_fatal() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["a_R1.fq", "b_1.fq"])?;
        let discovery = discover_samples(dir.path(), true, None)?;
        assert_eq!(discovery.complete_count(), 0);
        assert_eq!(discovery.incomplete_count(), 2);
        assert!(discovery.warnings.contains(&DiscoveryWarning::NoCompleteSamples));
        Ok(())
    }

    #[test]
    fn test_unknown_files_warned_in_paired_mode() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["a_R1.fq", "a_R2.fq", "control.fq"])?;
        let discovery = discover_samples(dir.path(), true, None)?;
        assert_eq!(discovery.complete_count(), 1);
        assert_eq!(
            discovery.warnings,
            vec![DiscoveryWarning::UnknownPattern { path: dir.path().join("control.fq") }]
        );
        Ok(())
    }

    #[test]
    fn test_scheme_a_mate_not_rediscovered_as_scheme_b() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["lib_R1_1.fq", "lib_R2_1.fq"])?;
        let discovery = discover_samples(dir.path(), true, None)?;
        assert_eq!(discovery.samples.len(), 1);
        assert_eq!(discovery.samples[0].id, "lib");
        assert!(discovery.samples[0].complete);
        Ok(())
    }

    #[test]
    fn test_duplicate_ids_keep_first() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["s1_R1.fastq", "s1_R2.fastq", "s1_R1.fq", "s1_R2.fq"])?;
        let discovery = discover_samples(dir.path(), true, None)?;
        assert_eq!(discovery.samples.len(), 1);
        assert_eq!(discovery.samples[0].mate1_path, dir.path().join("s1_R1.fastq"));
        assert!(matches!(discovery.warnings[0], DiscoveryWarning::DuplicateId { .. }));
        Ok(())
    }

    #[test]
    fn test_single_end_scan() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["a_R1.fq", "a_R2.fq", "control.fastq.gz"])?;
        let discovery = discover_samples(dir.path(), false, None)?;
        let ids: Vec<_> = discovery.samples.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "control"]);
        assert!(discovery.samples.iter().all(|s| s.complete && s.mate2_path.is_none()));
        assert_eq!(discovery.samples[1].naming_pattern, NamingPattern::Unknown);
        assert_eq!(
            discovery.warnings,
            vec![DiscoveryWarning::MateFileIgnored { path: dir.path().join("a_R2.fq") }]
        );
        Ok(())
    }

    #[test]
    fn test_sample_list_mode() -> Result<()> {
        let dir = tempdir()?;
        touch(dir.path(), &["s1_R1.fq", "s1_R2.fq", "s10_R1.fq", "s10_R2.fq", "s2_1.fq"])?;
        let ids = parse_sample_list("# batch 1\ns1\n\ns2\nmissing\ns1\n");
        assert_eq!(ids, vec!["s1", "s2", "missing"]);

        let discovery = discover_samples(dir.path(), true, Some(&ids))?;
        assert_eq!(discovery.mode, DiscoveryMode::SampleList);
        assert_eq!(discovery.samples.len(), 2);
        // exact id wins over the earlier-sorted s10 prefix match
        assert_eq!(discovery.samples[0].mate1_path, dir.path().join("s1_R1.fq"));
        assert!(discovery.samples[0].complete);
        assert_eq!(discovery.samples[1].id, "s2");
        assert!(!discovery.samples[1].complete);
        assert!(discovery
            .warnings
            .contains(&DiscoveryWarning::SampleNotFound { sample_id: "missing".to_string() }));
        Ok(())
    }

    #[test]
    fn test_sample_list_without_matches_is_not_fatal() -> Result<()> {
        let dir = tempdir()?;
        let ids = vec!["ghost".to_string()];
        let discovery = discover_samples(dir.path(), true, Some(&ids))?;
        assert!(discovery.samples.is_empty());
        assert!(discovery.warnings.contains(&DiscoveryWarning::NoCompleteSamples));
        Ok(())
    }

    #[test]
    fn test_read_sample_list_missing_file() {
        let err = read_sample_list(Path::new("/definitely/not/here.txt")).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidConfig(_)));
    }
}
