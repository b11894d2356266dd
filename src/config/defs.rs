use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use lazy_static::lazy_static;
use serde::Serialize;
use thiserror::Error;

// External software
pub const FASTQC_TAG: &str = "fastqc";
pub const TRIMMOMATIC_TAG: &str = "trimmomatic";

lazy_static! {
    pub static ref TOOL_VERSIONS: HashMap<&'static str, f32> = {
        let mut m = HashMap::new();
        m.insert(FASTQC_TAG, 0.11);
        m.insert(TRIMMOMATIC_TAG, 0.36);
        m
    };
}

// Recognized read file extensions, compressed forms first
pub const FASTQ_EXTS: &[&'static str] = &[".fastq.gz", ".fq.gz", ".fastq", ".fq"];

// Adapter sequence files
pub const ADAPTER_DIR: &str = "adapters";
pub const PE_ADAPTER_FILE: &str = "TruSeq3-PE.fa";
pub const SE_ADAPTER_FILE: &str = "TruSeq3-SE.fa";

// ILLUMINACLIP seed mismatches : palindrome clip threshold : simple clip threshold
pub const ILLUMINACLIP_SETTINGS: &str = "2:30:10";

// Output layout
pub const FASTQC_RAW_DIR: &str = "fastqc_raw";
pub const FASTQC_TRIMMED_DIR: &str = "fastqc_trimmed";
pub const TRIMMED_DIR: &str = "trimmed";
pub const PAIRED_DIR: &str = "PE";
pub const UNPAIRED_DIR: &str = "UP";
pub const LOG_DIR: &str = "logs";
pub const TEMP_DIR: &str = "temp";
pub const SUMMARY_FILE: &str = "pipeline_summary.json";
pub const TRIMMED_EXT: &str = "fastq.gz";

// Static Parameters
pub const DEFAULT_THREADS: usize = 4;
pub const DEFAULT_MINLEN: u32 = 36;
pub const DEFAULT_LEADING: u32 = 3;
pub const DEFAULT_TRAILING: u32 = 3;
pub const DEFAULT_WINDOW_SIZE: u32 = 4;
pub const DEFAULT_WINDOW_QUALITY: u32 = 15;


#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SlidingWindow {
    pub window_size: u32,
    pub required_quality: u32,
}

impl Default for SlidingWindow {
    fn default() -> Self {
        SlidingWindow {
            window_size: DEFAULT_WINDOW_SIZE,
            required_quality: DEFAULT_WINDOW_QUALITY,
        }
    }
}

impl fmt::Display for SlidingWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.window_size, self.required_quality)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QualityParams {
    pub minlen: u32,
    pub leading: u32,
    pub trailing: u32,
    pub sliding_window: SlidingWindow,
}

impl Default for QualityParams {
    fn default() -> Self {
        QualityParams {
            minlen: DEFAULT_MINLEN,
            leading: DEFAULT_LEADING,
            trailing: DEFAULT_TRAILING,
            sliding_window: SlidingWindow::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageToggles {
    pub skip_raw_qc: bool,
    pub skip_trim: bool,
    pub skip_trimmed_qc: bool,
}

impl StageToggles {
    pub fn any_qc_enabled(&self) -> bool {
        !self.skip_raw_qc || !self.skip_trimmed_qc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReadMode {
    PE,
    SE,
}

impl fmt::Display for ReadMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadMode::PE => write!(f, "PE"),
            ReadMode::SE => write!(f, "SE"),
        }
    }
}

/// Immutable description of one run. Built once by `RunConfig::from_args`
/// and shared read-only with every stage.
#[derive(Debug, Clone, Serialize)]
pub struct RunConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub sample_list: Option<PathBuf>,
    pub thread_count: usize,
    pub paired_end: bool,
    pub quality: QualityParams,
    pub phred: crate::cli::args::Phred,
    pub adapter_file: Option<PathBuf>,
    pub stages: StageToggles,
    pub resume: bool,
    pub keep_temp: bool,
    #[serde(skip)]
    pub verbose: bool,
}

impl RunConfig {
    pub fn read_mode(&self) -> ReadMode {
        if self.paired_end { ReadMode::PE } else { ReadMode::SE }
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageName {
    #[serde(rename = "DISCOVER")]
    Discover,
    #[serde(rename = "STAGE_PRE_QC")]
    PreQc,
    #[serde(rename = "STAGE_TRIM")]
    Trim,
    #[serde(rename = "STAGE_POST_QC")]
    PostQc,
    #[serde(rename = "SUMMARIZE")]
    Summarize,
}

impl StageName {
    pub const ORDER: [StageName; 5] = [
        StageName::Discover,
        StageName::PreQc,
        StageName::Trim,
        StageName::PostQc,
        StageName::Summarize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Discover => "DISCOVER",
            StageName::PreQc => "STAGE_PRE_QC",
            StageName::Trim => "STAGE_TRIM",
            StageName::PostQc => "STAGE_POST_QC",
            StageName::Summarize => "SUMMARIZE",
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageStatus {
    Success,
    Skipped,
    Failed,
}

/// One outcome, appended in arrival order and never edited.
/// `sample_id` is `None` for whole-batch stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageResult {
    pub stage: StageName,
    pub sample_id: Option<String>,
    pub status: StageStatus,
    pub message: String,
    pub log_location: Option<PathBuf>,
}

impl StageResult {
    pub fn batch(stage: StageName, status: StageStatus, message: impl Into<String>) -> Self {
        StageResult {
            stage,
            sample_id: None,
            status,
            message: message.into(),
            log_location: None,
        }
    }

    pub fn sample(stage: StageName, sample_id: &str, status: StageStatus, message: impl Into<String>) -> Self {
        StageResult {
            stage,
            sample_id: Some(sample_id.to_string()),
            status,
            message: message.into(),
            log_location: None,
        }
    }

    pub fn with_log(mut self, log_location: PathBuf) -> Self {
        self.log_location = Some(log_location);
        self
    }
}


#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No .fastq/.fq/.fastq.gz/.fq.gz files found in {}", .0.display())]
    NoInputFiles(PathBuf),

    #[error("No usable read files (_R1 or _1 first-read files when paired) found in {}", .0.display())]
    NoPairingCandidates(PathBuf),

    #[error("Required tool '{tool}' is not available: {error}")]
    ToolMissing { tool: String, error: String },

    #[error("Tool '{tool}' failed: {error}")]
    ToolExecution { tool: String, error: String },

    #[error("IO error: {0}")]
    IOError(String),
}

impl PipelineError {
    /// Errors that stem from the invocation itself rather than the run; usage is shown for these.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            PipelineError::InvalidConfig(_)
                | PipelineError::NoInputFiles(_)
                | PipelineError::NoPairingCandidates(_)
        )
    }
}
