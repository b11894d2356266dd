use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::config::defs::{
    SlidingWindow, StageToggles, DEFAULT_LEADING, DEFAULT_MINLEN, DEFAULT_THREADS, DEFAULT_TRAILING,
};

#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq, Serialize)]
pub enum Phred {
    #[default]
    #[value(name = "33")]
    Phred33,
    #[value(name = "64")]
    Phred64,
}

impl Phred {
    /// Trimmomatic spelling of the encoding flag.
    pub fn flag(&self) -> &'static str {
        match self {
            Phred::Phred33 => "-phred33",
            Phred::Phred64 => "-phred64",
        }
    }
}

#[derive(Parser, Debug, Clone, Default)]
#[command(name = "fastq-qc-pipelines", version, about = "Batch FastQC -> Trimmomatic -> FastQC over a directory of FASTQ files")]
pub struct Arguments {

    #[arg(short = 'i', long = "input", help = "Directory holding .fastq/.fq/.fastq.gz/.fq.gz files")]
    pub input: String,

    #[arg(short = 'o', long = "output", help = "Output directory; created if missing")]
    pub output: String,

    #[arg(short = 's', long = "samples", help = "Newline-delimited sample ids to process; blank and '#' lines are ignored")]
    pub samples: Option<String>,

    #[arg(short = 't', long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    #[arg(short = 'a', long = "adapters", help = "Adapter FASTA for ILLUMINACLIP; defaults to the Trimmomatic-bundled TruSeq3 file")]
    pub adapters: Option<String>,

    #[arg(long, default_value = "33", value_enum)]
    pub phred: Phred,

    #[arg(long, default_value_t = DEFAULT_MINLEN)]
    pub minlen: u32,

    #[arg(long, default_value_t = DEFAULT_LEADING)]
    pub leading: u32,

    #[arg(long, default_value_t = DEFAULT_TRAILING)]
    pub trailing: u32,

    #[arg(long = "slidingwindow", value_name = "W:Q", default_value = "4:15", value_parser = parse_sliding_window)]
    pub sliding_window: SlidingWindow,

    #[arg(long = "fastqc-only", help = "Run raw FastQC only; disables trimming and post-trim FastQC")]
    pub fastqc_only: bool,

    #[arg(long = "skip-trim")]
    pub skip_trim: bool,

    #[arg(long = "skip-raw-fastqc")]
    pub skip_raw_fastqc: bool,

    #[arg(long = "skip-trimmed-fastqc")]
    pub skip_trimmed_fastqc: bool,

    #[arg(long = "skip-fastqc", help = "Same as --skip-raw-fastqc --skip-trimmed-fastqc")]
    pub skip_fastqc: bool,

    #[arg(long, visible_alias = "skip-completed", help = "Skip samples whose trimmed outputs already exist and are non-empty")]
    pub resume: bool,

    #[arg(long = "single-end")]
    pub single_end: bool,

    #[arg(long = "keep-temp", help = "Leave the temp/ directory contents in place after the run")]
    pub keep_temp: bool,

    #[arg(short = 'v', long = "verbose", action)]
    pub verbose: bool,
}

/// Parses a `W:Q` sliding window value, e.g. `4:15`.
pub fn parse_sliding_window(s: &str) -> Result<SlidingWindow, String> {
    let (window, quality) = s
        .split_once(':')
        .ok_or_else(|| format!("expected WINDOW:QUALITY, got '{}'", s))?;
    let window_size: u32 = window
        .trim()
        .parse()
        .map_err(|e| format!("invalid window size '{}': {}", window, e))?;
    let required_quality: u32 = quality
        .trim()
        .parse()
        .map_err(|e| format!("invalid window quality '{}': {}", quality, e))?;
    if window_size == 0 {
        return Err("window size must be at least 1".to_string());
    }
    Ok(SlidingWindow { window_size, required_quality })
}

impl StageToggles {
    /// Folds the stage flags into one set of toggles.
    /// `--fastqc-only` wins over everything that would re-enable trimming.
    pub fn from_args(args: &Arguments) -> StageToggles {
        let mut toggles = StageToggles {
            skip_raw_qc: args.skip_raw_fastqc,
            skip_trim: args.skip_trim,
            skip_trimmed_qc: args.skip_trimmed_fastqc,
        };
        if args.skip_fastqc {
            toggles.skip_raw_qc = true;
            toggles.skip_trimmed_qc = true;
        }
        if args.fastqc_only {
            toggles.skip_trim = true;
            toggles.skip_trimmed_qc = true;
        }
        toggles
    }
}
