// src/utils/command.rs: External tool adapters. Typed requests in, exit status and log file out.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use log::{debug, warn};
use tokio::process::Command;

use crate::cli::Phred;
use crate::config::defs::{
    PipelineError, QualityParams, ReadMode, FASTQC_TAG, ILLUMINACLIP_SETTINGS, TOOL_VERSIONS, TRIMMOMATIC_TAG,
};
use crate::utils::file::PairedOutputs;
use crate::utils::streams::{read_child_output, run_logged, ToolOutcome};


/// One quality-assessment invocation over a set of files.
#[derive(Debug, Clone, PartialEq)]
pub struct QcRequest {
    pub files: Vec<PathBuf>,
    pub output_dir: PathBuf,
    pub temp_dir: PathBuf,
    pub thread_count: usize,
    pub log_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TrimOutputs {
    Paired(PairedOutputs),
    Single(PathBuf),
}

impl TrimOutputs {
    /// Files whose presence marks the sample as trimmed; unpaired leftovers do not count.
    pub fn completion_files(&self) -> Vec<&Path> {
        match self {
            TrimOutputs::Paired(p) => vec![p.r1_paired.as_path(), p.r2_paired.as_path()],
            TrimOutputs::Single(path) => vec![path.as_path()],
        }
    }
}

/// One trimming invocation for one sample.
#[derive(Debug, Clone, PartialEq)]
pub struct TrimRequest {
    pub mode: ReadMode,
    pub sample_id: String,
    pub inputs: Vec<PathBuf>,
    pub outputs: TrimOutputs,
    pub adapter_file: PathBuf,
    pub quality: QualityParams,
    pub phred: Phred,
    pub thread_count: usize,
    pub log_path: PathBuf,
}

pub trait QualityAssessor {
    fn name(&self) -> &str;

    /// Confirms the tool can be run; returns its version string.
    fn presence_check(&self) -> impl Future<Output = Result<String, PipelineError>> + Send;

    fn run(&self, request: &QcRequest) -> impl Future<Output = Result<ToolOutcome, PipelineError>> + Send;
}

pub trait Trimmer {
    fn name(&self) -> &str;

    fn presence_check(&self) -> impl Future<Output = Result<String, PipelineError>> + Send;

    fn run(&self, request: &TrimRequest) -> impl Future<Output = Result<ToolOutcome, PipelineError>> + Send;
}


/// Pulls the first `major.minor` number out of a version line, e.g. `FastQC v0.11.9` -> 0.11.
pub fn parse_version(line: &str) -> Option<f32> {
    line.split_whitespace().find_map(|token| {
        let token = token.trim_start_matches(['v', 'V']);
        let mut parts = token.split('.');
        let major = parts.next()?;
        let minor = parts.next()?;
        if major.is_empty() || !major.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let minor: String = minor.chars().take_while(|c| c.is_ascii_digit()).collect();
        if minor.is_empty() {
            return None;
        }
        format!("{}.{}", major, minor).parse().ok()
    })
}

/// Runs `<tool> <flag>` and returns the first non-empty output line.
async fn version_line(tool: &str, flag: &str) -> Result<String, PipelineError> {
    let missing = |error: String| PipelineError::ToolMissing {
        tool: tool.to_string(),
        error,
    };

    let mut child = Command::new(tool)
        .arg(flag)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| missing(format!("Failed to spawn {}: {}. Is it installed and on PATH?", tool, e)))?;

    let output = read_child_output(&mut child).await;
    let status = child.wait().await.map_err(|e| missing(e.to_string()))?;
    let output = output.map_err(|e| missing(e.to_string()))?;
    if !status.success() {
        return Err(missing(format!("{} {} exited with {}", tool, flag, status)));
    }

    // some Java tools print their version on stderr
    let lines = if output.stdout.iter().all(|l| l.trim().is_empty()) {
        output.stderr
    } else {
        output.stdout
    };
    let first_line = lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .find(|l| !l.is_empty())
        .ok_or_else(|| missing(format!("No output from {} {}", tool, flag)))?;
    check_min_version(tool, &first_line);
    Ok(first_line)
}

fn check_min_version(tool: &str, version_line: &str) {
    let (Some(found), Some(min)) = (parse_version(version_line), TOOL_VERSIONS.get(tool)) else {
        debug!("Could not compare {} version from '{}'", tool, version_line);
        return;
    };
    if found < *min {
        warn!("{} version {} is older than the tested minimum {}", tool, found, min);
    }
}

fn execution_error(tool: &str, e: anyhow::Error) -> PipelineError {
    PipelineError::ToolExecution {
        tool: tool.to_string(),
        error: e.to_string(),
    }
}


pub mod fastqc {
    use super::*;

    pub fn arg_generator(request: &QcRequest) -> Vec<String> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push("--threads".to_string());
        args_vec.push(request.thread_count.to_string());
        args_vec.push("--outdir".to_string());
        args_vec.push(request.output_dir.to_string_lossy().to_string());
        args_vec.push("--dir".to_string());
        args_vec.push(request.temp_dir.to_string_lossy().to_string());
        for file in &request.files {
            args_vec.push(file.to_string_lossy().to_string());
        }
        args_vec
    }
}

pub mod trimmomatic {
    use super::*;

    pub fn trim_steps(adapter_file: &Path, quality: &QualityParams) -> Vec<String> {
        vec![
            format!("ILLUMINACLIP:{}:{}", adapter_file.to_string_lossy(), ILLUMINACLIP_SETTINGS),
            format!("LEADING:{}", quality.leading),
            format!("TRAILING:{}", quality.trailing),
            format!("SLIDINGWINDOW:{}", quality.sliding_window),
            format!("MINLEN:{}", quality.minlen),
        ]
    }

    pub fn arg_generator(request: &TrimRequest) -> Result<Vec<String>, PipelineError> {
        let mut args_vec: Vec<String> = Vec::new();
        args_vec.push(request.mode.to_string());
        args_vec.push("-threads".to_string());
        args_vec.push(request.thread_count.to_string());
        args_vec.push(request.phred.flag().to_string());

        match (request.mode, &request.outputs, request.inputs.as_slice()) {
            (ReadMode::PE, TrimOutputs::Paired(out), [r1, r2]) => {
                for path in [r1, r2, &out.r1_paired, &out.r1_unpaired, &out.r2_paired, &out.r2_unpaired] {
                    args_vec.push(path.to_string_lossy().to_string());
                }
            }
            (ReadMode::SE, TrimOutputs::Single(out), [r1]) => {
                args_vec.push(r1.to_string_lossy().to_string());
                args_vec.push(out.to_string_lossy().to_string());
            }
            _ => {
                return Err(PipelineError::ToolExecution {
                    tool: TRIMMOMATIC_TAG.to_string(),
                    error: format!(
                        "{} mode given {} input(s) and {:?} outputs for sample {}",
                        request.mode,
                        request.inputs.len(),
                        request.outputs,
                        request.sample_id
                    ),
                });
            }
        }

        args_vec.extend(trim_steps(&request.adapter_file, &request.quality));
        Ok(args_vec)
    }
}


/// FastQC as a QualityAssessor.
#[derive(Debug, Clone)]
pub struct FastQc {
    pub executable: String,
}

impl Default for FastQc {
    fn default() -> Self {
        FastQc { executable: FASTQC_TAG.to_string() }
    }
}

impl QualityAssessor for FastQc {
    fn name(&self) -> &str {
        FASTQC_TAG
    }

    async fn presence_check(&self) -> Result<String, PipelineError> {
        version_line(&self.executable, "--version").await
    }

    async fn run(&self, request: &QcRequest) -> Result<ToolOutcome, PipelineError> {
        let args = fastqc::arg_generator(request);
        run_logged(&self.executable, &args, &request.log_path)
            .await
            .map_err(|e| execution_error(FASTQC_TAG, e))
    }
}

/// Trimmomatic as a Trimmer.
#[derive(Debug, Clone)]
pub struct Trimmomatic {
    pub executable: String,
}

impl Default for Trimmomatic {
    fn default() -> Self {
        Trimmomatic { executable: TRIMMOMATIC_TAG.to_string() }
    }
}

impl Trimmer for Trimmomatic {
    fn name(&self) -> &str {
        TRIMMOMATIC_TAG
    }

    async fn presence_check(&self) -> Result<String, PipelineError> {
        version_line(&self.executable, "-version").await
    }

    async fn run(&self, request: &TrimRequest) -> Result<ToolOutcome, PipelineError> {
        let args = trimmomatic::arg_generator(request)?;
        run_logged(&self.executable, &args, &request.log_path)
            .await
            .map_err(|e| execution_error(TRIMMOMATIC_TAG, e))
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::file::OutputLayout;

    fn trim_request(mode: ReadMode) -> TrimRequest {
        let layout = OutputLayout::new(Path::new("/out"));
        let (inputs, outputs) = match mode {
            ReadMode::PE => (
                vec![PathBuf::from("/in/s1_R1.fq.gz"), PathBuf::from("/in/s1_R2.fq.gz")],
                TrimOutputs::Paired(layout.paired_outputs("s1")),
            ),
            ReadMode::SE => (
                vec![PathBuf::from("/in/s1.fq.gz")],
                TrimOutputs::Single(layout.single_output("s1")),
            ),
        };
        TrimRequest {
            mode,
            sample_id: "s1".to_string(),
            inputs,
            outputs,
            adapter_file: PathBuf::from("/ad/TruSeq3-PE.fa"),
            quality: QualityParams::default(),
            phred: Phred::Phred33,
            thread_count: 8,
            log_path: layout.tool_log("s1_trimmomatic"),
        }
    }

    #[test]
    fn test_trimmomatic_pe_args() -> Result<(), PipelineError> {
        let args = trimmomatic::arg_generator(&trim_request(ReadMode::PE))?;
        assert_eq!(
            args,
            vec![
                "PE", "-threads", "8", "-phred33",
                "/in/s1_R1.fq.gz", "/in/s1_R2.fq.gz",
                "/out/trimmed/PE/s1_R1_paired.fastq.gz", "/out/trimmed/UP/s1_R1_unpaired.fastq.gz",
                "/out/trimmed/PE/s1_R2_paired.fastq.gz", "/out/trimmed/UP/s1_R2_unpaired.fastq.gz",
                "ILLUMINACLIP:/ad/TruSeq3-PE.fa:2:30:10", "LEADING:3", "TRAILING:3",
                "SLIDINGWINDOW:4:15", "MINLEN:36",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_trimmomatic_se_args() -> Result<(), PipelineError> {
        let args = trimmomatic::arg_generator(&trim_request(ReadMode::SE))?;
        assert_eq!(&args[..6], &["SE", "-threads", "8", "-phred33", "/in/s1.fq.gz", "/out/trimmed/PE/s1_trimmed.fastq.gz"]);
        Ok(())
    }

    #[test]
    fn test_trimmomatic_mode_mismatch() {
        let mut request = trim_request(ReadMode::PE);
        request.inputs.pop();
        assert!(matches!(
            trimmomatic::arg_generator(&request),
            Err(PipelineError::ToolExecution { .. })
        ));
    }

    #[test]
    fn test_fastqc_args() {
        let request = QcRequest {
            files: vec![PathBuf::from("/in/a.fq"), PathBuf::from("/in/b.fq")],
            output_dir: PathBuf::from("/out/fastqc_raw"),
            temp_dir: PathBuf::from("/out/temp"),
            thread_count: 2,
            log_path: PathBuf::from("/out/logs/fastqc_raw.log"),
        };
        assert_eq!(
            fastqc::arg_generator(&request),
            vec!["--threads", "2", "--outdir", "/out/fastqc_raw", "--dir", "/out/temp", "/in/a.fq", "/in/b.fq"]
        );
    }

    #[test]
    fn test_completion_files() {
        let request = trim_request(ReadMode::PE);
        let files = request.outputs.completion_files();
        assert_eq!(files.len(), 2);
        assert!(files.iter().all(|p| p.to_string_lossy().contains("_paired")));
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("FastQC v0.11.9"), Some(0.11));
        assert_eq!(parse_version("0.39"), Some(0.39));
        assert_eq!(parse_version("no version here"), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_version_line_survives_noisy_stderr() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let script = dir.path().join("noisy_version.sh");
        std::fs::write(&script, "yes 'Picked up JAVA_TOOL_OPTIONS' | head -n 20000 1>&2\necho 'Trimmomatic 0.39'\n")?;
        let line = tokio::time::timeout(
            std::time::Duration::from_secs(20),
            version_line("sh", &script.to_string_lossy()),
        )
        .await??;
        assert_eq!(line, "Trimmomatic 0.39");
        Ok(())
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_version_line_falls_back_to_stderr() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let script = dir.path().join("stderr_version.sh");
        std::fs::write(&script, "echo 'FastQC v0.12.1' 1>&2\n")?;
        assert_eq!(version_line("sh", &script.to_string_lossy()).await?, "FastQC v0.12.1");
        Ok(())
    }

    #[tokio::test]
    async fn test_presence_check_missing_tool() {
        let fastqc = FastQc { executable: "definitely-not-fastqc-8c1f".to_string() };
        let err = fastqc.presence_check().await.unwrap_err();
        assert!(matches!(err, PipelineError::ToolMissing { .. }));
    }
}
