// src/utils/report.rs: Stage outcome accumulation and the run summary file

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;

use crate::config::defs::{RunConfig, StageName, StageResult, StageStatus};
use crate::utils::file::OutputLayout;


#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl StatusCounts {
    fn add(&mut self, status: StageStatus) {
        match status {
            StageStatus::Success => self.processed += 1,
            StageStatus::Skipped => self.skipped += 1,
            StageStatus::Failed => self.failed += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageCounts {
    pub stage: StageName,
    #[serde(flatten)]
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactDirs {
    pub fastqc_raw: PathBuf,
    pub fastqc_trimmed: PathBuf,
    pub trimmed_paired: PathBuf,
    pub trimmed_unpaired: PathBuf,
    pub logs: PathBuf,
}

impl From<&OutputLayout> for ArtifactDirs {
    fn from(layout: &OutputLayout) -> Self {
        ArtifactDirs {
            fastqc_raw: layout.fastqc_raw.clone(),
            fastqc_trimmed: layout.fastqc_trimmed.clone(),
            trimmed_paired: layout.trimmed_paired.clone(),
            trimmed_unpaired: layout.trimmed_unpaired.clone(),
            logs: layout.logs.clone(),
        }
    }
}

/// Final, fixed-schema record of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub version: String,
    pub timestamp: String,
    pub config: RunConfig,
    pub adapter_file: Option<PathBuf>,
    pub artifacts: ArtifactDirs,
    pub stage_counts: Vec<StageCounts>,
    pub totals: StatusCounts,
    pub results: Vec<StageResult>,
}

impl RunSummary {
    pub fn counts_for(&self, stage: StageName) -> StatusCounts {
        self.stage_counts
            .iter()
            .find(|c| c.stage == stage)
            .map(|c| c.counts)
            .unwrap_or_default()
    }

    pub fn write(&self, path: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        fs::write(path, json)?;
        info!("Wrote run summary to {}", path.display());
        Ok(())
    }

    pub fn log_digest(&self) {
        info!("Run summary ({} mode, {} threads)", self.config.read_mode(), self.config.thread_count);
        match &self.adapter_file {
            Some(adapter) => info!("  adapter file: {}", adapter.display()),
            None => info!("  adapter file: none (trimming disabled)"),
        }
        for stage in &self.stage_counts {
            info!(
                "  {:<14} processed {:>4}  skipped {:>4}  failed {:>4}",
                stage.stage.as_str(),
                stage.counts.processed,
                stage.counts.skipped,
                stage.counts.failed
            );
        }
        for failed in self.results.iter().filter(|r| r.status == StageStatus::Failed) {
            let log = failed
                .log_location
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            warn!(
                "  failed: {} {} ({}); log: {}",
                failed.stage,
                failed.sample_id.as_deref().unwrap_or("<batch>"),
                failed.message,
                log
            );
        }
        info!("  trimmed reads: {}", self.artifacts.trimmed_paired.display());
        info!("  FastQC reports: {} and {}", self.artifacts.fastqc_raw.display(), self.artifacts.fastqc_trimmed.display());
        info!("  logs: {}", self.artifacts.logs.display());
    }
}


/// Collects stage results in arrival order. Consumed by `finalize`/`summarize`, so a
/// run summary can only be produced once.
#[derive(Debug, Clone)]
pub struct ReportAggregator {
    config: Arc<RunConfig>,
    results: Vec<StageResult>,
}

impl ReportAggregator {
    pub fn new(config: Arc<RunConfig>) -> Self {
        ReportAggregator { config, results: Vec::new() }
    }

    pub fn record(&mut self, result: StageResult) {
        self.results.push(result);
    }

    pub fn counts_for(&self, stage: StageName) -> StatusCounts {
        let mut counts = StatusCounts::default();
        for result in self.results.iter().filter(|r| r.stage == stage) {
            counts.add(result.status);
        }
        counts
    }

    /// Records SUMMARIZE and writes the summary file. The written file reports SUMMARIZE
    /// as Success; if the write fails, the returned summary reports it Failed instead.
    /// Either way the run goes on.
    pub fn summarize(mut self, layout: &OutputLayout) -> RunSummary {
        let path = layout.summary_path();
        let mut attempt = self.clone();
        attempt.record(StageResult::batch(
            StageName::Summarize,
            StageStatus::Success,
            format!("summary at {}", path.display()),
        ));
        let summary = attempt.finalize(layout);
        match summary.write(&path) {
            Ok(()) => summary,
            Err(e) => {
                warn!("Could not write run summary to {}: {}", path.display(), e);
                self.record(StageResult::batch(
                    StageName::Summarize,
                    StageStatus::Failed,
                    format!("could not write {}: {}", path.display(), e),
                ));
                self.finalize(layout)
            }
        }
    }

    pub fn finalize(self, layout: &OutputLayout) -> RunSummary {
        let stage_counts = StageName::ORDER
            .iter()
            .map(|&stage| StageCounts { stage, counts: self.counts_for(stage) })
            .collect();
        let mut totals = StatusCounts::default();
        for result in &self.results {
            totals.add(result.status);
        }

        RunSummary {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Local::now().to_rfc3339(),
            adapter_file: self.config.adapter_file.clone(),
            config: (*self.config).clone(),
            artifacts: ArtifactDirs::from(layout),
            stage_counts,
            totals,
            results: self.results,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Phred;
    use crate::config::defs::{QualityParams, StageToggles};
    use anyhow::Result;
    use tempfile::tempdir;

    fn config(output_dir: &Path) -> Arc<RunConfig> {
        Arc::new(RunConfig {
            input_dir: PathBuf::from("/in"),
            output_dir: output_dir.to_path_buf(),
            sample_list: None,
            thread_count: 2,
            paired_end: true,
            quality: QualityParams::default(),
            phred: Phred::Phred33,
            adapter_file: Some(PathBuf::from("/ad/TruSeq3-PE.fa")),
            stages: StageToggles::default(),
            resume: false,
            keep_temp: false,
            verbose: false,
        })
    }

    #[test]
    fn test_counts_per_stage_and_totals() {
        let dir = Path::new("/out");
        let mut report = ReportAggregator::new(config(dir));
        report.record(StageResult::batch(StageName::Discover, StageStatus::Success, "2 complete"));
        report.record(StageResult::sample(StageName::Trim, "s1", StageStatus::Success, "trimmed"));
        report.record(StageResult::sample(StageName::Trim, "s2", StageStatus::Failed, "exit status 1"));
        report.record(StageResult::sample(StageName::Trim, "s3", StageStatus::Skipped, "outputs present"));
        report.record(StageResult::batch(StageName::PostQc, StageStatus::Skipped, "disabled"));

        assert_eq!(report.counts_for(StageName::Trim), StatusCounts { processed: 1, skipped: 1, failed: 1 });
        let summary = report.finalize(&OutputLayout::new(dir));
        assert_eq!(summary.stage_counts.len(), 5);
        assert_eq!(summary.counts_for(StageName::PostQc).skipped, 1);
        assert_eq!(summary.counts_for(StageName::PreQc), StatusCounts::default());
        assert_eq!(summary.totals, StatusCounts { processed: 2, skipped: 2, failed: 1 });
        // arrival order kept
        assert_eq!(summary.results[1].sample_id.as_deref(), Some("s1"));
        assert_eq!(summary.results[2].sample_id.as_deref(), Some("s2"));
    }

    #[test]
    fn test_summary_json_schema() -> Result<()> {
        let dir = tempdir()?;
        let layout = OutputLayout::new(dir.path());
        let mut report = ReportAggregator::new(config(dir.path()));
        report.record(
            StageResult::sample(StageName::Trim, "s1", StageStatus::Failed, "exit status 1")
                .with_log(layout.tool_log("s1_trimmomatic")),
        );
        let summary = report.summarize(&layout);
        assert_eq!(summary.counts_for(StageName::Summarize).processed, 1);

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(layout.summary_path())?)?;
        assert_eq!(value["adapter_file"], "/ad/TruSeq3-PE.fa");
        assert_eq!(value["config"]["thread_count"], 2);
        assert_eq!(value["stage_counts"][2]["stage"], "STAGE_TRIM");
        assert_eq!(value["stage_counts"][2]["failed"], 1);
        assert_eq!(value["results"][0]["status"], "Failed");
        assert!(value["results"][0]["log_location"].as_str().unwrap().ends_with("s1_trimmomatic.log"));
        assert_eq!(value["results"][1]["stage"], "SUMMARIZE");
        assert_eq!(value["results"][1]["status"], "Success");
        assert!(value["artifacts"]["trimmed_paired"].as_str().unwrap().ends_with("trimmed/PE"));
        Ok(())
    }

    #[test]
    fn test_write_failure_marks_summarize_failed() {
        let layout = OutputLayout::new(Path::new("/no/such/output/dir"));
        let summary = ReportAggregator::new(config(Path::new("/no/such/output/dir"))).summarize(&layout);

        assert!(!layout.summary_path().exists());
        let last = summary.results.last().unwrap();
        assert_eq!((last.stage, last.status), (StageName::Summarize, StageStatus::Failed));
        assert!(last.message.starts_with("could not write"));
        assert_eq!(summary.counts_for(StageName::Summarize), StatusCounts { processed: 0, skipped: 0, failed: 1 });
    }
}
