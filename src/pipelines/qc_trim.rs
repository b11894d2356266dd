// src/pipelines/qc_trim.rs: FastQC -> Trimmomatic -> FastQC over every discovered sample
//
// Control flow is strictly sequential: stages in fixed order, samples one at a time in
// discovery order. Tool calls carry no timeout, so a hung tool blocks the run. The output
// directory is not locked; running two batches against it at once is unsupported.

use std::path::PathBuf;
use std::sync::Arc;

use log::{error, info, warn};

use crate::config::defs::{PipelineError, ReadMode, RunConfig, StageName, StageResult, StageStatus};
use crate::utils::command::{FastQc, QcRequest, QualityAssessor, TrimOutputs, TrimRequest, Trimmer, Trimmomatic};
use crate::utils::file::{is_non_empty_file, OutputLayout};
use crate::utils::pairing::{discover_samples, read_sample_list, DiscoveryWarning, SampleRecord};
use crate::utils::report::{ReportAggregator, RunSummary};


/// Drives the stage sequence with the given tool adapters.
pub struct Orchestrator<Q, T> {
    config: Arc<RunConfig>,
    layout: OutputLayout,
    assessor: Q,
    trimmer: T,
}

impl<Q: QualityAssessor, T: Trimmer> Orchestrator<Q, T> {
    pub fn new(config: Arc<RunConfig>, assessor: Q, trimmer: T) -> Self {
        let layout = OutputLayout::new(&config.output_dir);
        Orchestrator { config, layout, assessor, trimmer }
    }

    pub fn layout(&self) -> &OutputLayout {
        &self.layout
    }

    /// Runs DISCOVER, STAGE_PRE_QC, STAGE_TRIM, STAGE_POST_QC and SUMMARIZE.
    ///
    /// # Returns
    /// RunSummary once all stages ran. Errors only for whole-batch fatal conditions:
    /// a missing tool, no usable input in directory-scan mode, or an output tree that
    /// cannot be created. Per-sample failures are recorded, never returned.
    pub async fn run(&self) -> Result<RunSummary, PipelineError> {
        self.check_tools().await?;

        let mut report = ReportAggregator::new(self.config.clone());
        let samples = self.discover(&mut report)?;

        self.layout.create_all().map_err(|e| {
            PipelineError::IOError(format!(
                "Cannot create output tree under {}: {}",
                self.layout.root.display(),
                e
            ))
        })?;

        if self.config.stages.skip_raw_qc {
            info!("{} disabled", StageName::PreQc);
            report.record(StageResult::batch(StageName::PreQc, StageStatus::Skipped, "disabled"));
        } else {
            let files: Vec<PathBuf> = samples.iter().flat_map(|s| s.input_paths()).collect();
            let result = self
                .assess(StageName::PreQc, files, self.layout.fastqc_raw.clone(), "fastqc_raw")
                .await;
            report.record(result);
        }

        let trimmed = if self.config.stages.skip_trim {
            info!("{} disabled", StageName::Trim);
            report.record(StageResult::batch(StageName::Trim, StageStatus::Skipped, "disabled"));
            Vec::new()
        } else {
            self.trim(&samples, &mut report).await?
        };

        if self.config.stages.skip_trimmed_qc {
            info!("{} disabled", StageName::PostQc);
            report.record(StageResult::batch(StageName::PostQc, StageStatus::Skipped, "disabled"));
        } else {
            let files: Vec<PathBuf> = trimmed
                .iter()
                .flat_map(|outputs| outputs.completion_files())
                .filter(|p| p.is_file())
                .map(|p| p.to_path_buf())
                .collect();
            let result = self
                .assess(StageName::PostQc, files, self.layout.fastqc_trimmed.clone(), "fastqc_trimmed")
                .await;
            report.record(result);
        }

        let summary = report.summarize(&self.layout);
        summary.log_digest();

        if !self.config.keep_temp {
            self.layout.clear_temp();
        }
        Ok(summary)
    }

    /// Confirms the tools needed by enabled stages respond before anything runs.
    async fn check_tools(&self) -> Result<(), PipelineError> {
        if self.config.stages.any_qc_enabled() {
            let version = self.assessor.presence_check().await?;
            info!("Found {}: {}", self.assessor.name(), version);
        }
        if !self.config.stages.skip_trim {
            let version = self.trimmer.presence_check().await?;
            info!("Found {}: {}", self.trimmer.name(), version);
        }
        Ok(())
    }

    fn discover(&self, report: &mut ReportAggregator) -> Result<Vec<SampleRecord>, PipelineError> {
        info!("{}: scanning {}", StageName::Discover, self.config.input_dir.display());
        let sample_ids = match &self.config.sample_list {
            Some(path) => Some(read_sample_list(path)?),
            None => None,
        };
        let discovery = discover_samples(&self.config.input_dir, self.config.paired_end, sample_ids.as_deref())?;

        report.record(StageResult::batch(
            StageName::Discover,
            StageStatus::Success,
            format!(
                "{} complete, {} incomplete sample(s)",
                discovery.complete_count(),
                discovery.incomplete_count()
            ),
        ));
        for warning in &discovery.warnings {
            match warning {
                DiscoveryWarning::MissingMate { sample_id, .. } | DiscoveryWarning::SampleNotFound { sample_id } => {
                    report.record(StageResult::sample(
                        StageName::Discover,
                        sample_id,
                        StageStatus::Skipped,
                        warning.to_string(),
                    ));
                }
                _ => {}
            }
        }

        Ok(discovery.complete_samples().cloned().collect())
    }

    /// One batch-level quality assessment. Zero files is success with nothing processed.
    async fn assess(&self, stage: StageName, files: Vec<PathBuf>, output_dir: PathBuf, log_name: &str) -> StageResult {
        if files.is_empty() {
            warn!("{}: no input files; nothing to assess", stage);
            return StageResult::batch(stage, StageStatus::Success, "0 files processed");
        }

        info!("{}: assessing {} file(s) with {}", stage, files.len(), self.assessor.name());
        let count = files.len();
        let request = QcRequest {
            files,
            output_dir,
            temp_dir: self.layout.temp.clone(),
            thread_count: self.config.thread_count,
            log_path: self.layout.tool_log(log_name),
        };

        match self.assessor.run(&request).await {
            Ok(outcome) if outcome.success() => {
                StageResult::batch(stage, StageStatus::Success, format!("{} files processed", count))
                    .with_log(outcome.log_path)
            }
            Ok(outcome) => {
                error!("{}: {} {}; see {}", stage, self.assessor.name(), outcome.describe_exit(), outcome.log_path.display());
                StageResult::batch(stage, StageStatus::Failed, format!("{} {}", self.assessor.name(), outcome.describe_exit()))
                    .with_log(outcome.log_path)
            }
            Err(e) => {
                error!("{}: {}", stage, e);
                StageResult::batch(stage, StageStatus::Failed, e.to_string()).with_log(request.log_path.clone())
            }
        }
    }

    fn trim_outputs(&self, sample: &SampleRecord) -> TrimOutputs {
        match self.config.read_mode() {
            ReadMode::PE => TrimOutputs::Paired(self.layout.paired_outputs(&sample.id)),
            ReadMode::SE => TrimOutputs::Single(self.layout.single_output(&sample.id)),
        }
    }

    /// Trims each sample in order. A failed sample is recorded and the loop moves on.
    ///
    /// # Returns
    /// Outputs of every sample that now has trimmed reads (trimmed here or already
    /// complete under resume).
    async fn trim(
        &self,
        samples: &[SampleRecord],
        report: &mut ReportAggregator,
    ) -> Result<Vec<TrimOutputs>, PipelineError> {
        let adapter_file = self.config.adapter_file.clone().ok_or_else(|| {
            PipelineError::InvalidConfig("Trimming enabled but no adapter file was resolved".to_string())
        })?;

        if samples.is_empty() {
            warn!("{}: no complete samples to trim", StageName::Trim);
        }

        let mut trimmed = Vec::new();
        let total = samples.len();
        for (idx, sample) in samples.iter().enumerate() {
            let outputs = self.trim_outputs(sample);

            if self.config.resume && outputs.completion_files().iter().all(|p| is_non_empty_file(p)) {
                info!("[{}/{}] {}: trimmed outputs present, skipping", idx + 1, total, sample.id);
                report.record(StageResult::sample(
                    StageName::Trim,
                    &sample.id,
                    StageStatus::Skipped,
                    "trimmed outputs already present",
                ));
                trimmed.push(outputs);
                continue;
            }

            info!("[{}/{}] Trimming {} ({})", idx + 1, total, sample.id, sample.naming_pattern);
            let request = TrimRequest {
                mode: self.config.read_mode(),
                sample_id: sample.id.clone(),
                inputs: sample.input_paths(),
                outputs: outputs.clone(),
                adapter_file: adapter_file.clone(),
                quality: self.config.quality,
                phred: self.config.phred,
                thread_count: self.config.thread_count,
                log_path: self.layout.tool_log(&format!("{}_{}", sample.id, self.trimmer.name())),
            };

            let result = match self.trimmer.run(&request).await {
                Ok(outcome) if outcome.success() => {
                    trimmed.push(outputs);
                    StageResult::sample(StageName::Trim, &sample.id, StageStatus::Success, "trimmed")
                        .with_log(outcome.log_path)
                }
                Ok(outcome) => {
                    error!(
                        "{}: {} {}; see {}",
                        sample.id,
                        self.trimmer.name(),
                        outcome.describe_exit(),
                        outcome.log_path.display()
                    );
                    StageResult::sample(
                        StageName::Trim,
                        &sample.id,
                        StageStatus::Failed,
                        format!("{} {}", self.trimmer.name(), outcome.describe_exit()),
                    )
                    .with_log(outcome.log_path)
                }
                Err(e) => {
                    error!("{}: {}", sample.id, e);
                    StageResult::sample(StageName::Trim, &sample.id, StageStatus::Failed, e.to_string())
                        .with_log(request.log_path.clone())
                }
            };
            report.record(result);
        }
        Ok(trimmed)
    }
}


/// Runs the pipeline with FastQC and Trimmomatic from PATH.
pub async fn run(config: Arc<RunConfig>) -> Result<RunSummary, PipelineError> {
    Orchestrator::new(config, FastQc::default(), Trimmomatic::default())
        .run()
        .await
}
