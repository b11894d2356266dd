use std::env;
use std::path::{Path, PathBuf};

use log::info;

use crate::cli::Arguments;
use crate::config::defs::{PipelineError, QualityParams, RunConfig, StageToggles};
use crate::utils::adapters::{resolve_adapter_file, AdapterSearch};
use crate::utils::system::{check_thread_count, detect_physical_cores};


/// Makes `path` absolute against `cwd`.
fn absolutize(path: &str, cwd: &Path) -> PathBuf {
    let path = PathBuf::from(path);
    if path.is_absolute() { path } else { cwd.join(path) }
}

impl RunConfig {
    /// Validates parsed arguments and builds the run's single configuration value.
    /// The adapter file is resolved here, once, and only when trimming is enabled.
    ///
    /// # Arguments
    ///
    /// * `args` - Parsed command line.
    /// * `adapter_search` - Fallback locations for the adapter file.
    ///
    /// # Returns
    /// RunConfig, or InvalidConfig for a missing input directory, sample list,
    /// zero threads, or an unresolvable adapter file.
    pub fn from_args(args: Arguments, adapter_search: &AdapterSearch) -> Result<RunConfig, PipelineError> {
        let cwd = env::current_dir().map_err(|e| PipelineError::IOError(e.to_string()))?;

        let input_dir = absolutize(&args.input, &cwd);
        if !input_dir.is_dir() {
            return Err(PipelineError::InvalidConfig(format!(
                "Input directory {} does not exist",
                input_dir.display()
            )));
        }

        let output_dir = absolutize(&args.output, &cwd);
        if output_dir.exists() && !output_dir.is_dir() {
            return Err(PipelineError::InvalidConfig(format!(
                "Output path {} exists and is not a directory",
                output_dir.display()
            )));
        }

        let sample_list = match &args.samples {
            Some(list) => {
                let path = absolutize(list, &cwd);
                if !path.is_file() {
                    return Err(PipelineError::InvalidConfig(format!(
                        "Sample list {} does not exist",
                        path.display()
                    )));
                }
                Some(path)
            }
            None => None,
        };

        if args.threads == 0 {
            return Err(PipelineError::InvalidConfig("--threads must be at least 1".to_string()));
        }
        check_thread_count(args.threads, detect_physical_cores());

        let stages = StageToggles::from_args(&args);
        let paired_end = !args.single_end;

        let adapter_file = if stages.skip_trim {
            info!("Trimming disabled; adapter file not needed");
            None
        } else {
            let explicit = args.adapters.as_deref().map(|a| absolutize(a, &cwd));
            Some(resolve_adapter_file(explicit.as_deref(), paired_end, adapter_search)?)
        };

        Ok(RunConfig {
            input_dir,
            output_dir,
            sample_list,
            thread_count: args.threads,
            paired_end,
            quality: QualityParams {
                minlen: args.minlen,
                leading: args.leading,
                trailing: args.trailing,
                sliding_window: args.sliding_window,
            },
            phred: args.phred,
            adapter_file,
            stages,
            resume: args.resume,
            keep_temp: args.keep_temp,
            verbose: args.verbose,
        })
    }
}
