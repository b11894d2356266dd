use std::env;
use std::io::Write;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use clap::CommandFactory;
use env_logger::Builder;
use log::{error, info, LevelFilter};

use fastq_qc_pipelines::cli::{parse, Arguments};
use fastq_qc_pipelines::config::defs::{PipelineError, RunConfig};
use fastq_qc_pipelines::pipelines::qc_trim;
use fastq_qc_pipelines::utils::adapters::AdapterSearch;


#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n FASTQ QC\n-------------\n");

    let dir = env::current_dir()?;
    info!("The current directory is {:?}", dir);

    let run_config = match RunConfig::from_args(args, &AdapterSearch::from_environment()) {
        Ok(config) => Arc::new(config),
        Err(e) => exit_with(e, &run_start),
    };
    info!(
        "Input: {}  Output: {}  Mode: {}  Threads: {}",
        run_config.input_dir.display(),
        run_config.output_dir.display(),
        run_config.read_mode(),
        run_config.thread_count
    );

    let summary = match qc_trim::run(run_config).await {
        Ok(summary) => summary,
        Err(e) => exit_with(e, &run_start),
    };

    if summary.totals.failed > 0 {
        info!("{} step(s) failed; see the logs listed above", summary.totals.failed);
    }

    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}


/// Logs a fatal error and exits with status 1. Usage is printed when the
/// error came from the invocation itself.
fn exit_with(e: PipelineError, run_start: &Instant) -> ! {
    error!("Pipeline failed: {} at {} milliseconds.", e, run_start.elapsed().as_millis());
    if e.is_config_error() {
        eprintln!("{}", Arguments::command().render_usage());
    }
    std::process::exit(1);
}
