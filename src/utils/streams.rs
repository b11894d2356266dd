// src/utils/streams.rs: Child process output handling
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{anyhow, Result};
use log::{debug, warn};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, Command};
use tokio_stream::wrappers::SplitStream;
use tokio_stream::StreamExt;


/// Everything a child wrote, split into lines. Bytes that are not UTF-8 are replaced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChildOutput {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
}

/// Exit status of one tool invocation and where its output went.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutcome {
    /// None when the process was terminated by a signal.
    pub exit_code: Option<i32>,
    pub log_path: PathBuf,
}

impl ToolOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn describe_exit(&self) -> String {
        match self.exit_code {
            Some(code) => format!("exit status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}


fn lossy_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

async fn collect_lines<R: AsyncRead + Unpin>(reader: Option<R>) -> io::Result<Vec<String>> {
    let Some(reader) = reader else {
        return Ok(Vec::new());
    };
    let mut lines = Vec::new();
    let mut segments = BufReader::new(reader).split(b'\n');
    while let Some(bytes) = segments.next_segment().await? {
        lines.push(lossy_line(&bytes));
    }
    Ok(lines)
}

/// Reads a child's stdout and stderr to EOF. Both pipes are drained together, so a
/// child that fills one of them while the other is still open cannot stall.
///
/// # Arguments
///
/// * `child` - Spawned child; whichever of stdout/stderr is piped gets read.
///
/// # Returns
/// ChildOutput with the lines of each stream, without terminators.
pub async fn read_child_output(child: &mut Child) -> Result<ChildOutput> {
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();
    if stdout.is_none() && stderr.is_none() {
        return Err(anyhow!("Child has neither stdout nor stderr piped"));
    }
    let (stdout, stderr) = tokio::try_join!(collect_lines(stdout), collect_lines(stderr))?;
    Ok(ChildOutput { stdout, stderr })
}

/// Runs `tool` with `args` to completion, writing the command line followed by the
/// interleaved stdout/stderr to `log_path`. No timeout is applied.
///
/// The child is always waited on before returning. Output is copied as raw bytes; a
/// log write failure stops the copy (the pipes are still drained) but not the tool.
///
/// # Arguments
///
/// * `tool` - Executable name or path.
/// * `args` - Arguments, already split.
/// * `log_path` - Log file; truncated if it exists.
///
/// # Returns
/// ToolOutcome with the exit code. Errors when the log cannot be created, the process
/// cannot be spawned or waited on, or its pipes cannot be read (the tool is killed).
pub async fn run_logged(tool: &str, args: &[String], log_path: &Path) -> Result<ToolOutcome> {
    let log_file = File::create(log_path)
        .await
        .map_err(|e| anyhow!("Failed to create log {}: {}", log_path.display(), e))?;
    let mut log = BufWriter::new(log_file);
    log.write_all(format!("$ {} {}\n", tool, args.join(" ")).as_bytes()).await?;

    debug!("Running {} {}", tool, args.join(" "));
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| anyhow!("Failed to spawn {}: {}", tool, e))?;

    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        let _ = child.start_kill();
        let _ = child.wait().await;
        return Err(anyhow!("Failed to get stdout/stderr from {}", tool));
    };
    let mut merged = SplitStream::new(BufReader::new(stdout).split(b'\n'))
        .merge(SplitStream::new(BufReader::new(stderr).split(b'\n')));

    let mut log_ok = true;
    let mut read_error = None;
    while let Some(segment) = merged.next().await {
        let bytes = match segment {
            Ok(bytes) => bytes,
            Err(e) => {
                read_error = Some(e);
                break;
            }
        };
        if log_ok {
            if let Err(e) = write_log_line(&mut log, &bytes).await {
                warn!("Stopped writing {}: {}", log_path.display(), e);
                log_ok = false;
            }
        }
    }
    drop(merged);

    if let Some(e) = read_error {
        // undrained pipes would block the tool; stop it so nothing outlives this call
        let _ = child.start_kill();
        let _ = child.wait().await;
        return Err(anyhow!("Failed reading output of {}: {}", tool, e));
    }

    let status = child.wait().await?;
    if log_ok {
        let finished = async {
            log.write_all(format!("# {} finished: {}\n", tool, status).as_bytes()).await?;
            log.flush().await
        };
        if let Err(e) = finished.await {
            warn!("Could not finish {}: {}", log_path.display(), e);
        }
    }

    Ok(ToolOutcome {
        exit_code: status.code(),
        log_path: log_path.to_path_buf(),
    })
}

async fn write_log_line(log: &mut BufWriter<File>, bytes: &[u8]) -> io::Result<()> {
    log.write_all(bytes).await?;
    log.write_all(b"\n").await
}
