//! The extraction engine seam and its yt-dlp implementation.

use std::path::PathBuf;
use std::process::Stdio;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::watch;

use crate::config::DownloadConfig;
use crate::control::TransferControl;
use crate::error::{Error, Result};
use crate::options::EngineConfig;
use crate::progress::{DownloadProgress, ProgressUpdate, parse_progress_line, parse_saved_line};
use crate::stats::{TransferStats, TransferStatsTracker};

/// Result of a successful engine run.
#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    /// Final file paths reported by the engine, in order.
    pub files: Vec<PathBuf>,
    /// Byte count and timing.
    pub stats: TransferStats,
}

/// Something that can resolve a URL and download it according to an
/// [`EngineConfig`].
#[async_trait]
pub trait Engine: Send + Sync {
    /// Downloads `url`, reporting progress and honoring `control`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if `control` is cancelled, or an engine
    /// error if the transfer or post-processing fails.
    async fn download(
        &self,
        url: &str,
        config: &EngineConfig,
        progress: &Arc<dyn DownloadProgress>,
        control: &TransferControl,
    ) -> Result<DownloadOutcome>;
}

/// Runs the `yt-dlp` executable as a child process.
#[derive(Debug, Clone)]
pub struct YtDlpEngine {
    program: PathBuf,
    launcher_args: Vec<String>,
}

impl YtDlpEngine {
    /// Creates an engine that runs `program`.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            launcher_args: Vec::new(),
        }
    }

    /// Creates an engine from the download configuration.
    #[must_use]
    pub fn from_config(config: &DownloadConfig) -> Self {
        Self::new(&config.ytdlp_path).with_launcher_args(config.ytdlp_args.clone())
    }

    /// Sets arguments placed before the generated ones.
    #[must_use]
    pub fn with_launcher_args(mut self, args: Vec<String>) -> Self {
        self.launcher_args = args;
        self
    }

    /// Returns the program this engine launches.
    #[must_use]
    pub const fn program(&self) -> &PathBuf {
        &self.program
    }

    /// Returns the full argument list for one download.
    #[must_use]
    pub fn args(&self, url: &str, config: &EngineConfig) -> Vec<String> {
        let mut args = self.launcher_args.clone();
        args.extend(config.to_args());
        args.push("--".to_string());
        args.push(url.to_string());
        args
    }

    fn command(&self, url: &str, config: &EngineConfig) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(url, config))
            .env("PYTHONIOENCODING", "utf-8")
            .env("PYTHONUNBUFFERED", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        // own group, so pause and cancel also reach ffmpeg children
        #[cfg(unix)]
        cmd.process_group(0);
        cmd
    }
}

#[async_trait]
impl Engine for YtDlpEngine {
    async fn download(
        &self,
        url: &str,
        config: &EngineConfig,
        progress: &Arc<dyn DownloadProgress>,
        control: &TransferControl,
    ) -> Result<DownloadOutcome> {
        log::debug!("Running {} {:?}", self.program.display(), self.args(url, config));

        let mut child = self
            .command(url, config)
            .spawn()
            .map_err(|source| Error::EngineUnavailable {
                program: self.program.display().to_string(),
                source,
            })?;

        let group = ProcessGroup::of(&child);
        let mut paused = control.pause_changes();
        let stopped = *paused.borrow_and_update();
        if stopped {
            group.suspend();
        }
        let suspender = tokio::spawn(follow_pause(group, paused, stopped));

        let result = supervise(&mut child, group, progress.as_ref(), control).await;
        suspender.abort();
        result
    }
}

/// Pumps the child's output and waits for it to exit.
async fn supervise(
    child: &mut Child,
    group: ProcessGroup,
    progress: &dyn DownloadProgress,
    control: &TransferControl,
) -> Result<DownloadOutcome> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| std::io::Error::other("engine stdout not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| std::io::Error::other("engine stderr not captured"))?;
    let stderr_task = tokio::spawn(collect_error_text(stderr));

    let tracker = TransferStatsTracker::new();
    let mut files = Vec::new();

    let pumped = pump_output(BufReader::new(stdout), progress, control, &tracker, &mut files).await;
    if let Err(e) = pumped {
        group.kill();
        let _ = child.kill().await;
        stderr_task.abort();
        return Err(e);
    }

    // stdout closed; post-processing may still be running
    let status = tokio::select! {
        status = child.wait() => status?,
        () = control.cancelled() => {
            group.kill();
            let _ = child.kill().await;
            stderr_task.abort();
            return Err(Error::Cancelled);
        }
    };
    let error_text = stderr_task.await.ok().flatten();

    if !status.success() {
        return Err(Error::Engine {
            code: status.code(),
            message: error_text.unwrap_or_else(|| format!("yt-dlp exited with {status}")),
        });
    }

    Ok(DownloadOutcome {
        files,
        stats: tracker.finish(),
    })
}

/// Stops and continues the child's process group as the paused flag changes.
///
/// Runs until aborted. `stopped` is the state the group is already in.
async fn follow_pause(group: ProcessGroup, mut paused: watch::Receiver<bool>, mut stopped: bool) {
    while paused.changed().await.is_ok() {
        let now = *paused.borrow_and_update();
        if now == stopped {
            continue;
        }
        if now {
            group.suspend();
        } else {
            group.resume();
        }
        stopped = now;
    }
}

/// The child's process group, addressed by the leader's pid.
#[derive(Debug, Clone, Copy)]
struct ProcessGroup(Option<u32>);

impl ProcessGroup {
    fn of(child: &Child) -> Self {
        Self(child.id())
    }
}

#[cfg(unix)]
impl ProcessGroup {
    fn send(self, signal: nix::sys::signal::Signal) {
        let Some(pgid) = self.0.and_then(|id| i32::try_from(id).ok()) else {
            return;
        };
        if let Err(e) = nix::sys::signal::killpg(nix::unistd::Pid::from_raw(pgid), signal) {
            log::debug!("Could not send {signal:?} to process group {pgid}: {e}");
        }
    }

    fn suspend(self) {
        log::debug!("Stopping yt-dlp process group");
        self.send(nix::sys::signal::Signal::SIGSTOP);
    }

    fn resume(self) {
        log::debug!("Continuing yt-dlp process group");
        self.send(nix::sys::signal::Signal::SIGCONT);
    }

    /// Continues the group first so stopped members see the kill.
    fn kill(self) {
        self.resume();
        self.send(nix::sys::signal::Signal::SIGKILL);
    }
}

// Without job control signals, pause only stops reading the child's output.
#[cfg(not(unix))]
impl ProcessGroup {
    #[allow(clippy::unused_self)]
    const fn suspend(self) {}

    #[allow(clippy::unused_self)]
    const fn resume(self) {}

    #[allow(clippy::unused_self)]
    const fn kill(self) {}
}

/// Reads engine stdout until it closes, dispatching progress and saved-file
/// records.
///
/// Each progress record passes through [`TransferControl::checkpoint`] first,
/// so nothing more is read while paused.
///
/// # Errors
///
/// Returns [`Error::Cancelled`] on cancellation, or an I/O error from the
/// reader.
pub async fn pump_output<R>(
    reader: R,
    progress: &dyn DownloadProgress,
    control: &TransferControl,
    tracker: &TransferStatsTracker,
    files: &mut Vec<PathBuf>,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = tokio::select! {
            () = control.cancelled() => return Err(Error::Cancelled),
            line = lines.next_line() => line?,
        };
        let Some(line) = line else { break };

        if let Some(event) = parse_progress_line(&line) {
            control.checkpoint(progress).await?;
            if let Some(bytes) = event.downloaded_bytes {
                tracker.record_cumulative(bytes);
            }
            if let Some(update) = ProgressUpdate::from_event(&event) {
                progress.on_progress(&update);
            }
        } else if let Some(path) = parse_saved_line(&line) {
            log::info!("Saved {}", path.display());
            progress.on_file_saved(path);
            files.push(path.to_path_buf());
        } else if !line.trim().is_empty() {
            log::debug!("yt-dlp: {line}");
        }
    }
    Ok(())
}

/// Drains engine stderr, returning the most relevant error line.
///
/// Prefers the last `ERROR:` line, falling back to the last non-empty line.
async fn collect_error_text<R>(stderr: R) -> Option<String>
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(stderr).lines();
    let mut last_error = None;
    let mut last_line = None;
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line.starts_with("ERROR:") {
            log::error!("yt-dlp: {line}");
            last_error = Some(line.clone());
        } else if line.starts_with("WARNING:") {
            log::warn!("yt-dlp: {line}");
        } else {
            log::debug!("yt-dlp: {line}");
        }
        last_line = Some(line);
    }
    last_error.or(last_line)
}
