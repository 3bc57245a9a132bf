//! Ties option translation, the engine, and UI state together.
//!
//! The orchestrator owns the only mutable state in the application: a
//! [`UiState`] published through a `watch` channel and the slot for the one
//! active job. HTTP handlers and the CLI call into it; the download itself
//! runs on a background task that reports back by updating the state.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::watch;
use uuid::Uuid;

use crate::config::DownloadConfig;
use crate::control::TransferControl;
use crate::engine::{DownloadOutcome, Engine};
use crate::error::{Error, Result};
use crate::format::{format_bytes, format_duration, format_speed};
use crate::notify::{Notification, toast_text};
use crate::options::{EngineConfig, prepare};
use crate::progress::{DownloadProgress, ProgressUpdate};
use crate::request::DownloadForm;
use crate::url::{is_youtube_url, resolve_url};

pub const INVALID_URL_TEXT: &str = "Please enter a valid YouTube URL.";
pub const MISSING_SELECTION_TEXT: &str = "Missing selection or options.";
pub const IN_PROGRESS_TEXT: &str = "Download in progress. Please wait...";
pub const PAUSED_TEXT: &str = "Download paused.";

/// Lifecycle of the current (or last) job.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Paused,
    Succeeded,
    Failed,
}

impl Phase {
    /// Returns true while a job holds the engine.
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Running | Self::Paused)
    }
}

/// Severity of a [`Message`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Info,
    Success,
    Warning,
    Error,
}

/// A line of feedback shown above the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub level: Level,
    pub text: String,
}

impl Message {
    #[must_use]
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: Level::Info,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            level: Level::Warning,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: Level::Error,
            text: text.into(),
        }
    }
}

/// Identity of a started job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobInfo {
    pub id: Uuid,
    pub url: String,
    pub started_at: DateTime<Utc>,
}

/// Everything the browser renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UiState {
    pub phase: Phase,
    /// Whole percent of the current transfer.
    pub percent: u8,
    pub status: String,
    pub message: Option<Message>,
    /// Folder the next download is saved to.
    pub output_folder: String,
    pub job: Option<JobInfo>,
    pub saved_files: Vec<PathBuf>,
    pub notification: Option<Notification>,
}

struct ActiveJob {
    id: Uuid,
    control: TransferControl,
}

struct Inner {
    engine: Arc<dyn Engine>,
    config: DownloadConfig,
    state: watch::Sender<UiState>,
    active: Mutex<Option<ActiveJob>>,
}

impl Inner {
    fn active(&self) -> std::sync::MutexGuard<'_, Option<ActiveJob>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_message(&self, message: Message) {
        self.state.send_modify(|s| s.message = Some(message));
    }
}

/// Runs one download at a time and publishes its state.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    /// Creates an idle orchestrator whose session folder comes from `config`.
    #[must_use]
    pub fn new(engine: Arc<dyn Engine>, config: DownloadConfig) -> Self {
        let (state, _) = watch::channel(UiState {
            output_folder: config.output_folder.clone(),
            ..UiState::default()
        });
        Self {
            inner: Arc::new(Inner {
                engine,
                config,
                state,
                active: Mutex::new(None),
            }),
        }
    }

    /// Returns a receiver that sees every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<UiState> {
        self.inner.state.subscribe()
    }

    /// Returns the current state.
    #[must_use]
    pub fn snapshot(&self) -> UiState {
        self.inner.state.borrow().clone()
    }

    /// Returns the session's output folder.
    #[must_use]
    pub fn output_folder(&self) -> String {
        self.inner.state.borrow().output_folder.clone()
    }

    /// Changes the folder used by the next download.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingSelection`] if `folder` is blank.
    pub fn set_output_folder(&self, folder: &str) -> Result<()> {
        let folder = folder.trim();
        if folder.is_empty() {
            self.inner.set_message(Message::error(MISSING_SELECTION_TEXT));
            return Err(Error::MissingSelection("output folder".to_string()));
        }
        log::info!("Output folder set to {folder}");
        self.inner.state.send_modify(|s| {
            s.output_folder = folder.to_string();
            s.message = Some(Message::info(format!("Selected folder: {folder}")));
        });
        Ok(())
    }

    /// Returns true while a job is running or paused.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.inner.active().is_some()
    }

    /// Validates `form`, then starts a background download.
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyUrl`] or [`Error::MissingSelection`] for bad
    /// input, [`Error::Busy`] if a job is already active, or an I/O error if
    /// the output folder cannot be created.
    pub async fn start(&self, form: DownloadForm) -> Result<Uuid> {
        let Some(url) = resolve_url(&form.url) else {
            self.inner.set_message(Message::warning(INVALID_URL_TEXT));
            return Err(Error::EmptyUrl);
        };
        if self.is_busy() {
            return Err(Error::Busy);
        }

        let folder = self.output_folder();
        let request = DownloadForm { url, ..form }.into_request(folder.as_str());
        let config = prepare(&request, self.inner.config.apply_custom_flags).inspect_err(|e| {
            let text = match e {
                Error::MissingSelection(_) => MISSING_SELECTION_TEXT.to_string(),
                other => other.to_string(),
            };
            self.inner.set_message(Message::error(text));
        })?;
        if !is_youtube_url(&request.url) {
            log::info!("{} is not a YouTube link, handing it to yt-dlp anyway", request.url);
        }

        if let Err(e) = tokio::fs::create_dir_all(&folder).await {
            self.inner
                .set_message(Message::error(format!("Download failed: {e}")));
            return Err(e.into());
        }

        let id = Uuid::new_v4();
        let control = TransferControl::new();
        {
            let mut active = self.inner.active();
            if active.is_some() {
                return Err(Error::Busy);
            }
            *active = Some(ActiveJob {
                id,
                control: control.clone(),
            });
        }

        log::info!(
            "Starting {} download of {} into {folder}",
            request.mode.label(),
            request.url
        );
        let job = JobInfo {
            id,
            url: request.url.clone(),
            started_at: Utc::now(),
        };
        self.inner.state.send_modify(|s| {
            s.phase = Phase::Running;
            s.percent = 0;
            s.status.clear();
            s.message = Some(Message::info(IN_PROGRESS_TEXT));
            s.job = Some(job);
            s.saved_files.clear();
            s.notification = None;
        });

        tokio::spawn(run_job(
            Arc::clone(&self.inner),
            id,
            request.url,
            config,
            control,
            folder,
        ));
        Ok(id)
    }

    /// Suspends the active job. Returns false if there is none.
    pub fn pause(&self) -> bool {
        self.set_paused(Some(true)).is_some()
    }

    /// Resumes the active job. Returns false if there is none.
    pub fn resume(&self) -> bool {
        self.set_paused(Some(false)).is_some()
    }

    /// Flips pause on the active job and returns whether it is now paused.
    pub fn toggle_pause(&self) -> bool {
        self.set_paused(None).unwrap_or(false)
    }

    fn set_paused(&self, paused: Option<bool>) -> Option<bool> {
        let now = {
            let active = self.inner.active();
            let control = &active.as_ref()?.control;
            match paused {
                Some(true) => control.pause(),
                Some(false) => control.resume(),
                None => {
                    control.toggle_pause();
                }
            }
            control.is_paused()
        };
        log::info!("{}", if now { "Pause requested" } else { "Resume requested" });
        self.inner.state.send_modify(|s| {
            if s.phase.is_active() {
                s.phase = if now { Phase::Paused } else { Phase::Running };
                s.message = Some(Message::info(if now { PAUSED_TEXT } else { IN_PROGRESS_TEXT }));
            }
        });
        Some(now)
    }

    /// Cancels the active job. Returns false if there is none.
    pub fn cancel(&self) -> bool {
        let active = self.inner.active();
        let Some(job) = active.as_ref() else {
            return false;
        };
        log::info!("Cancelling job {}", job.id);
        job.control.cancel();
        true
    }

    /// Resolves once no job is running or paused.
    pub async fn wait_idle(&self) {
        let mut rx = self.subscribe();
        // the sender lives in self, so the channel stays open
        let _ = rx.wait_for(|s| !s.phase.is_active()).await;
    }
}

/// Feeds engine progress into the published state.
struct StateProgress {
    inner: Arc<Inner>,
}

impl DownloadProgress for StateProgress {
    fn on_progress(&self, update: &ProgressUpdate) {
        self.inner.state.send_if_modified(|s| {
            if !s.phase.is_active() || (s.percent == update.percent && s.status == update.status) {
                return false;
            }
            s.percent = update.percent;
            s.status.clone_from(&update.status);
            true
        });
    }

    fn on_paused(&self) {
        self.inner.state.send_if_modified(|s| {
            if s.phase != Phase::Running {
                return false;
            }
            s.phase = Phase::Paused;
            s.message = Some(Message::info(PAUSED_TEXT));
            true
        });
    }

    fn on_resumed(&self) {
        self.inner.state.send_if_modified(|s| {
            if s.phase != Phase::Paused {
                return false;
            }
            s.phase = Phase::Running;
            s.message = Some(Message::info(IN_PROGRESS_TEXT));
            true
        });
    }

    fn on_file_saved(&self, path: &Path) {
        self.inner
            .state
            .send_modify(|s| s.saved_files.push(path.to_path_buf()));
    }
}

async fn run_job(
    inner: Arc<Inner>,
    id: Uuid,
    url: String,
    config: EngineConfig,
    control: TransferControl,
    folder: String,
) {
    let progress: Arc<dyn DownloadProgress> = Arc::new(StateProgress {
        inner: Arc::clone(&inner),
    });
    let result = inner
        .engine
        .download(&url, &config, &progress, &control)
        .await;

    // publish under the slot lock so a new job cannot start in between
    let mut active = inner.active();
    match result {
        Ok(outcome) => finish_success(&inner, id, &folder, outcome),
        Err(e) => {
            if matches!(e, Error::Cancelled) {
                log::info!("Job {id} cancelled");
            } else {
                log::error!("Job {id} failed: {e}");
            }
            inner.state.send_modify(|s| {
                s.phase = Phase::Failed;
                s.message = Some(Message::error(format!("Download failed: {e}")));
            });
        }
    }
    if active.as_ref().is_some_and(|job| job.id == id) {
        *active = None;
    }
}

fn finish_success(inner: &Inner, id: Uuid, folder: &str, outcome: DownloadOutcome) {
    let stats = outcome.stats;
    log::info!(
        "Job {id} finished: {} in {} ({} average)",
        format_bytes(stats.bytes),
        format_duration(stats.elapsed),
        format_speed(stats.average_speed)
    );

    inner.state.send_modify(|s| {
        s.phase = Phase::Succeeded;
        s.percent = 100;
        s.message = Some(Message::success(toast_text(folder)));
        for file in outcome.files {
            if !s.saved_files.contains(&file) {
                s.saved_files.push(file);
            }
        }
        s.notification = Some(Notification::download_complete(id, folder));
    });
}
