//! ytdl-web - a browser front-end for downloading YouTube video and audio.
//!
//! The library turns form selections into yt-dlp options, runs yt-dlp as a
//! child process, and publishes progress as a [`UiState`] that the web UI (or
//! the terminal) renders. It is independent of any specific front-end.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use ytdl_web::{DownloadConfig, DownloadForm, DownloadMode, Orchestrator, VideoQuality, YtDlpEngine};
//!
//! # async fn example() -> ytdl_web::Result<()> {
//! let config = DownloadConfig::default();
//! let engine = Arc::new(YtDlpEngine::from_config(&config));
//! let orchestrator = Orchestrator::new(engine, config);
//!
//! orchestrator
//!     .start(DownloadForm {
//!         url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
//!         mode: DownloadMode::Video,
//!         video_quality: Some(VideoQuality::P720),
//!         audio_format: None,
//!         custom_flags: None,
//!     })
//!     .await?;
//!
//! orchestrator.wait_idle().await;
//! println!("{:?}", orchestrator.snapshot().saved_files);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod config;
pub mod control;
pub mod engine;
pub mod error;
pub mod format;
pub mod notify;
pub mod options;
pub mod orchestrator;
pub mod progress;
pub mod request;
pub mod stats;
pub mod url;

#[cfg(feature = "cli")]
pub mod cli;
#[cfg(feature = "web")]
pub mod web;

// Re-export main types for convenience
pub use config::{AppConfig, DEFAULT_PORT, DownloadConfig, ServerConfig};
pub use control::TransferControl;
pub use engine::{DownloadOutcome, Engine, YtDlpEngine};
pub use error::{Error, Result};
pub use format::{format_bytes, format_duration, format_speed};
pub use notify::{Notification, toast_text};
pub use options::{EngineConfig, PostProcessor, output_path, prepare, translate};
pub use orchestrator::{JobInfo, Level, Message, Orchestrator, Phase, UiState};
pub use progress::{DownloadProgress, NoProgress, ProgressEvent, ProgressUpdate};
pub use request::{AudioFormat, DownloadForm, DownloadMode, DownloadRequest, VideoQuality};
pub use stats::{TransferStats, TransferStatsTracker};
pub use url::{extract_url, is_youtube_url, resolve_url};
