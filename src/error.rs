//! Error types for the ytdl-web library.

use thiserror::Error;

/// Errors that can occur while preparing or running a download.
#[derive(Error, Debug)]
pub enum Error {
    /// No URL was supplied.
    #[error("no URL given")]
    EmptyUrl,

    /// The chosen mode needs a sub-option that was never selected.
    #[error("missing selection: {0}")]
    MissingSelection(String),

    /// A quality, format, or mode string that is not recognized.
    #[error("invalid option: {0}")]
    InvalidOption(String),

    /// Another download is already running.
    #[error("a download is already in progress")]
    Busy,

    /// The transfer was cancelled by the user.
    #[error("download cancelled by user")]
    Cancelled,

    /// The extraction engine could not be started.
    #[error("could not start {program}: {source}")]
    EngineUnavailable {
        /// Program that failed to launch.
        program: String,
        /// Underlying spawn error.
        #[source]
        source: std::io::Error,
    },

    /// The extraction engine exited unsuccessfully.
    #[error("{message}")]
    Engine {
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Last error line reported by the engine.
        message: String,
    },

    /// I/O error during file operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be read or written.
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// Returns true for input problems that are reported inline without
    /// invoking the engine.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyUrl | Self::MissingSelection(_) | Self::InvalidOption(_)
        )
    }
}

/// A specialized `Result` type for ytdl-web operations.
pub type Result<T> = std::result::Result<T, Error>;
