//! Configuration for the server and the download engine.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::request::DEFAULT_OUTPUT_FOLDER;

/// Default web UI port.
pub const DEFAULT_PORT: u16 = 8501;

/// Configuration for download operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Folder used until the user picks another one.
    pub output_folder: String,
    /// Path or name of the yt-dlp executable.
    pub ytdlp_path: PathBuf,
    /// Arguments placed before the generated ones, e.g. `["-m", "yt_dlp"]`
    /// when `ytdlp_path` is a Python interpreter.
    pub ytdlp_args: Vec<String>,
    /// Whether custom-command flags are appended to the engine arguments.
    pub apply_custom_flags: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_folder: DEFAULT_OUTPUT_FOLDER.to_string(),
            ytdlp_path: PathBuf::from("yt-dlp"),
            ytdlp_args: Vec::new(),
            apply_custom_flags: false,
        }
    }
}

impl DownloadConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the initial output folder.
    #[must_use]
    pub fn with_output_folder(mut self, folder: impl Into<String>) -> Self {
        self.output_folder = folder.into();
        self
    }

    /// Sets the yt-dlp executable.
    #[must_use]
    pub fn with_ytdlp_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ytdlp_path = path.into();
        self
    }

    /// Sets the launcher arguments placed before the generated ones.
    #[must_use]
    pub fn with_ytdlp_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ytdlp_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether custom flags are applied.
    #[must_use]
    pub const fn with_apply_custom_flags(mut self, apply: bool) -> Self {
        self.apply_custom_flags = apply;
        self
    }
}

/// Web server configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    /// Bind port.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub download: DownloadConfig,
}

impl AppConfig {
    /// Returns `$XDG_CONFIG_HOME/ytdl-web/config.toml` (or the platform
    /// equivalent).
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("ytdl-web")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }

    /// Loads the file at `path`, writing a default one first if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created, read, or parsed.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save(path)?;
            log::info!("Wrote default config to {}", path.display());
            return Ok(config);
        }
        Self::load(path)
    }

    /// Saves the configuration atomically (write tmp + rename).
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any file operation fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        let tmp_path = path.with_extension("toml.tmp");
        std::fs::write(&tmp_path, toml_str)?;
        std::fs::rename(&tmp_path, path)?;
        Ok(())
    }

    /// Applies `YTDL_WEB_HOST` and `YTDL_WEB_PORT` overrides.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(host) = std::env::var("YTDL_WEB_HOST")
            && !host.is_empty()
        {
            self.server.host = host;
        }
        if let Some(port) = std::env::var("YTDL_WEB_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
        {
            self.server.port = port;
        }
        self
    }
}
