//! Download request types collected from the UI.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Output folder used when none has been chosen.
pub const DEFAULT_OUTPUT_FOLDER: &str = "downloads";

/// What kind of download the user asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadMode {
    /// Video capped at a chosen height.
    Video,
    /// Audio only, converted to a chosen codec.
    Audio,
    /// Whatever single format the engine considers best.
    BestQuality,
    /// Raw engine flags typed by the user.
    CustomCommand,
}

impl DownloadMode {
    /// Returns the label shown in the UI.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Video => "Video",
            Self::Audio => "Audio",
            Self::BestQuality => "Best Quality",
            Self::CustomCommand => "Custom Command",
        }
    }
}

/// Maximum video height choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VideoQuality {
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "360p")]
    P360,
    #[serde(rename = "240p")]
    P240,
    #[serde(rename = "144p")]
    P144,
}

impl VideoQuality {
    pub const ALL: [Self; 6] = [
        Self::P1080,
        Self::P720,
        Self::P480,
        Self::P360,
        Self::P240,
        Self::P144,
    ];

    /// Returns the label, e.g. `"720p"`.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::P1080 => "1080p",
            Self::P720 => "720p",
            Self::P480 => "480p",
            Self::P360 => "360p",
            Self::P240 => "240p",
            Self::P144 => "144p",
        }
    }

    /// Returns the numeric part of the label (`720p` → 720).
    #[must_use]
    pub const fn height(self) -> u32 {
        match self {
            Self::P1080 => 1080,
            Self::P720 => 720,
            Self::P480 => 480,
            Self::P360 => 360,
            Self::P240 => 240,
            Self::P144 => 144,
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for VideoQuality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|q| q.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidOption(format!("unknown video quality '{s}'")))
    }
}

/// Audio codecs the engine can extract to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Wav,
    Aac,
    Flac,
    M4a,
}

impl AudioFormat {
    pub const ALL: [Self; 5] = [Self::Mp3, Self::Wav, Self::Aac, Self::Flac, Self::M4a];

    /// Returns the codec name the engine expects.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Wav => "wav",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::M4a => "m4a",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::InvalidOption(format!("unknown audio format '{s}'")))
    }
}

/// The form fields submitted by the browser, before the session folder is
/// attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadForm {
    pub url: String,
    pub mode: DownloadMode,
    #[serde(default)]
    pub video_quality: Option<VideoQuality>,
    #[serde(default)]
    pub audio_format: Option<AudioFormat>,
    #[serde(default)]
    pub custom_flags: Option<String>,
}

impl DownloadForm {
    /// Attaches the output folder, producing a full request.
    #[must_use]
    pub fn into_request(self, output_folder: impl Into<String>) -> DownloadRequest {
        DownloadRequest {
            url: self.url,
            mode: self.mode,
            video_quality: self.video_quality,
            audio_format: self.audio_format,
            custom_flags: self.custom_flags,
            output_folder: output_folder.into(),
        }
    }
}

/// A single download as selected by the user.
///
/// Only the sub-option matching `mode` is consulted; the others are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadRequest {
    pub url: String,
    pub mode: DownloadMode,
    pub video_quality: Option<VideoQuality>,
    pub audio_format: Option<AudioFormat>,
    pub custom_flags: Option<String>,
    pub output_folder: String,
}

impl DownloadRequest {
    /// Creates a request for `url` in `mode` with no sub-options selected.
    #[must_use]
    pub fn new(url: impl Into<String>, mode: DownloadMode) -> Self {
        Self {
            url: url.into(),
            mode,
            video_quality: None,
            audio_format: None,
            custom_flags: None,
            output_folder: DEFAULT_OUTPUT_FOLDER.to_string(),
        }
    }

    /// Sets the video quality.
    #[must_use]
    pub const fn with_video_quality(mut self, quality: VideoQuality) -> Self {
        self.video_quality = Some(quality);
        self
    }

    /// Sets the audio format.
    #[must_use]
    pub const fn with_audio_format(mut self, format: AudioFormat) -> Self {
        self.audio_format = Some(format);
        self
    }

    /// Sets the raw custom flags.
    #[must_use]
    pub fn with_custom_flags(mut self, flags: impl Into<String>) -> Self {
        self.custom_flags = Some(flags.into());
        self
    }

    /// Sets the output folder.
    #[must_use]
    pub fn with_output_folder(mut self, folder: impl Into<String>) -> Self {
        self.output_folder = folder.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_quality_height_strips_suffix() {
        assert_eq!(VideoQuality::P1080.height(), 1080);
        assert_eq!(VideoQuality::P720.height(), 720);
        assert_eq!(VideoQuality::P144.height(), 144);
    }

    #[test]
    fn video_quality_parses_labels() {
        assert_eq!("720p".parse::<VideoQuality>().unwrap(), VideoQuality::P720);
        assert_eq!(" 1080P ".parse::<VideoQuality>().unwrap(), VideoQuality::P1080);
        assert!("4k".parse::<VideoQuality>().is_err());
    }

    #[test]
    fn audio_format_parses_names() {
        assert_eq!("flac".parse::<AudioFormat>().unwrap(), AudioFormat::Flac);
        assert_eq!("M4A".parse::<AudioFormat>().unwrap(), AudioFormat::M4a);
        assert!(matches!(
            "ogg".parse::<AudioFormat>(),
            Err(Error::InvalidOption(_))
        ));
    }

    #[test]
    fn form_deserializes_from_browser_json() {
        let form: DownloadForm = serde_json::from_str(
            r#"{"url":"https://youtu.be/abc","mode":"video","video_quality":"480p"}"#,
        )
        .unwrap();
        assert_eq!(form.mode, DownloadMode::Video);
        assert_eq!(form.video_quality, Some(VideoQuality::P480));
        assert!(form.audio_format.is_none());

        let request = form.into_request("media");
        assert_eq!(request.output_folder, "media");
    }

    #[test]
    fn best_quality_mode_uses_snake_case() {
        let mode: DownloadMode = serde_json::from_str(r#""best_quality""#).unwrap();
        assert_eq!(mode, DownloadMode::BestQuality);
        assert_eq!(mode.label(), "Best Quality");
    }

    #[test]
    fn request_defaults_to_downloads_folder() {
        let request = DownloadRequest::new("https://youtu.be/abc", DownloadMode::BestQuality);
        assert_eq!(request.output_folder, "downloads");
    }
}
