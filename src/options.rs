//! Translation of a [`DownloadRequest`] into engine options.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::progress::{PROGRESS_TEMPLATE, SAVED_FILE_TEMPLATE};
use crate::request::{AudioFormat, DownloadMode, DownloadRequest};

/// Target audio quality for extraction, in kbps.
pub const AUDIO_QUALITY: &str = "192";

/// A post-processing step the engine runs after the transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "key")]
pub enum PostProcessor {
    /// Extract the audio track and transcode it.
    ExtractAudio {
        codec: AudioFormat,
        preferred_quality: String,
    },
}

/// Options handed to the extraction engine for one download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Format selector; `None` leaves the engine default.
    pub format: Option<String>,
    /// Post-processing steps, in order.
    pub postprocessors: Vec<PostProcessor>,
    /// Output filename template.
    pub output_template: String,
    /// Raw flags appended verbatim. Empty unless custom flags are applied.
    pub custom_flags: Vec<String>,
}

impl EngineConfig {
    /// Returns a configuration with only the output template set.
    #[must_use]
    pub fn new(output_folder: &str) -> Self {
        Self {
            format: None,
            postprocessors: Vec::new(),
            output_template: output_template(output_folder),
            custom_flags: Vec::new(),
        }
    }

    /// Renders the configuration as command-line arguments (URL excluded).
    #[must_use]
    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            "--newline",
            "--progress",
            "--no-simulate",
            "--progress-template",
            PROGRESS_TEMPLATE,
            "--print",
            SAVED_FILE_TEMPLATE,
        ]
        .into_iter()
        .map(String::from)
        .collect();

        if let Some(ref format) = self.format {
            args.push("-f".to_string());
            args.push(format.clone());
        }

        for pp in &self.postprocessors {
            match pp {
                PostProcessor::ExtractAudio {
                    codec,
                    preferred_quality,
                } => {
                    args.push("-x".to_string());
                    args.push("--audio-format".to_string());
                    args.push(codec.as_str().to_string());
                    args.push("--audio-quality".to_string());
                    args.push(format!("{preferred_quality}K"));
                }
            }
        }

        args.push("-o".to_string());
        args.push(self.output_template.clone());
        args.extend(self.custom_flags.iter().cloned());
        args
    }
}

/// Returns the engine output template for a folder.
#[must_use]
pub fn output_template(output_folder: &str) -> String {
    format!("{output_folder}/%(title)s.%(ext)s")
}

/// Returns the path a file with the given title and extension is written to.
#[must_use]
pub fn output_path(output_folder: &str, title: &str, ext: &str) -> String {
    format!("{output_folder}/{title}.{ext}")
}

/// Returns the format selector for video capped at `height` pixels.
#[must_use]
pub fn video_format(height: u32) -> String {
    format!("bestvideo[height<={height}]+bestaudio/best")
}

/// Translates a request into engine options.
///
/// Custom flags are validated but not merged; see [`apply_custom_flags`].
///
/// # Errors
///
/// Returns [`Error::MissingSelection`] when the mode's sub-option was never
/// chosen, or custom flags are empty.
pub fn translate(request: &DownloadRequest) -> Result<EngineConfig> {
    let mut config = EngineConfig::new(&request.output_folder);

    match request.mode {
        DownloadMode::BestQuality => {
            config.format = Some("best".to_string());
        }
        DownloadMode::Video => {
            let quality = request
                .video_quality
                .ok_or_else(|| Error::MissingSelection("video quality".to_string()))?;
            config.format = Some(video_format(quality.height()));
        }
        DownloadMode::Audio => {
            let codec = request
                .audio_format
                .ok_or_else(|| Error::MissingSelection("audio format".to_string()))?;
            config.format = Some("bestaudio/best".to_string());
            config.postprocessors.push(PostProcessor::ExtractAudio {
                codec,
                preferred_quality: AUDIO_QUALITY.to_string(),
            });
        }
        DownloadMode::CustomCommand => {
            if request
                .custom_flags
                .as_deref()
                .is_none_or(|f| f.trim().is_empty())
            {
                return Err(Error::MissingSelection("custom command options".to_string()));
            }
            config.postprocessors.clear();
        }
    }

    Ok(config)
}

/// Appends the request's custom flags to `config`, split with shell quoting
/// rules so a quoted value stays one argument.
///
/// Only meaningful in custom-command mode; other modes are left untouched.
///
/// # Errors
///
/// Returns [`Error::InvalidOption`] if the flags contain an unbalanced quote
/// or a dangling escape.
pub fn apply_custom_flags(config: &mut EngineConfig, request: &DownloadRequest) -> Result<()> {
    if request.mode != DownloadMode::CustomCommand {
        return Ok(());
    }
    if let Some(ref flags) = request.custom_flags {
        let words = shlex::split(flags)
            .ok_or_else(|| Error::InvalidOption(format!("unbalanced quotes in custom options: {flags}")))?;
        config.custom_flags.extend(words);
    }
    Ok(())
}

/// Translates `request` and, if `apply_custom` is set, merges its custom
/// flags.
///
/// Custom flags that are not merged only produce a warning.
///
/// # Errors
///
/// Propagates the errors of [`translate`] and, when merging, of
/// [`apply_custom_flags`].
pub fn prepare(request: &DownloadRequest, apply_custom: bool) -> Result<EngineConfig> {
    let mut config = translate(request)?;
    if request.mode == DownloadMode::CustomCommand {
        if apply_custom {
            apply_custom_flags(&mut config, request)?;
        } else {
            log::warn!(
                "Custom options accepted but not applied (set download.apply_custom_flags to pass them to yt-dlp)"
            );
        }
    }
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::VideoQuality;

    const URL: &str = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";

    #[test]
    fn best_quality_maps_to_best() {
        let config = translate(&DownloadRequest::new(URL, DownloadMode::BestQuality)).unwrap();
        assert_eq!(config.format.as_deref(), Some("best"));
        assert!(config.postprocessors.is_empty());
    }

    #[test]
    fn video_caps_height() {
        let request =
            DownloadRequest::new(URL, DownloadMode::Video).with_video_quality(VideoQuality::P720);
        let config = translate(&request).unwrap();
        assert_eq!(
            config.format.as_deref(),
            Some("bestvideo[height<=720]+bestaudio/best")
        );
        assert!(config.format.unwrap().contains("height<=720"));
    }

    #[test]
    fn audio_registers_extraction() {
        let request =
            DownloadRequest::new(URL, DownloadMode::Audio).with_audio_format(AudioFormat::Mp3);
        let config = translate(&request).unwrap();
        assert_eq!(config.format.as_deref(), Some("bestaudio/best"));
        assert_eq!(
            config.postprocessors,
            vec![PostProcessor::ExtractAudio {
                codec: AudioFormat::Mp3,
                preferred_quality: "192".to_string(),
            }]
        );
    }

    #[test]
    fn custom_command_clears_postprocessors_and_drops_flags() {
        let request = DownloadRequest::new(URL, DownloadMode::CustomCommand)
            .with_custom_flags("-f bestvideo+bestaudio --merge-output-format mp4");
        let config = translate(&request).unwrap();
        assert!(config.postprocessors.is_empty());
        assert!(config.format.is_none());
        assert!(config.custom_flags.is_empty());
    }

    #[test]
    fn apply_custom_flags_splits_on_whitespace() {
        let request = DownloadRequest::new(URL, DownloadMode::CustomCommand)
            .with_custom_flags("  -f bestvideo+bestaudio\n--merge-output-format mp4 ");
        let mut config = translate(&request).unwrap();
        apply_custom_flags(&mut config, &request).unwrap();
        assert_eq!(
            config.custom_flags,
            vec!["-f", "bestvideo+bestaudio", "--merge-output-format", "mp4"]
        );
        assert!(config.to_args().ends_with(&["mp4".to_string()]));
    }

    #[test]
    fn apply_custom_flags_ignores_other_modes() {
        let request = DownloadRequest::new(URL, DownloadMode::BestQuality).with_custom_flags("-x");
        let mut config = translate(&request).unwrap();
        apply_custom_flags(&mut config, &request).unwrap();
        assert!(config.custom_flags.is_empty());
    }

    #[test]
    fn apply_custom_flags_keeps_quoted_values_whole() {
        let request = DownloadRequest::new(URL, DownloadMode::CustomCommand)
            .with_custom_flags(r#"-o "%(title)s - %(id)s.%(ext)s" --embed-thumbnail 'a b'"#);
        let mut config = translate(&request).unwrap();
        apply_custom_flags(&mut config, &request).unwrap();
        assert_eq!(
            config.custom_flags,
            vec!["-o", "%(title)s - %(id)s.%(ext)s", "--embed-thumbnail", "a b"]
        );
    }

    #[test]
    fn unbalanced_quotes_are_rejected() {
        let request = DownloadRequest::new(URL, DownloadMode::CustomCommand)
            .with_custom_flags(r#"-o "%(title)s.%(ext)s"#);
        let mut config = translate(&request).unwrap();
        let err = apply_custom_flags(&mut config, &request).unwrap_err();
        assert!(matches!(err, Error::InvalidOption(_)));
        assert!(matches!(prepare(&request, true), Err(Error::InvalidOption(_))));
        assert!(prepare(&request, false).is_ok());
    }

    #[test]
    fn prepare_merges_only_when_enabled() {
        let request =
            DownloadRequest::new(URL, DownloadMode::CustomCommand).with_custom_flags("--embed-thumbnail");
        assert!(prepare(&request, false).unwrap().custom_flags.is_empty());
        assert_eq!(prepare(&request, true).unwrap().custom_flags, vec!["--embed-thumbnail"]);
    }

    #[test]
    fn missing_video_quality_is_rejected() {
        let err = translate(&DownloadRequest::new(URL, DownloadMode::Video)).unwrap_err();
        assert!(matches!(err, Error::MissingSelection(_)));
    }

    #[test]
    fn missing_audio_format_is_rejected() {
        let err = translate(&DownloadRequest::new(URL, DownloadMode::Audio)).unwrap_err();
        assert!(matches!(err, Error::MissingSelection(_)));
    }

    #[test]
    fn blank_custom_flags_are_rejected() {
        let request = DownloadRequest::new(URL, DownloadMode::CustomCommand).with_custom_flags(" \t\n");
        assert!(matches!(
            translate(&request),
            Err(Error::MissingSelection(_))
        ));
        assert!(matches!(
            translate(&DownloadRequest::new(URL, DownloadMode::CustomCommand)),
            Err(Error::MissingSelection(_))
        ));
    }

    #[test]
    fn unrelated_sub_options_are_ignored() {
        let request = DownloadRequest::new(URL, DownloadMode::BestQuality)
            .with_video_quality(VideoQuality::P144)
            .with_audio_format(AudioFormat::Wav);
        let config = translate(&request).unwrap();
        assert_eq!(config.format.as_deref(), Some("best"));
        assert!(config.postprocessors.is_empty());
    }

    #[test]
    fn output_template_uses_folder() {
        let request = DownloadRequest::new(URL, DownloadMode::BestQuality).with_output_folder("media");
        let config = translate(&request).unwrap();
        assert_eq!(config.output_template, "media/%(title)s.%(ext)s");
    }

    #[test]
    fn output_path_matches_template() {
        assert_eq!(output_path("downloads", "MyVideo", "mp4"), "downloads/MyVideo.mp4");
    }

    #[test]
    fn audio_args_request_extraction() {
        let request =
            DownloadRequest::new(URL, DownloadMode::Audio).with_audio_format(AudioFormat::Flac);
        let args = translate(&request).unwrap().to_args();
        let joined = args.join(" ");
        assert!(joined.contains("-f bestaudio/best"));
        assert!(joined.contains("-x --audio-format flac --audio-quality 192K"));
        assert!(joined.contains("-o downloads/%(title)s.%(ext)s"));
        assert!(args.contains(&PROGRESS_TEMPLATE.to_string()));
    }

    #[test]
    fn custom_args_have_no_format() {
        let request = DownloadRequest::new(URL, DownloadMode::CustomCommand).with_custom_flags("-F");
        let args = translate(&request).unwrap().to_args();
        assert!(!args.contains(&"-f".to_string()));
        assert!(!args.contains(&"-x".to_string()));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn any_request() -> impl Strategy<Value = DownloadRequest> {
            (
                0usize..4,
                proptest::option::of(0usize..VideoQuality::ALL.len()),
                proptest::option::of(0usize..AudioFormat::ALL.len()),
                proptest::option::of("[ -~]{0,24}"),
                "[a-z]{1,12}",
            )
                .prop_map(|(mode, quality, audio, flags, folder)| {
                    let mode = [
                        DownloadMode::Video,
                        DownloadMode::Audio,
                        DownloadMode::BestQuality,
                        DownloadMode::CustomCommand,
                    ][mode];
                    DownloadRequest {
                        url: URL.to_string(),
                        mode,
                        video_quality: quality.map(|i| VideoQuality::ALL[i]),
                        audio_format: audio.map(|i| AudioFormat::ALL[i]),
                        custom_flags: flags,
                        output_folder: folder,
                    }
                })
        }

        proptest! {
            #[test]
            fn translate_is_idempotent(request in any_request()) {
                let first = translate(&request).map(|c| serde_json::to_vec(&c).unwrap());
                let second = translate(&request).map(|c| serde_json::to_vec(&c).unwrap());
                match (first, second) {
                    (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                    (Err(_), Err(_)) => {}
                    _ => prop_assert!(false, "translation outcome changed between calls"),
                }
            }

            #[test]
            fn translate_never_sets_custom_flags(request in any_request()) {
                if let Ok(config) = translate(&request) {
                    prop_assert!(config.custom_flags.is_empty());
                }
            }
        }
    }
}
