//! Headless mode: one download in the terminal with a progress bar.

mod progress;

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DownloadConfig;
use crate::control::TransferControl;
use crate::engine::{Engine, YtDlpEngine};
use crate::error::{Error, Result};
use crate::notify::toast_text;
use crate::options::prepare;
use crate::progress::DownloadProgress;
use crate::request::{AudioFormat, DownloadMode, DownloadRequest, VideoQuality};
use crate::url::resolve_url;

pub use progress::{IndicatifProgress, make_progress_bar, print_summary};

/// Options of a `--get` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetArgs {
    pub url: String,
    pub mode: DownloadMode,
    pub video_quality: Option<VideoQuality>,
    pub audio_format: Option<AudioFormat>,
    pub custom_flags: Option<String>,
    /// Overrides the configured output folder.
    pub output: Option<String>,
}

impl GetArgs {
    /// Builds the request, falling back to `default_folder`.
    #[must_use]
    pub fn into_request(self, default_folder: &str) -> DownloadRequest {
        DownloadRequest {
            url: self.url,
            mode: self.mode,
            video_quality: self.video_quality,
            audio_format: self.audio_format,
            custom_flags: self.custom_flags,
            output_folder: self.output.unwrap_or_else(|| default_folder.to_string()),
        }
    }
}

fn value<'a>(args: &'a [String], i: usize, flag: &str) -> Result<&'a str> {
    args.get(i + 1)
        .map(String::as_str)
        .ok_or_else(|| Error::InvalidOption(format!("{flag} requires a value")))
}

/// Scans `args` for `--get` and its companion flags.
///
/// Returns `Ok(None)` when `--get` is absent. Flags belonging to the server
/// (`--host`, `--port`, `--config`) are skipped along with their values.
///
/// # Errors
///
/// Returns [`Error::InvalidOption`] for a missing value, an unknown quality
/// or format, or more than one mode flag.
pub fn parse_get_args(args: &[String]) -> Result<Option<GetArgs>> {
    let mut url = None;
    let mut mode = None;
    let mut video_quality = None;
    let mut audio_format = None;
    let mut custom_flags = None;
    let mut output = None;

    let mut set_mode = |m: DownloadMode| {
        if mode.replace(m).is_some_and(|prev| prev != m) {
            return Err(Error::InvalidOption(
                "choose only one of --video, --audio, --best, --custom".to_string(),
            ));
        }
        Ok(())
    };

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--get" => {
                url = Some(value(args, i, "--get")?.to_string());
                i += 1;
            }
            "--video" => {
                set_mode(DownloadMode::Video)?;
                video_quality = Some(VideoQuality::from_str(value(args, i, "--video")?)?);
                i += 1;
            }
            "--audio" => {
                set_mode(DownloadMode::Audio)?;
                audio_format = Some(AudioFormat::from_str(value(args, i, "--audio")?)?);
                i += 1;
            }
            "--best" => set_mode(DownloadMode::BestQuality)?,
            "--custom" => {
                set_mode(DownloadMode::CustomCommand)?;
                custom_flags = Some(value(args, i, "--custom")?.to_string());
                i += 1;
            }
            "-o" | "--output" => {
                output = Some(value(args, i, "--output")?.to_string());
                i += 1;
            }
            "--host" | "--port" | "--config" => i += 1,
            _ => {}
        }
        i += 1;
    }

    Ok(url.map(|url| GetArgs {
        url,
        mode: mode.unwrap_or(DownloadMode::BestQuality),
        video_quality,
        audio_format,
        custom_flags,
        output,
    }))
}

/// Downloads one URL in the terminal. Ctrl-C cancels.
///
/// # Errors
///
/// Returns a validation error for bad input, or the engine error if the
/// download fails or is cancelled.
pub async fn run_get(config: &DownloadConfig, args: GetArgs) -> Result<()> {
    let url = resolve_url(&args.url).ok_or(Error::EmptyUrl)?;
    let request = GetArgs { url, ..args }.into_request(&config.output_folder);
    let engine_config = prepare(&request, config.apply_custom_flags)?;
    tokio::fs::create_dir_all(&request.output_folder).await?;

    println!(
        "{} download of {} into '{}'",
        request.mode.label(),
        request.url,
        request.output_folder
    );

    let engine = YtDlpEngine::from_config(config);
    let bar = make_progress_bar();
    bar.enable_steady_tick(Duration::from_millis(250));
    let progress: Arc<dyn DownloadProgress> = Arc::new(IndicatifProgress::new(bar.clone()));

    let control = TransferControl::new();
    let interrupt = {
        let control = control.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("Interrupted, cancelling download");
                control.cancel();
            }
        })
    };

    let result = engine
        .download(&request.url, &engine_config, &progress, &control)
        .await;
    interrupt.abort();

    match result {
        Ok(outcome) => {
            bar.finish_and_clear();
            println!("{}", toast_text(&request.output_folder));
            print_summary(&outcome.files, &outcome.stats);
            Ok(())
        }
        Err(e) => {
            bar.abandon();
            Err(e)
        }
    }
}
