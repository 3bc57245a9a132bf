use std::env;
use std::path::PathBuf;

use env_logger::Env;
use ytdl_web::{AppConfig, DEFAULT_PORT};

struct Args {
    host: Option<String>,
    port: Option<u16>,
    config: Option<PathBuf>,
}

fn print_usage() {
    eprintln!("Usage: ytdl-web [OPTIONS]");
    eprintln!("       ytdl-web --get <URL> [--video <Q> | --audio <F> | --best | --custom <FLAGS>] [-o <DIR>]");
    eprintln!();
    eprintln!("Without --get, serves the web UI (default: http://127.0.0.1:{DEFAULT_PORT}).");
    eprintln!();
    eprintln!("Server options:");
    eprintln!("  --host <HOST>       Bind address (env: YTDL_WEB_HOST)");
    eprintln!("  --port <PORT>       Bind port (env: YTDL_WEB_PORT)");
    eprintln!("  --config <PATH>     Config file (default: {})", AppConfig::default_path().display());
    eprintln!();
    eprintln!("Download options:");
    eprintln!("  --get <URL>         Download one URL in the terminal and exit");
    eprintln!("  --video <Q>         Video capped at 1080p, 720p, 480p, 360p, 240p or 144p");
    eprintln!("  --audio <F>         Audio only as mp3, wav, aac, flac or m4a");
    eprintln!("  --best              Best single format (default)");
    eprintln!("  --custom <FLAGS>    Custom yt-dlp options, quoted as one argument");
    eprintln!("  -o, --output <DIR>  Output folder (default: from config)");
    eprintln!("  -h, --help          Show this help");
}

fn next_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    if let Some(value) = args.get(*i) {
        value.clone()
    } else {
        eprintln!("Error: {flag} requires a value");
        std::process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Args {
    let mut host = None;
    let mut port = None;
    let mut config = None;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--host" => host = Some(next_value(args, &mut i, "--host")),
            "--port" => {
                let value = next_value(args, &mut i, "--port");
                if let Ok(p) = value.parse() {
                    port = Some(p);
                } else {
                    eprintln!("Error: invalid port '{value}'");
                    std::process::exit(1);
                }
            }
            "--config" => config = Some(PathBuf::from(next_value(args, &mut i, "--config"))),
            // download flags are parsed by the cli module
            "--get" | "--video" | "--audio" | "--custom" | "-o" | "--output" => i += 1,
            "--best" => {}
            "-h" | "--help" => {
                print_usage();
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown option: {other}");
                print_usage();
                std::process::exit(1);
            }
        }
        i += 1;
    }

    Args { host, port, config }
}

fn load_config(path: Option<PathBuf>) -> ytdl_web::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_or_create(&path)?,
        None => AppConfig::load_or_create(&AppConfig::default_path()).unwrap_or_else(|e| {
            log::warn!("Using default configuration: {e}");
            AppConfig::default()
        }),
    };
    Ok(config.with_env_overrides())
}

#[tokio::main]
async fn main() -> ytdl_web::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args: Vec<String> = env::args().skip(1).collect();
    let cli = parse_args(&args);

    let mut config = load_config(cli.config)?;
    if let Some(host) = cli.host {
        config.server.host = host;
    }
    if let Some(port) = cli.port {
        config.server.port = port;
    }

    #[cfg(feature = "cli")]
    match ytdl_web::cli::parse_get_args(&args) {
        Ok(Some(get)) => {
            if let Err(e) = ytdl_web::cli::run_get(&config.download, get).await {
                eprintln!("Download failed: {e}");
                std::process::exit(1);
            }
            return Ok(());
        }
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }

    #[cfg(feature = "web")]
    {
        use std::sync::Arc;

        use ytdl_web::{Orchestrator, YtDlpEngine};

        let engine = Arc::new(YtDlpEngine::from_config(&config.download));
        let orchestrator = Orchestrator::new(engine, config.download);
        ytdl_web::web::run_server(orchestrator, &config.server.host, config.server.port).await
    }
    #[cfg(not(feature = "web"))]
    {
        eprintln!("Web UI support not compiled in; use --get <URL>");
        std::process::exit(1);
    }
}
