//! # ASR Stream Client - Command-Line Entry Point
//!
//! Sends one WAV/PCM file to a recognition server and prints every result line:
//!
//! ```text
//! [2pass-online] hello wor
//! [2pass-offline] hello world. | timestamp: [[80,400],[400,880]] [FINAL]
//! ```
//!
//! ## Exit Behavior:
//! - **0**: session completed, or interrupted with Ctrl-C
//! - **1**: configuration, audio, connection or protocol failure (message on stderr)

use anyhow::{Context, Result};
use asr_stream_client::config::parse_chunk_sizes;
use asr_stream_client::{AsrClient, ClientConfig, ClientError, RecognitionMode};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line flags. Anything left unset falls back to the loaded configuration.
#[derive(Parser, Debug)]
#[command(name = "asr-stream-client", version)]
#[command(about = "Stream an audio file to a speech recognition server over WebSocket", long_about = None)]
struct Cli {
    /// Configuration file (default: ./asr-client.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Recognition server host
    #[arg(long)]
    host: Option<String>,

    /// Recognition server port
    #[arg(long)]
    port: Option<u16>,

    /// Path to the WAV/PCM audio file
    #[arg(long, alias = "audio_path")]
    audio: Option<PathBuf>,

    /// Chunk size config, e.g. '2,8,3'
    #[arg(long = "chunk_size", value_parser = parse_chunk_sizes)]
    chunk_size: Option<[u32; 3]>,

    /// Chunk interval
    #[arg(long = "chunk_interval")]
    chunk_interval: Option<u32>,

    /// Recognition mode: offline, online or 2pass
    #[arg(long)]
    mode: Option<RecognitionMode>,

    /// Hotword file path ("<phrase words> <weight>" per line)
    #[arg(long, alias = "hotword_path")]
    hotword: Option<PathBuf>,

    /// Enable inverse text normalization (1) or disable it (0)
    #[arg(long = "use_itn", value_parser = clap::value_parser!(u8).range(0..=1))]
    use_itn: Option<u8>,

    /// Send audio chunks without sleeping between them
    #[arg(long = "send_without_sleep")]
    send_without_sleep: bool,

    /// Use WSS with TLS (self-signed certificates accepted unless --ssl_verify)
    #[arg(long, alias = "use_ssl")]
    ssl: bool,

    /// Verify the TLS certificate when using --ssl
    #[arg(long = "ssl_verify")]
    ssl_verify: bool,

    /// Give up if the server stays silent this long after the audio is sent
    #[arg(long = "idle_timeout_ms")]
    idle_timeout_ms: Option<u64>,

    /// Debug-level logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Layer the flags that were actually given over the loaded configuration.
    fn apply(&self, config: &mut ClientConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
        if let Some(audio) = &self.audio {
            config.stream.audio_path = Some(audio.clone());
        }
        if let Some(chunk_size) = self.chunk_size {
            config.stream.chunk_size = chunk_size.to_vec();
        }
        if let Some(interval) = self.chunk_interval {
            config.stream.chunk_interval = interval;
        }
        if let Some(mode) = self.mode {
            config.stream.mode = mode;
        }
        if let Some(hotword) = &self.hotword {
            config.stream.hotword_path = Some(hotword.clone());
        }
        if let Some(use_itn) = self.use_itn {
            config.stream.use_itn = use_itn == 1;
        }
        if self.send_without_sleep {
            config.stream.send_without_sleep = true;
        }
        if self.ssl {
            config.server.use_ssl = true;
        }
        if self.ssl_verify {
            config.server.ssl_verify = true;
        }
        if let Some(timeout) = self.idle_timeout_ms {
            config.stream.idle_timeout_ms = Some(timeout);
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let cancelled = err
                .downcast_ref::<ClientError>()
                .map(ClientError::is_cancelled)
                .unwrap_or(false);
            if cancelled {
                eprintln!("Interrupted by user");
                ExitCode::SUCCESS
            } else {
                eprintln!("Error: {:#}", err);
                ExitCode::FAILURE
            }
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = ClientConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply(&mut config);

    let client = AsrClient::new(config);
    let audio_path = client.configured_audio_path()?;
    info!("Transcribing {}", audio_path.display());

    let results = client.transcribe_until(&audio_path, interrupted()).await?;
    for result in &results {
        println!("{}", result);
    }

    Ok(())
}

/// Completes on Ctrl-C. If the handler cannot be installed, never completes.
async fn interrupted() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl-C");
}

/// Set up structured logging on stderr, keeping stdout for result lines.
///
/// ## Environment Variables:
/// - `RUST_LOG`: Controls what gets logged (e.g., "asr_stream_client=trace")
/// - If not set, defaults to "asr_stream_client=info" ("=debug" with --verbose)
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "asr_stream_client=debug"
    } else {
        "asr_stream_client=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
