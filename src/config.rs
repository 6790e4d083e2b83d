//! # Configuration Management
//!
//! This module handles loading the client configuration from multiple sources:
//! - Built-in defaults (the `Default` impl below)
//! - A TOML configuration file (`asr-client.toml`, or an explicit `--config` path)
//! - Environment variables (with `ASR_` prefix, `__` between section and key)
//!
//! ## Configuration Priority (highest to lowest):
//! 1. Command-line flags (applied by the binary after loading)
//! 2. Environment variables (`ASR_SERVER__HOST`, `ASR_STREAM__MODE`, ...)
//! 3. Configuration file
//! 4. Default values
//!
//! ## Session-scoped types:
//! [`ClientConfig`] is the loaded, mutable surface. [`SessionConfig`] is what one
//! session actually runs with: validated, hotwords resolved, immutable afterwards.

use crate::error::{ClientError, ClientResult};
use crate::hotwords::HotwordTable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Default file name looked up in the working directory (extension resolved by `config`).
const DEFAULT_CONFIG_NAME: &str = "asr-client";

/// Recognition mode requested from the server.
///
/// ## Modes:
/// - **offline**: one result for the whole utterance
/// - **online**: low-latency partial results while streaming
/// - **2pass**: online partials, then an offline-corrected final pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RecognitionMode {
    #[serde(rename = "offline")]
    Offline,
    #[serde(rename = "online")]
    Online,
    #[default]
    #[serde(rename = "2pass")]
    TwoPass,
}

impl RecognitionMode {
    /// Wire name of the mode, as sent in the initialization message.
    pub fn as_str(&self) -> &'static str {
        match self {
            RecognitionMode::Offline => "offline",
            RecognitionMode::Online => "online",
            RecognitionMode::TwoPass => "2pass",
        }
    }
}

impl fmt::Display for RecognitionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecognitionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "offline" => Ok(RecognitionMode::Offline),
            "online" => Ok(RecognitionMode::Online),
            "2pass" => Ok(RecognitionMode::TwoPass),
            other => Err(format!(
                "Invalid mode '{}': expected one of offline, online, 2pass",
                other
            )),
        }
    }
}

/// The `[c0, c1, c2]` look-back/current/look-ahead window plus the chunk interval.
///
/// Only `c1` and `chunk_interval` influence the frame stride; both must be
/// non-zero, which [`crate::transcription::ChunkPlanner`] enforces before any I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkConfig {
    pub chunk_size: [u32; 3],
    pub chunk_interval: u32,
}

impl ChunkConfig {
    pub fn new(chunk_size: [u32; 3], chunk_interval: u32) -> Self {
        Self {
            chunk_size,
            chunk_interval,
        }
    }
}

/// Parse a chunk size argument formatted as `"5,10,5"`.
///
/// Whitespace around each value is ignored. Exactly three non-negative
/// integers are required.
pub fn parse_chunk_sizes(value: &str) -> ClientResult<[u32; 3]> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(ClientError::Config(format!(
            "chunk_size expects exactly 3 integers, e.g. '5,10,5' (got '{}')",
            value
        )));
    }

    let mut sizes = [0u32; 3];
    for (slot, part) in sizes.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| ClientError::Config(format!("Invalid chunk_size value: {}", value)))?;
    }
    Ok(sizes)
}

/// TLS settings for the connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TlsOptions {
    /// Connect with `wss://` instead of `ws://`
    pub enabled: bool,
    /// Verify the server certificate and host name (off accepts self-signed certs)
    pub verify: bool,
}

/// Where the recognition server lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    pub tls: TlsOptions,
}

impl ServerEndpoint {
    /// WebSocket URL for this endpoint, e.g. `ws://127.0.0.1:9999`.
    pub fn url(&self) -> String {
        let scheme = if self.tls.enabled { "wss" } else { "ws" };
        format!("{}://{}:{}", scheme, self.host, self.port)
    }
}

/// Immutable settings for exactly one transcription session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub endpoint: ServerEndpoint,
    pub mode: RecognitionMode,
    pub chunk: ChunkConfig,
    pub hotwords: HotwordTable,
    pub use_itn: bool,
    /// Sleep one frame duration after every audio frame
    pub pacing: bool,
    /// Upper bound for the handshake and for each wait on an inbound frame
    pub idle_timeout: Option<Duration>,
}

/// Main client configuration, as loaded from defaults, file and environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub server: ServerConfig,
    pub stream: StreamConfig,
    pub audio: AudioSourceConfig,
}

/// Connection settings.
///
/// ## Fields:
/// - `host`, `port`: recognition server address
/// - `use_ssl`: connect over TLS (`wss://`)
/// - `ssl_verify`: verify the certificate when `use_ssl` is on
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub use_ssl: bool,
    pub ssl_verify: bool,
}

/// Streaming protocol settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Audio file to transcribe (usually given on the command line)
    pub audio_path: Option<PathBuf>,
    pub chunk_size: Vec<u32>,
    pub chunk_interval: u32,
    pub mode: RecognitionMode,
    /// File of `"<phrase words> <weight>"` lines
    pub hotword_path: Option<PathBuf>,
    pub use_itn: bool,
    /// Disable pacing and send frames back-to-back
    pub send_without_sleep: bool,
    /// Idle timeout in milliseconds; unset means wait indefinitely
    pub idle_timeout_ms: Option<u64>,
}

/// Declared source format for headerless `.pcm` input.
///
/// WAV files carry their own header, so these values only apply to raw PCM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioSourceConfig {
    pub source_sample_rate: u32,
    /// Bytes per sample (1, 2, 3 or 4)
    pub source_sample_width: u16,
    pub source_channels: u16,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 9999,
                use_ssl: false,
                ssl_verify: false,
            },
            stream: StreamConfig {
                audio_path: None,
                chunk_size: vec![2, 8, 3],
                chunk_interval: 8,
                mode: RecognitionMode::TwoPass,
                hotword_path: None,
                use_itn: true,
                send_without_sleep: false,
                idle_timeout_ms: None,
            },
            audio: AudioSourceConfig {
                source_sample_rate: 16000,
                source_sample_width: 2,
                source_channels: 1,
            },
        }
    }
}

impl ClientConfig {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// ## Configuration Loading Process:
    /// 1. Start with built-in defaults
    /// 2. Merge `path` if given (must exist), otherwise `asr-client.toml` if present
    /// 3. Merge environment variables, e.g. `ASR_SERVER__PORT=10095`
    pub fn load(path: Option<&Path>) -> ClientResult<Self> {
        let file = match path {
            Some(path) => config::File::from(path).required(true),
            None => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };

        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&ClientConfig::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("ASR")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Validate that the configuration values make sense.
    ///
    /// ## What this checks:
    /// - Server port is not 0
    /// - `chunk_size` has exactly three entries
    /// - `chunk_size[1]` and `chunk_interval` are non-zero (else the stride is zero)
    /// - `.pcm` source format values are usable
    pub fn validate(&self) -> ClientResult<()> {
        if self.server.port == 0 {
            return Err(ClientError::Config("Server port cannot be 0".to_string()));
        }

        let chunk = self.chunk_config()?;
        if chunk.chunk_size[1] == 0 || chunk.chunk_interval == 0 {
            return Err(ClientError::InvalidChunkConfig(format!(
                "chunk_size[1] and chunk_interval must be greater than 0 (got {:?}, interval {})",
                chunk.chunk_size, chunk.chunk_interval
            )));
        }

        if self.audio.source_sample_rate == 0 {
            return Err(ClientError::Config(
                "audio.source_sample_rate must be greater than 0".to_string(),
            ));
        }
        if !(1..=4).contains(&self.audio.source_sample_width) {
            return Err(ClientError::Config(format!(
                "audio.source_sample_width must be 1-4 bytes (got {})",
                self.audio.source_sample_width
            )));
        }
        if self.audio.source_channels == 0 {
            return Err(ClientError::Config(
                "audio.source_channels must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// The `[c0, c1, c2]` + interval pair as a typed value.
    pub fn chunk_config(&self) -> ClientResult<ChunkConfig> {
        let chunk_size: [u32; 3] = self.stream.chunk_size.as_slice().try_into().map_err(|_| {
            ClientError::Config(format!(
                "chunk_size expects exactly 3 integers (got {:?})",
                self.stream.chunk_size
            ))
        })?;
        Ok(ChunkConfig::new(chunk_size, self.stream.chunk_interval))
    }

    pub fn endpoint(&self) -> ServerEndpoint {
        ServerEndpoint {
            host: self.server.host.clone(),
            port: self.server.port,
            tls: TlsOptions {
                enabled: self.server.use_ssl,
                verify: self.server.ssl_verify,
            },
        }
    }

    /// Resolve everything one session needs, reading the hotword file if configured.
    ///
    /// Fails before any network activity if validation or hotword loading fails.
    pub fn session_config(&self) -> ClientResult<SessionConfig> {
        self.validate()?;

        let hotwords = match &self.stream.hotword_path {
            Some(path) => HotwordTable::load(path)?,
            None => HotwordTable::default(),
        };

        Ok(SessionConfig {
            endpoint: self.endpoint(),
            mode: self.stream.mode,
            chunk: self.chunk_config()?,
            hotwords,
            use_itn: self.stream.use_itn,
            pacing: !self.stream.send_without_sleep,
            idle_timeout: self.stream.idle_timeout_ms.map(Duration::from_millis),
        })
    }
}
