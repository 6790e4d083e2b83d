//! # Error Handling
//!
//! Every way a transcription session can end badly is one variant of [`ClientError`].
//! A session either yields a complete, ordered transcript list or exactly one of
//! these errors; there is no partial-success mode.
//!
//! ## Error Categories:
//! - **Pre-flight** (before any network I/O): `FileNotFound`, `UnsupportedFormat`,
//!   `InvalidAudio`, `InvalidChunkConfig`, `HotwordFileError`, `Config`
//! - **Connection**: `ConnectionFailure`, `Timeout`
//! - **Mid-stream**: `SendFailure`, `ReceiveFailure`, `MalformedMessage`
//! - **Caller-initiated**: `Cancelled`
//! - **Environment**: `Runtime`
//!
//! ## Rust Concepts:
//! - **thiserror**: Derives `Display` and `std::error::Error` from the `#[error]` attributes
//! - **From trait**: Lets `?` convert library errors into our own variants

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Terminal outcome of a failed session.
///
/// ## Usage Example:
/// ```rust
/// use asr_stream_client::ClientError;
/// let err = ClientError::UnsupportedFormat(".mp3".to_string());
/// assert!(err.to_string().contains(".mp3"));
/// ```
#[derive(Debug, Error)]
pub enum ClientError {
    /// The source audio (or another required input file) does not exist
    #[error("Audio file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// File extension is neither `.wav` nor `.pcm`
    #[error("Unsupported audio format: {0}. Only .wav and .pcm are supported")]
    UnsupportedFormat(String),

    /// The file exists but its contents cannot be decoded as PCM
    #[error("Invalid audio data: {0}")]
    InvalidAudio(String),

    /// Chunk configuration produces a zero frame stride
    #[error("Invalid chunk configuration: {0}")]
    InvalidChunkConfig(String),

    /// Hotword file missing or a line without a numeric weight
    #[error("Hotword file error: {0}")]
    HotwordFileError(String),

    /// Handshake (TCP, TLS or WebSocket upgrade) did not complete
    #[error("Connection failure: {0}")]
    ConnectionFailure(String),

    /// A write to the socket failed mid-stream
    #[error("Send failure: {0}")]
    SendFailure(String),

    /// Reading from the socket failed (connection reset, protocol error)
    #[error("Receive failure: {0}")]
    ReceiveFailure(String),

    /// An inbound text frame was not valid JSON
    #[error("Malformed message from server: {0}")]
    MalformedMessage(String),

    /// No inbound frame (or handshake completion) within the idle timeout
    #[error("Timed out after {}ms waiting for the server", .0.as_millis())]
    Timeout(Duration),

    /// The caller stopped the session before it completed
    #[error("Session cancelled")]
    Cancelled,

    /// Configuration could not be loaded or failed validation
    #[error("Configuration error: {0}")]
    Config(String),

    /// The async runtime behind the blocking entry point could not start
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl ClientError {
    /// Whether this error represents a caller-initiated stop rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, ClientError::Cancelled)
    }
}

/// Configuration loading failures from the `config` crate (bad TOML, wrong types, ...).
impl From<config::ConfigError> for ClientError {
    fn from(err: config::ConfigError) -> Self {
        ClientError::Config(err.to_string())
    }
}

/// Shorthand for `Result<T, ClientError>`.
pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_their_subject() {
        let err = ClientError::FileNotFound(PathBuf::from("/tmp/missing.wav"));
        assert_eq!(err.to_string(), "Audio file not found: /tmp/missing.wav");

        let err = ClientError::UnsupportedFormat(".flac".to_string());
        assert!(err.to_string().contains(".flac"));

        let err = ClientError::Timeout(Duration::from_millis(1500));
        assert_eq!(err.to_string(), "Timed out after 1500ms waiting for the server");
    }

    #[test]
    fn test_only_cancelled_is_cancelled() {
        assert!(ClientError::Cancelled.is_cancelled());
        assert!(!ClientError::SendFailure("reset".into()).is_cancelled());
    }
}
