//! # ASR Stream Client
//!
//! Streams a recorded audio file to a remote speech recognition server over a
//! WebSocket and collects the (partial and final) transcription results.
//!
//! ## Pipeline:
//! 1. **audio**: load `.wav` / `.pcm` and normalize to 16 kHz, 16-bit, mono PCM
//! 2. **transcription::planner**: derive frame stride and count from the chunk config
//! 3. **transcription::session**: send init → frames → end-of-speech while concurrently
//!    receiving results, until a final result closes the session
//! 4. The caller gets the ordered result list, or exactly one [`ClientError`]
//!
//! ## Usage Example:
//! ```no_run
//! use asr_stream_client::{AsrClient, ClientConfig};
//!
//! # async fn demo() -> Result<(), asr_stream_client::ClientError> {
//! let client = AsrClient::new(ClientConfig::load(None)?);
//! for result in client.transcribe("sample.wav").await? {
//!     println!("{}", result);
//! }
//! # Ok(())
//! # }
//! ```

pub mod audio;          // Audio loading and normalization
pub mod client;         // One-call session façade
pub mod config;         // Layered configuration and session settings
pub mod error;          // Error taxonomy
pub mod hotwords;       // Hotword file parsing
pub mod transcription;  // Planner, protocol, session transport, collector

pub use client::AsrClient;
pub use config::{ClientConfig, RecognitionMode, SessionConfig};
pub use error::{ClientError, ClientResult};
pub use transcription::{SessionState, TranscriptionResult};
