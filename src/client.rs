//! # Client
//!
//! One call, one session: normalize the audio, run the pre-flight checks, open
//! the connection, stream, and hand back the ordered results.
//!
//! ## Entry Points:
//! - [`AsrClient::transcribe`]: async, for callers already inside a Tokio runtime
//! - [`AsrClient::transcribe_until`]: async, stops with `Cancelled` when a caller future completes
//! - [`AsrClient::transcribe_blocking`]: builds its own runtime; must not be called from async code

use crate::audio::AudioNormalizer;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::transcription::{SessionTransport, TranscriptionResult};
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::info;

/// Runs transcription sessions with a fixed configuration.
#[derive(Debug, Clone)]
pub struct AsrClient {
    config: ClientConfig,
}

impl AsrClient {
    pub fn new(config: ClientConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Audio path from the configuration (`stream.audio_path`).
    pub fn configured_audio_path(&self) -> ClientResult<PathBuf> {
        self.config
            .stream
            .audio_path
            .clone()
            .ok_or_else(|| ClientError::Config("No audio_path configured".to_string()))
    }

    /// Every check that can fail without touching the network.
    ///
    /// ## Steps:
    /// 1. Validate the configuration and load the hotword table
    /// 2. Load and normalize the audio file
    /// 3. Plan the frames (rejects a zero stride)
    pub fn prepare(&self, audio_path: &Path) -> ClientResult<SessionTransport> {
        let session_config = self.config.session_config()?;
        let audio = AudioNormalizer::from_config(&self.config.audio).load(audio_path)?;

        let wav_name = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let session = SessionTransport::new(session_config, audio, wav_name)?;
        info!(
            session_id = %session.id(),
            frames = session.plan().frame_count,
            "Session prepared for {}",
            audio_path.display()
        );
        Ok(session)
    }

    /// Transcribe one file.
    pub async fn transcribe(&self, audio_path: impl AsRef<Path>) -> ClientResult<Vec<TranscriptionResult>> {
        self.prepare(audio_path.as_ref())?.run().await
    }

    /// Transcribe one file, giving up with `Cancelled` as soon as `shutdown` completes.
    pub async fn transcribe_until<F>(
        &self,
        audio_path: impl AsRef<Path>,
        shutdown: F,
    ) -> ClientResult<Vec<TranscriptionResult>>
    where
        F: Future<Output = ()>,
    {
        self.prepare(audio_path.as_ref())?.run_until(shutdown).await
    }

    /// Blocking wrapper around [`AsrClient::transcribe`] on a private
    /// current-thread runtime.
    pub fn transcribe_blocking(&self, audio_path: impl AsRef<Path>) -> ClientResult<Vec<TranscriptionResult>> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ClientError::Runtime(format!("Failed to start async runtime: {}", e)))?;
        runtime.block_on(self.transcribe(audio_path))
    }
}
