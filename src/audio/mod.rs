//! # Audio Module
//!
//! Turns a recorded audio file into the canonical PCM stream the recognition
//! server consumes.
//!
//! ## Canonical Format:
//! - **Sample Rate**: 16kHz (16,000 Hz)
//! - **Bit Depth**: 16-bit PCM
//! - **Channels**: Mono (1 channel)
//! - **Encoding**: Little-endian signed integers
//!
//! ## Key Components:
//! - **Audio Buffer**: Immutable normalized bytes plus their sample rate
//! - **Audio Processor**: Individual conversion steps (down-mix, rescale, resample)
//! - **Audio Normalizer**: File loading and container dispatch

pub mod buffer;       // Immutable canonical PCM buffer
pub mod normalizer;   // .wav / .pcm loading and normalization
pub mod processor;    // PCM conversion steps

pub use buffer::{AudioBuffer, AudioFormat};
pub use normalizer::AudioNormalizer;
