//! # Audio Normalizer
//!
//! Loads a `.wav` or `.pcm` file and converts it to the canonical format the
//! recognition server expects: mono, 16-bit signed little-endian PCM at 16 kHz.
//!
//! ## Container Handling:
//! - **.wav**: sample rate, width and channel count come from the header
//! - **.pcm**: headerless; the declared source format is used (canonical by default)
//!
//! ## Conversion Policy:
//! Applied only when the source deviates from the canonical format, in this order:
//! down-mix → width rescale → linear resample. A canonical source passes through
//! byte-for-byte.

use crate::audio::buffer::{AudioBuffer, AudioFormat, TARGET_SAMPLE_RATE};
use crate::audio::processor;
use crate::config::AudioSourceConfig;
use crate::error::{ClientError, ClientResult};
use std::path::Path;
use tracing::{debug, info};

/// Loads audio files and normalizes them to an [`AudioBuffer`].
#[derive(Debug, Clone)]
pub struct AudioNormalizer {
    /// Format assumed for headerless `.pcm` input
    pcm_format: AudioFormat,
}

impl Default for AudioNormalizer {
    fn default() -> Self {
        Self::new(AudioFormat::canonical())
    }
}

impl AudioNormalizer {
    pub fn new(pcm_format: AudioFormat) -> Self {
        Self { pcm_format }
    }

    pub fn from_config(config: &AudioSourceConfig) -> Self {
        Self::new(AudioFormat::new(
            config.source_sample_rate,
            config.source_sample_width,
            config.source_channels,
        ))
    }

    /// Load `path` and return the normalized buffer.
    ///
    /// ## Errors:
    /// - **FileNotFound**: `path` does not exist
    /// - **UnsupportedFormat**: extension is neither `.wav` nor `.pcm`
    /// - **InvalidAudio**: unreadable file or undecodable PCM
    pub fn load(&self, path: &Path) -> ClientResult<AudioBuffer> {
        if !path.exists() {
            return Err(ClientError::FileNotFound(path.to_path_buf()));
        }

        let extension = path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
            .unwrap_or_default();

        let buffer = match extension.as_str() {
            ".pcm" => self.load_pcm(path)?,
            ".wav" => self.load_wav(path)?,
            "" => return Err(ClientError::UnsupportedFormat("(no extension)".to_string())),
            _ => return Err(ClientError::UnsupportedFormat(extension)),
        };

        info!(
            path = %path.display(),
            bytes = buffer.len(),
            duration_s = buffer.duration_seconds(),
            "Audio normalized"
        );
        Ok(buffer)
    }

    fn load_pcm(&self, path: &Path) -> ClientResult<AudioBuffer> {
        let data = std::fs::read(path).map_err(|e| {
            ClientError::InvalidAudio(format!("Failed to read {}: {}", path.display(), e))
        })?;
        self.normalize_bytes(data, self.pcm_format)
    }

    fn load_wav(&self, path: &Path) -> ClientResult<AudioBuffer> {
        let mut reader = hound::WavReader::open(path).map_err(|e| {
            ClientError::InvalidAudio(format!("Failed to parse WAV {}: {}", path.display(), e))
        })?;
        let spec = reader.spec();

        debug!(
            sample_rate = spec.sample_rate,
            bits = spec.bits_per_sample,
            channels = spec.channels,
            float = spec.sample_format == hound::SampleFormat::Float,
            "WAV header parsed"
        );

        if spec.channels == 0 || spec.sample_rate == 0 {
            return Err(ClientError::InvalidAudio(format!(
                "WAV header declares {} channels at {} Hz",
                spec.channels, spec.sample_rate
            )));
        }

        let read_err =
            |e: hound::Error| ClientError::InvalidAudio(format!("Failed to read WAV samples: {}", e));

        // Integer samples come back sign-extended at their native width (8-bit
        // already offset to signed); float is scaled straight to 16-bit.
        let (samples, sample_width) = match spec.sample_format {
            hound::SampleFormat::Int => {
                let width = spec.bits_per_sample.div_ceil(8);
                if !(1..=4).contains(&width) {
                    return Err(ClientError::InvalidAudio(format!(
                        "Unsupported WAV bit depth: {}",
                        spec.bits_per_sample
                    )));
                }
                let samples = reader
                    .samples::<i32>()
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(read_err)?;
                (samples, width)
            }
            hound::SampleFormat::Float => {
                let samples = reader
                    .samples::<f32>()
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(read_err)?;
                let pcm16 = processor::float_to_i16(&samples);
                (pcm16.into_iter().map(i32::from).collect(), 2)
            }
        };

        let format = AudioFormat::new(spec.sample_rate, sample_width, spec.channels);
        Ok(Self::normalize_samples(samples, format))
    }

    /// Normalize raw little-endian PCM bytes of the given format.
    ///
    /// Canonical input is returned unchanged, including an empty buffer.
    pub fn normalize_bytes(&self, data: Vec<u8>, format: AudioFormat) -> ClientResult<AudioBuffer> {
        if format.is_canonical() {
            return Ok(AudioBuffer::from_canonical_bytes(data));
        }

        let samples = processor::decode_samples(&data, format.sample_width, format.block_align())?;
        Ok(Self::normalize_samples(samples, format))
    }

    /// Apply down-mix, rescale and resample to decoded samples.
    fn normalize_samples(samples: Vec<i32>, format: AudioFormat) -> AudioBuffer {
        let mono = if format.channels > 1 {
            processor::downmix(&samples, format.channels)
        } else {
            samples
        };

        let pcm16 = processor::rescale_to_i16(&mono, format.sample_width);

        let resampled = if format.sample_rate != TARGET_SAMPLE_RATE {
            processor::resample_linear(&pcm16, format.sample_rate, TARGET_SAMPLE_RATE)
        } else {
            pcm16
        };

        debug!(
            from_rate = format.sample_rate,
            from_width = format.sample_width,
            from_channels = format.channels,
            samples_out = resampled.len(),
            "Converted audio to canonical format"
        );

        AudioBuffer::from_canonical_bytes(processor::encode_i16_le(&resampled))
    }
}
