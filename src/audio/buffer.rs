//! # Audio Buffer
//!
//! The normalized audio handed to the transport: mono, 16-bit signed
//! little-endian PCM at 16 kHz. Once built it is never mutated; the transport
//! only borrows byte slices out of it.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Cursor;

/// Sample rate every buffer is normalized to.
pub const TARGET_SAMPLE_RATE: u32 = 16000;

/// Bytes per sample after normalization.
pub const TARGET_SAMPLE_WIDTH: u16 = 2;

/// Channel count after normalization.
pub const TARGET_CHANNELS: u16 = 1;

/// Shape of a PCM stream: how fast, how wide, how many channels.
///
/// ## Fields:
/// - **sample_rate**: samples per second per channel
/// - **sample_width**: bytes per sample (1, 2, 3 or 4)
/// - **channels**: interleaved channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub sample_width: u16,
    pub channels: u16,
}

impl AudioFormat {
    pub fn new(sample_rate: u32, sample_width: u16, channels: u16) -> Self {
        Self {
            sample_rate,
            sample_width,
            channels,
        }
    }

    /// The canonical 16 kHz / 16-bit / mono format.
    pub fn canonical() -> Self {
        Self::new(TARGET_SAMPLE_RATE, TARGET_SAMPLE_WIDTH, TARGET_CHANNELS)
    }

    pub fn is_canonical(&self) -> bool {
        *self == Self::canonical()
    }

    /// Bytes per interleaved frame (one sample for every channel).
    pub fn block_align(&self) -> usize {
        self.sample_width as usize * self.channels as usize
    }
}

/// Normalized, immutable PCM audio.
///
/// ## Invariant:
/// `data` is always 16-bit little-endian mono at [`TARGET_SAMPLE_RATE`]; the only
/// way to build one outside this crate is [`crate::audio::AudioNormalizer`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioBuffer {
    data: Vec<u8>,
    sample_rate: u32,
}

impl AudioBuffer {
    pub(crate) fn from_canonical_bytes(data: Vec<u8>) -> Self {
        Self {
            data,
            sample_rate: TARGET_SAMPLE_RATE,
        }
    }

    /// Raw little-endian PCM bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn sample_count(&self) -> usize {
        self.data.len() / TARGET_SAMPLE_WIDTH as usize
    }

    /// Duration of the audio in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.sample_count() as f64 / self.sample_rate as f64
    }

    /// Decode the bytes back into samples (used for inspection and tests).
    pub fn samples(&self) -> Vec<i16> {
        let mut cursor = Cursor::new(&self.data);
        let mut samples = Vec::with_capacity(self.sample_count());
        while let Ok(sample) = cursor.read_i16::<LittleEndian>() {
            samples.push(sample);
        }
        samples
    }
}
