//! # PCM Conversion Steps
//!
//! The individual transformations [`crate::audio::AudioNormalizer`] chains together
//! when a source deviates from the canonical format:
//!
//! 1. **Decode**: raw little-endian bytes of any width → `i32` samples
//! 2. **Down-mix**: interleaved channels → mono, equal weight per channel
//! 3. **Rescale**: any width → 16-bit signed range
//! 4. **Resample**: linear interpolation between adjacent samples
//! 5. **Encode**: `i16` samples → little-endian bytes
//!
//! All steps are deliberately simple (no dithering, no anti-alias filtering) so
//! output bytes stay predictable for the recognizer.

use crate::error::{ClientError, ClientResult};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::Cursor;

/// Decode little-endian signed PCM of `sample_width` bytes into `i32` samples.
///
/// ## Width Handling:
/// - **1**: signed 8-bit
/// - **2**: signed 16-bit
/// - **3**: signed 24-bit (sign-extended)
/// - **4**: signed 32-bit
///
/// ## Errors:
/// `InvalidAudio` if the width is unsupported or the data is not a whole number
/// of `block_align`-sized frames.
pub fn decode_samples(data: &[u8], sample_width: u16, block_align: usize) -> ClientResult<Vec<i32>> {
    if !(1..=4).contains(&sample_width) {
        return Err(ClientError::InvalidAudio(format!(
            "Unsupported sample width: {} bytes",
            sample_width
        )));
    }
    if block_align == 0 || data.len() % block_align != 0 {
        return Err(ClientError::InvalidAudio(format!(
            "Data length {} is not a whole number of {}-byte frames",
            data.len(),
            block_align
        )));
    }

    let mut cursor = Cursor::new(data);
    let mut samples = Vec::with_capacity(data.len() / sample_width as usize);
    let read_err = |e: std::io::Error| ClientError::InvalidAudio(format!("Failed to read PCM: {}", e));

    while (cursor.position() as usize) < data.len() {
        let sample = match sample_width {
            1 => cursor.read_i8().map(i32::from),
            2 => cursor.read_i16::<LittleEndian>().map(i32::from),
            3 => cursor.read_i24::<LittleEndian>(),
            _ => cursor.read_i32::<LittleEndian>(),
        }
        .map_err(read_err)?;
        samples.push(sample);
    }

    Ok(samples)
}

/// Down-mix interleaved samples to mono by averaging every channel with equal weight.
///
/// The average is floored, so identical channels reproduce that channel exactly.
/// A trailing partial frame is dropped.
pub fn downmix(samples: &[i32], channels: u16) -> Vec<i32> {
    if channels <= 1 {
        return samples.to_vec();
    }

    let channels = channels as i64;
    samples
        .chunks_exact(channels as usize)
        .map(|frame| {
            let sum: i64 = frame.iter().map(|&s| s as i64).sum();
            sum.div_euclid(channels) as i32
        })
        .collect()
}

/// Linearly rescale samples of `sample_width` bytes to the 16-bit signed range.
///
/// Widening shifts left; narrowing shifts right (truncating toward negative infinity).
pub fn rescale_to_i16(samples: &[i32], sample_width: u16) -> Vec<i16> {
    samples
        .iter()
        .map(|&s| {
            let scaled = match sample_width {
                1 => s << 8,
                2 => s,
                3 => s >> 8,
                _ => s >> 16,
            };
            scaled.clamp(i16::MIN as i32, i16::MAX as i32) as i16
        })
        .collect()
}

/// Resample with linear interpolation between adjacent samples.
///
/// ## Algorithm:
/// Output sample `i` sits at source position `i * from_rate / to_rate`. With
/// `idx` the integer part and `rem / to_rate` the fraction, the value is
/// `s[idx] + (s[idx + 1] - s[idx]) * rem / to_rate`, computed in integers so the
/// result is exact and platform independent. The last source sample is held
/// past the end. Output length is `floor(len * to_rate / from_rate)`.
pub fn resample_linear(samples: &[i16], from_rate: u32, to_rate: u32) -> Vec<i16> {
    if from_rate == to_rate || samples.is_empty() || from_rate == 0 || to_rate == 0 {
        return samples.to_vec();
    }

    let from = from_rate as u64;
    let to = to_rate as u64;
    let out_len = (samples.len() as u64 * to / from) as usize;
    let last = samples.len() - 1;

    (0..out_len as u64)
        .map(|i| {
            let position = i * from;
            let idx = (position / to) as usize;
            let rem = (position % to) as i64;

            let a = samples[idx.min(last)] as i64;
            let b = samples[(idx + 1).min(last)] as i64;
            let value = a + ((b - a) * rem).div_euclid(to as i64);
            value.clamp(i16::MIN as i64, i16::MAX as i64) as i16
        })
        .collect()
}

/// Encode samples as 16-bit little-endian bytes.
pub fn encode_i16_le(samples: &[i16]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(samples.len() * 2);
    for &sample in samples {
        // Writing into a Vec cannot fail.
        let _ = bytes.write_i16::<LittleEndian>(sample);
    }
    bytes
}

/// Convert float samples in `[-1.0, 1.0]` to 16-bit PCM.
pub fn float_to_i16(samples: &[f32]) -> Vec<i16> {
    samples
        .iter()
        .map(|&sample| (sample * 32768.0).clamp(-32768.0, 32767.0) as i16)
        .collect()
}
