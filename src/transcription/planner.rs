//! # Chunk Planner
//!
//! Computes how the normalized audio is cut into network frames.
//!
//! ## Calculations:
//! - **frame_duration_ms** = `60 * c1 / chunk_interval`
//! - **stride_bytes** = `floor(sample_rate * 2 * frame_duration_ms / 1000)`
//! - **frame_count** = `ceil(buffer_len / stride_bytes)`
//!
//! ## Example:
//! Chunk config `[2, 8, 3]` with interval 8 at 16 kHz: 60ms frames of 1920 bytes.
//!
//! Planning runs before the connection is opened, so a zero stride is always a
//! pre-flight failure and never a mid-stream one.

use crate::config::ChunkConfig;
use crate::error::{ClientError, ClientResult};
use std::time::Duration;

/// Bytes per 16-bit sample.
const BYTES_PER_SAMPLE: u64 = 2;

/// Result of planning one buffer: stride, frame count and pacing interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FramePlan {
    pub stride_bytes: usize,
    pub frame_count: usize,
    pub frame_duration_ms: f64,
    frame_duration: Duration,
}

impl FramePlan {
    /// Iterate over the frames of `data` in byte-offset order. The last frame
    /// may be shorter than the stride.
    pub fn frames<'a>(&self, data: &'a [u8]) -> impl Iterator<Item = &'a [u8]> {
        data.chunks(self.stride_bytes)
    }

    /// How long the send duty sleeps after each frame when pacing is on.
    pub fn frame_duration(&self) -> Duration {
        self.frame_duration
    }
}

/// Stateless planner; see the module docs for the formulas.
pub struct ChunkPlanner;

impl ChunkPlanner {
    /// Plan the frames for a buffer of `buffer_len` bytes at `sample_rate`.
    ///
    /// ## Errors:
    /// `InvalidChunkConfig` if `c1 = 0`, `chunk_interval = 0`, or the stride
    /// otherwise rounds down to zero bytes.
    pub fn plan(chunk: &ChunkConfig, sample_rate: u32, buffer_len: usize) -> ClientResult<FramePlan> {
        let current = chunk.chunk_size[1] as u64;
        let interval = chunk.chunk_interval as u64;

        if current == 0 || interval == 0 {
            return Err(ClientError::InvalidChunkConfig(format!(
                "chunk_size {:?} with interval {} gives a zero frame duration",
                chunk.chunk_size, chunk.chunk_interval
            )));
        }

        // floor(rate * 2 * (60 * c1 / interval) / 1000), kept in integers
        let stride = sample_rate as u64 * BYTES_PER_SAMPLE * 60 * current / (interval * 1000);
        if stride == 0 {
            return Err(ClientError::InvalidChunkConfig(format!(
                "stride computed to zero for chunk_size {:?}, interval {}, sample rate {}",
                chunk.chunk_size, chunk.chunk_interval, sample_rate
            )));
        }

        let stride_bytes = stride as usize;
        Ok(FramePlan {
            stride_bytes,
            frame_count: buffer_len.div_ceil(stride_bytes),
            frame_duration_ms: 60.0 * current as f64 / interval as f64,
            frame_duration: Duration::from_nanos(60 * current * 1_000_000 / interval),
        })
    }
}
