//! # Transcription Module
//!
//! Streams normalized audio to a remote recognition server and collects its
//! results, using a stateful chunked protocol over one WebSocket.
//!
//! ## Key Components:
//! - **Chunk Planner**: frame stride and count from the chunk configuration
//! - **Protocol**: control messages and inbound result decoding
//! - **Session Transport**: connection, concurrent send/receive duties, state machine
//! - **Transcript Collector**: ordered result accumulation

pub mod collector;   // Ordered result list
pub mod planner;     // Frame stride / count planning
pub mod protocol;    // Wire message encoding and decoding
pub mod session;     // Connection and duplex protocol driver

pub use collector::{TranscriptCollector, TranscriptionResult};
pub use planner::{ChunkPlanner, FramePlan};
pub use session::{SessionState, SessionTransport};
