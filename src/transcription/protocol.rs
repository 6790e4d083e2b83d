//! # Wire Protocol
//!
//! Message shapes exchanged with the recognition server over one WebSocket.
//!
//! ## Message Flow:
//! 1. **Client → Server**: [`InitMessage`] (JSON text), once
//! 2. **Client → Server**: binary PCM frames, in byte-offset order
//! 3. **Client → Server**: [`EndOfSpeech`] (JSON text), once
//! 4. **Server → Client**: zero or more JSON text frames, decoded by [`decode_result`];
//!    the first one with `is_final: true` ends the session

use crate::config::{RecognitionMode, SessionConfig};
use crate::error::{ClientError, ClientResult};
use crate::transcription::collector::TranscriptionResult;
use serde::Serialize;
use serde_json::Value;

/// Format tag sent in the initialization message; frames are always raw PCM.
pub const WAV_FORMAT: &str = "pcm";

/// First control message of a session.
///
/// Field order matches what the server logs and expects.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InitMessage {
    pub mode: RecognitionMode,
    pub chunk_size: [u32; 3],
    pub chunk_interval: u32,
    pub audio_fs: u32,
    pub wav_name: String,
    pub wav_format: &'static str,
    pub is_speaking: bool,
    /// Hotword table serialized as a JSON string (not a nested object)
    pub hotwords: String,
    pub itn: bool,
}

impl InitMessage {
    pub fn new(config: &SessionConfig, audio_fs: u32, wav_name: impl Into<String>) -> Self {
        Self {
            mode: config.mode,
            chunk_size: config.chunk.chunk_size,
            chunk_interval: config.chunk.chunk_interval,
            audio_fs,
            wav_name: wav_name.into(),
            wav_format: WAV_FORMAT,
            is_speaking: true,
            hotwords: config.hotwords.to_json_string(),
            itn: config.use_itn,
        }
    }

    pub fn to_json(&self) -> ClientResult<String> {
        serde_json::to_string(self)
            .map_err(|e| ClientError::SendFailure(format!("Failed to encode init message: {}", e)))
    }
}

/// Last control message of a session: `{"is_speaking": false}`.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct EndOfSpeech {
    pub is_speaking: bool,
}

impl EndOfSpeech {
    pub fn new() -> Self {
        Self { is_speaking: false }
    }

    pub fn to_json(&self) -> ClientResult<String> {
        serde_json::to_string(self)
            .map_err(|e| ClientError::SendFailure(format!("Failed to encode end-of-speech: {}", e)))
    }
}

impl Default for EndOfSpeech {
    fn default() -> Self {
        Self::new()
    }
}

/// Decode one inbound text frame.
///
/// ## Defaults:
/// - `text` → `""`
/// - `mode` → `"unknown"`
/// - `is_final` → `false` (a message without it is never final)
/// - `timestamp` → `None`; strings are kept verbatim, other JSON values are
///   rendered as compact JSON
///
/// ## Errors:
/// `MalformedMessage` if the frame is not JSON or not a JSON object.
pub fn decode_result(raw: &str) -> ClientResult<TranscriptionResult> {
    let payload: Value = serde_json::from_str(raw).map_err(|e| {
        let preview: String = raw.chars().take(200).collect();
        ClientError::MalformedMessage(format!("{} (body: {})", e, preview))
    })?;

    let object = payload.as_object().ok_or_else(|| {
        ClientError::MalformedMessage(format!("expected a JSON object, got {}", payload))
    })?;

    let text = match object.get("text") {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    };

    let mode = match object.get("mode") {
        Some(Value::String(mode)) => mode.clone(),
        _ => "unknown".to_string(),
    };

    let is_final = object.get("is_final").map(truthy).unwrap_or(false);

    let timestamp = match object.get("timestamp") {
        None | Some(Value::Null) => None,
        Some(Value::String(ts)) => Some(ts.clone()),
        Some(other) => Some(other.to_string()),
    };

    Ok(TranscriptionResult::new(text, mode, is_final, timestamp))
}

/// JSON truthiness: `false`, `0`, `""`, `[]`, `{}` and `null` are false.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|n| n != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChunkConfig, ServerEndpoint, TlsOptions};
    use crate::hotwords::HotwordTable;

    fn session_config(hotwords: HotwordTable) -> SessionConfig {
        SessionConfig {
            endpoint: ServerEndpoint {
                host: "127.0.0.1".to_string(),
                port: 9999,
                tls: TlsOptions::default(),
            },
            mode: RecognitionMode::TwoPass,
            chunk: ChunkConfig::new([2, 8, 3], 8),
            hotwords,
            use_itn: true,
            pacing: false,
            idle_timeout: None,
        }
    }

    #[test]
    fn test_init_message_shape() {
        let init = InitMessage::new(&session_config(HotwordTable::default()), 16000, "sample.wav");
        let json: Value = serde_json::from_str(&init.to_json().unwrap()).unwrap();

        assert_eq!(json["mode"], "2pass");
        assert_eq!(json["chunk_size"], serde_json::json!([2, 8, 3]));
        assert_eq!(json["chunk_interval"], 8);
        assert_eq!(json["audio_fs"], 16000);
        assert_eq!(json["wav_name"], "sample.wav");
        assert_eq!(json["wav_format"], "pcm");
        assert_eq!(json["is_speaking"], true);
        assert_eq!(json["hotwords"], "{}");
        assert_eq!(json["itn"], true);
    }

    #[test]
    fn test_init_message_hotwords_are_a_string() {
        let mut hotwords = HotwordTable::default();
        hotwords.insert("machine learning", 20);
        let init = InitMessage::new(&session_config(hotwords), 16000, "a.pcm");
        let json: Value = serde_json::from_str(&init.to_json().unwrap()).unwrap();

        let encoded = json["hotwords"].as_str().unwrap();
        let table: Value = serde_json::from_str(encoded).unwrap();
        assert_eq!(table["machine learning"], 20);
    }

    #[test]
    fn test_end_of_speech() {
        assert_eq!(EndOfSpeech::new().to_json().unwrap(), r#"{"is_speaking":false}"#);
    }

    #[test]
    fn test_decode_full_message() {
        let result = decode_result(
            r#"{"text":"hello world","mode":"2pass-offline","is_final":true,"timestamp":"[[100,200]]","wav_name":"a"}"#,
        )
        .unwrap();
        assert_eq!(result.text, "hello world");
        assert_eq!(result.mode, "2pass-offline");
        assert!(result.is_final);
        assert_eq!(result.timestamp.as_deref(), Some("[[100,200]]"));
    }

    #[test]
    fn test_decode_defaults() {
        let result = decode_result("{}").unwrap();
        assert_eq!(result.text, "");
        assert_eq!(result.mode, "unknown");
        assert!(!result.is_final);
        assert!(result.timestamp.is_none());
    }

    #[test]
    fn test_decode_non_string_timestamp() {
        let result = decode_result(r#"{"text":"hi","timestamp":[[0,120],[120,300]]}"#).unwrap();
        assert_eq!(result.timestamp.as_deref(), Some("[[0,120],[120,300]]"));
    }

    #[test]
    fn test_decode_truthy_is_final() {
        assert!(decode_result(r#"{"is_final":1}"#).unwrap().is_final);
        assert!(!decode_result(r#"{"is_final":0}"#).unwrap().is_final);
        assert!(!decode_result(r#"{"is_final":null}"#).unwrap().is_final);
    }

    #[test]
    fn test_decode_rejects_non_json() {
        assert!(matches!(
            decode_result("not json"),
            Err(ClientError::MalformedMessage(_))
        ));
        assert!(matches!(
            decode_result("[1, 2]"),
            Err(ClientError::MalformedMessage(_))
        ));
    }
}
