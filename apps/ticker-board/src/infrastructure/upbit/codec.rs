//! Ticker Stream Codec
//!
//! Decodes inbound WebSocket frames into [`TickerRecord`]s.
//!
//! Frames arrive either as binary or text payloads holding one JSON object.
//! The key layout is chosen per frame: an object whose `cd` field is a
//! string uses the abbreviated keys, anything else is decoded with the full
//! field names.

use crate::domain::ticker::TickerRecord;
use crate::infrastructure::upbit::messages::{CompactTicker, VerboseTicker};

/// Frame decoding errors.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Payload is not valid JSON or misses required fields.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// Payload is valid JSON but not an object.
    #[error("expected JSON object, got {0}")]
    NotAnObject(&'static str),

    /// The server reported an error instead of a ticker.
    #[error("server error: {0}")]
    Server(String),
}

/// Decoder for ticker frames.
#[derive(Debug, Default, Clone, Copy)]
pub struct TickerCodec;

impl TickerCodec {
    /// Create a new codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Decode a binary frame.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is not a ticker object.
    pub fn decode(&self, payload: &[u8]) -> Result<TickerRecord, DecodeError> {
        let value: serde_json::Value = serde_json::from_slice(payload)?;
        Self::decode_value(value)
    }

    /// Decode a text frame.
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError`] if the payload is not a ticker object.
    pub fn decode_text(&self, text: &str) -> Result<TickerRecord, DecodeError> {
        self.decode(text.as_bytes())
    }

    fn decode_value(value: serde_json::Value) -> Result<TickerRecord, DecodeError> {
        let Some(object) = value.as_object() else {
            return Err(DecodeError::NotAnObject(json_kind(&value)));
        };

        // {"error":{"name":"INVALID_AUTH","message":"..."}}
        if let Some(error) = object.get("error") {
            let message = error
                .get("message")
                .or_else(|| error.get("name"))
                .and_then(serde_json::Value::as_str)
                .unwrap_or("unknown")
                .to_string();
            return Err(DecodeError::Server(message));
        }

        if object.get("cd").is_some_and(serde_json::Value::is_string) {
            let ticker: CompactTicker = serde_json::from_value(value)?;
            Ok(ticker.into())
        } else {
            let ticker: VerboseTicker = serde_json::from_value(value)?;
            Ok(ticker.into())
        }
    }
}

const fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}
