//! Upload/download payload normalization.

use bytes::Bytes;
use serde_json::Value;

/// MIME type reported for payloads that parse as JSON.
pub const MIME_JSON: &str = "application/json";

/// MIME type reported for plain text payloads.
pub const MIME_TEXT: &str = "text/plain";

/// MIME type reported for raw byte payloads.
pub const MIME_OCTET_STREAM: &str = "application/octet-stream";

/// A payload accepted for upload or produced by retrieval.
///
/// Uploads accept raw bytes, UTF-8 text, or any JSON-serializable value;
/// non-byte inputs are serialized to UTF-8 before hitting the wire.
/// Retrievals infer the variant from the downloaded bytes (JSON parse
/// attempt, falling back to raw bytes).
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Raw bytes, stored as-is.
    Bytes(Bytes),
    /// UTF-8 text, stored as its UTF-8 encoding.
    Text(String),
    /// A JSON value, stored as compact UTF-8 JSON.
    Json(Value),
}

impl Payload {
    /// Normalize to the byte sequence that goes over the wire.
    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Bytes(b) => b,
            Payload::Text(s) => Bytes::from(s.into_bytes()),
            // Value serialization cannot fail for values built from valid JSON.
            Payload::Json(v) => Bytes::from(v.to_string().into_bytes()),
        }
    }

    /// Byte length after normalization, without consuming the payload.
    pub fn byte_len(&self) -> u64 {
        match self {
            Payload::Bytes(b) => b.len() as u64,
            Payload::Text(s) => s.len() as u64,
            Payload::Json(v) => v.to_string().len() as u64,
        }
    }

    /// Infer a payload from downloaded bytes.
    ///
    /// Attempts a UTF-8 decode followed by a JSON parse; anything that fails
    /// either step is returned as raw bytes. Returns the payload together
    /// with its inferred MIME type.
    pub fn infer(data: Bytes) -> (Self, &'static str) {
        if let Ok(text) = std::str::from_utf8(&data) {
            if let Ok(value) = serde_json::from_str::<Value>(text) {
                return (Payload::Json(value), MIME_JSON);
            }
        }
        (Payload::Bytes(data), MIME_OCTET_STREAM)
    }

    /// The MIME type this payload would be described with.
    pub fn mime_type(&self) -> &'static str {
        match self {
            Payload::Bytes(_) => MIME_OCTET_STREAM,
            Payload::Text(_) => MIME_TEXT,
            Payload::Json(_) => MIME_JSON,
        }
    }
}

impl From<Bytes> for Payload {
    fn from(b: Bytes) -> Self {
        Payload::Bytes(b)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(v: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(v))
    }
}

impl From<String> for Payload {
    fn from(s: String) -> Self {
        Payload::Text(s)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Payload::Text(s.to_owned())
    }
}

impl From<Value> for Payload {
    fn from(v: Value) -> Self {
        Payload::Json(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_normalization_round_trips() {
        let payload = Payload::Json(json!({"a": 1}));
        let bytes = payload.clone().into_bytes();
        let (inferred, mime) = Payload::infer(bytes);
        assert_eq!(inferred, Payload::Json(json!({"a": 1})));
        assert_eq!(mime, MIME_JSON);
    }

    #[test]
    fn test_non_json_bytes_stay_raw() {
        let data = Bytes::from_static(&[0xff, 0xfe, 0x00]);
        let (inferred, mime) = Payload::infer(data.clone());
        assert_eq!(inferred, Payload::Bytes(data));
        assert_eq!(mime, MIME_OCTET_STREAM);
    }

    #[test]
    fn test_byte_len_matches_normalized_length() {
        let payload = Payload::Json(json!({"a": 1}));
        assert_eq!(payload.byte_len(), payload.clone().into_bytes().len() as u64);

        let payload = Payload::Text("hej".into());
        assert_eq!(payload.byte_len(), 3);
    }

    #[test]
    fn test_plain_text_parses_as_json_string() {
        // Bare JSON scalars are valid JSON; "5" infers as a number.
        let (inferred, mime) = Payload::infer(Bytes::from_static(b"5"));
        assert_eq!(inferred, Payload::Json(json!(5)));
        assert_eq!(mime, MIME_JSON);
    }
}
