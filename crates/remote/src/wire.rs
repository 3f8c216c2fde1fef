//! Wire types for the trusted intermediary's HTTP surface.

use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tessera_api::{ClientError, ClientResult, Payload, StorageStats};

/// How a payload is encoded in a store/retrieve body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// Base64-encoded raw bytes.
    Binary,
    /// UTF-8 text, sent as-is.
    Text,
    /// A JSON value, sent as its JSON text.
    Json,
}

/// Body of `POST /store`.
#[derive(Debug, Serialize)]
pub(crate) struct StoreRequest {
    pub data: String,
    pub format: PayloadFormat,
}

impl StoreRequest {
    /// Encode a payload for transmission: base64 for binary, raw otherwise.
    pub(crate) fn encode(payload: Payload) -> Self {
        match payload {
            Payload::Bytes(bytes) => Self {
                data: base64::engine::general_purpose::STANDARD.encode(&bytes),
                format: PayloadFormat::Binary,
            },
            Payload::Text(text) => Self {
                data: text,
                format: PayloadFormat::Text,
            },
            Payload::Json(value) => Self {
                data: value.to_string(),
                format: PayloadFormat::Json,
            },
        }
    }
}

/// Body of `GET /retrieve` responses.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RetrieveResponse {
    pub data: String,
    pub format: PayloadFormat,
    pub mime_type: String,
}

impl RetrieveResponse {
    /// Decode the wire body back into a payload.
    pub(crate) fn decode(self) -> ClientResult<Payload> {
        match self.format {
            PayloadFormat::Binary => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(&self.data)
                    .map_err(|e| {
                        ClientError::storage(format!("retrieve response base64 decode failed: {e}"))
                    })?;
                Ok(Payload::Bytes(Bytes::from(bytes)))
            }
            PayloadFormat::Text => Ok(Payload::Text(self.data)),
            PayloadFormat::Json => {
                let value: Value = serde_json::from_str(&self.data).map_err(|e| {
                    ClientError::storage(format!("retrieve response JSON decode failed: {e}"))
                })?;
                Ok(Payload::Json(value))
            }
        }
    }
}

/// Body of `GET /auth` responses.
#[derive(Debug, Deserialize)]
pub(crate) struct AuthResponse {
    pub status: String,
    pub initialized: bool,
    #[serde(default)]
    pub stats: Option<StorageStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_binary_payload_base64_round_trip() {
        let payload = Payload::Bytes(Bytes::from_static(&[0x00, 0xff, 0x10]));
        let request = StoreRequest::encode(payload.clone());
        assert_eq!(request.format, PayloadFormat::Binary);

        let response = RetrieveResponse {
            data: request.data,
            format: PayloadFormat::Binary,
            mime_type: "application/octet-stream".into(),
        };
        assert_eq!(response.decode().expect("decodes"), payload);
    }

    #[test]
    fn test_json_payload_sent_raw() {
        let request = StoreRequest::encode(Payload::Json(json!({"a": 1})));
        assert_eq!(request.format, PayloadFormat::Json);
        assert_eq!(request.data, r#"{"a":1}"#);
    }

    #[test]
    fn test_format_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&PayloadFormat::Binary).expect("serializes"),
            r#""binary""#
        );
    }
}
