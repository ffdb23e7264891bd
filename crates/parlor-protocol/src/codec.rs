//! Codec trait and the JSON implementation.
//!
//! A codec converts between Rust types and wire text. The rest of the
//! server goes through this trait rather than calling `serde_json`
//! directly, so outbound frames are serialized in exactly one place (the
//! broadcaster serializes once per message, however many recipients).

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Encodes values to UTF-8 frame text and decodes frame text back.
///
/// `Send + Sync + 'static` because the codec is shared across connection
/// tasks for the lifetime of the server.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one frame's text.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes frame text into a value.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the text is malformed,
    /// truncated, or does not match the expected type.
    fn decode<T: DeserializeOwned>(&self, text: &str)
        -> Result<T, ProtocolError>;
}

/// The JSON codec — frames are UTF-8 JSON objects.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        text: &str,
    ) -> Result<T, ProtocolError> {
        serde_json::from_str(text).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientCommand, ServerMessage};

    #[test]
    fn test_encode_decode_round_trip() {
        let codec = JsonCodec;
        let msg = ServerMessage::Error("Room not found".to_owned());
        let text = codec.encode(&msg).unwrap();
        let back: ServerMessage = codec.decode(&text).unwrap();
        assert_eq!(msg, back);
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let codec = JsonCodec;
        let result: Result<ClientCommand, _> = codec.decode("not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_wrong_shape_returns_error() {
        let codec = JsonCodec;
        let result: Result<ClientCommand, _> =
            codec.decode(r#"{"name": "hello"}"#);
        assert!(result.is_err());
    }
}
