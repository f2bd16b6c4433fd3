//! Body format of the lobby service.
//!
//! Every response the client parses, and the one request body it sends
//! (the start-session form), goes through a [`Codec`]. The transport is
//! generic over it so tests and alternative services can swap the format
//! without touching the HTTP plumbing. The lobby service speaks JSON, so
//! [`JsonCodec`] is the one shipped implementation.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Turns request bodies into bytes and response bodies into values.
///
/// Shared by every task that holds the transport, hence `Send + Sync`.
/// Decoding yields owned values (`DeserializeOwned`) so the response
/// buffer can be dropped as soon as it is parsed; the version token is
/// computed from the same buffer before that.
pub trait Codec: Send + Sync + 'static {
    /// Media type sent as `Content-Type` with encoded request bodies.
    const CONTENT_TYPE: &'static str;

    /// # Errors
    /// Returns `ProtocolError::Encode` if the value cannot be written.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// # Errors
    /// Returns `ProtocolError::Decode` if the body is not a `T`, which
    /// includes error pages from a proxy in front of the service.
    fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, ProtocolError>;
}

/// JSON bodies via `serde_json`. Behind the default `json` feature.
///
/// ```rust
/// use lobbyist_protocol::{Codec, JsonCodec, SessionsBundle};
///
/// let body = br#"{"sessions":{}}"#;
/// let bundle: SessionsBundle = JsonCodec.decode(body).unwrap();
/// assert!(bundle.sessions.is_empty());
/// assert_eq!(JsonCodec.encode(&bundle).unwrap(), body);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    const CONTENT_TYPE: &'static str = "application/json";

    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, body: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(body).map_err(ProtocolError::Decode)
    }
}
