//! Error types for the protocol layer.
//!
//! Each crate in Lobbyist defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is in the shape of the data the
//! server sent (or that we tried to send), not in networking or in
//! credential handling.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: the server answered with an HTML error page, a
    /// required field is missing, or the body was truncated.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The message decoded fine but violates the protocol — e.g. a token
    /// reply that carries neither an `error` nor a complete token pair.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
