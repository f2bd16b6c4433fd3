//! Error types for the auth layer.

use lobbyist_protocol::ProtocolError;
use lobbyist_transport::TransportError;

/// Failures of the credential store itself.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("credential store i/o: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON string map.
    #[error("credential store format: {0}")]
    Format(#[from] serde_json::Error),
}

/// Errors that can occur during a login attempt.
///
/// Rejected credentials are NOT an error: they come back as
/// [`LoginOutcome::Rejected`](crate::LoginOutcome::Rejected).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token endpoint could not be reached or answered unexpectedly.
    #[error("login request failed: {0}")]
    Transport(#[from] TransportError),

    /// The token endpoint's reply was neither a grant nor a rejection.
    #[error("login reply malformed: {0}")]
    Protocol(#[from] ProtocolError),

    /// The granted tokens could not be persisted.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Outcome of a failed guarded call.
///
/// Callers never see a raw 401: it has already been turned into
/// `AuthLost`, the credentials cleared and the navigator reloaded.
#[derive(Debug, thiserror::Error)]
pub enum GuardError {
    /// No usable credentials, or the server rejected the token.
    #[error("authorization lost")]
    AuthLost,

    /// The server refused the request on its merits (already launched,
    /// session full, not the creator, ...).
    #[error("request refused ({status}): {detail}")]
    Conflict { status: u16, detail: String },

    /// The request never produced a usable answer.
    #[error(transparent)]
    Transport(TransportError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl GuardError {
    /// Returns `true` if the caller should send the user back to login.
    pub fn is_auth_lost(&self) -> bool {
        matches!(self, Self::AuthLost)
    }
}
