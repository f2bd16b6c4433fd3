//! Unified error type for the Lobbyist client.

use lobbyist_auth::{AuthError, GuardError, StoreError};
use lobbyist_protocol::ProtocolError;
use lobbyist_transport::TransportError;

use crate::DispatchError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `lobbyist` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// A transport-level error (unreachable, unexpected status, bad URL).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The credential store could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A login attempt failed before the server could judge it.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A guarded call failed (authorization lost, conflict, ...).
    #[error(transparent)]
    Guard(#[from] GuardError),

    /// A session action could not be dispatched.
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    /// A configuration value could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(String),
}
