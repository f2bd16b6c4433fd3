//! Lobby service API abstraction for Lobbyist.
//!
//! Provides the [`LobbyApi`] trait — every network interaction the client
//! performs, as one async method each — so the auth guard, synchronizer
//! and dispatcher never touch HTTP directly.
//!
//! # Feature Flags
//!
//! - `http` (default) — [`HttpTransport`], a `reqwest` implementation
//! - `testing` — [`testing::ScriptedApi`], an in-memory double for tests

mod error;
#[cfg(feature = "http")]
mod http;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::TransportError;
#[cfg(feature = "http")]
pub use http::{HttpConfig, HttpTransport};

use std::future::Future;

use lobbyist_protocol::{
    AccessToken, Authority, CollectionSnapshot, CreateSessionForm, SessionId,
    TokenReply, Username, VersionToken,
};

/// Outcome of one long-poll round on the sessions resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The resource differs from the version we sent.
    Changed(CollectionSnapshot),

    /// The server held the request until its timeout and nothing
    /// changed. The poll should simply be re-issued.
    Unchanged,
}

/// Every call the client makes against the lobby service.
///
/// # Trait bounds
///
/// - `Send + Sync` → one API instance is shared (behind an `Arc`) by the
///   auth guard, the long-poll observer task, and the dispatcher.
/// - `'static` → it lives as long as the client.
///
/// Methods return `impl Future + Send` rather than using `async fn` so
/// the futures can be driven from spawned tasks. Implementors may still
/// write `async fn`.
///
/// Calls that carry an [`AccessToken`] report a 401 as
/// [`TransportError::Unauthorized`]; deciding what that means is the
/// auth guard's job, not the transport's.
pub trait LobbyApi: Send + Sync + 'static {
    /// Exchanges a username and password for a token pair.
    ///
    /// Rejected credentials are NOT an error here: the server reports
    /// them inside the reply body.
    fn exchange_credentials(
        &self,
        username: &Username,
        password: &str,
    ) -> impl Future<Output = Result<TokenReply, TransportError>> + Send;

    /// Looks up the authorities of the token's owner.
    fn roles(
        &self,
        token: &AccessToken,
    ) -> impl Future<Output = Result<Vec<Authority>, TransportError>> + Send;

    /// Lists the game kinds a session can be started for.
    fn game_services(
        &self,
    ) -> impl Future<Output = Result<Vec<String>, TransportError>> + Send;

    /// Starts a new session; the creator becomes its first player.
    fn create_session(
        &self,
        token: &AccessToken,
        form: &CreateSessionForm,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Adds `player` to a session.
    fn join_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
        player: &Username,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Removes `player` from a session.
    fn leave_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
        player: &Username,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Deletes a session. The server only allows this for the creator.
    fn delete_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Launches a session, which makes the server provision the game.
    fn launch_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
    ) -> impl Future<Output = Result<(), TransportError>> + Send;

    /// Issues one long-poll on the sessions resource, blocking until the
    /// resource no longer matches `version` or the server times out.
    fn poll_sessions(
        &self,
        version: &VersionToken,
    ) -> impl Future<Output = Result<PollOutcome, TransportError>> + Send;
}
