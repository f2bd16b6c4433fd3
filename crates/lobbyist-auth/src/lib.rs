//! Credentials and authorization for Lobbyist.
//!
//! This crate handles the login lifecycle of the client:
//!
//! 1. **Storage** — keeping the username and token pair
//!    ([`CredentialStore`], with in-memory and file-backed implementations)
//! 2. **Login** — exchanging a password for tokens ([`AuthGuard::login`])
//! 3. **Guarding** — running authenticated calls and turning a 401 into
//!    a single logout + reload ([`AuthGuard::guarded_call`])
//! 4. **Routing** — deciding where a user may go ([`AuthGuard::route_guard`],
//!    [`AuthGuard::forward_to_landing`], the [`Navigator`] seam)
//!
//! # How it fits in the stack
//!
//! ```text
//! Sync / Dispatcher (above)  ← ask the guard for the viewer and run calls through it
//!     ↕
//! Auth Layer (this crate)    ← owns credentials, maps 401 to AuthLost
//!     ↕
//! Transport Layer (below)    ← LobbyApi, reports 401 as TransportError::Unauthorized
//! ```
//!
//! # Feature Flags
//!
//! - `testing` — [`navigator::testing::RecordingNavigator`], a navigator
//!   that records every reload and redirect

mod credentials;
mod error;
mod guard;
pub mod navigator;

pub use credentials::{
    CredentialKey, CredentialSet, CredentialStore, FileCredentialStore,
    MemoryCredentialStore, escape_token, unescape_token,
};
pub use error::{AuthError, GuardError, StoreError};
pub use guard::{AuthGuard, LoginOutcome};
pub use navigator::{Landing, Navigator};
