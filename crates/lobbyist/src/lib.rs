//! # Lobbyist
//!
//! Client for a board-game session lobby service.
//!
//! Lobbyist logs a player in, mirrors the server's collection of game
//! sessions through a long-poll, derives what the player may do with each
//! session, and sends those actions back through a single auth guard.
//!
//! ```text
//! LobbyApi (HTTP) ──poll──→ Synchronizer ──rows──→ RenderAdapter
//!      ↑                                               │
//!      └──── AuthGuard ←──── ActionDispatcher ←── controls
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lobbyist::prelude::*;
//!
//! struct Terminal;
//!
//! impl Navigator for Terminal {
//!     fn reload(&self) {}
//!     fn redirect(&self, _landing: Landing) {}
//! }
//!
//! # async fn run() -> Result<(), LobbyError> {
//! let client = LobbyClientBuilder::new()
//!     .config(ClientConfig::from_env()?)
//!     .build(Terminal)?;
//!
//! if let LoginOutcome::Rejected(reason) = client.login("maex", "abc123_ABC123").await? {
//!     eprintln!("login refused: {reason}");
//!     return Ok(());
//! }
//!
//! let lobby = client.open_lobby(TextRenderer::new(std::io::stdout())).await?;
//! lobby.wait_for_first_render().await;
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod dispatcher;
mod error;

pub use client::{LobbyClient, LobbyClientBuilder, LobbyView};
pub use config::{ClientConfig, ConfiguredStore};
pub use dispatcher::{ActionDispatcher, DispatchError, DispatchOutcome};
pub use error::LobbyError;

/// Everything needed to embed the client.
pub mod prelude {
    pub use crate::{
        ActionDispatcher, ClientConfig, ConfiguredStore, DispatchError, DispatchOutcome,
        LobbyClient, LobbyClientBuilder, LobbyError, LobbyView,
    };
    pub use lobbyist_auth::{
        AuthGuard, CredentialKey, CredentialStore, FileCredentialStore, GuardError, Landing,
        LoginOutcome, MemoryCredentialStore, Navigator,
    };
    pub use lobbyist_protocol::{CollectionSnapshot, Session, SessionId, Username};
    pub use lobbyist_sync::{ObserverConfig, Synchronizer};
    pub use lobbyist_transport::{HttpConfig, HttpTransport, LobbyApi, TransportError};
    pub use lobbyist_view::{
        Action, ActionControl, Phase, RenderAdapter, Role, SessionRow, TextRenderer,
    };
}
