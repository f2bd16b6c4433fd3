//! Wire protocol for the Lobbyist client.
//!
//! This crate defines the data the client and the lobby service exchange:
//!
//! - **Session types** ([`Session`], [`GameParameters`], [`CollectionSnapshot`],
//!   etc.) — the server-owned collection of game sessions the client mirrors.
//! - **Credential types** ([`TokenReply`], [`TokenGrant`], [`AccessToken`],
//!   [`Authority`]) — what the token exchange and the role lookup return.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages
//!   are converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits below everything else. It doesn't know about
//! HTTP, credential storage, or rendering — it only knows the shapes of
//! the messages and how to (de)serialize them.
//!
//! ```text
//! Transport (HTTP bytes) → Protocol (Session, TokenReply) → Auth / View / Sync
//! ```

mod codec;
mod credentials;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use credentials::{
    AccessToken, Authority, CreateSessionForm, TokenGrant, TokenPair,
    TokenReply, PLAYER_AUTHORITY,
};
pub use error::ProtocolError;
pub use types::{
    CollectionSnapshot, GameParameters, Session, SessionId, SessionsBundle,
    Username, VersionDigest, VersionToken,
};
