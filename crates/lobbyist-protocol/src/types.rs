//! Core data types for the lobby service's session collection.
//!
//! Every type here mirrors a JSON shape the lobby service sends or
//! accepts. Field names follow the server's camelCase spelling through
//! `#[serde(rename_all = "camelCase")]`, so the Rust side can keep
//! snake_case.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use md5::Md5;
use sha2::{Digest, Sha256};

use crate::{Codec, ProtocolError};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A case-normalized username.
///
/// The lobby service treats names case-insensitively, and the client
/// compares the viewer against `creator` and `players` by plain string
/// equality. Normalizing at construction (and on deserialization, via
/// `#[serde(from = "String")]`) means `"Alice"` and `"alice"` are the
/// same viewer everywhere.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Creates a username, lower-casing the raw input.
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    /// Returns the normalized name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the name is empty after normalization.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<String> for Username {
    fn from(raw: String) -> Self {
        Self::new(&raw)
    }
}

impl From<Username> for String {
    fn from(name: Username) -> Self {
        name.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The server-assigned key of a session.
///
/// Opaque to the client: it is only ever used to address the session in
/// request paths and to key the snapshot map. `#[serde(transparent)]`
/// makes it serialize as the bare string (it is a JSON object key on
/// the wire).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Returns the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// GameParameters
// ---------------------------------------------------------------------------

/// The registration record of a game service, copied into each session.
///
/// Server-owned and immutable once the session exists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameParameters {
    /// Unique game kind name, e.g. `"Splendor"`.
    pub name: String,

    /// Optional human-friendly name shown instead of `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    /// Base URI of the game service.
    pub location: String,

    /// Minimum players required before the session can be launched.
    pub min_session_players: u32,

    /// Maximum players the session accepts.
    pub max_session_players: u32,

    /// Whether the game ships a web UI. Older servers omit the field.
    #[serde(default = "default_web_support")]
    pub web_support: bool,
}

fn default_web_support() -> bool {
    true
}

impl GameParameters {
    /// The label to show for this game: the display name if the service
    /// registered one, otherwise the raw name.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.name)
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// One game session as the lobby service reports it.
///
/// The id is not part of the record; it is the key under which the
/// session appears in [`SessionsBundle::sessions`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The user who started the session. Always the first player.
    pub creator: Username,

    /// Game kind this session runs.
    pub game_parameters: GameParameters,

    /// `true` once the session has been launched.
    pub launched: bool,

    /// Current players in join order.
    pub players: Vec<Username>,

    /// Savegame the session was started from; empty for a fresh game.
    #[serde(default, rename = "savegameid")]
    pub savegame_id: String,
}

impl Session {
    /// Returns `true` if `player` is listed in this session.
    pub fn has_player(&self, player: &Username) -> bool {
        self.players.contains(player)
    }

    /// Returns `true` if no further player can join.
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.game_parameters.max_session_players as usize
    }

    /// Returns `true` if enough players are present to launch.
    pub fn has_quorum(&self) -> bool {
        self.players.len() >= self.game_parameters.min_session_players as usize
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// The body of the sessions resource: `{"sessions": {"<id>": {...}}}`.
///
/// A `BTreeMap` keeps iteration ordered by id, so derived row lists come
/// out in the same order on every render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionsBundle {
    pub sessions: BTreeMap<SessionId, Session>,
}

/// Digest the lobby service uses to fingerprint the sessions resource.
///
/// The long-poll blocks only while the `hash` it receives equals the
/// service's own digest of the current body, so the client must compute
/// the same one. The stock lobby service uses MD5.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionDigest {
    #[default]
    Md5,
    Sha256,
}

impl VersionDigest {
    /// Computes the version token of a raw response body.
    pub fn token(self, body: &[u8]) -> VersionToken {
        let hex = match self {
            Self::Md5 => to_hex(&Md5::digest(body)),
            Self::Sha256 => to_hex(&Sha256::digest(body)),
        };
        VersionToken(hex)
    }
}

impl std::str::FromStr for VersionDigest {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "md5" => Ok(Self::Md5),
            "sha256" | "sha-256" => Ok(Self::Sha256),
            other => Err(ProtocolError::InvalidMessage(format!(
                "unknown version digest {other}"
            ))),
        }
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Opaque version of the sessions resource.
///
/// The long-poll endpoint takes the last known version as its `hash`
/// parameter and blocks until the resource no longer matches it. Tokens
/// are only ever produced by a [`VersionDigest`]; the empty token means
/// "nothing known yet".
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct VersionToken(String);

impl VersionToken {
    /// The token used before the first delivery.
    pub fn initial() -> Self {
        Self(String::new())
    }

    /// Computes the token for a raw response body with the default
    /// digest.
    pub fn of(body: &[u8]) -> Self {
        VersionDigest::default().token(body)
    }

    /// Returns `true` for the token used before the first delivery.
    pub fn is_initial(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the token as sent in the `hash` query parameter.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VersionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<initial>");
        }
        // Twelve chars are plenty to tell versions apart in logs.
        let end = self
            .0
            .char_indices()
            .nth(12)
            .map_or(self.0.len(), |(i, _)| i);
        f.write_str(&self.0[..end])
    }
}

/// The client's in-memory copy of the sessions collection.
///
/// Replaced wholesale on every change; never merged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionSnapshot {
    sessions: BTreeMap<SessionId, Session>,
    version: VersionToken,
}

impl CollectionSnapshot {
    /// Creates a snapshot from already-decoded sessions.
    pub fn new(
        sessions: BTreeMap<SessionId, Session>,
        version: VersionToken,
    ) -> Self {
        Self { sessions, version }
    }

    /// Decodes a raw sessions body and stamps it with its version,
    /// using the default digest.
    ///
    /// # Errors
    /// Returns the codec's decode error if the body is not a sessions
    /// bundle.
    pub fn from_body<C: Codec>(
        codec: &C,
        body: &[u8],
    ) -> Result<Self, ProtocolError> {
        Self::from_body_with(codec, body, VersionDigest::default())
    }

    /// Like [`CollectionSnapshot::from_body`], fingerprinting the body
    /// with `digest`.
    pub fn from_body_with<C: Codec>(
        codec: &C,
        body: &[u8],
        digest: VersionDigest,
    ) -> Result<Self, ProtocolError> {
        let bundle: SessionsBundle = codec.decode(body)?;
        Ok(Self {
            sessions: bundle.sessions,
            version: digest.token(body),
        })
    }

    /// Looks up a session by id.
    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    /// Iterates sessions in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&SessionId, &Session)> {
        self.sessions.iter()
    }

    /// The version this snapshot was delivered with.
    pub fn version(&self) -> &VersionToken {
        &self.version
    }

    /// Number of sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    /// Returns `true` if there are no sessions.
    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

// =========================================================================
// Tests
// =========================================================================
