//! Credential-related wire types: the OAuth token reply, the role lookup,
//! and the start-session form.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, Username};

/// Authority string the role lookup returns for regular players.
pub const PLAYER_AUTHORITY: &str = "ROLE_PLAYER";

// ---------------------------------------------------------------------------
// AccessToken
// ---------------------------------------------------------------------------

/// An access token in its persisted, transport-safe form.
///
/// The value is already escaped (every `+` replaced by `%2B`) and is
/// appended verbatim as the `access_token` query value. `Debug` is
/// redacted so the token never ends up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wraps an already-escaped token.
    pub fn new(escaped: impl Into<String>) -> Self {
        Self(escaped.into())
    }

    /// Returns the escaped token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

// ---------------------------------------------------------------------------
// Token exchange
// ---------------------------------------------------------------------------

/// The raw reply of the token endpoint.
///
/// The endpoint answers with HTTP 200 in both cases and puts the outcome
/// in the body, so every field is optional here and [`TokenReply::into_grant`]
/// decides which case we got.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenReply {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// A freshly issued token pair, not yet escaped.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair").finish_non_exhaustive()
    }
}

/// The interpreted outcome of a token exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenGrant {
    /// The server issued a token pair.
    Granted(TokenPair),

    /// The server rejected the credentials. `reason` is the server's
    /// `error_description`, or the bare `error` code if no description
    /// was sent.
    Denied { reason: String },
}

impl TokenReply {
    /// Interprets the reply.
    ///
    /// The presence of `error` is the only rejection signal. Without it,
    /// both tokens must be present.
    ///
    /// # Errors
    /// Returns [`ProtocolError::InvalidMessage`] if the reply carries
    /// neither an error nor a complete token pair.
    pub fn into_grant(self) -> Result<TokenGrant, ProtocolError> {
        if let Some(error) = self.error {
            let reason = self
                .error_description
                .filter(|d| !d.is_empty())
                .unwrap_or(error);
            return Ok(TokenGrant::Denied { reason });
        }

        match (self.access_token, self.refresh_token) {
            (Some(access_token), Some(refresh_token))
                if !access_token.is_empty() && !refresh_token.is_empty() =>
            {
                Ok(TokenGrant::Granted(TokenPair {
                    access_token,
                    refresh_token,
                }))
            }
            _ => Err(ProtocolError::InvalidMessage(
                "token reply carries neither an error nor a token pair".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Role lookup
// ---------------------------------------------------------------------------

/// One entry of the role lookup reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub authority: String,
}

impl Authority {
    /// Returns `true` for the regular-player authority.
    pub fn is_player(&self) -> bool {
        self.authority == PLAYER_AUTHORITY
    }
}

// ---------------------------------------------------------------------------
// Start session
// ---------------------------------------------------------------------------

/// Body of the create-session request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateSessionForm {
    pub creator: Username,
    pub game: String,
    /// Savegame to resume; the server expects an empty string for a
    /// fresh game.
    #[serde(default)]
    pub savegame: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_grant_error_present_is_denied_with_description() {
        let reply = TokenReply {
            error: Some("invalid_grant".into()),
            error_description: Some("Bad credentials".into()),
            ..TokenReply::default()
        };
        assert_eq!(
            reply.into_grant().unwrap(),
            TokenGrant::Denied {
                reason: "Bad credentials".into()
            }
        );
    }

    #[test]
    fn test_into_grant_error_wins_over_tokens() {
        // A reply that somehow carries both is still a rejection.
        let reply = TokenReply {
            access_token: Some("a".into()),
            refresh_token: Some("r".into()),
            error: Some("unauthorized".into()),
            error_description: None,
        };
        assert_eq!(
            reply.into_grant().unwrap(),
            TokenGrant::Denied {
                reason: "unauthorized".into()
            }
        );
    }

    #[test]
    fn test_into_grant_both_tokens_is_granted() {
        let reply = TokenReply {
            access_token: Some("a+b".into()),
            refresh_token: Some("r".into()),
            ..TokenReply::default()
        };
        let TokenGrant::Granted(pair) = reply.into_grant().unwrap() else {
            panic!("expected a grant");
        };
        assert_eq!(pair.access_token, "a+b");
        assert_eq!(pair.refresh_token, "r");
    }

    #[test]
    fn test_into_grant_partial_pair_is_invalid() {
        let reply = TokenReply {
            access_token: Some("a".into()),
            ..TokenReply::default()
        };
        assert!(matches!(
            reply.into_grant(),
            Err(ProtocolError::InvalidMessage(_))
        ));
    }

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("secret%2Bvalue");
        assert_eq!(format!("{token:?}"), "AccessToken(***)");
        assert_eq!(token.as_str(), "secret%2Bvalue");
    }

    #[test]
    fn test_authority_is_player() {
        let player = Authority {
            authority: PLAYER_AUTHORITY.into(),
        };
        let admin = Authority {
            authority: "ROLE_ADMIN".into(),
        };
        assert!(player.is_player());
        assert!(!admin.is_player());
    }

    #[test]
    fn test_create_session_form_json_format() {
        let form = CreateSessionForm {
            creator: Username::new("Alice"),
            game: "Splendor".into(),
            savegame: String::new(),
        };
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"creator": "alice", "game": "Splendor", "savegame": ""})
        );
    }
}
