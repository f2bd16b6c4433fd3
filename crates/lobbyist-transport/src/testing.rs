//! In-memory [`LobbyApi`] double for tests.
//!
//! [`ScriptedApi`] answers from queues the test fills up front and records
//! every call it receives, so tests can assert both on what the client
//! did with a reply and on which requests it sent.
//!
//! When a queue runs dry the double falls back to a neutral answer:
//! mutating calls succeed, the role lookup returns a player, and
//! `poll_sessions` never completes (like a long-poll with nothing new).

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use lobbyist_protocol::{
    AccessToken, Authority, CreateSessionForm, SessionId, TokenReply, Username,
    VersionToken, PLAYER_AUTHORITY,
};

use crate::{LobbyApi, PollOutcome, TransportError};

/// A request the double received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiCall {
    ExchangeCredentials { username: Username },
    Roles { token: String },
    GameServices,
    CreateSession { token: String, form: CreateSessionForm },
    Join { token: String, session: SessionId, player: Username },
    Leave { token: String, session: SessionId, player: Username },
    Delete { token: String, session: SessionId },
    Launch { token: String, session: SessionId },
    Poll { version: VersionToken },
}

#[derive(Default)]
struct Script {
    token_replies: VecDeque<Result<TokenReply, TransportError>>,
    roles: VecDeque<Result<Vec<Authority>, TransportError>>,
    game_services: Vec<String>,
    actions: VecDeque<Result<(), TransportError>>,
    polls: VecDeque<Result<PollOutcome, TransportError>>,
    calls: Vec<ApiCall>,
}

/// Scripted lobby service.
#[derive(Default)]
pub struct ScriptedApi {
    script: Mutex<Script>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        // A panicking test thread poisons the lock; the data is still
        // fine to read for the remaining assertions.
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Queues the answer to the next token exchange.
    pub fn push_token_reply(&self, reply: Result<TokenReply, TransportError>) {
        self.script().token_replies.push_back(reply);
    }

    /// Queues a successful token exchange.
    pub fn grant(&self, access_token: &str, refresh_token: &str) {
        self.push_token_reply(Ok(TokenReply {
            access_token: Some(access_token.to_string()),
            refresh_token: Some(refresh_token.to_string()),
            ..TokenReply::default()
        }));
    }

    /// Queues a rejected token exchange.
    pub fn deny(&self, description: &str) {
        self.push_token_reply(Ok(TokenReply {
            error: Some("invalid_grant".to_string()),
            error_description: Some(description.to_string()),
            ..TokenReply::default()
        }));
    }

    /// Queues the answer to the next role lookup.
    pub fn push_roles(&self, roles: Result<Vec<Authority>, TransportError>) {
        self.script().roles.push_back(roles);
    }

    /// Sets the game kinds `game_services` returns.
    pub fn set_game_services(&self, games: &[&str]) {
        self.script().game_services = games.iter().map(|g| g.to_string()).collect();
    }

    /// Queues the answer to the next mutating call (create, join, leave,
    /// delete, launch — in the order they arrive).
    pub fn push_action(&self, result: Result<(), TransportError>) {
        self.script().actions.push_back(result);
    }

    /// Queues the answer to the next long-poll.
    pub fn push_poll(&self, outcome: Result<PollOutcome, TransportError>) {
        self.script().polls.push_back(outcome);
    }

    /// Returns every call received so far.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.script().calls.clone()
    }

    /// Returns the calls received so far, excluding long-polls.
    pub fn requests(&self) -> Vec<ApiCall> {
        self.calls()
            .into_iter()
            .filter(|c| !matches!(c, ApiCall::Poll { .. }))
            .collect()
    }

    fn record(&self, call: ApiCall) {
        self.script().calls.push(call);
    }

    fn next_action(&self, call: ApiCall) -> Result<(), TransportError> {
        let mut script = self.script();
        script.calls.push(call);
        script.actions.pop_front().unwrap_or(Ok(()))
    }
}

impl LobbyApi for ScriptedApi {
    async fn exchange_credentials(
        &self,
        username: &Username,
        _password: &str,
    ) -> Result<TokenReply, TransportError> {
        let mut script = self.script();
        script.calls.push(ApiCall::ExchangeCredentials {
            username: username.clone(),
        });
        script
            .token_replies
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Unreachable("no scripted reply".into())))
    }

    async fn roles(
        &self,
        token: &AccessToken,
    ) -> Result<Vec<Authority>, TransportError> {
        let mut script = self.script();
        script.calls.push(ApiCall::Roles {
            token: token.as_str().to_string(),
        });
        script.roles.pop_front().unwrap_or_else(|| {
            Ok(vec![Authority {
                authority: PLAYER_AUTHORITY.to_string(),
            }])
        })
    }

    async fn game_services(&self) -> Result<Vec<String>, TransportError> {
        let mut script = self.script();
        script.calls.push(ApiCall::GameServices);
        Ok(script.game_services.clone())
    }

    async fn create_session(
        &self,
        token: &AccessToken,
        form: &CreateSessionForm,
    ) -> Result<(), TransportError> {
        self.next_action(ApiCall::CreateSession {
            token: token.as_str().to_string(),
            form: form.clone(),
        })
    }

    async fn join_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
        player: &Username,
    ) -> Result<(), TransportError> {
        self.next_action(ApiCall::Join {
            token: token.as_str().to_string(),
            session: session.clone(),
            player: player.clone(),
        })
    }

    async fn leave_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
        player: &Username,
    ) -> Result<(), TransportError> {
        self.next_action(ApiCall::Leave {
            token: token.as_str().to_string(),
            session: session.clone(),
            player: player.clone(),
        })
    }

    async fn delete_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
    ) -> Result<(), TransportError> {
        self.next_action(ApiCall::Delete {
            token: token.as_str().to_string(),
            session: session.clone(),
        })
    }

    async fn launch_session(
        &self,
        token: &AccessToken,
        session: &SessionId,
    ) -> Result<(), TransportError> {
        self.next_action(ApiCall::Launch {
            token: token.as_str().to_string(),
            session: session.clone(),
        })
    }

    async fn poll_sessions(
        &self,
        version: &VersionToken,
    ) -> Result<PollOutcome, TransportError> {
        self.record(ApiCall::Poll {
            version: version.clone(),
        });
        let next = self.script().polls.pop_front();
        match next {
            Some(outcome) => outcome,
            None => std::future::pending().await,
        }
    }
}
