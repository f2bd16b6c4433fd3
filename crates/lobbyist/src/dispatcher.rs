//! Action dispatcher: turns a triggered control into a guarded call.
//!
//! The dispatcher never touches the snapshot it reads from. A successful
//! Join, Leave, Delete or Launch only means the server accepted the
//! request; the table changes when the long-poll delivers the server's
//! new state.

use std::sync::Arc;

use lobbyist_auth::{AuthGuard, CredentialStore, GuardError, Navigator};
use lobbyist_protocol::{CreateSessionForm, SessionId};
use lobbyist_sync::Synchronizer;
use lobbyist_transport::{LobbyApi, TransportError};
use lobbyist_view::{Action, ActionControl, RenderAdapter, game_location};
use tokio::sync::Mutex;

/// What happened after a successful dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The request was sent and accepted.
    Sent,
    /// No request was needed; open this location (Play, Watch).
    Navigate(String),
}

/// Why a control could not be dispatched.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The control is shown disabled; nothing was sent.
    #[error("{action} is not available for session {session_id}")]
    Disabled { session_id: SessionId, action: Action },

    /// The current table does not offer this action for the session.
    #[error("{action} is not offered for session {session_id}")]
    NotOffered { session_id: SessionId, action: Action },

    /// The session is not in the current snapshot.
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// The guarded call failed.
    #[error(transparent)]
    Guard(#[from] GuardError),
}

/// Binds controls to the lobby API through the auth guard.
pub struct ActionDispatcher<A, S, N, R>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
    R: RenderAdapter,
{
    guard: Arc<AuthGuard<A, S, N>>,
    sync: Arc<Mutex<Synchronizer<R>>>,
}

impl<A, S, N, R> Clone for ActionDispatcher<A, S, N, R>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
    R: RenderAdapter,
{
    fn clone(&self) -> Self {
        Self {
            guard: Arc::clone(&self.guard),
            sync: Arc::clone(&self.sync),
        }
    }
}

impl<A, S, N, R> ActionDispatcher<A, S, N, R>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
    R: RenderAdapter,
{
    pub fn new(guard: Arc<AuthGuard<A, S, N>>, sync: Arc<Mutex<Synchronizer<R>>>) -> Self {
        Self { guard, sync }
    }

    /// Dispatches a control taken from a rendered row.
    ///
    /// The control is checked against the table as it stands now, so a
    /// control kept from an earlier render only goes through if the
    /// current table still offers it enabled.
    ///
    /// # Errors
    /// - [`DispatchError::Disabled`] if the control, or its current
    ///   counterpart, is disabled (nothing is sent)
    /// - [`DispatchError::NotOffered`] if the current table has no such
    ///   action for the session
    /// - [`DispatchError::UnknownSession`] if the session has vanished
    ///   from the snapshot
    /// - [`DispatchError::Guard`] if the call itself failed. An
    ///   [`GuardError::AuthLost`] has already triggered the reload; the
    ///   caller has nothing more to report.
    pub async fn dispatch(
        &self,
        control: &ActionControl,
    ) -> Result<DispatchOutcome, DispatchError> {
        let ActionControl {
            session_id,
            action,
            enabled,
        } = control;
        let disabled = || DispatchError::Disabled {
            session_id: session_id.clone(),
            action: *action,
        };

        if !enabled {
            tracing::debug!(%session_id, %action, "refusing disabled control");
            return Err(disabled());
        }

        let location = {
            let sync = self.sync.lock().await;
            let row = sync
                .rows()
                .iter()
                .find(|r| r.session_id == *session_id)
                .ok_or_else(|| DispatchError::UnknownSession(session_id.clone()))?;
            let current = row.control(*action).ok_or_else(|| DispatchError::NotOffered {
                session_id: session_id.clone(),
                action: *action,
            })?;
            if !current.enabled {
                tracing::debug!(%session_id, %action, "control no longer enabled");
                return Err(disabled());
            }
            game_location(sync.snapshot(), session_id)
        };

        match action {
            Action::Play | Action::Watch => {
                let location =
                    location.ok_or_else(|| DispatchError::UnknownSession(session_id.clone()))?;
                tracing::info!(%session_id, %action, %location, "opening game");
                Ok(DispatchOutcome::Navigate(location))
            }
            Action::Join | Action::Leave | Action::Delete | Action::Launch => {
                self.send(session_id, *action).await?;
                tracing::info!(%session_id, %action, "session action accepted");
                Ok(DispatchOutcome::Sent)
            }
        }
    }

    /// Dispatches `action` for `session_id` if the current table offers
    /// it enabled.
    pub async fn trigger(
        &self,
        session_id: &SessionId,
        action: Action,
    ) -> Result<DispatchOutcome, DispatchError> {
        self.dispatch(&ActionControl {
            session_id: session_id.clone(),
            action,
            enabled: true,
        })
        .await
    }

    async fn send(&self, session_id: &SessionId, action: Action) -> Result<(), GuardError> {
        let session = session_id.clone();
        self.guard
            .guarded_call(|api, creds| async move {
                let token = &creds.access_token;
                match action {
                    Action::Join => api.join_session(token, &session, &creds.username).await,
                    Action::Leave => api.leave_session(token, &session, &creds.username).await,
                    Action::Delete => api.delete_session(token, &session).await,
                    Action::Launch => api.launch_session(token, &session).await,
                    Action::Play | Action::Watch => Ok(()),
                }
            })
            .await
    }

    /// Starts a new session for `game` with the viewer as creator.
    /// `savegame` is empty for a fresh game.
    pub async fn start_session(&self, game: &str, savegame: &str) -> Result<(), DispatchError> {
        Ok(start_session(&self.guard, game, savegame).await?)
    }

    /// Lists the game kinds a session can be started for. Needs no login.
    pub async fn game_services(&self) -> Result<Vec<String>, TransportError> {
        self.guard.api().game_services().await
    }
}

/// Creates a session for `game` with the logged-in user as creator.
pub(crate) async fn start_session<A, S, N>(
    guard: &AuthGuard<A, S, N>,
    game: &str,
    savegame: &str,
) -> Result<(), GuardError>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
{
    let form_game = game.to_string();
    let savegame = savegame.to_string();
    guard
        .guarded_call(|api, creds| async move {
            let form = CreateSessionForm {
                creator: creds.username.clone(),
                game: form_game,
                savegame,
            };
            api.create_session(&creds.access_token, &form).await
        })
        .await?;
    tracing::info!(%game, "session start requested");
    Ok(())
}
