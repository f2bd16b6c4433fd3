//! `LobbyClient` builder and the lobby view handle.
//!
//! This is the entry point for embedding the client. It ties together all
//! the layers: transport → auth → sync → view.

use std::sync::Arc;
use std::time::Duration;

use lobbyist_auth::{
    AuthGuard, CredentialStore, GuardError, Landing, LoginOutcome, Navigator,
};
use lobbyist_protocol::{SessionId, Username};
use lobbyist_sync::{ObserverConfig, Synchronizer, spawn_observer};
use lobbyist_transport::{HttpTransport, LobbyApi, TransportError};
use lobbyist_view::{Action, RenderAdapter, SessionRow};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::{
    ActionDispatcher, ClientConfig, ConfiguredStore, DispatchError, DispatchOutcome, LobbyError,
};

/// Builder for a [`LobbyClient`] talking HTTP to a real lobby service.
///
/// # Example
///
/// ```rust,ignore
/// use lobbyist::prelude::*;
///
/// let client = LobbyClientBuilder::new()
///     .config(ClientConfig::from_env()?)
///     .build(my_navigator)?;
/// client.login("maex", "abc123_ABC123").await?;
/// ```
#[derive(Debug, Default)]
pub struct LobbyClientBuilder {
    config: ClientConfig,
}

impl LobbyClientBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the lobby service address.
    pub fn base_url(mut self, url: &str) -> Self {
        self.config.base_url = url.to_string();
        self
    }

    /// Persists credentials at `path` instead of keeping them in memory.
    pub fn credentials_path(mut self, path: impl Into<std::path::PathBuf>) -> Self {
        self.config.credentials_path = Some(path.into());
        self
    }

    /// Sets the long-poll retry behavior.
    pub fn observer(mut self, observer: ObserverConfig) -> Self {
        self.config.observer = observer;
        self
    }

    /// Builds the HTTP transport, opens the credential store and wires
    /// them to `navigator`.
    pub fn build<N: Navigator>(
        self,
        navigator: N,
    ) -> Result<LobbyClient<HttpTransport, ConfiguredStore, N>, LobbyError> {
        let api = HttpTransport::new(self.config.http_config())?;
        let store = self.config.open_store()?;
        tracing::debug!(base_url = %self.config.base_url, "lobby client configured");
        Ok(LobbyClient::new(
            Arc::new(api),
            store,
            navigator,
            self.config.observer,
        ))
    }
}

/// A lobby client: login state plus the ability to open the session view.
///
/// Generic over the API, the credential store and the navigator. The
/// builder produces the HTTP flavor; tests plug in doubles through
/// [`LobbyClient::new`].
pub struct LobbyClient<A, S, N>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
{
    guard: Arc<AuthGuard<A, S, N>>,
    observer: ObserverConfig,
}

impl<A, S, N> LobbyClient<A, S, N>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
{
    pub fn new(api: Arc<A>, store: S, navigator: N, observer: ObserverConfig) -> Self {
        Self {
            guard: Arc::new(AuthGuard::new(api, store, navigator)),
            observer,
        }
    }

    /// The auth guard shared by everything this client opens.
    pub fn guard(&self) -> &Arc<AuthGuard<A, S, N>> {
        &self.guard
    }

    pub async fn login(&self, username: &str, password: &str) -> Result<LoginOutcome, LobbyError> {
        Ok(self.guard.login(username, password).await?)
    }

    /// Clears the tokens and reloads. Returns `false` if already logged
    /// out.
    pub async fn logout(&self) -> Result<bool, LobbyError> {
        Ok(self.guard.logout().await?)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.guard.is_authenticated().await
    }

    pub async fn prefill_username(&self) -> Option<Username> {
        self.guard.prefill_username().await
    }

    pub async fn forward_to_landing(&self) -> Result<Landing, LobbyError> {
        Ok(self.guard.forward_to_landing().await?)
    }

    /// Lists the game kinds a session can be started for.
    pub async fn game_services(&self) -> Result<Vec<String>, TransportError> {
        self.guard.api().game_services().await
    }

    /// Starts a new session for `game` with the logged-in user as
    /// creator, without opening the lobby. `savegame` is empty for a
    /// fresh game.
    pub async fn start_session(&self, game: &str, savegame: &str) -> Result<(), GuardError> {
        crate::dispatcher::start_session(&self.guard, game, savegame).await
    }

    /// Opens the session lobby: passes the route guard, then starts the
    /// long-poll observer feeding `renderer`.
    ///
    /// The observer runs until the returned [`LobbyView`] is dropped.
    ///
    /// # Errors
    /// Returns [`GuardError::AuthLost`] (after redirecting to the entry
    /// page) if nobody is logged in.
    pub async fn open_lobby<R: RenderAdapter>(
        &self,
        renderer: R,
    ) -> Result<LobbyView<A, S, N, R>, LobbyError> {
        if !self.guard.route_guard().await {
            return Err(GuardError::AuthLost.into());
        }

        let sync = Arc::new(Mutex::new(Synchronizer::new(renderer)));
        let observer = spawn_observer(
            Arc::clone(&self.guard),
            Arc::clone(&sync),
            self.observer.clone(),
        );
        tracing::info!("lobby opened");

        Ok(LobbyView {
            dispatcher: ActionDispatcher::new(Arc::clone(&self.guard), Arc::clone(&sync)),
            sync,
            observer,
        })
    }
}

/// An open session lobby.
///
/// Owns the observer task; dropping the view stops it.
pub struct LobbyView<A, S, N, R>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
    R: RenderAdapter,
{
    sync: Arc<Mutex<Synchronizer<R>>>,
    dispatcher: ActionDispatcher<A, S, N, R>,
    observer: JoinHandle<()>,
}

impl<A, S, N, R> LobbyView<A, S, N, R>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
    R: RenderAdapter,
{
    /// The table as last rendered.
    pub async fn rows(&self) -> Vec<SessionRow> {
        self.sync.lock().await.rows().to_vec()
    }

    pub async fn is_offline(&self) -> bool {
        self.sync.lock().await.is_offline()
    }

    /// Waits until the table has been rendered more often than it had
    /// been when this was called.
    pub async fn wait_for_update(&self) {
        let (mut rx, seen) = {
            let sync = self.sync.lock().await;
            (sync.subscribe(), sync.generation())
        };
        // The sender lives inside the synchronizer, which this view keeps
        // alive, so the channel cannot close while we wait.
        let _ = rx.wait_for(|g| *g > seen).await;
    }

    /// Waits for the first delivery, returning at once if one has
    /// already arrived.
    pub async fn wait_for_first_render(&self) {
        let mut rx = self.sync.lock().await.subscribe();
        let _ = rx.wait_for(|g| *g > 0).await;
    }

    /// Like [`LobbyView::wait_for_first_render`], giving up after `limit`.
    ///
    /// # Errors
    /// Returns [`TransportError::Unreachable`] if no table arrived in
    /// time.
    pub async fn wait_for_first_render_within(&self, limit: Duration) -> Result<(), TransportError> {
        tokio::time::timeout(limit, self.wait_for_first_render())
            .await
            .map_err(|_| {
                TransportError::Unreachable(format!("no sessions received within {limit:?}"))
            })
    }

    pub fn dispatcher(&self) -> &ActionDispatcher<A, S, N, R> {
        &self.dispatcher
    }

    /// Shorthand for [`ActionDispatcher::trigger`].
    pub async fn trigger(
        &self,
        session_id: &SessionId,
        action: Action,
    ) -> Result<DispatchOutcome, DispatchError> {
        self.dispatcher.trigger(session_id, action).await
    }

    /// Shorthand for [`ActionDispatcher::start_session`].
    pub async fn start_session(&self, game: &str, savegame: &str) -> Result<(), DispatchError> {
        self.dispatcher.start_session(game, savegame).await
    }

    /// Shared handle to the synchronizer.
    pub fn synchronizer(&self) -> &Arc<Mutex<Synchronizer<R>>> {
        &self.sync
    }
}

impl<A, S, N, R> Drop for LobbyView<A, S, N, R>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
    R: RenderAdapter,
{
    fn drop(&mut self) {
        self.observer.abort();
    }
}
