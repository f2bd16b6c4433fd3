//! The auth guard: the single place that knows what a 401 means.
//!
//! Every authenticated request goes through [`AuthGuard::guarded_call`].
//! The guard reads the stored credentials, hands them to the request, and
//! inspects the outcome:
//!
//! ```text
//! no credentials ───────────────────────────────→ AuthLost
//! 401            ──→ logout() (clear + reload) ──→ AuthLost
//! other status   ─────────────────────────────→ Conflict { status, detail }
//! unreachable    ─────────────────────────────→ Transport
//! ```
//!
//! # Concurrency
//!
//! Several guarded calls can be in flight at once (the user clicks while
//! a long-poll is open). If they all come back 401, only the first one
//! to reach [`AuthGuard::logout`] finds tokens to clear, so the navigator
//! is reloaded exactly once. The check and the clear happen under one
//! lock acquisition; the lock is never held across a network await.

use std::future::Future;
use std::sync::Arc;

use lobbyist_protocol::{Authority, TokenGrant, Username};
use lobbyist_transport::{LobbyApi, TransportError};
use tokio::sync::Mutex;

use crate::{
    AuthError, CredentialKey, CredentialSet, CredentialStore, GuardError, Landing,
    Navigator, StoreError, escape_token,
};

/// Result of a login attempt that reached the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    /// Tokens were issued and stored.
    Accepted,
    /// The server refused the credentials; nothing was stored.
    Rejected(String),
}

/// Guards authenticated calls and owns the credential lifecycle.
///
/// Generic over the API, the store, and the navigator so tests can swap
/// each of them out.
pub struct AuthGuard<A, S, N>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
{
    api: Arc<A>,
    store: Mutex<S>,
    navigator: N,
}

impl<A, S, N> AuthGuard<A, S, N>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
{
    pub fn new(api: Arc<A>, store: S, navigator: N) -> Self {
        Self {
            api,
            store: Mutex::new(store),
            navigator,
        }
    }

    /// The API this guard wraps. Unauthenticated calls (the long-poll,
    /// the game list) go straight through it.
    pub fn api(&self) -> &Arc<A> {
        &self.api
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    // -----------------------------------------------------------------------
    // Reading state
    // -----------------------------------------------------------------------

    /// Returns the stored credentials if all three entries are present.
    pub async fn credentials(&self) -> Option<CredentialSet> {
        CredentialSet::load(&*self.store.lock().await)
    }

    /// Returns `true` if username, access token and refresh token are all
    /// stored and non-empty. A partial set counts as logged out.
    pub async fn is_authenticated(&self) -> bool {
        self.credentials().await.is_some()
    }

    /// The logged-in user, or `None` when the credential set is
    /// incomplete. This is the viewer the session table is derived for.
    pub async fn viewer(&self) -> Option<Username> {
        self.credentials().await.map(|c| c.username)
    }

    /// The retained username, if any. Survives logout so the login
    /// prompt can be prefilled.
    pub async fn prefill_username(&self) -> Option<Username> {
        self.store
            .lock()
            .await
            .get(CredentialKey::UserName)
            .filter(|name| !name.is_empty())
            .map(|name| Username::new(&name))
    }

    // -----------------------------------------------------------------------
    // Login / logout
    // -----------------------------------------------------------------------

    /// Exchanges a username and password for tokens.
    ///
    /// The username is lower-cased first. On acceptance the escaped
    /// tokens and the username are stored; on rejection nothing changes.
    ///
    /// # Errors
    /// - [`AuthError::Transport`] if the token endpoint was unreachable
    ///   (the store is untouched)
    /// - [`AuthError::Protocol`] if the reply was neither a grant nor a
    ///   rejection
    /// - [`AuthError::Store`] if the tokens could not be persisted
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<LoginOutcome, AuthError> {
        let user = Username::new(username);
        let reply = self.api.exchange_credentials(&user, password).await?;

        match reply.into_grant()? {
            TokenGrant::Denied { reason } => {
                tracing::info!(%user, %reason, "login rejected");
                Ok(LoginOutcome::Rejected(reason))
            }
            TokenGrant::Granted(pair) => {
                let mut store = self.store.lock().await;
                store.set(CredentialKey::AccessToken, &escape_token(&pair.access_token))?;
                store.set(CredentialKey::RefreshToken, &escape_token(&pair.refresh_token))?;
                store.set(CredentialKey::UserName, user.as_str())?;
                tracing::info!(%user, "login accepted");
                Ok(LoginOutcome::Accepted)
            }
        }
    }

    /// Ends the login session: clears both tokens (the username stays)
    /// and asks the navigator to reload.
    ///
    /// Idempotent. If neither token is stored nothing happens and
    /// `Ok(false)` is returned; otherwise `Ok(true)` after the reload.
    pub async fn logout(&self) -> Result<bool, StoreError> {
        {
            let mut store = self.store.lock().await;
            let has_access = store.get(CredentialKey::AccessToken).is_some();
            let has_refresh = store.get(CredentialKey::RefreshToken).is_some();
            if !has_access && !has_refresh {
                return Ok(false);
            }
            store.clear(CredentialKey::AccessToken)?;
            store.clear(CredentialKey::RefreshToken)?;
        }

        tracing::info!("logged out, reloading");
        self.navigator.reload();
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Guarded calls
    // -----------------------------------------------------------------------

    /// Runs `call` with the stored credentials and maps its outcome.
    ///
    /// `call` is not invoked at all when no complete credential set is
    /// stored. See the module docs for the outcome mapping.
    pub async fn guarded_call<T, F, Fut>(&self, call: F) -> Result<T, GuardError>
    where
        F: FnOnce(Arc<A>, CredentialSet) -> Fut,
        Fut: Future<Output = Result<T, TransportError>>,
    {
        let Some(credentials) = self.credentials().await else {
            return Err(GuardError::AuthLost);
        };

        match call(Arc::clone(&self.api), credentials).await {
            Ok(value) => Ok(value),
            Err(TransportError::Unauthorized) => {
                if let Err(e) = self.logout().await {
                    tracing::warn!(error = %e, "could not clear credentials after 401");
                }
                Err(GuardError::AuthLost)
            }
            Err(TransportError::Status { status, body }) => {
                tracing::warn!(status, detail = %body, "request refused by lobby service");
                Err(GuardError::Conflict {
                    status,
                    detail: body,
                })
            }
            Err(other) => Err(GuardError::Transport(other)),
        }
    }

    /// The one enforcement point for pages that need a login: redirects
    /// to [`Landing::Entry`] and returns `false` if not authenticated.
    pub async fn route_guard(&self) -> bool {
        if self.is_authenticated().await {
            return true;
        }
        tracing::debug!("not authenticated, redirecting to entry");
        self.navigator.redirect(Landing::Entry);
        false
    }

    /// Looks up the viewer's role and sends them to the matching page:
    /// the lobby for players, the admin page for everyone else.
    ///
    /// Only the first authority counts. An empty list lands on the admin
    /// page.
    pub async fn forward_to_landing(&self) -> Result<Landing, GuardError> {
        let roles: Vec<Authority> = self
            .guarded_call(|api, creds| async move { api.roles(&creds.access_token).await })
            .await?;

        let landing = match roles.first() {
            Some(first) if first.is_player() => Landing::Lobby,
            _ => Landing::Admin,
        };
        tracing::debug!(%landing, "forwarding after login");
        self.navigator.redirect(landing);
        Ok(landing)
    }
}
