//! The long-poll loop that feeds a [`Synchronizer`].

use std::sync::Arc;
use std::time::Duration;

use lobbyist_auth::{AuthGuard, CredentialStore, Navigator};
use lobbyist_transport::{LobbyApi, PollOutcome};
use lobbyist_view::RenderAdapter;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::Synchronizer;

/// Retry behavior of the observer when the service is unreachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Base wait before re-issuing a failed poll.
    pub retry_delay: Duration,

    /// Random extra wait (0..jitter) added to every retry so clients that
    /// lost the service together do not all come back in the same
    /// instant. Zero disables it.
    pub retry_jitter: Duration,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(2),
            retry_jitter: Duration::from_millis(500),
        }
    }
}

impl ObserverConfig {
    /// Wait before the next retry: the base delay plus fresh jitter.
    pub fn next_delay(&self) -> Duration {
        let jitter_ms = self.retry_jitter.as_millis() as u64;
        let jitter = if jitter_ms > 0 {
            Duration::from_millis(rand::rng().random_range(0..jitter_ms))
        } else {
            Duration::ZERO
        };
        self.retry_delay + jitter
    }
}

/// Runs the long-poll loop forever.
///
/// ```text
/// poll(version) ──200──→ on_change ──→ poll(new version)
///       │
///       ├──408──→ poll(same version)
///       │
///       └──error──→ on_unreachable ──→ sleep(delay + jitter) ──→ poll(same version)
/// ```
///
/// Each delivery is fully processed before the next poll is issued, so
/// changes are never interleaved. The synchronizer lock is not held
/// while a poll is open. The viewer is read from the guard at every
/// delivery, so a logout takes effect on the next change.
///
/// The loop never returns on its own; abort the task to stop it.
pub async fn observe<A, S, N, R>(
    guard: Arc<AuthGuard<A, S, N>>,
    sync: Arc<Mutex<Synchronizer<R>>>,
    config: ObserverConfig,
) where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
    R: RenderAdapter,
{
    loop {
        let version = sync.lock().await.version().clone();

        match guard.api().poll_sessions(&version).await {
            Ok(PollOutcome::Changed(snapshot)) => {
                let viewer = guard.viewer().await.unwrap_or_default();
                sync.lock().await.on_change(snapshot, viewer);
            }
            Ok(PollOutcome::Unchanged) => {
                tracing::trace!(%version, "long-poll timed out, re-issuing");
            }
            Err(e) => {
                tracing::warn!(error = %e, %version, "long-poll failed");
                sync.lock().await.on_unreachable();
                tokio::time::sleep(config.next_delay()).await;
            }
        }
    }
}

/// Spawns [`observe`] on the current runtime.
pub fn spawn_observer<A, S, N, R>(
    guard: Arc<AuthGuard<A, S, N>>,
    sync: Arc<Mutex<Synchronizer<R>>>,
    config: ObserverConfig,
) -> JoinHandle<()>
where
    A: LobbyApi,
    S: CredentialStore,
    N: Navigator,
    R: RenderAdapter,
{
    tokio::spawn(observe(guard, sync, config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_delay_stays_within_jitter_bounds() {
        let config = ObserverConfig {
            retry_delay: Duration::from_millis(100),
            retry_jitter: Duration::from_millis(50),
        };
        for _ in 0..100 {
            let d = config.next_delay();
            assert!(d >= Duration::from_millis(100));
            assert!(d < Duration::from_millis(150));
        }
    }

    #[test]
    fn test_next_delay_without_jitter_is_exact() {
        let config = ObserverConfig {
            retry_delay: Duration::from_secs(1),
            retry_jitter: Duration::ZERO,
        };
        assert_eq!(config.next_delay(), Duration::from_secs(1));
    }
}
