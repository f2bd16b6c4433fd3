//! Integration tests for the long-poll observer.
//!
//! Uses `start_paused` so retry sleeps resolve instantly, and a scripted
//! API whose poll queue drives the loop. When the queue runs dry the next
//! poll never completes, which parks the observer like a real long-poll
//! with nothing new.

use std::sync::Arc;
use std::time::Duration;

use lobbyist_auth::{AuthGuard, Landing, MemoryCredentialStore, Navigator};
use lobbyist_protocol::{CollectionSnapshot, JsonCodec, VersionToken};
use lobbyist_sync::{ObserverConfig, Synchronizer, spawn_observer};
use lobbyist_transport::testing::{ApiCall, ScriptedApi};
use lobbyist_transport::{PollOutcome, TransportError};
use lobbyist_view::testing::RecordingRenderer;
use lobbyist_view::{Action, Role};
use tokio::sync::Mutex;

// =========================================================================
// Helpers
// =========================================================================

struct StayPut;

impl Navigator for StayPut {
    fn reload(&self) {}
    fn redirect(&self, _landing: Landing) {}
}

type Guard = AuthGuard<ScriptedApi, MemoryCredentialStore, StayPut>;
type Shared = Arc<Mutex<Synchronizer<RecordingRenderer>>>;

fn body(players: &str, launched: bool) -> String {
    format!(
        r#"{{"sessions":{{"1":{{"creator":"alice","gameParameters":{{"location":"http://g","maxSessionPlayers":4,"minSessionPlayers":2,"name":"Splendor"}},"launched":{launched},"players":{players}}}}}}}"#
    )
}

fn changed(players: &str, launched: bool) -> Result<PollOutcome, TransportError> {
    let snapshot =
        CollectionSnapshot::from_body(&JsonCodec, body(players, launched).as_bytes()).unwrap();
    Ok(PollOutcome::Changed(snapshot))
}

fn version_of(players: &str, launched: bool) -> VersionToken {
    VersionToken::of(body(players, launched).as_bytes())
}

async fn setup(viewer: Option<&str>) -> (Arc<ScriptedApi>, Arc<Guard>, Shared, RecordingRenderer) {
    let api = Arc::new(ScriptedApi::new());
    let guard = Arc::new(AuthGuard::new(
        Arc::clone(&api),
        MemoryCredentialStore::new(),
        StayPut,
    ));
    if let Some(name) = viewer {
        api.grant("a", "r");
        guard.login(name, "pw").await.unwrap();
    }
    let renderer = RecordingRenderer::new();
    let sync = Arc::new(Mutex::new(Synchronizer::new(renderer.clone())));
    (api, guard, sync, renderer)
}

fn config() -> ObserverConfig {
    ObserverConfig {
        retry_delay: Duration::from_secs(2),
        retry_jitter: Duration::from_millis(500),
    }
}

/// Waits until the synchronizer has rendered `n` times.
async fn wait_for_renders(sync: &Shared, n: u64) {
    let mut rx = sync.lock().await.subscribe();
    tokio::time::timeout(Duration::from_secs(60), rx.wait_for(|g| *g >= n))
        .await
        .expect("observer stalled")
        .expect("synchronizer dropped");
}

fn polled_versions(api: &ScriptedApi) -> Vec<VersionToken> {
    api.calls()
        .into_iter()
        .filter_map(|c| match c {
            ApiCall::Poll { version } => Some(version),
            _ => None,
        })
        .collect()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test(start_paused = true)]
async fn test_observer_delivers_and_reissues_with_latest_version() {
    let (api, guard, sync, renderer) = setup(Some("bob")).await;
    api.push_poll(changed(r#"["alice"]"#, false));
    api.push_poll(Ok(PollOutcome::Unchanged));
    api.push_poll(changed(r#"["alice","bob"]"#, false));

    let task = spawn_observer(guard, Arc::clone(&sync), config());
    wait_for_renders(&sync, 2).await;

    let versions = polled_versions(&api);
    let v1 = version_of(r#"["alice"]"#, false);
    assert_eq!(versions[..3], [VersionToken::initial(), v1.clone(), v1]);

    let renders = renderer.recorded().renders;
    assert_eq!(renders[0][0].controls[0].action, Action::Join);
    assert_eq!(renders[1][0].role, Role::Participant);
    assert_eq!(renders[1][0].controls[0].action, Action::Leave);
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_observer_failure_marks_offline_then_recovers() {
    let (api, guard, sync, renderer) = setup(Some("bob")).await;
    api.push_poll(changed(r#"["alice"]"#, false));
    api.push_poll(Err(TransportError::Unreachable("connection refused".into())));
    api.push_poll(changed(r#"["alice"]"#, true));

    let task = spawn_observer(guard, Arc::clone(&sync), config());
    wait_for_renders(&sync, 2).await;

    let recorded = renderer.recorded();
    assert_eq!(recorded.offline, vec![true, false]);
    assert_eq!(recorded.renders[1][0].controls[0].action, Action::Watch);
    assert!(!sync.lock().await.is_offline());

    // The retry re-used the last good version.
    let versions = polled_versions(&api);
    let v1 = version_of(r#"["alice"]"#, false);
    assert_eq!(versions[1], v1);
    assert_eq!(versions[2], v1);
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_observer_offline_keeps_last_snapshot() {
    let (api, guard, sync, renderer) = setup(Some("bob")).await;
    api.push_poll(changed(r#"["alice"]"#, false));
    api.push_poll(Err(TransportError::Unreachable("down".into())));
    api.push_poll(Err(TransportError::Unreachable("still down".into())));

    let task = spawn_observer(guard, Arc::clone(&sync), config());
    wait_for_renders(&sync, 1).await;
    // Let both failures and their retry sleeps play out.
    tokio::time::sleep(Duration::from_secs(10)).await;

    let sync = sync.lock().await;
    assert!(sync.is_offline());
    assert_eq!(sync.snapshot().len(), 1);
    assert_eq!(sync.rows().len(), 1);
    assert_eq!(renderer.recorded().offline, vec![true]);
    assert_eq!(renderer.render_count(), 1);
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_observer_same_version_twice_renders_once() {
    let (api, guard, sync, renderer) = setup(Some("bob")).await;
    api.push_poll(changed(r#"["alice"]"#, false));
    api.push_poll(changed(r#"["alice"]"#, false));
    api.push_poll(changed(r#"["alice","carol"]"#, false));

    let task = spawn_observer(guard, Arc::clone(&sync), config());
    wait_for_renders(&sync, 2).await;

    assert_eq!(renderer.render_count(), 2);
    assert_eq!(renderer.last().unwrap()[0].fill, "[2/2-4]: Alice, Carol");
    task.abort();
}

#[tokio::test(start_paused = true)]
async fn test_observer_without_login_renders_outsider_view() {
    let (api, guard, sync, renderer) = setup(None).await;
    api.push_poll(changed(r#"["alice"]"#, false));

    let task = spawn_observer(guard, Arc::clone(&sync), config());
    wait_for_renders(&sync, 1).await;

    let rows = renderer.last().unwrap();
    assert_eq!(rows[0].role, Role::Outsider);
    task.abort();
}
