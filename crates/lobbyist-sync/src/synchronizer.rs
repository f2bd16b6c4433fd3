//! The resource synchronizer: owns the last snapshot and keeps the render
//! adapter in step with it.

use lobbyist_protocol::{CollectionSnapshot, Username, VersionToken};
use lobbyist_view::{RenderAdapter, SessionRow, derive_rows};
use tokio::sync::watch;

/// Mirror of the server's sessions collection.
///
/// The observer task pushes into it; everybody else reads. Wrap it in an
/// `Arc<tokio::sync::Mutex<_>>` to share it between the two.
///
/// ## States
///
/// ```text
///            on_change                on_unreachable
/// [empty] ─────────────→ [online] ─────────────────→ [offline]
///                           ↑                            │
///                           └──────── on_change ─────────┘
/// ```
///
/// Going offline keeps the last snapshot and rows; only the flag changes.
pub struct Synchronizer<R: RenderAdapter> {
    snapshot: CollectionSnapshot,
    viewer: Username,
    rows: Vec<SessionRow>,
    offline: bool,
    renderer: R,

    /// Bumped after every render so callers can wait for the table to
    /// change without polling the lock.
    generation: watch::Sender<u64>,
}

impl<R: RenderAdapter> Synchronizer<R> {
    pub fn new(renderer: R) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            snapshot: CollectionSnapshot::default(),
            viewer: Username::default(),
            rows: Vec::new(),
            offline: false,
            renderer,
            generation,
        }
    }

    /// Accepts a snapshot delivered by the long-poll.
    ///
    /// Replaces the stored snapshot wholesale, clears the offline flag,
    /// and re-renders the table for `viewer`. A delivery with the version
    /// already held (and an unchanged viewer) only clears the offline
    /// flag. Returns `true` if the table was re-rendered.
    pub fn on_change(&mut self, snapshot: CollectionSnapshot, viewer: Username) -> bool {
        self.go_online();

        let same_version =
            !snapshot.version().is_initial() && snapshot.version() == self.snapshot.version();
        if same_version && viewer == self.viewer {
            tracing::debug!(version = %snapshot.version(), "snapshot unchanged, skipping render");
            return false;
        }

        tracing::debug!(
            version = %snapshot.version(),
            sessions = snapshot.len(),
            %viewer,
            "sessions changed"
        );
        self.snapshot = snapshot;
        self.viewer = viewer;
        self.recompute();
        true
    }

    /// Records that the service could not be reached. Keeps the last good
    /// snapshot on display; retrying is the observer's business.
    pub fn on_unreachable(&mut self) {
        if !self.offline {
            tracing::warn!(version = %self.snapshot.version(), "lobby service unreachable, marking offline");
            self.offline = true;
            self.renderer.set_offline(true);
        }
    }

    fn go_online(&mut self) {
        if self.offline {
            tracing::info!("lobby service reachable again");
            self.offline = false;
            self.renderer.set_offline(false);
        }
    }

    fn recompute(&mut self) {
        self.rows = derive_rows(&self.snapshot, &self.viewer);
        self.renderer.render(&self.rows);
        self.generation.send_modify(|g| *g += 1);
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> &CollectionSnapshot {
        &self.snapshot
    }

    /// The version to send on the next long-poll.
    pub fn version(&self) -> &VersionToken {
        self.snapshot.version()
    }

    pub fn is_offline(&self) -> bool {
        self.offline
    }

    /// The table as last rendered.
    pub fn rows(&self) -> &[SessionRow] {
        &self.rows
    }

    pub fn viewer(&self) -> &Username {
        &self.viewer
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Number of renders so far.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Subscribes to render notifications. The value is the render count.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }
}
