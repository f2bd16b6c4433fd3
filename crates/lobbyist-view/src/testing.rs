//! Recording [`RenderAdapter`] for tests.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::{RenderAdapter, SessionRow};

/// What a [`RecordingRenderer`] has been told so far.
#[derive(Debug, Default, Clone)]
pub struct Recorded {
    /// Every table handed to `render`, oldest first.
    pub renders: Vec<Vec<SessionRow>>,
    /// Every `set_offline` call, oldest first.
    pub offline: Vec<bool>,
}

/// Keeps every render call. Clones share the same record, so a test can
/// hand one clone to the synchronizer and inspect the other.
#[derive(Debug, Default, Clone)]
pub struct RecordingRenderer {
    inner: Arc<Mutex<Recorded>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a copy of everything recorded.
    pub fn recorded(&self) -> Recorded {
        self.lock().clone()
    }

    /// Number of `render` calls.
    pub fn render_count(&self) -> usize {
        self.lock().renders.len()
    }

    /// The most recent table, if any.
    pub fn last(&self) -> Option<Vec<SessionRow>> {
        self.lock().renders.last().cloned()
    }
}

impl RenderAdapter for RecordingRenderer {
    fn render(&mut self, rows: &[SessionRow]) {
        self.lock().renders.push(rows.to_vec());
    }

    fn set_offline(&mut self, offline: bool) {
        self.lock().offline.push(offline);
    }
}
