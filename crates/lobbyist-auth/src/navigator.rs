//! Navigation seam: what the auth layer asks the surrounding UI to do.

use std::fmt;

/// Where the user can be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Landing {
    /// The login page.
    Entry,
    /// The session lobby, for regular players.
    Lobby,
    /// The administration page, for everyone else.
    Admin,
}

impl fmt::Display for Landing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Entry => write!(f, "entry"),
            Self::Lobby => write!(f, "lobby"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// Implemented by whatever hosts the client (a browser shell, a
/// terminal UI, a test).
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because the guard that owns the navigator is
/// shared across the observer task and user-triggered dispatches.
pub trait Navigator: Send + Sync + 'static {
    /// Discards the current view and starts over. Called once when the
    /// session's authorization is lost.
    fn reload(&self);

    /// Sends the user to another page.
    fn redirect(&self, landing: Landing);
}

#[cfg(any(test, feature = "testing"))]
pub mod testing {
    use std::sync::{Arc, Mutex};

    use super::{Landing, Navigator};

    /// What a [`RecordingNavigator`] was asked to do, in order.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum NavEvent {
        Reload,
        Redirect(Landing),
    }

    /// Records every navigation. Clones share the record.
    #[derive(Debug, Default, Clone)]
    pub struct RecordingNavigator {
        events: Arc<Mutex<Vec<NavEvent>>>,
    }

    impl RecordingNavigator {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn events(&self) -> Vec<NavEvent> {
            self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
        }

        pub fn reloads(&self) -> usize {
            self.events()
                .iter()
                .filter(|e| **e == NavEvent::Reload)
                .count()
        }

        fn push(&self, event: NavEvent) {
            self.events
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .push(event);
        }
    }

    impl Navigator for RecordingNavigator {
        fn reload(&self) {
            self.push(NavEvent::Reload);
        }

        fn redirect(&self, landing: Landing) {
            self.push(NavEvent::Redirect(landing));
        }
    }
}
