//! Resource synchronization for Lobbyist.
//!
//! Keeps a local copy of the server's sessions collection current and
//! pushes every change through the view model to a render adapter.
//!
//! # Key types
//!
//! - [`Synchronizer`] — holds the last snapshot, the derived rows and the
//!   offline flag
//! - [`observe`] / [`spawn_observer`] — the long-poll loop feeding it
//! - [`ObserverConfig`] — retry delay and jitter for that loop
//!
//! # How it fits in the stack
//!
//! ```text
//! Transport (poll_sessions) → observe → Synchronizer → derive_rows → RenderAdapter
//!                                ↑
//!                        AuthGuard (viewer)
//! ```

mod observer;
mod synchronizer;

pub use observer::{ObserverConfig, observe, spawn_observer};
pub use synchronizer::Synchronizer;
