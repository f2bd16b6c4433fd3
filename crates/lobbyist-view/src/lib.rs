//! Session view model for Lobbyist.
//!
//! Turns a [`CollectionSnapshot`](lobbyist_protocol::CollectionSnapshot)
//! and the viewer's name into a declarative table: one [`SessionRow`] per
//! session, each carrying the [`ActionControl`]s the viewer may use.
//!
//! # Key types
//!
//! - [`Role`] / [`Phase`] — how the viewer relates to a session, and
//!   whether it has been launched
//! - [`Action`] / [`ActionControl`] — what can be done, and whether it is
//!   enabled right now
//! - [`SessionRow`] — one display row
//! - [`RenderAdapter`] — the seam a UI implements to show rows
//!
//! # The action table
//!
//! ```text
//! Phase     Role          Controls
//! ───────── ───────────── ─────────────────────────────────────────────
//! Forming   Outsider      Join    (disabled if full or active elsewhere)
//! Forming   Participant   Leave
//! Forming   Creator       Delete, Launch (disabled below min players)
//! Running   in players    Play
//! Running   not a player  Watch
//! ```
//!
//! All derivation functions are pure: no I/O, no caching, no hidden
//! state. The caller owns the snapshot and decides when to recompute.
//!
//! # Feature Flags
//!
//! - `testing` — [`testing::RecordingRenderer`], a render adapter that
//!   records every call

mod model;
mod present;
mod render;
mod state;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use model::{
    action_set, actions_for, derive_row, derive_rows, game_location,
    is_active_anywhere,
};
pub use present::{capitalize_first, fill_indicator, player_interval};
pub use render::{RenderAdapter, SessionRow, TextRenderer};
pub use state::{Action, ActionControl, Phase, Role};
