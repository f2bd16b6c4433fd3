//! Render seam: declarative rows in, pixels (or text) out.

use std::io::Write;

use lobbyist_protocol::SessionId;
use serde::{Deserialize, Serialize};

use crate::{ActionControl, Phase, Role};

/// One line of the sessions table, ready to display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRow {
    pub session_id: SessionId,
    /// Game label (display name if the service registered one).
    pub game: String,
    /// Creator's name with its first letter upper-cased.
    pub creator: String,
    /// Fill indicator, e.g. `"[2/2-4]: Alice, Bob"`.
    pub fill: String,
    pub role: Role,
    pub phase: Phase,
    pub controls: Vec<ActionControl>,
}

impl SessionRow {
    /// Looks up the control for `action` in this row, if offered.
    pub fn control(&self, action: crate::Action) -> Option<&ActionControl> {
        self.controls.iter().find(|c| c.action == action)
    }
}

/// Something that can show the sessions table.
///
/// The synchronizer calls `render` with the complete table after every
/// change and `set_offline` whenever reachability flips. Implementations
/// replace what they show; they never patch individual rows.
pub trait RenderAdapter: Send + 'static {
    fn render(&mut self, rows: &[SessionRow]);
    fn set_offline(&mut self, offline: bool);
}

/// Writes the table as plain text, one session per line.
///
/// ```text
/// 1  Splendor  Alice  [2/2-4]: Alice, Bob  Delete (Launch)
/// ```
///
/// Disabled controls are shown in parentheses. Write failures are logged
/// and otherwise ignored: a broken terminal must not stop the observer.
pub struct TextRenderer<W: Write + Send + 'static> {
    out: W,
}

impl<W: Write + Send + 'static> TextRenderer<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Gives back the writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_rows(&mut self, rows: &[SessionRow]) -> std::io::Result<()> {
        if rows.is_empty() {
            writeln!(self.out, "(no sessions)")?;
        }
        for row in rows {
            let controls = row
                .controls
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(
                self.out,
                "{}  {}  {}  {}  {}",
                row.session_id, row.game, row.creator, row.fill, controls
            )?;
        }
        self.out.flush()
    }
}

impl<W: Write + Send + 'static> RenderAdapter for TextRenderer<W> {
    fn render(&mut self, rows: &[SessionRow]) {
        if let Err(e) = self.write_rows(rows) {
            tracing::warn!(error = %e, "failed to render sessions");
        }
    }

    fn set_offline(&mut self, offline: bool) {
        let line = if offline {
            "-- lobby service unreachable, showing last known sessions --"
        } else {
            "-- back online --"
        };
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::warn!(error = %e, "failed to render offline state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Action;

    fn row() -> SessionRow {
        SessionRow {
            session_id: SessionId::from("1"),
            game: "Splendor".into(),
            creator: "Alice".into(),
            fill: "[1/2-4]: Alice".into(),
            role: Role::Creator,
            phase: Phase::Forming,
            controls: vec![
                ActionControl {
                    session_id: SessionId::from("1"),
                    action: Action::Delete,
                    enabled: true,
                },
                ActionControl {
                    session_id: SessionId::from("1"),
                    action: Action::Launch,
                    enabled: false,
                },
            ],
        }
    }

    #[test]
    fn test_text_renderer_writes_one_line_per_row() {
        let mut renderer = TextRenderer::new(Vec::new());
        renderer.render(&[row()]);
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(text, "1  Splendor  Alice  [1/2-4]: Alice  Delete (Launch)\n");
    }

    #[test]
    fn test_text_renderer_empty_table() {
        let mut renderer = TextRenderer::new(Vec::new());
        renderer.render(&[]);
        let text = String::from_utf8(renderer.into_inner()).unwrap();
        assert_eq!(text, "(no sessions)\n");
    }

    #[test]
    fn test_session_row_control_lookup() {
        let row = row();
        assert!(row.control(Action::Delete).unwrap().enabled);
        assert!(row.control(Action::Join).is_none());
    }
}
