//! Roles, phases and actions: the vocabulary of the view model.

use std::fmt;

use lobbyist_protocol::{Session, SessionId, Username};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Role
// ---------------------------------------------------------------------------

/// How the viewer relates to one session.
///
/// Exactly one role applies, checked in this order:
///
/// ```text
/// viewer ∉ players            → Outsider
/// viewer == creator           → Creator
/// otherwise (viewer ∈ players) → Participant
/// ```
///
/// Membership is checked first, so a session whose creator has somehow
/// left the player list still classifies the creator as an outsider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Outsider,
    Creator,
    Participant,
}

impl Role {
    /// Classifies `viewer` against `session`. Total: defined for every
    /// session and every viewer.
    pub fn of(session: &Session, viewer: &Username) -> Self {
        if !session.has_player(viewer) {
            Self::Outsider
        } else if session.creator == *viewer {
            Self::Creator
        } else {
            Self::Participant
        }
    }

    /// Returns `true` for roles that count as being in the session.
    pub fn is_member(self) -> bool {
        matches!(self, Self::Creator | Self::Participant)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Outsider => write!(f, "Outsider"),
            Self::Creator => write!(f, "Creator"),
            Self::Participant => write!(f, "Participant"),
        }
    }
}

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a session is in its lifecycle. Derived from `launched`, never
/// stored.
///
/// ```text
/// Forming ──(launch)──→ Running
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Not launched yet: players may join and leave.
    Forming,
    /// Launched: the player set is frozen.
    Running,
}

impl Phase {
    pub fn of(session: &Session) -> Self {
        if session.launched {
            Self::Running
        } else {
            Self::Forming
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Forming => write!(f, "Forming"),
            Self::Running => write!(f, "Running"),
        }
    }
}

// ---------------------------------------------------------------------------
// Action
// ---------------------------------------------------------------------------

/// Something the viewer can do with a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Join,
    Leave,
    Delete,
    Launch,
    Play,
    Watch,
}

impl Action {
    /// Every action, in display order.
    pub const ALL: [Action; 6] = [
        Self::Join,
        Self::Leave,
        Self::Delete,
        Self::Launch,
        Self::Play,
        Self::Watch,
    ];

    /// Returns `true` for actions that change server state.
    pub fn is_mutating(self) -> bool {
        matches!(self, Self::Join | Self::Leave | Self::Delete | Self::Launch)
    }

    /// Parses a case-insensitive action name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|a| a.to_string().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Join => write!(f, "Join"),
            Self::Leave => write!(f, "Leave"),
            Self::Delete => write!(f, "Delete"),
            Self::Launch => write!(f, "Launch"),
            Self::Play => write!(f, "Play"),
            Self::Watch => write!(f, "Watch"),
        }
    }
}

/// One control to render: which action, on which session, and whether it
/// can be triggered right now.
///
/// A disabled control is still shown (so the viewer sees why a session
/// is not joinable) but must not be dispatched.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionControl {
    pub session_id: SessionId,
    pub action: Action,
    pub enabled: bool,
}

impl fmt::Display for ActionControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.enabled {
            write!(f, "{}", self.action)
        } else {
            write!(f, "({})", self.action)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse_is_case_insensitive() {
        assert_eq!(Action::parse("join"), Some(Action::Join));
        assert_eq!(Action::parse(" LAUNCH "), Some(Action::Launch));
        assert_eq!(Action::parse("spectate"), None);
    }

    #[test]
    fn test_action_is_mutating() {
        assert!(Action::Join.is_mutating());
        assert!(Action::Launch.is_mutating());
        assert!(!Action::Play.is_mutating());
        assert!(!Action::Watch.is_mutating());
    }

    #[test]
    fn test_action_control_display_marks_disabled() {
        let control = ActionControl {
            session_id: SessionId::from("1"),
            action: Action::Launch,
            enabled: false,
        };
        assert_eq!(control.to_string(), "(Launch)");
    }

    #[test]
    fn test_role_display() {
        assert_eq!(Role::Participant.to_string(), "Participant");
        assert_eq!(Phase::Running.to_string(), "Running");
    }
}
