//! Derivation of rows and action sets from a snapshot.
//!
//! Everything in here is a pure function of `(snapshot, viewer)`: the same
//! inputs always produce the same rows, and nothing is cached between
//! calls. The synchronizer recomputes the whole table on every push.

use lobbyist_protocol::{CollectionSnapshot, Session, SessionId, Username};

use crate::present::{capitalize_first, fill_indicator};
use crate::render::SessionRow;
use crate::{Action, ActionControl, Phase, Role};

/// Path appended to a game's location to reach one running session.
const GAME_PATH: &str = "webui/games";

/// Returns `true` if the viewer is a player of any session in the
/// snapshot, forming or running.
///
/// This is the "one session at a time" rule: while it holds, every other
/// forming session shows Join disabled.
pub fn is_active_anywhere(
    snapshot: &CollectionSnapshot,
    viewer: &Username,
) -> bool {
    snapshot
        .iter()
        .any(|(_, session)| Role::of(session, viewer).is_member())
}

/// Computes the controls for one session.
///
/// `active_elsewhere` is [`is_active_anywhere`] evaluated over the whole
/// snapshot. It only matters for outsiders, who by definition are not a
/// player of *this* session, so "anywhere" and "elsewhere" coincide.
pub fn actions_for(
    id: &SessionId,
    session: &Session,
    viewer: &Username,
    active_elsewhere: bool,
) -> Vec<ActionControl> {
    let control = |action, enabled| ActionControl {
        session_id: id.clone(),
        action,
        enabled,
    };

    match (Phase::of(session), Role::of(session, viewer)) {
        (Phase::Forming, Role::Outsider) => {
            vec![control(Action::Join, !session.is_full() && !active_elsewhere)]
        }
        (Phase::Forming, Role::Participant) => vec![control(Action::Leave, true)],
        (Phase::Forming, Role::Creator) => vec![
            control(Action::Delete, true),
            control(Action::Launch, session.has_quorum()),
        ],
        (Phase::Running, Role::Outsider) => vec![control(Action::Watch, true)],
        (Phase::Running, _) => vec![control(Action::Play, true)],
    }
}

/// Builds one display row.
pub fn derive_row(
    id: &SessionId,
    session: &Session,
    viewer: &Username,
    active_elsewhere: bool,
) -> SessionRow {
    SessionRow {
        session_id: id.clone(),
        game: session.game_parameters.label().to_string(),
        creator: capitalize_first(session.creator.as_str()),
        fill: fill_indicator(session),
        role: Role::of(session, viewer),
        phase: Phase::of(session),
        controls: actions_for(id, session, viewer, active_elsewhere),
    }
}

/// Builds the full table for `viewer`, one row per session in id order.
pub fn derive_rows(
    snapshot: &CollectionSnapshot,
    viewer: &Username,
) -> Vec<SessionRow> {
    let active = is_active_anywhere(snapshot, viewer);
    snapshot
        .iter()
        .map(|(id, session)| derive_row(id, session, viewer, active))
        .collect()
}

/// Flattens the table into the action set: every control of every row.
pub fn action_set(
    snapshot: &CollectionSnapshot,
    viewer: &Username,
) -> Vec<ActionControl> {
    derive_rows(snapshot, viewer)
        .into_iter()
        .flat_map(|row| row.controls)
        .collect()
}

/// Resolves where Play/Watch lead for a session:
/// `<location>/webui/games/<id>`.
///
/// Returns `None` if the session is not in the snapshot.
pub fn game_location(
    snapshot: &CollectionSnapshot,
    id: &SessionId,
) -> Option<String> {
    let session = snapshot.get(id)?;
    Some(format!(
        "{}/{GAME_PATH}/{id}",
        session.game_parameters.location.trim_end_matches('/')
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lobbyist_protocol::{GameParameters, VersionToken};
    use std::collections::BTreeMap;

    fn user(name: &str) -> Username {
        Username::new(name)
    }

    fn session(creator: &str, players: &[&str], launched: bool) -> Session {
        Session {
            creator: user(creator),
            game_parameters: GameParameters {
                name: "Splendor".into(),
                display_name: None,
                location: "http://127.0.0.1:4243/".into(),
                min_session_players: 2,
                max_session_players: 3,
                web_support: true,
            },
            launched,
            players: players.iter().map(|p| user(p)).collect(),
            savegame_id: String::new(),
        }
    }

    fn snapshot(sessions: Vec<(&str, Session)>) -> CollectionSnapshot {
        let map: BTreeMap<_, _> = sessions
            .into_iter()
            .map(|(id, s)| (SessionId::from(id), s))
            .collect();
        CollectionSnapshot::new(map, VersionToken::of(b"test"))
    }

    #[test]
    fn test_actions_for_forming_outsider_full_join_disabled() {
        let s = session("alice", &["alice", "bob", "carol"], false);
        let controls = actions_for(&SessionId::from("1"), &s, &user("dave"), false);
        assert_eq!(controls.len(), 1);
        assert_eq!(controls[0].action, Action::Join);
        assert!(!controls[0].enabled);
    }

    #[test]
    fn test_actions_for_forming_outsider_active_elsewhere_join_disabled() {
        let s = session("alice", &["alice"], false);
        let controls = actions_for(&SessionId::from("1"), &s, &user("bob"), true);
        assert_eq!(controls[0].action, Action::Join);
        assert!(!controls[0].enabled);
    }

    #[test]
    fn test_actions_for_participant_leave_enabled() {
        let s = session("alice", &["alice", "bob"], false);
        let controls = actions_for(&SessionId::from("1"), &s, &user("bob"), true);
        assert_eq!(
            controls,
            vec![ActionControl {
                session_id: SessionId::from("1"),
                action: Action::Leave,
                enabled: true,
            }]
        );
    }

    #[test]
    fn test_actions_for_creator_with_quorum_launch_enabled() {
        let s = session("alice", &["alice", "bob"], false);
        let controls = actions_for(&SessionId::from("1"), &s, &user("alice"), true);
        let launch = controls.iter().find(|c| c.action == Action::Launch).unwrap();
        assert!(launch.enabled);
    }

    #[test]
    fn test_actions_for_running_creator_plays() {
        let s = session("alice", &["alice", "bob"], true);
        let controls = actions_for(&SessionId::from("1"), &s, &user("alice"), true);
        assert_eq!(controls[0].action, Action::Play);
    }

    #[test]
    fn test_is_active_anywhere_counts_running_sessions() {
        let snap = snapshot(vec![("1", session("alice", &["alice", "bob"], true))]);
        assert!(is_active_anywhere(&snap, &user("bob")));
        assert!(!is_active_anywhere(&snap, &user("carol")));
    }

    #[test]
    fn test_derive_rows_orders_by_session_id() {
        let snap = snapshot(vec![
            ("b", session("bob", &["bob"], false)),
            ("a", session("alice", &["alice"], false)),
        ]);
        let rows = derive_rows(&snap, &user("carol"));
        let ids: Vec<_> = rows.iter().map(|r| r.session_id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn test_derive_row_capitalizes_creator() {
        let snap = snapshot(vec![("1", session("alice", &["alice", "bob"], false))]);
        let rows = derive_rows(&snap, &user("bob"));
        assert_eq!(rows[0].creator, "Alice");
        assert_eq!(rows[0].fill, "[2/2-3]: Alice, Bob");
        assert_eq!(rows[0].game, "Splendor");
    }

    #[test]
    fn test_game_location_joins_location_and_id() {
        let snap = snapshot(vec![("42", session("alice", &["alice"], true))]);
        assert_eq!(
            game_location(&snap, &SessionId::from("42")).as_deref(),
            Some("http://127.0.0.1:4243/webui/games/42")
        );
        assert_eq!(game_location(&snap, &SessionId::from("7")), None);
    }
}
