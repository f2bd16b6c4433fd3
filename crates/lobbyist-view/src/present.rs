//! Text helpers for the fill column.

use lobbyist_protocol::{GameParameters, Session};

/// Upper-cases the first character and leaves the rest alone.
pub fn capitalize_first(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `"2-4"` for a range of allowed player counts, `"2"` when min and max
/// coincide.
pub fn player_interval(params: &GameParameters) -> String {
    let (min, max) = (params.min_session_players, params.max_session_players);
    if min == max {
        min.to_string()
    } else {
        format!("{min}-{max}")
    }
}

/// The fill indicator: `"[2/2-4]: Alice, Bob"`.
///
/// Players are listed in join order.
pub fn fill_indicator(session: &Session) -> String {
    let players = session
        .players
        .iter()
        .map(|p| capitalize_first(p.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "[{}/{}]: {}",
        session.players.len(),
        player_interval(&session.game_parameters),
        players
    )
}
