//! Round scoring. In tag, holding IT is losing: the leaderboard ranks by
//! time spent as IT and the round loser is whoever held it longest.

use serde::{Deserialize, Serialize};

use tagarena_core::player::PlayerId;

/// One leaderboard row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: PlayerId,
    pub name: String,
    /// Seconds spent as IT this round.
    pub time_as_it: f32,
    pub is_it: bool,
}

/// Sort entries for display, most time as IT first. The sort is stable, so
/// equal times keep their join order and every peer renders the same table.
pub fn sort_leaderboard(entries: &mut [ScoreEntry]) {
    entries.sort_by(|a, b| b.time_as_it.total_cmp(&a.time_as_it));
}

/// Pick the round loser from entries in join order. Only a strictly
/// greater time displaces the current pick, so ties resolve to the
/// earliest joiner on every peer.
pub fn round_loser(entries: &[ScoreEntry]) -> Option<&ScoreEntry> {
    let mut loser: Option<&ScoreEntry> = None;
    for entry in entries {
        if loser.is_none_or(|current| entry.time_as_it > current.time_as_it) {
            loser = Some(entry);
        }
    }
    loser
}
