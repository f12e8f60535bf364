//! Tournament state, start config, and archived history entries.

use crate::models::game::Mode;
use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for an archived tournament.
pub type TournamentId = Uuid;

/// Input for starting a tournament.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct TournamentConfig {
    #[serde(default)]
    pub name: String,
    pub players: Vec<PlayerId>,
    /// Enabled modes, in play order.
    pub modes: Vec<Mode>,
}

/// The current tournament. Inactive by default; while inactive every player
/// and mode is in scope.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub active: bool,
    pub name: String,
    pub players: Vec<PlayerId>,
    pub modes: Vec<Mode>,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl Tournament {
    pub fn is_player_in_scope(&self, id: &str) -> bool {
        !self.active || self.players.iter().any(|p| p == id)
    }

    pub fn is_mode_in_scope(&self, mode: Mode) -> bool {
        !self.active || self.modes.contains(&mode)
    }

    /// Player subset to filter leaderboards by: set while a tournament runs
    /// and kept after it ends, until the next start or a cancel clears it.
    pub fn player_subset(&self) -> Option<&[PlayerId]> {
        (self.active || self.ended_at.is_some()).then_some(self.players.as_slice())
    }

    /// Mode following `current` in the enabled list; None at the end or when inactive.
    pub fn next_mode(&self, current: Mode) -> Option<Mode> {
        if !self.active {
            return None;
        }
        let idx = self.modes.iter().position(|m| *m == current)?;
        self.modes.get(idx + 1).copied()
    }
}

/// One row of an archived ranking.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub player: PlayerId,
    pub total: i32,
}

/// Immutable snapshot written when a tournament ends.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentHistoryEntry {
    pub id: TournamentId,
    pub name: String,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: DateTime<Utc>,
    /// Top of the final ranking; None when nobody was ranked.
    pub winner: Option<PlayerId>,
    pub ranking: Vec<RankingEntry>,
    pub players: Vec<PlayerId>,
    pub modes: Vec<Mode>,
    pub match_count: usize,
}
