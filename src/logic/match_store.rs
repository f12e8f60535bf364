//! Match store: chronological match log plus running per-player point totals.

use crate::logic::leaderboard::{rank, LeaderboardEntry, LeaderboardQuery};
use crate::models::{Match, MatchId, MatchPayload, Mode, ModeTotals, PlayerId, ScoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Running totals for one player. Order of first appearance is kept and
/// used as the leaderboard tie-break.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PlayerTotals {
    pub player: PlayerId,
    #[serde(flatten)]
    pub totals: ModeTotals,
}

/// Append-only (with undo) match log. Totals are maintained incrementally and
/// always equal the sum of every logged match's point deltas.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct MatchStore {
    matches: Vec<Match>,
    stats: Vec<PlayerTotals>,
}

impl MatchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore from persisted parts. Stats are taken as stored.
    pub fn from_parts(matches: Vec<Match>, stats: Vec<PlayerTotals>) -> Self {
        Self { matches, stats }
    }

    /// Rebuild totals by replaying `matches` in order. `order` seeds the stats
    /// list with zeroed entries so tie order survives; anyone else is appended
    /// when they first score.
    pub fn replay(matches: Vec<Match>, order: &[PlayerId]) -> Self {
        let mut store = Self::new();
        store.reset_season(order);
        for m in &matches {
            store.apply(&m.payload, 1);
        }
        store.matches = matches;
        store
    }

    /// Matches in chronological order.
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    pub fn stats(&self) -> &[PlayerTotals] {
        &self.stats
    }

    pub fn totals_for(&self, player: &str) -> ModeTotals {
        self.stats
            .iter()
            .find(|s| s.player == player)
            .map(|s| s.totals)
            .unwrap_or_default()
    }

    /// Append a match stamped now, applying its points.
    pub fn add_match(&mut self, payload: MatchPayload) -> Match {
        self.add_match_at(payload, Utc::now())
    }

    /// Append a match with an explicit timestamp. The id is the millisecond
    /// timestamp, bumped past the previous id so ids stay strictly increasing.
    pub fn add_match_at(&mut self, payload: MatchPayload, timestamp: DateTime<Utc>) -> Match {
        let last_id = self.matches.last().map(|m| m.id).unwrap_or(MatchId::MIN);
        let id = timestamp.timestamp_millis().max(last_id.saturating_add(1));
        let record = Match {
            id,
            timestamp,
            payload,
        };
        self.apply(&record.payload, 1);
        self.matches.push(record.clone());
        log::debug!("Recorded {} match {}", record.mode(), record.id);
        record
    }

    /// Remove the most recent match and reverse its points. None when the log is empty.
    pub fn undo_last_match(&mut self) -> Option<Match> {
        let record = self.matches.pop()?;
        self.apply(&record.payload, -1);
        log::debug!("Undid {} match {}", record.mode(), record.id);
        Some(record)
    }

    /// Remove a specific match by id and reverse its points.
    pub fn remove_match(&mut self, id: MatchId) -> Result<Match, ScoreError> {
        let idx = self
            .matches
            .iter()
            .position(|m| m.id == id)
            .ok_or_else(|| ScoreError::NotFound(format!("match {}", id)))?;
        let record = self.matches.remove(idx);
        self.apply(&record.payload, -1);
        Ok(record)
    }

    /// Matches of one mode, most recent first.
    pub fn matches_by_type(&self, mode: Mode) -> Vec<&Match> {
        self.matches
            .iter()
            .rev()
            .filter(|m| m.mode() == mode)
            .collect()
    }

    /// Unfiltered ranking over every player with totals.
    pub fn leaderboard(&self) -> Vec<LeaderboardEntry> {
        rank(&self.stats, &LeaderboardQuery::default(), |_| true)
    }

    /// Clear the log and zero totals for `roster` (and nobody else).
    pub fn reset_season(&mut self, roster: &[PlayerId]) {
        self.matches.clear();
        self.stats = roster
            .iter()
            .map(|id| PlayerTotals {
                player: id.clone(),
                totals: ModeTotals::default(),
            })
            .collect();
    }

    fn apply(&mut self, payload: &MatchPayload, sign: i32) {
        let mode = payload.mode();
        for (player, points) in payload.point_deltas() {
            let idx = match self.stats.iter().position(|s| s.player == player) {
                Some(idx) => idx,
                None => {
                    self.stats.push(PlayerTotals {
                        player,
                        totals: ModeTotals::default(),
                    });
                    self.stats.len() - 1
                }
            };
            self.stats[idx].totals.add(mode, points.saturating_mul(sign));
        }
    }
}
