//! Leaderboard aggregation over cumulative totals.

use crate::logic::match_store::PlayerTotals;
use crate::logic::registry::PlayerRegistry;
use crate::models::{Mode, ModeTotals, PlayerId, RankingEntry};
use serde::{Deserialize, Serialize};

/// One ranked row. `total` is the all-mode sum, or a single bucket when a
/// mode filter is applied.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub player: PlayerId,
    pub total: i32,
    #[serde(flatten)]
    pub totals: ModeTotals,
}

impl From<&LeaderboardEntry> for RankingEntry {
    fn from(e: &LeaderboardEntry) -> Self {
        RankingEntry {
            player: e.player.clone(),
            total: e.total,
        }
    }
}

/// Filters applied on top of the raw totals.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize)]
pub struct LeaderboardQuery {
    /// Drop players whose registry record is not main (unknown ids are dropped too).
    #[serde(default)]
    pub exclude_casual_players: bool,
    /// Rank by this mode's bucket only.
    #[serde(default)]
    pub mode_filter: Option<Mode>,
    /// Keep only these players (tournament subset).
    #[serde(default)]
    pub players: Option<Vec<PlayerId>>,
}

/// Rank totals under `query`, using the registry to tell main players apart.
pub fn build_leaderboard(
    stats: &[PlayerTotals],
    registry: &PlayerRegistry,
    query: &LeaderboardQuery,
) -> Vec<LeaderboardEntry> {
    rank(stats, query, |id| registry.is_main(id))
}

/// Filter, score and sort descending. The sort is stable, so equal totals keep
/// the order in which players first appeared in `stats`.
pub fn rank(
    stats: &[PlayerTotals],
    query: &LeaderboardQuery,
    is_main: impl Fn(&str) -> bool,
) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = stats
        .iter()
        .filter(|s| !query.exclude_casual_players || is_main(s.player.as_str()))
        .filter(|s| {
            query
                .players
                .as_ref()
                .is_none_or(|subset| subset.contains(&s.player))
        })
        .map(|s| LeaderboardEntry {
            player: s.player.clone(),
            total: match query.mode_filter {
                Some(mode) => s.totals.get(mode),
                None => s.totals.total(),
            },
            totals: s.totals,
        })
        .collect();
    entries.sort_by(|a, b| b.total.cmp(&a.total));
    entries
}

/// Leaderboard rendered as CSV: player, total, then one column per mode.
pub fn leaderboard_csv(entries: &[LeaderboardEntry]) -> Result<String, csv::Error> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    let mut header = vec!["rank", "player", "total"];
    header.extend(Mode::ALL.iter().map(|m| m.as_str()));
    wtr.write_record(&header)?;
    for (i, e) in entries.iter().enumerate() {
        let mut row = vec![(i + 1).to_string(), e.player.clone(), e.total.to_string()];
        row.extend(Mode::ALL.iter().map(|m| e.totals.get(*m).to_string()));
        wtr.write_record(&row)?;
    }
    let bytes = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
