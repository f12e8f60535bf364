//! Tournament lifecycle: start (with season reset), end (archive), cancel.

use crate::logic::leaderboard::{rank, LeaderboardQuery};
use crate::logic::match_store::MatchStore;
use crate::models::{
    PlayerId, RankingEntry, ScoreError, Tournament, TournamentConfig, TournamentHistoryEntry,
};
use chrono::Utc;
use uuid::Uuid;

/// Start a tournament: validate the config, reset the season for `roster`,
/// then activate. Nothing changes if validation fails.
pub fn start_tournament(
    tournament: &mut Tournament,
    store: &mut MatchStore,
    roster: &[PlayerId],
    config: TournamentConfig,
) -> Result<(), ScoreError> {
    if config.players.is_empty() {
        return Err(ScoreError::InvalidConfig("a tournament needs at least one player".into()));
    }
    if config.modes.is_empty() {
        return Err(ScoreError::InvalidConfig("a tournament needs at least one mode".into()));
    }
    if let Some(unknown) = config.players.iter().find(|p| !roster.contains(p)) {
        return Err(ScoreError::NotFound(format!("player '{}'", unknown)));
    }

    let mut players: Vec<PlayerId> = Vec::new();
    for p in config.players {
        if !players.contains(&p) {
            players.push(p);
        }
    }
    let mut modes = Vec::new();
    for m in config.modes {
        if !modes.contains(&m) {
            modes.push(m);
        }
    }

    store.reset_season(roster);
    *tournament = Tournament {
        active: true,
        name: config.name,
        players,
        modes,
        started_at: Some(Utc::now()),
        ended_at: None,
    };
    log::info!(
        "Tournament '{}' started with {} players",
        tournament.name,
        tournament.players.len()
    );
    Ok(())
}

/// End the active tournament and return its archived snapshot. The ranking is
/// the leaderboard restricted to the tournament's players. No-op (None) when
/// no tournament is active.
pub fn end_tournament(
    tournament: &mut Tournament,
    store: &MatchStore,
) -> Option<TournamentHistoryEntry> {
    if !tournament.active {
        return None;
    }
    let query = LeaderboardQuery {
        players: Some(tournament.players.clone()),
        ..LeaderboardQuery::default()
    };
    let ranking: Vec<RankingEntry> = rank(store.stats(), &query, |_| true)
        .iter()
        .map(RankingEntry::from)
        .collect();
    let ended_at = Utc::now();
    let entry = TournamentHistoryEntry {
        id: Uuid::new_v4(),
        name: tournament.name.clone(),
        started_at: tournament.started_at,
        ended_at,
        winner: ranking.first().map(|r| r.player.clone()),
        ranking,
        players: tournament.players.clone(),
        modes: tournament.modes.clone(),
        match_count: store.matches().len(),
    };
    tournament.active = false;
    tournament.ended_at = Some(ended_at);
    log::info!(
        "Tournament '{}' ended, winner: {}",
        entry.name,
        entry.winner.as_deref().unwrap_or("none")
    );
    Some(entry)
}

/// Drop the active tournament without archiving, or clear an ended one so the
/// leaderboard stops filtering by its players. Recorded matches stand.
/// Returns false when there was nothing to clear.
pub fn cancel_tournament(tournament: &mut Tournament) -> bool {
    if !tournament.active && tournament.ended_at.is_none() {
        return false;
    }
    log::info!("Tournament '{}' cancelled", tournament.name);
    *tournament = Tournament::default();
    true
}
