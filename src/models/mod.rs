//! Data structures for the scoreboard: players, matches, settings, tournaments.

mod config;
mod error;
mod game;
mod player;
mod tournament;

pub use config::{
    CasualPoints, FfaPoints, MatchConfig, MatchTarget, PointsConfig, Settings, WinLosePoints,
    MAX_POINTS,
};
pub use error::ScoreError;
pub use game::{
    CasualMatch, CasualResult, CasualRole, CasualSide, FfaMatch, FfaResult, Match, MatchId,
    MatchPayload, Mode, ModeTotals, OneVOneMatch, Team, TeamMatch,
};
pub use player::{
    default_roster, derive_id, derive_initial, NewPlayer, Player, PlayerId, PlayerUpdate,
    DEFAULT_ROSTER, PALETTE,
};
pub use tournament::{
    RankingEntry, Tournament, TournamentConfig, TournamentHistoryEntry, TournamentId,
};
