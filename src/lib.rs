//! Smash night scoreboard: library with models, scoring logic, and persistence.

pub mod events;
pub mod logic;
pub mod models;
pub mod scoreboard;
pub mod storage;

pub use events::{ChangeEvent, SubscriptionId};
pub use logic::{
    is_complete, unplayed, CasualRotation, LeaderboardEntry, LeaderboardQuery, MatchStore, Pairing,
    PlayerRegistry, PlayerTotals, TeamRotation,
};
pub use models::{
    CasualSide, Match, MatchConfig, MatchId, MatchPayload, MatchTarget, Mode, ModeTotals,
    NewPlayer, Player, PlayerId, PlayerUpdate, PointsConfig, ScoreError, Settings, Team,
    Tournament, TournamentConfig, TournamentHistoryEntry, TournamentId,
};
pub use scoreboard::{ModeProgress, Scoreboard};
pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError};
