//! Scoreboard business logic: registry, match store, rotations, leaderboard, tournaments.

mod leaderboard;
mod match_store;
mod registry;
mod rotation;
pub mod scoring;
mod tournament;

pub use leaderboard::{build_leaderboard, leaderboard_csv, rank, LeaderboardEntry, LeaderboardQuery};
pub use match_store::{MatchStore, PlayerTotals};
pub use registry::PlayerRegistry;
pub use rotation::{
    casual_rotations, is_complete, one_v_one_rotations, team_rotations, unplayed, CasualRotation,
    Pairing, Rotation, TeamRotation,
};
pub use tournament::{cancel_tournament, end_tournament, start_tournament};
