//! Game modes, match records and their per-mode payloads, and point buckets.

use crate::models::player::PlayerId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique, creation-ordered match identifier (millisecond timestamp, bumped on collision).
pub type MatchId = i64;

/// Game mode. Also names the point bucket a match scores into.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum Mode {
    #[serde(rename = "1v1")]
    OneVOne,
    #[serde(rename = "ffa")]
    Ffa,
    #[serde(rename = "team_ff")]
    TeamFf,
    #[serde(rename = "team_noff")]
    TeamNoff,
    #[serde(rename = "casual")]
    Casual,
}

impl Mode {
    pub const ALL: [Mode; 5] = [
        Mode::OneVOne,
        Mode::Ffa,
        Mode::TeamFf,
        Mode::TeamNoff,
        Mode::Casual,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::OneVOne => "1v1",
            Mode::Ffa => "ffa",
            Mode::TeamFf => "team_ff",
            Mode::TeamNoff => "team_noff",
            Mode::Casual => "casual",
        }
    }

    /// 2v2 modes (friendly fire on / off).
    pub fn is_team(self) -> bool {
        matches!(self, Mode::TeamFf | Mode::TeamNoff)
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mode::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| format!("unknown mode '{}'", s))
    }
}

/// Which side of a two-sided match won.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    #[default]
    One,
    Two,
}

/// Winning side in the casual VIP mode.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasualSide {
    Protectors,
    Hunters,
}

/// Role of a participant in a casual match.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CasualRole {
    Vip,
    Protector,
    Hunter,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OneVOneMatch {
    pub player1: PlayerId,
    pub player2: PlayerId,
    pub winner: PlayerId,
    pub loser: PlayerId,
    pub win_points: i32,
    pub lose_points: i32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FfaResult {
    pub player: PlayerId,
    /// Finishing position, 1-4.
    pub position: u8,
    pub points: i32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FfaMatch {
    pub results: Vec<FfaResult>,
}

/// 2v2 match, shared by the friendly-fire and no-friendly-fire modes.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMatch {
    pub team1: Vec<PlayerId>,
    pub team2: Vec<PlayerId>,
    /// The winning team's player list.
    pub winners: Vec<PlayerId>,
    pub losers: Vec<PlayerId>,
    pub win_points: i32,
    pub lose_points: i32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CasualResult {
    pub player: PlayerId,
    pub points: i32,
    pub role: CasualRole,
    pub win: bool,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CasualMatch {
    pub vip: PlayerId,
    pub protectors: Vec<PlayerId>,
    pub hunters: Vec<PlayerId>,
    pub winner: CasualSide,
    pub friendly_fire: bool,
    pub results: Vec<CasualResult>,
}

/// Mode-specific part of a match, tagged by `type`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MatchPayload {
    #[serde(rename = "1v1")]
    OneVOne(OneVOneMatch),
    #[serde(rename = "ffa")]
    Ffa(FfaMatch),
    #[serde(rename = "team_ff")]
    TeamFf(TeamMatch),
    #[serde(rename = "team_noff")]
    TeamNoff(TeamMatch),
    #[serde(rename = "casual")]
    Casual(CasualMatch),
}

impl MatchPayload {
    pub fn mode(&self) -> Mode {
        match self {
            MatchPayload::OneVOne(_) => Mode::OneVOne,
            MatchPayload::Ffa(_) => Mode::Ffa,
            MatchPayload::TeamFf(_) => Mode::TeamFf,
            MatchPayload::TeamNoff(_) => Mode::TeamNoff,
            MatchPayload::Casual(_) => Mode::Casual,
        }
    }

    /// Points this match adds to each player, all in the bucket of `mode()`.
    pub fn point_deltas(&self) -> Vec<(PlayerId, i32)> {
        match self {
            MatchPayload::OneVOne(m) => vec![
                (m.winner.clone(), m.win_points),
                (m.loser.clone(), m.lose_points),
            ],
            MatchPayload::Ffa(m) => m
                .results
                .iter()
                .map(|r| (r.player.clone(), r.points))
                .collect(),
            MatchPayload::TeamFf(m) | MatchPayload::TeamNoff(m) => m
                .winners
                .iter()
                .map(|p| (p.clone(), m.win_points))
                .chain(m.losers.iter().map(|p| (p.clone(), m.lose_points)))
                .collect(),
            MatchPayload::Casual(m) => m
                .results
                .iter()
                .map(|r| (r.player.clone(), r.points))
                .collect(),
        }
    }

    /// Every player taking part, in payload order.
    pub fn participants(&self) -> Vec<PlayerId> {
        match self {
            MatchPayload::OneVOne(m) => vec![m.player1.clone(), m.player2.clone()],
            MatchPayload::Ffa(m) => m.results.iter().map(|r| r.player.clone()).collect(),
            MatchPayload::TeamFf(m) | MatchPayload::TeamNoff(m) => {
                m.team1.iter().chain(m.team2.iter()).cloned().collect()
            }
            MatchPayload::Casual(m) => std::iter::once(m.vip.clone())
                .chain(m.protectors.iter().cloned())
                .chain(m.hunters.iter().cloned())
                .collect(),
        }
    }
}

/// A recorded match.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: MatchId,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub payload: MatchPayload,
}

impl Match {
    pub fn mode(&self) -> Mode {
        self.payload.mode()
    }
}

/// Cumulative points per mode for one player.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ModeTotals {
    #[serde(default)]
    pub ffa: i32,
    #[serde(default)]
    pub team_ff: i32,
    #[serde(default)]
    pub team_noff: i32,
    #[serde(default)]
    pub casual: i32,
    #[serde(rename = "1v1", default)]
    pub one_v_one: i32,
}

impl ModeTotals {
    pub fn get(&self, mode: Mode) -> i32 {
        match mode {
            Mode::OneVOne => self.one_v_one,
            Mode::Ffa => self.ffa,
            Mode::TeamFf => self.team_ff,
            Mode::TeamNoff => self.team_noff,
            Mode::Casual => self.casual,
        }
    }

    pub fn add(&mut self, mode: Mode, delta: i32) {
        let bucket = match mode {
            Mode::OneVOne => &mut self.one_v_one,
            Mode::Ffa => &mut self.ffa,
            Mode::TeamFf => &mut self.team_ff,
            Mode::TeamNoff => &mut self.team_noff,
            Mode::Casual => &mut self.casual,
        };
        *bucket = bucket.saturating_add(delta);
    }

    /// Sum of every bucket, 1v1 included. Saturates rather than wrapping.
    pub fn total(&self) -> i32 {
        [self.ffa, self.team_ff, self.team_noff, self.casual, self.one_v_one]
            .into_iter()
            .fold(0i32, i32::saturating_add)
    }
}
