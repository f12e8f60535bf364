//! Points and match-count configuration, persisted as settings.

use crate::models::error::ScoreError;
use crate::models::game::Mode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Largest points value, won or lost, a single match may award.
pub const MAX_POINTS: i32 = 1000;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct WinLosePoints {
    pub win: i32,
    pub lose: i32,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct FfaPoints {
    /// Finishing position (1-4) to points.
    pub positions: BTreeMap<u8, i32>,
}

impl FfaPoints {
    /// Points for a finishing position; unconfigured positions score nothing.
    pub fn for_position(&self, position: u8) -> i32 {
        self.positions.get(&position).copied().unwrap_or(0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct CasualPoints {
    pub vip_win: i32,
    pub vip_lose: i32,
    pub protectors_win: i32,
    pub hunters_win: i32,
}

/// Scoring table per mode.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct PointsConfig {
    #[serde(rename = "1v1")]
    pub one_v_one: WinLosePoints,
    pub ffa: FfaPoints,
    pub team_ff: WinLosePoints,
    pub team_noff: WinLosePoints,
    pub casual: CasualPoints,
}

impl Default for PointsConfig {
    fn default() -> Self {
        Self {
            one_v_one: WinLosePoints { win: 3, lose: 0 },
            ffa: FfaPoints {
                positions: BTreeMap::from([(1, 4), (2, 2), (3, 1), (4, 0)]),
            },
            team_ff: WinLosePoints { win: 2, lose: 0 },
            team_noff: WinLosePoints { win: 2, lose: 0 },
            casual: CasualPoints {
                vip_win: 4,
                vip_lose: 0,
                protectors_win: 2,
                hunters_win: 2,
            },
        }
    }
}

impl PointsConfig {
    /// Win/lose points for a two-sided mode. None for FFA and casual.
    pub fn win_lose(&self, mode: Mode) -> Option<WinLosePoints> {
        match mode {
            Mode::OneVOne => Some(self.one_v_one),
            Mode::TeamFf => Some(self.team_ff),
            Mode::TeamNoff => Some(self.team_noff),
            Mode::Ffa | Mode::Casual => None,
        }
    }

    /// Reject values outside `-MAX_POINTS..=MAX_POINTS` and FFA positions
    /// outside 1-4.
    pub fn validate(&self) -> Result<(), ScoreError> {
        if let Some(pos) = self.ffa.positions.keys().find(|p| !(1..=4).contains(*p)) {
            return Err(ScoreError::InvalidConfig(format!("no FFA position {}", pos)));
        }
        let values = [
            ("1v1", self.one_v_one.win),
            ("1v1", self.one_v_one.lose),
            ("team_ff", self.team_ff.win),
            ("team_ff", self.team_ff.lose),
            ("team_noff", self.team_noff.win),
            ("team_noff", self.team_noff.lose),
            ("casual", self.casual.vip_win),
            ("casual", self.casual.vip_lose),
            ("casual", self.casual.protectors_win),
            ("casual", self.casual.hunters_win),
        ]
        .into_iter()
        .chain(self.ffa.positions.values().map(|v| ("ffa", *v)));
        for (mode, value) in values {
            if !(-MAX_POINTS..=MAX_POINTS).contains(&value) {
                return Err(ScoreError::InvalidConfig(format!(
                    "{} points {} out of range (max {})",
                    mode, value, MAX_POINTS
                )));
            }
        }
        Ok(())
    }
}

/// How many matches a mode needs before its rotation counts as done.
/// Serialized as `"all"` or a number.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTarget", into = "RawTarget")]
pub enum MatchTarget {
    /// Every rotation candidate exactly once.
    All,
    Count(u32),
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RawTarget {
    Count(u32),
    Word(String),
}

impl TryFrom<RawTarget> for MatchTarget {
    type Error = String;

    fn try_from(raw: RawTarget) -> Result<Self, Self::Error> {
        match raw {
            RawTarget::Count(n) => Ok(MatchTarget::Count(n)),
            RawTarget::Word(w) if w == "all" => Ok(MatchTarget::All),
            RawTarget::Word(w) => Err(format!("expected \"all\" or a number, got \"{}\"", w)),
        }
    }
}

impl From<MatchTarget> for RawTarget {
    fn from(target: MatchTarget) -> Self {
        match target {
            MatchTarget::All => RawTarget::Word("all".to_string()),
            MatchTarget::Count(n) => RawTarget::Count(n),
        }
    }
}

/// Per-mode target match counts.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(rename = "1v1")]
    pub one_v_one: MatchTarget,
    pub team_ff: MatchTarget,
    pub team_noff: MatchTarget,
    /// Number of FFA matches to play.
    pub ffa: u32,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            one_v_one: MatchTarget::All,
            team_ff: MatchTarget::All,
            team_noff: MatchTarget::All,
            ffa: 3,
        }
    }
}

impl MatchConfig {
    /// Target for a mode. Casual always plays its full VIP rotation.
    pub fn target(&self, mode: Mode) -> MatchTarget {
        match mode {
            Mode::OneVOne => self.one_v_one,
            Mode::TeamFf => self.team_ff,
            Mode::TeamNoff => self.team_noff,
            Mode::Ffa => MatchTarget::Count(self.ffa),
            Mode::Casual => MatchTarget::All,
        }
    }
}

/// Runtime settings stored in the main record.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub points: PointsConfig,
    #[serde(default)]
    pub match_config: MatchConfig,
}
