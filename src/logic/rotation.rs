//! Rotation tracking: enumerate every pairing or team split a mode needs and
//! count how often each has been played.

use crate::models::{Match, MatchPayload, Mode, PlayerId, TeamMatch};
use serde::Serialize;

/// A rotation candidate with a play count.
pub trait Rotation {
    fn played(&self) -> usize;

    fn is_played(&self) -> bool {
        self.played() > 0
    }
}

/// True when there is at least one candidate and every candidate was played.
/// An empty list (too few players) is never complete.
pub fn is_complete<R: Rotation>(rotations: &[R]) -> bool {
    !rotations.is_empty() && rotations.iter().all(Rotation::is_played)
}

/// Candidates not yet played, in enumeration order.
pub fn unplayed<R: Rotation>(rotations: &[R]) -> Vec<&R> {
    rotations.iter().filter(|r| !r.is_played()).collect()
}

/// Unordered 1v1 pairing.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Pairing {
    pub players: [PlayerId; 2],
    pub played: usize,
}

impl Rotation for Pairing {
    fn played(&self) -> usize {
        self.played
    }
}

/// Unordered pair of disjoint 2-player teams.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct TeamRotation {
    pub team1: [PlayerId; 2],
    pub team2: [PlayerId; 2],
    pub played: usize,
}

impl Rotation for TeamRotation {
    fn played(&self) -> usize {
        self.played
    }
}

/// VIP split into protectors and hunters for one friendly-fire setting.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CasualRotation {
    pub vip: PlayerId,
    pub protectors: [PlayerId; 2],
    pub hunters: [PlayerId; 2],
    pub friendly_fire: bool,
    pub played: usize,
}

impl Rotation for CasualRotation {
    fn played(&self) -> usize {
        self.played
    }
}

/// Every unordered pair of `roster`, each exactly once, in roster order.
fn pairs(roster: &[PlayerId]) -> Vec<[PlayerId; 2]> {
    let mut out = Vec::new();
    for (i, a) in roster.iter().enumerate() {
        for b in &roster[i + 1..] {
            out.push([a.clone(), b.clone()]);
        }
    }
    out
}

/// Order-independent comparison of a recorded team with a candidate pair.
fn same_team(recorded: &[PlayerId], candidate: &[PlayerId; 2]) -> bool {
    recorded.len() == 2 && candidate.iter().all(|p| recorded.contains(p))
}

fn dedup(roster: &[PlayerId]) -> Vec<PlayerId> {
    let mut out: Vec<PlayerId> = Vec::with_capacity(roster.len());
    for id in roster {
        if !out.contains(id) {
            out.push(id.clone());
        }
    }
    out
}

/// All N·(N−1)/2 duos of `roster` with how many 1v1s each played, either order.
pub fn one_v_one_rotations(roster: &[PlayerId], matches: &[Match]) -> Vec<Pairing> {
    pairs(&dedup(roster))
        .into_iter()
        .map(|players| {
            let played = matches
                .iter()
                .filter(|m| match &m.payload {
                    MatchPayload::OneVOne(o) => {
                        same_team(&[o.player1.clone(), o.player2.clone()], &players)
                    }
                    _ => false,
                })
                .count();
            Pairing { players, played }
        })
        .collect()
}

/// All unordered splits into two disjoint duos for a 2v2 mode. Empty below 4 players.
pub fn team_rotations(roster: &[PlayerId], matches: &[Match], mode: Mode) -> Vec<TeamRotation> {
    let teams = pairs(&dedup(roster));
    let recorded: Vec<&TeamMatch> = matches
        .iter()
        .filter_map(|m| match (&m.payload, mode) {
            (MatchPayload::TeamFf(t), Mode::TeamFf) | (MatchPayload::TeamNoff(t), Mode::TeamNoff) => {
                Some(t)
            }
            _ => None,
        })
        .collect();

    let mut out = Vec::new();
    for (i, a) in teams.iter().enumerate() {
        for b in &teams[i + 1..] {
            if a.iter().any(|p| b.contains(p)) {
                continue;
            }
            let played = recorded
                .iter()
                .filter(|t| {
                    (same_team(&t.team1, a) && same_team(&t.team2, b))
                        || (same_team(&t.team1, b) && same_team(&t.team2, a))
                })
                .count();
            out.push(TeamRotation {
                team1: a.clone(),
                team2: b.clone(),
                played,
            });
        }
    }
    out
}

/// The six protector/hunter splits of the four non-VIP players in `pool` for
/// one friendly-fire setting. Empty unless `pool` holds the VIP plus exactly
/// four others.
pub fn casual_rotations(
    vip: &str,
    pool: &[PlayerId],
    matches: &[Match],
    friendly_fire: bool,
) -> Vec<CasualRotation> {
    let pool = dedup(pool);
    if !pool.iter().any(|p| p == vip) {
        return Vec::new();
    }
    let others: Vec<PlayerId> = pool.into_iter().filter(|p| p != vip).collect();
    if others.len() != 4 {
        return Vec::new();
    }

    pairs(&others)
        .into_iter()
        .map(|protectors| {
            let hunters: Vec<PlayerId> = others
                .iter()
                .filter(|p| !protectors.contains(p))
                .cloned()
                .collect();
            let hunters = [hunters[0].clone(), hunters[1].clone()];
            let played = matches
                .iter()
                .filter(|m| match &m.payload {
                    MatchPayload::Casual(c) => {
                        c.vip == vip
                            && c.friendly_fire == friendly_fire
                            && same_team(&c.protectors, &protectors)
                    }
                    _ => false,
                })
                .count();
            CasualRotation {
                vip: vip.to_string(),
                protectors,
                hunters,
                friendly_fire,
                played,
            }
        })
        .collect()
}
