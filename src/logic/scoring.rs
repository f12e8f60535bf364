//! Build match payloads from the points table and check their consistency.

use crate::models::{
    CasualMatch, CasualResult, CasualRole, CasualSide, FfaMatch, FfaResult, MatchPayload, Mode,
    OneVOneMatch, PlayerId, PointsConfig, ScoreError, Team, TeamMatch, MAX_POINTS,
};
use std::collections::HashSet;

fn invalid(reason: impl Into<String>) -> ScoreError {
    ScoreError::InvalidMatch(reason.into())
}

fn all_distinct<'a>(ids: impl IntoIterator<Item = &'a PlayerId>) -> bool {
    let mut seen = HashSet::new();
    ids.into_iter().all(|id| seen.insert(id))
}

fn same_set(a: &[PlayerId], b: &[PlayerId]) -> bool {
    a.len() == b.len() && a.iter().all(|p| b.contains(p))
}

/// 1v1 between `player1` and `player2`; `winner` must be one of them.
pub fn one_v_one(
    points: &PointsConfig,
    player1: &str,
    player2: &str,
    winner: &str,
) -> Result<MatchPayload, ScoreError> {
    let loser = if winner == player1 {
        player2
    } else if winner == player2 {
        player1
    } else {
        return Err(invalid(format!("winner '{}' did not play", winner)));
    };
    let payload = MatchPayload::OneVOne(OneVOneMatch {
        player1: player1.to_string(),
        player2: player2.to_string(),
        winner: winner.to_string(),
        loser: loser.to_string(),
        win_points: points.one_v_one.win,
        lose_points: points.one_v_one.lose,
    });
    validate_payload(&payload)?;
    Ok(payload)
}

/// Free-for-all from finishing order: `placements[0]` finished first.
pub fn ffa(points: &PointsConfig, placements: &[PlayerId]) -> Result<MatchPayload, ScoreError> {
    let results = placements
        .iter()
        .enumerate()
        .map(|(i, player)| {
            let position = (i + 1) as u8;
            FfaResult {
                player: player.clone(),
                position,
                points: points.ffa.for_position(position),
            }
        })
        .collect();
    let payload = MatchPayload::Ffa(FfaMatch { results });
    validate_payload(&payload)?;
    Ok(payload)
}

/// 2v2 match for `mode` (team_ff or team_noff).
pub fn team(
    points: &PointsConfig,
    mode: Mode,
    team1: Vec<PlayerId>,
    team2: Vec<PlayerId>,
    winner: Team,
) -> Result<MatchPayload, ScoreError> {
    let wl = points
        .win_lose(mode)
        .filter(|_| mode.is_team())
        .ok_or_else(|| invalid(format!("{} is not a team mode", mode)))?;
    let (winners, losers) = match winner {
        Team::One => (team1.clone(), team2.clone()),
        Team::Two => (team2.clone(), team1.clone()),
    };
    let record = TeamMatch {
        team1,
        team2,
        winners,
        losers,
        win_points: wl.win,
        lose_points: wl.lose,
    };
    let payload = if mode == Mode::TeamFf {
        MatchPayload::TeamFf(record)
    } else {
        MatchPayload::TeamNoff(record)
    };
    validate_payload(&payload)?;
    Ok(payload)
}

/// Casual VIP match. The VIP wins with the protectors.
pub fn casual(
    points: &PointsConfig,
    vip: &str,
    protectors: Vec<PlayerId>,
    hunters: Vec<PlayerId>,
    winner: CasualSide,
    friendly_fire: bool,
) -> Result<MatchPayload, ScoreError> {
    let cfg = points.casual;
    let protectors_won = winner == CasualSide::Protectors;
    let mut results = vec![CasualResult {
        player: vip.to_string(),
        points: if protectors_won { cfg.vip_win } else { cfg.vip_lose },
        role: CasualRole::Vip,
        win: protectors_won,
    }];
    results.extend(protectors.iter().map(|p| CasualResult {
        player: p.clone(),
        points: if protectors_won { cfg.protectors_win } else { 0 },
        role: CasualRole::Protector,
        win: protectors_won,
    }));
    results.extend(hunters.iter().map(|p| CasualResult {
        player: p.clone(),
        points: if protectors_won { 0 } else { cfg.hunters_win },
        role: CasualRole::Hunter,
        win: !protectors_won,
    }));
    let payload = MatchPayload::Casual(CasualMatch {
        vip: vip.to_string(),
        protectors,
        hunters,
        winner,
        friendly_fire,
        results,
    });
    validate_payload(&payload)?;
    Ok(payload)
}

/// Structural checks on a payload, independent of the roster.
pub fn validate_payload(payload: &MatchPayload) -> Result<(), ScoreError> {
    match payload {
        MatchPayload::OneVOne(m) => {
            if m.player1 == m.player2 {
                return Err(invalid("a player cannot face themselves"));
            }
            let pair = [m.player1.clone(), m.player2.clone()];
            if m.winner == m.loser || !same_set(&[m.winner.clone(), m.loser.clone()], &pair) {
                return Err(invalid("winner and loser must be the two players"));
            }
        }
        MatchPayload::Ffa(m) => {
            if !(2..=4).contains(&m.results.len()) {
                return Err(invalid("free-for-all needs 2 to 4 players"));
            }
            if !all_distinct(m.results.iter().map(|r| &r.player)) {
                return Err(invalid("a player finished twice"));
            }
            let mut positions = HashSet::new();
            for r in &m.results {
                if !(1..=4).contains(&r.position) || !positions.insert(r.position) {
                    return Err(invalid(format!("bad or repeated position {}", r.position)));
                }
            }
        }
        MatchPayload::TeamFf(m) | MatchPayload::TeamNoff(m) => {
            if m.team1.len() != 2 || m.team2.len() != 2 {
                return Err(invalid("teams must have exactly 2 players"));
            }
            if !all_distinct(m.team1.iter().chain(m.team2.iter())) {
                return Err(invalid("teams must not share players"));
            }
            let one_won = same_set(&m.winners, &m.team1) && same_set(&m.losers, &m.team2);
            let two_won = same_set(&m.winners, &m.team2) && same_set(&m.losers, &m.team1);
            if !one_won && !two_won {
                return Err(invalid("winners must be one team and losers the other"));
            }
        }
        MatchPayload::Casual(m) => {
            if m.protectors.len() != 2 || m.hunters.len() != 2 {
                return Err(invalid("protectors and hunters must have 2 players each"));
            }
            let everyone: Vec<&PlayerId> = std::iter::once(&m.vip)
                .chain(m.protectors.iter())
                .chain(m.hunters.iter())
                .collect();
            if !all_distinct(everyone.iter().copied()) {
                return Err(invalid("VIP, protectors and hunters must not overlap"));
            }
            if !all_distinct(m.results.iter().map(|r| &r.player))
                || m.results.iter().any(|r| !everyone.contains(&&r.player))
            {
                return Err(invalid("results must list each participant at most once"));
            }
        }
    }
    if let Some((player, points)) = payload
        .point_deltas()
        .into_iter()
        .find(|(_, points)| !(-MAX_POINTS..=MAX_POINTS).contains(points))
    {
        return Err(invalid(format!(
            "{} points for '{}' out of range (max {})",
            points, player, MAX_POINTS
        )));
    }
    Ok(())
}
