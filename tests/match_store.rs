//! Integration tests for the match store: points, undo, ordering, ids.

use chrono::{TimeZone, Utc};
use smash_night::logic::scoring;
use smash_night::models::{FfaMatch, FfaResult};
use smash_night::{CasualSide, MatchPayload, MatchStore, Mode, PlayerId, PointsConfig, ScoreError, Team};

fn ids(names: &[&str]) -> Vec<PlayerId> {
    names.iter().map(|s| s.to_string()).collect()
}

fn store_with_roster() -> MatchStore {
    let mut store = MatchStore::new();
    store.reset_season(&ids(&["a", "b", "c", "d", "e"]));
    store
}

fn ffa_5_3_1_0() -> MatchPayload {
    MatchPayload::Ffa(FfaMatch {
        results: vec![
            FfaResult { player: "a".into(), position: 1, points: 5 },
            FfaResult { player: "b".into(), position: 2, points: 3 },
            FfaResult { player: "c".into(), position: 3, points: 1 },
            FfaResult { player: "d".into(), position: 4, points: 0 },
        ],
    })
}

#[test]
fn ffa_points_go_to_ffa_bucket_and_undo_reverses_them() {
    let mut store = store_with_roster();
    store.add_match(ffa_5_3_1_0());

    assert_eq!(store.totals_for("a").ffa, 5);
    assert_eq!(store.totals_for("b").ffa, 3);
    assert_eq!(store.totals_for("c").ffa, 1);
    assert_eq!(store.totals_for("d").ffa, 0);
    assert_eq!(store.totals_for("a").total(), 5);

    let undone = store.undo_last_match().unwrap();
    assert_eq!(undone.mode(), Mode::Ffa);
    for p in ["a", "b", "c", "d"] {
        assert_eq!(store.totals_for(p).ffa, 0);
    }
    assert!(store.matches().is_empty());
}

#[test]
fn add_then_undo_restores_leaderboard_for_every_mode() {
    let points = PointsConfig::default();
    let payloads = vec![
        scoring::one_v_one(&points, "a", "b", "b").unwrap(),
        scoring::ffa(&points, &ids(&["c", "a", "d"])).unwrap(),
        scoring::team(&points, Mode::TeamFf, ids(&["a", "b"]), ids(&["c", "d"]), Team::Two).unwrap(),
        scoring::team(&points, Mode::TeamNoff, ids(&["a", "c"]), ids(&["b", "d"]), Team::One).unwrap(),
        scoring::casual(&points, "e", ids(&["a", "b"]), ids(&["c", "d"]), CasualSide::Hunters, true)
            .unwrap(),
    ];

    let mut store = store_with_roster();
    store.add_match(scoring::one_v_one(&points, "c", "d", "c").unwrap());
    for payload in payloads {
        let before = store.leaderboard();
        store.add_match(payload);
        assert_ne!(store.leaderboard(), before);
        store.undo_last_match().unwrap();
        assert_eq!(store.leaderboard(), before);
    }
}

#[test]
fn total_is_sum_of_buckets_after_mixed_history() {
    let points = PointsConfig::default();
    let mut store = store_with_roster();
    store.add_match(scoring::one_v_one(&points, "a", "b", "a").unwrap());
    store.add_match(scoring::ffa(&points, &ids(&["b", "a", "c", "d"])).unwrap());
    store.add_match(
        scoring::team(&points, Mode::TeamFf, ids(&["a", "c"]), ids(&["b", "d"]), Team::One).unwrap(),
    );
    store.add_match(
        scoring::casual(&points, "a", ids(&["b", "c"]), ids(&["d", "e"]), CasualSide::Protectors, false)
            .unwrap(),
    );
    store.undo_last_match();
    store.add_match(
        scoring::casual(&points, "b", ids(&["a", "c"]), ids(&["d", "e"]), CasualSide::Protectors, false)
            .unwrap(),
    );

    for entry in store.leaderboard() {
        let t = entry.totals;
        assert_eq!(entry.total, t.ffa + t.team_ff + t.team_noff + t.casual + t.one_v_one);
    }

    // Running totals equal a from-scratch sum over the log.
    for s in store.stats() {
        let mut expected = smash_night::ModeTotals::default();
        for m in store.matches() {
            for (player, pts) in m.payload.point_deltas() {
                if player == s.player {
                    expected.add(m.mode(), pts);
                }
            }
        }
        assert_eq!(s.totals, expected, "player {}", s.player);
    }
}

#[test]
fn one_v_one_scores_into_1v1_bucket() {
    let points = PointsConfig::default();
    let mut store = store_with_roster();
    store.add_match(scoring::one_v_one(&points, "a", "b", "b").unwrap());
    assert_eq!(store.totals_for("b").one_v_one, points.one_v_one.win);
    assert_eq!(store.totals_for("a").one_v_one, points.one_v_one.lose);
    assert_eq!(store.totals_for("b").ffa, 0);
}

#[test]
fn undo_on_empty_log_is_a_noop() {
    let mut store = store_with_roster();
    let before = store.leaderboard();
    assert!(store.undo_last_match().is_none());
    assert_eq!(store.leaderboard(), before);
}

#[test]
fn undo_removes_only_the_most_recent_match() {
    let points = PointsConfig::default();
    let mut store = store_with_roster();
    let first = store.add_match(scoring::one_v_one(&points, "a", "b", "a").unwrap());
    let second = store.add_match(scoring::one_v_one(&points, "a", "c", "c").unwrap());

    assert_eq!(store.undo_last_match().unwrap().id, second.id);
    assert_eq!(store.matches(), &[first]);
    assert_eq!(store.totals_for("c").one_v_one, 0);
    assert_eq!(store.totals_for("a").one_v_one, points.one_v_one.win);
}

#[test]
fn ids_strictly_increase_even_with_same_timestamp() {
    let points = PointsConfig::default();
    let mut store = store_with_roster();
    let t = Utc.with_ymd_and_hms(2026, 3, 1, 20, 0, 0).unwrap();
    let m1 = store.add_match_at(scoring::one_v_one(&points, "a", "b", "a").unwrap(), t);
    let m2 = store.add_match_at(scoring::one_v_one(&points, "a", "b", "b").unwrap(), t);
    let m3 = store.add_match_at(scoring::one_v_one(&points, "c", "d", "d").unwrap(), t);
    assert_eq!(m1.id, t.timestamp_millis());
    assert!(m1.id < m2.id && m2.id < m3.id);
}

#[test]
fn matches_by_type_is_most_recent_first() {
    let points = PointsConfig::default();
    let mut store = store_with_roster();
    let a = store.add_match(scoring::one_v_one(&points, "a", "b", "a").unwrap());
    store.add_match(scoring::ffa(&points, &ids(&["a", "b"])).unwrap());
    let b = store.add_match(scoring::one_v_one(&points, "c", "d", "c").unwrap());

    let got: Vec<_> = store.matches_by_type(Mode::OneVOne).iter().map(|m| m.id).collect();
    assert_eq!(got, vec![b.id, a.id]);
    assert_eq!(store.matches_by_type(Mode::Casual).len(), 0);
}

#[test]
fn remove_match_reverses_points_and_rejects_unknown_id() {
    let points = PointsConfig::default();
    let mut store = store_with_roster();
    let first = store.add_match(scoring::one_v_one(&points, "a", "b", "a").unwrap());
    store.add_match(scoring::one_v_one(&points, "c", "d", "c").unwrap());

    store.remove_match(first.id).unwrap();
    assert_eq!(store.totals_for("a").one_v_one, 0);
    assert_eq!(store.matches().len(), 1);
    assert!(matches!(store.remove_match(first.id), Err(ScoreError::NotFound(_))));
}

#[test]
fn reset_season_clears_log_and_zeroes_roster() {
    let points = PointsConfig::default();
    let mut store = store_with_roster();
    store.add_match(scoring::ffa(&points, &ids(&["a", "b", "c", "d"])).unwrap());
    store.reset_season(&ids(&["a", "b", "c"]));

    assert!(store.matches().is_empty());
    let board = store.leaderboard();
    assert_eq!(board.len(), 3);
    assert!(board.iter().all(|e| e.total == 0));
}

#[test]
fn players_without_stats_entry_are_added_on_first_points() {
    let points = PointsConfig::default();
    let mut store = MatchStore::new();
    store.add_match(scoring::one_v_one(&points, "x", "y", "y").unwrap());
    let players: Vec<_> = store.stats().iter().map(|s| s.player.as_str()).collect();
    assert_eq!(players, vec!["y", "x"]);
}

#[test]
fn huge_point_values_saturate_instead_of_overflowing() {
    let mut store = MatchStore::new();
    let big = MatchPayload::Ffa(FfaMatch {
        results: vec![
            FfaResult { player: "a".into(), position: 1, points: i32::MAX },
            FfaResult { player: "b".into(), position: 2, points: i32::MIN },
        ],
    });
    store.add_match(big.clone());
    store.add_match(big);
    assert_eq!(store.totals_for("a").ffa, i32::MAX);
    assert_eq!(store.totals_for("b").ffa, i32::MIN);
    assert_eq!(store.totals_for("a").total(), i32::MAX);
    store.undo_last_match().unwrap();
    store.undo_last_match().unwrap();
}

#[test]
fn replay_rebuilds_totals_in_seeded_order() {
    let points = PointsConfig::default();
    let mut store = store_with_roster();
    store.add_match(scoring::one_v_one(&points, "b", "a", "b").unwrap());
    store.add_match(scoring::ffa(&points, &ids(&["c", "x"])).unwrap());

    let rebuilt = MatchStore::replay(store.matches().to_vec(), &ids(&["a", "b", "c", "d", "e"]));
    assert_eq!(rebuilt, store);

    let unseeded = MatchStore::replay(store.matches().to_vec(), &[]);
    let players: Vec<_> = unseeded.stats().iter().map(|s| s.player.as_str()).collect();
    assert_eq!(players, vec!["b", "a", "c", "x"]);
}
