//! Integration tests for the scoreboard facade: persistence, notifications,
//! import/export, settings, casual VIP and mode progress.

use smash_night::models::{OneVOneMatch, WinLosePoints};
use smash_night::storage::{CASUAL_VIP_KEY, DATA_KEY, IMAGES_KEY, PLAYERS_KEY};
use smash_night::{
    CasualSide, ChangeEvent, FileStore, KeyValueStore, MatchConfig, MatchPayload, MatchTarget,
    MemoryStore, Mode, NewPlayer, PlayerId, PointsConfig, ScoreError, Scoreboard, Team,
    TournamentConfig,
};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn ids(names: &[&str]) -> Vec<PlayerId> {
    names.iter().map(|s| s.to_string()).collect()
}

fn board() -> Scoreboard<MemoryStore> {
    Scoreboard::load(MemoryStore::new())
}

/// Reload from whatever the given scoreboard has written.
fn reload(sb: &Scoreboard<MemoryStore>) -> Scoreboard<MemoryStore> {
    Scoreboard::load(sb.storage().clone())
}

#[test]
fn first_run_uses_default_roster_and_zeroed_stats() {
    let sb = board();
    assert_eq!(sb.players().len(), 5);
    assert_eq!(sb.main_players(), ids(&["alex", "sam", "jordan", "riley"]));
    assert!(sb.matches().is_empty());
    assert_eq!(sb.leaderboard(&Default::default()).len(), 5);
    assert_eq!(sb.settings().points, PointsConfig::default());
}

#[test]
fn malformed_records_fall_back_to_defaults() {
    let mut store = MemoryStore::new();
    store.set(DATA_KEY, "{not json").unwrap();
    store.set(PLAYERS_KEY, "[1, 2, 3]").unwrap();
    let sb = Scoreboard::load(store);
    assert_eq!(sb.players().len(), 5);
    assert!(sb.matches().is_empty());
}

#[test]
fn state_survives_reload() {
    let mut sb = board();
    sb.add_player(NewPlayer::named("Jean Paul")).unwrap();
    sb.record_one_v_one("jean_paul", "alex", "jean_paul").unwrap();
    sb.set_casual_vip(Some("casey".into())).unwrap();
    sb.start_tournament(TournamentConfig {
        name: "Cup".into(),
        players: ids(&["alex", "jean_paul"]),
        modes: vec![Mode::OneVOne],
    })
    .unwrap();
    sb.record_one_v_one("jean_paul", "alex", "alex").unwrap();
    assert!(sb.is_persisted());

    let again = reload(&sb);
    assert!(again.player("jean_paul").is_some());
    assert_eq!(again.matches(), sb.matches());
    assert_eq!(again.match_store().stats(), sb.match_store().stats());
    assert_eq!(again.casual_vip(), Some("casey"));
    assert_eq!(again.tournament(), sb.tournament());
}

#[test]
fn images_are_saved_under_their_own_key() {
    let mut sb = board();
    sb.set_player_image("alex", Some("data:image/png;base64,QUJD".into()))
        .unwrap();

    let players_raw = sb.storage().get(PLAYERS_KEY).unwrap_or_default();
    assert!(!players_raw.contains("QUJD"));
    assert!(sb.storage().get(IMAGES_KEY).unwrap().contains("QUJD"));

    let again = reload(&sb);
    assert_eq!(
        again.player("alex").and_then(|p| p.image.as_deref()),
        Some("data:image/png;base64,QUJD")
    );
}

#[test]
fn storage_failure_keeps_in_memory_state_and_is_reported() {
    let mut sb = board();
    sb.save().unwrap();
    sb.storage_mut().set_quota(Some(0));

    let m = sb.record_one_v_one("alex", "sam", "alex").unwrap();
    assert!(!sb.is_persisted());
    assert_eq!(sb.matches(), &[m]);
    assert_eq!(sb.match_store().totals_for("alex").one_v_one, 3);
    assert!(matches!(sb.save(), Err(ScoreError::StorageWriteFailure(_))));

    sb.storage_mut().set_quota(None);
    sb.retry_unsaved().unwrap();
    assert!(sb.is_persisted());
    assert_eq!(reload(&sb).matches().len(), 1);
}

#[test]
fn subscribers_hear_each_kind_of_change() {
    let mut sb = board();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let sub = sb.subscribe(move |e| sink.lock().unwrap().push(e));

    sb.record_one_v_one("alex", "sam", "sam").unwrap();
    sb.undo_last_match();
    sb.add_player(NewPlayer::named("Kim")).unwrap();
    sb.set_player_image("kim", None).unwrap();
    sb.set_match_config(MatchConfig::default());
    sb.start_tournament(TournamentConfig {
        name: String::new(),
        players: ids(&["alex"]),
        modes: vec![Mode::Ffa],
    })
    .unwrap();
    sb.cancel_tournament();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ChangeEvent::MatchData,
            ChangeEvent::MatchData,
            ChangeEvent::PlayerData,
            ChangeEvent::PlayerData,
            ChangeEvent::Settings,
            ChangeEvent::MatchData,
            ChangeEvent::Tournament,
            ChangeEvent::Tournament,
        ]
    );

    assert!(sb.unsubscribe(sub));
    sb.record_one_v_one("alex", "sam", "sam").unwrap();
    assert_eq!(seen.lock().unwrap().len(), 8);
}

#[test]
fn failed_operations_do_not_notify() {
    let mut sb = board();
    let seen = Arc::new(Mutex::new(0));
    let sink = Arc::clone(&seen);
    sb.subscribe(move |_| *sink.lock().unwrap() += 1);

    assert!(sb.undo_last_match().is_none());
    assert!(sb.add_player(NewPlayer::named("Alex")).is_err());
    assert!(sb.record_one_v_one("alex", "alex", "alex").is_err());
    assert_eq!(*seen.lock().unwrap(), 0);
}

#[test]
fn points_config_is_read_at_record_time() {
    let mut sb = board();
    sb.record_one_v_one("alex", "sam", "alex").unwrap();
    let mut points = PointsConfig::default();
    points.one_v_one = WinLosePoints { win: 10, lose: 1 };
    sb.set_points_config(points).unwrap();
    let m = sb.record_one_v_one("alex", "sam", "alex").unwrap();

    match &m.payload {
        MatchPayload::OneVOne(o) => assert_eq!((o.win_points, o.lose_points), (10, 1)),
        other => panic!("unexpected payload {:?}", other),
    }
    assert_eq!(sb.match_store().totals_for("alex").one_v_one, 13);
    assert_eq!(sb.match_store().totals_for("sam").one_v_one, 1);
}

#[test]
fn add_match_rejects_unknown_players_and_bad_payloads() {
    let mut sb = board();
    let ghost = MatchPayload::OneVOne(OneVOneMatch {
        player1: "alex".into(),
        player2: "ghost".into(),
        winner: "alex".into(),
        loser: "ghost".into(),
        win_points: 3,
        lose_points: 0,
    });
    assert!(matches!(sb.add_match(ghost), Err(ScoreError::NotFound(_))));

    let overlapping = sb.record_team(Mode::TeamFf, ids(&["alex", "sam"]), ids(&["sam", "riley"]), Team::One);
    assert!(matches!(overlapping, Err(ScoreError::InvalidMatch(_))));
    let not_team = sb.record_team(Mode::Ffa, ids(&["alex", "sam"]), ids(&["jordan", "riley"]), Team::One);
    assert!(matches!(not_team, Err(ScoreError::InvalidMatch(_))));
    let vip_protects_self = sb.record_casual(
        "casey",
        ids(&["casey", "alex"]),
        ids(&["sam", "jordan"]),
        CasualSide::Protectors,
        false,
    );
    assert!(matches!(vip_protects_self, Err(ScoreError::InvalidMatch(_))));
    assert!(matches!(sb.record_ffa(&ids(&["alex"])), Err(ScoreError::InvalidMatch(_))));
    assert!(sb.matches().is_empty());
}

#[test]
fn casual_scoring_rewards_the_winning_side() {
    let mut sb = board();
    sb.record_casual(
        "casey",
        ids(&["alex", "sam"]),
        ids(&["jordan", "riley"]),
        CasualSide::Protectors,
        true,
    )
    .unwrap();
    let casual = |id: &str| sb.match_store().totals_for(id).casual;
    assert_eq!(casual("casey"), 4);
    assert_eq!(casual("alex"), 2);
    assert_eq!(casual("sam"), 2);
    assert_eq!(casual("jordan"), 0);
    assert_eq!(casual("riley"), 0);
}

#[test]
fn export_then_import_restores_data() {
    let mut sb = board();
    let mut points = PointsConfig::default();
    points.ffa.positions.insert(1, 5);
    sb.set_points_config(points).unwrap();
    sb.record_ffa(&ids(&["alex", "sam", "jordan", "riley"])).unwrap();
    sb.start_tournament(TournamentConfig {
        name: "Archived".into(),
        players: ids(&["alex"]),
        modes: vec![Mode::Ffa],
    })
    .unwrap();
    sb.record_ffa(&ids(&["sam", "alex"])).unwrap();
    sb.end_tournament().unwrap();
    let blob = sb.export_json().unwrap();

    let mut other = board();
    other.import_json(&blob).unwrap();
    assert_eq!(other.matches(), sb.matches());
    assert_eq!(other.history(), sb.history());
    assert_eq!(other.settings(), sb.settings());
    assert_eq!(other.settings().points.ffa.for_position(1), 5);
    assert_eq!(
        other.leaderboard(&Default::default()),
        sb.leaderboard(&Default::default())
    );
    assert_eq!(reload(&other).matches(), sb.matches());
}

#[test]
fn import_recomputes_totals_from_matches() {
    let mut sb = board();
    sb.record_one_v_one("alex", "sam", "alex").unwrap();
    sb.record_ffa(&ids(&["sam", "alex", "jordan"])).unwrap();
    let mut blob: serde_json::Value = serde_json::from_str(&sb.export_json().unwrap()).unwrap();
    for entry in blob["stats"].as_array_mut().unwrap() {
        entry["ffa"] = serde_json::json!(999);
    }

    let mut other = board();
    other.import_json(&blob.to_string()).unwrap();
    assert_eq!(other.match_store().stats(), sb.match_store().stats());
    assert_eq!(other.match_store().totals_for("alex").total(), 5);
    assert_eq!(other.match_store().totals_for("riley").ffa, 0);
}

#[test]
fn import_rejects_inconsistent_matches() {
    let mut sb = board();
    sb.record_one_v_one("alex", "sam", "alex").unwrap();
    let mut blob: serde_json::Value = serde_json::from_str(&sb.export_json().unwrap()).unwrap();
    blob["matches"][0]["loser"] = serde_json::json!("alex");

    let mut other = board();
    let err = other.import_json(&blob.to_string()).unwrap_err();
    assert!(matches!(err, ScoreError::InvalidConfig(_)));
    assert!(other.matches().is_empty());
}

#[test]
fn out_of_range_points_are_rejected() {
    let mut sb = board();
    let mut points = PointsConfig::default();
    points.one_v_one = WinLosePoints { win: i32::MAX, lose: 0 };
    assert!(matches!(sb.set_points_config(points), Err(ScoreError::InvalidConfig(_))));
    let mut points = PointsConfig::default();
    points.ffa.positions.insert(1, i32::MIN);
    assert!(matches!(sb.set_points_config(points), Err(ScoreError::InvalidConfig(_))));
    let mut points = PointsConfig::default();
    points.ffa.positions.insert(7, 1);
    assert!(matches!(sb.set_points_config(points), Err(ScoreError::InvalidConfig(_))));
    assert_eq!(sb.settings().points, PointsConfig::default());

    let huge = MatchPayload::OneVOne(OneVOneMatch {
        player1: "alex".into(),
        player2: "sam".into(),
        winner: "alex".into(),
        loser: "sam".into(),
        win_points: i32::MAX,
        lose_points: 0,
    });
    assert!(matches!(sb.add_match(huge), Err(ScoreError::InvalidMatch(_))));

    sb.record_one_v_one("alex", "sam", "alex").unwrap();
    sb.record_one_v_one("alex", "sam", "alex").unwrap();
    assert_eq!(sb.match_store().totals_for("alex").one_v_one, 6);
}

#[test]
fn import_without_matches_is_rejected_and_changes_nothing() {
    let mut sb = board();
    sb.record_one_v_one("alex", "sam", "alex").unwrap();
    let data_before = sb.storage().get(DATA_KEY);
    let board_before = sb.leaderboard(&Default::default());

    let err = sb.import_json(r#"{"stats": []}"#).unwrap_err();
    assert!(matches!(err, ScoreError::InvalidConfig(_)));
    assert!(matches!(sb.import_json("not json"), Err(ScoreError::InvalidConfig(_))));
    assert!(matches!(
        sb.import_json(r#"{"matches": "oops", "stats": []}"#),
        Err(ScoreError::InvalidConfig(_))
    ));

    assert_eq!(sb.storage().get(DATA_KEY), data_before);
    assert_eq!(sb.leaderboard(&Default::default()), board_before);
    assert_eq!(sb.matches().len(), 1);
}

#[test]
fn casual_vip_is_sticky_and_validated() {
    let mut sb = board();
    assert!(sb.casual_rotations(false).is_empty());
    assert!(matches!(
        sb.set_casual_vip(Some("ghost".into())),
        Err(ScoreError::NotFound(_))
    ));

    sb.set_casual_vip(Some("casey".into())).unwrap();
    assert!(sb.storage().get(CASUAL_VIP_KEY).unwrap().contains("casey"));
    assert_eq!(sb.casual_rotations(false).len(), 6);
    assert_eq!(reload(&sb).casual_vip(), Some("casey"));

    sb.remove_player("casey").unwrap();
    assert_eq!(sb.casual_vip(), None);
}

#[test]
fn random_vip_comes_from_the_pool() {
    let mut sb = board();
    let vip = sb.pick_random_vip().unwrap();
    assert!(sb.casual_pool().contains(&vip));
    assert_eq!(sb.casual_vip(), Some(vip.as_str()));
}

#[test]
fn mode_progress_follows_match_config() {
    let mut sb = board();
    let p = sb.mode_progress(Mode::OneVOne);
    assert_eq!((p.played, p.target, p.complete), (0, 6, false));

    sb.set_match_config(MatchConfig {
        one_v_one: MatchTarget::Count(2),
        ..MatchConfig::default()
    });
    sb.record_one_v_one("alex", "sam", "alex").unwrap();
    sb.record_one_v_one("alex", "sam", "sam").unwrap();
    let p = sb.mode_progress(Mode::OneVOne);
    assert_eq!((p.played, p.target, p.complete), (2, 2, true));

    let p = sb.mode_progress(Mode::Ffa);
    assert_eq!((p.played, p.target, p.complete), (0, 3, false));

    let p = sb.mode_progress(Mode::TeamFf);
    assert_eq!((p.target, p.complete), (3, false));

    sb.set_casual_vip(Some("casey".into())).unwrap();
    let p = sb.mode_progress(Mode::Casual);
    assert_eq!((p.played, p.target, p.complete), (0, 12, false));
}

#[test]
fn match_target_serializes_as_all_or_number() {
    let json = serde_json::to_string(&MatchConfig::default()).unwrap();
    assert_eq!(json, r#"{"1v1":"all","team_ff":"all","team_noff":"all","ffa":3}"#);
    let parsed: MatchConfig =
        serde_json::from_str(r#"{"1v1":4,"team_ff":"all","team_noff":2,"ffa":5}"#).unwrap();
    assert_eq!(parsed.one_v_one, MatchTarget::Count(4));
    assert_eq!(parsed.team_ff, MatchTarget::All);
    assert!(serde_json::from_str::<MatchConfig>(r#"{"1v1":"some","team_ff":1,"team_noff":1,"ffa":1}"#).is_err());
}

#[test]
fn file_store_backs_a_scoreboard() {
    let dir = TempDir::new().unwrap();
    {
        let mut sb = Scoreboard::load(FileStore::open(dir.path()).unwrap());
        sb.record_team(Mode::TeamNoff, ids(&["alex", "sam"]), ids(&["jordan", "riley"]), Team::Two)
            .unwrap();
    }
    let sb = Scoreboard::load(FileStore::open(dir.path()).unwrap());
    assert_eq!(sb.matches().len(), 1);
    assert_eq!(sb.match_store().totals_for("riley").team_noff, 2);
    let played = sb
        .team_rotations(Mode::TeamNoff)
        .iter()
        .filter(|r| r.played > 0)
        .count();
    assert_eq!(played, 1);
}
