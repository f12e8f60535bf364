//! The scoreboard: one object owning every store, the single in-memory source
//! of truth. Every mutating call flushes the records it touched to storage
//! before returning, then notifies subscribers.

use crate::events::{ChangeEvent, SubscriptionId, Subscribers};
use crate::logic::{
    self, build_leaderboard, casual_rotations, is_complete, leaderboard_csv, one_v_one_rotations,
    scoring, team_rotations, CasualRotation, LeaderboardEntry, LeaderboardQuery, MatchStore,
    Pairing, PlayerRegistry, Rotation, TeamRotation,
};
use crate::models::{
    default_roster, CasualSide, Match, MatchConfig, MatchId, MatchPayload, MatchTarget, Mode,
    NewPlayer, Player, PlayerId, PlayerUpdate, PointsConfig, ScoreError, Settings, Team, Tournament,
    TournamentConfig, TournamentHistoryEntry, TournamentId,
};
use crate::storage::{
    load_json, save_json, DataRecord, KeyValueStore, StorageError, CASUAL_VIP_KEY, DATA_KEY,
    IMAGES_KEY, PLAYERS_KEY, TOURNAMENT_KEY,
};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Persisted records, one storage key each.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Record {
    Data,
    Players,
    Images,
    CasualVip,
    Tournament,
}

impl Record {
    const ALL: [Record; 5] = [
        Record::Data,
        Record::Players,
        Record::Images,
        Record::CasualVip,
        Record::Tournament,
    ];
}

/// Export blob: the main record plus the player list (without portraits).
/// Write-only: integer map keys do not survive serde's flatten buffering, so
/// import reads the two halves separately.
#[derive(Serialize)]
struct ExportRecord<'a> {
    #[serde(flatten)]
    data: &'a DataRecord,
    players: &'a [Player],
}

/// How far a mode's rotation has come.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
pub struct ModeProgress {
    pub mode: Mode,
    /// Played rotation candidates (for "all" targets) or matches played.
    pub played: usize,
    pub target: usize,
    pub complete: bool,
}

pub struct Scoreboard<S: KeyValueStore> {
    storage: S,
    registry: PlayerRegistry,
    store: MatchStore,
    settings: Settings,
    tournament: Tournament,
    history: Vec<TournamentHistoryEntry>,
    casual_vip: Option<PlayerId>,
    subscribers: Subscribers,
    /// Records whose last write failed.
    unsaved: Vec<Record>,
}

impl<S: KeyValueStore> Scoreboard<S> {
    /// Load everything from `storage`. Missing or malformed records fall back
    /// to defaults: the built-in roster, zeroed totals, default settings.
    pub fn load(storage: S) -> Self {
        let images: BTreeMap<PlayerId, String> =
            load_json(&storage, IMAGES_KEY).unwrap_or_default();
        let players: Vec<Player> =
            load_json(&storage, PLAYERS_KEY).unwrap_or_else(default_roster);
        let registry = PlayerRegistry::from_parts(players, images);
        let (store, history, settings) = match load_json::<DataRecord>(&storage, DATA_KEY) {
            Some(data) => (
                MatchStore::from_parts(data.matches, data.stats),
                data.tournament_history,
                data.settings,
            ),
            None => {
                let mut store = MatchStore::new();
                store.reset_season(&player_ids(&registry));
                (store, Vec::new(), Settings::default())
            }
        };
        let tournament: Tournament = load_json(&storage, TOURNAMENT_KEY).unwrap_or_default();
        let casual_vip: Option<PlayerId> = load_json::<Option<PlayerId>>(&storage, CASUAL_VIP_KEY)
            .flatten()
            .filter(|id| registry.contains(id));

        log::info!(
            "Loaded {} players and {} matches",
            registry.players().len(),
            store.matches().len()
        );
        Self {
            storage,
            registry,
            store,
            settings,
            tournament,
            history,
            casual_vip,
            subscribers: Subscribers::default(),
            unsaved: Vec::new(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    // ---- persistence ----

    fn write_record(&mut self, record: Record) -> Result<(), StorageError> {
        match record {
            Record::Data => {
                let data = self.data_record();
                save_json(&mut self.storage, DATA_KEY, &data)
            }
            Record::Players => {
                save_json(&mut self.storage, PLAYERS_KEY, &self.registry.without_images())
            }
            Record::Images => save_json(&mut self.storage, IMAGES_KEY, &self.registry.images()),
            Record::CasualVip => save_json(&mut self.storage, CASUAL_VIP_KEY, &self.casual_vip),
            Record::Tournament => save_json(&mut self.storage, TOURNAMENT_KEY, &self.tournament),
        }
    }

    /// Write `records`, remembering failures. In-memory state is kept either way.
    fn flush(&mut self, records: &[Record]) -> Result<(), ScoreError> {
        let mut first_err = None;
        for &record in records {
            match self.write_record(record) {
                Ok(()) => self.unsaved.retain(|r| *r != record),
                Err(e) => {
                    log::warn!("Failed to save {:?} record: {}", record, e);
                    if !self.unsaved.contains(&record) {
                        self.unsaved.push(record);
                    }
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }

    /// Flush after a mutation: failures are logged and tracked, not returned.
    fn flush_quietly(&mut self, records: &[Record]) {
        let _ = self.flush(records);
    }

    /// Write every record. Returns the first storage failure.
    pub fn save(&mut self) -> Result<(), ScoreError> {
        self.flush(&Record::ALL)
    }

    /// Retry only the records whose last write failed.
    pub fn retry_unsaved(&mut self) -> Result<(), ScoreError> {
        let pending = self.unsaved.clone();
        self.flush(&pending)
    }

    /// True when every record's last write succeeded.
    pub fn is_persisted(&self) -> bool {
        self.unsaved.is_empty()
    }

    fn data_record(&self) -> DataRecord {
        DataRecord {
            matches: self.store.matches().to_vec(),
            stats: self.store.stats().to_vec(),
            tournament_history: self.history.clone(),
            settings: self.settings.clone(),
        }
    }

    // ---- subscriptions ----

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(ChangeEvent) + Send + 'static,
    ) -> SubscriptionId {
        self.subscribers.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // ---- players ----

    pub fn registry(&self) -> &PlayerRegistry {
        &self.registry
    }

    pub fn players(&self) -> &[Player] {
        self.registry.players()
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.registry.get(id)
    }

    pub fn main_players(&self) -> Vec<PlayerId> {
        self.registry.main_players()
    }

    pub fn add_player(&mut self, data: NewPlayer) -> Result<Player, ScoreError> {
        let player = self.registry.add_player(data)?;
        self.flush_quietly(&[Record::Players]);
        self.subscribers.notify(ChangeEvent::PlayerData);
        Ok(player)
    }

    pub fn update_player(&mut self, id: &str, updates: PlayerUpdate) -> Result<Player, ScoreError> {
        let player = self.registry.update_player(id, updates)?;
        self.flush_quietly(&[Record::Players]);
        self.subscribers.notify(ChangeEvent::PlayerData);
        Ok(player)
    }

    /// Remove a player and their portrait. Their recorded points stay in the totals.
    pub fn remove_player(&mut self, id: &str) -> Result<Player, ScoreError> {
        let player = self.registry.remove_player(id)?;
        let mut records = vec![Record::Players, Record::Images];
        if self.casual_vip.as_deref() == Some(id) {
            self.casual_vip = None;
            records.push(Record::CasualVip);
        }
        self.flush_quietly(&records);
        self.subscribers.notify(ChangeEvent::PlayerData);
        Ok(player)
    }

    pub fn set_player_image(&mut self, id: &str, image: Option<String>) -> Result<(), ScoreError> {
        self.registry.set_player_image(id, image)?;
        self.flush_quietly(&[Record::Images]);
        self.subscribers.notify(ChangeEvent::PlayerData);
        Ok(())
    }

    /// Restore the built-in roster, dropping custom players and every portrait.
    pub fn reset_players(&mut self) {
        self.registry.reset_players();
        let mut records = vec![Record::Players, Record::Images];
        if self.casual_vip.as_ref().is_some_and(|v| !self.registry.contains(v)) {
            self.casual_vip = None;
            records.push(Record::CasualVip);
        }
        self.flush_quietly(&records);
        self.subscribers.notify(ChangeEvent::PlayerData);
    }

    // ---- matches ----

    pub fn match_store(&self) -> &MatchStore {
        &self.store
    }

    pub fn matches(&self) -> &[Match] {
        self.store.matches()
    }

    /// Matches of one mode, most recent first.
    pub fn matches_by_type(&self, mode: Mode) -> Vec<&Match> {
        self.store.matches_by_type(mode)
    }

    /// Validate and append a match, applying its points.
    pub fn add_match(&mut self, payload: MatchPayload) -> Result<Match, ScoreError> {
        scoring::validate_payload(&payload)?;
        if let Some(unknown) = payload
            .participants()
            .into_iter()
            .find(|p| !self.registry.contains(p))
        {
            return Err(ScoreError::NotFound(format!("player '{}'", unknown)));
        }
        let record = self.store.add_match(payload);
        self.flush_quietly(&[Record::Data]);
        self.subscribers.notify(ChangeEvent::MatchData);
        Ok(record)
    }

    /// Record a 1v1 using the current points table.
    pub fn record_one_v_one(
        &mut self,
        player1: &str,
        player2: &str,
        winner: &str,
    ) -> Result<Match, ScoreError> {
        let payload = scoring::one_v_one(&self.settings.points, player1, player2, winner)?;
        self.add_match(payload)
    }

    /// Record a free-for-all; `placements[0]` finished first.
    pub fn record_ffa(&mut self, placements: &[PlayerId]) -> Result<Match, ScoreError> {
        let payload = scoring::ffa(&self.settings.points, placements)?;
        self.add_match(payload)
    }

    pub fn record_team(
        &mut self,
        mode: Mode,
        team1: Vec<PlayerId>,
        team2: Vec<PlayerId>,
        winner: Team,
    ) -> Result<Match, ScoreError> {
        let payload = scoring::team(&self.settings.points, mode, team1, team2, winner)?;
        self.add_match(payload)
    }

    pub fn record_casual(
        &mut self,
        vip: &str,
        protectors: Vec<PlayerId>,
        hunters: Vec<PlayerId>,
        winner: CasualSide,
        friendly_fire: bool,
    ) -> Result<Match, ScoreError> {
        let payload = scoring::casual(
            &self.settings.points,
            vip,
            protectors,
            hunters,
            winner,
            friendly_fire,
        )?;
        self.add_match(payload)
    }

    /// Undo the most recent match. None (and no change) when there is nothing to undo.
    pub fn undo_last_match(&mut self) -> Option<Match> {
        let undone = self.store.undo_last_match()?;
        self.flush_quietly(&[Record::Data]);
        self.subscribers.notify(ChangeEvent::MatchData);
        Some(undone)
    }

    pub fn remove_match(&mut self, id: MatchId) -> Result<Match, ScoreError> {
        let removed = self.store.remove_match(id)?;
        self.flush_quietly(&[Record::Data]);
        self.subscribers.notify(ChangeEvent::MatchData);
        Ok(removed)
    }

    /// Clear every match and zero totals for the whole roster.
    pub fn reset_season(&mut self) {
        self.store.reset_season(&player_ids(&self.registry));
        log::info!("Season reset");
        self.flush_quietly(&[Record::Data]);
        self.subscribers.notify(ChangeEvent::MatchData);
    }

    // ---- leaderboard ----

    pub fn leaderboard(&self, query: &LeaderboardQuery) -> Vec<LeaderboardEntry> {
        build_leaderboard(self.store.stats(), &self.registry, query)
    }

    /// Leaderboard as shown to players: restricted to the current (or just
    /// ended) tournament's players when there is one.
    pub fn display_leaderboard(
        &self,
        exclude_casual_players: bool,
        mode_filter: Option<Mode>,
    ) -> Vec<LeaderboardEntry> {
        self.leaderboard(&LeaderboardQuery {
            exclude_casual_players,
            mode_filter,
            players: self.tournament.player_subset().map(<[PlayerId]>::to_vec),
        })
    }

    pub fn leaderboard_csv(&self, query: &LeaderboardQuery) -> Result<String, ScoreError> {
        leaderboard_csv(&self.leaderboard(query))
            .map_err(|e| ScoreError::InvalidConfig(format!("csv export failed: {}", e)))
    }

    // ---- rotations ----

    /// Main players in scope of the current tournament, registry order.
    pub fn rotation_roster(&self) -> Vec<PlayerId> {
        self.registry
            .main_players()
            .into_iter()
            .filter(|id| self.tournament.is_player_in_scope(id))
            .collect()
    }

    /// Every player in scope, main or casual. The casual mode draws from this pool.
    pub fn casual_pool(&self) -> Vec<PlayerId> {
        self.registry
            .players()
            .iter()
            .filter(|p| self.tournament.is_player_in_scope(&p.id))
            .map(|p| p.id.clone())
            .collect()
    }

    pub fn one_v_one_rotations(&self) -> Vec<Pairing> {
        one_v_one_rotations(&self.rotation_roster(), self.store.matches())
    }

    pub fn team_rotations(&self, mode: Mode) -> Vec<TeamRotation> {
        if !mode.is_team() {
            return Vec::new();
        }
        team_rotations(&self.rotation_roster(), self.store.matches(), mode)
    }

    /// VIP rotations for one friendly-fire setting. Empty until a VIP is chosen.
    pub fn casual_rotations(&self, friendly_fire: bool) -> Vec<CasualRotation> {
        match &self.casual_vip {
            Some(vip) => {
                casual_rotations(vip, &self.casual_pool(), self.store.matches(), friendly_fire)
            }
            None => Vec::new(),
        }
    }

    pub fn all_one_v_one_complete(&self) -> bool {
        is_complete(&self.one_v_one_rotations())
    }

    pub fn all_team_rotations_complete(&self, mode: Mode) -> bool {
        is_complete(&self.team_rotations(mode))
    }

    /// Progress toward the configured target for `mode`.
    pub fn mode_progress(&self, mode: Mode) -> ModeProgress {
        fn from_rotations<R: Rotation>(mode: Mode, rotations: &[R]) -> ModeProgress {
            ModeProgress {
                mode,
                played: rotations.iter().filter(|r| r.is_played()).count(),
                target: rotations.len(),
                complete: is_complete(rotations),
            }
        }

        if mode == Mode::Casual {
            let mut rotations = self.casual_rotations(false);
            let with_ff = self.casual_rotations(true);
            let complete = is_complete(&rotations) && is_complete(&with_ff);
            rotations.extend(with_ff);
            return ModeProgress {
                complete,
                ..from_rotations(mode, &rotations)
            };
        }

        match self.settings.match_config.target(mode) {
            MatchTarget::All if mode == Mode::OneVOne => {
                from_rotations(mode, &self.one_v_one_rotations())
            }
            MatchTarget::All => from_rotations(mode, &self.team_rotations(mode)),
            MatchTarget::Count(n) => {
                let played = self.store.matches_by_type(mode).len();
                ModeProgress {
                    mode,
                    played,
                    target: n as usize,
                    complete: played >= n as usize,
                }
            }
        }
    }

    // ---- casual VIP ----

    pub fn casual_vip(&self) -> Option<&str> {
        self.casual_vip.as_deref()
    }

    /// Choose (or clear) the sticky casual VIP.
    pub fn set_casual_vip(&mut self, vip: Option<PlayerId>) -> Result<(), ScoreError> {
        if let Some(id) = &vip {
            if !self.registry.contains(id) {
                return Err(ScoreError::NotFound(format!("player '{}'", id)));
            }
        }
        self.casual_vip = vip;
        self.flush_quietly(&[Record::CasualVip]);
        self.subscribers.notify(ChangeEvent::Settings);
        Ok(())
    }

    /// Pick a random VIP from the casual pool. None when the pool is empty.
    pub fn pick_random_vip(&mut self) -> Option<PlayerId> {
        let vip = self.casual_pool().choose(&mut rand::thread_rng()).cloned()?;
        self.casual_vip = Some(vip.clone());
        self.flush_quietly(&[Record::CasualVip]);
        self.subscribers.notify(ChangeEvent::Settings);
        Some(vip)
    }

    // ---- settings ----

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the points table. Matches already recorded keep their points.
    /// Replace the points table. Out-of-range values are rejected unchanged.
    pub fn set_points_config(&mut self, points: PointsConfig) -> Result<(), ScoreError> {
        points.validate()?;
        self.settings.points = points;
        self.flush_quietly(&[Record::Data]);
        self.subscribers.notify(ChangeEvent::Settings);
        Ok(())
    }

    pub fn set_match_config(&mut self, match_config: MatchConfig) {
        self.settings.match_config = match_config;
        self.flush_quietly(&[Record::Data]);
        self.subscribers.notify(ChangeEvent::Settings);
    }

    // ---- tournament ----

    pub fn tournament(&self) -> &Tournament {
        &self.tournament
    }

    pub fn history(&self) -> &[TournamentHistoryEntry] {
        &self.history
    }

    pub fn is_player_in_scope(&self, id: &str) -> bool {
        self.tournament.is_player_in_scope(id)
    }

    pub fn is_mode_in_scope(&self, mode: Mode) -> bool {
        self.tournament.is_mode_in_scope(mode)
    }

    pub fn next_mode(&self, current: Mode) -> Option<Mode> {
        self.tournament.next_mode(current)
    }

    /// Start a tournament. Resets the season first.
    pub fn start_tournament(&mut self, config: TournamentConfig) -> Result<(), ScoreError> {
        let roster = player_ids(&self.registry);
        logic::start_tournament(&mut self.tournament, &mut self.store, &roster, config)?;
        self.flush_quietly(&[Record::Data, Record::Tournament]);
        self.subscribers.notify(ChangeEvent::MatchData);
        self.subscribers.notify(ChangeEvent::Tournament);
        Ok(())
    }

    /// End the active tournament, archiving its ranking. None when none is active.
    pub fn end_tournament(&mut self) -> Option<TournamentHistoryEntry> {
        let entry = logic::end_tournament(&mut self.tournament, &self.store)?;
        self.history.push(entry.clone());
        self.flush_quietly(&[Record::Data, Record::Tournament]);
        self.subscribers.notify(ChangeEvent::Tournament);
        Some(entry)
    }

    /// Discard the active tournament without archiving, or clear an ended one.
    /// Matches stand.
    pub fn cancel_tournament(&mut self) -> bool {
        if !logic::cancel_tournament(&mut self.tournament) {
            return false;
        }
        self.flush_quietly(&[Record::Tournament]);
        self.subscribers.notify(ChangeEvent::Tournament);
        true
    }

    pub fn delete_history_entry(
        &mut self,
        id: TournamentId,
    ) -> Result<TournamentHistoryEntry, ScoreError> {
        let idx = self
            .history
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| ScoreError::NotFound(format!("tournament {}", id)))?;
        let entry = self.history.remove(idx);
        self.flush_quietly(&[Record::Data]);
        self.subscribers.notify(ChangeEvent::Tournament);
        Ok(entry)
    }

    // ---- import / export ----

    /// Serialize the main record and the player list to one JSON blob.
    pub fn export_json(&self) -> Result<String, ScoreError> {
        let data = self.data_record();
        let players = self.registry.without_images();
        let blob = ExportRecord {
            data: &data,
            players: &players,
        };
        serde_json::to_string_pretty(&blob)
            .map_err(|e| ScoreError::InvalidConfig(format!("export failed: {}", e)))
    }

    /// Replace state from an exported blob. The blob must contain `matches`
    /// and `stats`; anything unusable is rejected without touching current state.
    /// Totals are rebuilt from the imported matches; `stats` only seeds the
    /// player order.
    pub fn import_json(&mut self, raw: &str) -> Result<(), ScoreError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| ScoreError::InvalidConfig(format!("not valid JSON: {}", e)))?;
        for field in ["matches", "stats"] {
            if value.get(field).is_none() {
                return Err(ScoreError::InvalidConfig(format!("missing '{}'", field)));
            }
        }
        let malformed =
            |e: serde_json::Error| ScoreError::InvalidConfig(format!("malformed data: {}", e));
        let data: DataRecord = serde_json::from_str(raw).map_err(malformed)?;
        let players: Option<Vec<Player>> = match value.get("players") {
            Some(v) => Some(Vec::<Player>::deserialize(v).map_err(malformed)?),
            None => None,
        };
        for m in &data.matches {
            scoring::validate_payload(&m.payload).map_err(|e| {
                ScoreError::InvalidConfig(format!("match {} is invalid: {}", m.id, e))
            })?;
        }

        let order: Vec<PlayerId> = data.stats.iter().map(|s| s.player.clone()).collect();
        let store = MatchStore::replay(data.matches, &order);
        if store.stats() != data.stats.as_slice() {
            log::warn!("Imported totals disagree with imported matches, using recomputed totals");
        }
        self.store = store;
        self.history = data.tournament_history;
        self.settings = data.settings;
        let mut records = vec![Record::Data];
        if let Some(players) = players {
            let images = self.registry.images();
            self.registry = PlayerRegistry::from_parts(players, images);
            records.extend([Record::Players, Record::Images]);
            if self.casual_vip.as_ref().is_some_and(|v| !self.registry.contains(v)) {
                self.casual_vip = None;
                records.push(Record::CasualVip);
            }
        }
        log::info!("Imported {} matches", self.store.matches().len());
        self.flush_quietly(&records);
        self.subscribers.notify(ChangeEvent::MatchData);
        self.subscribers.notify(ChangeEvent::Settings);
        self.subscribers.notify(ChangeEvent::Tournament);
        if records.contains(&Record::Players) {
            self.subscribers.notify(ChangeEvent::PlayerData);
        }
        Ok(())
    }
}

impl<S: KeyValueStore + std::fmt::Debug> std::fmt::Debug for Scoreboard<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scoreboard")
            .field("storage", &self.storage)
            .field("players", &self.registry.players().len())
            .field("matches", &self.store.matches().len())
            .field("tournament", &self.tournament)
            .field("subscribers", &self.subscribers)
            .finish()
    }
}

fn player_ids(registry: &PlayerRegistry) -> Vec<PlayerId> {
    registry.players().iter().map(|p| p.id.clone()).collect()
}
