//! Single binary web server: static front end from STATIC_DIR, scoreboard via REST.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT, DATA_DIR (where records are saved), STATIC_DIR.

use actix_files::Files;
use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use serde::Deserialize;
use smash_night::{
    CasualSide, FileStore, LeaderboardQuery, MatchConfig, MatchId, Mode, NewPlayer, PlayerId,
    PlayerUpdate, PointsConfig, ScoreError, Scoreboard, Team, TournamentConfig, TournamentId,
};
use std::sync::Mutex;
use std::time::Duration;

/// Shared scoreboard. One lock for everything keeps every read after a write consistent.
type AppState = Data<Mutex<Scoreboard<FileStore>>>;

/// How often records whose save failed are written again.
const SAVE_RETRY_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Portraits arrive inline as encoded strings.
const JSON_LIMIT_BYTES: usize = 8 * 1024 * 1024;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
    persisted: bool,
}

/// Match submitted from the UI; points come from the current points table.
#[derive(Deserialize)]
#[serde(tag = "type")]
enum RecordMatchBody {
    #[serde(rename = "1v1")]
    OneVOne {
        player1: PlayerId,
        player2: PlayerId,
        winner: PlayerId,
    },
    #[serde(rename = "ffa")]
    Ffa { placements: Vec<PlayerId> },
    #[serde(rename = "team_ff")]
    TeamFf {
        team1: Vec<PlayerId>,
        team2: Vec<PlayerId>,
        winner: Team,
    },
    #[serde(rename = "team_noff")]
    TeamNoff {
        team1: Vec<PlayerId>,
        team2: Vec<PlayerId>,
        winner: Team,
    },
    #[serde(rename = "casual")]
    Casual {
        vip: PlayerId,
        protectors: Vec<PlayerId>,
        hunters: Vec<PlayerId>,
        winner: CasualSide,
        #[serde(default, rename = "friendlyFire")]
        friendly_fire: bool,
    },
}

#[derive(Deserialize)]
struct SetImageBody {
    image: Option<String>,
}

#[derive(Deserialize)]
struct SetVipBody {
    vip: Option<PlayerId>,
}

#[derive(Deserialize)]
struct MatchesParams {
    #[serde(rename = "type")]
    mode: Option<Mode>,
}

#[derive(Deserialize)]
struct LeaderboardParams {
    #[serde(default)]
    exclude_casual: bool,
    mode: Option<Mode>,
}

#[derive(Deserialize)]
struct CasualParams {
    #[serde(default)]
    friendly_fire: bool,
}

/// Path segment: player id (e.g. /api/players/{id})
#[derive(Deserialize)]
struct PlayerPath {
    id: PlayerId,
}

#[derive(Deserialize)]
struct MatchPath {
    id: MatchId,
}

#[derive(Deserialize)]
struct ModePath {
    mode: String,
}

#[derive(Deserialize)]
struct HistoryPath {
    id: TournamentId,
}

fn error_response(e: ScoreError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        ScoreError::NotFound(_) => HttpResponse::NotFound().json(body),
        ScoreError::StorageWriteFailure(_) => HttpResponse::InternalServerError().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

fn parse_mode(raw: &str) -> Result<Mode, HttpResponse> {
    raw.parse::<Mode>()
        .map_err(|e| HttpResponse::BadRequest().json(serde_json::json!({ "error": e })))
}

#[get("/api/health")]
async fn api_health(state: AppState) -> impl Responder {
    let persisted = state.lock().map(|g| g.is_persisted()).unwrap_or(false);
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "smash-night",
        persisted,
    })
}

/// Avoid 404 in browser tab: favicon not required for app logic.
#[get("/favicon.ico")]
async fn favicon() -> HttpResponse {
    HttpResponse::NoContent().finish()
}

#[get("/api/players")]
async fn api_list_players(state: AppState) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.players())
}

#[post("/api/players")]
async fn api_add_player(state: AppState, body: Json<NewPlayer>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.add_player(body.into_inner()) {
        Ok(player) => HttpResponse::Ok().json(player),
        Err(e) => error_response(e),
    }
}

#[put("/api/players/{id}")]
async fn api_update_player(state: AppState, path: Path<PlayerPath>, body: Json<PlayerUpdate>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.update_player(&path.id, body.into_inner()) {
        Ok(player) => HttpResponse::Ok().json(player),
        Err(e) => error_response(e),
    }
}

#[delete("/api/players/{id}")]
async fn api_remove_player(state: AppState, path: Path<PlayerPath>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.remove_player(&path.id) {
        Ok(player) => HttpResponse::Ok().json(player),
        Err(e) => error_response(e),
    }
}

#[put("/api/players/{id}/image")]
async fn api_set_player_image(state: AppState, path: Path<PlayerPath>, body: Json<SetImageBody>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.set_player_image(&path.id, body.into_inner().image) {
        Ok(()) => HttpResponse::Ok().json(g.player(&path.id)),
        Err(e) => error_response(e),
    }
}

/// Restore the built-in roster.
#[post("/api/players/reset")]
async fn api_reset_players(state: AppState) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    g.reset_players();
    HttpResponse::Ok().json(g.players())
}

/// Match log, optionally one mode only (most recent first).
#[get("/api/matches")]
async fn api_list_matches(state: AppState, params: Query<MatchesParams>) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match params.mode {
        Some(mode) => HttpResponse::Ok().json(g.matches_by_type(mode)),
        None => HttpResponse::Ok().json(g.matches()),
    }
}

#[post("/api/matches")]
async fn api_record_match(state: AppState, body: Json<RecordMatchBody>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let result = match body.into_inner() {
        RecordMatchBody::OneVOne {
            player1,
            player2,
            winner,
        } => g.record_one_v_one(&player1, &player2, &winner),
        RecordMatchBody::Ffa { placements } => g.record_ffa(&placements),
        RecordMatchBody::TeamFf { team1, team2, winner } => {
            g.record_team(Mode::TeamFf, team1, team2, winner)
        }
        RecordMatchBody::TeamNoff { team1, team2, winner } => {
            g.record_team(Mode::TeamNoff, team1, team2, winner)
        }
        RecordMatchBody::Casual {
            vip,
            protectors,
            hunters,
            winner,
            friendly_fire,
        } => g.record_casual(&vip, protectors, hunters, winner, friendly_fire),
    };
    match result {
        Ok(m) => HttpResponse::Ok().json(m),
        Err(e) => error_response(e),
    }
}

/// Undo the most recent match; `null` when there was nothing to undo.
#[post("/api/matches/undo")]
async fn api_undo_match(state: AppState) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.undo_last_match())
}

#[delete("/api/matches/{id}")]
async fn api_remove_match(state: AppState, path: Path<MatchPath>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.remove_match(path.id) {
        Ok(m) => HttpResponse::Ok().json(m),
        Err(e) => error_response(e),
    }
}

#[get("/api/leaderboard")]
async fn api_leaderboard(state: AppState, params: Query<LeaderboardParams>) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.display_leaderboard(params.exclude_casual, params.mode))
}

#[get("/api/rotations/1v1")]
async fn api_one_v_one_rotations(state: AppState) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let rotations = g.one_v_one_rotations();
    HttpResponse::Ok().json(serde_json::json!({
        "complete": smash_night::is_complete(&rotations),
        "rotations": rotations,
    }))
}

#[get("/api/rotations/team/{mode}")]
async fn api_team_rotations(state: AppState, path: Path<ModePath>) -> HttpResponse {
    let mode = match parse_mode(&path.mode) {
        Ok(m) if m.is_team() => m,
        Ok(m) => {
            return HttpResponse::BadRequest()
                .json(serde_json::json!({ "error": format!("{} is not a team mode", m) }))
        }
        Err(resp) => return resp,
    };
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let rotations = g.team_rotations(mode);
    HttpResponse::Ok().json(serde_json::json!({
        "complete": smash_night::is_complete(&rotations),
        "rotations": rotations,
    }))
}

#[get("/api/rotations/casual")]
async fn api_casual_rotations(state: AppState, params: Query<CasualParams>) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let rotations = g.casual_rotations(params.friendly_fire);
    HttpResponse::Ok().json(serde_json::json!({
        "vip": g.casual_vip(),
        "complete": smash_night::is_complete(&rotations),
        "rotations": rotations,
    }))
}

#[get("/api/progress/{mode}")]
async fn api_mode_progress(state: AppState, path: Path<ModePath>) -> HttpResponse {
    let mode = match parse_mode(&path.mode) {
        Ok(m) => m,
        Err(resp) => return resp,
    };
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(serde_json::json!({
        "progress": g.mode_progress(mode),
        "nextMode": g.next_mode(mode),
    }))
}

#[put("/api/casual/vip")]
async fn api_set_vip(state: AppState, body: Json<SetVipBody>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.set_casual_vip(body.into_inner().vip) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "vip": g.casual_vip() })),
        Err(e) => error_response(e),
    }
}

#[post("/api/casual/vip/random")]
async fn api_random_vip(state: AppState) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let vip = g.pick_random_vip();
    HttpResponse::Ok().json(serde_json::json!({ "vip": vip }))
}

#[get("/api/settings")]
async fn api_get_settings(state: AppState) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.settings())
}

#[put("/api/settings/points")]
async fn api_set_points(state: AppState, body: Json<PointsConfig>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.set_points_config(body.into_inner()) {
        Ok(()) => HttpResponse::Ok().json(g.settings()),
        Err(e) => error_response(e),
    }
}

#[put("/api/settings/matches")]
async fn api_set_match_config(state: AppState, body: Json<MatchConfig>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    g.set_match_config(body.into_inner());
    HttpResponse::Ok().json(g.settings())
}

#[get("/api/tournament")]
async fn api_get_tournament(state: AppState) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.tournament())
}

/// Start a tournament (resets all scores).
#[post("/api/tournament/start")]
async fn api_start_tournament(state: AppState, body: Json<TournamentConfig>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.start_tournament(body.into_inner()) {
        Ok(()) => HttpResponse::Ok().json(g.tournament()),
        Err(e) => error_response(e),
    }
}

/// End the tournament; returns the archived entry or `null` if none was active.
#[post("/api/tournament/end")]
async fn api_end_tournament(state: AppState) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.end_tournament())
}

#[post("/api/tournament/cancel")]
async fn api_cancel_tournament(state: AppState) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let cancelled = g.cancel_tournament();
    HttpResponse::Ok().json(serde_json::json!({ "cancelled": cancelled }))
}

#[get("/api/tournament/history")]
async fn api_tournament_history(state: AppState) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.history())
}

#[delete("/api/tournament/history/{id}")]
async fn api_delete_history(state: AppState, path: Path<HistoryPath>) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.delete_history_entry(path.id) {
        Ok(entry) => HttpResponse::Ok().json(entry),
        Err(e) => error_response(e),
    }
}

#[get("/api/export")]
async fn api_export(state: AppState) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.export_json() {
        Ok(blob) => HttpResponse::Ok()
            .content_type("application/json")
            .insert_header(("Content-Disposition", "attachment; filename=\"smash-night.json\""))
            .body(blob),
        Err(e) => error_response(e),
    }
}

#[get("/api/export/leaderboard.csv")]
async fn api_export_leaderboard_csv(state: AppState, params: Query<LeaderboardParams>) -> HttpResponse {
    let g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let query = LeaderboardQuery {
        exclude_casual_players: params.exclude_casual,
        mode_filter: params.mode,
        players: g.tournament().player_subset().map(<[PlayerId]>::to_vec),
    };
    match g.leaderboard_csv(&query) {
        Ok(csv) => HttpResponse::Ok().content_type("text/csv; charset=utf-8").body(csv),
        Err(e) => error_response(e),
    }
}

/// Replace all data from an exported blob; rejected blobs change nothing.
#[post("/api/import")]
async fn api_import(state: AppState, body: String) -> HttpResponse {
    let mut g = match state.lock() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.import_json(&body) {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "ok": true, "matches": g.matches().len() })),
        Err(e) => error_response(e),
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn open_store() -> std::io::Result<FileStore> {
    let store = match std::env::var("DATA_DIR") {
        Ok(dir) => FileStore::open(dir),
        Err(_) => FileStore::open_default(),
    };
    store.map_err(|e| std::io::Error::other(e.to_string()))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let static_dir = std::env::var("STATIC_DIR").unwrap_or_else(|_| "static".to_string());

    let store = open_store()?;
    log::info!("Saving data under {}", store.dir().display());
    let state = Data::new(Mutex::new(Scoreboard::load(store)));

    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    // Background task: periodically rewrite records whose last save failed
    let state_retry = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(SAVE_RETRY_INTERVAL);
        loop {
            interval.tick().await;
            let mut g = match state_retry.lock() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            if g.is_persisted() {
                continue;
            }
            match g.retry_unsaved() {
                Ok(()) => log::info!("Saved records that previously failed to write"),
                Err(e) => log::warn!("Retrying save failed: {}", e),
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(web::JsonConfig::default().limit(JSON_LIMIT_BYTES))
            .app_data(web::PayloadConfig::default().limit(JSON_LIMIT_BYTES))
            .service(api_health)
            .service(favicon)
            .service(api_list_players)
            .service(api_reset_players)
            .service(api_add_player)
            .service(api_update_player)
            .service(api_remove_player)
            .service(api_set_player_image)
            .service(api_list_matches)
            .service(api_undo_match)
            .service(api_record_match)
            .service(api_remove_match)
            .service(api_leaderboard)
            .service(api_one_v_one_rotations)
            .service(api_team_rotations)
            .service(api_casual_rotations)
            .service(api_mode_progress)
            .service(api_random_vip)
            .service(api_set_vip)
            .service(api_get_settings)
            .service(api_set_points)
            .service(api_set_match_config)
            .service(api_get_tournament)
            .service(api_start_tournament)
            .service(api_end_tournament)
            .service(api_cancel_tournament)
            .service(api_tournament_history)
            .service(api_delete_history)
            .service(api_export_leaderboard_csv)
            .service(api_export)
            .service(api_import)
            .service(Files::new("/", static_dir.clone()).index_file("index.html"))
    })
    .bind(bind)?
    .run()
    .await
}
