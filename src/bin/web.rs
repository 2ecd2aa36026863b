//! Web server exposing the tournament engine as a JSON API.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST, PORT. TOURNAMENT_CONFIG points at an engine config JSON file;
//! TOURNAMENT_DATA at a snapshot file that is loaded on start and rewritten after every change.

use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::RwLock;
use tournament_pairing::{
    add_player, confirm_result, create_tournament, delete_player, delete_tournament,
    export_csv, finalize_tournament, generate_swiss_round, get_direct_encounter, get_results,
    get_standings, get_tiebreak_values, has_point_ties, join_player, lock_match,
    rebuild_swiss_round, remove_player, rename_player, rename_tournament, reset_tournament,
    round_matches, rounds, start_tournament, submit_result, unlock_match, EngineConfig,
    ErrorKind, FinalizeMode, MatchId, MatchResult, MemoryStore, PairingSystem, PlayerId,
    Storage, Tiebreaker, TournamentError, TournamentId,
};

/// Everything the handlers share: the store, the engine config and where to snapshot.
struct AppState {
    store: MemoryStore,
    config: EngineConfig,
    data_path: Option<PathBuf>,
}

impl AppState {
    fn persist(&self) -> Result<(), TournamentError> {
        match &self.data_path {
            Some(path) => self.store.save_to(path),
            None => Ok(()),
        }
    }
}

type SharedState = Data<RwLock<AppState>>;

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    /// Overrides the configured pairing system for this tournament.
    #[serde(default)]
    pairing_system: Option<PairingSystem>,
}

#[derive(Deserialize)]
struct NameBody {
    name: String,
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
    #[serde(default)]
    seed: i32,
}

#[derive(Deserialize)]
struct ResultBody {
    result: MatchResult,
    /// Lock the match in the same step.
    #[serde(default)]
    lock: bool,
}

#[derive(Deserialize, Default)]
struct FinalizeBody {
    #[serde(default)]
    mode: FinalizeMode,
}

#[derive(Deserialize)]
struct EncounterQuery {
    a: PlayerId,
    b: PlayerId,
}

#[derive(Serialize)]
struct TiebreakerInfo {
    id: Tiebreaker,
    name: &'static str,
    description: &'static str,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and player id
#[derive(Deserialize)]
struct TournamentPlayerPath {
    id: TournamentId,
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct PlayerPath {
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct MatchPath {
    id: TournamentId,
    match_id: MatchId,
}

#[derive(Deserialize)]
struct RoundPath {
    id: TournamentId,
    round: u32,
}

fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e.kind() {
        ErrorKind::Validation => HttpResponse::BadRequest().json(body),
        ErrorKind::State => HttpResponse::Conflict().json(body),
        ErrorKind::NotFound => HttpResponse::NotFound().json(body),
        ErrorKind::Persistence => {
            log::error!("Storage error: {}", e);
            HttpResponse::InternalServerError().json(body)
        }
    }
}

fn respond<T: Serialize>(result: Result<T, TournamentError>) -> HttpResponse {
    match result {
        Ok(value) => HttpResponse::Ok().json(value),
        Err(e) => error_response(&e),
    }
}

/// Run a read-only query against the store.
fn query<T, F>(state: &SharedState, f: F) -> HttpResponse
where
    T: Serialize,
    F: FnOnce(&AppState) -> Result<T, TournamentError>,
{
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    respond(f(&g))
}

/// Run a change against the store and write the snapshot if it went through.
/// A failed snapshot write undoes the change in memory too.
fn mutate<T, F>(state: &SharedState, f: F) -> HttpResponse
where
    T: Serialize,
    F: FnOnce(&mut MemoryStore, &EngineConfig) -> Result<T, TournamentError>,
{
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let app = &mut *g;
    let before = app.data_path.is_some().then(|| app.store.clone());
    let result = f(&mut app.store, &app.config).and_then(|value| {
        app.persist()?;
        Ok(value)
    });
    if result.is_err() {
        if let Some(before) = before {
            app.store = before;
        }
    }
    respond(result)
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tournament-pairing",
    })
}

/// Selectable tiebreak metrics with their display names.
#[get("/api/tiebreakers")]
async fn api_tiebreakers() -> HttpResponse {
    let list: Vec<TiebreakerInfo> = Tiebreaker::ALL
        .iter()
        .map(|&t| TiebreakerInfo {
            id: t,
            name: t.name(),
            description: t.description(),
        })
        .collect();
    HttpResponse::Ok().json(list)
}

#[get("/api/tournaments")]
async fn api_list_tournaments(state: SharedState) -> HttpResponse {
    query(&state, |app| app.store.tournaments())
}

/// Create a tournament in Setup.
#[post("/api/tournaments")]
async fn api_create_tournament(state: SharedState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    mutate(&state, |store, config| {
        let mut config = config.clone();
        if let Some(system) = body.pairing_system {
            config.pairing_system = system;
        }
        create_tournament(store, &config, &body.name, chrono::Utc::now())
    })
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    query(&state, |app| app.store.tournament(path.id))
}

#[put("/api/tournaments/{id}")]
async fn api_rename_tournament(
    state: SharedState,
    path: Path<TournamentPath>,
    body: Json<NameBody>,
) -> HttpResponse {
    mutate(&state, |store, _| rename_tournament(store, path.id, &body.name))
}

/// Delete a tournament with its matches and results.
#[delete("/api/tournaments/{id}")]
async fn api_delete_tournament(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    mutate(&state, |store, _| delete_tournament(store, path.id))
}

#[get("/api/tournaments/{id}/players")]
async fn api_roster(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    query(&state, |app| app.store.roster(path.id))
}

/// Add a player (tournament must be in Setup).
#[post("/api/tournaments/{id}/players")]
async fn api_add_player(
    state: SharedState,
    path: Path<TournamentPath>,
    body: Json<AddPlayerBody>,
) -> HttpResponse {
    mutate(&state, |store, _| add_player(store, path.id, &body.name, body.seed))
}

/// Register an existing player (tournament must be in Setup).
#[post("/api/tournaments/{id}/players/{player_id}")]
async fn api_join_player(state: SharedState, path: Path<TournamentPlayerPath>) -> HttpResponse {
    mutate(&state, |store, _| join_player(store, path.id, path.player_id))
}

/// Remove a player from the roster (tournament must be in Setup).
#[delete("/api/tournaments/{id}/players/{player_id}")]
async fn api_remove_player(state: SharedState, path: Path<TournamentPlayerPath>) -> HttpResponse {
    mutate(&state, |store, _| remove_player(store, path.id, path.player_id))
}

#[get("/api/players")]
async fn api_list_players(state: SharedState) -> HttpResponse {
    query(&state, |app| app.store.players())
}

#[put("/api/players/{player_id}")]
async fn api_rename_player(
    state: SharedState,
    path: Path<PlayerPath>,
    body: Json<NameBody>,
) -> HttpResponse {
    mutate(&state, |store, _| rename_player(store, path.player_id, &body.name))
}

#[delete("/api/players/{player_id}")]
async fn api_delete_player(state: SharedState, path: Path<PlayerPath>) -> HttpResponse {
    mutate(&state, |store, _| delete_player(store, path.player_id))
}

/// Start the tournament (Setup -> Active) and write the opening schedule.
#[post("/api/tournaments/{id}/start")]
async fn api_start_tournament(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    mutate(&state, |store, config| {
        start_tournament(store, config, path.id, chrono::Utc::now())
    })
}

/// Clear all results and regenerate the opening schedule.
#[post("/api/tournaments/{id}/reset")]
async fn api_reset_tournament(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    mutate(&state, |store, config| reset_tournament(store, config, path.id))
}

#[post("/api/tournaments/{id}/swiss/next")]
async fn api_swiss_next(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    mutate(&state, |store, config| generate_swiss_round(store, config, path.id))
}

#[post("/api/tournaments/{id}/swiss/rebuild")]
async fn api_swiss_rebuild(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    mutate(&state, |store, config| rebuild_swiss_round(store, config, path.id))
}

#[get("/api/tournaments/{id}/matches")]
async fn api_matches(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    query(&state, |app| app.store.matches(path.id))
}

#[get("/api/tournaments/{id}/rounds")]
async fn api_rounds(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    query(&state, |app| rounds(&app.store, path.id))
}

#[get("/api/tournaments/{id}/rounds/{round}")]
async fn api_round(state: SharedState, path: Path<RoundPath>) -> HttpResponse {
    query(&state, |app| round_matches(&app.store, path.id, path.round))
}

/// Record a result, optionally locking it in the same step.
#[put("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_submit_result(
    state: SharedState,
    path: Path<MatchPath>,
    body: Json<ResultBody>,
) -> HttpResponse {
    mutate(&state, |store, _| {
        if body.lock {
            confirm_result(store, path.id, path.match_id, body.result)
        } else {
            submit_result(store, path.id, path.match_id, body.result)
        }
    })
}

#[post("/api/tournaments/{id}/matches/{match_id}/lock")]
async fn api_lock_match(state: SharedState, path: Path<MatchPath>) -> HttpResponse {
    mutate(&state, |store, _| lock_match(store, path.id, path.match_id))
}

#[post("/api/tournaments/{id}/matches/{match_id}/unlock")]
async fn api_unlock_match(state: SharedState, path: Path<MatchPath>) -> HttpResponse {
    mutate(&state, |store, _| unlock_match(store, path.id, path.match_id))
}

#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    query(&state, |app| {
        let standings = get_standings(&app.store, &app.config, path.id)?;
        Ok(serde_json::json!({
            "has_point_ties": has_point_ties(&standings),
            "standings": standings,
        }))
    })
}

#[get("/api/tournaments/{id}/tiebreaks")]
async fn api_tiebreaks(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    query(&state, |app| get_tiebreak_values(&app.store, path.id))
}

/// Head-to-head score of `a` against `b`: /direct-encounter?a=1&b=2
#[get("/api/tournaments/{id}/direct-encounter")]
async fn api_direct_encounter(
    state: SharedState,
    path: Path<TournamentPath>,
    pair: Query<EncounterQuery>,
) -> HttpResponse {
    query(&state, |app| get_direct_encounter(&app.store, path.id, pair.a, pair.b))
}

/// Freeze the standings (Active -> Completed).
#[post("/api/tournaments/{id}/finalize")]
async fn api_finalize(
    state: SharedState,
    path: Path<TournamentPath>,
    body: Option<Json<FinalizeBody>>,
) -> HttpResponse {
    let mode = body.map(|b| b.mode).unwrap_or_default();
    mutate(&state, |store, config| {
        finalize_tournament(store, config, path.id, mode, chrono::Utc::now())
    })
}

#[get("/api/tournaments/{id}/results")]
async fn api_results(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    query(&state, |app| get_results(&app.store, path.id))
}

#[get("/api/tournaments/{id}/export.csv")]
async fn api_export_csv(state: SharedState, path: Path<TournamentPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match export_csv(&g.store, &g.config, path.id) {
        Ok(csv) => HttpResponse::Ok()
            .content_type("text/csv; charset=utf-8")
            .insert_header((
                "Content-Disposition",
                "attachment; filename=\"tournament_results.csv\"",
            ))
            .body(csv),
        Err(e) => error_response(&e),
    }
}

fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(api_tiebreakers)
        .service(api_list_tournaments)
        .service(api_create_tournament)
        .service(api_get_tournament)
        .service(api_rename_tournament)
        .service(api_delete_tournament)
        .service(api_roster)
        .service(api_add_player)
        .service(api_join_player)
        .service(api_remove_player)
        .service(api_list_players)
        .service(api_rename_player)
        .service(api_delete_player)
        .service(api_start_tournament)
        .service(api_reset_tournament)
        .service(api_swiss_next)
        .service(api_swiss_rebuild)
        .service(api_matches)
        .service(api_rounds)
        .service(api_round)
        .service(api_submit_result)
        .service(api_lock_match)
        .service(api_unlock_match)
        .service(api_standings)
        .service(api_tiebreaks)
        .service(api_direct_encounter)
        .service(api_finalize)
        .service(api_results)
        .service(api_export_csv);
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn load_state() -> Result<AppState, TournamentError> {
    let config = match std::env::var("TOURNAMENT_CONFIG") {
        Ok(path) => EngineConfig::load(path)?,
        Err(_) => EngineConfig::default(),
    };
    let data_path = std::env::var("TOURNAMENT_DATA").ok().map(PathBuf::from);
    let store = match &data_path {
        Some(path) if path.exists() => {
            log::info!("Loading snapshot from {}", path.display());
            MemoryStore::load_from(path)?
        }
        _ => MemoryStore::new(),
    };
    Ok(AppState {
        store,
        config,
        data_path,
    })
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);

    let app_state = load_state().map_err(|e| {
        log::error!("Startup failed: {}", e);
        std::io::Error::other(e.to_string())
    })?;
    log::info!(
        "Engine config: {:?} pairing, {} Swiss rounds, tiebreakers {:?}",
        app_state.config.pairing_system,
        app_state.config.swiss_rounds,
        app_state.config.tiebreakers.metrics()
    );
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(app_state));
    HttpServer::new(move || App::new().app_data(state.clone()).configure(routes))
        .bind(bind)?
        .run()
        .await
}
