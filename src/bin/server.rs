use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use kronologic_server::error::{ConfigError, QueryError, StoreError};
use kronologic_server::game_store::{GameStore, RoomKey};
use kronologic_server::server_protocol::{
    build_room_view, parse_investigate_request, parse_new_game_seed, parse_player, RoomView,
};
use kronologic_server::server_utils::{
    normalize_room_code, parse_mode, parse_seed, random_room_code, sanitize_name,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::services::{ServeDir, ServeFile};

type SharedState = Arc<GameStore>;

#[derive(Debug, Deserialize)]
struct RoomQuery {
    player: Option<String>,
    seed: Option<String>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code,
            message: message.into(),
        }
    }

    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "internal_error",
            message: message.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::RoomNotFound { .. } => Self {
                status: StatusCode::NOT_FOUND,
                code: "room_not_found",
                message: error.to_string(),
            },
            StoreError::Query(query) => query.into(),
            StoreError::Config(config) => config.into(),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(error: QueryError) -> Self {
        Self::bad_request("invalid_query", error.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(error: ConfigError) -> Self {
        eprintln!("[server] scenario configuration rejected: {error}");
        Self::internal(error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": {
                "code": self.code,
                "message": self.message,
            }
        }));
        (self.status, body).into_response()
    }
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8080);

    let state: SharedState = Arc::new(GameStore::new());

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/api/room-code", get(room_code_handler))
        .route("/api/rooms/{room}/{mode}", get(room_handler))
        .route("/api/rooms/{room}/{mode}/version", get(version_handler))
        .route("/api/rooms/{room}/{mode}/investigate", post(investigate_handler))
        .route("/api/rooms/{room}/{mode}/new-game", post(new_game_handler))
        .route("/api/rooms/{room}/{mode}/reset-logs", post(reset_logs_handler))
        .route("/api/rooms/{room}/{mode}/reveal", post(reveal_handler))
        .with_state(state);

    let app = if let Some(static_dir) = resolve_static_dir() {
        let index_file = static_dir.join("index.html");
        println!(
            "[server] static file root: {}",
            static_dir.to_string_lossy()
        );
        app.fallback_service(
            ServeDir::new(static_dir).not_found_service(ServeFile::new(index_file)),
        )
    } else {
        eprintln!("[server] static file root not found; serving the JSON API only");
        app
    };

    let bind_addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    println!("[server] listening on :{port}");
    axum::serve(listener, app).await
}

fn resolve_static_dir() -> Option<PathBuf> {
    if let Ok(raw) = std::env::var("STATIC_DIR") {
        let path = PathBuf::from(raw);
        if path.join("index.html").is_file() {
            return Some(path);
        }
    }

    let candidates = [PathBuf::from("static"), PathBuf::from("dist")];
    candidates
        .into_iter()
        .find(|path| path.join("index.html").is_file())
}

fn room_key(room: &str, mode: &str) -> Result<RoomKey, ApiError> {
    let room = normalize_room_code(room)
        .ok_or_else(|| ApiError::bad_request("invalid_room", "room code must be 1-16 of [A-Za-z0-9_-]"))?;
    let mode = parse_mode(mode).ok_or_else(|| {
        ApiError::bad_request("invalid_mode", "mode must be jewel, ritual_easy or ritual_hard")
    })?;
    Ok(RoomKey::new(room, mode))
}

/// Empty bodies read as JSON null.
fn parse_body(raw: &str) -> Result<Value, ApiError> {
    if raw.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(raw).map_err(|error| ApiError::bad_request("invalid_body", error.to_string()))
}

fn view(state: &GameStore, key: &RoomKey, viewer: Option<&str>) -> Result<RoomView, ApiError> {
    Ok(state.snapshot(key, |room| build_room_view(key, room, viewer))?)
}

async fn healthz() -> impl IntoResponse {
    Json(json!({ "ok": true }))
}

async fn room_code_handler() -> impl IntoResponse {
    Json(json!({ "roomCode": random_room_code() }))
}

async fn room_handler(
    State(state): State<SharedState>,
    Path((room, mode)): Path<(String, String)>,
    Query(query): Query<RoomQuery>,
) -> Result<Json<RoomView>, ApiError> {
    let key = room_key(&room, &mode)?;
    let seed = parse_seed(query.seed.as_deref())
        .map_err(|message| ApiError::bad_request("invalid_seed", message))?;
    let viewer = query.player.as_deref().map(sanitize_name);
    state.get_or_create(&key, seed)?;
    Ok(Json(view(&state, &key, viewer.as_deref())?))
}

async fn version_handler(
    State(state): State<SharedState>,
    Path((room, mode)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let key = room_key(&room, &mode)?;
    Ok(Json(json!({
        "version": state.version(&key),
        "logRevision": state.log_revision(&key),
    })))
}

async fn investigate_handler(
    State(state): State<SharedState>,
    Path((room, mode)): Path<(String, String)>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let key = room_key(&room, &mode)?;
    let request = parse_investigate_request(&parse_body(&body)?).ok_or_else(|| {
        ApiError::bad_request("invalid_body", "expected player, kind and query fields")
    })?;
    let resolution = state.investigate(&key, &request.player, &request.query)?;
    Ok(Json(json!({
        "resolution": resolution,
        "logRevision": state.log_revision(&key),
    })))
}

async fn new_game_handler(
    State(state): State<SharedState>,
    Path((room, mode)): Path<(String, String)>,
    body: String,
) -> Result<Json<RoomView>, ApiError> {
    let key = room_key(&room, &mode)?;
    let body = parse_body(&body)?;
    let seed = parse_new_game_seed(&body)
        .map_err(|message| ApiError::bad_request("invalid_seed", message))?;
    let viewer = match &body {
        Value::Object(_) => parse_player(&body),
        _ => None,
    };
    state.new_game(&key, seed)?;
    Ok(Json(view(&state, &key, viewer.as_deref())?))
}

async fn reset_logs_handler(
    State(state): State<SharedState>,
    Path((room, mode)): Path<(String, String)>,
) -> Result<Json<Value>, ApiError> {
    let key = room_key(&room, &mode)?;
    let log_revision = state.reset_logs(&key)?;
    Ok(Json(json!({ "ok": true, "logRevision": log_revision })))
}

async fn reveal_handler(
    State(state): State<SharedState>,
    Path((room, mode)): Path<(String, String)>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let key = room_key(&room, &mode)?;
    let player = parse_player(&parse_body(&body)?)
        .ok_or_else(|| ApiError::bad_request("invalid_body", "expected a player field"))?;
    let answer = state.reveal_answer(&key, &player)?;
    Ok(Json(json!({
        "answer": answer,
        "logRevision": state.log_revision(&key),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kronologic_server::types::GameMode;

    #[test]
    fn room_key_validates_both_segments() {
        let key = room_key("4821", "ritual_easy").expect("valid key");
        assert_eq!(key, RoomKey::new("4821", GameMode::RitualEasy));
        assert_eq!(room_key("a/b", "jewel").unwrap_err().code, "invalid_room");
        assert_eq!(room_key("4821", "chess").unwrap_err().code, "invalid_mode");
    }

    #[test]
    fn empty_body_is_null() {
        assert_eq!(parse_body("").expect("empty"), Value::Null);
        assert_eq!(parse_body("  ").expect("blank"), Value::Null);
        assert_eq!(parse_body(r#"{"seed":1}"#).expect("json")["seed"], 1);
        assert_eq!(parse_body("{").unwrap_err().status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn store_errors_map_to_statuses() {
        let missing: ApiError = StoreError::RoomNotFound {
            room: "1".to_string(),
            mode: GameMode::Jewel,
        }
        .into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let bad_query: ApiError =
            StoreError::Query(QueryError::UnknownLocation("月亮".to_string())).into();
        assert_eq!(bad_query.status, StatusCode::BAD_REQUEST);
        assert_eq!(bad_query.code, "invalid_query");

        let config: ApiError = StoreError::Config(ConfigError::NoActors).into();
        assert_eq!(config.status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn view_requires_existing_room() {
        let store = GameStore::new();
        let key = RoomKey::new("55", GameMode::Jewel);
        assert_eq!(
            view(&store, &key, None).unwrap_err().status,
            StatusCode::NOT_FOUND
        );
        store.get_or_create(&key, Some(42)).expect("room");
        let view = view(&store, &key, Some("alice")).expect("view");
        assert_eq!(view.logs.len(), 1);
    }
}
