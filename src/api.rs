//! HTTP routes: session store, `/sync` backup and `/storage` files.
//!
//! Register with `App::new().app_data(..).configure(api::configure)`. Needs a
//! `Data<RwLock<SessionStore>>` and a `Data<LocalStore>` in app data.

use crate::models::{CreateSessionRequest, OwnerToken, RoundRules, GameState, SessionError, SessionId, SessionUpdate};
use crate::persistence::{validate_filename, GameData, LocalStore};
use crate::session::{ErrorBody, SessionStore};
use actix_web::{
    delete, get, post, put,
    web::{self, Data, Json, Path, Query},
    HttpResponse, Responder,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::RwLock;

/// Sessions shared by every worker.
pub type SessionState = Data<RwLock<SessionStore>>;
/// Data directory for `/sync` and `/storage`.
pub type StorageState = Data<LocalStore>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

/// Path segment: session id (e.g. /sessions/{id})
#[derive(Deserialize)]
struct SessionPath {
    id: SessionId,
}

/// `PUT /sessions/{id}`. A missing token is answered like a wrong one.
#[derive(Deserialize)]
struct UpdateSessionBody {
    #[serde(default)]
    owner_token: Option<OwnerToken>,
    #[serde(default)]
    base_revision: Option<u64>,
    #[serde(default)]
    settings: Option<RoundRules>,
    #[serde(default)]
    game_state: Option<GameState>,
}

#[derive(Deserialize)]
struct EndSessionBody {
    #[serde(default)]
    owner_token: Option<OwnerToken>,
}

#[derive(Deserialize)]
struct SaveFileBody {
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Deserialize)]
struct LoadFileQuery {
    #[serde(default)]
    filename: Option<String>,
}

fn error_json(message: impl Into<String>) -> ErrorBody {
    ErrorBody {
        error: message.into(),
        ..ErrorBody::default()
    }
}

fn session_error(e: &SessionError) -> HttpResponse {
    match e {
        SessionError::NotFound(_) => HttpResponse::NotFound().json(error_json(e.to_string())),
        SessionError::Unauthorized => HttpResponse::Forbidden().json(error_json(e.to_string())),
        SessionError::StaleRevision { current, base } => HttpResponse::Conflict().json(ErrorBody {
            error: e.to_string(),
            current_revision: Some(*current),
            base_revision: Some(*base),
        }),
        SessionError::InvalidState(_) | SessionError::Rejected(_) => {
            HttpResponse::BadRequest().json(error_json(e.to_string()))
        }
        SessionError::Transport(_) => HttpResponse::InternalServerError().json(error_json(e.to_string())),
    }
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(json!({ "error": "lock error" }))
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "pour-party",
    })
}

/// Create a session. The response carries the owner token; it is never shown again.
#[post("/sessions")]
async fn create_session(state: SessionState, body: Json<CreateSessionRequest>) -> HttpResponse {
    let request = body.into_inner();
    if request.name.trim().is_empty() || request.owner.trim().is_empty() {
        return HttpResponse::BadRequest().json(json!({ "error": "Session name and owner are required" }));
    }
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.create(request, Utc::now()))
}

#[get("/sessions")]
async fn list_sessions(state: SessionState) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    HttpResponse::Ok().json(g.list())
}

#[get("/sessions/{id}")]
async fn get_session(state: SessionState, path: Path<SessionPath>) -> HttpResponse {
    let g = match state.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.get(path.id) {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(e) => session_error(&e),
    }
}

/// Owner-only partial update; fields left out keep their stored value.
#[put("/sessions/{id}")]
async fn update_session(
    state: SessionState,
    path: Path<SessionPath>,
    body: Json<UpdateSessionBody>,
) -> HttpResponse {
    let body = body.into_inner();
    let Some(owner_token) = body.owner_token else {
        return session_error(&SessionError::Unauthorized);
    };
    let update = SessionUpdate {
        owner_token,
        base_revision: body.base_revision,
        settings: body.settings,
        game_state: body.game_state,
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.update(path.id, update, Utc::now()) {
        Ok(session) => HttpResponse::Ok().json(session),
        Err(e) => session_error(&e),
    }
}

/// End a session (owner only).
#[delete("/sessions/{id}")]
async fn end_session(
    state: SessionState,
    path: Path<SessionPath>,
    body: Option<Json<EndSessionBody>>,
) -> HttpResponse {
    let Some(owner_token) = body.and_then(|b| b.into_inner().owner_token) else {
        return session_error(&SessionError::Unauthorized);
    };
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.end(path.id, owner_token) {
        Ok(_) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => session_error(&e),
    }
}

/// Store the uploaded settings and player stats as this server's copy.
#[post("/sync")]
async fn post_sync(storage: StorageState, body: Json<GameData>) -> HttpResponse {
    match storage.save_game_data(&body) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => {
            log::error!("Saving synced data failed: {}", e);
            HttpResponse::InternalServerError().json(json!({ "error": e.to_string() }))
        }
    }
}

#[get("/sync")]
async fn get_sync(storage: StorageState) -> HttpResponse {
    match storage.load_game_data() {
        Ok(Some(data)) => HttpResponse::Ok().json(data),
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "No synced data" })),
        Err(e) => HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })),
    }
}

#[post("/storage/save")]
async fn storage_save(storage: StorageState, body: Json<SaveFileBody>) -> HttpResponse {
    let body = body.into_inner();
    let (Some(filename), Some(data)) = (body.filename, body.data) else {
        return HttpResponse::BadRequest().json(json!({ "error": "Missing filename or data" }));
    };
    if let Err(e) = validate_filename(&filename) {
        return HttpResponse::BadRequest().json(json!({ "error": e.to_string() }));
    }
    match storage.write_document(&filename, &data) {
        Ok(()) => HttpResponse::Ok().json(json!({ "success": true })),
        Err(e) => {
            log::error!("Saving {} failed: {}", filename, e);
            HttpResponse::InternalServerError().json(json!({ "error": "Failed to save data" }))
        }
    }
}

#[get("/storage/load")]
async fn storage_load(storage: StorageState, query: Query<LoadFileQuery>) -> HttpResponse {
    let Some(filename) = query.into_inner().filename else {
        return HttpResponse::BadRequest().json(json!({ "error": "Missing filename" }));
    };
    if let Err(e) = validate_filename(&filename) {
        return HttpResponse::BadRequest().json(json!({ "error": e.to_string() }));
    }
    match storage.read_document(&filename) {
        Ok(Some(data)) => HttpResponse::Ok().json(data),
        Ok(None) => HttpResponse::NotFound().json(json!({ "error": "File not found" })),
        Err(e) => HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })),
    }
}

/// Mount every route.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(api_health)
        .service(create_session)
        .service(list_sessions)
        .service(get_session)
        .service(update_session)
        .service(end_session)
        .service(post_sync)
        .service(get_sync)
        .service(storage_save)
        .service(storage_load);
}
