//! REST endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use super::{ApiError, AppState};
use crate::catalog::model::User;
use crate::catalog::register_schedule_by_id;
use crate::error::Error;
use crate::personality::{self, Answer, DriftOutcome, QUESTIONS};
use crate::recommend::{CandidateList, candidates};

const DEFAULT_LOG_LIMIT: usize = 20;
const MAX_LOG_LIMIT: usize = 100;

type ApiResult<T> = Result<T, ApiError>;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/api/personality/questions", get(questions))
        .route("/api/personality/analyze", post(analyze))
        .route("/api/personality/{owner_id}", get(get_profile))
        .route("/api/personality/{owner_id}/reanalyze", post(reanalyze))
        .route("/api/recommendations/{owner_id}", get(recommendations))
        .route("/api/chat", post(chat))
        .route("/api/chat/{owner_id}/log", get(chat_log))
        .route("/api/schedules", post(create_schedule))
        .route("/api/schedules/{owner_id}", get(list_schedules))
        .route("/api/users", post(upsert_user))
}

// ── Health ──────────────────────────────────────────────────────────────

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "care-companion"
    }))
}

// ── Personality ─────────────────────────────────────────────────────────

async fn questions() -> impl IntoResponse {
    Json(json!({ "questions": QUESTIONS }))
}

#[derive(Debug, Deserialize)]
struct AnalyzeRequest {
    owner_id: String,
    answers: Vec<String>,
}

/// POST /api/personality/analyze
async fn analyze(
    State(state): State<AppState>,
    Json(req): Json<AnalyzeRequest>,
) -> ApiResult<impl IntoResponse> {
    let owner_id = require_owner(&req.owner_id)?;
    let answers = req
        .answers
        .iter()
        .map(|raw| raw.parse::<Answer>())
        .collect::<Result<Vec<_>, _>>()?;

    let profile = personality::onboard(state.db.as_ref(), owner_id, &answers).await?;
    Ok(Json(json!({
        "owner_id": profile.owner_id,
        "code": profile.code,
        "tags": profile.tags,
    })))
}

/// GET /api/personality/{owner_id}
async fn get_profile(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .db
        .latest_profile(&owner_id)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::not_found("Personality profile", &owner_id))?;
    Ok(Json(profile.to_json()))
}

#[derive(Debug, Deserialize)]
struct ReanalyzeQuery {
    days: Option<u32>,
}

/// POST /api/personality/{owner_id}/reanalyze
async fn reanalyze(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
    Query(query): Query<ReanalyzeQuery>,
) -> ApiResult<impl IntoResponse> {
    let body = match state.reanalyzer.reanalyze(&owner_id, query.days).await? {
        DriftOutcome::NoChange { code } => json!({
            "owner_id": owner_id,
            "message": "no change",
            "code": code,
        }),
        DriftOutcome::Changed { previous, profile } => json!({
            "owner_id": owner_id,
            "previous_code": previous,
            "new_code": profile.code,
            "new_tags": profile.tags,
        }),
    };
    Ok(Json(body))
}

// ── Recommendations ─────────────────────────────────────────────────────

/// GET /api/recommendations/{owner_id}
async fn recommendations(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let profile = state
        .db
        .latest_profile(&owner_id)
        .await
        .map_err(Error::from)?
        .ok_or_else(|| Error::not_found("Personality profile", &owner_id))?;
    let catalog = state.db.list_programs().await.map_err(Error::from)?;

    let matched = candidates(&profile.tags, &catalog)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(CandidateList::new(owner_id, matched)))
}

// ── Chat ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChatRequest {
    owner_id: String,
    message: String,
}

/// POST /api/chat
async fn chat(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> ApiResult<impl IntoResponse> {
    let owner_id = require_owner(&req.owner_id)?;
    let message = req.message.trim();
    if message.is_empty() {
        return Err(Error::Validation("message must not be empty".to_string()).into());
    }
    let reply = state.router.handle(owner_id, message).await?;
    Ok(Json(reply.to_json(message)))
}

#[derive(Debug, Deserialize)]
struct LogQuery {
    limit: Option<usize>,
}

/// GET /api/chat/{owner_id}/log
async fn chat_log(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
    Query(query): Query<LogQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query.limit.unwrap_or(DEFAULT_LOG_LIMIT).min(MAX_LOG_LIMIT);
    let entries = state
        .db
        .list_log(&owner_id, limit)
        .await
        .map_err(Error::from)?;
    Ok(Json(entries))
}

// ── Schedules ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ScheduleRequest {
    owner_id: String,
    program_id: i64,
}

/// POST /api/schedules
async fn create_schedule(
    State(state): State<AppState>,
    Json(req): Json<ScheduleRequest>,
) -> ApiResult<impl IntoResponse> {
    let owner_id = require_owner(&req.owner_id)?;
    let registration = register_schedule_by_id(state.db.as_ref(), owner_id, req.program_id).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// GET /api/schedules/{owner_id}
async fn list_schedules(
    State(state): State<AppState>,
    Path(owner_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let schedules = state
        .db
        .list_schedules(&owner_id)
        .await
        .map_err(Error::from)?;
    Ok(Json(schedules))
}

// ── Users ───────────────────────────────────────────────────────────────

/// POST /api/users
async fn upsert_user(
    State(state): State<AppState>,
    Json(user): Json<User>,
) -> ApiResult<impl IntoResponse> {
    require_owner(&user.owner_id)?;
    state.db.upsert_user(&user).await.map_err(Error::from)?;
    info!(owner_id = %user.owner_id, "User stored");
    Ok((StatusCode::CREATED, Json(user)))
}

fn require_owner(owner_id: &str) -> Result<&str, Error> {
    let owner_id = owner_id.trim();
    if owner_id.is_empty() {
        return Err(Error::Validation("owner_id must not be empty".to_string()));
    }
    Ok(owner_id)
}
