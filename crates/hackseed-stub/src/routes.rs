// SPDX-License-Identifier: BUSL-1.1
//! Route definitions for the hackathon API stub.
//!
//! Implements the endpoints that `hackseed-client` calls, under the same
//! `/api/v1` prefix the backend uses, with the backend's response shapes and
//! conflict messages.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::StubError;
use crate::store::{AppState, UserRow, ALREADY_REGISTERED, REGISTERED};

/// Path prefix of every API route.
pub const API_PREFIX: &str = "/api/v1";

/// Build the complete router with all stub routes.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth_register))
        .route("/auth/login", post(auth_login))
        .route("/hackathons", get(hackathons_list))
        .route("/hackathons/:id", get(hackathon_get))
        .route("/hackathons/:id/register", post(hackathon_register))
        .route("/hackathons/:id/participants", get(hackathon_participants))
        .route("/submissions", post(submission_create).get(submission_list));

    Router::new()
        .route("/health", get(health))
        .nest(API_PREFIX, api)
        .fallback(not_found)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .with_state(state)
}

// ── helpers ─────────────────────────────────────────────────────────

fn caller(state: &AppState, headers: &HeaderMap) -> Result<UserRow, StubError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or_else(|| StubError::Unauthorized("Unauthorized".into()))?;
    state.user_for_token(token.trim())
}

fn parse_body(body: &Bytes) -> Result<Value, StubError> {
    if body.is_empty() {
        return Ok(json!({}));
    }
    let v: Value =
        serde_json::from_slice(body).map_err(|e| StubError::BadRequest(format!("Invalid JSON body: {e}")))?;
    if v.is_object() {
        Ok(v)
    } else {
        Err(StubError::BadRequest("Request body must be a JSON object".into()))
    }
}

fn required_str<'a>(body: &'a Value, field: &str) -> Result<&'a str, StubError> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| StubError::BadRequest(format!("{field} should not be empty")))
}

fn optional_str<'a>(body: &'a Value, field: &str, default: &'a str) -> &'a str {
    body.get(field).and_then(Value::as_str).unwrap_or(default)
}

fn auth_reply(status: StatusCode, user: &UserRow, token: String) -> Response {
    (
        status,
        Json(json!({
            "accessToken": token,
            "user": user.to_json(),
        })),
    )
        .into_response()
}

// ── health ──────────────────────────────────────────────────────────

async fn health() -> StatusCode {
    StatusCode::OK
}

async fn not_found() -> Response {
    StubError::NotFound("Cannot find route".into()).into_response()
}

// ── auth ────────────────────────────────────────────────────────────

async fn auth_register(State(state): State<AppState>, body: Bytes) -> Result<Response, StubError> {
    let body = parse_body(&body)?;
    let email = required_str(&body, "email")?;
    let password = required_str(&body, "password")?;
    let (user, token) = state.create_user(
        email,
        password,
        optional_str(&body, "firstName", ""),
        optional_str(&body, "lastName", ""),
        optional_str(&body, "role", "PARTICIPANT"),
    )?;
    tracing::debug!(email = %user.email, "account created");
    Ok(auth_reply(StatusCode::CREATED, &user, token))
}

async fn auth_login(State(state): State<AppState>, body: Bytes) -> Result<Response, StubError> {
    let body = parse_body(&body)?;
    let email = required_str(&body, "email")?;
    let password = required_str(&body, "password")?;
    let (user, token) = state.login(email, password)?;
    Ok(auth_reply(StatusCode::OK, &user, token))
}

// ── hackathons ──────────────────────────────────────────────────────

async fn hackathons_list(State(state): State<AppState>) -> Json<Value> {
    let events: Vec<Value> = state.events().iter().map(|e| e.to_json()).collect();
    Json(json!(events))
}

async fn hackathon_get(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<Value>, StubError> {
    Ok(Json(state.event(&id)?.to_json()))
}

async fn hackathon_register(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StubError> {
    let user = caller(&state, &headers)?;
    let body = parse_body(&body)?;
    let track = body
        .get("selectedTrack")
        .and_then(Value::as_u64)
        .and_then(|t| u32::try_from(t).ok());

    let created = state.register(&id, &user, track)?;
    let (status, message) = if created {
        (StatusCode::CREATED, REGISTERED)
    } else {
        (StatusCode::OK, ALREADY_REGISTERED)
    };
    Ok((status, Json(json!({ "success": true, "message": message }))).into_response())
}

async fn hackathon_participants(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Json<Value>, StubError> {
    caller(&state, &headers)?;
    Ok(Json(json!(state.participants(&id)?)))
}

// ── submissions ─────────────────────────────────────────────────────

async fn submission_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, StubError> {
    let user = caller(&state, &headers)?;
    let body = parse_body(&body)?;
    let event_id = required_str(&body, "hackathonId")?.to_string();
    required_str(&body, "title")?;
    let is_draft = body.get("isDraft").and_then(Value::as_bool).unwrap_or(false);

    let view = state.submit(&user, &event_id, body, is_draft)?;
    Ok((StatusCode::CREATED, Json(view)).into_response())
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionListQuery {
    hackathon_id: Option<String>,
}

async fn submission_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<SubmissionListQuery>,
) -> Result<Json<Value>, StubError> {
    caller(&state, &headers)?;
    Ok(Json(json!(state.submissions_for(query.hackathon_id.as_deref()))))
}
