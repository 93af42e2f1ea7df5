//! Handlers for `/reminders` and `/history` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/reminders` | Optional `?status=pending\|completed` |
//! | `POST`   | `/reminders` | Body: [`CreateBody`]; returns 201 + reminder |
//! | `GET`    | `/reminders/:id` | 404 if not found |
//! | `DELETE` | `/reminders/:id` | 204 whether or not it existed |
//! | `POST`   | `/reminders/:id/complete` | 200 + reminder, 204 if nothing changed |
//! | `POST`   | `/reminders/:id/toggle` | 200 + reminder, 204 if not found |
//! | `GET`    | `/history` | Completed reminders in completion order |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use nudge_core::{
  lifecycle::Outcome,
  reminder::{NewReminder, Priority, Reminder},
  store::SlotStore,
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
  Pending,
  Completed,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<StatusFilter>,
}

/// `GET /reminders[?status=<status>]`
pub async fn list<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Json<Vec<Reminder>> {
  let mut engine = state.engine.lock().await;
  let reminders = match params.status {
    None => engine.list_active().await,
    Some(StatusFilter::Pending) => engine.pending().await,
    Some(StatusFilter::Completed) => engine.completed().await,
  };
  Json(reminders)
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub text:     String,
  /// RFC 3339; must be later than the server's current time.
  #[serde(alias = "due_at")]
  pub due_at:   DateTime<Utc>,
  #[serde(default)]
  pub priority: Priority,
}

/// `POST /reminders` with body `{"text":"...","dueAt":"2024-03-01T10:00:00Z"}`
pub async fn create<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input =
    NewReminder::new(body.text, body.due_at).with_priority(body.priority);
  let reminder = state.engine.lock().await.create(input).await?;
  Ok((StatusCode::CREATED, Json(reminder)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /reminders/:id`
pub async fn get_one<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Reminder>, ApiError> {
  let reminder = state
    .engine
    .lock()
    .await
    .find(id)
    .await
    .ok_or_else(|| ApiError::NotFound(format!("reminder {id} not found")))?;
  Ok(Json(reminder))
}

// ─── Lifecycle ────────────────────────────────────────────────────────────────

/// `DELETE /reminders/:id`
pub async fn delete_one<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> StatusCode {
  if !state.engine.lock().await.remove(id).await {
    debug!(%id, "delete of absent reminder");
  }
  StatusCode::NO_CONTENT
}

/// `POST /reminders/:id/complete`
pub async fn complete_one<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Response {
  let outcome = state.engine.lock().await.complete(id).await;
  outcome_response(outcome)
}

/// `POST /reminders/:id/toggle`
pub async fn toggle_one<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Response {
  let outcome = state.engine.lock().await.toggle_completion(id).await;
  outcome_response(outcome)
}

fn outcome_response(outcome: Outcome) -> Response {
  match outcome.applied() {
    Some(reminder) => Json(reminder).into_response(),
    None => StatusCode::NO_CONTENT.into_response(),
  }
}

// ─── History ──────────────────────────────────────────────────────────────────

/// `GET /history`
pub async fn history<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
) -> Json<Vec<Reminder>> {
  Json(state.engine.lock().await.history().await)
}
