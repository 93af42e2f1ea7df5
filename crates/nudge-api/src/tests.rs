//! Router tests driven through `tower::ServiceExt::oneshot`.

use std::time::Duration;

use axum::{
  Router,
  body::{Body, to_bytes},
  http::{Method, Request, StatusCode},
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use nudge_core::{
  clock::ManualClock, engine::Engine, memory::MemoryStore, store::Slot,
};
use nudge_scheduler::{Scheduler, shared};
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{AppState, api_router};

fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

async fn app() -> (Router, ManualClock) { app_on(MemoryStore::new()).await }

async fn app_on(store: MemoryStore) -> (Router, ManualClock) {
  let clock = ManualClock::new(t0());
  let engine = Engine::builder(store)
    .clock(clock.clone())
    .open()
    .await
    .unwrap();
  let scheduler = Scheduler::new(shared(engine), Duration::from_secs(30));
  (api_router(AppState::new(scheduler)), clock)
}

async fn send(
  app: &Router,
  method: Method,
  uri: &str,
  body: Option<Value>,
) -> (StatusCode, Value) {
  let builder = Request::builder().method(method).uri(uri);
  let request = match body {
    Some(body) => builder
      .header("content-type", "application/json")
      .body(Body::from(body.to_string()))
      .unwrap(),
    None => builder.body(Body::empty()).unwrap(),
  };
  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  let value = if bytes.is_empty() {
    Value::Null
  } else {
    serde_json::from_slice(&bytes).unwrap()
  };
  (status, value)
}

async fn create(app: &Router, text: &str, minutes: i64, priority: &str) -> String {
  let due = (t0() + TimeDelta::minutes(minutes)).to_rfc3339();
  let (status, body) = send(
    app,
    Method::POST,
    "/reminders",
    Some(json!({ "text": text, "dueAt": due, "priority": priority })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body["id"].as_str().unwrap().to_owned()
}

// ─── Reminders ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_returns_201_and_trims_text() {
  let (app, _clock) = app().await;
  let (status, body) = send(
    &app,
    Method::POST,
    "/reminders",
    Some(json!({ "text": "  Call guest  ", "due_at": "2024-03-01T10:00:00Z" })),
  )
  .await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["text"], "Call guest");
  assert_eq!(body["priority"], "normal");
  assert_eq!(body["dueAt"], (t0() + TimeDelta::hours(1)).timestamp_millis());
  assert_eq!(body["triggered"], false);
  assert_eq!(body["completed"], false);
}

#[tokio::test]
async fn create_rejects_empty_text_and_past_due() {
  let (app, _clock) = app().await;

  let (status, body) = send(
    &app,
    Method::POST,
    "/reminders",
    Some(json!({ "text": "   ", "dueAt": "2024-03-01T10:00:00Z" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert!(body["error"].as_str().unwrap().contains("empty"));

  let (status, _) = send(
    &app,
    Method::POST,
    "/reminders",
    Some(json!({ "text": "late", "dueAt": "2024-03-01T08:00:00Z" })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (_, list) = send(&app, Method::GET, "/reminders", None).await;
  assert_eq!(list, json!([]));
}

#[tokio::test]
async fn create_succeeds_while_store_rejects_writes() {
  let store = MemoryStore::new();
  store.fail_writes(true);
  let (app, _clock) = app_on(store.clone()).await;

  let id = create(&app, "unsaved", 30, "important").await;
  assert!(store.raw(Slot::Active).is_none());

  store.fail_writes(false);
  let uri = format!("/reminders/{id}/complete");
  let (status, _) = send(&app, Method::POST, &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(store.raw(Slot::Active).unwrap().contains(&id));
}

#[tokio::test]
async fn get_unknown_reminder_is_404() {
  let (app, _clock) = app().await;
  let (status, body) = send(
    &app,
    Method::GET,
    "/reminders/00000000-0000-4000-8000-000000000000",
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
  assert!(body["error"].is_string());
}

#[tokio::test]
async fn list_filters_by_status() {
  let (app, _clock) = app().await;
  let later = create(&app, "later", 90, "normal").await;
  let sooner = create(&app, "sooner", 30, "important").await;
  send(&app, Method::POST, &format!("/reminders/{later}/complete"), None).await;

  let (_, all) = send(&app, Method::GET, "/reminders", None).await;
  let ids: Vec<&str> =
    all.as_array().unwrap().iter().map(|r| r["id"].as_str().unwrap()).collect();
  assert_eq!(ids, [sooner.as_str(), later.as_str()]);

  let (_, pending) = send(&app, Method::GET, "/reminders?status=pending", None).await;
  assert_eq!(pending.as_array().unwrap().len(), 1);
  assert_eq!(pending[0]["id"], sooner);

  let (_, completed) =
    send(&app, Method::GET, "/reminders?status=completed", None).await;
  assert_eq!(completed[0]["id"], later);
}

#[tokio::test]
async fn complete_is_idempotent() {
  let (app, _clock) = app().await;
  let id = create(&app, "pay rent", 60, "urgent").await;
  let uri = format!("/reminders/{id}/complete");

  let (status, body) = send(&app, Method::POST, &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["completed"], true);
  assert_eq!(body["completedAt"], t0().timestamp_millis());

  let (status, _) = send(&app, Method::POST, &uri, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (_, history) = send(&app, Method::GET, "/history", None).await;
  assert_eq!(history.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn toggle_reopens_and_unknown_is_204() {
  let (app, _clock) = app().await;
  let id = create(&app, "stretch", 60, "normal").await;
  let uri = format!("/reminders/{id}/toggle");

  let (_, done) = send(&app, Method::POST, &uri, None).await;
  assert_eq!(done["completed"], true);
  let (status, reopened) = send(&app, Method::POST, &uri, None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(reopened["completed"], false);
  assert!(reopened["completedAt"].is_null());

  let (status, _) = send(
    &app,
    Method::POST,
    "/reminders/00000000-0000-4000-8000-000000000000/toggle",
    None,
  )
  .await;
  assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn delete_always_returns_204() {
  let (app, _clock) = app().await;
  let id = create(&app, "gone", 60, "normal").await;
  let uri = format!("/reminders/{id}");

  let (status, _) = send(&app, Method::DELETE, &uri, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (status, _) = send(&app, Method::DELETE, &uri, None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);

  let (status, _) = send(&app, Method::GET, &uri, None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Scheduler, board, banner ────────────────────────────────────────────────

#[tokio::test]
async fn manual_check_surfaces_due_reminder_once() {
  let (app, clock) = app().await;
  let id = create(&app, "stand up", 5, "important").await;
  clock.set(t0() + TimeDelta::minutes(6));

  let (status, report) = send(&app, Method::POST, "/scheduler/check", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(report["surfaced"], json!([id]));
  assert_eq!(report["persisted"], true);

  let (_, banner) = send(&app, Method::GET, "/banner", None).await;
  assert_eq!(banner["text"], "stand up");
  assert_eq!(banner["glyph"], "🟡");
  assert!(banner["expires_at"].is_null());

  let (_, again) = send(&app, Method::POST, "/scheduler/check", None).await;
  assert_eq!(again["surfaced"], json!([]));

  let (status, _) = send(&app, Method::POST, "/banner/dismiss", None).await;
  assert_eq!(status, StatusCode::NO_CONTENT);
  let (_, banner) = send(&app, Method::GET, "/banner", None).await;
  assert!(banner.is_null());
}

#[tokio::test]
async fn board_groups_pending_and_completed() {
  let (app, clock) = app().await;
  let done = create(&app, "done", 30, "normal").await;
  create(&app, "open", 150, "urgent").await;
  send(&app, Method::POST, &format!("/reminders/{done}/complete"), None).await;
  clock.advance(TimeDelta::minutes(10));

  let (status, board) = send(&app, Method::GET, "/board", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(board["pending"][0]["text"], "open");
  assert_eq!(board["pending"][0]["remaining"], "2h 20m");
  assert_eq!(board["pending"][0]["state"], "pending");
  assert_eq!(board["completed"][0]["id"], done);
}

#[tokio::test]
async fn enable_and_disable_report_status() {
  let (app, _clock) = app().await;

  let (_, status) = send(&app, Method::GET, "/scheduler", None).await;
  assert_eq!(status["running"], false);
  assert_eq!(status["enabled"], true);
  assert_eq!(status["period_ms"], 30_000);

  let (_, status) = send(&app, Method::POST, "/scheduler/disable", None).await;
  assert_eq!(status["enabled"], false);
  let (_, status) = send(&app, Method::POST, "/scheduler/enable", None).await;
  assert_eq!(status["enabled"], true);
}
