//! Handlers for `/scheduler` endpoints.

use axum::{Json, extract::State};
use nudge_core::{due::TickReport, store::SlotStore};
use nudge_scheduler::SchedulerStatus;

use crate::AppState;

/// `GET /scheduler`
pub async fn status<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
) -> Json<SchedulerStatus> {
  Json(state.scheduler.status())
}

/// `POST /scheduler/check`: run one tick now, even while disabled.
pub async fn check<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
) -> Json<TickReport> {
  Json(state.scheduler.check_now().await)
}

/// `POST /scheduler/enable`
pub async fn enable<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
) -> Json<SchedulerStatus> {
  state.scheduler.enable();
  Json(state.scheduler.status())
}

/// `POST /scheduler/disable`
pub async fn disable<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
) -> Json<SchedulerStatus> {
  state.scheduler.disable();
  Json(state.scheduler.status())
}
