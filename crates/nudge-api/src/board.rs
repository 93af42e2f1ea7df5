//! Handlers for the board projection and the banner slot.

use axum::{Json, extract::State, http::StatusCode};
use nudge_core::{notify::Banner, store::SlotStore, view::Board};

use crate::AppState;

/// `GET /board`
pub async fn board<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
) -> Json<Board> {
  Json(state.engine.lock().await.board().await)
}

/// `GET /banner`: the banner on display, or `null`.
pub async fn banner<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
) -> Json<Option<Banner>> {
  Json(state.engine.lock().await.current_banner())
}

/// `POST /banner/dismiss`
pub async fn dismiss<S: SlotStore + 'static>(
  State(state): State<AppState<S>>,
) -> StatusCode {
  state.engine.lock().await.dismiss();
  StatusCode::NO_CONTENT
}
