//! JSON REST API for nudge.
//!
//! Exposes an axum [`Router`] over a shared [`Engine`](nudge_core::engine::Engine)
//! and its [`Scheduler`]. Auth, TLS, and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", nudge_api::api_router(state.clone()))
//! ```

pub mod board;
pub mod error;
pub mod reminders;
pub mod scheduler;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use nudge_core::store::SlotStore;
use nudge_scheduler::{Scheduler, SharedEngine};

pub use error::ApiError;

/// The engine and the scheduler driving it. Both handles point at the same
/// engine.
pub struct AppState<S> {
  pub engine:    SharedEngine<S>,
  pub scheduler: Arc<Scheduler<S>>,
}

impl<S: SlotStore + 'static> AppState<S> {
  pub fn new(scheduler: Scheduler<S>) -> Self {
    Self {
      engine:    Arc::clone(scheduler.engine()),
      scheduler: Arc::new(scheduler),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      engine:    Arc::clone(&self.engine),
      scheduler: Arc::clone(&self.scheduler),
    }
  }
}

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: SlotStore + 'static,
{
  Router::new()
    // Reminders
    .route(
      "/reminders",
      get(reminders::list::<S>).post(reminders::create::<S>),
    )
    .route(
      "/reminders/{id}",
      get(reminders::get_one::<S>).delete(reminders::delete_one::<S>),
    )
    .route("/reminders/{id}/complete", post(reminders::complete_one::<S>))
    .route("/reminders/{id}/toggle", post(reminders::toggle_one::<S>))
    .route("/history", get(reminders::history::<S>))
    // Board and banner
    .route("/board", get(board::board::<S>))
    .route("/banner", get(board::banner::<S>))
    .route("/banner/dismiss", post(board::dismiss::<S>))
    // Scheduler
    .route("/scheduler", get(scheduler::status::<S>))
    .route("/scheduler/check", post(scheduler::check::<S>))
    .route("/scheduler/enable", post(scheduler::enable::<S>))
    .route("/scheduler/disable", post(scheduler::disable::<S>))
    .with_state(state)
}

#[cfg(test)]
mod tests;
