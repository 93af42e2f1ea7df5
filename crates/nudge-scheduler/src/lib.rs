//! Timer-driven scheduler loop and live board subscriptions for nudge.
//!
//! The engine is shared behind one [`tokio::sync::Mutex`]; the loop, the
//! auto-dismiss timers, and any host handlers all take that lock for their
//! whole operation.

pub mod scheduler;
pub mod watch;

use std::sync::Arc;

use nudge_core::engine::Engine;
use tokio::sync::Mutex;

pub use scheduler::{Scheduler, SchedulerStatus};
pub use watch::WatchRenderer;

/// An engine shared between the scheduler loop and host handlers.
pub type SharedEngine<S> = Arc<Mutex<Engine<S>>>;

pub fn shared<S>(engine: Engine<S>) -> SharedEngine<S> {
  Arc::new(Mutex::new(engine))
}

#[cfg(test)]
mod tests;
