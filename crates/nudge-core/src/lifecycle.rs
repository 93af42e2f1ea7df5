//! User-driven lifecycle transitions: complete, toggle, remove.
//!
//! ```text
//! pending ──(tick)──▶ due-unacknowledged ──(complete)──▶ resolved
//!                              ▲                            │
//!                              └────────(toggle)────────────┘
//! ```
//!
//! Triggering is left to [`crate::due`]. Operations on unknown ids are
//! silent no-ops so concurrent views can race on the same reminder.

use tracing::debug;
use uuid::Uuid;

use crate::{
  engine::Engine, notify::Tone, reminder::Reminder, store::SlotStore,
};

/// What a lifecycle operation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
  /// The reminder changed; carries its new state.
  Applied(Reminder),
  /// The reminder exists but was already in the requested state.
  Unchanged,
  /// No active reminder has this id.
  Missing,
}

impl Outcome {
  pub fn applied(self) -> Option<Reminder> {
    match self {
      Self::Applied(reminder) => Some(reminder),
      _ => None,
    }
  }
}

impl<S: SlotStore> Engine<S> {
  /// Mark a reminder done. Idempotent: already-completed and unknown ids are
  /// left alone.
  pub async fn complete(&mut self, id: Uuid) -> Outcome {
    self.sync().await;
    self.apply_completion(id).await
  }

  /// Complete an incomplete reminder, or reopen a completed one. Reopening
  /// leaves the history entry from the earlier completion in place.
  pub async fn toggle_completion(&mut self, id: Uuid) -> Outcome {
    self.sync().await;
    let Some(reminder) = self.repo.find_by_id(id) else {
      return Outcome::Missing;
    };
    if !reminder.completed {
      return self.apply_completion(id).await;
    }

    let Some((_, reopened)) = self.repo.modify(id, Reminder::reopen) else {
      return Outcome::Missing;
    };
    debug!(id = %id, "reminder reopened");

    self.repo.flush().await;
    self.refresh().await;
    Outcome::Applied(reopened)
  }

  /// Delete a reminder. Always succeeds; returns whether anything was
  /// removed.
  pub async fn remove(&mut self, id: Uuid) -> bool {
    self.sync().await;
    let removed = self.repo.delete(id).await;
    if removed {
      self.presenter.notice("Reminder removed");
      self.refresh().await;
    }
    removed
  }

  async fn apply_completion(&mut self, id: Uuid) -> Outcome {
    let now = self.clock.now();
    let Some((changed, completed)) =
      self.repo.modify(id, |r| r.complete(now))
    else {
      return Outcome::Missing;
    };
    if !changed {
      return Outcome::Unchanged;
    }
    self.repo.append_history(completed.clone());
    debug!(id = %id, "reminder completed");

    self.repo.flush().await;
    self.presenter.play(Tone::Completion);
    self
      .presenter
      .notice(&format!("Completed: \"{}\"", completed.text));
    self.refresh().await;
    Outcome::Applied(completed)
  }
}
