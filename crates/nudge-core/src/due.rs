//! One scheduler tick: find reminders that have come due and surface them.
//!
//! The timer that calls [`Engine::check_due`] lives in `nudge-scheduler`;
//! this module only knows what a single pass does.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
  engine::Engine, notify::Tone, reminder::Reminder, store::SlotStore,
};

/// Summary of one tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TickReport {
  pub checked_at: DateTime<Utc>,
  /// Reminders triggered by this tick, in the order they were surfaced.
  pub surfaced:   Vec<Uuid>,
  /// Resolved reminders removed by cleanup.
  pub pruned:     usize,
  /// Whether the store reflects memory once the tick finished.
  pub persisted:  bool,
}

impl<S: SlotStore> Engine<S> {
  /// Trigger every reminder that is due and not yet triggered, oldest due
  /// time first. The last one surfaced owns the banner slot.
  ///
  /// Triggered flags are set in memory before the write, so a failed write
  /// never causes a second notification; the write is retried on the next
  /// tick.
  pub async fn check_due(&mut self) -> TickReport {
    self.sync().await;
    let now = self.clock.now();
    let pruned = self.repo.cleanup().await;

    let mut surfaced = Vec::new();
    for due in self.repo.due(now) {
      let Some((true, reminder)) = self.repo.modify(due.id, Reminder::trigger)
      else {
        continue;
      };
      info!(
        id = %reminder.id,
        priority = %reminder.priority,
        "reminder due: {}",
        reminder.text
      );
      self.surface(&reminder);
      self.presenter.play(Tone::Due);
      surfaced.push(reminder.id);
    }

    if !surfaced.is_empty() || self.repo.is_dirty() {
      self.repo.flush().await;
    }
    if !surfaced.is_empty() || pruned > 0 {
      self.refresh().await;
    }
    if self.banner.expire(now) {
      self.presenter.clear();
    }

    debug!(surfaced = surfaced.len(), pruned, "tick complete");
    TickReport {
      checked_at: now,
      surfaced,
      pruned,
      persisted: !self.repo.is_dirty(),
    }
  }
}
