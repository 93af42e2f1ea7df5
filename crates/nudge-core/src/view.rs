//! The board: the computed read model of the active collection.
//!
//! Never stored, always derived: renderers receive a fresh [`Board`] after
//! every mutation and must not keep their own copy of the reminders.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::reminder::{Priority, Reminder, ReminderState};

/// One reminder as displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
  pub id:              Uuid,
  pub text:            String,
  pub priority:        Priority,
  pub glyph:           &'static str,
  pub state:           ReminderState,
  pub due_label:       String,
  /// `"overdue"` once the due time has passed.
  pub remaining:       String,
  pub past_due:        bool,
  pub completed_label: Option<String>,
}

impl Card {
  fn project(reminder: &Reminder, now: DateTime<Utc>) -> Self {
    Self {
      id:              reminder.id,
      text:            reminder.text.clone(),
      priority:        reminder.priority,
      glyph:           reminder.priority.glyph(),
      state:           reminder.state(),
      due_label:       format_instant(reminder.due_at),
      remaining:       time_remaining(reminder.due_at, now),
      past_due:        reminder.is_past_due(now),
      completed_label: reminder.completed_at.map(format_instant),
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Board {
  /// The instant the board was projected at.
  pub as_of:     DateTime<Utc>,
  /// Ascending by due time.
  pub pending:   Vec<Card>,
  /// Most recently completed first.
  pub completed: Vec<Card>,
}

impl Board {
  pub fn project(reminders: &[Reminder], now: DateTime<Utc>) -> Self {
    let (mut completed, mut pending): (Vec<&Reminder>, Vec<&Reminder>) =
      reminders.iter().partition(|r| r.completed);
    pending.sort_by(|a, b| {
      a.due_at.cmp(&b.due_at).then(a.created_at.cmp(&b.created_at))
    });
    completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));

    Self {
      as_of:     now,
      pending:   pending.into_iter().map(|r| Card::project(r, now)).collect(),
      completed: completed.into_iter().map(|r| Card::project(r, now)).collect(),
    }
  }

  pub fn is_empty(&self) -> bool {
    self.pending.is_empty() && self.completed.is_empty()
  }
}

/// Receives a new board whenever the active collection changes.
pub trait Renderer: Send + Sync {
  fn render(&self, board: &Board);
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
  fn render(&self, _board: &Board) {}
}

// ─── Formatting ──────────────────────────────────────────────────────────────

/// `dd/mm/yyyy HH:MM`, UTC.
pub fn format_instant(at: DateTime<Utc>) -> String {
  at.format("%d/%m/%Y %H:%M").to_string()
}

/// Coarse countdown: `"2d 3h"`, `"4h 15m"`, `"12m"`, or `"overdue"`.
pub fn time_remaining(due_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
  let diff = due_at - now;
  if diff < chrono::TimeDelta::zero() {
    return "overdue".to_owned();
  }
  let minutes = diff.num_minutes();
  let hours = minutes / 60;
  let days = hours / 24;
  if days > 0 {
    format!("{days}d {}h", hours % 24)
  } else if hours > 0 {
    format!("{hours}h {}m", minutes % 60)
  } else {
    format!("{minutes}m")
  }
}
