//! The reminder entity, the only record the engine persists.
//!
//! Field names and encodings follow the persisted slot format: camelCase keys,
//! instants as epoch milliseconds, priority as a lowercase string.

use std::{fmt, str::FromStr};

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Error;

// ─── Priority ────────────────────────────────────────────────────────────────

/// How loudly a reminder is surfaced. Priority never affects scheduling
/// order; it only drives banner lifetime and styling.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
  #[default]
  Normal,
  Important,
  Urgent,
}

impl Priority {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Normal => "normal",
      Self::Important => "important",
      Self::Urgent => "urgent",
    }
  }

  pub fn glyph(self) -> &'static str {
    match self {
      Self::Normal => "🔵",
      Self::Important => "🟡",
      Self::Urgent => "🔴",
    }
  }

  /// Only `normal` banners dismiss themselves; the others wait for the user.
  pub fn auto_dismisses(self) -> bool { matches!(self, Self::Normal) }
}

impl fmt::Display for Priority {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Priority {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "normal" => Ok(Self::Normal),
      "important" => Ok(Self::Important),
      "urgent" => Ok(Self::Urgent),
      _ => Err(Error::UnknownPriority(s.to_owned())),
    }
  }
}

// ─── State ───────────────────────────────────────────────────────────────────

/// Lifecycle state, derived from the `triggered` and `completed` flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderState {
  /// Not yet observed as due by the scheduler.
  Pending,
  /// Surfaced by the scheduler but not acknowledged.
  DueUnacknowledged,
  /// Marked done by the user.
  Resolved,
}

// ─── Reminder ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
  pub id:           Uuid,
  pub text:         String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub due_at:       DateTime<Utc>,
  #[serde(default)]
  pub priority:     Priority,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at:   DateTime<Utc>,
  #[serde(default)]
  pub triggered:    bool,
  #[serde(default)]
  pub completed:    bool,
  /// Present iff `completed` is true.
  #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
  pub completed_at: Option<DateTime<Utc>>,
}

impl Reminder {
  pub fn state(&self) -> ReminderState {
    match (self.triggered, self.completed) {
      (_, true) => ReminderState::Resolved,
      (true, false) => ReminderState::DueUnacknowledged,
      (false, false) => ReminderState::Pending,
    }
  }

  /// Due and not yet surfaced.
  pub fn is_due(&self, now: DateTime<Utc>) -> bool {
    !self.triggered && self.due_at <= now
  }

  pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
    !self.completed && self.due_at < now
  }

  /// Resolved longer ago than `grace`; eligible for cleanup.
  pub fn is_expired(&self, now: DateTime<Utc>, grace: TimeDelta) -> bool {
    match (self.completed, self.completed_at) {
      (true, Some(at)) => now - at > grace,
      _ => false,
    }
  }

  /// Returns `false` if the reminder had already been triggered.
  pub(crate) fn trigger(&mut self) -> bool {
    if self.triggered {
      return false;
    }
    self.triggered = true;
    true
  }

  /// Returns `false` if the reminder was already completed.
  pub(crate) fn complete(&mut self, at: DateTime<Utc>) -> bool {
    if self.completed {
      return false;
    }
    self.completed = true;
    self.completed_at = Some(at);
    true
  }

  /// Undo a completion. `triggered` is left untouched.
  pub(crate) fn reopen(&mut self) -> bool {
    if !self.completed {
      return false;
    }
    self.completed = false;
    self.completed_at = None;
    true
  }
}

// ─── NewReminder ─────────────────────────────────────────────────────────────

/// Input to [`crate::engine::Engine::create`]. The id and `created_at` are
/// always assigned by the repository.
#[derive(Debug, Clone)]
pub struct NewReminder {
  pub text:     String,
  pub due_at:   DateTime<Utc>,
  pub priority: Priority,
}

impl NewReminder {
  pub fn new(text: impl Into<String>, due_at: DateTime<Utc>) -> Self {
    Self {
      text: text.into(),
      due_at,
      priority: Priority::default(),
    }
  }

  pub fn with_priority(mut self, priority: Priority) -> Self {
    self.priority = priority;
    self
  }
}
