//! Notification presenter seam and the single transient banner slot.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::{
  reminder::{Priority, Reminder},
  view::format_instant,
};

// ─── Tones ───────────────────────────────────────────────────────────────────

/// Audible cues. Hosts without audio may ignore them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
  /// A reminder became due: lower and longer.
  Due,
  /// A reminder was marked done: higher and shorter.
  Completion,
}

impl Tone {
  pub fn frequency_hz(self) -> u32 {
    match self {
      Self::Due => 800,
      Self::Completion => 1000,
    }
  }

  pub fn duration(self) -> Duration {
    match self {
      Self::Due => Duration::from_millis(500),
      Self::Completion => Duration::from_millis(300),
    }
  }

  /// Starting gain of the exponential fade.
  pub fn gain(self) -> f32 {
    match self {
      Self::Due => 0.3,
      Self::Completion => 0.2,
    }
  }
}

// ─── Banner ──────────────────────────────────────────────────────────────────

/// The content of the transient display slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Banner {
  /// Increases every time the slot is written; lets a delayed dismissal tell
  /// whether the banner it was scheduled for is still showing.
  pub generation:  u64,
  pub reminder_id: Uuid,
  pub text:        String,
  pub due_label:   String,
  pub priority:    Priority,
  pub glyph:       &'static str,
  /// `None` for banners that wait for a manual dismissal.
  pub expires_at:  Option<DateTime<Utc>>,
}

/// One display slot; the most recent `show` wins.
#[derive(Debug, Default)]
pub struct BannerSlot {
  current:    Option<Banner>,
  generation: u64,
}

impl BannerSlot {
  pub fn show(
    &mut self,
    reminder: &Reminder,
    ttl: TimeDelta,
    now: DateTime<Utc>,
  ) -> &Banner {
    self.generation += 1;
    let banner = Banner {
      generation:  self.generation,
      reminder_id: reminder.id,
      text:        reminder.text.clone(),
      due_label:   format_instant(reminder.due_at),
      priority:    reminder.priority,
      glyph:       reminder.priority.glyph(),
      expires_at:  reminder
        .priority
        .auto_dismisses()
        .then(|| now.checked_add_signed(ttl))
        .flatten(),
    };
    self.current.insert(banner)
  }

  /// The showing banner, unless it has outlived its expiry.
  pub fn current(&self, now: DateTime<Utc>) -> Option<&Banner> {
    self
      .current
      .as_ref()
      .filter(|b| b.expires_at.is_none_or(|at| at > now))
  }

  /// Clear the slot if its banner has expired. Returns whether it cleared.
  pub fn expire(&mut self, now: DateTime<Utc>) -> bool {
    if self.current.is_some() && self.current(now).is_none() {
      self.current = None;
      return true;
    }
    false
  }

  pub fn clear(&mut self) -> bool { self.current.take().is_some() }

  /// Clear only if the slot still shows banner `generation`.
  pub fn clear_if(&mut self, generation: u64) -> bool {
    if self.current.as_ref().is_some_and(|b| b.generation == generation) {
      self.current = None;
      return true;
    }
    false
  }
}

// ─── Presenter trait ─────────────────────────────────────────────────────────

/// Host surface for notifications: a banner, tones, and short notices.
pub trait Presenter: Send + Sync {
  fn show(&self, banner: &Banner);

  fn clear(&self);

  fn play(&self, _tone: Tone) {}

  /// A short confirmation message ("Completed: ...").
  fn notice(&self, _message: &str) {}
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresenter;

impl Presenter for NullPresenter {
  fn show(&self, _banner: &Banner) {}

  fn clear(&self) {}
}
