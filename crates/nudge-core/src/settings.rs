//! Engine tunables. Every field has a default, so an empty config is valid.

use std::time::Duration;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Seconds between scheduler ticks.
  pub tick_secs:   u64,
  /// Seconds a completed reminder stays listed before cleanup removes it.
  pub grace_secs:  u64,
  /// Seconds before a `normal` banner dismisses itself.
  pub banner_secs: u64,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      tick_secs:   30,
      grace_secs:  60 * 60,
      banner_secs: 10,
    }
  }
}

impl Settings {
  /// Never zero; a zero period would spin the scheduler.
  pub fn tick_period(&self) -> Duration {
    Duration::from_secs(self.tick_secs.max(1))
  }

  pub fn grace_window(&self) -> TimeDelta { delta_secs(self.grace_secs) }

  pub fn banner_ttl(&self) -> TimeDelta { delta_secs(self.banner_secs) }
}

fn delta_secs(secs: u64) -> TimeDelta {
  i64::try_from(secs)
    .ok()
    .and_then(TimeDelta::try_seconds)
    .unwrap_or(TimeDelta::MAX)
}
