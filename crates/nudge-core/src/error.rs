//! Error types for `nudge-core`.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid reminder: {0}")]
  Validation(#[from] ValidationError),

  /// The backing store failed to read or write a slot.
  #[error("persistence error: {0}")]
  Persistence(#[source] Box<dyn std::error::Error + Send + Sync>),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),

  #[error("unknown priority: {0:?}")]
  UnknownPriority(String),

  /// Every conditional write lost to a concurrent writer.
  #[error("store changed during each of {0} write attempts")]
  Conflict(usize),
}

impl Error {
  pub(crate) fn persistence<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Persistence(Box::new(err))
  }
}

/// Rejections raised when creating a reminder. No state is mutated when one
/// of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
  #[error("reminder text is empty")]
  EmptyText,

  #[error("due time {due_at} is not after the current time {now}")]
  DueNotInFuture {
    due_at: DateTime<Utc>,
    now:    DateTime<Utc>,
  },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
