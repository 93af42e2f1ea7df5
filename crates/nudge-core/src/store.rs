//! The `SlotStore` trait, the durable key-value seam under the repository.
//!
//! A store holds named slots of structured text. It knows nothing about
//! reminders; the repository serialises its collections into slots and is
//! the only caller. Backends: [`crate::memory::MemoryStore`] and
//! `nudge-store-sqlite`.

use std::future::Future;

// ─── Slots ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
  /// Reminders that are pending, due, or recently resolved.
  Active,
  /// Append-only log of reminders at the moment they were first completed.
  History,
}

impl Slot {
  pub const ALL: [Slot; 2] = [Slot::Active, Slot::History];

  /// The persisted slot key.
  pub fn name(self) -> &'static str {
    match self {
      Self::Active => "activeReminders",
      Self::History => "completedReminders",
    }
  }

  pub fn from_name(name: &str) -> Option<Self> {
    Self::ALL.into_iter().find(|slot| slot.name() == name)
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over a durable slot backend.
///
/// All methods return `Send` futures so the trait can be driven from a
/// multi-threaded runtime.
pub trait SlotStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Read a slot's contents. Returns `None` if the slot was never written.
  fn read(
    &self,
    slot: Slot,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + '_;

  /// Replace every given slot in a single atomic write, provided the store
  /// is still at revision `expected`. Returns the new revision, or `None`
  /// (leaving every slot untouched) if another handle wrote first.
  fn write(
    &self,
    slots: Vec<(Slot, String)>,
    expected: u64,
  ) -> impl Future<Output = Result<Option<u64>, Self::Error>> + Send + '_;

  /// The current revision. It changes on every committed write, from any
  /// handle or process sharing the store.
  fn revision(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}
