//! [`MemoryStore`]: a process-local [`SlotStore`].
//!
//! Clones share the same slots, so two repositories opened on clones behave
//! like two views over one persisted store.

use std::{
  collections::HashMap,
  sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

use crate::store::{Slot, SlotStore};

#[derive(Debug, Error)]
pub enum MemoryStoreError {
  #[error("writes are disabled on this store")]
  WritesDisabled,
}

#[derive(Debug, Default)]
struct Inner {
  slots:       HashMap<Slot, String>,
  revision:    u64,
  fail_writes: bool,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }

  /// Make every subsequent write fail (or succeed again), to exercise
  /// persistence-failure handling.
  pub fn fail_writes(&self, fail: bool) { self.lock().fail_writes = fail; }

  /// Raw contents of a slot, bypassing any repository.
  pub fn raw(&self, slot: Slot) -> Option<String> {
    self.lock().slots.get(&slot).cloned()
  }

  fn lock(&self) -> MutexGuard<'_, Inner> {
    self.inner.lock().unwrap_or_else(PoisonError::into_inner)
  }
}

impl SlotStore for MemoryStore {
  type Error = MemoryStoreError;

  async fn read(&self, slot: Slot) -> Result<Option<String>, MemoryStoreError> {
    Ok(self.raw(slot))
  }

  async fn write(
    &self,
    slots: Vec<(Slot, String)>,
    expected: u64,
  ) -> Result<Option<u64>, MemoryStoreError> {
    let mut inner = self.lock();
    if inner.fail_writes {
      return Err(MemoryStoreError::WritesDisabled);
    }
    if inner.revision != expected {
      return Ok(None);
    }
    inner.slots.extend(slots);
    inner.revision += 1;
    Ok(Some(inner.revision))
  }

  async fn revision(&self) -> Result<u64, MemoryStoreError> {
    Ok(self.lock().revision)
  }
}
