//! [`Repository`]: sole owner of the active collection and the history log.
//!
//! Both collections are loaded from a [`SlotStore`] on open and written back
//! after every mutation. A failed write is never fatal: the in-memory state
//! stays authoritative, the repository is marked dirty, and the next mutation
//! (or scheduler tick) retries.
//!
//! Writes are conditional on the store revision last seen here. When another
//! handle got there first, the stored collections are merged into ours before
//! retrying: reminders changed here since the last successful write keep their
//! local state, every other reminder takes the stored one.

use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
  Error, Result, ValidationError,
  clock::Clock,
  reminder::{NewReminder, Reminder},
  store::{Slot, SlotStore},
};

pub struct Repository<S> {
  store:    S,
  clock:    Arc<dyn Clock>,
  grace:    TimeDelta,
  active:   Vec<Reminder>,
  history:  Vec<Reminder>,
  /// Store revision as of our last read or write.
  revision: u64,
  /// In-memory state has not reached the store yet.
  dirty:    bool,
  /// Ids mutated here since the last successful write.
  touched:  HashSet<Uuid>,
}

/// Conditional writes attempted before a persist gives up on a busy store.
const WRITE_ATTEMPTS: usize = 3;

impl<S: SlotStore> Repository<S> {
  /// Load both slots from `store`. Missing slots read as empty collections.
  pub async fn open(
    store: S,
    clock: Arc<dyn Clock>,
    grace: TimeDelta,
  ) -> Result<Self> {
    let mut repo = Self {
      store,
      clock,
      grace,
      active: Vec::new(),
      history: Vec::new(),
      revision: 0,
      dirty: false,
      touched: HashSet::new(),
    };
    repo.reload().await?;
    Ok(repo)
  }

  async fn reload(&mut self) -> Result<()> {
    let revision = self.store.revision().await.map_err(Error::persistence)?;
    let mut active = self.read_slot(Slot::Active).await?;
    dedup_by_id(&mut active);
    self.history = self.read_slot(Slot::History).await?;
    self.active = active;
    self.revision = revision;
    self.touched.clear();
    Ok(())
  }

  /// Fold the stored collections into the local ones. Ids in `touched` keep
  /// their local state, or stay deleted; every other id takes the stored
  /// state. History becomes the union of both logs.
  async fn merge(&mut self) -> Result<()> {
    let revision = self.store.revision().await.map_err(Error::persistence)?;
    let mut stored = self.read_slot(Slot::Active).await?;
    dedup_by_id(&mut stored);
    let mut history = self.read_slot(Slot::History).await?;

    let stored_ids: HashSet<Uuid> = stored.iter().map(|r| r.id).collect();
    let local = std::mem::take(&mut self.active);
    let touched = &self.touched;
    let mut active: Vec<Reminder> = stored
      .into_iter()
      .filter_map(|r| {
        if touched.contains(&r.id) {
          local.iter().find(|l| l.id == r.id).cloned()
        } else {
          Some(r)
        }
      })
      .collect();
    active.extend(
      local
        .into_iter()
        .filter(|r| touched.contains(&r.id) && !stored_ids.contains(&r.id)),
    );

    for entry in std::mem::take(&mut self.history) {
      if !history.contains(&entry) {
        history.push(entry);
      }
    }

    debug!(
      known = self.revision,
      found = revision,
      kept = self.touched.len(),
      "merged concurrent store changes"
    );
    self.active = active;
    self.history = history;
    self.revision = revision;
    Ok(())
  }

  async fn read_slot(&self, slot: Slot) -> Result<Vec<Reminder>> {
    match self.store.read(slot).await.map_err(Error::persistence)? {
      Some(raw) if !raw.trim().is_empty() => Ok(serde_json::from_str(&raw)?),
      _ => Ok(Vec::new()),
    }
  }

  /// Pick up writes made through other handles on the same store.
  ///
  /// Returns `true` if the collections changed. While the repository holds
  /// unpersisted changes the stored state is merged in rather than replacing
  /// them.
  pub async fn sync(&mut self) -> Result<bool> {
    let revision = self.store.revision().await.map_err(Error::persistence)?;
    if revision == self.revision {
      return Ok(false);
    }
    if self.dirty {
      info!(
        known = self.revision,
        found = revision,
        "store changed while local changes are unsaved; merging"
      );
      self.merge().await?;
    } else {
      debug!(known = self.revision, found = revision, "store changed; reloading");
      self.reload().await?;
    }
    Ok(true)
  }

  /// Write both collections to the store in one atomic write.
  pub async fn persist(&mut self) -> Result<()> {
    let result = self.write_through().await;
    self.dirty = result.is_err();
    if result.is_ok() {
      self.touched.clear();
    }
    result
  }

  async fn write_through(&mut self) -> Result<()> {
    for _ in 0..WRITE_ATTEMPTS {
      let slots = vec![
        (Slot::Active, serde_json::to_string(&self.active)?),
        (Slot::History, serde_json::to_string(&self.history)?),
      ];
      let written = self
        .store
        .write(slots, self.revision)
        .await
        .map_err(Error::persistence)?;
      match written {
        Some(revision) => {
          self.revision = revision;
          return Ok(());
        }
        None => {
          debug!(known = self.revision, "store moved before write; merging");
          self.merge().await?;
        }
      }
    }
    Err(Error::Conflict(WRITE_ATTEMPTS))
  }

  /// Persist, logging instead of failing. Returns whether the write landed.
  pub(crate) async fn flush(&mut self) -> bool {
    match self.persist().await {
      Ok(()) => true,
      Err(e) => {
        warn!("could not persist reminders, will retry: {e}");
        false
      }
    }
  }

  // ── Writes ────────────────────────────────────────────────────────────

  /// Validate and append a new reminder. A failed write leaves the reminder
  /// in memory and marks the repository dirty.
  pub async fn create(
    &mut self,
    input: NewReminder,
  ) -> Result<Reminder, ValidationError> {
    let now = self.clock.now();
    let text = input.text.trim();
    if text.is_empty() {
      return Err(ValidationError::EmptyText);
    }
    if input.due_at <= now {
      return Err(ValidationError::DueNotInFuture {
        due_at: input.due_at,
        now,
      });
    }

    let reminder = Reminder {
      id:           self.fresh_id(),
      text:         text.to_owned(),
      due_at:       input.due_at,
      priority:     input.priority,
      created_at:   now,
      triggered:    false,
      completed:    false,
      completed_at: None,
    };
    self.active.push(reminder.clone());
    self.touched.insert(reminder.id);
    self.flush().await;
    Ok(reminder)
  }

  /// Remove a reminder from the active collection. Absent ids are not an
  /// error. Returns whether anything was removed.
  pub async fn delete(&mut self, id: Uuid) -> bool {
    let before = self.active.len();
    self.active.retain(|r| r.id != id);
    let removed = self.active.len() != before;
    if removed {
      self.touched.insert(id);
    }
    if removed || self.dirty {
      self.flush().await;
    }
    removed
  }

  /// Apply the cleanup policy: drop resolved reminders whose completion is
  /// older than the grace window. Returns how many were pruned.
  pub async fn cleanup(&mut self) -> usize {
    let now = self.clock.now();
    let grace = self.grace;
    let touched = &mut self.touched;
    let before = self.active.len();
    self.active.retain(|r| {
      let expired = r.is_expired(now, grace);
      if expired {
        touched.insert(r.id);
      }
      !expired
    });
    let pruned = before - self.active.len();
    if pruned > 0 {
      debug!(pruned, "pruned resolved reminders");
      self.flush().await;
    }
    pruned
  }

  /// Apply `change` to reminder `id`, which reports whether it altered
  /// anything. Returns that flag and the reminder's resulting state.
  pub(crate) fn modify(
    &mut self,
    id: Uuid,
    change: impl FnOnce(&mut Reminder) -> bool,
  ) -> Option<(bool, Reminder)> {
    let reminder = self.active.iter_mut().find(|r| r.id == id)?;
    let changed = change(reminder);
    let after = reminder.clone();
    if changed {
      self.touched.insert(id);
    }
    Some((changed, after))
  }

  pub(crate) fn append_history(&mut self, reminder: Reminder) {
    self.history.push(reminder);
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Every active reminder after cleanup: pending ones ascending by due time,
  /// then completed ones most recent first.
  pub async fn list_active(&mut self) -> Vec<Reminder> {
    self.cleanup().await;
    let mut all = self.pending();
    all.extend(self.completed());
    all
  }

  /// Incomplete reminders, ascending by due time.
  pub fn pending(&self) -> Vec<Reminder> {
    let mut pending: Vec<_> =
      self.active.iter().filter(|r| !r.completed).cloned().collect();
    sort_by_due(&mut pending);
    pending
  }

  /// Completed reminders, most recently completed first.
  pub fn completed(&self) -> Vec<Reminder> {
    let mut completed: Vec<_> =
      self.active.iter().filter(|r| r.completed).cloned().collect();
    completed.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
    completed
  }

  /// Every active reminder that is due and not yet triggered, oldest first.
  /// Completion does not exclude a reminder.
  pub fn due(&self, now: DateTime<Utc>) -> Vec<Reminder> {
    let mut due: Vec<_> =
      self.active.iter().filter(|r| r.is_due(now)).cloned().collect();
    sort_by_due(&mut due);
    due
  }

  pub fn find_by_id(&self, id: Uuid) -> Option<&Reminder> {
    self.active.iter().find(|r| r.id == id)
  }

  /// The completion log in append order.
  pub fn history(&self) -> &[Reminder] { &self.history }

  pub fn is_dirty(&self) -> bool { self.dirty }

  fn fresh_id(&self) -> Uuid {
    loop {
      let id = Uuid::new_v4();
      let taken = self.active.iter().chain(&self.history).any(|r| r.id == id);
      if !taken {
        return id;
      }
    }
  }
}

fn sort_by_due(reminders: &mut [Reminder]) {
  reminders.sort_by(|a, b| {
    a.due_at.cmp(&b.due_at).then(a.created_at.cmp(&b.created_at))
  });
}

/// Keep the first occurrence of each id.
fn dedup_by_id(reminders: &mut Vec<Reminder>) {
  let mut seen = HashSet::new();
  reminders.retain(|r| seen.insert(r.id));
}
