//! [`SqliteSlotStore`]: the SQLite implementation of [`SlotStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use tracing::debug;

use nudge_core::store::{Slot, SlotStore};

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A slot store backed by a single SQLite file.
///
/// Clones share one connection.
#[derive(Clone)]
pub struct SqliteSlotStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteSlotStore {
  /// Open (or create) a store at `path`, creating parent directories, and run
  /// schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let path = path.as_ref();
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      tokio::fs::create_dir_all(parent).await?;
    }
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    debug!(path = %path.display(), "opened slot store");
    Ok(store)
  }

  /// Open an in-memory store for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── SlotStore impl ──────────────────────────────────────────────────────────

impl SlotStore for SqliteSlotStore {
  type Error = Error;

  async fn read(&self, slot: Slot) -> Result<Option<String>> {
    let name = slot.name();
    let value = self
      .conn
      .call(move |conn| {
        let value = conn
          .query_row(
            "SELECT value_json FROM slots WHERE name = ?1",
            rusqlite::params![name],
            |r| r.get::<_, String>(0),
          )
          .optional()?;
        Ok(value)
      })
      .await?;
    Ok(value)
  }

  async fn write(
    &self,
    slots: Vec<(Slot, String)>,
    expected: u64,
  ) -> Result<Option<u64>> {
    let updated_at = Utc::now().to_rfc3339();
    let expected = i64::try_from(expected).unwrap_or(i64::MAX);
    let rows: Vec<(&'static str, String)> = slots
      .into_iter()
      .map(|(slot, value)| (slot.name(), value))
      .collect();

    let revision = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // Claims the write lock and checks the caller's view in one step.
        let bumped = tx.execute(
          "UPDATE revision SET value = value + 1 WHERE id = 0 AND value = ?1",
          rusqlite::params![expected],
        )?;
        if bumped == 0 {
          return Ok(None);
        }
        for (name, value) in &rows {
          tx.execute(
            "INSERT INTO slots (name, value_json, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (name) DO UPDATE SET
               value_json = excluded.value_json,
               updated_at = excluded.updated_at",
            rusqlite::params![name, value, updated_at],
          )?;
        }
        let revision: i64 = tx.query_row(
          "SELECT value FROM revision WHERE id = 0",
          [],
          |r| r.get(0),
        )?;
        tx.commit()?;
        Ok(Some(revision))
      })
      .await?;

    if revision.is_none() {
      debug!(expected, "rejected write from a stale view");
    }
    Ok(revision.map(i64::unsigned_abs))
  }

  async fn revision(&self) -> Result<u64> {
    let revision: i64 = self
      .conn
      .call(|conn| {
        let value = conn.query_row(
          "SELECT value FROM revision WHERE id = 0",
          [],
          |r| r.get(0),
        )?;
        Ok(value)
      })
      .await?;
    Ok(revision.unsigned_abs())
  }
}
