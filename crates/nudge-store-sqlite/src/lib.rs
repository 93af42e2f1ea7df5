//! SQLite backend for nudge: both reminder slots and the write revision live
//! in one database file, so separate processes opening the same path see each
//! other's writes.
//!
//! Access goes through [`tokio_rusqlite`]'s background thread.

mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteSlotStore;
