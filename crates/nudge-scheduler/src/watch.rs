//! [`WatchRenderer`]: fans the latest board out to any number of views.

use std::sync::Arc;

use nudge_core::view::{Board, Renderer};
use tokio::sync::watch;

/// Publishes every rendered board on a watch channel. Views subscribe and
/// always see the most recent projection; none of them keeps its own copy of
/// the reminders.
#[derive(Clone)]
pub struct WatchRenderer {
  tx: Arc<watch::Sender<Board>>,
}

impl WatchRenderer {
  pub fn new() -> Self {
    let (tx, _rx) = watch::channel(Board::default());
    Self { tx: Arc::new(tx) }
  }

  pub fn subscribe(&self) -> watch::Receiver<Board> { self.tx.subscribe() }

  /// The most recently rendered board.
  pub fn latest(&self) -> Board { self.tx.borrow().clone() }
}

impl Default for WatchRenderer {
  fn default() -> Self { Self::new() }
}

impl Renderer for WatchRenderer {
  fn render(&self, board: &Board) { self.tx.send_replace(board.clone()); }
}
