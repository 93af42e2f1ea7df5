//! Terminal and log-backed presenters, plus a board printer for `watch`.

use std::io::{self, Write as _};

use chrono::{DateTime, Utc};
use nudge_core::{
  notify::{Banner, Presenter, Tone},
  reminder::{Priority, Reminder},
  view::{Board, Card, Renderer, format_instant, time_remaining},
};
use tracing::info;

// ─── Terminal ─────────────────────────────────────────────────────────────────

/// Prints banners and notices to stdout; tones ring the terminal bell.
pub struct TerminalPresenter;

impl Presenter for TerminalPresenter {
  fn show(&self, banner: &Banner) {
    let label = match banner.priority {
      Priority::Normal => "Reminder",
      Priority::Important => "Important",
      Priority::Urgent => "URGENT",
    };
    println!(
      "{} {label}: {} (due {})",
      banner.glyph, banner.text, banner.due_label
    );
  }

  fn clear(&self) {}

  fn play(&self, _tone: Tone) {
    let mut out = io::stdout();
    let _ = out.write_all(b"\x07").and_then(|()| out.flush());
  }

  fn notice(&self, message: &str) { println!("{message}"); }
}

// ─── Log ──────────────────────────────────────────────────────────────────────

/// For `serve`: there is no terminal to draw on, so everything goes to the
/// tracing subscriber.
pub struct LogPresenter;

impl Presenter for LogPresenter {
  fn show(&self, banner: &Banner) {
    info!(
      id = %banner.reminder_id,
      priority = %banner.priority,
      expires_at = ?banner.expires_at,
      "banner: {}",
      banner.text
    );
  }

  fn clear(&self) { info!("banner cleared"); }

  fn play(&self, tone: Tone) {
    info!(
      hz = tone.frequency_hz(),
      ms = tone.duration().as_millis(),
      gain = tone.gain(),
      "tone"
    );
  }

  fn notice(&self, message: &str) { info!("{message}"); }
}

// ─── Board ────────────────────────────────────────────────────────────────────

/// Reprints the whole board every time it changes.
pub struct BoardPrinter;

impl Renderer for BoardPrinter {
  fn render(&self, board: &Board) {
    println!("── {} ──", format_instant(board.as_of));
    if board.is_empty() {
      println!("  No reminders set");
      return;
    }
    for card in &board.pending {
      println!("{}", card_line(card));
    }
    if !board.completed.is_empty() {
      println!("  completed:");
      for card in &board.completed {
        println!("{}", card_line(card));
      }
    }
  }
}

fn card_line(card: &Card) -> String {
  match &card.completed_label {
    Some(done) => {
      format!("  {} [x] {}  (done {done})  {}", card.glyph, card.text, card.id)
    }
    None => format!(
      "  {} [ ] {}  {} ({})  {}",
      card.glyph, card.text, card.due_label, card.remaining, card.id
    ),
  }
}

/// One line per reminder for the one-shot `list` and `history` commands.
pub fn reminder_line(reminder: &Reminder, now: DateTime<Utc>) -> String {
  let mark = if reminder.completed { "x" } else { " " };
  let remaining = if reminder.completed {
    String::new()
  } else {
    format!(" ({})", time_remaining(reminder.due_at, now))
  };
  format!(
    "{} {} [{mark}] {}  {}{remaining}",
    reminder.id,
    reminder.priority.glyph(),
    reminder.text,
    format_instant(reminder.due_at),
  )
}
