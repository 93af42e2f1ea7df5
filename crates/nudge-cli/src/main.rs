//! `nudge`: timed reminders from the terminal.
//!
//! # Usage
//!
//! ```
//! nudge add "Call guest" --at +30m --priority urgent
//! nudge list --pending
//! nudge done 6f1c…
//! nudge watch                  # run the scheduler in this terminal
//! nudge serve --config nudge.toml
//! ```
//!
//! Every command opens the same SQLite file, so a `watch` or `serve` process
//! picks up reminders added from another shell on its next tick.

mod config;
mod present;
mod when;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};
use axum::Router;
use clap::{Parser, Subcommand};
use nudge_api::AppState;
use nudge_core::{
  engine::Engine,
  lifecycle::Outcome,
  reminder::{NewReminder, Priority},
  store::SlotStore,
};
use nudge_scheduler::{Scheduler, shared};
use nudge_store_sqlite::SqliteSlotStore;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::{info, level_filters::LevelFilter, warn};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use config::AppConfig;
use present::{BoardPrinter, LogPresenter, TerminalPresenter, reminder_line};
use when::When;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "nudge", version, about = "Timed reminders from the terminal")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, global = true, default_value = "nudge.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Add a reminder.
  Add {
    text:     String,
    /// RFC 3339 time or an offset such as `+30m`, `+2h`, `+1d`. Defaults to
    /// one hour from now.
    #[arg(long)]
    at:       Option<When>,
    /// normal, important, or urgent.
    #[arg(short, long, default_value = "normal")]
    priority: Priority,
  },
  /// List active reminders.
  List {
    #[arg(long, conflicts_with = "completed")]
    pending:   bool,
    #[arg(long)]
    completed: bool,
  },
  /// Mark a reminder done.
  Done { id: Uuid },
  /// Complete a reminder, or reopen it if it is already done.
  Toggle { id: Uuid },
  /// Delete a reminder.
  Rm { id: Uuid },
  /// Show every completion ever recorded.
  History,
  /// Run a single due check and exit.
  Check,
  /// Run the scheduler in this terminal until interrupted.
  Watch,
  /// Serve the JSON API with the scheduler running.
  Serve,
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .with_writer(std::io::stderr)
    .init();

  let cli = Cli::parse();
  let cfg = AppConfig::load(&cli.config)?;

  let store = SqliteSlotStore::open(&cfg.store_path)
    .await
    .with_context(|| format!("failed to open store at {:?}", cfg.store_path))?;

  match cli.command {
    Command::Watch => watch(store, &cfg).await,
    Command::Serve => serve(store, &cfg).await,
    command => run_once(store, &cfg, command).await,
  }
}

// ─── One-shot commands ────────────────────────────────────────────────────────

async fn run_once(
  store: SqliteSlotStore,
  cfg: &AppConfig,
  command: Command,
) -> anyhow::Result<()> {
  let mut engine = Engine::builder(store)
    .settings(&cfg.engine)
    .presenter(TerminalPresenter)
    .open()
    .await
    .context("failed to load reminders")?;
  let now = engine.now();

  match command {
    Command::Add { text, at, priority } => {
      let due_at = at.unwrap_or_default().resolve(now);
      engine
        .create(NewReminder::new(text, due_at).with_priority(priority))
        .await
        .context("could not add reminder")?;
    }
    Command::List { pending, completed } => {
      let reminders = if pending {
        engine.pending().await
      } else if completed {
        engine.completed().await
      } else {
        engine.list_active().await
      };
      if reminders.is_empty() {
        println!("No reminders set");
      }
      for reminder in &reminders {
        println!("{}", reminder_line(reminder, now));
      }
    }
    Command::Done { id } => match engine.complete(id).await {
      Outcome::Applied(_) => {}
      Outcome::Unchanged => println!("Already completed"),
      Outcome::Missing => println!("No reminder {id}"),
    },
    Command::Toggle { id } => match engine.toggle_completion(id).await {
      Outcome::Applied(r) if !r.completed => println!("Reopened: \"{}\"", r.text),
      Outcome::Applied(_) | Outcome::Unchanged => {}
      Outcome::Missing => println!("No reminder {id}"),
    },
    Command::Rm { id } => {
      if !engine.remove(id).await {
        println!("No reminder {id}");
      }
    }
    Command::History => {
      for reminder in engine.history().await {
        println!("{}", reminder_line(&reminder, now));
      }
    }
    Command::Check => {
      let report = engine.check_due().await;
      println!("{} due, {} pruned", report.surfaced.len(), report.pruned);
    }
    Command::Watch | Command::Serve => bail!("not a one-shot command"),
  }

  ensure_saved(&engine, &cfg.store_path)
}

/// A one-shot command fails if its changes never reached the store.
fn ensure_saved<S: SlotStore>(
  engine: &Engine<S>,
  store_path: &Path,
) -> anyhow::Result<()> {
  if engine.repository().is_dirty() {
    bail!("changes could not be saved to {store_path:?}");
  }
  Ok(())
}

// ─── Long-running commands ────────────────────────────────────────────────────

async fn watch(store: SqliteSlotStore, cfg: &AppConfig) -> anyhow::Result<()> {
  let engine = Engine::builder(store)
    .settings(&cfg.engine)
    .presenter(TerminalPresenter)
    .renderer(BoardPrinter)
    .open()
    .await
    .context("failed to load reminders")?;

  let scheduler = Scheduler::new(shared(engine), cfg.engine.tick_period());
  scheduler.start();
  shutdown_signal().await;
  scheduler.stop();
  Ok(())
}

async fn serve(store: SqliteSlotStore, cfg: &AppConfig) -> anyhow::Result<()> {
  let engine = Engine::builder(store)
    .settings(&cfg.engine)
    .presenter(LogPresenter)
    .open()
    .await
    .context("failed to load reminders")?;

  let state = AppState::new(Scheduler::new(
    shared(engine),
    cfg.engine.tick_period(),
  ));
  state.scheduler.start();

  let app = Router::new()
    .nest("/api", nudge_api::api_router(state.clone()))
    .layer(TraceLayer::new_for_http());
  let address = cfg.address();

  info!("Listening on http://{address}/api");
  let listener = TcpListener::bind(&address)
    .await
    .with_context(|| format!("failed to bind {address}"))?;

  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("server error")?;

  state.scheduler.stop();
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    warn!("could not listen for ctrl-c: {e}");
    std::future::pending::<()>().await;
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeDelta;
  use nudge_core::memory::MemoryStore;

  use super::*;

  #[tokio::test]
  async fn unsaved_changes_fail_a_one_shot_command() {
    let store = MemoryStore::new();
    let mut engine = Engine::builder(store.clone()).open().await.unwrap();
    let path = Path::new("nudge.db");
    assert!(ensure_saved(&engine, path).is_ok());

    store.fail_writes(true);
    let due = engine.now() + TimeDelta::minutes(5);
    engine.create(NewReminder::new("unsaved", due)).await.unwrap();
    let err = ensure_saved(&engine, path).unwrap_err();
    assert!(err.to_string().contains("could not be saved"));

    store.fail_writes(false);
    engine.remove(Uuid::new_v4()).await;
    assert!(ensure_saved(&engine, path).is_ok());
  }
}
