//! [`Scheduler`]: the recurring due-check loop.
//!
//! At most one loop task exists per scheduler: [`Scheduler::start`] aborts
//! the previous task before spawning a new one. The first tick runs as soon
//! as the loop starts, then every `period`.

use std::{
  sync::{
    Arc, Mutex, MutexGuard, PoisonError,
    atomic::{AtomicBool, AtomicU64, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, TimeDelta, Utc};
use nudge_core::{due::TickReport, notify::Banner, store::SlotStore};
use serde::Serialize;
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tracing::{debug, info};

use crate::SharedEngine;

/// Snapshot of the loop for status endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchedulerStatus {
  pub running:       bool,
  pub enabled:       bool,
  pub period_ms:     u64,
  /// Ticks executed so far, including manual checks.
  pub ticks:         u64,
  pub last_check_at: Option<DateTime<Utc>>,
  /// Only present while the loop is running.
  pub next_check_at: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct LoopState {
  enabled:    AtomicBool,
  ticks:      AtomicU64,
  last_check: Mutex<Option<DateTime<Utc>>>,
  /// Pending auto-dismiss timers.
  dismissals: Mutex<Vec<JoinHandle<()>>>,
}

impl LoopState {
  fn track_dismissal(&self, task: JoinHandle<()>) {
    let mut dismissals = lock(&self.dismissals);
    dismissals.retain(|task| !task.is_finished());
    dismissals.push(task);
  }

  fn cancel_dismissals(&self) {
    for task in lock(&self.dismissals).drain(..) {
      task.abort();
    }
  }
}

pub struct Scheduler<S> {
  engine: SharedEngine<S>,
  period: Duration,
  task:   Mutex<Option<JoinHandle<()>>>,
  state:  Arc<LoopState>,
}

impl<S: SlotStore + 'static> Scheduler<S> {
  /// A stopped, enabled scheduler. `period` is clamped to at least one
  /// millisecond.
  pub fn new(engine: SharedEngine<S>, period: Duration) -> Self {
    Self {
      engine,
      period: period.max(Duration::from_millis(1)),
      task: Mutex::new(None),
      state: Arc::new(LoopState {
        enabled:    AtomicBool::new(true),
        ticks:      AtomicU64::new(0),
        last_check: Mutex::new(None),
        dismissals: Mutex::new(Vec::new()),
      }),
    }
  }

  pub fn engine(&self) -> &SharedEngine<S> { &self.engine }

  /// Start the loop, cancelling any loop this scheduler already runs.
  ///
  /// Must be called from within a tokio runtime.
  pub fn start(&self) {
    let mut task = lock(&self.task);
    if let Some(previous) = task.take() {
      previous.abort();
      debug!("cancelled previous scheduler loop");
    }

    let engine = Arc::clone(&self.engine);
    let state = Arc::clone(&self.state);
    let period = self.period;
    *task = Some(tokio::spawn(async move {
      let mut interval = tokio::time::interval(period);
      interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
      loop {
        interval.tick().await;
        if !state.enabled.load(Ordering::SeqCst) {
          debug!("scheduler disabled; skipping tick");
          continue;
        }
        run_tick(&engine, &state).await;
      }
    }));
    info!(period_ms = self.period_ms(), "scheduler started");
  }

  /// Cancel the loop and any pending auto-dismiss timers. Returns whether a
  /// loop was running.
  pub fn stop(&self) -> bool {
    self.state.cancel_dismissals();
    let stopped = lock(&self.task).take().map(|task| task.abort()).is_some();
    if stopped {
      info!("scheduler stopped");
    }
    stopped
  }

  /// Resume ticking. The timer itself keeps running while disabled.
  pub fn enable(&self) {
    self.state.enabled.store(true, Ordering::SeqCst);
    info!("scheduler enabled");
  }

  pub fn disable(&self) {
    self.state.enabled.store(false, Ordering::SeqCst);
    info!("scheduler disabled");
  }

  pub fn is_enabled(&self) -> bool { self.state.enabled.load(Ordering::SeqCst) }

  /// Run one tick now, regardless of the timer or the enabled flag.
  pub async fn check_now(&self) -> TickReport {
    run_tick(&self.engine, &self.state).await
  }

  pub fn status(&self) -> SchedulerStatus {
    let running = lock(&self.task)
      .as_ref()
      .is_some_and(|task| !task.is_finished());
    let last_check_at = *lock(&self.state.last_check);
    let period = TimeDelta::from_std(self.period).unwrap_or(TimeDelta::MAX);
    SchedulerStatus {
      running,
      enabled: self.is_enabled(),
      period_ms: self.period_ms(),
      ticks: self.state.ticks.load(Ordering::SeqCst),
      last_check_at,
      next_check_at: if running {
        last_check_at.and_then(|at| at.checked_add_signed(period))
      } else {
        None
      },
    }
  }

  fn period_ms(&self) -> u64 {
    u64::try_from(self.period.as_millis()).unwrap_or(u64::MAX)
  }
}

impl<S> Drop for Scheduler<S> {
  fn drop(&mut self) {
    self.state.cancel_dismissals();
    if let Some(task) = lock(&self.task).take() {
      task.abort();
    }
  }
}

async fn run_tick<S: SlotStore + 'static>(
  engine: &SharedEngine<S>,
  state: &LoopState,
) -> TickReport {
  let (report, banner) = {
    let mut engine = engine.lock().await;
    let report = engine.check_due().await;
    (report, engine.current_banner())
  };

  state.ticks.fetch_add(1, Ordering::SeqCst);
  *lock(&state.last_check) = Some(report.checked_at);

  if !report.surfaced.is_empty()
    && let Some(banner) = banner
  {
    schedule_dismissal(engine, state, banner, report.checked_at);
  }
  report
}

/// Clear `banner` once it expires, unless a newer banner replaced it first.
fn schedule_dismissal<S: SlotStore + 'static>(
  engine: &SharedEngine<S>,
  state: &LoopState,
  banner: Banner,
  now: DateTime<Utc>,
) {
  let Some(expires_at) = banner.expires_at else {
    return;
  };
  let delay = (expires_at - now).to_std().unwrap_or_default();
  let engine = Arc::clone(engine);
  state.track_dismissal(tokio::spawn(async move {
    tokio::time::sleep(delay).await;
    if engine.lock().await.dismiss_if(banner.generation) {
      debug!(generation = banner.generation, "banner auto-dismissed");
    }
  }));
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
