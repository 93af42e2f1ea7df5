//! Scheduler loop tests on a paused tokio clock.

use std::{
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
  time::Duration,
};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use nudge_core::{
  clock::ManualClock,
  engine::Engine,
  memory::MemoryStore,
  notify::{Banner, Presenter, Tone},
  reminder::{NewReminder, Priority},
};

use crate::{Scheduler, SharedEngine, WatchRenderer, shared};

// ─── Fixtures ────────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct Counter {
  shown:   Arc<AtomicUsize>,
  cleared: Arc<AtomicUsize>,
  tones:   Arc<AtomicUsize>,
}

impl Presenter for Counter {
  fn show(&self, _banner: &Banner) { self.shown.fetch_add(1, Ordering::SeqCst); }

  fn clear(&self) { self.cleared.fetch_add(1, Ordering::SeqCst); }

  fn play(&self, _tone: Tone) { self.tones.fetch_add(1, Ordering::SeqCst); }
}

fn t0() -> DateTime<Utc> {
  Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

struct Rig {
  engine:    SharedEngine<MemoryStore>,
  clock:     ManualClock,
  presenter: Counter,
}

async fn rig() -> Rig {
  let clock = ManualClock::new(t0());
  let presenter = Counter::default();
  let engine = Engine::builder(MemoryStore::new())
    .clock(clock.clone())
    .presenter(presenter.clone())
    .open()
    .await
    .unwrap();
  Rig {
    engine: shared(engine),
    clock,
    presenter,
  }
}

/// Add a reminder due in five minutes, then move the clock past it.
async fn add_overdue(rig: &Rig, text: &str, priority: Priority) {
  rig
    .engine
    .lock()
    .await
    .create(
      NewReminder::new(text, t0() + TimeDelta::minutes(5)).with_priority(priority),
    )
    .await
    .unwrap();
  rig.clock.set(t0() + TimeDelta::minutes(6));
}

const PERIOD: Duration = Duration::from_secs(30);

// ─── Loop ────────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn first_tick_runs_immediately() {
  let rig = rig().await;
  add_overdue(&rig, "stretch", Priority::Important).await;

  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);
  scheduler.start();
  tokio::time::sleep(Duration::from_millis(1)).await;

  assert_eq!(scheduler.status().ticks, 1);
  assert_eq!(rig.presenter.shown.load(Ordering::SeqCst), 1);
  assert_eq!(rig.presenter.tones.load(Ordering::SeqCst), 1);
  assert!(rig.engine.lock().await.current_banner().is_some());
}

#[tokio::test(start_paused = true)]
async fn starting_twice_keeps_a_single_loop() {
  let rig = rig().await;
  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);
  scheduler.start();
  scheduler.start();

  tokio::time::sleep(Duration::from_secs(31)).await;
  // One tick at start, one at the 30 s mark.
  assert_eq!(scheduler.status().ticks, 2);
}

#[tokio::test(start_paused = true)]
async fn due_reminder_notifies_once_across_ticks() {
  let rig = rig().await;
  add_overdue(&rig, "once", Priority::Urgent).await;

  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);
  scheduler.start();
  tokio::time::sleep(Duration::from_secs(95)).await;

  assert_eq!(scheduler.status().ticks, 4);
  assert_eq!(rig.presenter.shown.load(Ordering::SeqCst), 1);
  assert_eq!(rig.presenter.tones.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn disabled_loop_skips_ticks_but_manual_check_runs() {
  let rig = rig().await;
  add_overdue(&rig, "paused", Priority::Normal).await;

  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);
  scheduler.disable();
  scheduler.start();
  tokio::time::sleep(Duration::from_secs(61)).await;

  let status = scheduler.status();
  assert!(status.running);
  assert!(!status.enabled);
  assert_eq!(status.ticks, 0);
  assert_eq!(rig.presenter.shown.load(Ordering::SeqCst), 0);

  let report = scheduler.check_now().await;
  assert_eq!(report.surfaced.len(), 1);
  assert_eq!(scheduler.status().ticks, 1);

  scheduler.enable();
  tokio::time::sleep(Duration::from_secs(30)).await;
  assert_eq!(scheduler.status().ticks, 2);
}

#[tokio::test(start_paused = true)]
async fn status_reflects_start_and_stop() {
  let rig = rig().await;
  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);

  let idle = scheduler.status();
  assert!(!idle.running);
  assert!(idle.enabled);
  assert_eq!(idle.period_ms, 30_000);
  assert_eq!(idle.last_check_at, None);

  scheduler.start();
  tokio::time::sleep(Duration::from_millis(1)).await;
  let running = scheduler.status();
  assert!(running.running);
  assert_eq!(running.last_check_at, Some(t0()));
  assert_eq!(running.next_check_at, Some(t0() + TimeDelta::seconds(30)));

  assert!(scheduler.stop());
  assert!(!scheduler.stop());
  let stopped = scheduler.status();
  assert!(!stopped.running);
  assert_eq!(stopped.next_check_at, None);
  assert_eq!(stopped.last_check_at, Some(t0()));
}

#[tokio::test]
async fn sub_second_periods_are_reported_in_milliseconds() {
  let rig = rig().await;
  let fast = Scheduler::new(Arc::clone(&rig.engine), Duration::from_millis(250));
  assert_eq!(fast.status().period_ms, 250);

  let clamped = Scheduler::new(Arc::clone(&rig.engine), Duration::ZERO);
  assert_eq!(clamped.status().period_ms, 1);
}

#[tokio::test(start_paused = true)]
async fn stopped_loop_no_longer_ticks() {
  let rig = rig().await;
  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);
  scheduler.start();
  tokio::time::sleep(Duration::from_millis(1)).await;
  scheduler.stop();

  tokio::time::sleep(Duration::from_secs(120)).await;
  assert_eq!(scheduler.status().ticks, 1);
}

// ─── Auto-dismiss ────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn normal_banner_is_dismissed_after_its_lifetime() {
  let rig = rig().await;
  add_overdue(&rig, "water plants", Priority::Normal).await;
  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);

  scheduler.check_now().await;
  tokio::time::sleep(Duration::from_secs(9)).await;
  assert!(rig.engine.lock().await.current_banner().is_some());

  tokio::time::sleep(Duration::from_secs(2)).await;
  assert!(rig.engine.lock().await.current_banner().is_none());
  assert_eq!(rig.presenter.cleared.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn stopping_cancels_pending_dismissals() {
  let rig = rig().await;
  add_overdue(&rig, "water plants", Priority::Normal).await;
  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);
  scheduler.start();
  tokio::time::sleep(Duration::from_millis(1)).await;
  assert_eq!(rig.presenter.shown.load(Ordering::SeqCst), 1);

  scheduler.stop();
  tokio::time::sleep(Duration::from_secs(20)).await;
  assert_eq!(rig.presenter.cleared.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_scheduler_cancels_pending_dismissals() {
  let rig = rig().await;
  add_overdue(&rig, "water plants", Priority::Normal).await;
  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);
  scheduler.check_now().await;

  drop(scheduler);
  tokio::time::sleep(Duration::from_secs(20)).await;
  assert_eq!(rig.presenter.cleared.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn urgent_banner_stays_until_dismissed() {
  let rig = rig().await;
  add_overdue(&rig, "server down", Priority::Urgent).await;
  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);

  scheduler.check_now().await;
  tokio::time::sleep(Duration::from_secs(600)).await;

  let mut engine = rig.engine.lock().await;
  assert!(engine.current_banner().is_some());
  engine.dismiss();
  assert!(engine.current_banner().is_none());
}

#[tokio::test(start_paused = true)]
async fn stale_timer_leaves_newer_banner_alone() {
  let rig = rig().await;
  add_overdue(&rig, "first", Priority::Normal).await;
  let scheduler = Scheduler::new(Arc::clone(&rig.engine), PERIOD);
  scheduler.check_now().await;

  tokio::time::sleep(Duration::from_secs(5)).await;
  rig
    .engine
    .lock()
    .await
    .create(NewReminder::new("second", t0() + TimeDelta::minutes(7)))
    .await
    .unwrap();
  rig.clock.set(t0() + TimeDelta::minutes(8));
  scheduler.check_now().await;

  // The first banner's timer fires here and must not clear "second".
  tokio::time::sleep(Duration::from_secs(6)).await;
  let banner = rig.engine.lock().await.current_banner();
  assert_eq!(banner.map(|b| b.text), Some("second".to_owned()));

  tokio::time::sleep(Duration::from_secs(5)).await;
  assert!(rig.engine.lock().await.current_banner().is_none());
}

// ─── Watch ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn watch_subscribers_see_every_refresh() {
  let clock = ManualClock::new(t0());
  let renderer = WatchRenderer::new();
  let mut first = renderer.subscribe();
  let second = renderer.subscribe();

  let mut engine = Engine::builder(MemoryStore::new())
    .clock(clock.clone())
    .renderer(renderer.clone())
    .open()
    .await
    .unwrap();
  assert!(renderer.latest().is_empty());

  first.borrow_and_update();
  let r = engine
    .create(NewReminder::new("tea", t0() + TimeDelta::minutes(10)))
    .await
    .unwrap();

  assert!(first.has_changed().unwrap());
  assert_eq!(first.borrow_and_update().pending[0].id, r.id);
  assert_eq!(second.borrow().pending.len(), 1);

  engine.complete(r.id).await;
  let board = renderer.latest();
  assert!(board.pending.is_empty());
  assert_eq!(board.completed[0].id, r.id);
}
