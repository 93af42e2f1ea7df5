//! [`Engine`]: the repository together with its presenter, renderer, and
//! banner slot.
//!
//! Every user action and every scheduler tick goes through one `&mut Engine`,
//! so a host that shares the engine behind a single mutex serialises every
//! read-modify-persist sequence.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use tracing::warn;
use uuid::Uuid;

use crate::{
  Result, ValidationError,
  clock::{Clock, SystemClock},
  notify::{Banner, BannerSlot, NullPresenter, Presenter},
  reminder::{NewReminder, Reminder},
  repository::Repository,
  settings::Settings,
  store::SlotStore,
  view::{Board, NullRenderer, Renderer, format_instant},
};

pub struct Engine<S> {
  pub(crate) repo:       Repository<S>,
  pub(crate) clock:      Arc<dyn Clock>,
  pub(crate) presenter:  Box<dyn Presenter>,
  pub(crate) renderer:   Box<dyn Renderer>,
  pub(crate) banner:     BannerSlot,
  pub(crate) banner_ttl: TimeDelta,
}

// ─── Builder ─────────────────────────────────────────────────────────────────

pub struct EngineBuilder<S> {
  store:      S,
  clock:      Arc<dyn Clock>,
  presenter:  Box<dyn Presenter>,
  renderer:   Box<dyn Renderer>,
  grace:      TimeDelta,
  banner_ttl: TimeDelta,
}

impl<S: SlotStore> EngineBuilder<S> {
  pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
    self.clock = Arc::new(clock);
    self
  }

  pub fn presenter(mut self, presenter: impl Presenter + 'static) -> Self {
    self.presenter = Box::new(presenter);
    self
  }

  pub fn renderer(mut self, renderer: impl Renderer + 'static) -> Self {
    self.renderer = Box::new(renderer);
    self
  }

  /// Apply the grace window and banner lifetime from `settings`.
  pub fn settings(mut self, settings: &Settings) -> Self {
    self.grace = settings.grace_window();
    self.banner_ttl = settings.banner_ttl();
    self
  }

  /// Load the store and render the initial board.
  pub async fn open(self) -> Result<Engine<S>> {
    let repo =
      Repository::open(self.store, Arc::clone(&self.clock), self.grace).await?;
    let mut engine = Engine {
      repo,
      clock: self.clock,
      presenter: self.presenter,
      renderer: self.renderer,
      banner: BannerSlot::default(),
      banner_ttl: self.banner_ttl,
    };
    engine.refresh().await;
    Ok(engine)
  }
}

// ─── Engine ──────────────────────────────────────────────────────────────────

impl<S: SlotStore> Engine<S> {
  pub fn builder(store: S) -> EngineBuilder<S> {
    let defaults = Settings::default();
    EngineBuilder {
      store,
      clock: Arc::new(SystemClock),
      presenter: Box::new(NullPresenter),
      renderer: Box::new(NullRenderer),
      grace: defaults.grace_window(),
      banner_ttl: defaults.banner_ttl(),
    }
  }

  /// Create a reminder from user input.
  pub async fn create(
    &mut self,
    input: NewReminder,
  ) -> Result<Reminder, ValidationError> {
    self.sync().await;
    let reminder = self.repo.create(input).await?;
    self.presenter.notice(&format!(
      "Added reminder \"{}\" at {}",
      reminder.text,
      format_instant(reminder.due_at)
    ));
    self.refresh().await;
    Ok(reminder)
  }

  /// All active reminders after cleanup; see [`Repository::list_active`].
  pub async fn list_active(&mut self) -> Vec<Reminder> {
    self.sync().await;
    self.repo.list_active().await
  }

  pub async fn pending(&mut self) -> Vec<Reminder> {
    self.sync().await;
    self.repo.cleanup().await;
    self.repo.pending()
  }

  pub async fn completed(&mut self) -> Vec<Reminder> {
    self.sync().await;
    self.repo.cleanup().await;
    self.repo.completed()
  }

  pub async fn find(&mut self, id: Uuid) -> Option<Reminder> {
    self.sync().await;
    self.repo.find_by_id(id).cloned()
  }

  pub async fn history(&mut self) -> Vec<Reminder> {
    self.sync().await;
    self.repo.history().to_vec()
  }

  /// Project the current collection without notifying the renderer.
  pub async fn board(&mut self) -> Board {
    let reminders = self.list_active().await;
    Board::project(&reminders, self.clock.now())
  }

  /// Re-project the active collection and hand it to the renderer.
  pub async fn refresh(&mut self) {
    let reminders = self.repo.list_active().await;
    let board = Board::project(&reminders, self.clock.now());
    self.renderer.render(&board);
  }

  // ── Banner ────────────────────────────────────────────────────────────

  /// The banner currently on display, if any.
  pub fn current_banner(&mut self) -> Option<Banner> {
    if self.banner.expire(self.clock.now()) {
      self.presenter.clear();
    }
    self.banner.current(self.clock.now()).cloned()
  }

  /// Clear the banner slot unconditionally.
  pub fn dismiss(&mut self) {
    self.banner.clear();
    self.presenter.clear();
  }

  /// Clear the banner slot only if it still shows banner `generation`.
  pub fn dismiss_if(&mut self, generation: u64) -> bool {
    let cleared = self.banner.clear_if(generation);
    if cleared {
      self.presenter.clear();
    }
    cleared
  }

  pub(crate) fn surface(&mut self, reminder: &Reminder) {
    let banner = self.banner.show(reminder, self.banner_ttl, self.clock.now());
    self.presenter.show(banner);
  }

  // ── Accessors ─────────────────────────────────────────────────────────

  pub fn repository(&self) -> &Repository<S> { &self.repo }

  pub fn now(&self) -> DateTime<Utc> { self.clock.now() }

  /// Reload from the store if another view wrote to it. Failures are logged;
  /// the in-memory state is used as-is.
  pub(crate) async fn sync(&mut self) {
    if let Err(e) = self.repo.sync().await {
      warn!("could not check store for changes: {e}");
    }
  }
}
