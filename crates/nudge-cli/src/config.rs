//! Runtime configuration: a TOML file overlaid with `NUDGE_*` environment
//! variables.
//!
//! ```toml
//! store_path = "~/.local/share/nudge/nudge.db"
//! host       = "127.0.0.1"
//! port       = 5233
//!
//! [engine]
//! tick_secs   = 30
//! grace_secs  = 3600
//! banner_secs = 10
//! ```
//!
//! Nested keys use a double underscore in the environment, e.g.
//! `NUDGE_ENGINE__TICK_SECS=5`.

use std::path::{Path, PathBuf};

use anyhow::Context as _;
use nudge_core::settings::Settings;
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
  pub store_path: PathBuf,
  pub host:       String,
  pub port:       u16,
  pub engine:     Settings,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("~/.local/share/nudge/nudge.db"),
      host:       "127.0.0.1".to_owned(),
      port:       5233,
      engine:     Settings::default(),
    }
  }
}

impl AppConfig {
  /// Read `path` if it exists, then apply the environment on top.
  pub fn load(path: &Path) -> anyhow::Result<Self> {
    let builder = config::Config::builder()
      .add_source(config::File::from(path).required(false));
    Self::build(builder)
  }

  fn build(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
  ) -> anyhow::Result<Self> {
    let settings = builder
      .add_source(
        config::Environment::with_prefix("NUDGE")
          .prefix_separator("_")
          .separator("__")
          .try_parsing(true),
      )
      .build()
      .context("failed to read config file")?;

    let mut cfg: Self = settings
      .try_deserialize()
      .context("failed to deserialise config")?;
    cfg.store_path = expand_tilde(&cfg.store_path);
    Ok(cfg)
  }

  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

/// Expand a leading `~` to the user's home directory.
fn expand_tilde(path: &Path) -> PathBuf {
  let s = path.to_string_lossy();
  if let Some(rest) = s.strip_prefix("~/")
    && let Ok(home) = std::env::var("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}
