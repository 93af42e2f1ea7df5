//! Parsing for `--at`: an RFC 3339 instant or an offset like `+30m`.

use std::str::FromStr;

use anyhow::{Context as _, bail};
use chrono::{DateTime, TimeDelta, Utc};

/// When a new reminder falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum When {
  At(DateTime<Utc>),
  /// Relative to the moment the reminder is created.
  In(TimeDelta),
}

impl Default for When {
  fn default() -> Self { Self::In(TimeDelta::hours(1)) }
}

impl When {
  pub fn resolve(self, now: DateTime<Utc>) -> DateTime<Utc> {
    match self {
      Self::At(at) => at,
      Self::In(offset) => {
        now.checked_add_signed(offset).unwrap_or(DateTime::<Utc>::MAX_UTC)
      }
    }
  }
}

impl FromStr for When {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> anyhow::Result<Self> {
    let s = s.trim();
    let Some(offset) = s.strip_prefix('+') else {
      let at = DateTime::parse_from_rfc3339(s)
        .with_context(|| format!("not an RFC 3339 time or +offset: {s:?}"))?;
      return Ok(Self::At(at.with_timezone(&Utc)));
    };

    let Some(unit) = offset.chars().last() else {
      bail!("empty offset: {s:?}");
    };
    let amount: i64 = offset[..offset.len() - unit.len_utf8()]
      .parse()
      .with_context(|| format!("bad offset amount in {s:?}"))?;
    let delta = match unit {
      'm' => TimeDelta::try_minutes(amount),
      'h' => TimeDelta::try_hours(amount),
      'd' => TimeDelta::try_days(amount),
      _ => bail!("offset unit must be m, h, or d: {s:?}"),
    };
    match delta {
      Some(delta) => Ok(Self::In(delta)),
      None => bail!("offset out of range: {s:?}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn offsets() {
    assert_eq!("+30m".parse::<When>().unwrap(), When::In(TimeDelta::minutes(30)));
    assert_eq!("+2h".parse::<When>().unwrap(), When::In(TimeDelta::hours(2)));
    assert_eq!(" +1d ".parse::<When>().unwrap(), When::In(TimeDelta::days(1)));
  }

  #[test]
  fn rfc3339_converts_to_utc() {
    let when: When = "2024-03-01T10:00:00+01:00".parse().unwrap();
    assert_eq!(
      when,
      When::At(Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap())
    );
  }

  #[test]
  fn rejects_garbage() {
    assert!("+".parse::<When>().is_err());
    assert!("+5s".parse::<When>().is_err());
    assert!("+xm".parse::<When>().is_err());
    assert!("tomorrow".parse::<When>().is_err());
  }

  #[test]
  fn default_is_one_hour_out() {
    let now = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
    assert_eq!(When::default().resolve(now), now + TimeDelta::hours(1));
  }
}
