//! Duration value object used for config values (plan limit, timeslice,
//! probe interval)

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Default recorder timeslice (1 second)
pub const DEFAULT_CHUNK_INTERVAL_SECS: u64 = 1;

/// Default interval between transport health probes (5 seconds)
pub const DEFAULT_HEALTH_INTERVAL_SECS: u64 = 5;

const MS_PER_SEC: u64 = 1_000;
const MS_PER_MIN: u64 = 60 * MS_PER_SEC;
const MS_PER_HOUR: u64 = 60 * MS_PER_MIN;

/// Non-zero span of time with millisecond resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    millis: u64,
}

impl Duration {
    pub const fn from_millis(millis: u64) -> Self {
        Self { millis }
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self {
            millis: secs * MS_PER_SEC,
        }
    }

    pub const fn default_chunk_interval() -> Self {
        Self::from_secs(DEFAULT_CHUNK_INTERVAL_SECS)
    }

    pub const fn default_health_interval() -> Self {
        Self::from_secs(DEFAULT_HEALTH_INTERVAL_SECS)
    }

    /// Whole seconds, truncated
    pub const fn as_secs(&self) -> u64 {
        self.millis / MS_PER_SEC
    }

    pub const fn as_millis(&self) -> u64 {
        self.millis
    }

    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.millis)
    }
}

fn unit_millis(unit: &str) -> Option<u64> {
    match unit {
        "h" => Some(MS_PER_HOUR),
        "m" => Some(MS_PER_MIN),
        "s" => Some(MS_PER_SEC),
        "ms" => Some(1),
        _ => None,
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Accepts a sequence of `<number><unit>` terms with units `h`, `m`,
    /// `s` and `ms`, e.g. `5m`, `1m30s`, `500ms`. Bare numbers are rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || DurationParseError {
            input: s.to_string(),
        };
        let input = s.trim().to_ascii_lowercase();
        let mut rest = input.as_str();
        let mut total: u64 = 0;

        if rest.is_empty() {
            return Err(err());
        }

        while !rest.is_empty() {
            let digits = rest.find(|c: char| !c.is_ascii_digit()).ok_or_else(err)?;
            if digits == 0 {
                return Err(err());
            }
            let value: u64 = rest[..digits].parse().map_err(|_| err())?;
            rest = &rest[digits..];

            let unit_len = rest.find(|c: char| c.is_ascii_digit()).unwrap_or(rest.len());
            let scale = unit_millis(&rest[..unit_len]).ok_or_else(err)?;
            rest = &rest[unit_len..];

            total = value
                .checked_mul(scale)
                .and_then(|ms| total.checked_add(ms))
                .ok_or_else(err)?;
        }

        if total == 0 {
            return Err(err());
        }
        Ok(Self::from_millis(total))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut left = self.millis;
        let mut wrote = false;
        for (unit, scale) in [("h", MS_PER_HOUR), ("m", MS_PER_MIN), ("s", MS_PER_SEC)] {
            if left >= scale {
                write!(f, "{}{}", left / scale, unit)?;
                left %= scale;
                wrote = true;
            }
        }
        if left > 0 || !wrote {
            write!(f, "{}ms", left)?;
        }
        Ok(())
    }
}

impl From<StdDuration> for Duration {
    fn from(d: StdDuration) -> Self {
        Self::from_millis(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}
