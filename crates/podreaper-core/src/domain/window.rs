//! Auto-delete window - 毎日決まった時刻に全 pod を回収する
//!
//! The window opens at a configured local time of day (`HH:MM` in an IANA
//! timezone) and stays open for `tolerance`. A pass that lands inside the
//! window deletes every managed workload regardless of its TTL.
//!
//! The tolerance has to cover the driver's poll interval, otherwise a day can
//! be skipped entirely. `ReconcilerBuilder` checks that relationship at
//! startup.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

/// Default window length.
pub const DEFAULT_WINDOW_TOLERANCE: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WindowError {
    #[error("invalid auto-delete time '{0}': expected HH:MM")]
    InvalidFormat(String),

    #[error("auto-delete time '{0}' is out of range")]
    OutOfRange(String),
}

/// A wall-clock time of day with minute precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u32,
    minute: u32,
}

impl TimeOfDay {
    pub fn new(hour: u32, minute: u32) -> Result<Self, WindowError> {
        if hour > 23 || minute > 59 {
            return Err(WindowError::OutOfRange(format!("{hour}:{minute}")));
        }
        Ok(Self { hour, minute })
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    pub fn minute(&self) -> u32 {
        self.minute
    }
}

impl FromStr for TimeOfDay {
    type Err = WindowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || WindowError::InvalidFormat(s.to_string());

        let (hour, minute) = s.split_once(':').ok_or_else(invalid)?;
        let component = |part: &str| -> Result<u32, WindowError> {
            if part.is_empty() || part.len() > 2 || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid());
            }
            part.parse::<u32>().map_err(|_| invalid())
        };
        let (hour, minute) = (component(hour)?, component(minute)?);

        Self::new(hour, minute).map_err(|_| WindowError::OutOfRange(s.to_string()))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Is `now` inside today's auto-delete window?
///
/// "Today" is the calendar date of `now` in `tz`. The window is
/// `[target, target + tolerance)`. A target that falls into a DST gap does not
/// exist on that date, so the window stays closed; an ambiguous target resolves
/// to the earlier instant.
pub fn is_within_auto_delete_window<Tz: TimeZone>(
    now: DateTime<Utc>,
    tz: &Tz,
    target_time: &str,
    tolerance: Duration,
) -> Result<bool, WindowError> {
    let target_time: TimeOfDay = target_time.parse()?;

    let today = now.with_timezone(tz).date_naive();
    let Some(local_target) = today.and_hms_opt(target_time.hour(), target_time.minute(), 0) else {
        return Err(WindowError::OutOfRange(target_time.to_string()));
    };
    let Some(target) = tz.from_local_datetime(&local_target).earliest() else {
        return Ok(false);
    };

    let tolerance = TimeDelta::from_std(tolerance).unwrap_or(TimeDelta::MAX);
    let elapsed = now.signed_duration_since(target);

    Ok(elapsed >= TimeDelta::zero() && elapsed < tolerance)
}

/// Window policy as configured: target time, zone and length.
///
/// The target is kept as the raw configured string so that a bad value is
/// reported on every pass instead of once at startup.
#[derive(Debug, Clone)]
pub struct AutoDeleteWindow<Tz: TimeZone> {
    target_time: String,
    tz: Tz,
    tolerance: Duration,
}

impl<Tz: TimeZone> AutoDeleteWindow<Tz> {
    pub fn new(target_time: impl Into<String>, tz: Tz, tolerance: Duration) -> Self {
        Self {
            target_time: target_time.into(),
            tz,
            tolerance,
        }
    }

    pub fn target_time(&self) -> &str {
        &self.target_time
    }

    pub fn tolerance(&self) -> Duration {
        self.tolerance
    }

    pub fn is_open(&self, now: DateTime<Utc>) -> Result<bool, WindowError> {
        is_within_auto_delete_window(now, &self.tz, &self.target_time, self.tolerance)
    }
}
