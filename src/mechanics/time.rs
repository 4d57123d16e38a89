//! Time mechanics: resolve heterogeneous time values onto the simulation clock.
//!
//! Hour and duration offsets land on whole minutes after `start_time`, so
//! resolving the same logical time twice always gives the same minute.
//! Rounding is half-to-even throughout.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{SimError, SimResult};

/// A point in time as a caller may express it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SimTime {
    /// Hours after `start_time` (fractional allowed).
    Hours(f64),
    /// Elapsed duration after `start_time`.
    Elapsed(Duration),
    /// Absolute timestamp, used as-is.
    At(NaiveDateTime),
}

impl From<f64> for SimTime {
    fn from(hours: f64) -> Self {
        SimTime::Hours(hours)
    }
}

impl From<Duration> for SimTime {
    fn from(d: Duration) -> Self {
        SimTime::Elapsed(d)
    }
}

impl From<NaiveDateTime> for SimTime {
    fn from(t: NaiveDateTime) -> Self {
        SimTime::At(t)
    }
}

/// Normalize `time` into an absolute timestamp relative to `start_time`.
pub fn resolve(time: SimTime, start_time: NaiveDateTime) -> SimResult<NaiveDateTime> {
    match time {
        SimTime::Hours(h) => {
            if !h.is_finite() {
                return Err(SimError::time_kind(format!("non-finite hour offset {h}")));
            }
            offset_minutes(start_time, (h * 60.0).round_ties_even())
        }
        SimTime::Elapsed(d) => {
            let secs = d.num_milliseconds() as f64 / 1000.0;
            offset_minutes(start_time, (secs / 60.0).round_ties_even())
        }
        SimTime::At(t) => Ok(t),
    }
}

fn offset_minutes(start_time: NaiveDateTime, minutes: f64) -> SimResult<NaiveDateTime> {
    // i64 minutes beyond this overflow chrono's millisecond range anyway.
    if minutes.abs() > (i64::MAX / 60_000) as f64 {
        return Err(SimError::time_kind(format!("{minutes} minutes is out of range")));
    }
    Duration::try_minutes(minutes as i64)
        .and_then(|d| start_time.checked_add_signed(d))
        .ok_or_else(|| {
            SimError::time_kind(format!("{minutes} minutes after {start_time} is out of range"))
        })
}

/// Whole minutes since midnight of `t`'s own date (floored).
#[inline]
pub fn minute_of_day(t: NaiveDateTime) -> u32 {
    t.time().num_seconds_from_midnight() / 60
}

/// Midnight at the start of `date`.
#[inline]
pub fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}
