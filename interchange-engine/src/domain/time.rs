//! Timetable clock handling.
//!
//! Schedules give times as "HH:MM" strings with a separate day offset per
//! stop. Waiting times between services only look at the clock and assume
//! a connection that departs "earlier" than the arrival leaves the next day.

use std::fmt;

use chrono::Duration;

/// Minutes in a day.
pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Error returned when parsing an invalid time string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time {input:?}: {reason}")]
pub struct TimeError {
    input: String,
    reason: &'static str,
}

impl TimeError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// A time of day with minute precision.
///
/// # Examples
///
/// ```
/// use interchange_engine::domain::ClockTime;
///
/// let t = ClockTime::parse("23:50").unwrap();
/// assert_eq!(t.minutes_since_midnight(), 23 * 60 + 50);
/// assert_eq!(t.to_string(), "23:50");
///
/// // Seconds are accepted and dropped
/// assert_eq!(ClockTime::parse("07:05:30").unwrap().to_string(), "07:05");
///
/// assert!(ClockTime::parse("24:00").is_err());
/// assert!(ClockTime::parse("7.05").is_err());
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Build from hour and minute components.
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self(hour * 60 + minute))
    }

    /// Parse "HH:MM", "H:MM" or "HH:MM:SS".
    pub fn parse(s: &str) -> Result<Self, TimeError> {
        let trimmed = s.trim();
        let mut parts = trimmed.split(':');

        let hour = parts
            .next()
            .filter(|p| (1..=2).contains(&p.len()))
            .ok_or_else(|| TimeError::new(s, "expected HH:MM format"))?;
        let minute = parts
            .next()
            .filter(|p| p.len() == 2)
            .ok_or_else(|| TimeError::new(s, "expected HH:MM format"))?;
        if let Some(seconds) = parts.next()
            && (seconds.len() != 2 || parse_digits(seconds).is_none_or(|v| v > 59))
        {
            return Err(TimeError::new(s, "invalid seconds"));
        }
        if parts.next().is_some() {
            return Err(TimeError::new(s, "too many components"));
        }

        let hour = parse_digits(hour).ok_or_else(|| TimeError::new(s, "invalid hour digits"))?;
        let minute =
            parse_digits(minute).ok_or_else(|| TimeError::new(s, "invalid minute digits"))?;

        if hour > 23 {
            return Err(TimeError::new(s, "hour must be 0-23"));
        }
        if minute > 59 {
            return Err(TimeError::new(s, "minute must be 0-59"));
        }

        Ok(Self(hour * 60 + minute))
    }

    /// Minutes since midnight (0..1440).
    pub fn minutes_since_midnight(&self) -> i64 {
        i64::from(self.0)
    }

    pub fn hour(&self) -> u16 {
        self.0 / 60
    }

    pub fn minute(&self) -> u16 {
        self.0 % 60
    }
}

fn parse_digits(s: &str) -> Option<u16> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

impl fmt::Debug for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockTime({:02}:{:02})", self.hour(), self.minute())
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

/// A scheduled arrival or departure as it appears in a timetable.
///
/// Origins have no arrival and termini have no departure; feeds mark those
/// with placeholders such as `"Source"` or `"--"`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopTime {
    /// A real clock time.
    At(ClockTime),
    /// Placeholder: the stop has no time of this kind.
    NotApplicable,
    /// The feed supplied something we could not read.
    Malformed(String),
}

impl StopTime {
    /// Interpret a raw timetable string.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if is_placeholder(trimmed) {
            return StopTime::NotApplicable;
        }
        match ClockTime::parse(trimmed) {
            Ok(t) => StopTime::At(t),
            Err(_) => StopTime::Malformed(raw.to_string()),
        }
    }

    pub fn clock(&self) -> Option<ClockTime> {
        match self {
            StopTime::At(t) => Some(*t),
            _ => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, StopTime::Malformed(_))
    }
}

impl fmt::Display for StopTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopTime::At(t) => write!(f, "{t}"),
            StopTime::NotApplicable => f.write_str("--"),
            StopTime::Malformed(raw) => f.write_str(raw),
        }
    }
}

fn is_placeholder(s: &str) -> bool {
    s.is_empty()
        || s == "-"
        || s == "--"
        || s.eq_ignore_ascii_case("source")
        || s.eq_ignore_ascii_case("destination")
        || s.eq_ignore_ascii_case("na")
        || s.eq_ignore_ascii_case("n/a")
}

/// Waiting time between arriving at `arrival` and leaving at `departure`.
///
/// A departure whose clock reading is before the arrival is taken to be on
/// the following day.
///
/// # Examples
///
/// ```
/// use interchange_engine::domain::{ClockTime, waiting_time};
/// use chrono::Duration;
///
/// let arr = ClockTime::parse("23:50").unwrap();
/// let dep = ClockTime::parse("00:10").unwrap();
/// assert_eq!(waiting_time(arr, dep), Duration::minutes(20));
/// ```
pub fn waiting_time(arrival: ClockTime, departure: ClockTime) -> Duration {
    let arr = arrival.minutes_since_midnight();
    let mut dep = departure.minutes_since_midnight();
    if dep < arr {
        dep += MINUTES_PER_DAY;
    }
    Duration::minutes(dep - arr)
}

/// Minutes elapsed between two day-offset-qualified clock readings.
///
/// Falls back to wrapping within a day when the day offsets do not account
/// for a clock that runs backwards (feeds that omit day numbers).
pub fn elapsed_minutes(from: ClockTime, from_day: u16, to: ClockTime, to_day: u16) -> i64 {
    let start = i64::from(from_day) * MINUTES_PER_DAY + from.minutes_since_midnight();
    let end = i64::from(to_day) * MINUTES_PER_DAY + to.minutes_since_midnight();
    let elapsed = end - start;
    if elapsed < 0 {
        elapsed.rem_euclid(MINUTES_PER_DAY)
    } else {
        elapsed
    }
}

/// The legal range of waiting times at an interchange (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitWindow {
    pub min: Duration,
    pub max: Duration,
}

impl WaitWindow {
    pub fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, wait: Duration) -> bool {
        wait >= self.min && wait <= self.max
    }

    /// Waiting time for the connection if it is legal.
    pub fn check(&self, arrival: ClockTime, departure: ClockTime) -> Option<Duration> {
        let wait = waiting_time(arrival, departure);
        self.contains(wait).then_some(wait)
    }
}
