//! Wall-clock time arithmetic at minute granularity

use std::fmt;
use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

/// Minutes in a day; `24:00` is a valid end-of-day bound but never a slot start.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A time of day with no date and no timezone, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub const MIDNIGHT: ClockTime = ClockTime(0);
    pub const END_OF_DAY: ClockTime = ClockTime(MINUTES_PER_DAY);

    /// Build from hours and minutes, rejecting out-of-range values.
    pub fn from_hm(hours: u16, minutes: u16) -> Option<Self> {
        if minutes >= 60 {
            return None;
        }
        let total = hours.checked_mul(60)?.checked_add(minutes)?;
        (total <= MINUTES_PER_DAY).then_some(ClockTime(total))
    }

    pub fn from_minutes(minutes: u16) -> Option<Self> {
        (minutes <= MINUTES_PER_DAY).then_some(ClockTime(minutes))
    }

    /// Parse `HH:mm` or `HH:mm:ss`. Seconds are truncated.
    pub fn parse(value: &str) -> Result<Self, TimeParseError> {
        let err = || TimeParseError(value.to_string());
        let mut parts = value.trim().split(':');

        let hours = parts.next().ok_or_else(err)?;
        let minutes = parts.next().ok_or_else(err)?;
        if let Some(seconds) = parts.next() {
            let seconds: u16 = seconds.parse().map_err(|_| err())?;
            if seconds >= 60 {
                return Err(err());
            }
        }
        if parts.next().is_some() || hours.is_empty() || minutes.len() != 2 {
            return Err(err());
        }

        let hours: u16 = hours.parse().map_err(|_| err())?;
        let minutes: u16 = minutes.parse().map_err(|_| err())?;
        Self::from_hm(hours, minutes).ok_or_else(err)
    }

    pub fn minutes(self) -> u16 {
        self.0
    }

    pub fn hour(self) -> u16 {
        self.0 / 60
    }

    pub fn minute(self) -> u16 {
        self.0 % 60
    }

    /// Add minutes, saturating at `24:00`.
    pub fn add_minutes(self, minutes: u32) -> ClockTime {
        let total = u32::from(self.0).saturating_add(minutes);
        ClockTime(total.min(u32::from(MINUTES_PER_DAY)) as u16)
    }

    /// Like `add_minutes` but returns `None` when the result would pass `24:00`.
    pub fn checked_add_minutes(self, minutes: u32) -> Option<ClockTime> {
        let total = u32::from(self.0).checked_add(minutes)?;
        u16::try_from(total).ok().and_then(Self::from_minutes)
    }

    /// Signed distance in minutes from `self` to `later`.
    pub fn minutes_until(self, later: ClockTime) -> i32 {
        i32::from(later.0) - i32::from(self.0)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for ClockTime {
    type Err = TimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ClockTime::parse(s)
    }
}

impl From<chrono::NaiveTime> for ClockTime {
    fn from(time: chrono::NaiveTime) -> Self {
        use chrono::Timelike;
        ClockTime((time.hour() * 60 + time.minute()) as u16)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ClockTime::parse(&raw).map_err(de::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time '{0}', expected HH:mm")]
pub struct TimeParseError(pub String);

/// Half-open interval `[start, end)` of wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeRange {
    pub start: ClockTime,
    pub end: ClockTime,
}

impl TimeRange {
    /// Returns `None` for empty or inverted ranges.
    pub fn new(start: ClockTime, end: ClockTime) -> Option<Self> {
        (start < end).then_some(TimeRange { start, end })
    }

    /// The interval a service of `duration` minutes occupies when it starts at `start`.
    pub fn starting_at(start: ClockTime, duration: u32) -> Self {
        TimeRange {
            start,
            end: start.add_minutes(duration),
        }
    }

    pub fn contains(&self, time: ClockTime) -> bool {
        self.start <= time && time < self.end
    }

    pub fn overlaps(&self, other: &TimeRange) -> bool {
        self.start < other.end && self.end > other.start
    }

    pub fn duration_minutes(&self) -> u32 {
        u32::from(self.end.minutes() - self.start.minutes())
    }
}

/// Build a range from two optional wire times, as found on lunch breaks and
/// partial closures.
pub fn optional_range(start: Option<ClockTime>, end: Option<ClockTime>) -> Option<TimeRange> {
    match (start, end) {
        (Some(start), Some(end)) => TimeRange::new(start, end),
        _ => None,
    }
}
