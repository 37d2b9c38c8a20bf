//! Schedule models (weekly hours, closures)

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::availability::time::{optional_range, ClockTime, TimeRange};

// ---------------------------------------------------------------------------
// WeeklySchedule
// ---------------------------------------------------------------------------

/// Recurring opening hours for one day of the week, for a tenant or a barber
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySchedule {
    /// Owning barber, absent for tenant-wide hours
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barber_id: Option<String>,
    /// Day of week (0=Sunday, 6=Saturday)
    pub day_of_week: u8,
    #[serde(default)]
    pub is_closed: bool,
    /// Opening time (HH:mm)
    #[schema(value_type = Option<String>, example = "09:00")]
    #[serde(default)]
    pub start_time: Option<ClockTime>,
    /// Closing time (HH:mm)
    #[schema(value_type = Option<String>, example = "18:00")]
    #[serde(default)]
    pub end_time: Option<ClockTime>,
    #[schema(value_type = Option<String>, example = "12:00")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunch_start_time: Option<ClockTime>,
    #[schema(value_type = Option<String>, example = "13:00")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lunch_end_time: Option<ClockTime>,
}

impl WeeklySchedule {
    /// Opening hours for the day, `None` when closed or incompletely defined.
    pub fn open_hours(&self) -> Option<(ClockTime, ClockTime)> {
        if self.is_closed {
            return None;
        }
        Some((self.start_time?, self.end_time?))
    }

    /// Lunch break, only meaningful on an open day.
    pub fn lunch(&self) -> Option<TimeRange> {
        if self.is_closed {
            return None;
        }
        optional_range(self.lunch_start_time, self.lunch_end_time)
    }
}

/// Day-of-week index used on the wire (0=Sunday).
pub fn day_of_week(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Find the entry for `date`'s weekday.
pub fn schedule_for(schedules: &[WeeklySchedule], date: NaiveDate) -> Option<&WeeklySchedule> {
    let dow = day_of_week(date);
    schedules.iter().find(|s| s.day_of_week == dow)
}

// ---------------------------------------------------------------------------
// Closure
// ---------------------------------------------------------------------------

/// A one-off exception to the weekly schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Closure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Closure date (YYYY-MM-DD)
    #[serde(with = "super::wire::date")]
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    #[serde(default)]
    pub reason: Option<String>,
    /// Barber concerned, null for the whole shop
    #[serde(default)]
    pub barber_id: Option<String>,
    /// Absent means full day
    #[serde(default)]
    pub is_full_day: Option<bool>,
    #[schema(value_type = Option<String>, example = "14:00")]
    #[serde(default)]
    pub start_time: Option<ClockTime>,
    #[schema(value_type = Option<String>, example = "16:00")]
    #[serde(default)]
    pub end_time: Option<ClockTime>,
}

impl Closure {
    /// Whether this closure concerns `barber_id` on `date`.
    pub fn applies_to(&self, date: NaiveDate, barber_id: &str) -> bool {
        self.date == date
            && self
                .barber_id
                .as_deref()
                .map_or(true, |id| id == barber_id)
    }

    /// Closures created before partial closures existed carry no flag and
    /// close the whole day.
    pub fn is_full_day(&self) -> bool {
        self.is_full_day.unwrap_or(true)
    }

    /// The excluded range of a partial closure, `None` when it is full-day or
    /// its times are missing or inverted.
    pub fn partial_range(&self) -> Option<TimeRange> {
        if self.is_full_day() {
            return None;
        }
        optional_range(self.start_time, self.end_time)
    }
}
