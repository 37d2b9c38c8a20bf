//! Booking models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::availability::time::{ClockTime, TimeRange};

/// Booking lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
    Completed,
}

impl BookingStatus {
    /// Pending and confirmed bookings hold their time slot.
    pub fn occupies_slot(self) -> bool {
        matches!(self, BookingStatus::Pending | BookingStatus::Confirmed)
    }
}

/// A booking, as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    #[serde(with = "super::wire::date")]
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "10:00")]
    pub start_time: ClockTime,
    #[schema(value_type = String, example = "10:30")]
    pub end_time: ClockTime,
    pub status: BookingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub barber_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Booking {
    /// Interval held by the booking, `None` for malformed bookings whose end
    /// is not after their start.
    pub fn interval(&self) -> Option<TimeRange> {
        TimeRange::new(self.start_time, self.end_time)
    }

    pub fn duration_minutes(&self) -> u32 {
        self.interval().map_or(0, |r| r.duration_minutes())
    }

    /// Whether this booking blocks time for `barber_id` on `date`.
    pub fn blocks(&self, date: NaiveDate, barber_id: &str) -> bool {
        self.status.occupies_slot()
            && self.date == date
            && self.barber_id.as_deref().map_or(true, |id| id == barber_id)
    }
}

/// Create booking request
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBooking {
    #[validate(length(min = 1, message = "barberId is required"))]
    pub barber_id: String,
    #[validate(length(min = 1, message = "serviceId is required"))]
    pub service_id: String,
    #[serde(with = "super::wire::date")]
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "10:00")]
    pub start_time: ClockTime,
    /// Filled from the service duration when omitted
    #[schema(value_type = Option<String>, example = "10:30")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<ClockTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,
    #[validate(length(max = 500, message = "notes must be at most 500 characters"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Reschedule request (new date and start time)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleBooking {
    #[serde(with = "super::wire::date")]
    #[schema(value_type = String, format = Date)]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "11:00")]
    pub start_time: ClockTime,
}

/// Body sent upstream on `PATCH /bookings/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBooking {
    #[serde(with = "super::wire::date")]
    pub date: NaiveDate,
    pub start_time: ClockTime,
    pub end_time: ClockTime,
}
