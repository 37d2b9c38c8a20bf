//! Availability request/response models

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::availability::{time::ClockTime, AvailabilityOutcome, EffectiveWindow, SlotState};

use super::booking::Booking;

/// One entry of the backend availability feed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AvailabilitySlot {
    #[schema(value_type = String, example = "09:30")]
    pub time: ClockTime,
    pub available: bool,
}

/// Backend response of `GET /bookings/availability`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendAvailability {
    #[serde(default)]
    pub slots: Vec<AvailabilitySlot>,
}

/// Service offered by a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub duration_minutes: u32,
}

/// Query parameters for availability
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AvailabilityQuery {
    pub barber_id: String,
    /// Date (YYYY-MM-DD)
    pub date: String,
    /// Service whose duration is used for fitting
    pub service_id: Option<String>,
    /// Explicit duration, takes precedence over `serviceId`
    pub duration_minutes: Option<u32>,
    /// Booking being rescheduled, ignored in overlap checks
    pub exclude_booking_id: Option<String>,
}

/// Validated availability request
#[derive(Debug, Clone, PartialEq)]
pub struct AvailabilityRequest {
    pub barber_id: String,
    pub date: NaiveDate,
    pub duration: ServiceDuration,
    pub exclude_booking_id: Option<String>,
}

/// How the service duration is known
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceDuration {
    Minutes(u32),
    Service(String),
}

/// One candidate slot and its state
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct SlotView {
    #[schema(value_type = String, example = "09:30")]
    pub time: ClockTime,
    pub available: bool,
    pub state: SlotState,
}

/// Effective window used for slot generation
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WindowView {
    #[schema(value_type = String)]
    pub effective_start: ClockTime,
    #[schema(value_type = String)]
    pub effective_end: ClockTime,
    #[schema(value_type = Option<String>)]
    pub lunch_start: Option<ClockTime>,
    #[schema(value_type = Option<String>)]
    pub lunch_end: Option<ClockTime>,
}

impl From<&EffectiveWindow> for WindowView {
    fn from(window: &EffectiveWindow) -> Self {
        Self {
            effective_start: window.start,
            effective_end: window.end,
            lunch_start: window.lunch.map(|l| l.start),
            lunch_end: window.lunch.map(|l| l.end),
        }
    }
}

/// Availability for a barber on a date
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityResponse {
    pub barber_id: String,
    #[schema(value_type = String, format = Date)]
    #[serde(with = "super::wire::date")]
    pub date: NaiveDate,
    pub duration_minutes: Option<u32>,
    pub outcome: AvailabilityOutcome,
    /// Human readable explanation when nothing is bookable
    pub message: Option<String>,
    /// Whether retrying the same request may succeed
    pub retryable: bool,
    pub window: Option<WindowView>,
    pub slots: Vec<SlotView>,
}

impl AvailabilityResponse {
    /// Bookable start times, in order.
    pub fn bookable(&self) -> Vec<ClockTime> {
        self.slots
            .iter()
            .filter(|s| s.available)
            .map(|s| s.time)
            .collect()
    }

    /// Empty, fail-closed response.
    pub fn unavailable(
        request: &AvailabilityRequest,
        outcome: AvailabilityOutcome,
        message: impl Into<String>,
    ) -> Self {
        Self {
            barber_id: request.barber_id.clone(),
            date: request.date,
            duration_minutes: match request.duration {
                ServiceDuration::Minutes(m) => Some(m),
                ServiceDuration::Service(_) => None,
            },
            retryable: outcome == AvailabilityOutcome::FetchFailed,
            outcome,
            message: Some(message.into()),
            window: None,
            slots: Vec::new(),
        }
    }
}

/// Query parameters for reschedule options
#[derive(Debug, Clone, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RescheduleQuery {
    /// Date to inspect (YYYY-MM-DD), defaults to the booking's current date
    pub date: Option<String>,
}

/// Reschedule wizard seed
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RescheduleOptions {
    pub booking: Booking,
    /// Pre-selected slot: the booking's current start when still bookable
    #[schema(value_type = Option<String>)]
    pub selected_time: Option<ClockTime>,
    pub availability: AvailabilityResponse,
}
