//! Appointment availability calculator
//!
//! A pure computation over already-fetched data: the effective window for a
//! day is resolved from tenant hours, barber hours and closures, candidate
//! slots are generated inside it, and each candidate is checked against the
//! backend feed, existing bookings and the service duration. The backend stays
//! authoritative; this only decides what to offer.

pub mod filter;
pub mod slots;
pub mod time;
pub mod window;

use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{availability::AvailabilitySlot, booking::Booking};

pub use filter::{evaluate_slots, FilterInput, SlotEvaluation, SlotState};
pub use slots::generate_slots;
pub use time::{ClockTime, TimeRange};
pub use window::{resolve_day, DayInputs, DayVerdict, EffectiveWindow};

/// Overall result of an availability check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum AvailabilityOutcome {
    /// At least one slot is bookable
    Open,
    /// Tenant or barber not open, or closed by a closure
    ClosedDay,
    /// Slots exist but none accommodates the service duration
    NoFit,
    /// Nothing is free
    NoAvailability,
    /// Data could not be loaded; nothing is offered
    FetchFailed,
}

pub const NO_AVAILABILITY_MESSAGE: &str = "No availability on this date";
pub const FETCH_FAILED_MESSAGE: &str = "Availability could not be loaded, please try again";

pub fn no_fit_message(duration_minutes: u32) -> String {
    format!("No slot fits a {}-minute service", duration_minutes)
}

/// Everything the calculator needs for one barber, date and service
#[derive(Debug, Clone, Copy)]
pub struct DayRequest<'a> {
    pub day: DayInputs<'a>,
    pub backend: &'a [AvailabilitySlot],
    pub bookings: &'a [Booking],
    pub duration_minutes: u32,
    pub interval_minutes: u32,
    pub rescheduling: Option<&'a Booking>,
    pub not_before: Option<ClockTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DayAvailability {
    pub outcome: AvailabilityOutcome,
    pub message: Option<String>,
    pub window: Option<EffectiveWindow>,
    pub slots: Vec<(ClockTime, SlotState)>,
}

impl DayAvailability {
    pub fn bookable(&self) -> Vec<ClockTime> {
        self.slots
            .iter()
            .filter(|(_, s)| *s == SlotState::Bookable)
            .map(|(t, _)| *t)
            .collect()
    }
}

/// Compute bookable slots for one day.
pub fn compute_day(request: DayRequest<'_>) -> DayAvailability {
    let window = match resolve_day(request.day) {
        DayVerdict::Closed { reason } => {
            return DayAvailability {
                outcome: AvailabilityOutcome::ClosedDay,
                message: Some(reason),
                window: None,
                slots: Vec::new(),
            }
        }
        DayVerdict::Open(window) => window,
    };

    let candidates = generate_slots(
        window.start,
        window.end,
        request.interval_minutes,
        &window.exclusions(),
    );

    let evaluation = evaluate_slots(FilterInput {
        date: request.day.date,
        barber_id: request.day.barber_id,
        candidates: &candidates,
        backend: request.backend,
        bookings: request.bookings,
        duration_minutes: request.duration_minutes,
        window: &window,
        rescheduling: request.rescheduling,
        not_before: request.not_before,
    });

    let (outcome, message) = if !evaluation.bookable().is_empty() {
        (AvailabilityOutcome::Open, None)
    } else if evaluation.is_no_fit() {
        (
            AvailabilityOutcome::NoFit,
            Some(no_fit_message(request.duration_minutes)),
        )
    } else {
        (
            AvailabilityOutcome::NoAvailability,
            Some(NO_AVAILABILITY_MESSAGE.to_string()),
        )
    };

    DayAvailability {
        outcome,
        message,
        window: Some(window),
        slots: evaluation.slots,
    }
}
