//! Duration-aware filtering of candidate slots against the backend feed,
//! existing bookings, closing time and breaks

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::models::{availability::AvailabilitySlot, booking::Booking};

use super::time::{ClockTime, TimeRange};
use super::window::EffectiveWindow;

/// Why a candidate slot is or is not bookable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum SlotState {
    Bookable,
    /// Not reported available by the backend
    Unavailable,
    /// The service would overlap an existing booking
    Booked,
    /// The service would run past closing time
    PastClosing,
    /// The service would overlap the lunch break or a partial closure
    OverlapsBreak,
    /// Already started
    Past,
}

#[derive(Debug, Clone, Copy)]
pub struct FilterInput<'a> {
    pub date: NaiveDate,
    pub barber_id: &'a str,
    pub candidates: &'a [ClockTime],
    pub backend: &'a [AvailabilitySlot],
    pub bookings: &'a [Booking],
    pub duration_minutes: u32,
    pub window: &'a EffectiveWindow,
    /// Booking being moved; it never conflicts with itself
    pub rescheduling: Option<&'a Booking>,
    /// Slots starting before this time are hidden (today only)
    pub not_before: Option<ClockTime>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SlotEvaluation {
    pub slots: Vec<(ClockTime, SlotState)>,
    /// Number of candidates the backend reported available that have not
    /// started yet
    pub backend_available: usize,
}

impl SlotEvaluation {
    pub fn bookable(&self) -> Vec<ClockTime> {
        self.slots
            .iter()
            .filter(|(_, state)| *state == SlotState::Bookable)
            .map(|(time, _)| *time)
            .collect()
    }

    /// Backend offered slots but none fits the requested duration.
    pub fn is_no_fit(&self) -> bool {
        self.backend_available > 0 && self.bookable().is_empty()
    }
}

/// Classify every candidate slot. Each check is an independent filter; the
/// first failing one names the state.
pub fn evaluate_slots(input: FilterInput<'_>) -> SlotEvaluation {
    let backend_open: HashSet<ClockTime> = input
        .backend
        .iter()
        .filter(|s| s.available)
        .map(|s| s.time)
        .collect();

    let own_interval = input
        .rescheduling
        .filter(|b| b.blocks(input.date, input.barber_id))
        .and_then(Booking::interval);

    let occupied: Vec<TimeRange> = input
        .bookings
        .iter()
        .filter(|b| b.blocks(input.date, input.barber_id))
        .filter(|b| input.rescheduling.map_or(true, |own| own.id != b.id))
        .filter_map(Booking::interval)
        .collect();

    let exclusions = input.window.exclusions();

    let mut backend_available = 0;
    let slots = input
        .candidates
        .iter()
        .map(|&slot| {
            // The backend marks the booking being moved as taken; its own
            // interval stays selectable.
            let reported_open = backend_open.contains(&slot)
                || own_interval.is_some_and(|own| own.contains(slot));
            if !reported_open {
                return (slot, SlotState::Unavailable);
            }
            if input.not_before.is_some_and(|now| slot < now) {
                return (slot, SlotState::Past);
            }
            backend_available += 1;

            let service = TimeRange::starting_at(slot, input.duration_minutes);
            let state = if occupied.iter().any(|b| b.overlaps(&service)) {
                SlotState::Booked
            } else if slot
                .checked_add_minutes(input.duration_minutes)
                .map_or(true, |end| end > input.window.end)
            {
                SlotState::PastClosing
            } else if exclusions.iter().any(|e| e.overlaps(&service)) {
                SlotState::OverlapsBreak
            } else {
                SlotState::Bookable
            };
            (slot, state)
        })
        .collect();

    SlotEvaluation {
        slots,
        backend_available,
    }
}
