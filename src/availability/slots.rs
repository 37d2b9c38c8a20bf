//! Fixed-cadence slot generation

use super::time::{ClockTime, TimeRange};

/// Generate slot start times every `interval_minutes` from `start`, strictly
/// before `end`. Slots starting inside any of `breaks` are left out entirely.
///
/// An empty or inverted window, or a zero interval, yields no slots.
pub fn generate_slots(
    start: ClockTime,
    end: ClockTime,
    interval_minutes: u32,
    breaks: &[TimeRange],
) -> Vec<ClockTime> {
    if interval_minutes == 0 || start >= end {
        return Vec::new();
    }

    let mut slots = Vec::new();
    let mut current = start;
    while current < end {
        if !breaks.iter().any(|b| b.contains(current)) {
            slots.push(current);
        }
        match current.checked_add_minutes(interval_minutes) {
            Some(next) => current = next,
            None => break,
        }
    }
    slots
}
