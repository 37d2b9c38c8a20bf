//! Effective operating window: tenant hours intersected with barber hours,
//! minus closures

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::schedule::{schedule_for, Closure, WeeklySchedule};

use super::time::{ClockTime, TimeRange};

pub const DEFAULT_CLOSURE_REASON: &str = "Closed";
pub const TENANT_CLOSED_REASON: &str = "The business does not open on this day";
pub const BARBER_OFF_REASON: &str = "The barber does not work on this day";

/// Window inside which slots may be generated
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveWindow {
    pub start: ClockTime,
    pub end: ClockTime,
    pub lunch: Option<TimeRange>,
    /// Partial closures, excluded like the lunch break
    pub closures: Vec<TimeRange>,
}

impl EffectiveWindow {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Lunch followed by partial closures.
    pub fn exclusions(&self) -> Vec<TimeRange> {
        self.lunch.iter().chain(self.closures.iter()).copied().collect()
    }
}

/// Result of reconciling schedules and closures for one day
#[derive(Debug, Clone, PartialEq)]
pub enum DayVerdict {
    Open(EffectiveWindow),
    Closed { reason: String },
}

impl DayVerdict {
    fn closed(reason: impl Into<String>) -> Self {
        DayVerdict::Closed {
            reason: reason.into(),
        }
    }
}

/// Schedules and closures relevant to one barber on one date
#[derive(Debug, Clone, Copy)]
pub struct DayInputs<'a> {
    pub date: NaiveDate,
    pub barber_id: &'a str,
    pub tenant_schedules: &'a [WeeklySchedule],
    pub barber_schedules: &'a [WeeklySchedule],
    /// Shop-wide and barber closures, in any order
    pub closures: &'a [Closure],
}

/// Resolve the effective window for a day.
///
/// Precedence: full-day closures, then the tenant schedule (an absolute
/// ceiling), then the barber schedule intersected with it. Lunch comes from
/// the barber when defined, otherwise from the tenant; partial closures are
/// layered on top.
pub fn resolve_day(inputs: DayInputs<'_>) -> DayVerdict {
    let DayInputs {
        date,
        barber_id,
        tenant_schedules,
        barber_schedules,
        closures,
    } = inputs;

    let in_scope: Vec<&Closure> = closures
        .iter()
        .filter(|c| c.applies_to(date, barber_id))
        .collect();

    if let Some(closure) = in_scope.iter().find(|c| c.is_full_day()) {
        tracing::debug!(%date, barber_id, "Day closed by closure");
        return DayVerdict::closed(
            closure
                .reason
                .as_deref()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or(DEFAULT_CLOSURE_REASON),
        );
    }

    let tenant_day = schedule_for(tenant_schedules, date);
    let Some((tenant_start, tenant_end)) = tenant_day.and_then(WeeklySchedule::open_hours) else {
        return DayVerdict::closed(TENANT_CLOSED_REASON);
    };

    let barber_day = schedule_for(barber_schedules, date);
    let Some((barber_start, barber_end)) = barber_day.and_then(WeeklySchedule::open_hours) else {
        return DayVerdict::closed(BARBER_OFF_REASON);
    };

    let lunch = barber_day
        .and_then(WeeklySchedule::lunch)
        .or_else(|| tenant_day.and_then(WeeklySchedule::lunch));

    let partial: Vec<TimeRange> = in_scope
        .iter()
        .filter_map(|c| {
            let range = c.partial_range();
            if range.is_none() {
                tracing::warn!(%date, reason = ?c.reason, "Ignoring partial closure without a valid time range");
            }
            range
        })
        .collect();

    DayVerdict::Open(EffectiveWindow {
        start: tenant_start.max(barber_start),
        end: tenant_end.min(barber_end),
        lunch,
        closures: partial,
    })
}
