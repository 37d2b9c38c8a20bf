//! Booking wizard state: the current selection and the availability computed
//! for it.
//!
//! Every change of barber, date or service starts a new generation. A refresh
//! remembers the generation it started in and its result is dropped if the
//! selection moved on while it was in flight, so a slow response for an old
//! selection never overwrites a newer one.

use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::{availability::AvailabilityService, bookings::BookingsService};
use crate::{
    availability::ClockTime,
    error::{AppError, AppResult},
    models::{
        availability::{AvailabilityRequest, AvailabilityResponse, ServiceDuration},
        booking::{Booking, CreateBooking, RescheduleBooking},
        session::Session,
        tenant::TenantConfig,
    },
    repository::Scope,
};

/// What the user picked so far
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub barber_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub service_id: Option<String>,
    /// Known duration, used instead of looking the service up
    pub duration_minutes: Option<u32>,
    pub time: Option<ClockTime>,
}

impl Selection {
    fn request(&self, rescheduling: Option<&str>) -> Option<AvailabilityRequest> {
        let duration = match (self.duration_minutes, &self.service_id) {
            (Some(minutes), _) => ServiceDuration::Minutes(minutes),
            (None, Some(id)) => ServiceDuration::Service(id.clone()),
            (None, None) => return None,
        };
        Some(AvailabilityRequest {
            barber_id: self.barber_id.clone()?,
            date: self.date?,
            duration,
            exclude_booking_id: rescheduling.map(str::to_string),
        })
    }
}

/// Ticket handed out when a refresh starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Generation(u64);

#[derive(Debug, Default)]
struct WizardState {
    selection: Selection,
    generation: u64,
    availability: Option<AvailabilityResponse>,
}

impl WizardState {
    /// Inputs changed: pending refreshes become stale and the chosen slot is
    /// no longer valid.
    fn invalidate(&mut self) {
        self.generation += 1;
        self.availability = None;
        self.selection.time = None;
    }
}

pub struct BookingWizard {
    availability: AvailabilityService,
    bookings: BookingsService,
    tenant: TenantConfig,
    scope: Scope,
    /// Booking being moved, when rescheduling
    rescheduling: Option<String>,
    state: Mutex<WizardState>,
}

impl BookingWizard {
    pub fn new(
        availability: AvailabilityService,
        bookings: BookingsService,
        tenant: TenantConfig,
        scope: Scope,
    ) -> Self {
        Self {
            availability,
            bookings,
            tenant,
            scope,
            rescheduling: None,
            state: Mutex::new(WizardState::default()),
        }
    }

    /// Wizard for moving `booking`, seeded with its barber, date, length and
    /// current start time.
    pub fn for_reschedule(
        availability: AvailabilityService,
        bookings: BookingsService,
        tenant: TenantConfig,
        scope: Scope,
        booking: &Booking,
    ) -> Self {
        let selection = Selection {
            barber_id: booking.barber_id.clone(),
            date: Some(booking.date),
            service_id: booking.service_id.clone(),
            duration_minutes: Some(booking.duration_minutes()).filter(|m| *m > 0),
            time: Some(booking.start_time),
        };
        Self {
            availability,
            bookings,
            tenant,
            scope,
            rescheduling: Some(booking.id.clone()),
            state: Mutex::new(WizardState {
                selection,
                ..WizardState::default()
            }),
        }
    }

    pub async fn selection(&self) -> Selection {
        self.state.lock().await.selection.clone()
    }

    pub async fn availability(&self) -> Option<AvailabilityResponse> {
        self.state.lock().await.availability.clone()
    }

    pub async fn select_barber(&self, barber_id: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.selection.barber_id = Some(barber_id.into());
        state.invalidate();
    }

    pub async fn select_date(&self, date: NaiveDate) {
        let mut state = self.state.lock().await;
        state.selection.date = Some(date);
        state.invalidate();
    }

    pub async fn select_service(&self, service_id: impl Into<String>, duration_minutes: Option<u32>) {
        let mut state = self.state.lock().await;
        state.selection.service_id = Some(service_id.into());
        state.selection.duration_minutes = duration_minutes;
        state.invalidate();
    }

    /// Start a refresh for the current selection. `None` while the selection
    /// is incomplete.
    pub async fn begin_refresh(&self) -> Option<(Generation, AvailabilityRequest)> {
        let state = self.state.lock().await;
        let request = state.selection.request(self.rescheduling.as_deref())?;
        Some((Generation(state.generation), request))
    }

    /// Store a refresh result unless the selection changed since it began.
    pub async fn complete_refresh(&self, generation: Generation, response: AvailabilityResponse) -> bool {
        let mut state = self.state.lock().await;
        if generation.0 != state.generation {
            tracing::debug!(
                stale = generation.0,
                current = state.generation,
                "Discarding stale availability result"
            );
            return false;
        }
        if let Some(time) = state.selection.time {
            if !response.bookable().contains(&time) {
                state.selection.time = None;
            }
        }
        state.availability = Some(response);
        true
    }

    /// Recompute availability for the current selection. Returns `None` when
    /// the result was superseded by a newer selection.
    pub async fn refresh(&self) -> AppResult<Option<AvailabilityResponse>> {
        let (generation, request) = self.begin_refresh().await.ok_or_else(|| {
            AppError::Validation("Select a barber, a date and a service first".to_string())
        })?;
        let response = self.availability.check(&self.tenant, &self.scope, &request).await?;
        let applied = self.complete_refresh(generation, response.clone()).await;
        Ok(applied.then_some(response))
    }

    /// Pick one of the bookable slots of the current availability.
    pub async fn choose_time(&self, time: ClockTime) -> AppResult<()> {
        let mut state = self.state.lock().await;
        let bookable = state
            .availability
            .as_ref()
            .map(|a| a.bookable().contains(&time))
            .unwrap_or(false);
        if !bookable {
            return Err(AppError::Validation(format!("{} is not a bookable slot", time)));
        }
        state.selection.time = Some(time);
        Ok(())
    }

    /// Submit the chosen slot. A rejected submission clears the slot and the
    /// cached availability so the user re-selects from fresh data.
    pub async fn confirm(&self, session: &Session, notes: Option<String>) -> AppResult<Booking> {
        let selection = self.selection().await;
        let (Some(barber_id), Some(date), Some(start_time)) =
            (selection.barber_id.clone(), selection.date, selection.time)
        else {
            return Err(AppError::Validation("No slot selected".to_string()));
        };

        let result = match &self.rescheduling {
            Some(booking_id) => {
                self.bookings
                    .reschedule(&self.scope, session, booking_id, RescheduleBooking { date, start_time })
                    .await
            }
            None => {
                let service_id = selection
                    .service_id
                    .clone()
                    .ok_or_else(|| AppError::Validation("No service selected".to_string()))?;
                let request = CreateBooking {
                    barber_id,
                    service_id,
                    date,
                    start_time,
                    end_time: selection.duration_minutes.map(|m| start_time.add_minutes(m)),
                    customer_id: None,
                    notes,
                };
                self.bookings.create(&self.scope, session, request).await
            }
        };

        if let Err(AppError::SubmissionConflict(_)) = &result {
            self.state.lock().await.invalidate();
        }
        result
    }
}
