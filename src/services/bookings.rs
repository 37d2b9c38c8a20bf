//! Bookings service: submissions and reschedules, forwarded to the backend

use chrono::NaiveDate;
use validator::Validate;

use super::availability::AvailabilityService;
use crate::{
    error::{AppError, AppResult},
    models::{
        availability::{AvailabilityRequest, RescheduleOptions, ServiceDuration},
        booking::{Booking, CreateBooking, RescheduleBooking, UpdateBooking},
        session::{Capability, Session},
        tenant::TenantConfig,
    },
    repository::{Repository, Scope},
};

/// A backend rejection of a submission is shown to the user as-is; the user
/// picks another slot.
fn submission_error(err: AppError) -> AppError {
    match err {
        AppError::Upstream {
            status: Some(400 | 409 | 422),
            message,
        } => {
            tracing::info!("Booking submission rejected: {}", message);
            AppError::SubmissionConflict(message)
        }
        other => other,
    }
}

#[derive(Clone)]
pub struct BookingsService {
    repository: Repository,
    availability: AvailabilityService,
}

impl BookingsService {
    pub fn new(repository: Repository, availability: AvailabilityService) -> Self {
        Self {
            repository,
            availability,
        }
    }

    /// Submit a new booking. Customers always book for themselves.
    pub async fn create(&self, scope: &Scope, session: &Session, data: CreateBooking) -> AppResult<Booking> {
        session.require(Capability::CreateBooking)?;
        data.validate()?;

        let mut data = data;
        if !session.has(Capability::ManageBookings) || data.customer_id.is_none() {
            data.customer_id = Some(session.user_id().to_string());
        }

        if data.end_time.is_none() {
            let service = self.repository.service(scope, &data.service_id).await?;
            let end = data
                .start_time
                .checked_add_minutes(service.duration_minutes)
                .ok_or_else(|| AppError::Validation("Service would run past midnight".to_string()))?;
            data.end_time = Some(end);
        }

        let booking = self
            .repository
            .create_booking(scope, &data)
            .await
            .map_err(submission_error)?;
        tracing::info!(tenant = %scope.tenant, booking_id = %booking.id, "Booking created");
        Ok(booking)
    }

    /// Move a booking to a new date and start time, keeping its length.
    pub async fn reschedule(
        &self,
        scope: &Scope,
        session: &Session,
        booking_id: &str,
        request: RescheduleBooking,
    ) -> AppResult<Booking> {
        let booking = self.repository.booking(scope, booking_id).await?;
        session.require_reschedule(booking.customer_id.as_deref())?;

        if !booking.status.occupies_slot() {
            return Err(AppError::BadRequest(
                "Only pending or confirmed bookings can be rescheduled".to_string(),
            ));
        }

        let duration = booking.duration_minutes();
        if duration == 0 {
            return Err(AppError::Internal(format!(
                "Booking {} has no valid time range",
                booking.id
            )));
        }
        let end_time = request
            .start_time
            .checked_add_minutes(duration)
            .ok_or_else(|| AppError::Validation("Booking would run past midnight".to_string()))?;

        let update = UpdateBooking {
            date: request.date,
            start_time: request.start_time,
            end_time,
        };
        let updated = self
            .repository
            .update_booking(scope, booking_id, &update)
            .await
            .map_err(submission_error)?;
        tracing::info!(tenant = %scope.tenant, booking_id, "Booking rescheduled");
        Ok(updated)
    }

    /// Seed the reschedule wizard: the booking's current date (unless another
    /// is given), availability ignoring the booking itself, and its current
    /// slot pre-selected when still bookable.
    pub async fn reschedule_options(
        &self,
        tenant: &TenantConfig,
        scope: &Scope,
        session: &Session,
        booking_id: &str,
        date: Option<NaiveDate>,
    ) -> AppResult<RescheduleOptions> {
        let booking = self.repository.booking(scope, booking_id).await?;
        session.require_reschedule(booking.customer_id.as_deref())?;

        let barber_id = booking
            .barber_id
            .clone()
            .ok_or_else(|| AppError::BadRequest("Booking has no barber".to_string()))?;

        let request = AvailabilityRequest {
            barber_id,
            date: date.unwrap_or(booking.date),
            duration: ServiceDuration::Minutes(booking.duration_minutes().max(1)),
            exclude_booking_id: Some(booking.id.clone()),
        };
        let availability = self.availability.check(tenant, scope, &request).await?;

        let selected_time = (request.date == booking.date
            && availability.bookable().contains(&booking.start_time))
        .then_some(booking.start_time);

        Ok(RescheduleOptions {
            booking,
            selected_time,
            availability,
        })
    }
}
