//! Booking endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use crate::{
    error::{AppError, AppResult},
    models::{
        availability::{RescheduleOptions, RescheduleQuery},
        booking::{Booking, CreateBooking, RescheduleBooking},
        wire,
    },
    AppState,
};

use super::{AuthenticatedUser, TenantSlug};

/// Submit a booking
#[utoipa::path(
    post,
    path = "/bookings",
    tag = "bookings",
    security(("bearer_auth" = [])),
    request_body = CreateBooking,
    responses(
        (status = 201, description = "Booking created", body = Booking),
        (status = 400, description = "Invalid request", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing createBooking", body = crate::error::ErrorResponse),
        (status = 409, description = "Slot no longer available", body = crate::error::ErrorResponse),
        (status = 502, description = "Booking backend unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_booking(
    State(state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
    tenant: TenantSlug,
    Json(data): Json<CreateBooking>,
) -> AppResult<(StatusCode, Json<Booking>)> {
    session.require_tenant(&tenant.0)?;

    let booking = state
        .services
        .bookings
        .create(&tenant.scope(&session), &session, data)
        .await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// Move a booking to another date or time
#[utoipa::path(
    patch,
    path = "/bookings/{id}",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Booking ID")
    ),
    request_body = RescheduleBooking,
    responses(
        (status = 200, description = "Booking rescheduled", body = Booking),
        (status = 403, description = "Not allowed to reschedule this booking", body = crate::error::ErrorResponse),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse),
        (status = 409, description = "Slot no longer available", body = crate::error::ErrorResponse)
    )
)]
pub async fn reschedule_booking(
    State(state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
    tenant: TenantSlug,
    Path(id): Path<String>,
    Json(data): Json<RescheduleBooking>,
) -> AppResult<Json<Booking>> {
    session.require_tenant(&tenant.0)?;

    let booking = state
        .services
        .bookings
        .reschedule(&tenant.scope(&session), &session, &id, data)
        .await?;
    Ok(Json(booking))
}

/// Availability for moving a booking, with its current slot pre-selected
#[utoipa::path(
    get,
    path = "/bookings/{id}/reschedule",
    tag = "bookings",
    security(("bearer_auth" = [])),
    params(
        ("id" = String, Path, description = "Booking ID"),
        RescheduleQuery
    ),
    responses(
        (status = 200, description = "Reschedule options", body = RescheduleOptions),
        (status = 403, description = "Not allowed to reschedule this booking", body = crate::error::ErrorResponse),
        (status = 404, description = "Booking not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn reschedule_options(
    State(state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
    tenant: TenantSlug,
    Path(id): Path<String>,
    Query(query): Query<RescheduleQuery>,
) -> AppResult<Json<RescheduleOptions>> {
    session.require_tenant(&tenant.0)?;

    let date = query
        .date
        .as_deref()
        .map(wire::date::parse)
        .transpose()
        .map_err(|_| AppError::Validation("Invalid date (use YYYY-MM-DD)".to_string()))?;

    let options = state
        .services
        .bookings
        .reschedule_options(&tenant.config(&state), &tenant.scope(&session), &session, &id, date)
        .await?;
    Ok(Json(options))
}
