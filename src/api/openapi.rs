//! OpenAPI documentation

use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::{availability, bookings, health};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "BarberBook API",
        version = "0.4.0",
        description = "Multi-tenant barbershop booking gateway"
    ),
    servers(
        (url = "/api/v1", description = "API v1")
    ),
    paths(
        // Health
        health::health_check,
        health::readiness_check,
        // Availability
        availability::get_availability,
        // Bookings
        bookings::create_booking,
        bookings::reschedule_booking,
        bookings::reschedule_options,
    ),
    components(
        schemas(
            // Availability
            crate::models::availability::AvailabilityResponse,
            crate::models::availability::SlotView,
            crate::models::availability::WindowView,
            crate::models::availability::RescheduleOptions,
            crate::availability::AvailabilityOutcome,
            crate::availability::SlotState,
            // Bookings
            crate::models::booking::Booking,
            crate::models::booking::BookingStatus,
            crate::models::booking::CreateBooking,
            crate::models::booking::RescheduleBooking,
            // Health
            health::HealthResponse,
            health::ReadinessResponse,
            // Errors
            crate::error::ErrorResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "availability", description = "Slot availability"),
        (name = "bookings", description = "Booking submission and rescheduling")
    )
)]
pub struct ApiDoc;

/// Create the OpenAPI documentation router
pub fn create_openapi_router() -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
