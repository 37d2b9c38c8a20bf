//! Availability endpoint

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    error::AppResult,
    models::{
        availability::{AvailabilityQuery, AvailabilityResponse},
        session::Capability,
    },
    services::availability::AvailabilityService,
    AppState,
};

use super::{AuthenticatedUser, TenantSlug};

/// Bookable slots for a barber on a date
///
/// Closed days, days with no fitting slot and backend failures answer 200 and
/// are reported through `outcome`. An unknown service or excluded booking is a
/// 404; excluding a booking requires reschedule rights on it.
#[utoipa::path(
    get,
    path = "/availability",
    tag = "availability",
    security(("bearer_auth" = [])),
    params(
        AvailabilityQuery,
        ("X-Tenant" = Option<String>, Header, description = "Tenant slug, defaults to the Host subdomain")
    ),
    responses(
        (status = 200, description = "Availability for the day", body = AvailabilityResponse),
        (status = 400, description = "Invalid query", body = crate::error::ErrorResponse),
        (status = 401, description = "Not authenticated", body = crate::error::ErrorResponse),
        (status = 403, description = "Missing viewAvailability or reschedule rights", body = crate::error::ErrorResponse),
        (status = 404, description = "Unknown service or excluded booking", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_availability(
    State(state): State<AppState>,
    AuthenticatedUser(session): AuthenticatedUser,
    tenant: TenantSlug,
    Query(query): Query<AvailabilityQuery>,
) -> AppResult<Json<AvailabilityResponse>> {
    session.require(Capability::ViewAvailability)?;
    session.require_tenant(&tenant.0)?;

    let request = AvailabilityService::parse_query(&query)?;
    let response = state
        .services
        .availability
        .check_for(&tenant.config(&state), &tenant.scope(&session), &session, &request)
        .await?;
    Ok(Json(response))
}
