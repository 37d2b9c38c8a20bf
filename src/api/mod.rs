//! API handlers for the booking gateway

pub mod availability;
pub mod bookings;
pub mod health;
pub mod openapi;

use std::net::IpAddr;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{
        header::{AUTHORIZATION, HOST},
        request::Parts,
    },
};

use crate::{
    error::AppError,
    models::{
        session::{Session, SessionClaims},
        tenant::{is_valid_slug, TenantConfig},
    },
    repository::Scope,
    AppState,
};

pub const TENANT_HEADER: &str = "x-tenant";

/// Extractor for the authenticated caller from the JWT bearer token
pub struct AuthenticatedUser(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Authentication("Invalid authorization header format".to_string()))?;

        let claims = SessionClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedUser(Session::new(claims, token.to_string())))
    }
}

/// Tenant the request is addressed to: `X-Tenant`, else the first label of
/// the `Host` subdomain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantSlug(pub String);

impl TenantSlug {
    /// Tenant settings for this slug, from the deployment defaults
    pub fn config(&self, state: &AppState) -> TenantConfig {
        TenantConfig::new(self.0.clone(), &state.config.booking)
    }

    /// Backend scope for this tenant, forwarding the caller's token
    pub fn scope(&self, session: &Session) -> Scope {
        Scope::new(self.0.clone(), Some(session.token.clone()))
    }
}

fn subdomain(host: &str) -> Option<&str> {
    let host = host.split(':').next()?;
    if host.parse::<IpAddr>().is_ok() {
        return None;
    }
    let mut labels = host.split('.');
    let first = labels.next()?;
    // "shop.example.com" has a subdomain, "example.com" and "localhost" do not
    (labels.count() >= 2).then_some(first)
}

fn header_value<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TenantSlug {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let slug = header_value(parts, TENANT_HEADER)
            .or_else(|| header_value(parts, HOST.as_str()).and_then(subdomain))
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| AppError::BadRequest("Tenant could not be determined".to_string()))?;

        if !is_valid_slug(&slug) {
            return Err(AppError::BadRequest(format!("Invalid tenant: {}", slug)));
        }
        Ok(TenantSlug(slug))
    }
}
