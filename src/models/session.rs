//! Session claims and capability-based authorization

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Something a session is allowed to do
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Capability {
    ViewAvailability,
    CreateBooking,
    RescheduleOwnBooking,
    ManageBookings,
    ManageSchedules,
    ManageClosures,
    ManageServices,
    ManageBarbers,
    ManageTenants,
}

impl Capability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Capability::ViewAvailability => "viewAvailability",
            Capability::CreateBooking => "createBooking",
            Capability::RescheduleOwnBooking => "rescheduleOwnBooking",
            Capability::ManageBookings => "manageBookings",
            Capability::ManageSchedules => "manageSchedules",
            Capability::ManageClosures => "manageClosures",
            Capability::ManageServices => "manageServices",
            Capability::ManageBarbers => "manageBarbers",
            Capability::ManageTenants => "manageTenants",
        }
    }

    /// Capabilities granted by a well-known role name. Unknown roles get none;
    /// they rely on the explicit set carried by the token.
    pub fn defaults_for_role(role: &str) -> BTreeSet<Capability> {
        use Capability::*;
        let caps: &[Capability] = match role {
            "customer" => &[ViewAvailability, CreateBooking, RescheduleOwnBooking],
            "barber" => &[ViewAvailability, ManageBookings],
            "tenant_admin" => &[
                ViewAvailability,
                CreateBooking,
                ManageBookings,
                ManageSchedules,
                ManageClosures,
                ManageServices,
                ManageBarbers,
            ],
            "super_admin" => &[
                ViewAvailability,
                CreateBooking,
                ManageBookings,
                ManageSchedules,
                ManageClosures,
                ManageServices,
                ManageBarbers,
                ManageTenants,
            ],
            _ => &[],
        };
        caps.iter().copied().collect()
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// JWT claims for an authenticated session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionClaims {
    pub sub: String,
    pub user_id: String,
    /// Tenant the session belongs to, absent for platform sessions
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub capabilities: BTreeSet<Capability>,
    pub exp: i64,
    pub iat: i64,
}

impl SessionClaims {
    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }
}

/// An authenticated caller: decoded claims plus the raw bearer token, which is
/// forwarded to the backend.
#[derive(Debug, Clone)]
pub struct Session {
    pub claims: SessionClaims,
    pub token: String,
    capabilities: BTreeSet<Capability>,
}

impl Session {
    pub fn new(claims: SessionClaims, token: String) -> Self {
        let mut capabilities = Capability::defaults_for_role(&claims.role);
        capabilities.extend(claims.capabilities.iter().copied());
        Self {
            claims,
            token,
            capabilities,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.claims.user_id
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities.contains(&capability)
    }

    pub fn require(&self, capability: Capability) -> Result<(), AppError> {
        if self.has(capability) {
            Ok(())
        } else {
            Err(AppError::Authorization(format!(
                "Missing capability: {}",
                capability
            )))
        }
    }

    /// Sessions are bound to one tenant unless they may manage all tenants.
    pub fn require_tenant(&self, slug: &str) -> Result<(), AppError> {
        match self.claims.tenant.as_deref() {
            Some(tenant) if tenant != slug && !self.has(Capability::ManageTenants) => Err(
                AppError::Authorization(format!("Session is not valid for tenant {}", slug)),
            ),
            _ => Ok(()),
        }
    }

    /// Reschedule rights: own bookings with `RescheduleOwnBooking`, any
    /// booking with `ManageBookings`.
    pub fn require_reschedule(&self, customer_id: Option<&str>) -> Result<(), AppError> {
        if self.has(Capability::ManageBookings) {
            return Ok(());
        }
        if self.has(Capability::RescheduleOwnBooking) && customer_id == Some(self.user_id()) {
            return Ok(());
        }
        Err(AppError::Authorization(
            "Insufficient rights to reschedule this booking".to_string(),
        ))
    }
}
