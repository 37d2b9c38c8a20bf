//! Business logic services

pub mod availability;
pub mod bookings;
pub mod wizard;

use crate::{models::tenant::TenantConfig, repository::{Repository, Scope}};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub availability: availability::AvailabilityService,
    pub bookings: bookings::BookingsService,
}

impl Services {
    /// Create all services over the given repository
    pub fn new(repository: Repository) -> Self {
        let availability = availability::AvailabilityService::new(repository.clone());
        Self {
            bookings: bookings::BookingsService::new(repository, availability.clone()),
            availability,
        }
    }

    /// Start a booking wizard for one caller
    pub fn wizard(&self, tenant: TenantConfig, scope: Scope) -> wizard::BookingWizard {
        wizard::BookingWizard::new(
            self.availability.clone(),
            self.bookings.clone(),
            tenant,
            scope,
        )
    }
}
