//! Data access layer: the booking backend, reached over REST or replaced by
//! local fixtures

pub mod local;
pub mod remote;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::{
    config::{AppConfig, DataSourceMode},
    error::{AppError, AppResult},
    models::{
        availability::{AvailabilitySlot, Service},
        booking::{Booking, CreateBooking, UpdateBooking},
        schedule::{Closure, WeeklySchedule},
    },
};

/// Who is asking and for which tenant; forwarded with every backend call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub tenant: String,
    pub bearer: Option<String>,
}

impl Scope {
    pub fn new(tenant: impl Into<String>, bearer: Option<String>) -> Self {
        Self {
            tenant: tenant.into(),
            bearer,
        }
    }
}

/// Operations the booking logic needs from the backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Tenant-wide weekly hours
    async fn tenant_schedules(&self, scope: &Scope) -> AppResult<Vec<WeeklySchedule>>;

    async fn barber_schedules(&self, scope: &Scope, barber_id: &str) -> AppResult<Vec<WeeklySchedule>>;

    /// Shop-wide closures
    async fn tenant_closures(&self, scope: &Scope) -> AppResult<Vec<Closure>>;

    async fn barber_closures(&self, scope: &Scope, barber_id: &str) -> AppResult<Vec<Closure>>;

    async fn service(&self, scope: &Scope, service_id: &str) -> AppResult<Service>;

    /// Backend availability feed for a barber and date
    async fn availability(
        &self,
        scope: &Scope,
        barber_id: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<AvailabilitySlot>>;

    /// Bookings of a barber between two dates, inclusive
    async fn bookings(
        &self,
        scope: &Scope,
        barber_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<Vec<Booking>>;

    async fn booking(&self, scope: &Scope, booking_id: &str) -> AppResult<Booking>;

    async fn create_booking(&self, scope: &Scope, data: &CreateBooking) -> AppResult<Booking>;

    async fn update_booking(
        &self,
        scope: &Scope,
        booking_id: &str,
        data: &UpdateBooking,
    ) -> AppResult<Booking>;
}

/// Repository handle shared by services
#[derive(Clone)]
pub struct Repository {
    pub source: Arc<dyn DataSource>,
}

impl Repository {
    pub fn new(source: Arc<dyn DataSource>) -> Self {
        Self { source }
    }

    /// Pick the data source configured for this deployment
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let source: Arc<dyn DataSource> = match config.data_source.mode {
            DataSourceMode::Remote => {
                tracing::info!("Using remote booking backend at {}", config.upstream.base_url);
                Arc::new(remote::RemoteSource::new(&config.upstream)?)
            }
            DataSourceMode::Local => {
                let path = config.data_source.fixtures_path.as_ref().ok_or_else(|| {
                    AppError::Internal("data_source.fixtures_path is required in local mode".to_string())
                })?;
                tracing::warn!("Using local fixtures from {}, bookings are not persisted", path.display());
                Arc::new(local::LocalSource::from_file(path, config.booking.slot_interval_minutes)?)
            }
        };
        Ok(Self::new(source))
    }
}

impl std::ops::Deref for Repository {
    type Target = dyn DataSource;

    fn deref(&self) -> &Self::Target {
        self.source.as_ref()
    }
}
