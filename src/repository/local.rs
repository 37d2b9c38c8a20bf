//! In-memory data source loaded from a JSON fixture file, for running the
//! gateway without a backend

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DataSource, Scope};
use crate::{
    availability::{generate_slots, TimeRange},
    error::{AppError, AppResult},
    models::{
        availability::{AvailabilitySlot, Service},
        booking::{Booking, BookingStatus, CreateBooking, UpdateBooking},
        schedule::{schedule_for, Closure, WeeklySchedule},
    },
};

pub const SLOT_TAKEN_MESSAGE: &str = "This time slot is no longer available";

/// Data for one tenant
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TenantFixtures {
    /// Tenant hours have no `barberId`; barber hours carry one
    pub schedules: Vec<WeeklySchedule>,
    pub closures: Vec<Closure>,
    pub services: Vec<Service>,
    pub bookings: Vec<Booking>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixtures {
    #[serde(default)]
    pub tenants: HashMap<String, TenantFixtures>,
}

pub struct LocalSource {
    tenants: RwLock<HashMap<String, TenantFixtures>>,
    slot_interval_minutes: u32,
}

impl LocalSource {
    pub fn new(fixtures: Fixtures, slot_interval_minutes: u32) -> Self {
        Self {
            tenants: RwLock::new(fixtures.tenants),
            slot_interval_minutes,
        }
    }

    pub fn from_file(path: &Path, slot_interval_minutes: u32) -> AppResult<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Internal(format!("Failed to read fixtures {}: {}", path.display(), e))
        })?;
        let fixtures: Fixtures = serde_json::from_str(&raw).map_err(|e| {
            AppError::Internal(format!("Invalid fixtures {}: {}", path.display(), e))
        })?;
        tracing::info!(tenants = fixtures.tenants.len(), "Loaded local fixtures");
        Ok(Self::new(fixtures, slot_interval_minutes))
    }

    async fn read<T>(&self, scope: &Scope, f: impl FnOnce(&TenantFixtures) -> T) -> AppResult<T> {
        let tenants = self.tenants.read().await;
        let tenant = tenants
            .get(&scope.tenant)
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", scope.tenant)))?;
        Ok(f(tenant))
    }
}

fn conflicts(bookings: &[Booking], candidate: &Booking) -> bool {
    let Some(interval) = candidate.interval() else {
        return false;
    };
    bookings.iter().any(|b| {
        b.id != candidate.id
            && b.blocks(candidate.date, candidate.barber_id.as_deref().unwrap_or_default())
            && b.interval().is_some_and(|other| other.overlaps(&interval))
    })
}

#[async_trait]
impl DataSource for LocalSource {
    async fn tenant_schedules(&self, scope: &Scope) -> AppResult<Vec<WeeklySchedule>> {
        self.read(scope, |t| {
            t.schedules.iter().filter(|s| s.barber_id.is_none()).cloned().collect()
        })
        .await
    }

    async fn barber_schedules(&self, scope: &Scope, barber_id: &str) -> AppResult<Vec<WeeklySchedule>> {
        self.read(scope, |t| {
            t.schedules
                .iter()
                .filter(|s| s.barber_id.as_deref() == Some(barber_id))
                .cloned()
                .collect()
        })
        .await
    }

    async fn tenant_closures(&self, scope: &Scope) -> AppResult<Vec<Closure>> {
        self.read(scope, |t| {
            t.closures.iter().filter(|c| c.barber_id.is_none()).cloned().collect()
        })
        .await
    }

    async fn barber_closures(&self, scope: &Scope, barber_id: &str) -> AppResult<Vec<Closure>> {
        self.read(scope, |t| {
            t.closures
                .iter()
                .filter(|c| c.barber_id.as_deref() == Some(barber_id))
                .cloned()
                .collect()
        })
        .await
    }

    async fn service(&self, scope: &Scope, service_id: &str) -> AppResult<Service> {
        self.read(scope, |t| t.services.iter().find(|s| s.id == service_id).cloned())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Service {} not found", service_id)))
    }

    /// Slots of the tenant's day at the configured interval, taken when an
    /// active booking of the barber covers them.
    async fn availability(
        &self,
        scope: &Scope,
        barber_id: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<AvailabilitySlot>> {
        let interval = self.slot_interval_minutes;
        self.read(scope, |t| {
            let tenant_hours: Vec<WeeklySchedule> =
                t.schedules.iter().filter(|s| s.barber_id.is_none()).cloned().collect();
            let Some((start, end)) = schedule_for(&tenant_hours, date).and_then(WeeklySchedule::open_hours) else {
                return Vec::new();
            };
            let taken: Vec<TimeRange> = t
                .bookings
                .iter()
                .filter(|b| b.blocks(date, barber_id))
                .filter_map(Booking::interval)
                .collect();
            generate_slots(start, end, interval, &[])
                .into_iter()
                .map(|time| AvailabilitySlot {
                    time,
                    available: !taken.iter().any(|r| r.contains(time)),
                })
                .collect()
        })
        .await
    }

    async fn bookings(
        &self,
        scope: &Scope,
        barber_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<Vec<Booking>> {
        self.read(scope, |t| {
            t.bookings
                .iter()
                .filter(|b| b.barber_id.as_deref() == Some(barber_id))
                .filter(|b| b.date >= start_date && b.date <= end_date)
                .cloned()
                .collect()
        })
        .await
    }

    async fn booking(&self, scope: &Scope, booking_id: &str) -> AppResult<Booking> {
        self.read(scope, |t| t.bookings.iter().find(|b| b.id == booking_id).cloned())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))
    }

    async fn create_booking(&self, scope: &Scope, data: &CreateBooking) -> AppResult<Booking> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants
            .get_mut(&scope.tenant)
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", scope.tenant)))?;

        let end_time = match data.end_time {
            Some(end) => end,
            None => {
                let service = tenant
                    .services
                    .iter()
                    .find(|s| s.id == data.service_id)
                    .ok_or_else(|| AppError::NotFound(format!("Service {} not found", data.service_id)))?;
                data.start_time.add_minutes(service.duration_minutes)
            }
        };

        let booking = Booking {
            id: Uuid::new_v4().to_string(),
            date: data.date,
            start_time: data.start_time,
            end_time,
            status: BookingStatus::Pending,
            barber_id: Some(data.barber_id.clone()),
            service_id: Some(data.service_id.clone()),
            customer_id: data.customer_id.clone(),
            notes: data.notes.clone(),
        };

        if booking.interval().is_none() {
            return Err(AppError::Upstream {
                status: Some(400),
                message: "endTime must be after startTime".to_string(),
            });
        }
        if conflicts(&tenant.bookings, &booking) {
            return Err(AppError::Upstream {
                status: Some(409),
                message: SLOT_TAKEN_MESSAGE.to_string(),
            });
        }

        tenant.bookings.push(booking.clone());
        Ok(booking)
    }

    async fn update_booking(
        &self,
        scope: &Scope,
        booking_id: &str,
        data: &UpdateBooking,
    ) -> AppResult<Booking> {
        let mut tenants = self.tenants.write().await;
        let tenant = tenants
            .get_mut(&scope.tenant)
            .ok_or_else(|| AppError::NotFound(format!("Tenant {} not found", scope.tenant)))?;

        let index = tenant
            .bookings
            .iter()
            .position(|b| b.id == booking_id)
            .ok_or_else(|| AppError::NotFound(format!("Booking {} not found", booking_id)))?;

        let mut updated = tenant.bookings[index].clone();
        updated.date = data.date;
        updated.start_time = data.start_time;
        updated.end_time = data.end_time;

        if conflicts(&tenant.bookings, &updated) {
            return Err(AppError::Upstream {
                status: Some(409),
                message: SLOT_TAKEN_MESSAGE.to_string(),
            });
        }

        tenant.bookings[index] = updated.clone();
        Ok(updated)
    }
}
