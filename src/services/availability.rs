//! Availability service: loads schedules, closures, bookings and the backend
//! feed concurrently, then runs the calculator

use chrono::{NaiveDate, NaiveDateTime};

use crate::{
    availability::{
        compute_day, AvailabilityOutcome, ClockTime, DayInputs, DayRequest, SlotState,
        FETCH_FAILED_MESSAGE,
    },
    error::{AppError, AppResult},
    models::{
        availability::{
            AvailabilityQuery, AvailabilityRequest, AvailabilityResponse, AvailabilitySlot,
            ServiceDuration, SlotView, WindowView,
        },
        booking::Booking,
        schedule::{Closure, WeeklySchedule},
        session::Session,
        tenant::TenantConfig,
        wire,
    },
    repository::{Repository, Scope},
};

pub const PAST_DATE_MESSAGE: &str = "This date is in the past";

/// Everything fetched for one availability check
#[derive(Debug, Clone)]
struct DayData {
    tenant_schedules: Vec<WeeklySchedule>,
    barber_schedules: Vec<WeeklySchedule>,
    closures: Vec<Closure>,
    feed: Vec<AvailabilitySlot>,
    bookings: Vec<Booking>,
    duration_minutes: u32,
    rescheduling: Option<Booking>,
}

#[derive(Clone)]
pub struct AvailabilityService {
    repository: Repository,
}

impl AvailabilityService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Validate raw query parameters
    pub fn parse_query(query: &AvailabilityQuery) -> AppResult<AvailabilityRequest> {
        let barber_id = query.barber_id.trim();
        if barber_id.is_empty() {
            return Err(AppError::Validation("barberId is required".to_string()));
        }

        let date = wire::date::parse(&query.date)
            .map_err(|_| AppError::Validation("Invalid date (use YYYY-MM-DD)".to_string()))?;

        let duration = match (query.duration_minutes, query.service_id.as_deref()) {
            (Some(0), _) => {
                return Err(AppError::Validation(
                    "durationMinutes must be positive".to_string(),
                ))
            }
            (Some(minutes), _) => ServiceDuration::Minutes(minutes),
            (None, Some(id)) if !id.trim().is_empty() => ServiceDuration::Service(id.trim().to_string()),
            _ => {
                return Err(AppError::Validation(
                    "serviceId or durationMinutes is required".to_string(),
                ))
            }
        };

        Ok(AvailabilityRequest {
            barber_id: barber_id.to_string(),
            date,
            duration,
            exclude_booking_id: query
                .exclude_booking_id
                .as_deref()
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(str::to_string),
        })
    }

    /// Check availability on behalf of a caller. Excluding a booking is a
    /// reschedule view, so the caller must have reschedule rights on it.
    pub async fn check_for(
        &self,
        tenant: &TenantConfig,
        scope: &Scope,
        session: &Session,
        request: &AvailabilityRequest,
    ) -> AppResult<AvailabilityResponse> {
        if let Some(id) = request.exclude_booking_id.as_deref() {
            match self.repository.booking(scope, id).await {
                Ok(booking) => session.require_reschedule(booking.customer_id.as_deref())?,
                Err(e) if e.is_fetch_failure() => return Ok(fetch_failed(scope, request, &e)),
                Err(e) => return Err(e),
            }
        }
        self.check(tenant, scope, request).await
    }

    /// Check availability as of now in the tenant's timezone.
    pub async fn check(
        &self,
        tenant: &TenantConfig,
        scope: &Scope,
        request: &AvailabilityRequest,
    ) -> AppResult<AvailabilityResponse> {
        self.check_at(tenant, scope, request, tenant.local_now()).await
    }

    /// Check availability with an explicit notion of "now". A backend that
    /// cannot be reached yields an empty, retryable response; an unknown
    /// service or booking is an error.
    pub async fn check_at(
        &self,
        tenant: &TenantConfig,
        scope: &Scope,
        request: &AvailabilityRequest,
        now: NaiveDateTime,
    ) -> AppResult<AvailabilityResponse> {
        let today = now.date();
        if tenant.hide_past_slots && request.date < today {
            return Ok(AvailabilityResponse::unavailable(
                request,
                AvailabilityOutcome::ClosedDay,
                PAST_DATE_MESSAGE,
            ));
        }

        let data = match self.load(scope, request).await {
            Ok(data) => data,
            Err(e) if e.is_fetch_failure() => return Ok(fetch_failed(scope, request, &e)),
            Err(e) => return Err(e),
        };

        let not_before = (tenant.hide_past_slots && request.date == today)
            .then(|| ClockTime::from(now.time()));

        let day = compute_day(DayRequest {
            day: DayInputs {
                date: request.date,
                barber_id: &request.barber_id,
                tenant_schedules: &data.tenant_schedules,
                barber_schedules: &data.barber_schedules,
                closures: &data.closures,
            },
            backend: &data.feed,
            bookings: &data.bookings,
            duration_minutes: data.duration_minutes,
            interval_minutes: tenant.slot_interval_minutes,
            rescheduling: data.rescheduling.as_ref(),
            not_before,
        });

        tracing::debug!(
            tenant = %scope.tenant,
            barber_id = %request.barber_id,
            date = %request.date,
            outcome = ?day.outcome,
            bookable = day.bookable().len(),
            "Availability computed"
        );

        Ok(AvailabilityResponse {
            barber_id: request.barber_id.clone(),
            date: request.date,
            duration_minutes: Some(data.duration_minutes),
            outcome: day.outcome,
            message: day.message,
            retryable: false,
            window: day.window.as_ref().map(WindowView::from),
            slots: day
                .slots
                .into_iter()
                .map(|(time, state)| SlotView {
                    time,
                    available: state == SlotState::Bookable,
                    state,
                })
                .collect(),
        })
    }

    /// Fetch all inputs concurrently; any failure fails the whole load.
    async fn load(&self, scope: &Scope, request: &AvailabilityRequest) -> AppResult<DayData> {
        let repo = &self.repository;
        let barber_id = request.barber_id.as_str();
        let date: NaiveDate = request.date;

        let duration = async {
            match &request.duration {
                ServiceDuration::Minutes(minutes) => Ok(*minutes),
                ServiceDuration::Service(id) => repo.service(scope, id).await.map(|s| s.duration_minutes),
            }
        };
        let rescheduling = async {
            match request.exclude_booking_id.as_deref() {
                Some(id) => repo.booking(scope, id).await.map(Some),
                None => Ok(None),
            }
        };

        let (
            tenant_schedules,
            barber_schedules,
            mut closures,
            barber_closures,
            feed,
            bookings,
            duration_minutes,
            rescheduling,
        ) = tokio::try_join!(
            repo.tenant_schedules(scope),
            repo.barber_schedules(scope, barber_id),
            repo.tenant_closures(scope),
            repo.barber_closures(scope, barber_id),
            repo.availability(scope, barber_id, date),
            repo.bookings(scope, barber_id, date, date),
            duration,
            rescheduling,
        )?;

        closures.extend(barber_closures);

        Ok(DayData {
            tenant_schedules,
            barber_schedules,
            closures,
            feed,
            bookings,
            duration_minutes,
            rescheduling,
        })
    }
}

fn fetch_failed(scope: &Scope, request: &AvailabilityRequest, error: &AppError) -> AvailabilityResponse {
    tracing::warn!(
        tenant = %scope.tenant,
        barber_id = %request.barber_id,
        date = %request.date,
        "Availability fetch failed: {}",
        error
    );
    AvailabilityResponse::unavailable(request, AvailabilityOutcome::FetchFailed, FETCH_FAILED_MESSAGE)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::{booking::BookingStatus, session::SessionClaims};
    use crate::repository::MockDataSource;

    fn t(s: &str) -> ClockTime {
        ClockTime::parse(s).unwrap()
    }

    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 10).unwrap()
    }

    fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn tenant() -> TenantConfig {
        TenantConfig {
            slug: "shop".to_string(),
            slot_interval_minutes: 30,
            utc_offset_minutes: 0,
            hide_past_slots: true,
        }
    }

    fn hours(start: &str, end: &str) -> Vec<WeeklySchedule> {
        vec![WeeklySchedule {
            barber_id: None,
            day_of_week: 2,
            is_closed: false,
            start_time: Some(t(start)),
            end_time: Some(t(end)),
            lunch_start_time: None,
            lunch_end_time: None,
        }]
    }

    fn feed(start: &str, end: &str) -> Vec<AvailabilitySlot> {
        crate::availability::generate_slots(t(start), t(end), 30, &[])
            .into_iter()
            .map(|time| AvailabilitySlot { time, available: true })
            .collect()
    }

    fn open_day_mock() -> MockDataSource {
        let mut mock = MockDataSource::new();
        mock.expect_tenant_schedules().returning(|_| Ok(hours("09:00", "12:00")));
        mock.expect_barber_schedules().returning(|_, _| Ok(hours("09:00", "12:00")));
        mock.expect_tenant_closures().returning(|_| Ok(Vec::new()));
        mock.expect_barber_closures().returning(|_, _| Ok(Vec::new()));
        mock
    }

    fn request(duration: ServiceDuration) -> AvailabilityRequest {
        AvailabilityRequest {
            barber_id: "x".to_string(),
            date: tuesday(),
            duration,
            exclude_booking_id: None,
        }
    }

    fn service(mock: MockDataSource) -> AvailabilityService {
        AvailabilityService::new(Repository::new(Arc::new(mock)))
    }

    #[test]
    fn test_parse_query_validation() {
        let mut query = AvailabilityQuery {
            barber_id: "x".to_string(),
            date: "2025-06-10".to_string(),
            service_id: Some("cut".to_string()),
            duration_minutes: None,
            exclude_booking_id: Some("  ".to_string()),
        };
        let parsed = AvailabilityService::parse_query(&query).unwrap();
        assert_eq!(parsed.duration, ServiceDuration::Service("cut".to_string()));
        assert_eq!(parsed.exclude_booking_id, None);

        query.duration_minutes = Some(45);
        let parsed = AvailabilityService::parse_query(&query).unwrap();
        assert_eq!(parsed.duration, ServiceDuration::Minutes(45));

        query.duration_minutes = Some(0);
        assert!(AvailabilityService::parse_query(&query).is_err());

        query.duration_minutes = None;
        query.service_id = None;
        assert!(AvailabilityService::parse_query(&query).is_err());

        query.duration_minutes = Some(30);
        query.date = "10/06/2025".to_string();
        assert!(AvailabilityService::parse_query(&query).is_err());
    }

    #[tokio::test]
    async fn test_check_uses_service_duration_and_bookings() {
        let mut mock = open_day_mock();
        mock.expect_availability().returning(|_, _, _| Ok(feed("09:00", "12:00")));
        mock.expect_bookings().returning(|_, _, _, _| {
            Ok(vec![Booking {
                id: "b1".to_string(),
                date: tuesday(),
                start_time: t("10:30"),
                end_time: t("11:00"),
                status: BookingStatus::Confirmed,
                barber_id: Some("x".to_string()),
                service_id: None,
                customer_id: None,
                notes: None,
            }])
        });
        mock.expect_service().returning(|_, id| {
                assert_eq!(id, "beard");
                Ok(crate::models::availability::Service {
                    id: id.to_string(),
                    name: None,
                    duration_minutes: 60,
                })
            });

        let response = service(mock)
            .check_at(&tenant(), &Scope::new("shop", None), &request(ServiceDuration::Service("beard".to_string())), morning())
            .await
            .unwrap();

        assert_eq!(response.outcome, AvailabilityOutcome::Open);
        assert_eq!(response.duration_minutes, Some(60));
        assert_eq!(response.bookable(), vec![t("09:00"), t("09:30"), t("11:00")]);
        assert_eq!(response.slots.len(), 6);
    }

    #[tokio::test]
    async fn test_fetch_failure_fails_closed() {
        let mut mock = open_day_mock();
        mock.expect_availability().returning(|_, _, _| {
            Err(AppError::Upstream {
                status: Some(503),
                message: "maintenance".to_string(),
            })
        });
        mock.expect_bookings().returning(|_, _, _, _| Ok(Vec::new()));

        let response = service(mock)
            .check_at(&tenant(), &Scope::new("shop", None), &request(ServiceDuration::Minutes(30)), morning())
            .await
            .unwrap();

        assert_eq!(response.outcome, AvailabilityOutcome::FetchFailed);
        assert!(response.retryable);
        assert!(response.slots.is_empty());
        assert_eq!(response.message.as_deref(), Some(FETCH_FAILED_MESSAGE));
    }

    #[tokio::test]
    async fn test_past_dates_are_closed_without_fetching() {
        let mock = MockDataSource::new();
        let now = NaiveDate::from_ymd_opt(2025, 6, 11).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let response = service(mock)
            .check_at(&tenant(), &Scope::new("shop", None), &request(ServiceDuration::Minutes(30)), now)
            .await
            .unwrap();
        assert_eq!(response.outcome, AvailabilityOutcome::ClosedDay);
        assert_eq!(response.message.as_deref(), Some(PAST_DATE_MESSAGE));
    }

    #[tokio::test]
    async fn test_today_hides_started_slots() {
        let mut mock = open_day_mock();
        mock.expect_availability().returning(|_, _, _| Ok(feed("09:00", "12:00")));
        mock.expect_bookings().returning(|_, _, _, _| Ok(Vec::new()));

        let now = tuesday().and_hms_opt(10, 10, 0).unwrap();
        let response = service(mock)
            .check_at(&tenant(), &Scope::new("shop", None), &request(ServiceDuration::Minutes(30)), now)
            .await
            .unwrap();
        assert_eq!(response.bookable(), vec![t("10:30"), t("11:00"), t("11:30")]);
    }

    #[tokio::test]
    async fn test_reschedule_excludes_own_booking() {
        let own = Booking {
            id: "b1".to_string(),
            date: tuesday(),
            start_time: t("10:00"),
            end_time: t("11:00"),
            status: BookingStatus::Confirmed,
            barber_id: Some("x".to_string()),
            service_id: None,
            customer_id: Some("u1".to_string()),
            notes: None,
        };
        let mut mock = open_day_mock();
        mock.expect_availability().returning(|_, _, _| {
            let mut slots = feed("09:00", "12:00");
            for slot in slots.iter_mut() {
                slot.available = slot.time < t("10:00") || slot.time >= t("11:00");
            }
            Ok(slots)
        });
        let listed = own.clone();
        mock.expect_bookings().returning(move |_, _, _, _| Ok(vec![listed.clone()]));
        let fetched = own.clone();
        mock.expect_booking().returning(move |_, id| {
            assert_eq!(id, "b1");
            Ok(fetched.clone())
        });

        let mut req = request(ServiceDuration::Minutes(60));
        req.exclude_booking_id = Some("b1".to_string());
        let response = service(mock)
            .check_at(&tenant(), &Scope::new("shop", None), &req, morning())
            .await
            .unwrap();

        assert!(response.bookable().contains(&t("10:00")));
        assert!(response.bookable().contains(&t("09:30")));
    }

    #[tokio::test]
    async fn test_unknown_service_is_not_found() {
        let mut mock = open_day_mock();
        mock.expect_availability().returning(|_, _, _| Ok(feed("09:00", "12:00")));
        mock.expect_bookings().returning(|_, _, _, _| Ok(Vec::new()));
        mock.expect_service()
            .returning(|_, id| Err(AppError::NotFound(format!("Service {} not found", id))));

        let result = service(mock)
            .check_at(&tenant(), &Scope::new("shop", None), &request(ServiceDuration::Service("nope".to_string())), morning())
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    fn customer(user_id: &str) -> Session {
        Session::new(
            SessionClaims {
                sub: format!("{}@example.com", user_id),
                user_id: user_id.to_string(),
                tenant: Some("shop".to_string()),
                role: "customer".to_string(),
                capabilities: Default::default(),
                exp: 4_102_444_800,
                iat: 0,
            },
            String::new(),
        )
    }

    #[tokio::test]
    async fn test_excluding_someone_elses_booking_is_forbidden() {
        let mut mock = MockDataSource::new();
        mock.expect_booking().times(1).returning(|_, id| {
            Ok(Booking {
                id: id.to_string(),
                date: tuesday(),
                start_time: t("10:00"),
                end_time: t("10:30"),
                status: BookingStatus::Confirmed,
                barber_id: Some("x".to_string()),
                service_id: None,
                customer_id: Some("u2".to_string()),
                notes: None,
            })
        });

        let mut req = request(ServiceDuration::Minutes(30));
        req.exclude_booking_id = Some("b9".to_string());
        let result = service(mock)
            .check_for(&tenant(), &Scope::new("shop", None), &customer("u1"), &req)
            .await;

        assert!(matches!(result, Err(AppError::Authorization(_))));
    }
}
