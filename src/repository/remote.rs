//! REST client for the booking backend

use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::{DataSource, Scope};
use crate::{
    config::UpstreamConfig,
    error::{AppError, AppResult},
    models::{
        availability::{AvailabilitySlot, BackendAvailability, Service},
        booking::{Booking, CreateBooking, UpdateBooking},
        schedule::{Closure, WeeklySchedule},
    },
};

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Clone)]
pub struct RemoteSource {
    client: Client,
    base_url: Url,
}

impl RemoteSource {
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .user_agent(concat!("barberbook-server/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let base_url = Url::parse(config.base_url.trim_end_matches('/')).map_err(|e| {
            AppError::Internal(format!("Invalid upstream URL {}: {}", config.base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Internal(format!(
                "Upstream URL {} cannot carry a path",
                config.base_url
            )));
        }
        Ok(Self { client, base_url })
    }

    /// Append path segments to the base URL. Each segment is percent-encoded
    /// on its own, so an id can never add or climb path levels.
    fn url(&self, segments: &[&str]) -> AppResult<Url> {
        if let Some(bad) = segments
            .iter()
            .find(|s| s.is_empty() || **s == "." || **s == "..")
        {
            return Err(AppError::BadRequest(format!("Invalid identifier: '{}'", bad)));
        }
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| AppError::Internal("Upstream URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn scoped(&self, builder: RequestBuilder, scope: &Scope) -> RequestBuilder {
        let builder = builder.header("X-Tenant", &scope.tenant);
        match &scope.bearer {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send<T: DeserializeOwned>(&self, builder: RequestBuilder, scope: &Scope) -> AppResult<T> {
        let response = self.scoped(builder, scope).send().await?;
        let response = check_status(response).await?;
        Ok(response.json::<T>().await?)
    }

    async fn get<T: DeserializeOwned>(
        &self,
        scope: &Scope,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> AppResult<T> {
        let url = self.url(segments)?;
        tracing::debug!(tenant = %scope.tenant, path = url.path(), "GET upstream");
        self.send(self.client.get(url).query(query), scope).await
    }
}

/// Turn a non-success response into an `Upstream` error carrying the
/// backend's message.
async fn check_status(response: Response) -> AppResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = extract_message(&body)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());

    if status == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(message));
    }
    Err(AppError::Upstream {
        status: Some(status.as_u16()),
        message,
    })
}

/// Backends report errors as `{"message": ...}` or `{"error": ...}`; the
/// message may also be a list of validation strings.
fn extract_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let field = value.get("message").or_else(|| value.get("error"))?;
    match field {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items.iter().filter_map(Value::as_str).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        _ => None,
    }
}

#[async_trait]
impl DataSource for RemoteSource {
    async fn tenant_schedules(&self, scope: &Scope) -> AppResult<Vec<WeeklySchedule>> {
        self.get(scope, &[scope.tenant.as_str(), "schedules"], &[]).await
    }

    async fn barber_schedules(&self, scope: &Scope, barber_id: &str) -> AppResult<Vec<WeeklySchedule>> {
        self.get(scope, &[scope.tenant.as_str(), "schedules"], &[("barberId", barber_id.to_string())])
            .await
    }

    async fn tenant_closures(&self, scope: &Scope) -> AppResult<Vec<Closure>> {
        self.get(scope, &[scope.tenant.as_str(), "closures"], &[]).await
    }

    async fn barber_closures(&self, scope: &Scope, barber_id: &str) -> AppResult<Vec<Closure>> {
        self.get(scope, &[scope.tenant.as_str(), "closures"], &[("barberId", barber_id.to_string())])
            .await
    }

    async fn service(&self, scope: &Scope, service_id: &str) -> AppResult<Service> {
        self.get(scope, &[scope.tenant.as_str(), "services", service_id], &[]).await
    }

    async fn availability(
        &self,
        scope: &Scope,
        barber_id: &str,
        date: NaiveDate,
    ) -> AppResult<Vec<AvailabilitySlot>> {
        let feed: BackendAvailability = self
            .get(
                scope,
                &["bookings", "availability"],
                &[
                    ("barberId", barber_id.to_string()),
                    ("date", date.format(DATE_FORMAT).to_string()),
                ],
            )
            .await?;
        Ok(feed.slots)
    }

    async fn bookings(
        &self,
        scope: &Scope,
        barber_id: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> AppResult<Vec<Booking>> {
        self.get(
            scope,
            &["bookings"],
            &[
                ("startDate", start_date.format(DATE_FORMAT).to_string()),
                ("endDate", end_date.format(DATE_FORMAT).to_string()),
                ("barberId", barber_id.to_string()),
            ],
        )
        .await
    }

    async fn booking(&self, scope: &Scope, booking_id: &str) -> AppResult<Booking> {
        self.get(scope, &["bookings", booking_id], &[]).await
    }

    async fn create_booking(&self, scope: &Scope, data: &CreateBooking) -> AppResult<Booking> {
        tracing::info!(tenant = %scope.tenant, barber_id = %data.barber_id, date = %data.date, start = %data.start_time, "Submitting booking");
        let url = self.url(&["bookings"])?;
        self.send(self.client.post(url).json(data), scope).await
    }

    async fn update_booking(
        &self,
        scope: &Scope,
        booking_id: &str,
        data: &UpdateBooking,
    ) -> AppResult<Booking> {
        tracing::info!(tenant = %scope.tenant, booking_id, date = %data.date, start = %data.start_time, "Rescheduling booking");
        let url = self.url(&["bookings", booking_id])?;
        self.send(self.client.patch(url).json(data), scope).await
    }
}
