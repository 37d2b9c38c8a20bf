//! API integration tests
//!
//! Each test starts a fake booking backend and the gateway on ephemeral ports
//! and talks to the gateway over HTTP.

use std::collections::{BTreeSet, HashMap};
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use reqwest::Client;
use serde_json::{json, Value};

use barberbook_server::{
    config::AppConfig,
    create_router,
    models::session::{Capability, SessionClaims},
    repository::Repository,
    services::Services,
    AppState,
};

/// A Tuesday far enough ahead never to be in the past
const DATE: &str = "2030-06-11";

fn tenant_of(headers: &HeaderMap) -> String {
    headers
        .get("x-tenant")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn existing_booking(id: &str) -> Value {
    json!({
        "id": id,
        "date": DATE,
        "startTime": "10:30",
        "endTime": "11:00",
        "status": "CONFIRMED",
        "barberId": "x",
        "serviceId": "cut",
        "customerId": "u1"
    })
}

/// Backend serving a Tuesday 09:00-12:00 for tenant `shop`, with barber `x`
/// booked 10:30-11:00. Tenant `broken` gets a 503 from the availability
/// feed, and submissions at 10:00 are rejected as already taken.
fn fake_backend() -> Router {
    Router::new()
        .route(
            "/api/:tenant/schedules",
            get(|Query(query): Query<HashMap<String, String>>| async move {
                let mut day = json!({
                    "dayOfWeek": 2,
                    "isClosed": false,
                    "startTime": "09:00:00",
                    "endTime": "12:00:00"
                });
                if let Some(barber) = query.get("barberId") {
                    day["barberId"] = json!(barber);
                }
                Json(json!([day]))
            }),
        )
        .route("/api/:tenant/closures", get(|| async { Json(json!([])) }))
        .route(
            "/api/:tenant/services/:id",
            get(|Path((_, id)): Path<(String, String)>| async move {
                Json(json!({ "id": id, "name": "Haircut", "durationMinutes": 30 }))
            }),
        )
        .route(
            "/api/bookings/availability",
            get(|headers: HeaderMap| async move {
                if tenant_of(&headers) == "broken" {
                    return (
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(json!({ "message": "maintenance" })),
                    );
                }
                let slots: Vec<Value> = ["09:00", "09:30", "10:00", "10:30", "11:00", "11:30"]
                    .iter()
                    .map(|t| json!({ "time": t, "available": *t != "10:30" }))
                    .collect();
                (StatusCode::OK, Json(json!({ "slots": slots })))
            }),
        )
        .route(
            "/api/bookings",
            get(|| async { Json(json!([existing_booking("b1")])) }).post(
                |headers: HeaderMap, Json(body): Json<Value>| async move {
                    assert_eq!(tenant_of(&headers), "shop");
                    if body["startTime"] == "10:00" {
                        return (
                            StatusCode::CONFLICT,
                            Json(json!({ "message": "Barber already booked at 10:00" })),
                        );
                    }
                    let mut created = body.clone();
                    created["id"] = json!("b2");
                    created["status"] = json!("PENDING");
                    (StatusCode::CREATED, Json(created))
                },
            ),
        )
        .route(
            "/api/bookings/:id",
            get(|Path(id): Path<String>| async move {
                if id == "b1" {
                    (StatusCode::OK, Json(existing_booking("b1")))
                } else {
                    (StatusCode::NOT_FOUND, Json(json!({ "message": "Booking not found" })))
                }
            })
            .patch(|Path(id): Path<String>, Json(body): Json<Value>| async move {
                let mut moved = existing_booking(&id);
                for key in ["date", "startTime", "endTime"] {
                    moved[key] = body[key].clone();
                }
                Json(moved)
            }),
        )
}

async fn serve(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });
    addr
}

struct TestApp {
    base_url: String,
    client: Client,
    config: AppConfig,
}

impl TestApp {
    async fn start() -> Self {
        let backend = serve(fake_backend()).await;

        let mut config = AppConfig::default();
        config.upstream.base_url = format!("http://{}/api", backend);

        let repository = Repository::from_config(&config).expect("Failed to build repository");
        let state = AppState {
            config: Arc::new(config.clone()),
            services: Arc::new(Services::new(repository)),
        };
        let addr = serve(create_router(state)).await;

        Self {
            base_url: format!("http://{}/api/v1", addr),
            client: Client::new(),
            config,
        }
    }

    fn token(&self, role: &str, user_id: &str, tenant: Option<&str>) -> String {
        SessionClaims {
            sub: format!("{}@example.com", user_id),
            user_id: user_id.to_string(),
            tenant: tenant.map(str::to_string),
            role: role.to_string(),
            capabilities: BTreeSet::<Capability>::new(),
            exp: 4_102_444_800,
            iat: 0,
        }
        .create_token(&self.config.auth.jwt_secret)
        .expect("Failed to sign token")
    }

    async fn availability(&self, tenant: &str, token: &str, query: &str) -> reqwest::Response {
        self.client
            .get(format!("{}/availability?{}", self.base_url, query))
            .header("X-Tenant", tenant)
            .bearer_auth(token)
            .send()
            .await
            .expect("Failed to send request")
    }
}

#[tokio::test]
async fn test_health_check() {
    let app = TestApp::start().await;

    let response = app
        .client
        .get(format!("{}/health", app.base_url))
        .send()
        .await
        .expect("Failed to send request");
    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_availability_filters_booked_slots() {
    let app = TestApp::start().await;
    let token = app.token("customer", "u1", Some("shop"));

    let response = app
        .availability("shop", &token, &format!("barberId=x&date={}&serviceId=cut", DATE))
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["outcome"], "open");
    assert_eq!(body["durationMinutes"], 30);
    assert_eq!(body["window"]["effectiveStart"], "09:00");

    let bookable: Vec<&str> = body["slots"]
        .as_array()
        .expect("slots")
        .iter()
        .filter(|s| s["available"] == true)
        .filter_map(|s| s["time"].as_str())
        .collect();
    assert_eq!(bookable, ["09:00", "09:30", "10:00", "11:00", "11:30"]);
}

#[tokio::test]
async fn test_availability_fails_closed() {
    let app = TestApp::start().await;
    let token = app.token("customer", "u1", None);

    let response = app
        .availability("broken", &token, &format!("barberId=x&date={}&durationMinutes=30", DATE))
        .await;
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["outcome"], "fetchFailed");
    assert_eq!(body["retryable"], true);
    assert!(body["slots"].as_array().expect("slots").is_empty());
}

#[tokio::test]
async fn test_availability_rejects_bad_query() {
    let app = TestApp::start().await;
    let token = app.token("customer", "u1", Some("shop"));

    let response = app
        .availability("shop", &token, "barberId=x&date=11/06/2030&durationMinutes=30")
        .await;
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_availability_excluding_someone_elses_booking() {
    let app = TestApp::start().await;
    let token = app.token("customer", "u2", Some("shop"));

    let response = app
        .availability("shop", &token, &format!("barberId=x&date={}&durationMinutes=30&excludeBookingId=b1", DATE))
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_availability_excluding_unknown_booking() {
    let app = TestApp::start().await;
    let token = app.token("tenant_admin", "admin", Some("shop"));

    let response = app
        .availability("shop", &token, &format!("barberId=x&date={}&durationMinutes=30&excludeBookingId=nope", DATE))
        .await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_unauthorized_access() {
    let app = TestApp::start().await;

    let response = app
        .client
        .get(format!("{}/availability?barberId=x&date={}&durationMinutes=30", app.base_url, DATE))
        .header("X-Tenant", "shop")
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_session_bound_to_other_tenant() {
    let app = TestApp::start().await;
    let token = app.token("customer", "u1", Some("other-shop"));

    let response = app
        .availability("shop", &token, &format!("barberId=x&date={}&durationMinutes=30", DATE))
        .await;
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_tenant_from_host_subdomain() {
    let app = TestApp::start().await;
    let token = app.token("customer", "u1", Some("shop"));

    let response = app
        .client
        .get(format!("{}/availability?barberId=x&date={}&durationMinutes=30", app.base_url, DATE))
        .header("Host", "shop.barberbook.app")
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let missing = app
        .client
        .get(format!("{}/availability?barberId=x&date={}&durationMinutes=30", app.base_url, DATE))
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(missing.status(), 400);
}

#[tokio::test]
async fn test_create_booking() {
    let app = TestApp::start().await;
    let token = app.token("customer", "u1", Some("shop"));

    let response = app
        .client
        .post(format!("{}/bookings", app.base_url))
        .header("X-Tenant", "shop")
        .bearer_auth(&token)
        .json(&json!({
            "barberId": "x",
            "serviceId": "cut",
            "date": DATE,
            "startTime": "09:30"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 201);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["id"], "b2");
    assert_eq!(body["endTime"], "10:00");
    assert_eq!(body["customerId"], "u1");
}

#[tokio::test]
async fn test_create_booking_conflict_is_surfaced() {
    let app = TestApp::start().await;
    let token = app.token("customer", "u1", Some("shop"));

    let response = app
        .client
        .post(format!("{}/bookings", app.base_url))
        .header("X-Tenant", "shop")
        .bearer_auth(&token)
        .json(&json!({
            "barberId": "x",
            "serviceId": "cut",
            "date": DATE,
            "startTime": "10:00"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 409);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Barber already booked at 10:00");
}

#[tokio::test]
async fn test_barber_cannot_create_booking() {
    let app = TestApp::start().await;
    let token = app.token("barber", "x", Some("shop"));

    let response = app
        .client
        .post(format!("{}/bookings", app.base_url))
        .header("X-Tenant", "shop")
        .bearer_auth(&token)
        .json(&json!({
            "barberId": "x",
            "serviceId": "cut",
            "date": DATE,
            "startTime": "09:30"
        }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_reschedule_own_booking() {
    let app = TestApp::start().await;
    let token = app.token("customer", "u1", Some("shop"));

    let options = app
        .client
        .get(format!("{}/bookings/b1/reschedule", app.base_url))
        .header("X-Tenant", "shop")
        .bearer_auth(&token)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(options.status(), 200);
    let options: Value = options.json().await.expect("Failed to parse response");
    assert_eq!(options["selectedTime"], "10:30");
    assert_eq!(options["availability"]["outcome"], "open");

    let response = app
        .client
        .patch(format!("{}/bookings/b1", app.base_url))
        .header("X-Tenant", "shop")
        .bearer_auth(&token)
        .json(&json!({ "date": DATE, "startTime": "11:00" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 200);

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["startTime"], "11:00");
    assert_eq!(body["endTime"], "11:30");
}

#[tokio::test]
async fn test_reschedule_someone_elses_booking() {
    let app = TestApp::start().await;
    let token = app.token("customer", "u2", Some("shop"));

    let response = app
        .client
        .patch(format!("{}/bookings/b1", app.base_url))
        .header("X-Tenant", "shop")
        .bearer_auth(&token)
        .json(&json!({ "date": DATE, "startTime": "11:00" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 403);
}

#[tokio::test]
async fn test_reschedule_unknown_booking() {
    let app = TestApp::start().await;
    let token = app.token("tenant_admin", "admin", Some("shop"));

    let response = app
        .client
        .patch(format!("{}/bookings/nope", app.base_url))
        .header("X-Tenant", "shop")
        .bearer_auth(&token)
        .json(&json!({ "date": DATE, "startTime": "11:00" }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), 404);
}
