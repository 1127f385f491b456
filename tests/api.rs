//! End-to-end tests of the HTTP surface over in-memory storage.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use event_booking::{config::Config, controllers, repository::Repositories, AppState};

fn app() -> Router {
    let config = Config::from_lookup(|key| match key {
        "BCRYPT_COST" => Some("4".to_string()),
        "JWT_SECRET" => Some("integration-secret".to_string()),
        _ => None,
    })
    .unwrap();
    controllers::router(AppState::new(config, Repositories::in_memory()))
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn register(app: &Router, email: &str, password: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    body["token"].as_str().unwrap().to_string()
}

async fn create_event(app: &Router, token: &str) -> String {
    let (status, venue) = call(
        app,
        Method::POST,
        "/api/venues",
        Some(token),
        Some(json!({ "name": "City Concert Hall", "address": "1 Abay Avenue" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{venue}");

    let (status, event) = call(
        app,
        Method::POST,
        "/api/events",
        Some(token),
        Some(json!({
            "title": "Exhibition opening",
            "description": "Contemporary art with the curator",
            "startAt": "2030-05-01T18:00:00Z",
            "endAt": "2030-05-01T20:00:00Z",
            "venueId": venue["id"],
            "published": true
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{event}");
    event["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = call(&app(), Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn booking_lifecycle_end_to_end() {
    let app = app();
    let token = register(&app, "a@x.test", "pw1").await;

    let (status, login) = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "a@x.test", "password": "pw1" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["user"]["email"], "a@x.test");
    assert!(login["user"].get("passwordHash").is_none());

    let event_id = create_event(&app, &token).await;

    let (status, booking) = call(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&token),
        Some(json!({ "eventId": event_id, "seats": ["A2", "A1"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{booking}");
    assert_eq!(booking["status"], "active");
    assert_eq!(booking["totalPrice"], 2 * 2500);
    assert_eq!(booking["currency"], "KZT");
    assert_eq!(booking["seats"], json!(["A1", "A2"]));
    let booking_id = booking["id"].as_str().unwrap().to_string();

    let (status, occupied) = call(
        &app,
        Method::GET,
        &format!("/api/events/{event_id}/occupied-seats"),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(occupied["items"], json!(["A1", "A2"]));

    let cancel_uri = format!("/api/bookings/{booking_id}");
    let (status, _) = call(&app, Method::DELETE, &cancel_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, listed) = call(&app, Method::GET, "/api/bookings", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["items"][0]["status"], "canceled");
    assert_eq!(listed["items"][0]["seats"], json!(["A1", "A2"]));

    let (status, body) = call(&app, Method::DELETE, &cancel_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not found" }));

    let (_, occupied) = call(
        &app,
        Method::GET,
        &format!("/api/events/{event_id}/occupied-seats"),
        None,
        None,
    )
    .await;
    assert_eq!(occupied["items"], json!([]));
}

#[tokio::test]
async fn overlapping_booking_is_a_conflict() {
    let app = app();
    let alice = register(&app, "alice@x.test", "pw").await;
    let bob = register(&app, "bob@x.test", "pw").await;
    let event_id = create_event(&app, &alice).await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&alice),
        Some(json!({ "eventId": event_id, "seats": ["C3", "C4"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&bob),
        Some(json!({ "eventId": event_id, "seats": ["C4", "C5"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body, json!({ "error": "conflict" }));

    let (_, bobs) = call(&app, Method::GET, "/api/bookings", Some(&bob), None).await;
    assert_eq!(bobs["items"], json!([]));
}

#[tokio::test]
async fn booking_requests_are_validated() {
    let app = app();
    let token = register(&app, "v@x.test", "pw").await;
    let event_id = create_event(&app, &token).await;

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&token),
        Some(json!({ "eventId": event_id, "seats": [] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&token),
        Some(json!({ "eventId": "00000000-0000-4000-8000-000000000000", "seats": ["A1"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&token),
        Some(json!({ "eventId": "not-a-uuid", "seats": ["A1"] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid payload" }));

    let (status, body) = call(&app, Method::DELETE, "/api/bookings/42", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid id" }));
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = app();

    let (status, _) = call(&app, Method::GET, "/api/bookings", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&app, Method::GET, "/api/profile", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/venues",
        None,
        Some(json!({ "name": "Hall", "address": "Street" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let token = register(&app, "p@x.test", "pw").await;
    let request = Request::builder()
        .uri("/api/profile")
        .header("X-Auth-Token", token.as_str())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let app = app();
    register(&app, "known@x.test", "right").await;

    let unknown = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "unknown@x.test", "password": "right" })),
    )
    .await;
    let wrong = call(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "known@x.test", "password": "wrong" })),
    )
    .await;

    assert_eq!(unknown.0, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown, wrong);
}

#[tokio::test]
async fn duplicate_registration_conflicts() {
    let app = app();
    register(&app, "dup@x.test", "pw").await;
    let (status, _) = call(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "email": " DUP@x.test ", "password": "pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn event_writes_check_the_venue_and_window() {
    let app = app();
    let token = register(&app, "e@x.test", "pw").await;

    let payload = |venue: &str, start: &str, end: &str| {
        json!({
            "title": "Gala",
            "description": "Annual gala",
            "startAt": start,
            "endAt": end,
            "venueId": venue,
            "published": false
        })
    };

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/events",
        Some(&token),
        Some(payload(
            "00000000-0000-4000-8000-000000000000",
            "2030-01-01T10:00:00Z",
            "2030-01-01T12:00:00Z",
        )),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid" }));

    let event_id = create_event(&app, &token).await;
    let (_, event) = call(&app, Method::GET, &format!("/api/events/{event_id}"), None, None).await;
    let venue_id = event["venueId"].as_str().unwrap().to_string();

    let (status, _) = call(
        &app,
        Method::PUT,
        &format!("/api/events/{event_id}"),
        Some(&token),
        Some(payload(&venue_id, "2030-01-01T12:00:00Z", "2030-01-01T10:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, updated) = call(
        &app,
        Method::PUT,
        &format!("/api/events/{event_id}"),
        Some(&token),
        Some(payload(&venue_id, "2030-01-01T10:00:00Z", "2030-01-01T12:00:00Z")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Gala");

    let event_uri = format!("/api/events/{event_id}");
    let (status, _) = call(&app, Method::DELETE, &event_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = call(&app, Method::GET, &event_uri, None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn catalog_reads_are_public() {
    let app = app();

    let (status, categories) = call(&app, Method::GET, "/api/categories", None, None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = categories["items"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Concerts", "Exhibitions", "Sports", "Theatre"]);

    let first_id = categories["items"][0]["id"].as_str().unwrap();
    let category_uri = format!("/api/categories/{first_id}");
    let (status, category) = call(&app, Method::GET, &category_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(category["name"], "Concerts");

    let (status, venues) = call(&app, Method::GET, "/api/venues", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(venues["items"], json!([]));

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/venues/00000000-0000-4000-8000-000000000000",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn blank_venue_fields_are_rejected() {
    let app = app();
    let token = register(&app, "b@x.test", "pw").await;
    let (status, body) = call(
        &app,
        Method::POST,
        "/api/venues",
        Some(&token),
        Some(json!({ "name": "   ", "address": "Street" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid payload" }));
}

#[tokio::test]
async fn referenced_venue_and_booked_event_cannot_be_deleted() {
    let app = app();
    let token = register(&app, "r@x.test", "pw").await;
    let event_id = create_event(&app, &token).await;
    let event_uri = format!("/api/events/{event_id}");
    let (_, event) = call(&app, Method::GET, &event_uri, None, None).await;
    let venue_uri = format!("/api/venues/{}", event["venueId"].as_str().unwrap());

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/bookings",
        Some(&token),
        Some(json!({ "eventId": event_id, "seats": ["A1"] })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = call(&app, Method::DELETE, &venue_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "invalid" }));

    let (status, _) = call(&app, Method::DELETE, &event_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(&app, Method::GET, &event_uri, None, None).await;
    assert_eq!(status, StatusCode::OK);
    let (_, occupied) = call(
        &app,
        Method::GET,
        &format!("{event_uri}/occupied-seats"),
        None,
        None,
    )
    .await;
    assert_eq!(occupied["items"], json!(["A1"]));
}
