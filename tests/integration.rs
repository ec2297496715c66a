use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use ride_broker::api::rest::router;
use ride_broker::state::AppState;
use serde_json::{Value, json};
use tower::ServiceExt;

fn setup() -> axum::Router {
    router(Arc::new(AppState::new(5.0)))
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_string(&body).unwrap()))
        .unwrap()
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn ride_body(lat: f64, lng: f64, dest_lat: f64, dest_lng: f64) -> Value {
    json!({
        "rider_id": uuid::Uuid::new_v4(),
        "pickup": { "address": "origin", "location": { "lat": lat, "lng": lng } },
        "destination": { "address": "target", "location": { "lat": dest_lat, "lng": dest_lng } },
        "vehicle_class": "Car"
    })
}

async fn create_ride(app: &axum::Router) -> Value {
    let response = app
        .clone()
        .oneshot(json_request("POST", "/rides", ride_body(0.0, 0.0, 0.0, 0.01)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await
}

fn wrong_otp(actual: &str) -> &'static str {
    if actual == "000000" { "111111" } else { "000000" }
}

#[tokio::test]
async fn health_returns_ok() {
    let app = setup();
    let response = app.oneshot(get_request("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["rides"], 0);
    assert_eq!(body["drivers_online"], 0);
}

#[tokio::test]
async fn metrics_returns_prometheus_format() {
    let app = setup();
    let response = app.oneshot(get_request("/metrics")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(content_type.contains("text/plain"));

    let body = body_string(response).await;
    assert!(body.contains("rides_created_total"));
    assert!(body.contains("online_drivers"));
}

#[tokio::test]
async fn create_ride_returns_pending_with_otp_and_quote() {
    let app = setup();
    let body = create_ride(&app).await;

    assert_eq!(body["status"], "Pending");
    assert!(body["driver_id"].is_null());
    assert!(body["requested_at"].is_string());
    assert!(body["fare"].as_f64().unwrap() > 0.0);

    let otp = body["otp"].as_str().unwrap();
    assert_eq!(otp.len(), 6);
    assert!(otp.chars().all(|c| c.is_ascii_digit()));
}

#[tokio::test]
async fn get_ride_never_exposes_the_otp() {
    let app = setup();
    let created = create_ride(&app).await;
    let id = created["id"].as_str().unwrap();

    let response = app.oneshot(get_request(&format!("/rides/{id}"))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], created["id"]);
    assert!(body.get("otp").is_none());
}

#[tokio::test]
async fn get_nonexistent_ride_returns_404() {
    let app = setup();
    let fake_id = "00000000-0000-0000-0000-000000000000";
    let response = app
        .oneshot(get_request(&format!("/rides/{fake_id}")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_ride_with_bad_latitude_returns_400() {
    let app = setup();
    let response = app
        .oneshot(json_request("POST", "/rides", ride_body(95.0, 0.0, 0.0, 0.01)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["code"], "validation");
}

#[tokio::test]
async fn quote_endpoint_prices_every_vehicle_class() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "POST",
            "/rides/quote",
            json!({
                "pickup": { "location": { "lat": 0.0, "lng": 0.0 } },
                "destination": { "location": { "lat": 0.0, "lng": 0.05 } }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let quotes = body.as_array().unwrap();
    assert_eq!(quotes.len(), 3);
    assert!(quotes.iter().all(|q| q["fare"].as_f64().unwrap() > 0.0));
}

#[tokio::test]
async fn second_confirm_is_rejected_as_already_taken() {
    let app = setup();
    let created = create_ride(&app).await;
    let id = created["id"].as_str().unwrap().to_string();
    let d1 = uuid::Uuid::new_v4();
    let d2 = uuid::Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{id}/confirm"),
            json!({ "driver_id": d1 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "Accepted");
    assert_eq!(body["driver_id"], json!(d1));
    assert!(body["accepted_at"].is_string());

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/rides/{id}/confirm"),
            json!({ "driver_id": d2 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["code"], "already_taken");
}

#[tokio::test]
async fn start_with_wrong_otp_is_forbidden_and_state_unchanged() {
    let app = setup();
    let created = create_ride(&app).await;
    let id = created["id"].as_str().unwrap().to_string();
    let otp = created["otp"].as_str().unwrap();
    let driver = uuid::Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{id}/confirm"),
            json!({ "driver_id": driver }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{id}/start"),
            json!({ "driver_id": driver, "otp": wrong_otp(otp) }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let body = body_json(response).await;
    assert_eq!(body["code"], "otp_mismatch");

    let response = app
        .oneshot(get_request(&format!("/rides/{id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "Accepted");
    assert!(body["started_at"].is_null());
}

#[tokio::test]
async fn full_lifecycle_happy_path() {
    let app = setup();
    let created = create_ride(&app).await;
    let id = created["id"].as_str().unwrap().to_string();
    let otp = created["otp"].as_str().unwrap().to_string();
    let quoted_fare = created["fare"].as_f64().unwrap();
    let driver = uuid::Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{id}/confirm"),
            json!({ "driver_id": driver }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{id}/start"),
            json!({ "driver_id": driver, "otp": otp }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "Ongoing");
    assert!(body["started_at"].is_string());

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{id}/end"),
            json!({ "driver_id": driver }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "Completed");
    assert!(body["completed_at"].is_string());
    assert_eq!(body["final_fare"].as_f64().unwrap(), quoted_fare);
    assert!(body["distance_km"].as_f64().unwrap() > 0.0);

    let response = app
        .oneshot(get_request(&format!("/rides/{id}")))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["status"], "Completed");
    assert_eq!(body["final_fare"].as_f64().unwrap(), quoted_fare);
}

#[tokio::test]
async fn cancel_succeeds_once_then_conflicts() {
    let app = setup();
    let created = create_ride(&app).await;
    let id = created["id"].as_str().unwrap().to_string();
    let rider = created["rider_id"].clone();

    let response = app
        .clone()
        .oneshot(json_request(
            "POST",
            &format!("/rides/{id}/cancel"),
            json!({ "actor_id": rider, "reason": "waited too long" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["status"], "Cancelled");
    assert_eq!(body["cancellation_reason"], "waited too long");
    assert!(body["cancelled_at"].is_string());

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/rides/{id}/cancel"),
            json!({ "actor_id": rider }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["code"], "invalid_state");
    assert_eq!(body["current_status"], "Cancelled");
}

#[tokio::test]
async fn start_before_confirm_reports_the_pending_state() {
    let app = setup();
    let created = create_ride(&app).await;
    let id = created["id"].as_str().unwrap().to_string();
    let otp = created["otp"].as_str().unwrap();

    let response = app
        .oneshot(json_request(
            "POST",
            &format!("/rides/{id}/start"),
            json!({ "driver_id": uuid::Uuid::new_v4(), "otp": otp }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = body_json(response).await;
    assert_eq!(body["code"], "invalid_state");
    assert_eq!(body["current_status"], "Pending");
}

#[tokio::test]
async fn presence_upsert_feeds_the_nearby_query() {
    let app = setup();
    let near = uuid::Uuid::new_v4();
    let far = uuid::Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/drivers/{near}/presence"),
            json!({ "location": { "lat": 0.0, "lng": 0.001 }, "vehicle_class": "Car" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["online"], true);

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/drivers/{far}/presence"),
            json!({ "location": { "lat": 3.0, "lng": 3.0 }, "vehicle_class": "Car" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get_request("/drivers/nearby?lat=0.0&lng=0.0&radius_km=2.0"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let drivers = body.as_array().unwrap();
    assert_eq!(drivers.len(), 1);
    assert_eq!(drivers[0]["driver_id"], json!(near));
}

#[tokio::test]
async fn nearby_query_honors_the_class_filter() {
    let app = setup();
    let car = uuid::Uuid::new_v4();
    let moto = uuid::Uuid::new_v4();

    for (id, class) in [(car, "Car"), (moto, "Moto")] {
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/drivers/{id}/presence"),
                json!({ "location": { "lat": 0.0, "lng": 0.001 }, "vehicle_class": class }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app
        .oneshot(get_request(
            "/drivers/nearby?lat=0.0&lng=0.0&radius_km=2.0&vehicle_class=Moto",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    let drivers = body.as_array().unwrap();
    assert_eq!(drivers.len(), 1);
    assert_eq!(drivers[0]["driver_id"], json!(moto));
}

#[tokio::test]
async fn offline_driver_is_excluded_from_matching() {
    let app = setup();
    let driver = uuid::Uuid::new_v4();

    let response = app
        .clone()
        .oneshot(json_request(
            "PUT",
            &format!("/drivers/{driver}/presence"),
            json!({ "location": { "lat": 0.0, "lng": 0.001 }, "vehicle_class": "Auto" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &format!("/drivers/{driver}/status"),
            json!({ "online": false }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["online"], false);

    let response = app
        .oneshot(get_request("/drivers/nearby?lat=0.0&lng=0.0&radius_km=2.0"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn status_toggle_for_unknown_driver_returns_404() {
    let app = setup();
    let response = app
        .oneshot(json_request(
            "PATCH",
            &format!("/drivers/{}/status", uuid::Uuid::new_v4()),
            json!({ "online": true }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
