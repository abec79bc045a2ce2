use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use ster::config::AppConfig;
use ster::db;
use ster::handlers;
use ster::services::storage::{BlobStore, StoredBlob, Upload};
use ster::state::AppState;

// ── Mock Blob Stores ──

struct MockBlobs {
    stored: Arc<Mutex<BTreeMap<String, usize>>>,
}

#[async_trait]
impl BlobStore for MockBlobs {
    async fn upload(&self, file: &Upload) -> anyhow::Result<StoredBlob> {
        let mut stored = self.stored.lock().unwrap();
        let key = format!("{}-{}", stored.len(), file.file_name);
        stored.insert(key.clone(), file.bytes.len());
        Ok(StoredBlob {
            url: format!("/uploads/{key}"),
            size: file.bytes.len() as i64,
            key,
        })
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.stored.lock().unwrap().remove(key);
        Ok(())
    }
}

struct FailingBlobs;

#[async_trait]
impl BlobStore for FailingBlobs {
    async fn upload(&self, _file: &Upload) -> anyhow::Result<StoredBlob> {
        anyhow::bail!("bucket unavailable")
    }

    async fn remove(&self, _key: &str) -> anyhow::Result<()> {
        Ok(())
    }
}

// ── Helpers ──

const TOKEN: &str = "test-token";
const BOUNDARY: &str = "X-STER-BOUNDARY";

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        upload_dir: std::env::temp_dir().join("ster-test-uploads").display().to_string(),
        public_upload_path: "/uploads".to_string(),
        api_token: TOKEN.to_string(),
        max_page_size: 50,
    }
}

fn state_with(blobs: Box<dyn BlobStore>) -> Arc<AppState> {
    let conn = db::init_db(":memory:").unwrap();
    Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: test_config(),
        blobs,
    })
}

fn test_app() -> (Router, Arc<Mutex<BTreeMap<String, usize>>>) {
    let stored = Arc::new(Mutex::new(BTreeMap::new()));
    let blobs = MockBlobs {
        stored: Arc::clone(&stored),
    };
    (handlers::router(state_with(Box::new(blobs))), stored)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&body).unwrap()
    };
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let req = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, req).await
}

async fn write(app: &Router, method: &str, uri: &str, body: Value) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {TOKEN}"))
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, req).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    write(app, "POST", uri, body).await
}

fn multipart_request(uri: &str, files: &[(&str, &str, &str)]) -> Request<Body> {
    let mut body = Vec::new();
    for (name, mime, content) in files {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; filename=\"{name}\"\r\nContent-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(content.as_bytes());
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header("Authorization", format!("Bearer {TOKEN}"))
        .body(Body::from(body))
        .unwrap()
}

async fn create_user(app: &Router, name: &str) -> i64 {
    let (status, json) = post(
        app,
        "/api/users",
        json!({ "name": name, "email": format!("{name}@example.com") }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    json["id"].as_i64().unwrap()
}

async fn create_car(app: &Router, host_id: i64, name: &str, location: &str) -> i64 {
    let (status, json) = post(
        app,
        "/api/cars",
        json!({
            "hostId": host_id,
            "name": name,
            "pricePerDay": 45.0,
            "location": location,
            "passengers": 5,
            "transmission": "manual",
            "fuelType": "petrol",
            "rating": 4.5,
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{json}");
    json["id"].as_i64().unwrap()
}

async fn book(app: &Router, car_id: i64, user_id: i64, start: &str, end: &str) -> (StatusCode, Value) {
    post(
        app,
        "/api/bookings",
        json!({
            "carId": car_id,
            "userId": user_id,
            "startDate": start,
            "endDate": end,
            "totalPrice": 180.0,
        }),
    )
    .await
}

async fn set_status(app: &Router, booking_id: i64, status: &str) -> (StatusCode, Value) {
    write(
        app,
        "PUT",
        &format!("/api/bookings/{booking_id}/status"),
        json!({ "status": status }),
    )
    .await
}

// ── Health ──

#[tokio::test]
async fn test_health() {
    let (app, _) = test_app();
    let (status, json) = get(&app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
}

// ── Auth ──

#[tokio::test]
async fn test_mutations_require_token() {
    let (app, _) = test_app();

    let req = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header("Content-Type", "application/json")
        .body(Body::from(r#"{"name":"ana","email":"ana@example.com"}"#))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let req = Request::builder()
        .method("POST")
        .uri("/api/users")
        .header("Content-Type", "application/json")
        .header("Authorization", "Bearer wrong-token")
        .body(Body::from(r#"{"name":"ana","email":"ana@example.com"}"#))
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reads_are_public() {
    let (app, _) = test_app();
    let (status, json) = get(&app, "/api/categories/with-count").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!([]));
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (app, _) = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/bookings")
        .header("Content-Type", "application/json")
        .header("Authorization", format!("Bearer {TOKEN}"))
        .body(Body::from("{not json"))
        .unwrap();
    let (status, json) = send(&app, req).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json["error"].is_string());
}

// ── Bookings ──

#[tokio::test]
async fn test_booking_lifecycle() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    let renter = create_user(&app, "renter").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;

    let (status, booking) = book(&app, car, renter, "2024-06-01", "2024-06-05").await;
    assert_eq!(status, StatusCode::OK, "{booking}");
    assert_eq!(booking["status"], "pending");
    assert_eq!(booking["host_id"], host);
    let id = booking["id"].as_i64().unwrap();

    let (status, _) = set_status(&app, id, "active").await;
    assert_eq!(status, StatusCode::CONFLICT);

    for next in ["confirmed", "active", "completed"] {
        let (status, json) = set_status(&app, id, next).await;
        assert_eq!(status, StatusCode::OK, "{json}");
        assert_eq!(json["status"], next);
    }

    let (status, _) = set_status(&app, id, "cancelled").await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, json) = get(&app, &format!("/api/bookings/{id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "completed");
}

#[tokio::test]
async fn test_overlapping_booking_rejected() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    let renter = create_user(&app, "renter").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;

    let (status, _) = book(&app, car, renter, "2024-06-01", "2024-06-05").await;
    assert_eq!(status, StatusCode::OK);

    let (status, json) = book(&app, car, renter, "2024-06-03", "2024-06-08").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(json["error"].as_str().unwrap().starts_with("conflict"));

    // Checkout day is free for the next renter.
    let (status, _) = book(&app, car, renter, "2024-06-05", "2024-06-07").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_simultaneous_overlapping_requests_admit_one() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    let renter = create_user(&app, "renter").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;

    let (a, b) = tokio::join!(
        book(&app, car, renter, "2024-06-01", "2024-06-05"),
        book(&app, car, renter, "2024-06-03", "2024-06-08"),
    );
    let mut statuses = vec![a.0, b.0];
    statuses.sort();
    assert_eq!(statuses, vec![StatusCode::OK, StatusCode::CONFLICT]);

    let (_, json) = get(&app, &format!("/api/bookings/user/{renter}")).await;
    assert_eq!(json["meta"]["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_cancelled_booking_frees_dates() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    let renter = create_user(&app, "renter").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;

    let (_, booking) = book(&app, car, renter, "2024-06-01", "2024-06-05").await;
    let (status, _) = set_status(&app, booking["id"].as_i64().unwrap(), "cancelled").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = book(&app, car, renter, "2024-06-02", "2024-06-04").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_booking_errors() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    let renter = create_user(&app, "renter").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;

    let (status, _) = book(&app, car, renter, "2024-06-05", "2024-06-01").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = book(&app, 999, renter, "2024-06-01", "2024-06-05").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = book(&app, car, 999, "2024-06-01", "2024-06-05").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = get(&app, "/api/bookings/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = set_status(&app, 999, "confirmed").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, booking) = book(&app, car, renter, "2024-06-01", "2024-06-05").await;
    let (status, json) = set_status(&app, booking["id"].as_i64().unwrap(), "refunded").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "invalid status: refunded");
}

#[tokio::test]
async fn test_host_bookings_paginated_and_filtered() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    let renter = create_user(&app, "renter").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;

    let mut ids = Vec::new();
    for (start, end) in [
        ("2024-06-01", "2024-06-03"),
        ("2024-06-03", "2024-06-05"),
        ("2024-06-05", "2024-06-07"),
    ] {
        let (_, booking) = book(&app, car, renter, start, end).await;
        ids.push(booking["id"].as_i64().unwrap());
    }
    set_status(&app, ids[0], "confirmed").await;

    let (status, json) = get(&app, &format!("/api/bookings/host/{host}?page=1&pageSize=2")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(
        json["meta"]["pagination"],
        json!({ "page": 1, "pageSize": 2, "pageCount": 2, "total": 3 })
    );
    assert_eq!(json["data"][0]["car"]["name"], "Fiat 500");
    assert_eq!(json["data"][0]["user"]["name"], "renter");

    let (_, json) = get(&app, &format!("/api/bookings/host/{host}?status=confirmed")).await;
    assert_eq!(json["meta"]["pagination"]["total"], 1);
    assert_eq!(json["data"][0]["id"], ids[0]);

    let (status, _) = get(&app, &format!("/api/bookings/host/{host}?status=lost")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, &format!("/api/bookings/host/{host}?pageSize=500")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = get(&app, &format!("/api/bookings/user/{renter}")).await;
    assert_eq!(json["meta"]["pagination"]["total"], 3);

    let (_, json) = get(&app, &format!("/api/bookings/user/{host}")).await;
    assert_eq!(json["data"], json!([]));
    assert_eq!(json["meta"]["pagination"]["pageCount"], 0);
}

#[tokio::test]
async fn test_host_booking_stats() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    let renter = create_user(&app, "renter").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;

    let (_, first) = book(&app, car, renter, "2024-06-01", "2024-06-03").await;
    let first = first["id"].as_i64().unwrap();
    for next in ["confirmed", "active", "completed"] {
        set_status(&app, first, next).await;
    }
    let (_, second) = book(&app, car, renter, "2024-06-03", "2024-06-05").await;
    set_status(&app, second["id"].as_i64().unwrap(), "cancelled").await;
    book(&app, car, renter, "2024-06-10", "2024-06-12").await;

    let (status, json) = get(&app, &format!("/api/bookings/host/{host}/stats")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 3);
    assert_eq!(json["completed"], 1);
    assert_eq!(json["cancelled"], 1);
    assert_eq!(json["pending"], 1);
    assert_eq!(json["totalRevenue"], 180.0);
}

// ── Cars ──

#[tokio::test]
async fn test_car_search_and_availability() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    let renter = create_user(&app, "renter").await;
    let fiat = create_car(&app, host, "Fiat 500", "Porto").await;
    let mini = create_car(&app, host, "Mini Cooper", "Lisbon").await;

    let (status, json) = get(&app, "/api/cars/search?query=fiat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["meta"]["pagination"]["total"], 1);
    assert_eq!(json["data"][0]["id"], fiat);
    assert_eq!(json["data"][0]["host"]["name"], "host");

    book(&app, fiat, renter, "2024-06-01", "2024-06-05").await;

    let (_, json) = get(
        &app,
        "/api/cars/search?startDate=2024-06-02&endDate=2024-06-04",
    )
    .await;
    let ids: Vec<i64> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![mini]);

    let (status, _) = get(&app, "/api/cars/search?startDate=2024-06-02").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/api/cars/search?minPrice=100&maxPrice=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, json) = get(&app, "/api/cars/search?limit=1&offset=1").await;
    assert_eq!(json["data"].as_array().unwrap().len(), 1);
    assert_eq!(json["meta"]["pagination"]["page"], 2);
    assert_eq!(json["meta"]["pagination"]["total"], 2);
}

#[tokio::test]
async fn test_car_validation_and_lookup() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;

    let (status, _) = post(
        &app,
        "/api/cars",
        json!({ "hostId": host, "name": "Bad", "pricePerDay": -1.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post(
        &app,
        "/api/cars",
        json!({ "hostId": 999, "name": "Orphan", "pricePerDay": 10.0 }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let car = create_car(&app, host, "Fiat 500", "Porto").await;
    let (status, json) = get(&app, &format!("/api/cars/{car}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Fiat 500");
    assert_eq!(json["images"], json!([]));

    let (status, _) = get(&app, "/api/cars/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_popular_locations_and_host_cars() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    create_car(&app, host, "Fiat 500", "Porto").await;
    create_car(&app, host, "Mini Cooper", "Lisbon").await;
    create_car(&app, host, "Renault Clio", "Porto").await;

    let (status, json) = get(&app, "/api/cars/popular-locations").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json, json!(["Porto", "Lisbon"]));

    let (_, json) = get(&app, &format!("/api/cars/host/{host}?pageSize=2")).await;
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["meta"]["pagination"]["total"], 3);

    let (_, json) = get(&app, &format!("/api/cars/host/{host}/stats")).await;
    assert_eq!(json["totalCars"], 3);
    assert_eq!(json["availableCars"], 3);
    assert_eq!(json["averageRating"], 4.5);
}

#[tokio::test]
async fn test_car_image_upload_and_delete() {
    let (app, stored) = test_app();
    let host = create_user(&app, "host").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;

    let req = multipart_request(
        &format!("/api/cars/{car}/images"),
        &[
            ("front.jpg", "image/jpeg", "front"),
            ("back.png", "image/png", "back-side"),
        ],
    );
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{json}");
    let images = json.as_array().unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0]["name"], "front.jpg");
    assert_eq!(images[1]["size"], 9);
    assert!(images[0].get("storage_key").is_none());
    assert_eq!(stored.lock().unwrap().len(), 2);

    let image_id = images[0]["id"].as_i64().unwrap();
    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/cars/{car}/images/{image_id}"))
        .header("Authorization", format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(stored.lock().unwrap().len(), 1);

    let (_, json) = get(&app, &format!("/api/cars/{car}")).await;
    assert_eq!(json["images"].as_array().unwrap().len(), 1);

    let req = Request::builder()
        .method("DELETE")
        .uri(format!("/api/cars/{car}/images/{image_id}"))
        .header("Authorization", format!("Bearer {TOKEN}"))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_image_upload_errors() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;

    let (status, _) = send(&app, multipart_request(&format!("/api/cars/{car}/images"), &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let req = multipart_request("/api/cars/999/images", &[("a.jpg", "image/jpeg", "a")]);
    let (status, _) = send(&app, req).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_storage_failure_leaves_no_record() {
    let app = handlers::router(state_with(Box::new(FailingBlobs)));
    let host = create_user(&app, "host").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;

    let req = multipart_request(
        &format!("/api/cars/{car}/images"),
        &[("a.jpg", "image/jpeg", "a")],
    );
    let (status, json) = send(&app, req).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json["error"].as_str().unwrap().contains("storage"));

    let (_, json) = get(&app, &format!("/api/cars/{car}")).await;
    assert_eq!(json["images"], json!([]));
}

// ── Categories ──

#[tokio::test]
async fn test_categories() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;

    let (status, suv) = post(&app, "/api/categories", json!({ "name": "SUV" })).await;
    assert_eq!(status, StatusCode::OK);
    let (_, city) = post(&app, "/api/categories", json!({ "name": "City" })).await;

    let (status, _) = post(&app, "/api/categories", json!({ "name": "SUV" })).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = post(&app, "/api/categories", json!({ "name": "  " })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    post(
        &app,
        "/api/cars",
        json!({ "hostId": host, "name": "Jeep", "pricePerDay": 80.0, "categoryId": suv["id"] }),
    )
    .await;

    let (_, json) = get(&app, "/api/categories/with-count").await;
    assert_eq!(json[0]["name"], "SUV");
    assert_eq!(json[0]["car_count"], 1);
    assert_eq!(json[1]["car_count"], 0);

    let (_, json) = get(&app, "/api/categories/popular").await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["id"], suv["id"]);

    let (status, json) = get(&app, &format!("/api/categories/{}", city["id"])).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "City");

    let (status, _) = get(&app, "/api/categories/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ── Users ──

#[tokio::test]
async fn test_user_profile_update() {
    let (app, _) = test_app();
    let ana = create_user(&app, "ana").await;
    create_user(&app, "bo").await;

    let (status, json) = write(
        &app,
        "PUT",
        &format!("/api/users/{ana}/profile"),
        json!({ "bio": "Weekend driver", "phone": "" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["bio"], "Weekend driver");
    assert_eq!(json["phone"], Value::Null);
    assert_eq!(json["email"], "ana@example.com");

    let (status, _) = write(
        &app,
        "PUT",
        &format!("/api/users/{ana}/profile"),
        json!({ "email": "bo@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = write(&app, "PUT", "/api/users/999/profile", json!({ "name": "x" })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(
        &app,
        "/api/users",
        json!({ "name": "dup", "email": "ana@example.com" }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_profile_and_history() {
    let (app, _) = test_app();
    let host = create_user(&app, "host").await;
    let renter = create_user(&app, "renter").await;
    let car = create_car(&app, host, "Fiat 500", "Porto").await;
    book(&app, car, renter, "2024-06-01", "2024-06-05").await;

    let (status, json) = get(&app, &format!("/api/users/{host}/profile")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["cars"].as_array().unwrap().len(), 1);
    assert_eq!(json["bookings"], json!([]));

    let (_, json) = get(&app, &format!("/api/users/{renter}/profile")).await;
    assert_eq!(json["bookings"][0]["car"]["id"], car);

    let (_, json) = get(&app, &format!("/api/users/{renter}/bookings")).await;
    assert_eq!(json["meta"]["pagination"]["total"], 1);

    let (status, _) = get(&app, "/api/users/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_profile_picture_upload() {
    let (app, stored) = test_app();
    let ana = create_user(&app, "ana").await;

    let req = multipart_request(
        &format!("/api/users/{ana}/profile-picture"),
        &[("me.jpg", "image/jpeg", "selfie")],
    );
    let (status, asset) = send(&app, req).await;
    assert_eq!(status, StatusCode::OK, "{asset}");
    assert_eq!(asset["car_id"], Value::Null);
    assert_eq!(stored.lock().unwrap().len(), 1);

    let (_, json) = get(&app, &format!("/api/users/{ana}/profile")).await;
    assert_eq!(json["profile_image"]["id"], asset["id"]);
    assert_eq!(json["profile_image_id"], asset["id"]);
}
