use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use appointment_cell::router::appointment_routes;
use shared_utils::test_utils::{slot, TestClinic};

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_book_then_conflict() {
    let app = appointment_routes(TestClinic::store());
    let body = json!({
        "doctor": "D1",
        "client": "C2",
        "date": "2024-03-05",
        "time": "11:00",
        "description": "blood pressure review"
    });

    let (status, created) = send(app.clone(), post_json("/", body.clone())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["doctor"], "D1");
    assert_eq!(created["timestamp"], "2024-03-05T11:00:00");

    let (status, error) = send(app, post_json("/", body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(error["error"].as_str().unwrap().contains("D1"));
}

#[tokio::test]
async fn test_available_doctors_route() {
    let app = appointment_routes(TestClinic::store_with(vec![slot(
        "D1",
        "2024-03-05 11:00",
        "C1",
    )]));

    let (status, body) = send(app.clone(), get("/available-doctors?date=2024-03-05&time=11:00")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["doctors"][0], json!({ "vat": "D2", "name": "Dr. Bruno Lima" }));

    let (status, _) = send(app, get("/available-doctors?date=2024-03-05&time=noon")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_client_appointments_route() {
    let app = appointment_routes(TestClinic::store_with(vec![slot(
        "D3",
        "2024-03-05 11:00",
        "C3",
    )]));

    let (status, body) = send(app.clone(), get("/clients/C3")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);
    assert_eq!(body["appointments"][0]["doctor"], "D3");
    assert_eq!(body["appointments"][0]["has_consultation"], false);

    let (status, _) = send(app, get("/clients/C404")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_doctor_is_not_found() {
    let app = appointment_routes(TestClinic::store());

    let (status, _) = send(
        app,
        post_json(
            "/",
            json!({ "doctor": "D404", "client": "C1", "date": "2024-03-05", "time": "11:00" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
