use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
};
use serde_json::{json, Value};
use tower::ServiceExt;

use analytics_cell::models::*;
use analytics_cell::router::analytics_routes;
use analytics_cell::services::dashboard::{TOTAL_CONSULTATIONS, TOTAL_DIAGNOSTIC_CODES};
use analytics_cell::services::DashboardService;
use shared_database::{FactFilter, RecordStore, StoreHandle};
use shared_models::{DiagnosticCode, DimensionValue};
use shared_utils::test_utils::{key, slot, TestClinic};

fn int(value: i64) -> GroupKey {
    GroupKey::Value(DimensionValue::Int(value))
}

fn text(value: &str) -> GroupKey {
    GroupKey::Value(DimensionValue::from(value))
}

/// Three consultations over two days plus one appointment never consulted.
async fn clinic_with_consultations() -> StoreHandle {
    let store = TestClinic::store_with(vec![
        slot("D1", "2024-03-01 09:00", "C1"),
        slot("D2", "2024-03-01 10:00", "C3"),
        slot("D1", "2024-03-02 09:00", "C2"),
        slot("D3", "2024-03-02 11:00", "C1"),
    ]);

    let first = key("D1", "2024-03-01 09:00");
    let second = key("D2", "2024-03-01 10:00");
    let third = key("D1", "2024-03-02 09:00");
    for consultation in [&first, &second, &third] {
        store.create_consultation(consultation).await.unwrap();
    }
    for code in ["J06", "R51"] {
        store.append_diagnostic(&first, &DiagnosticCode::from(code)).await.unwrap();
    }
    store.append_diagnostic(&second, &DiagnosticCode::from("I10")).await.unwrap();

    store
}

#[tokio::test]
async fn test_consultations_rollup_by_date() {
    let service = DashboardService::new(clinic_with_consultations().await);

    let report = service.dashboard(&FactFilter::default()).await.unwrap();
    let by_date = &report.consultations_by_date;

    assert_eq!(by_date.mode, GroupingMode::Rollup);
    let rows: Vec<_> = by_date
        .rows
        .iter()
        .map(|r| (r.key.clone(), by_date.value(r, TOTAL_CONSULTATIONS).unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (vec![int(2024), int(3), int(1)], MeasureValue::Count(2)),
            (vec![int(2024), int(3), int(2)], MeasureValue::Count(1)),
            (vec![int(2024), int(3), GroupKey::All], MeasureValue::Count(3)),
            (vec![int(2024), GroupKey::All, GroupKey::All], MeasureValue::Count(3)),
            (vec![GroupKey::All, GroupKey::All, GroupKey::All], MeasureValue::Count(3)),
        ]
    );
}

#[tokio::test]
async fn test_diagnostics_cube_by_age_and_gender() {
    let service = DashboardService::new(clinic_with_consultations().await);

    let report = service.dashboard(&FactFilter::default()).await.unwrap();
    let cube = &report.diagnostics_by_age_and_gender;

    assert_eq!(cube.mode, GroupingMode::Cube);
    let rows: Vec<_> = cube
        .rows
        .iter()
        .map(|r| (r.key.clone(), cube.value(r, TOTAL_DIAGNOSTIC_CODES).unwrap()))
        .collect();
    assert_eq!(
        rows,
        vec![
            (vec![int(33), text("M")], MeasureValue::Sum(0)),
            (vec![int(33), GroupKey::All], MeasureValue::Sum(0)),
            (vec![int(39), text("F")], MeasureValue::Sum(2)),
            (vec![int(39), GroupKey::All], MeasureValue::Sum(2)),
            (vec![int(40), text("F")], MeasureValue::Sum(1)),
            (vec![int(40), GroupKey::All], MeasureValue::Sum(1)),
            (vec![GroupKey::All, text("F")], MeasureValue::Sum(3)),
            (vec![GroupKey::All, text("M")], MeasureValue::Sum(0)),
            (vec![GroupKey::All, GroupKey::All], MeasureValue::Sum(3)),
        ]
    );
}

#[tokio::test]
async fn test_dashboard_without_consultations_reports_zero_totals() {
    let service = DashboardService::new(TestClinic::store());

    let report = service.dashboard(&FactFilter::default()).await.unwrap();

    assert_eq!(report.consultations_by_date.rows.len(), 1);
    assert_eq!(
        report.consultations_by_date.grand_total().unwrap().measures,
        vec![MeasureValue::Count(0)]
    );
    assert_eq!(
        report.diagnostics_by_age_and_gender.grand_total().unwrap().measures,
        vec![MeasureValue::Sum(0)]
    );
}

#[tokio::test]
async fn test_dashboard_route_applies_date_filter() {
    let app = analytics_routes(clinic_with_consultations().await);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/?from=2024-03-02")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value =
        serde_json::from_slice(&to_bytes(response.into_body(), usize::MAX).await.unwrap()).unwrap();

    let rows = &body["consultations_by_date"]["rows"];
    assert_eq!(rows[0], json!({ "key": [2024, 3, 2], "grouping_id": 0, "measures": [1] }));
    assert_eq!(
        rows.as_array().unwrap().last().unwrap()["key"],
        json!(["ALL", "ALL", "ALL"])
    );
    assert_eq!(body["diagnostics_by_age_and_gender"]["mode"], "cube");
}

#[tokio::test]
async fn test_dashboard_route_rejects_bad_date() {
    let app = analytics_routes(TestClinic::store());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/?from=yesterday")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
