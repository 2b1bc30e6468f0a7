use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

use super::common::*;
use crate::loans::router::loan_router;

fn router() -> axum::Router {
    let (service, _, _, _) = build_service();
    loan_router(Arc::new(service))
}

async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is JSON")
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

async fn create_application(router: &axum::Router) -> Value {
    let response = router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/v1/loan-applications",
            serde_json::to_value(submission()).expect("encodes"),
        ))
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    read_json_body(response).await
}

#[tokio::test]
async fn create_returns_created_with_the_enriched_record() {
    let router = router();
    let body = create_application(&router).await;

    assert_eq!(body["id"], json!(1));
    assert_eq!(body["status"], json!("Application_Submitted"));
    assert_eq!(body["user"]["name"], json!("Asha Iyer"));
    assert_eq!(body["product"]["product_name"], json!("Home Loan"));
}

#[tokio::test]
async fn create_with_unknown_vendor_is_unprocessable() {
    let router = router();
    let mut payload = serde_json::to_value(submission()).expect("encodes");
    payload["vendor_id"] = json!(77);

    let response = router
        .oneshot(json_request("POST", "/api/v1/loan-applications", payload))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], json!("vendor not found with id 77"));
}

#[tokio::test]
async fn list_returns_stored_records() {
    let router = router();
    create_application(&router).await;

    let response = router
        .oneshot(
            Request::get("/api/v1/loan-applications")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body.as_array().expect("array").len(), 1);
}

#[tokio::test]
async fn get_unknown_id_is_not_found_with_named_id() {
    let router = router();

    let response = router
        .oneshot(
            Request::get("/api/v1/loan-applications/42")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], json!("loan application not found for id 42"));
}

#[tokio::test]
async fn patch_with_unknown_field_is_rejected() {
    let router = router();
    create_application(&router).await;

    let response = router
        .oneshot(json_request(
            "PATCH",
            "/api/v1/loan-applications/1",
            json!({ "amout_required": 500 }),
        ))
        .await
        .expect("route executes");

    // The Json extractor rejects the typo'd key before the service runs.
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn patch_changes_only_the_named_fields() {
    let router = router();
    create_application(&router).await;

    let response = router
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/api/v1/loan-applications/1",
            json!({ "amount_required": 500 }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["amount_required"], json!(500));
    assert_eq!(body["tenure"], json!(36));
    assert_eq!(body["user"]["name"], json!("Asha Iyer"));
}

#[tokio::test]
async fn status_update_with_unknown_label_is_bad_request() {
    let router = router();
    create_application(&router).await;

    let response = router
        .oneshot(json_request(
            "PUT",
            "/api/v1/loan-applications/1/status",
            json!({ "status": "NotAStatus" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json_body(response).await;
    assert_eq!(
        body["error"],
        json!("unrecognized application status 'NotAStatus'")
    );
}

#[tokio::test]
async fn status_update_persists_the_new_state() {
    let router = router();
    create_application(&router).await;

    let response = router
        .clone()
        .oneshot(json_request(
            "PUT",
            "/api/v1/loan-applications/1/status",
            json!({ "status": "Disbursed" }),
        ))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["status"], json!("Disbursed"));
}

#[tokio::test]
async fn delete_returns_no_content_then_not_found() {
    let router = router();
    create_application(&router).await;

    let response = router
        .clone()
        .oneshot(
            Request::delete("/api/v1/loan-applications/1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(
            Request::delete("/api/v1/loan-applications/1")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_lookup_with_no_matches_returns_empty_list() {
    let router = router();

    let response = router
        .oneshot(
            Request::get("/api/v1/loan-products?name=Yacht%20Loan")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn upstream_failure_maps_to_bad_gateway() {
    let store = Arc::new(crate::loans::repository::MemoryLoanStore::new());
    let users = Arc::new(StaticUserDirectory::default());
    let service = crate::loans::service::LoanApplicationService::new(
        store,
        users,
        Arc::new(UnreachableCatalog),
    );
    let router = loan_router(Arc::new(service));

    let response = router
        .oneshot(
            Request::get("/api/v1/loan-products?name=Home%20Loan")
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
}
