//! Tests for the HTTP scoring service, driven in-process

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use common::{fixture_bins, fixture_model, reference_applicant, REFERENCE_Z};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use scorecard::scoring::{OutOfRangePolicy, ScoringContext};
use scorecard::server::{app, ScoreResponse};

fn test_app(policy: OutOfRangePolicy, origins: &[String]) -> Router {
    let ctx = ScoringContext::new(fixture_bins(), fixture_model(), policy).unwrap();
    app(Arc::new(ctx), origins).unwrap()
}

fn score_request(body: String) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/score")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body))
        .unwrap()
}

async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

#[tokio::test]
async fn test_score_valid_applicant() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);

    let (status, body) = send(app, score_request(reference_applicant().to_string())).await;

    assert_eq!(status, StatusCode::OK);
    let response: ScoreResponse = serde_json::from_value(body).unwrap();
    assert_eq!(response.default_probability, 1.0 / (1.0 + (-REFERENCE_Z).exp()));
    assert_eq!(response.risk_band.to_string(), "high");
}

#[tokio::test]
async fn test_response_shape() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);

    let (_, body) = send(app, score_request(reference_applicant().to_string())).await;

    let object = body.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert!(object["default_probability"].is_f64());
    assert_eq!(object["risk_band"], json!("high"));
}

#[tokio::test]
async fn test_repeated_requests_agree() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);

    let (_, first) = send(app.clone(), score_request(reference_applicant().to_string())).await;
    let (_, second) = send(app, score_request(reference_applicant().to_string())).await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_missing_field_is_422() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);
    let mut body = reference_applicant();
    body.as_object_mut().unwrap().remove("fico_range_high");

    let (status, body) = send(app, score_request(body.to_string())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    let detail = body["detail"].as_array().unwrap();
    assert_eq!(detail.len(), 1);
    assert_eq!(detail[0]["loc"], json!(["body", "fico_range_high"]));
    assert_eq!(detail[0]["type"], json!("missing"));
}

#[tokio::test]
async fn test_wrong_type_is_422() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);
    let mut body = reference_applicant();
    body["term"] = json!("thirty-six");

    let (status, body) = send(app, score_request(body.to_string())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["loc"], json!(["body", "term"]));
}

#[tokio::test]
async fn test_non_object_body_is_422() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);

    let (status, body) = send(app, score_request("[1, 2, 3]".to_string())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["type"], json!("model_attributes_type"));
}

#[tokio::test]
async fn test_malformed_json_is_400() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);

    let (status, body) = send(app, score_request("{\"int_rate\": ".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"][0]["type"], json!("json_invalid"));
}

#[tokio::test]
async fn test_out_of_range_under_neutral_policy_scores() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);
    let mut body = reference_applicant();
    body["dti"] = json!(-9999);

    let (status, body) = send(app, score_request(body.to_string())).await;

    assert_eq!(status, StatusCode::OK);
    let p = body["default_probability"].as_f64().unwrap();
    assert!((0.0..=1.0).contains(&p));
}

#[tokio::test]
async fn test_out_of_range_under_reject_policy_is_422() {
    let app = test_app(OutOfRangePolicy::Reject, &[]);
    let mut body = reference_applicant();
    body["dti"] = json!(-9999);

    let (status, body) = send(app, score_request(body.to_string())).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["detail"][0]["loc"], json!(["body", "dti"]));
    assert_eq!(body["detail"][0]["type"], json!("out_of_range"));
}

#[tokio::test]
async fn test_health() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(app, request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok", "features": 11 }));
}

#[tokio::test]
async fn test_get_score_is_not_allowed() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);
    let request = Request::builder().uri("/score").body(Body::empty()).unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_cors_allows_any_origin_by_default() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);
    let request = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "http://localhost:3000")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "*"
    );
}

#[tokio::test]
async fn test_cors_restricted_to_listed_origin() {
    let origins = vec!["https://underwriting.example.com".to_string()];

    let allowed = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://underwriting.example.com")
        .body(Body::empty())
        .unwrap();
    let response = test_app(OutOfRangePolicy::Neutral, &origins)
        .oneshot(allowed)
        .await
        .unwrap();
    assert_eq!(
        response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "https://underwriting.example.com"
    );

    let other = Request::builder()
        .uri("/health")
        .header(header::ORIGIN, "https://elsewhere.example.com")
        .body(Body::empty())
        .unwrap();
    let response = test_app(OutOfRangePolicy::Neutral, &origins)
        .oneshot(other)
        .await
        .unwrap();
    assert!(response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .is_none());
}

#[tokio::test]
async fn test_cors_preflight() {
    let app = test_app(OutOfRangePolicy::Neutral, &[]);
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/score")
        .header(header::ORIGIN, "http://localhost:3000")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert!(response.status().is_success());
    assert!(response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_METHODS));
}
