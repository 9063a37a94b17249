//! Key request workflow and liveness probe tests against an in-process gateway

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::Path,
    http::{header, HeaderMap, StatusCode},
    routing::get,
    Router,
};
use keyvault::health::probe::{HealthProbe, LivenessProbe};
use keyvault::http::client::HttpClient;
use keyvault::keys::result::Outcome;
use keyvault::keys::workflow::{KeyRequestWorkflow, KeyRequester, EXTRACTION_FAILED};
use tokio::net::TcpListener;

const SUCCESS_BODY: &str =
    "<response status='success'><result><key>ABC123</key></result></response>";
const FAILURE_BODY: &str =
    "<response status = \"failure\"><msg>Invalid credentials</msg></response>";

async fn device_handler(Path(target): Path<String>) -> (StatusCode, String) {
    match target.as_str() {
        "deviceIp=10.0.0.1" => (StatusCode::OK, SUCCESS_BODY.to_string()),
        "deviceIp=10.0.0.2" => (StatusCode::OK, FAILURE_BODY.to_string()),
        "deviceIp=10.0.0.3" => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
        "deviceIp=10.0.0.4" => (StatusCode::from_u16(599).unwrap(), String::new()),
        _ => (StatusCode::NOT_FOUND, String::new()),
    }
}

async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn spawn_gateway() -> String {
    spawn_server(Router::new().route("/{target}", get(device_handler))).await
}

async fn spawn_health(status: StatusCode) -> String {
    spawn_server(Router::new().route("/health", get(move || async move { status }))).await
}

/// Origin nothing is listening on
async fn closed_origin() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn workflow(base_url: &str) -> KeyRequestWorkflow {
    let client = HttpClient::new(base_url, Duration::from_secs(5)).unwrap();
    KeyRequestWorkflow::new(Arc::new(client))
}

fn probe(base_url: &str) -> HealthProbe {
    let client = HttpClient::new(base_url, Duration::from_secs(5)).unwrap();
    HealthProbe::new(Arc::new(client))
}

#[tokio::test]
async fn test_request_success_extracts_key() {
    let base_url = spawn_gateway().await;

    let result = workflow(&base_url).request_api_key("10.0.0.1").await;
    assert_eq!(result.outcome, Outcome::Success);
    assert_eq!(result.target_ip, "10.0.0.1");
    assert_eq!(result.api_key.as_deref(), Some("ABC123"));
    assert_eq!(result.raw_body, SUCCESS_BODY);
}

#[tokio::test]
async fn test_request_failure_keeps_raw_body() {
    let base_url = spawn_gateway().await;

    let result = workflow(&base_url).request_api_key("10.0.0.2").await;
    assert_eq!(result.outcome, Outcome::Failure);
    assert!(result.api_key.is_none());
    assert_eq!(result.raw_body, FAILURE_BODY);
    assert_eq!(result.error.as_deref(), Some(EXTRACTION_FAILED));
}

#[tokio::test]
async fn test_request_non_2xx_reports_status() {
    let base_url = spawn_gateway().await;

    let result = workflow(&base_url).request_api_key("10.0.0.3").await;
    assert_eq!(result.outcome, Outcome::Failure);
    assert_eq!(result.raw_body, "HTTP 500: Internal Server Error");
}

#[tokio::test]
async fn test_request_nonstandard_status_keeps_code_as_reason() {
    let base_url = spawn_gateway().await;

    let result = workflow(&base_url).request_api_key("10.0.0.4").await;
    assert_eq!(result.outcome, Outcome::Failure);
    assert_eq!(result.raw_body, "HTTP 599: 599");
}

#[tokio::test]
async fn test_request_connection_refused_is_failure() {
    let base_url = closed_origin().await;

    let result = workflow(&base_url).request_api_key("10.0.0.1").await;
    assert_eq!(result.outcome, Outcome::Failure);
    assert!(result.api_key.is_none());
    assert!(!result.raw_body.is_empty());
}

#[tokio::test]
async fn test_liveness_true_on_2xx() {
    for status in [StatusCode::OK, StatusCode::NO_CONTENT] {
        let base_url = spawn_health(status).await;
        assert!(probe(&base_url).check_liveness().await, "{status}");
    }
}

#[tokio::test]
async fn test_liveness_false_on_error_status() {
    for status in [
        StatusCode::NOT_FOUND,
        StatusCode::UNAUTHORIZED,
        StatusCode::INTERNAL_SERVER_ERROR,
        StatusCode::SERVICE_UNAVAILABLE,
    ] {
        let base_url = spawn_health(status).await;
        assert!(!probe(&base_url).check_liveness().await, "{status}");
    }
}

#[tokio::test]
async fn test_liveness_false_when_unreachable() {
    let base_url = closed_origin().await;
    assert!(!probe(&base_url).check_liveness().await);
}

/// Healthy only for requests that opt out of caches
async fn uncached_health(headers: HeaderMap) -> StatusCode {
    let no_cache = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("no-cache"))
    };
    if no_cache(header::CACHE_CONTROL) && no_cache(header::PRAGMA) {
        StatusCode::OK
    } else {
        StatusCode::PRECONDITION_FAILED
    }
}

#[tokio::test]
async fn test_liveness_bypasses_caches() {
    let base_url = spawn_server(Router::new().route("/health", get(uncached_health))).await;
    assert!(probe(&base_url).check_liveness().await);

    // A plain GET is refused by the same handler
    let response = reqwest::get(format!("{}/health", base_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED.as_u16());
}
