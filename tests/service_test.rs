//! Integration tests for the HTTP identification service.
//!
//! Starts an in-process florad router on a random port with a mock
//! provider and drives it with reqwest, covering the wire contract, CORS,
//! security headers and rate limiting.

#![cfg(feature = "server")]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use flora::server::rate_limit::{RATE_LIMIT_MESSAGE, RateLimitConfig};
use flora::server::{FloraService, ServiceOptions, serve};
use flora::{
    CapturedImage, ErrorBody, FloraError, IdentificationProvider, IdentificationResult,
    IdentifyResponse, Result,
};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use tokio::net::TcpListener;

// ============================================================================
// Mock provider
// ============================================================================

enum Outcome {
    Results(Vec<IdentificationResult>),
    Fail,
    Hang,
    Panic,
}

struct MockProvider {
    outcome: Outcome,
    seen: Mutex<Vec<CapturedImage>>,
}

impl MockProvider {
    fn new(outcome: Outcome) -> Arc<Self> {
        Arc::new(Self {
            outcome,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<CapturedImage> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl IdentificationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn identify(&self, image: &CapturedImage) -> Result<Vec<IdentificationResult>> {
        self.seen.lock().unwrap().push(image.clone());
        match &self.outcome {
            Outcome::Results(results) => Ok(results.clone()),
            Outcome::Fail => Err(FloraError::Api {
                status: 500,
                message: "provider exploded with key sk-secret".to_string(),
            }),
            Outcome::Hang => {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(vec![])
            }
            Outcome::Panic => panic!("provider bug"),
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Start a service on a random port and return its base URL.
async fn start_service(provider: Arc<MockProvider>, options: ServiceOptions) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = FloraService::new(provider, options)
        .router()
        .expect("router should build");

    tokio::spawn(async move {
        serve(listener, router, std::future::pending()).await.unwrap();
    });

    format!("http://{addr}")
}

fn rose() -> Vec<IdentificationResult> {
    vec![
        IdentificationResult::new("Rose", 0.87).description("A woody perennial."),
        IdentificationResult::new("Sweet briar", 0.08),
    ]
}

fn jpeg_part(bytes: &[u8]) -> Part {
    Part::bytes(bytes.to_vec())
        .file_name("plant.jpg")
        .mime_str("image/jpeg")
        .unwrap()
}

fn image_form() -> Form {
    Form::new().part("plantImage", jpeg_part(&[0xFF, 0xD8, 0xFF, 0xE0]))
}

async fn post_form(base: &str, form: Form) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}/api/identify"))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_identify_returns_results() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let base = start_service(provider.clone(), ServiceOptions::default()).await;

    let response = post_form(&base, image_form()).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["results"][0]["name"], "Rose");
    assert_eq!(body["results"][0]["probability"], 0.87);
    assert_eq!(body["results"][0]["isInvasive"], false);
    assert_eq!(body["results"][0]["details"]["description"], "A woody perennial.");

    let seen = provider.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].mime, "image/jpeg");
    assert_eq!(seen[0].bytes, vec![0xFF, 0xD8, 0xFF, 0xE0]);
}

#[tokio::test]
async fn test_empty_result_list_is_still_200() {
    let provider = MockProvider::new(Outcome::Results(vec![]));
    let base = start_service(provider, ServiceOptions::default()).await;

    let response = post_form(&base, image_form()).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body: IdentifyResponse = response.json().await.unwrap();
    assert!(body.results.is_empty());
}

#[tokio::test]
async fn test_missing_file_is_rejected() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let base = start_service(provider.clone(), ServiceOptions::default()).await;

    let response = post_form(&base, Form::new().text("note", "no photo here")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "No image uploaded");
    assert!(provider.seen().is_empty(), "provider must not be called");
}

#[tokio::test]
async fn test_non_multipart_body_is_rejected() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let base = start_service(provider, ServiceOptions::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/identify"))
        .json(&serde_json::json!({ "image": "nope" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "No image uploaded");
}

#[tokio::test]
async fn test_unrecognised_bytes_are_rejected() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let base = start_service(provider, ServiceOptions::default()).await;

    let form = Form::new().part("plantImage", Part::bytes(b"plain text".to_vec()));
    let response = post_form(&base, form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Invalid image upload");
}

#[tokio::test]
async fn test_oversized_upload_is_rejected() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let options = ServiceOptions {
        max_upload_bytes: 1024,
        ..ServiceOptions::default()
    };
    let base = start_service(provider.clone(), options).await;

    let form = Form::new().part("plantImage", jpeg_part(&vec![0xAB; 8 * 1024]));
    let response = post_form(&base, form).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Invalid image upload");
    assert!(provider.seen().is_empty());
}

#[tokio::test]
async fn test_extra_attachments_are_ignored() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let base = start_service(provider.clone(), ServiceOptions::default()).await;

    let form = Form::new()
        .text("caption", "garden")
        .part("plantImage", jpeg_part(&[0xFF, 0xD8, 1]))
        .part("plantImage", jpeg_part(&[0xFF, 0xD8, 2]));
    let response = post_form(&base, form).await;
    assert_eq!(response.status(), StatusCode::OK);

    let seen = provider.seen();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].bytes, vec![0xFF, 0xD8, 1]);
}

#[tokio::test]
async fn test_provider_failure_is_generic_500() {
    let provider = MockProvider::new(Outcome::Fail);
    let base = start_service(provider, ServiceOptions::default()).await;

    let response = post_form(&base, image_form()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let text = response.text().await.unwrap();
    assert!(!text.contains("sk-secret"), "internal detail leaked: {text}");
    let body: ErrorBody = serde_json::from_str(&text).unwrap();
    assert_eq!(body.error, "Something went wrong!");
}

#[tokio::test]
async fn test_provider_timeout_is_generic_500() {
    let provider = MockProvider::new(Outcome::Hang);
    let options = ServiceOptions {
        provider_timeout: Duration::from_millis(100),
        ..ServiceOptions::default()
    };
    let base = start_service(provider, options).await;

    let response = post_form(&base, image_form()).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Something went wrong!");
}

#[tokio::test]
async fn test_handler_panic_is_generic_500() {
    let provider = MockProvider::new(Outcome::Panic);
    let base = start_service(provider, ServiceOptions::default()).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/identify"))
        .header("Origin", "http://localhost:3000")
        .multipart(image_form())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    // The panic response still passes through CORS and the header layers.
    let headers = response.headers();
    assert_eq!(
        headers["access-control-allow-origin"],
        "http://localhost:3000"
    );
    assert_eq!(headers["x-content-type-options"], "nosniff");

    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Something went wrong!");
}

#[tokio::test]
async fn test_wrong_method_is_json_405() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let base = start_service(provider.clone(), ServiceOptions::default()).await;

    let response = reqwest::get(format!("{base}/api/identify")).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()["content-type"], "application/json");
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Method not allowed");
    assert!(provider.seen().is_empty());
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let base = start_service(provider, ServiceOptions::default()).await;

    let response = reqwest::get(format!("{base}/api/nope")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, "Not found");
}

#[tokio::test]
async fn test_health() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let base = start_service(provider, ServiceOptions::default()).await;

    let body: serde_json::Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert!(body["version"].as_str().unwrap().starts_with(flora::PKG_VERSION));
}

#[tokio::test]
async fn test_cors_allows_only_configured_origin() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let options = ServiceOptions {
        allowed_origin: "https://plants.example.org".to_string(),
        ..ServiceOptions::default()
    };
    let base = start_service(provider, options).await;
    let client = reqwest::Client::new();

    let allowed = client
        .get(format!("{base}/health"))
        .header("Origin", "https://plants.example.org")
        .send()
        .await
        .unwrap();
    assert_eq!(
        allowed
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("https://plants.example.org")
    );

    let denied = client
        .get(format!("{base}/health"))
        .header("Origin", "https://evil.example.com")
        .send()
        .await
        .unwrap();
    assert!(denied.headers().get("access-control-allow-origin").is_none());
}

#[tokio::test]
async fn test_security_headers_are_set() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let base = start_service(provider, ServiceOptions::default()).await;

    let response = reqwest::get(format!("{base}/health")).await.unwrap();
    let headers = response.headers();
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["x-frame-options"], "SAMEORIGIN");
}

#[tokio::test]
async fn test_invalid_origin_fails_router_build() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let options = ServiceOptions {
        allowed_origin: "bad\norigin".to_string(),
        ..ServiceOptions::default()
    };
    let err = FloraService::new(provider, options).router().unwrap_err();
    assert!(matches!(err, FloraError::Configuration(_)));
}

/// The 101st request inside one window gets the rate-limit message, not the
/// normal handler response.
#[tokio::test]
async fn test_rate_limit_rejects_101st_request() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let base = start_service(provider.clone(), ServiceOptions::default()).await;

    for i in 1..=100u32 {
        let response = post_form(&base, image_form()).await;
        assert_eq!(response.status(), StatusCode::OK, "request {i}");
        assert_eq!(
            response.headers()["ratelimit-remaining"],
            (100 - i).to_string().as_str()
        );
    }

    let response = post_form(&base, image_form()).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
    let body: ErrorBody = response.json().await.unwrap();
    assert_eq!(body.error, RATE_LIMIT_MESSAGE);
    assert_eq!(provider.seen().len(), 100);
}

#[tokio::test]
async fn test_rate_limit_does_not_cover_health() {
    let provider = MockProvider::new(Outcome::Results(rose()));
    let options = ServiceOptions {
        rate_limit: RateLimitConfig::new().max_requests(1),
        ..ServiceOptions::default()
    };
    let base = start_service(provider, options).await;

    assert_eq!(post_form(&base, image_form()).await.status(), StatusCode::OK);
    assert_eq!(
        post_form(&base, image_form()).await.status(),
        StatusCode::TOO_MANY_REQUESTS
    );
    for _ in 0..3 {
        let response = reqwest::get(format!("{base}/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
