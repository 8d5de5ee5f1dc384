//! Wiremock integration tests for PlantIdClient.
//!
//! These tests verify request shape, response normalization and error
//! mapping using mocked responses.

use std::time::Duration;

use flora::providers::{InvasiveSpecies, PlantIdClient};
use flora::{CapturedImage, FloraError};
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_image() -> CapturedImage {
    CapturedImage::new(vec![0xFF, 0xD8, 0xFF, 0xE0], "image/jpeg")
}

fn client(server: &MockServer) -> PlantIdClient {
    PlantIdClient::with_base_url("test_key", server.uri(), Duration::from_secs(5))
        .expect("client should build")
}

/// Test that suggestions are normalized into the shared result shape.
#[tokio::test]
async fn test_identify_success() {
    let mock_server = MockServer::start().await;

    let response = serde_json::json!({
        "is_plant": true,
        "suggestions": [
            {
                "plant_name": "Rosa canina",
                "probability": 0.87,
                "plant_details": {
                    "common_names": ["Dog rose", "Rose"],
                    "url": "https://en.wikipedia.org/wiki/Rosa_canina",
                    "wiki_description": { "value": "Rosa canina is a variable climbing wild rose." }
                }
            },
            {
                "plant_name": "Rosa rubiginosa",
                "probability": 0.05,
                "plant_details": {}
            }
        ]
    });

    Mock::given(method("POST"))
        .and(path("/identify"))
        .and(header("Api-Key", "test_key"))
        .and(body_partial_json(serde_json::json!({
            "images": ["/9j/4A=="],
            "plant_details": ["common_names", "url", "wiki_description"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(response))
        .expect(1)
        .mount(&mock_server)
        .await;

    let results = client(&mock_server)
        .identify(&test_image())
        .await
        .expect("identify should succeed");

    assert_eq!(results.len(), 2);
    let top = &results[0];
    assert_eq!(top.name, "Dog rose");
    assert!((top.probability - 0.87).abs() < 1e-9);
    assert!(!top.is_invasive);
    assert_eq!(
        top.details.url.as_deref(),
        Some("https://en.wikipedia.org/wiki/Rosa_canina")
    );
    assert!(top.details.description.as_deref().unwrap().starts_with("Rosa canina"));

    // No common names: falls back to the scientific name.
    assert_eq!(results[1].name, "Rosa rubiginosa");
    assert_eq!(results[1].details.description, None);
}

/// Results come back highest probability first even if the provider
/// lists them otherwise.
#[tokio::test]
async fn test_identify_ranks_results() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "suggestions": [
                { "plant_name": "Hedera helix", "probability": 0.1 },
                { "plant_name": "Pueraria montana", "probability": 0.7 }
            ]
        })))
        .mount(&mock_server)
        .await;

    let results = client(&mock_server).identify(&test_image()).await.unwrap();
    assert_eq!(results[0].name, "Pueraria montana");
    assert!(results[0].is_invasive, "kudzu is on the default list");
    assert!(!results[1].is_invasive);
}

/// A configured list replaces the built-in one.
#[tokio::test]
async fn test_custom_invasive_list() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "suggestions": [{
                "plant_name": "Hedera helix",
                "probability": 0.9,
                "plant_details": { "common_names": ["English ivy"] }
            }]
        })))
        .mount(&mock_server)
        .await;

    let results = client(&mock_server)
        .with_invasive_species(InvasiveSpecies::none().extend(["english ivy"]))
        .identify(&test_image())
        .await
        .unwrap();
    assert!(results[0].is_invasive);
}

/// No suggestions is an empty list, not an error.
#[tokio::test]
async fn test_identify_no_suggestions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "is_plant": false, "suggestions": [] })),
        )
        .mount(&mock_server)
        .await;

    let results = client(&mock_server).identify(&test_image()).await.unwrap();
    assert!(results.is_empty());
}

/// Test that 401 maps to AuthenticationFailed.
#[tokio::test]
async fn test_authentication_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identify"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).identify(&test_image()).await.unwrap_err();
    assert!(matches!(err, FloraError::AuthenticationFailed), "got {err:?}");
}

/// Test that 429 maps to RateLimited with the retry-after hint.
#[tokio::test]
async fn test_rate_limit_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identify"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "30"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).identify(&test_image()).await.unwrap_err();
    match err {
        FloraError::RateLimited { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(30)));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

/// Test that other failures map to Api with the status code.
#[tokio::test]
async fn test_server_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identify"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).identify(&test_image()).await.unwrap_err();
    assert!(matches!(err, FloraError::Api { status: 503, .. }), "got {err:?}");
}

/// A slow provider surfaces as ProviderTimeout after a single attempt.
#[tokio::test]
async fn test_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identify"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "suggestions": [] }))
                .set_delay(Duration::from_secs(2)),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let client =
        PlantIdClient::with_base_url("test_key", mock_server.uri(), Duration::from_millis(200))
            .unwrap();
    let err = client.identify(&test_image()).await.unwrap_err();
    assert!(matches!(err, FloraError::ProviderTimeout(_)), "got {err:?}");
}

/// Malformed JSON is an error, not a panic.
#[tokio::test]
async fn test_malformed_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/identify"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).identify(&test_image()).await.unwrap_err();
    assert!(matches!(err, FloraError::Http(_)), "got {err:?}");
}
