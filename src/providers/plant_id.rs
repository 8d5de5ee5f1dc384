//! Plant.id API client for species identification.
//!
//! Uses the v2 `identify` endpoint, which takes base64-encoded images and
//! returns ranked `suggestions`.
//! See: <https://web.plant.id/plant-identification-api/>
//!
//! One attempt per request with a bounded timeout; a slow or failing
//! provider surfaces as an error and the caller decides what to show.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::invasive::InvasiveSpecies;
use super::traits::{IdentificationProvider, rank};
use crate::types::{CapturedImage, Details, IdentificationResult};
use crate::{FloraError, Result};

/// Default base URL for the Plant.id API
pub const DEFAULT_BASE_URL: &str = "https://api.plant.id/v2";

/// Default timeout for a single identification call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Extra detail fields requested for every suggestion.
const PLANT_DETAILS: &[&str] = &["common_names", "url", "wiki_description"];

/// Client for the Plant.id identification API.
#[derive(Clone)]
pub struct PlantIdClient {
    api_key: String,
    http: Client,
    base_url: String,
    timeout: Duration,
    invasive: InvasiveSpecies,
}

impl PlantIdClient {
    /// Create a new client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL, DEFAULT_TIMEOUT)
    }

    /// Create a client with a custom base URL and timeout (for testing with wiremock).
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FloraError::Configuration(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: api_key.into(),
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            invasive: InvasiveSpecies::default(),
        })
    }

    /// Replace the invasive species list used to flag results.
    pub fn with_invasive_species(mut self, invasive: InvasiveSpecies) -> Self {
        self.invasive = invasive;
        self
    }

    /// Identify the plant in a single image.
    ///
    /// Returns normalized results, highest probability first. A response
    /// with no suggestions yields an empty list.
    pub async fn identify(&self, image: &CapturedImage) -> Result<Vec<IdentificationResult>> {
        let url = format!("{}/identify", self.base_url);
        let encoded = image.to_base64();

        let response = self
            .http
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(&IdentifyRequest {
                images: vec![encoded.as_str()],
                plant_details: PLANT_DETAILS,
            })
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        self.handle_response_errors(&response)?;

        let body: IdentifyResponseBody = response
            .json()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let mut results: Vec<IdentificationResult> = body
            .suggestions
            .into_iter()
            .map(|s| self.normalize(s))
            .collect();
        rank(&mut results);
        Ok(results)
    }

    /// Convert one provider suggestion into the shared result shape.
    fn normalize(&self, suggestion: Suggestion) -> IdentificationResult {
        let details = suggestion.plant_details.unwrap_or_default();
        let common_names = details.common_names.unwrap_or_default();

        let is_invasive = self.invasive.matches(
            std::iter::once(suggestion.plant_name.as_str())
                .chain(common_names.iter().map(String::as_str)),
        );

        let name = common_names
            .first()
            .cloned()
            .unwrap_or(suggestion.plant_name);

        IdentificationResult {
            name,
            probability: suggestion.probability.clamp(0.0, 1.0),
            is_invasive,
            details: Details {
                description: details
                    .wiki_description
                    .and_then(|d| d.value)
                    .filter(|d| !d.trim().is_empty()),
                url: details.url.filter(|u| !u.is_empty()),
            },
        }
    }

    fn map_transport_error(&self, err: reqwest::Error) -> FloraError {
        if err.is_timeout() {
            FloraError::ProviderTimeout(self.timeout)
        } else {
            FloraError::Http(err.to_string())
        }
    }

    /// Check response status and map to appropriate error.
    fn handle_response_errors(&self, response: &reqwest::Response) -> Result<()> {
        let status = response.status();

        if status.is_success() {
            return Ok(());
        }

        match status.as_u16() {
            401 | 403 => Err(FloraError::AuthenticationFailed),
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs);
                Err(FloraError::RateLimited { retry_after })
            }
            code => Err(FloraError::Api {
                status: code,
                message: format!("Plant.id API error: {status}"),
            }),
        }
    }
}

#[derive(Serialize)]
struct IdentifyRequest<'a> {
    images: Vec<&'a str>,
    plant_details: &'a [&'a str],
}

#[derive(Deserialize)]
struct IdentifyResponseBody {
    #[serde(default)]
    suggestions: Vec<Suggestion>,
}

#[derive(Deserialize)]
struct Suggestion {
    plant_name: String,
    probability: f64,
    #[serde(default)]
    plant_details: Option<PlantDetails>,
}

#[derive(Deserialize, Default)]
struct PlantDetails {
    #[serde(default)]
    common_names: Option<Vec<String>>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    wiki_description: Option<WikiDescription>,
}

#[derive(Deserialize)]
struct WikiDescription {
    #[serde(default)]
    value: Option<String>,
}

#[async_trait]
impl IdentificationProvider for PlantIdClient {
    fn name(&self) -> &str {
        "plant_id"
    }

    async fn identify(&self, image: &CapturedImage) -> Result<Vec<IdentificationResult>> {
        PlantIdClient::identify(self, image).await
    }
}
