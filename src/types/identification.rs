//! Identification result types shared by the service and the client

use serde::{Deserialize, Serialize};

/// One candidate match returned by the identification service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentificationResult {
    pub name: String,
    /// Confidence in `0.0..=1.0`.
    pub probability: f64,
    pub is_invasive: bool,
    #[serde(default)]
    pub details: Details,
}

/// Optional descriptive material attached to a match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Details {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl IdentificationResult {
    pub fn new(name: impl Into<String>, probability: f64) -> Self {
        Self {
            name: name.into(),
            probability,
            is_invasive: false,
            details: Details::default(),
        }
    }

    pub fn invasive(mut self, is_invasive: bool) -> Self {
        self.is_invasive = is_invasive;
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.details.description = Some(description.into());
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.details.url = Some(url.into());
        self
    }

    /// Probability as a whole percentage, rounded to nearest.
    pub fn probability_percent(&self) -> u32 {
        (self.probability.clamp(0.0, 1.0) * 100.0).round() as u32
    }
}

/// Successful body of `POST /api/identify`.
///
/// Ordered by rank, highest probability first.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdentifyResponse {
    #[serde(default)]
    pub results: Vec<IdentificationResult>,
}

impl IdentifyResponse {
    pub fn new(results: Vec<IdentificationResult>) -> Self {
        Self { results }
    }

    /// The top-ranked match, if any.
    pub fn top(&self) -> Option<&IdentificationResult> {
        self.results.first()
    }
}

/// Body of every non-success response from the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
