//! Provider trait for species identification backends.
//!
//! The service never talks to a concrete provider directly; it holds an
//! `Arc<dyn IdentificationProvider>` so tests can swap in a mock and a
//! deployment can point at any backend that speaks the normalized shape.
//!
//! # Contract
//!
//! - One call per request. Providers do not retry.
//! - Results are ordered highest probability first.
//! - An empty list is a valid answer ("nothing recognised"), not an error.

use async_trait::async_trait;

use crate::Result;
use crate::types::{CapturedImage, IdentificationResult};

/// Backend that turns an image into ranked species guesses.
#[async_trait]
pub trait IdentificationProvider: Send + Sync {
    /// Provider name for logging and metrics.
    fn name(&self) -> &str;

    /// Identify the species shown in `image`.
    async fn identify(&self, image: &CapturedImage) -> Result<Vec<IdentificationResult>>;
}

/// Sort results so the most probable match comes first.
///
/// Stable, so provider order is kept between equal probabilities.
pub fn rank(results: &mut [IdentificationResult]) {
    results.sort_by(|a, b| b.probability.total_cmp(&a.probability));
}
