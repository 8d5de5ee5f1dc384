//! Telemetry metric name constants.
//!
//! Centralised metric names for flora operations. Consumers install their
//! own `metrics` recorder (e.g. prometheus, statsd); without a recorder
//! installed, all metric calls are no-ops.
//!
//! # Metric naming conventions
//!
//! All metrics are prefixed with `flora_`. Counters end in `_total`,
//! histograms use meaningful units (e.g. `_seconds`).

/// Total `/api/identify` requests handled by the service.
///
/// Labels: `status` ("ok" | "client_error" | "error").
pub const IDENTIFY_REQUESTS_TOTAL: &str = "flora_identify_requests_total";

/// Provider lookup duration in seconds.
///
/// Labels: `provider`.
pub const PROVIDER_DURATION_SECONDS: &str = "flora_provider_duration_seconds";

/// Total requests rejected by the per-address rate limiter.
pub const RATE_LIMITED_TOTAL: &str = "flora_rate_limited_total";
