//! HTTP identification service.
//!
//! This module provides:
//! - The axum router and handlers (`service`)
//! - Per-address fixed-window rate limiting (`rate_limit`)
//! - Configuration and secrets loading (`config`)

pub mod config;
pub mod rate_limit;
pub mod service;

pub use service::{FloraService, ServiceOptions, serve};
