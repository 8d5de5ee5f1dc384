//! HTTP service implementation.
//!
//! Routes:
//! - `POST /api/identify`: multipart upload, field [`IMAGE_FIELD`]
//! - `GET /health`
//!
//! Only the first `plantImage` part of an upload is used; any other parts
//! are skipped. Response bodies never carry internal error detail: every
//! failure is one of a few fixed messages and the cause is logged here.

use std::any::Any;
use std::future::Future;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Json;
use axum::Router;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{ConnectInfo, DefaultBodyLimit, Multipart, Request, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tracing::{debug, error, warn};

use super::config::Config;
use super::rate_limit::{Decision, RATE_LIMIT_MESSAGE, RateLimitConfig, RateLimiter};
use crate::providers::IdentificationProvider;
use crate::types::{CapturedImage, ErrorBody, IdentifyResponse};
use crate::{FloraError, telemetry};

pub use crate::types::IMAGE_FIELD;

/// Body message for any unexpected failure.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong!";
pub const MISSING_IMAGE_MESSAGE: &str = "No image uploaded";
pub const INVALID_IMAGE_MESSAGE: &str = "Invalid image upload";
pub const NOT_FOUND_MESSAGE: &str = "Not found";
pub const METHOD_NOT_ALLOWED_MESSAGE: &str = "Method not allowed";

/// Service settings derived from [`Config`].
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    pub allowed_origin: String,
    pub rate_limit: RateLimitConfig,
    pub provider_timeout: Duration,
    pub max_upload_bytes: usize,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl ServiceOptions {
    pub fn from_config(config: &Config) -> Self {
        let limits = &config.server.limits;
        Self {
            allowed_origin: config.server.allowed_origin.clone(),
            rate_limit: RateLimitConfig::new()
                .max_requests(limits.rate_limit_max)
                .window(limits.rate_limit_window()),
            provider_timeout: limits.request_timeout(),
            max_upload_bytes: limits.max_upload_bytes,
        }
    }
}

/// Shared handler state. Holds no per-request data.
#[derive(Clone)]
struct AppState {
    provider: Arc<dyn IdentificationProvider>,
    provider_timeout: Duration,
}

/// HTTP service that fronts an [`IdentificationProvider`].
pub struct FloraService {
    state: AppState,
    options: ServiceOptions,
}

impl FloraService {
    /// Create a new service around the given provider.
    pub fn new(provider: Arc<dyn IdentificationProvider>, options: ServiceOptions) -> Self {
        Self {
            state: AppState {
                provider,
                provider_timeout: options.provider_timeout,
            },
            options,
        }
    }

    /// Build the axum router with all middleware applied.
    ///
    /// Run it with [`serve`] so the rate limiter can see client addresses;
    /// without connect info every caller shares one bucket.
    pub fn router(self) -> crate::Result<Router> {
        let origin = HeaderValue::from_str(&self.options.allowed_origin).map_err(|e| {
            FloraError::Configuration(format!(
                "invalid allowed origin {:?}: {e}",
                self.options.allowed_origin
            ))
        })?;
        let cors = CorsLayer::new()
            .allow_origin(AllowOrigin::list([origin]))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]);

        let limiter = RateLimiter::new(self.options.rate_limit.clone());

        let api = Router::new()
            .route("/identify", post(identify))
            .method_not_allowed_fallback(method_not_allowed)
            .layer(middleware::from_fn_with_state(limiter, enforce_rate_limit));

        let router = Router::new()
            .nest("/api", api)
            .route("/health", get(health))
            .fallback(not_found)
            .with_state(self.state)
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(DefaultBodyLimit::max(self.options.max_upload_bytes))
            .layer(cors)
            .layer(security_header(
                header::X_CONTENT_TYPE_OPTIONS,
                "nosniff",
            ))
            .layer(security_header(header::X_FRAME_OPTIONS, "SAMEORIGIN"))
            .layer(security_header(header::REFERRER_POLICY, "no-referrer"))
            .layer(security_header(
                HeaderName::from_static("cross-origin-resource-policy"),
                "same-origin",
            ));

        Ok(router)
    }
}

/// Serve `router` on `listener` until `shutdown` resolves.
///
/// Client addresses are attached as [`ConnectInfo`] for rate limiting.
pub async fn serve(
    listener: tokio::net::TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> crate::Result<()> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await?;
    Ok(())
}

fn security_header(name: HeaderName, value: &'static str) -> SetResponseHeaderLayer<HeaderValue> {
    SetResponseHeaderLayer::if_not_present(name, HeaderValue::from_static(value))
}

// =============================================================================
// Handlers
// =============================================================================

async fn identify(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<IdentifyResponse>, ApiError> {
    let outcome = identify_upload(&state, multipart).await;

    let status = match &outcome {
        Ok(_) => "ok",
        Err(e) if e.is_client_error() => "client_error",
        Err(_) => "error",
    };
    metrics::counter!(telemetry::IDENTIFY_REQUESTS_TOTAL, "status" => status).increment(1);

    outcome.map(Json).map_err(ApiError::from)
}

async fn identify_upload(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> crate::Result<IdentifyResponse> {
    let multipart = multipart.map_err(|rejection| {
        debug!(%rejection, "request is not a multipart upload");
        FloraError::MissingImage
    })?;
    let image = read_image(multipart).await?;

    let provider = state.provider.name().to_owned();
    let start = Instant::now();
    let lookup = tokio::time::timeout(state.provider_timeout, state.provider.identify(&image)).await;
    metrics::histogram!(telemetry::PROVIDER_DURATION_SECONDS, "provider" => provider)
        .record(start.elapsed().as_secs_f64());

    let results = lookup.map_err(|_| FloraError::ProviderTimeout(state.provider_timeout))??;
    Ok(IdentifyResponse::new(results))
}

/// Pull the first `plantImage` part out of the upload.
async fn read_image(mut multipart: Multipart) -> crate::Result<CapturedImage> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| FloraError::InvalidImage(e.body_text()))?
    {
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }

        let mime = field.content_type().map(str::to_owned);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| FloraError::InvalidImage(e.body_text()))?;
        if bytes.is_empty() {
            return Err(FloraError::MissingImage);
        }

        // Trust a declared image type; sniff anything else.
        return match mime {
            Some(mime) if mime.starts_with("image/") => Ok(CapturedImage::new(bytes.to_vec(), mime)),
            _ => CapturedImage::from_bytes(bytes.to_vec()),
        };
    }

    Err(FloraError::MissingImage)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok", "version": crate::version_string() }))
}

async fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(ErrorBody::new(NOT_FOUND_MESSAGE))).into_response()
}

async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(ErrorBody::new(METHOD_NOT_ALLOWED_MESSAGE)),
    )
        .into_response()
}

// =============================================================================
// Middleware
// =============================================================================

async fn enforce_rate_limit(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    match limiter.check(addr).await {
        Decision::Allowed { limit, remaining } => {
            let mut response = next.run(request).await;
            let headers = response.headers_mut();
            headers.insert("ratelimit-limit", HeaderValue::from(limit));
            headers.insert("ratelimit-remaining", HeaderValue::from(remaining));
            response
        }
        Decision::Rejected { limit, retry_after } => {
            warn!(%addr, limit, "rate limit exceeded");
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(ErrorBody::new(RATE_LIMIT_MESSAGE)),
            )
                .into_response();
            let headers = response.headers_mut();
            headers.insert("ratelimit-limit", HeaderValue::from(limit));
            headers.insert("ratelimit-remaining", HeaderValue::from(0u32));
            headers.insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after.as_secs().max(1)),
            );
            response
        }
    }
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = err
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| err.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(panic = detail, "handler panicked");
    ApiError::Internal.into_response()
}

// =============================================================================
// Error mapping
// =============================================================================

/// Errors as seen by HTTP callers: a status and a fixed message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    MissingImage,
    InvalidImage,
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingImage | ApiError::InvalidImage => StatusCode::BAD_REQUEST,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ApiError::MissingImage => MISSING_IMAGE_MESSAGE,
            ApiError::InvalidImage => INVALID_IMAGE_MESSAGE,
            ApiError::Internal => GENERIC_ERROR_MESSAGE,
        }
    }
}

impl From<FloraError> for ApiError {
    fn from(err: FloraError) -> Self {
        match err {
            FloraError::MissingImage => {
                warn!("identify request without an image");
                ApiError::MissingImage
            }
            FloraError::InvalidImage(reason) => {
                warn!(%reason, "identify request with an unreadable image");
                ApiError::InvalidImage
            }
            other => {
                error!(error = %other, "identification failed");
                ApiError::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorBody::new(self.message()))).into_response()
    }
}
