//! Flora - plant photo identification
//!
//! Two halves share this crate:
//!
//! - **Identification service** (`server` feature): an HTTP endpoint that
//!   accepts one uploaded photo, asks an [`IdentificationProvider`] what it
//!   shows, and returns a normalized, ranked result list. The client never
//!   holds provider credentials.
//! - **Capture client** (`client` feature): acquires an image from a camera
//!   or a file, submits it, and renders the top match or a failure.
//!
//! # Serving Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use flora::providers::PlantIdClient;
//! use flora::server::{FloraService, ServiceOptions};
//!
//! #[tokio::main]
//! async fn main() -> flora::Result<()> {
//!     let provider = Arc::new(PlantIdClient::new("your-plant-id-key")?);
//!     let router = FloraService::new(provider, ServiceOptions::default()).router()?;
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:5000").await?;
//!     flora::server::serve(listener, router, std::future::pending()).await
//! }
//! ```
//!
//! # Client Example
//!
//! ```rust,no_run
//! use flora::client::{CaptureSession, NoCamera, ServiceClient, TerminalDisplay};
//!
//! #[tokio::main]
//! async fn main() -> flora::Result<()> {
//!     let mut session = CaptureSession::new(
//!         Box::new(NoCamera),
//!         Box::new(ServiceClient::new("http://127.0.0.1:5000")),
//!         Box::new(TerminalDisplay::stdout()),
//!     );
//!     session.load_from_path("rose.jpg".as_ref()).await?;
//!     session.submit().await;
//!     Ok(())
//! }
//! ```

#[cfg(feature = "client")]
pub mod client;
pub mod error;
pub mod providers;
#[cfg(feature = "server")]
pub mod server;
pub mod telemetry;
pub mod types;
pub mod version;

// Re-export main types at crate root
pub use error::{FloraError, Result};
pub use providers::{IdentificationProvider, InvasiveSpecies, PlantIdClient};
pub use version::{PKG_VERSION, version_string};

// Re-export all types
pub use types::{
    CapturedImage, Details, ErrorBody, IMAGE_FIELD, IdentificationResult, IdentifyResponse,
};
