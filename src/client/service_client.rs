//! [`ServiceClient`]: [`IdentifyTransport`] over HTTP to a florad instance.

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};

use crate::types::{CapturedImage, ErrorBody, IdentifyResponse};
use crate::{FloraError, Result};

pub use crate::types::IMAGE_FIELD;

/// Sends one image and returns the service's ranked results.
#[async_trait]
pub trait IdentifyTransport: Send + Sync {
    async fn identify(&self, image: &CapturedImage) -> Result<IdentifyResponse>;
}

/// Talks to `POST {base}/api/identify`.
#[derive(Clone)]
pub struct ServiceClient {
    http: Client,
    endpoint: String,
}

impl ServiceClient {
    /// Create a client for the service at `base_url`.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let client = ServiceClient::new("http://127.0.0.1:5000");
    /// ```
    pub fn new(base_url: impl AsRef<str>) -> Self {
        Self::with_http(Client::new(), base_url)
    }

    /// Use a preconfigured reqwest client (timeouts, proxies).
    pub fn with_http(http: Client, base_url: impl AsRef<str>) -> Self {
        let endpoint = format!("{}/api/identify", base_url.as_ref().trim_end_matches('/'));
        Self { http, endpoint }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl IdentifyTransport for ServiceClient {
    async fn identify(&self, image: &CapturedImage) -> Result<IdentifyResponse> {
        let part = Part::bytes(image.bytes.clone())
            .file_name(image.file_name())
            .mime_str(&image.mime)
            .map_err(|e| FloraError::InvalidImage(format!("bad mime type {:?}: {e}", image.mime)))?;
        let form = Form::new().part(IMAGE_FIELD, part);

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = match response.json::<ErrorBody>().await {
                Ok(body) => body.error,
                Err(_) => status.to_string(),
            };
            return Err(FloraError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json().await?)
    }
}
