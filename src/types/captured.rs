//! Captured image payload

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::{FloraError, Result};

/// Multipart field carrying the image on `POST /api/identify`.
pub const IMAGE_FIELD: &str = "plantImage";

/// Mime type used for frames captured from a camera.
pub const JPEG_MIME: &str = "image/jpeg";

/// A single image awaiting (or having been) submitted for identification.
///
/// Owned by the capture client for one capture-to-submit cycle and replaced
/// wholesale on every new capture or upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl CapturedImage {
    pub fn new(bytes: impl Into<Vec<u8>>, mime: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime: mime.into(),
        }
    }

    /// Build an image from raw file contents, sniffing the format.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Result<Self> {
        let bytes = bytes.into();
        let format = image::guess_format(&bytes)?;
        Ok(Self {
            mime: format.to_mime_type().to_string(),
            bytes,
        })
    }

    /// Parse a `data:<mime>;base64,<payload>` URL.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let (header, payload) = url
            .split_once(',')
            .ok_or_else(|| FloraError::InvalidImage("data URL has no payload".to_string()))?;
        let mime = header
            .strip_prefix("data:")
            .and_then(|rest| rest.strip_suffix(";base64"))
            .filter(|mime| !mime.is_empty())
            .ok_or_else(|| {
                FloraError::InvalidImage(format!("unsupported data URL header: {header}"))
            })?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| FloraError::InvalidImage(format!("bad base64 payload: {e}")))?;
        Ok(Self::new(bytes, mime))
    }

    /// Encode as a `data:` URL, suitable for embedding in a rendered result.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime, STANDARD.encode(&self.bytes))
    }

    /// Base64 payload without the data URL header.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }

    /// File name attached to the multipart upload.
    pub fn file_name(&self) -> String {
        let ext = match self.mime.as_str() {
            "image/png" => "png",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "jpg",
        };
        format!("plant.{ext}")
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
