//! Camera access for the capture client.
//!
//! Real capture hardware sits behind the [`Camera`] trait. On hosts
//! without it, the session falls back to file upload.

use std::io::Cursor;
use std::path::PathBuf;

use async_trait::async_trait;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use tracing::debug;

use crate::types::{CapturedImage, JPEG_MIME};
use crate::{FloraError, Result};

/// JPEG quality for captured frames.
pub const JPEG_QUALITY: u8 = 92;

/// Which way the requested camera should face.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FacingMode {
    /// Rear camera, pointing away from the user.
    #[default]
    Environment,
    User,
}

#[async_trait]
pub trait Camera: Send {
    /// Open a live stream. Errors mean the camera is denied or absent.
    async fn start_preview(&mut self, facing: FacingMode) -> Result<()>;

    /// Snapshot the current frame at its native resolution.
    async fn capture_frame(&mut self) -> Result<CapturedImage>;
}

/// Encode an RGB frame as JPEG.
pub fn encode_frame(frame: &RgbImage) -> Result<CapturedImage> {
    let mut bytes = Cursor::new(Vec::new());
    JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY).encode_image(frame)?;
    Ok(CapturedImage::new(bytes.into_inner(), JPEG_MIME))
}

/// A camera whose "stream" is an image file kept fresh by an external
/// capture tool (e.g. a webcam daemon writing the latest frame to disk).
pub struct FrameSourceCamera {
    device: PathBuf,
    live: bool,
}

impl FrameSourceCamera {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            live: false,
        }
    }

    async fn read_frame(&self) -> Result<RgbImage> {
        let bytes = tokio::fs::read(&self.device).await.map_err(|e| {
            FloraError::CameraUnavailable(format!("{}: {e}", self.device.display()))
        })?;
        Ok(image::load_from_memory(&bytes)?.to_rgb8())
    }
}

#[async_trait]
impl Camera for FrameSourceCamera {
    async fn start_preview(&mut self, facing: FacingMode) -> Result<()> {
        let frame = self.read_frame().await?;
        debug!(
            device = %self.device.display(),
            ?facing,
            width = frame.width(),
            height = frame.height(),
            "camera stream opened"
        );
        self.live = true;
        Ok(())
    }

    async fn capture_frame(&mut self) -> Result<CapturedImage> {
        if !self.live {
            return Err(FloraError::CameraUnavailable("stream not started".to_string()));
        }
        let frame = self.read_frame().await?;
        encode_frame(&frame)
    }
}

/// Host without camera hardware.
#[derive(Debug, Default)]
pub struct NoCamera;

#[async_trait]
impl Camera for NoCamera {
    async fn start_preview(&mut self, _facing: FacingMode) -> Result<()> {
        Err(FloraError::CameraUnavailable("no camera device".to_string()))
    }

    async fn capture_frame(&mut self) -> Result<CapturedImage> {
        Err(FloraError::CameraUnavailable("no camera device".to_string()))
    }
}
