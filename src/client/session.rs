//! [`CaptureSession`]: runs the pure client core against real effects.
//!
//! Messages are processed one at a time. Each effect is awaited before the
//! next message, so the session has exactly one suspension point per
//! effect (camera permission, frame grab, network round-trip) and one
//! continuation for each.

use std::collections::VecDeque;
use std::path::Path;

use tracing::{debug, error, info, warn};

use super::camera::{Camera, FacingMode};
use super::render::{Display, View, render};
use super::service_client::IdentifyTransport;
use super::state::{ClientState, Effect, Msg, update};
use crate::Result;
use crate::types::CapturedImage;

/// One user's capture-and-identify session.
pub struct CaptureSession {
    state: ClientState,
    camera: Box<dyn Camera>,
    transport: Box<dyn IdentifyTransport>,
    display: Box<dyn Display>,
}

impl CaptureSession {
    pub fn new(
        camera: Box<dyn Camera>,
        transport: Box<dyn IdentifyTransport>,
        display: Box<dyn Display>,
    ) -> Self {
        Self {
            state: ClientState::default(),
            camera,
            transport,
            display,
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn view(&self) -> View {
        render(&self.state)
    }

    /// Ask for the rear camera. Failure is non-fatal: the user is pointed
    /// at file upload instead.
    pub async fn start_camera_preview(&mut self) {
        self.dispatch(Msg::StartCamera).await;
    }

    /// Snapshot the live stream. No-op without one.
    pub async fn capture_frame(&mut self) {
        self.dispatch(Msg::CaptureRequested).await;
    }

    /// Replace the active image with file contents.
    pub async fn load_from_file(&mut self, bytes: Vec<u8>, mime: impl Into<String>) {
        self.dispatch(Msg::FileLoaded(CapturedImage::new(bytes, mime)))
            .await;
    }

    /// Read an image file from disk, sniffing its type.
    pub async fn load_from_path(&mut self, path: &Path) -> Result<()> {
        let bytes = tokio::fs::read(path).await?;
        let image = CapturedImage::from_bytes(bytes)?;
        self.dispatch(Msg::FileLoaded(image)).await;
        Ok(())
    }

    /// Get an image to submit: a camera frame when `use_camera` is set,
    /// then `file` if given, which wins over the frame.
    ///
    /// The camera is left alone without `use_camera`, so a file-only run
    /// shows no camera fallback notice.
    pub async fn acquire(&mut self, use_camera: bool, file: Option<&Path>) -> Result<()> {
        if use_camera {
            self.start_camera_preview().await;
            self.capture_frame().await;
        }
        if let Some(path) = file {
            self.load_from_path(path).await?;
        }
        Ok(())
    }

    /// Send the active image for identification. No-op without one or
    /// while a submission is already in flight.
    pub async fn submit(&mut self) {
        self.dispatch(Msg::SubmitRequested).await;
    }

    /// Feed a message through `update`, render, and run resulting effects
    /// until no follow-up messages remain.
    pub async fn dispatch(&mut self, msg: Msg) {
        let mut queue = VecDeque::from([msg]);

        while let Some(msg) = queue.pop_front() {
            let (state, effects) = update(std::mem::take(&mut self.state), msg);
            self.state = state;
            self.display.apply(&render(&self.state));

            for effect in effects {
                debug!(effect = %effect.to_display_string(), "running effect");
                if let Some(next) = self.run_effect(effect).await {
                    queue.push_back(next);
                }
            }
        }
    }

    async fn run_effect(&mut self, effect: Effect) -> Option<Msg> {
        match effect {
            Effect::StartCamera => match self.camera.start_preview(FacingMode::Environment).await {
                Ok(()) => Some(Msg::CameraStarted),
                Err(e) => {
                    warn!(error = %e, "camera error");
                    Some(Msg::CameraUnavailable(e.to_string()))
                }
            },
            Effect::CaptureFrame => match self.camera.capture_frame().await {
                Ok(image) => Some(Msg::FrameCaptured(image)),
                Err(e) => {
                    warn!(error = %e, "frame capture failed");
                    Some(Msg::CameraUnavailable(e.to_string()))
                }
            },
            Effect::ShowFilePicker => {
                info!("camera unavailable, waiting for file upload");
                None
            }
            Effect::Notify(message) => {
                self.display.notify(&message);
                None
            }
            // Always answers with exactly one settling message.
            Effect::Submit(image) => match self.transport.identify(&image).await {
                Ok(response) => Some(Msg::SubmitSucceeded(response)),
                Err(e) => Some(Msg::SubmitFailed(e.to_string())),
            },
            Effect::LogError(cause) => {
                error!(%cause, "identification failed");
                None
            }
        }
    }
}
