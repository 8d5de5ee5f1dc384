//! Capture client state and its pure transition function.
//!
//! `update` never performs I/O. It returns the next state plus the effects
//! the session must run; each effect that completes asynchronously feeds
//! exactly one message back in.
//!
//! Per submission: `Idle -> Submitting -> (Success | Failed)`. A new
//! capture, upload, or submit leaves `Success`/`Failed` again.

use serde::{Deserialize, Serialize};

use crate::types::{CapturedImage, IdentificationResult, IdentifyResponse};

/// Shown for every failed submission, whatever the cause.
pub const GENERIC_FAILURE_MESSAGE: &str = "Failed to identify plant. Please try again.";

/// Shown when the camera cannot be opened.
pub const CAMERA_FALLBACK_MESSAGE: &str = "Could not access camera. Please upload a photo instead.";

/// Shown after a frame is captured.
pub const CAPTURED_MESSAGE: &str = "Photo captured! Click Identify to analyze.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CameraStatus {
    #[default]
    Off,
    Requesting,
    Live,
    Unavailable {
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Submitting,
    Success,
    Failed,
}

/// Everything the client knows. Rendering is a function of this alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientState {
    pub captured_image: Option<CapturedImage>,
    pub submit_enabled: bool,
    pub loading: bool,
    pub result: Option<IdentificationResult>,
    pub error: Option<String>,
    pub camera: CameraStatus,
}

impl ClientState {
    pub fn phase(&self) -> Phase {
        if self.loading {
            Phase::Submitting
        } else if self.result.is_some() {
            Phase::Success
        } else if self.error.is_some() {
            Phase::Failed
        } else {
            Phase::Idle
        }
    }

    /// Install a new image, discarding the previous one and any outcome
    /// shown for it.
    fn replace_image(&mut self, image: CapturedImage) {
        self.captured_image = Some(image);
        self.submit_enabled = !self.loading;
        self.result = None;
        self.error = None;
    }

    /// Clear the loading flag after a submission settles.
    fn settle(&mut self) {
        self.loading = false;
        self.submit_enabled = self.captured_image.is_some();
    }
}

#[derive(Debug, Clone)]
pub enum Msg {
    StartCamera,
    CameraStarted,
    CameraUnavailable(String),
    CaptureRequested,
    FrameCaptured(CapturedImage),
    FileLoaded(CapturedImage),
    SubmitRequested,
    SubmitSucceeded(IdentifyResponse),
    SubmitFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Open the rear-facing camera stream.
    StartCamera,
    /// Snapshot the live stream.
    CaptureFrame,
    /// Tell the user to pick a file instead.
    ShowFilePicker,
    Notify(String),
    /// POST the image to the identification service.
    Submit(CapturedImage),
    /// Record a failure cause. Never shown to the user.
    LogError(String),
}

impl Effect {
    pub fn to_display_string(&self) -> String {
        match self {
            Effect::Submit(image) => format!("Submit({}, {} bytes)", image.mime, image.bytes.len()),
            effect => format!("{effect:?}"),
        }
    }
}

/// Advance `state` by one message.
pub fn update(mut state: ClientState, msg: Msg) -> (ClientState, Vec<Effect>) {
    match msg {
        Msg::StartCamera => {
            state.camera = CameraStatus::Requesting;
            (state, vec![Effect::StartCamera])
        }

        Msg::CameraStarted => {
            state.camera = CameraStatus::Live;
            (state, vec![])
        }

        Msg::CameraUnavailable(reason) => {
            state.camera = CameraStatus::Unavailable { reason };
            (
                state,
                vec![
                    Effect::Notify(CAMERA_FALLBACK_MESSAGE.to_string()),
                    Effect::ShowFilePicker,
                ],
            )
        }

        Msg::CaptureRequested => {
            if state.camera != CameraStatus::Live {
                return (state, vec![]);
            }
            (state, vec![Effect::CaptureFrame])
        }

        Msg::FrameCaptured(image) => {
            state.replace_image(image);
            (state, vec![Effect::Notify(CAPTURED_MESSAGE.to_string())])
        }

        Msg::FileLoaded(image) => {
            state.replace_image(image);
            (state, vec![])
        }

        Msg::SubmitRequested => {
            if state.loading {
                return (state, vec![]);
            }
            let Some(image) = state.captured_image.clone() else {
                return (state, vec![]);
            };
            state.loading = true;
            state.submit_enabled = false;
            state.result = None;
            state.error = None;
            (state, vec![Effect::Submit(image)])
        }

        Msg::SubmitSucceeded(response) => {
            if !state.loading {
                return (state, vec![]);
            }
            state.settle();
            match response.results.into_iter().next() {
                Some(top) => {
                    state.result = Some(top);
                    state.error = None;
                    (state, vec![])
                }
                None => {
                    state.error = Some(GENERIC_FAILURE_MESSAGE.to_string());
                    (state, vec![Effect::LogError("No plants identified".to_string())])
                }
            }
        }

        Msg::SubmitFailed(cause) => {
            if !state.loading {
                return (state, vec![]);
            }
            state.settle();
            state.result = None;
            state.error = Some(GENERIC_FAILURE_MESSAGE.to_string());
            (state, vec![Effect::LogError(cause)])
        }
    }
}
