//! Capture client.
//!
//! The client is split the same way top to bottom:
//! - [`state`]: pure `update(state, msg) -> (state, effects)`
//! - [`render`]: pure `render(state) -> View`, plus display adapters
//! - [`CaptureSession`]: runs effects against a [`Camera`] and an
//!   [`IdentifyTransport`] and feeds the outcomes back in

pub mod camera;
pub mod render;
mod service_client;
mod session;
pub mod state;

pub use camera::{Camera, FacingMode, FrameSourceCamera, NoCamera, encode_frame};
pub use render::{Badge, Content, Display, ResultCard, TerminalDisplay, View, render};
pub use service_client::{IMAGE_FIELD, IdentifyTransport, ServiceClient};
pub use session::CaptureSession;
pub use state::{ClientState, Msg, Phase, update};
