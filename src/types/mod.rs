//! Public types for the Flora API.

mod captured;
mod identification;

pub use captured::{CapturedImage, IMAGE_FIELD, JPEG_MIME};
pub use identification::{Details, ErrorBody, IdentificationResult, IdentifyResponse};
