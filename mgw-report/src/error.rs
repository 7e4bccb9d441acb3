//! Error types for mgw-report
//!
//! Every error here is recoverable. Each is caught at the boundary of the
//! operation that produced it and turned into user-visible state: an inline
//! message next to the form or a toast.

use thiserror::Error;

/// Toast text used when the backend gives no usable message
pub const SUBMISSION_FALLBACK_MESSAGE: &str =
    "There was an error submitting your report. Please try again.";

/// Camera could not be opened
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CameraAccessError {
    #[error("Camera access denied. Please allow camera permission or upload a photo instead.")]
    PermissionDenied,

    #[error("No camera found on this device. Please upload a photo instead.")]
    NoDevice,

    #[error("Camera is already in use by another application.")]
    DeviceBusy,

    #[error("Unable to access camera: {0}")]
    Unknown(String),
}

/// Picked file rejected before it becomes the active image
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileValidationError {
    #[error("Please select an image file")]
    NotAnImage { mime_type: String },

    #[error("Image size should be less than 5MB")]
    TooLarge { size: usize },
}

/// Capture Source Manager failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureError {
    #[error(transparent)]
    Camera(#[from] CameraAccessError),

    #[error(transparent)]
    File(#[from] FileValidationError),

    #[error("Switch to camera mode before starting the camera")]
    WrongMode,

    #[error("Camera is not ready yet. Please wait a moment and try again.")]
    StreamNotReady,

    #[error("Captured image is too large ({size} bytes). Please try again.")]
    TooLarge { size: usize },

    #[error("Failed to encode captured image: {0}")]
    Encode(String),
}

/// Device location could not be determined
///
/// Never fatal: the display text becomes the advisory message and the report
/// is submitted without coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationAdvisoryError {
    #[error("Location access denied. Reports can still be submitted without location.")]
    PermissionDenied,

    #[error("Location information is unavailable.")]
    PositionUnavailable,

    #[error("Location request timed out.")]
    Timeout,

    #[error("Geolocation is not supported on this device.")]
    Unsupported,
}

/// Form incomplete at submit time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please upload a photo and add a description.")]
    MissingImageAndDescription,

    #[error("Please upload a photo.")]
    MissingImage,

    #[error("Please add a description.")]
    MissingDescription,
}

/// Report submission failed after validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    /// Backend answered with a non-success status
    #[error("Report rejected: {0}")]
    Rejected(String),

    /// Network or transport failure
    #[error("Network error: {0}")]
    Transport(String),

    /// Response did not have the expected shape
    #[error("Malformed response: {0}")]
    MalformedResponse(String),
}

impl SubmissionError {
    /// Text for the error toast
    pub fn user_message(&self) -> String {
        match self {
            SubmissionError::Rejected(msg) if !msg.trim().is_empty() => msg.clone(),
            _ => SUBMISSION_FALLBACK_MESSAGE.to_string(),
        }
    }
}

/// Errors from auxiliary backend calls (points, health)
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {0}: {1}")]
    Status(u16, String),

    #[error("Request failed: {0}")]
    Failed(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Aggregate error for the report flow
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}
