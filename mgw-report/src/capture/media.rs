//! Device media capability
//!
//! The camera is reached only through [`MediaCapture`], so the capture flow
//! runs the same against real hardware, a still image, or a test double.

use crate::error::CameraAccessError;
use async_trait::async_trait;
use std::path::Path;

/// Which way the requested camera faces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FacingMode {
    /// Rear camera
    Environment,
    /// Front camera
    User,
}

/// Stream request sent to the device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing_mode: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
}

impl VideoConstraints {
    /// Rear camera at 1280x720, the default for field reports
    pub fn rear_camera() -> Self {
        Self {
            facing_mode: FacingMode::Environment,
            ideal_width: 1280,
            ideal_height: 720,
        }
    }
}

/// One uncompressed RGBA frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFrame {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl RawFrame {
    /// Frame filled with a single colour
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = (width as usize) * (height as usize);
        Self {
            width,
            height,
            rgba: rgba.iter().copied().cycle().take(pixels * 4).collect(),
        }
    }
}

/// A live video stream
pub trait MediaStream: Send {
    /// Whether frames can be grabbed yet
    fn is_ready(&self) -> bool;

    /// Take the current frame
    fn grab_frame(&mut self) -> Result<RawFrame, CameraAccessError>;

    /// Release the device. Safe to call more than once.
    fn stop(&mut self);
}

/// Access to the device's cameras
#[async_trait]
pub trait MediaCapture: Send + Sync {
    /// Request exclusive access to a camera matching `constraints`
    async fn open(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraAccessError>;
}

impl CameraAccessError {
    /// Categorize a platform error by its name
    ///
    /// Accepts the DOMException names browsers report for `getUserMedia`
    /// failures; anything else is `Unknown`.
    pub fn from_platform(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "PermissionDeniedError" | "SecurityError" => {
                CameraAccessError::PermissionDenied
            }
            "NotFoundError" | "DevicesNotFoundError" | "OverconstrainedError" => {
                CameraAccessError::NoDevice
            }
            "NotReadableError" | "TrackStartError" | "AbortError" => CameraAccessError::DeviceBusy,
            _ => CameraAccessError::Unknown(format!("{}: {}", name, message)),
        }
    }
}

/// Device without any camera
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCamera;

#[async_trait]
impl MediaCapture for NoCamera {
    async fn open(
        &self,
        _constraints: &VideoConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraAccessError> {
        Err(CameraAccessError::NoDevice)
    }
}

/// Camera that always shows the same still image
///
/// Used by the command line to feed a photo through the camera path.
#[derive(Debug, Clone)]
pub struct StillImageCamera {
    frame: RawFrame,
}

impl StillImageCamera {
    pub fn new(frame: RawFrame) -> Self {
        Self { frame }
    }

    /// Decode an image file into the frame the camera will show
    pub fn from_path(path: &Path) -> Result<Self, CameraAccessError> {
        let img = image::open(path)
            .map_err(|e| CameraAccessError::Unknown(format!("{}: {}", path.display(), e)))?
            .to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self::new(RawFrame {
            width,
            height,
            rgba: img.into_raw(),
        }))
    }
}

#[async_trait]
impl MediaCapture for StillImageCamera {
    async fn open(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraAccessError> {
        tracing::debug!(facing = ?constraints.facing_mode, "Opening still-image camera");
        Ok(Box::new(StillImageStream {
            frame: self.frame.clone(),
            stopped: false,
        }))
    }
}

struct StillImageStream {
    frame: RawFrame,
    stopped: bool,
}

impl MediaStream for StillImageStream {
    fn is_ready(&self) -> bool {
        !self.stopped
    }

    fn grab_frame(&mut self) -> Result<RawFrame, CameraAccessError> {
        if self.stopped {
            return Err(CameraAccessError::Unknown("stream stopped".to_string()));
        }
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}
