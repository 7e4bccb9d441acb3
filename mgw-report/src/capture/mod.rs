//! Capture Source Manager
//!
//! Owns whichever image-acquisition mode is active (live camera or file
//! picker) and the single image waiting to be submitted.
//!
//! Invariants:
//! - At most one [`ImageArtifact`] exists; storing a new one drops the old
//!   one, which releases its preview handle.
//! - Camera and file-picker modes are exclusive; leaving camera mode stops the
//!   stream first.
//! - Camera and file failures never leave the manager unusable: the error is
//!   kept for display and the user may retry or switch modes.

pub mod encode;
pub mod media;
pub mod preview;

pub use media::{
    FacingMode, MediaCapture, MediaStream, NoCamera, RawFrame, StillImageCamera, VideoConstraints,
};
pub use preview::{PreviewHandle, PreviewRegistry};

use crate::error::{CameraAccessError, CaptureError, FileValidationError};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Largest image accepted from either source (5 MB)
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Active acquisition mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureMode {
    Camera,
    #[default]
    FilePicker,
}

/// Where the active image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageOrigin {
    Camera,
    FilePicker,
}

/// A file chosen by the user, before validation
#[derive(Debug, Clone)]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk
    ///
    /// The MIME type is sniffed from the content; the extension is only
    /// consulted when the content is not recognised.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let mime_type = infer::get(&bytes)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| mime_from_extension(path).to_string());
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());

        debug!(file = %name, mime = %mime_type, size = bytes.len(), "Read picked file");
        Ok(Self::new(name, mime_type, bytes))
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

/// The image currently on the form
#[derive(Debug)]
pub struct ImageArtifact {
    bytes: Vec<u8>,
    mime_type: String,
    file_name: String,
    origin: ImageOrigin,
    preview: PreviewHandle,
}

impl ImageArtifact {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn origin(&self) -> ImageOrigin {
        self.origin
    }

    pub fn preview_url(&self) -> &str {
        self.preview.url()
    }

    /// Owned copy of the data to upload; the preview stays with the artifact
    pub fn snapshot(&self) -> ImageSnapshot {
        ImageSnapshot {
            bytes: self.bytes.clone(),
            mime_type: self.mime_type.clone(),
            file_name: self.file_name.clone(),
            origin: self.origin,
        }
    }
}

/// Upload copy of an [`ImageArtifact`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSnapshot {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub file_name: String,
    pub origin: ImageOrigin,
}

/// Produces exactly one image from the camera or a picked file
pub struct CaptureSourceManager {
    media: Arc<dyn MediaCapture>,
    previews: PreviewRegistry,
    mode: CaptureMode,
    stream: Option<Box<dyn MediaStream>>,
    image: Option<ImageArtifact>,
    error: Option<CaptureError>,
    max_image_bytes: usize,
}

impl CaptureSourceManager {
    pub fn new(media: Arc<dyn MediaCapture>, previews: PreviewRegistry) -> Self {
        Self {
            media,
            previews,
            mode: CaptureMode::default(),
            stream: None,
            image: None,
            error: None,
            max_image_bytes: MAX_IMAGE_BYTES,
        }
    }

    /// Override the size limit applied to captured frames and picked files
    pub fn with_max_image_bytes(mut self, limit: usize) -> Self {
        self.set_max_image_bytes(limit);
        self
    }

    pub fn set_max_image_bytes(&mut self, limit: usize) {
        self.max_image_bytes = limit;
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn is_capturing(&self) -> bool {
        self.stream.is_some()
    }

    pub fn image(&self) -> Option<&ImageArtifact> {
        self.image.as_ref()
    }

    /// Inline error for the upload area, if any
    pub fn error(&self) -> Option<&CaptureError> {
        self.error.as_ref()
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Switch acquisition mode
    ///
    /// Stops any live stream and clears the inline error. No-op when the mode
    /// is unchanged.
    pub fn select_mode(&mut self, mode: CaptureMode) {
        if mode == self.mode {
            return;
        }
        self.stop_capture();
        self.error = None;
        debug!(from = ?self.mode, to = ?mode, "Capture mode changed");
        self.mode = mode;
    }

    /// Open the rear camera and start the live preview
    pub async fn start_capture(&mut self) -> Result<(), CaptureError> {
        let (media, constraints) = self.begin_capture()?;
        let result = media.open(&constraints).await;
        self.finish_capture(result)
    }

    /// First half of [`start_capture`](Self::start_capture): checks the mode
    /// and releases any previous stream
    ///
    /// Callers that cannot hold the manager across the permission prompt use
    /// this pair directly.
    pub fn begin_capture(
        &mut self,
    ) -> Result<(Arc<dyn MediaCapture>, VideoConstraints), CaptureError> {
        if self.mode != CaptureMode::Camera {
            self.error = Some(CaptureError::WrongMode);
            return Err(CaptureError::WrongMode);
        }
        self.stop_capture();
        self.error = None;
        Ok((Arc::clone(&self.media), VideoConstraints::rear_camera()))
    }

    /// Second half of [`start_capture`](Self::start_capture): installs the
    /// stream or records the categorized failure
    ///
    /// A stream that arrives after the user left camera mode is released
    /// immediately.
    pub fn finish_capture(
        &mut self,
        result: Result<Box<dyn MediaStream>, CameraAccessError>,
    ) -> Result<(), CaptureError> {
        match result {
            Ok(mut stream) => {
                if self.mode != CaptureMode::Camera {
                    debug!("Camera granted after leaving camera mode, releasing");
                    stream.stop();
                    return Err(CaptureError::WrongMode);
                }
                self.stop_capture();
                self.stream = Some(stream);
                info!("Camera stream started");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Camera access failed");
                let err = CaptureError::Camera(e);
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Release the camera. Safe to call when not capturing.
    pub fn stop_capture(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.stop();
            debug!("Camera stream stopped");
        }
    }

    /// Take a still from the live stream
    ///
    /// On success the stream is stopped and the JPEG becomes the active image.
    /// An oversized capture is discarded and the stream keeps running so the
    /// user can try again.
    pub fn capture_photo(&mut self) -> Result<(), CaptureError> {
        let stream = match self.stream.as_mut() {
            Some(stream) if stream.is_ready() => stream,
            _ => {
                self.error = Some(CaptureError::StreamNotReady);
                return Err(CaptureError::StreamNotReady);
            }
        };

        let jpeg = stream
            .grab_frame()
            .map_err(CaptureError::from)
            .and_then(|frame| encode::encode_jpeg(&frame, encode::JPEG_QUALITY));
        let jpeg = match jpeg {
            Ok(jpeg) => jpeg,
            Err(e) => {
                warn!(error = %e, "Photo capture failed");
                self.error = Some(e.clone());
                return Err(e);
            }
        };

        if jpeg.len() > self.max_image_bytes {
            warn!(size = jpeg.len(), limit = self.max_image_bytes, "Captured photo too large");
            let err = CaptureError::TooLarge { size: jpeg.len() };
            self.error = Some(err.clone());
            return Err(err);
        }

        self.stop_capture();
        let file_name = format!("camera-capture-{}.jpg", chrono::Utc::now().timestamp_millis());
        info!(size = jpeg.len(), "Photo captured");
        self.store(jpeg, "image/jpeg".to_string(), file_name, ImageOrigin::Camera);
        Ok(())
    }

    /// Validate and store a picked file
    ///
    /// Picking a file switches to file-picker mode. A rejected file leaves the
    /// current image untouched.
    pub fn select_file(&mut self, file: SelectedFile) -> Result<(), FileValidationError> {
        self.select_mode(CaptureMode::FilePicker);

        if let Err(e) = self.validate_file(&file) {
            warn!(file = %file.name, error = %e, "Picked file rejected");
            self.error = Some(CaptureError::File(e.clone()));
            return Err(e);
        }

        info!(file = %file.name, size = file.size(), "Image selected");
        self.store(file.bytes, file.mime_type, file.name, ImageOrigin::FilePicker);
        Ok(())
    }

    fn validate_file(&self, file: &SelectedFile) -> Result<(), FileValidationError> {
        if !file.mime_type.starts_with("image/") {
            return Err(FileValidationError::NotAnImage {
                mime_type: file.mime_type.clone(),
            });
        }
        if file.size() > self.max_image_bytes {
            return Err(FileValidationError::TooLarge { size: file.size() });
        }
        Ok(())
    }

    /// Discard the active image and its preview
    pub fn remove_image(&mut self) {
        if self.image.take().is_some() {
            debug!("Image removed");
        }
        self.error = None;
    }

    fn store(&mut self, bytes: Vec<u8>, mime_type: String, file_name: String, origin: ImageOrigin) {
        // Replacing the artifact drops the previous preview handle
        self.image = Some(ImageArtifact {
            bytes,
            mime_type,
            file_name,
            origin,
            preview: self.previews.create(),
        });
        self.error = None;
    }
}

impl Drop for CaptureSourceManager {
    fn drop(&mut self) {
        self.stop_capture();
    }
}
