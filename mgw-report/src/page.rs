//! Report page
//!
//! Composes the Capture Source Manager, the Geolocation Advisory and the
//! Submission Coordinator behind one handle that can be shared between tasks.
//! All methods take `&self`; no lock is held while waiting on the camera,
//! the location provider or the network.

use crate::capture::{
    CaptureMode, CaptureSourceManager, ImageOrigin, MediaCapture, PreviewRegistry, SelectedFile,
};
use crate::client::ReportTransport;
use crate::coordinator::{lock, SubmissionCoordinator, SubmissionState, SubmitResult, Toast};
use crate::error::{CaptureError, FileValidationError, ReportError};
use crate::geolocation::{self, Coordinates, GeolocationAdvisory, LocationProvider};
use mgw_common::events::EventBus;
use mgw_common::session::SessionContext;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct ReportPage {
    capture: Mutex<CaptureSourceManager>,
    geolocation: Mutex<GeolocationAdvisory>,
    coordinator: SubmissionCoordinator,
    location: Arc<dyn LocationProvider>,
    previews: PreviewRegistry,
    torn_down: AtomicBool,
}

impl ReportPage {
    pub fn new(
        media: Arc<dyn MediaCapture>,
        location: Arc<dyn LocationProvider>,
        transport: Arc<dyn ReportTransport>,
        session: Arc<dyn SessionContext>,
        event_bus: EventBus,
    ) -> Self {
        let previews = PreviewRegistry::new();
        Self {
            capture: Mutex::new(CaptureSourceManager::new(media, previews.clone())),
            geolocation: Mutex::new(GeolocationAdvisory::new()),
            coordinator: SubmissionCoordinator::new(transport, session, event_bus),
            location,
            previews,
            torn_down: AtomicBool::new(false),
        }
    }

    /// Override the 5 MB image size limit
    pub fn with_max_image_bytes(self, limit: usize) -> Self {
        lock(&self.capture).set_max_image_bytes(limit);
        self
    }

    /// False between `unmount()` and the next `mount()`
    pub fn is_active(&self) -> bool {
        !self.torn_down.load(Ordering::SeqCst)
    }

    /// Page shown: ask for the device location once
    ///
    /// Never fails. The result is dropped if the page was unmounted while
    /// the request was pending.
    pub async fn mount(&self) {
        self.torn_down.store(false, Ordering::SeqCst);

        let options = *lock(&self.geolocation).options();
        let result = geolocation::locate(self.location.as_ref(), &options).await;

        if !self.is_active() {
            debug!("Location arrived after unmount, ignoring");
            return;
        }
        lock(&self.geolocation).apply(result);
    }

    /// Page hidden: release the camera
    pub fn unmount(&self) {
        self.torn_down.store(true, Ordering::SeqCst);
        lock(&self.capture).stop_capture();
    }

    // Capture Source Manager

    pub fn select_mode(&self, mode: CaptureMode) {
        lock(&self.capture).select_mode(mode);
    }

    pub fn mode(&self) -> CaptureMode {
        lock(&self.capture).mode()
    }

    /// Open the camera; the capture manager is not locked during the
    /// permission prompt
    pub async fn start_capture(&self) -> Result<(), CaptureError> {
        let (media, constraints) = lock(&self.capture).begin_capture()?;
        let result = media.open(&constraints).await;

        if !self.is_active() {
            if let Ok(mut stream) = result {
                debug!("Camera granted after unmount, releasing");
                stream.stop();
            }
            return Err(CaptureError::WrongMode);
        }
        lock(&self.capture).finish_capture(result)
    }

    pub fn stop_capture(&self) {
        lock(&self.capture).stop_capture();
    }

    pub fn is_capturing(&self) -> bool {
        lock(&self.capture).is_capturing()
    }

    pub fn capture_photo(&self) -> Result<(), CaptureError> {
        lock(&self.capture).capture_photo()
    }

    pub fn select_file(&self, file: SelectedFile) -> Result<(), FileValidationError> {
        lock(&self.capture).select_file(file)
    }

    pub fn remove_image(&self) {
        lock(&self.capture).remove_image();
    }

    pub fn has_image(&self) -> bool {
        lock(&self.capture).image().is_some()
    }

    pub fn image_origin(&self) -> Option<ImageOrigin> {
        lock(&self.capture).image().map(|img| img.origin())
    }

    pub fn preview_url(&self) -> Option<String> {
        lock(&self.capture)
            .image()
            .map(|img| img.preview_url().to_string())
    }

    pub fn previews(&self) -> &PreviewRegistry {
        &self.previews
    }

    /// Inline message for the upload area: capture problems first, then
    /// missing form fields
    pub fn inline_error(&self) -> Option<String> {
        if let Some(err) = lock(&self.capture).error() {
            return Some(err.to_string());
        }
        self.coordinator.validation_error().map(|e| e.to_string())
    }

    // Geolocation Advisory

    pub fn coordinates(&self) -> Option<Coordinates> {
        lock(&self.geolocation).coordinates()
    }

    pub fn advisory_message(&self) -> Option<String> {
        lock(&self.geolocation)
            .advisory_message()
            .map(str::to_string)
    }

    // Submission Coordinator

    pub fn set_description(&self, text: impl Into<String>) {
        self.coordinator.set_description(text);
    }

    pub fn clear_description(&self) {
        self.coordinator.clear_description();
    }

    pub fn description(&self) -> String {
        self.coordinator.description()
    }

    pub fn description_len(&self) -> usize {
        self.coordinator.description_len()
    }

    pub fn state(&self) -> SubmissionState {
        self.coordinator.state()
    }

    pub fn toast(&self) -> Option<Toast> {
        self.coordinator.toast()
    }

    pub fn dismiss_toast(&self) {
        self.coordinator.dismiss_toast();
    }

    pub async fn submit(&self) -> Result<SubmitResult, ReportError> {
        self.coordinator
            .submit(&self.capture, &self.geolocation)
            .await
    }
}
