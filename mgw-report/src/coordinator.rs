//! Submission Coordinator
//!
//! Owns the description field and drives one submission at a time:
//!
//! ```text
//! Idle -> Validating -> Transmitting -> Resolved -> Idle
//!              |               \
//!              v                -> Failed -> (retry) Validating
//!            Idle
//! ```
//!
//! A `submit()` while `Validating` or `Transmitting` is ignored. No lock is
//! held across the network request.

use crate::capture::{CaptureSourceManager, ImageOrigin, ImageSnapshot};
use crate::client::{ReportPayload, ReportTransport};
use crate::error::{ReportError, SubmissionError, ValidationError};
use crate::geolocation::{Coordinates, GeolocationAdvisory};
use crate::outcome::{outcome_message, SubmissionOutcome};
use mgw_common::events::{EventBus, MgwEvent};
use mgw_common::session::SessionContext;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Soft limit shown next to the description field
pub const DESCRIPTION_LIMIT: usize = 500;

/// How long a toast stays visible
pub const TOAST_DURATION: Duration = Duration::from_secs(8);

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Per-submission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionState {
    #[default]
    Idle,
    Validating,
    Transmitting,
    Resolved,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
}

/// Transient notification shown after a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub kind: ToastKind,
    pub message: String,
    pub shown_at: Instant,
}

impl Toast {
    fn new(kind: ToastKind, message: String) -> Self {
        Self {
            kind,
            message,
            shown_at: Instant::now(),
        }
    }

    pub fn is_expired_at(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.shown_at) >= TOAST_DURATION
    }
}

/// Form contents at the moment of submission
#[derive(Debug, Clone, PartialEq)]
pub struct ReportDraft {
    pub image: Option<ImageSnapshot>,
    pub description: String,
    pub coordinates: Option<Coordinates>,
}

impl ReportDraft {
    /// Gather the draft; coordinates only accompany camera captures
    pub fn collect(
        capture: &CaptureSourceManager,
        description: &str,
        geolocation: &GeolocationAdvisory,
    ) -> Self {
        let image = capture.image().map(|artifact| artifact.snapshot());
        let coordinates = match &image {
            Some(img) if img.origin == ImageOrigin::Camera => geolocation.coordinates(),
            _ => None,
        };
        Self {
            image,
            description: description.to_string(),
            coordinates,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let has_description = !self.description.trim().is_empty();
        match (self.image.is_some(), has_description) {
            (true, true) => Ok(()),
            (false, false) => Err(ValidationError::MissingImageAndDescription),
            (false, true) => Err(ValidationError::MissingImage),
            (true, false) => Err(ValidationError::MissingDescription),
        }
    }

    /// Validate and turn into the wire payload
    pub fn into_payload(self, user_id: Option<String>) -> Result<ReportPayload, ValidationError> {
        self.validate()?;
        let image = self.image.ok_or(ValidationError::MissingImage)?;
        Ok(ReportPayload {
            image: image.bytes,
            file_name: image.file_name,
            mime_type: image.mime_type,
            description: self.description,
            user_id,
            coordinates: self.coordinates,
        })
    }
}

/// Result of a `submit()` call that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitResult {
    /// Backend accepted the report; carries the outcome message
    Resolved { message: String },
    /// A submission was already in flight
    Ignored,
}

#[derive(Debug, Default)]
struct CoordinatorInner {
    state: SubmissionState,
    description: String,
    validation_error: Option<ValidationError>,
    toast: Option<Toast>,
}

pub struct SubmissionCoordinator {
    transport: Arc<dyn ReportTransport>,
    session: Arc<dyn SessionContext>,
    event_bus: EventBus,
    inner: Mutex<CoordinatorInner>,
}

impl SubmissionCoordinator {
    pub fn new(
        transport: Arc<dyn ReportTransport>,
        session: Arc<dyn SessionContext>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            transport,
            session,
            event_bus,
            inner: Mutex::new(CoordinatorInner::default()),
        }
    }

    pub fn state(&self) -> SubmissionState {
        lock(&self.inner).state
    }

    pub fn is_submitting(&self) -> bool {
        matches!(
            self.state(),
            SubmissionState::Validating | SubmissionState::Transmitting
        )
    }

    /// Store the description; the limit is only reported, not enforced
    pub fn set_description(&self, text: impl Into<String>) {
        let mut inner = lock(&self.inner);
        inner.description = text.into();
        inner.validation_error = None;
    }

    pub fn clear_description(&self) {
        lock(&self.inner).description.clear();
    }

    pub fn description(&self) -> String {
        lock(&self.inner).description.clone()
    }

    /// Character count for the `n/500` counter
    pub fn description_len(&self) -> usize {
        lock(&self.inner).description.chars().count()
    }

    pub fn description_over_limit(&self) -> bool {
        self.description_len() > DESCRIPTION_LIMIT
    }

    pub fn validation_error(&self) -> Option<ValidationError> {
        lock(&self.inner).validation_error
    }

    /// Current toast, `None` once dismissed or expired
    pub fn toast(&self) -> Option<Toast> {
        self.toast_at(Instant::now())
    }

    pub fn toast_at(&self, now: Instant) -> Option<Toast> {
        let mut inner = lock(&self.inner);
        if inner.toast.as_ref().is_some_and(|t| t.is_expired_at(now)) {
            inner.toast = None;
        }
        inner.toast.clone()
    }

    pub fn dismiss_toast(&self) {
        lock(&self.inner).toast = None;
    }

    fn transition(&self, inner: &mut CoordinatorInner, next: SubmissionState) {
        debug!(from = ?inner.state, to = ?next, "Submission state");
        inner.state = next;
    }

    /// Validate, send, and interpret one report
    ///
    /// On success the draft (image, description, coordinates) is cleared and
    /// `ReportsUpdated` is broadcast once. On failure the draft is left
    /// intact for a retry.
    pub async fn submit(
        &self,
        capture: &Mutex<CaptureSourceManager>,
        geolocation: &Mutex<GeolocationAdvisory>,
    ) -> Result<SubmitResult, ReportError> {
        let description = {
            let mut inner = lock(&self.inner);
            if matches!(
                inner.state,
                SubmissionState::Validating | SubmissionState::Transmitting
            ) {
                debug!(state = ?inner.state, "Submission already in progress, ignoring");
                return Ok(SubmitResult::Ignored);
            }
            self.transition(&mut inner, SubmissionState::Validating);
            inner.description.clone()
        };

        let draft = {
            let capture = lock(capture);
            let geolocation = lock(geolocation);
            ReportDraft::collect(&capture, &description, &geolocation)
        };
        let user_id = self
            .session
            .get_auth()
            .map(|auth| auth.user_id)
            .filter(|id| !id.is_empty());

        let payload = match draft.into_payload(user_id) {
            Ok(payload) => payload,
            Err(e) => {
                let mut inner = lock(&self.inner);
                inner.validation_error = Some(e);
                self.transition(&mut inner, SubmissionState::Idle);
                return Err(e.into());
            }
        };

        {
            let mut inner = lock(&self.inner);
            inner.validation_error = None;
            self.transition(&mut inner, SubmissionState::Transmitting);
        }

        info!(
            size = payload.image.len(),
            with_coordinates = payload.coordinates.is_some(),
            authenticated = payload.user_id.is_some(),
            "Submitting report"
        );

        let outcome = match self.transport.submit_report(payload).await {
            Ok(SubmissionOutcome::Success(result)) => Ok(result),
            Ok(SubmissionOutcome::Failure(message)) => Err(SubmissionError::Rejected(message)),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(result) => {
                let message = outcome_message(&result);
                info!(label = ?result.label, "Report accepted");

                self.event_bus.emit_lossy(MgwEvent::ReportsUpdated);

                lock(capture).remove_image();
                lock(geolocation).clear();

                let mut inner = lock(&self.inner);
                inner.description.clear();
                inner.toast = Some(Toast::new(ToastKind::Success, message.clone()));
                self.transition(&mut inner, SubmissionState::Resolved);
                self.transition(&mut inner, SubmissionState::Idle);
                Ok(SubmitResult::Resolved { message })
            }
            Err(e) => {
                warn!(error = %e, "Report submission failed");
                let mut inner = lock(&self.inner);
                inner.toast = Some(Toast::new(ToastKind::Error, e.user_message()));
                self.transition(&mut inner, SubmissionState::Failed);
                Err(e.into())
            }
        }
    }
}
