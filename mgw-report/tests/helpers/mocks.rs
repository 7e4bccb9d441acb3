//! Capability doubles

use async_trait::async_trait;
use mgw_report::capture::{MediaCapture, MediaStream, RawFrame, VideoConstraints};
use mgw_report::error::{ApiError, CameraAccessError, GeolocationAdvisoryError, SubmissionError};
use mgw_report::geolocation::{Coordinates, LocationProvider, PositionOptions};
use mgw_report::{AnalysisResult, PointsSource, ReportPayload, ReportTransport, SubmissionOutcome, UserPoints};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Camera that counts how often it is opened and released
pub struct MockCamera {
    denial: Option<CameraAccessError>,
    ready: bool,
    frame: RawFrame,
    opened: Arc<AtomicUsize>,
    stopped: Arc<AtomicUsize>,
}

impl MockCamera {
    pub fn granting() -> Self {
        Self {
            denial: None,
            ready: true,
            frame: RawFrame::solid(64, 48, [30, 120, 60, 255]),
            opened: Arc::new(AtomicUsize::new(0)),
            stopped: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn denying(error: CameraAccessError) -> Self {
        Self {
            denial: Some(error),
            ..Self::granting()
        }
    }

    /// Streams never report ready
    pub fn not_ready(mut self) -> Self {
        self.ready = false;
        self
    }

    pub fn with_frame(mut self, frame: RawFrame) -> Self {
        self.frame = frame;
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Streams opened and not yet released
    pub fn active(&self) -> usize {
        self.opened() - self.stopped()
    }
}

#[async_trait]
impl MediaCapture for MockCamera {
    async fn open(
        &self,
        _constraints: &VideoConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraAccessError> {
        if let Some(error) = &self.denial {
            return Err(error.clone());
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockStream {
            ready: self.ready,
            frame: self.frame.clone(),
            stopped: false,
            stop_counter: self.stopped.clone(),
        }))
    }
}

struct MockStream {
    ready: bool,
    frame: RawFrame,
    stopped: bool,
    stop_counter: Arc<AtomicUsize>,
}

impl MediaStream for MockStream {
    fn is_ready(&self) -> bool {
        self.ready && !self.stopped
    }

    fn grab_frame(&mut self) -> Result<RawFrame, CameraAccessError> {
        Ok(self.frame.clone())
    }

    fn stop(&mut self) {
        if !self.stopped {
            self.stopped = true;
            self.stop_counter.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Location provider that answers only once released
pub struct GatedLocation {
    result: Result<Coordinates, GeolocationAdvisoryError>,
    gate: Arc<Notify>,
}

impl GatedLocation {
    pub fn new(result: Result<Coordinates, GeolocationAdvisoryError>) -> Self {
        Self {
            result,
            gate: Arc::new(Notify::new()),
        }
    }

    pub fn release(&self) {
        self.gate.notify_one();
    }
}

#[async_trait]
impl LocationProvider for GatedLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationAdvisoryError> {
        self.gate.notified().await;
        self.result.clone()
    }
}

/// Transport that records every payload and replies with a canned outcome
pub struct RecordingTransport {
    response: Mutex<Result<SubmissionOutcome, SubmissionError>>,
    payloads: Mutex<Vec<ReportPayload>>,
    calls: AtomicUsize,
    gate: Option<Arc<Notify>>,
}

impl RecordingTransport {
    pub fn replying(response: Result<SubmissionOutcome, SubmissionError>) -> Self {
        Self {
            response: Mutex::new(response),
            payloads: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn accepting(result: AnalysisResult) -> Self {
        Self::replying(Ok(SubmissionOutcome::Success(result)))
    }

    /// Hold every request until [`release`](Self::release) is called
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Notify::new()));
        self
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn set_response(&self, response: Result<SubmissionOutcome, SubmissionError>) {
        *self.response.lock().unwrap() = response;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn payloads(&self) -> Vec<ReportPayload> {
        self.payloads.lock().unwrap().clone()
    }

    pub fn last_payload(&self) -> Option<ReportPayload> {
        self.payloads.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ReportTransport for RecordingTransport {
    async fn submit_report(
        &self,
        payload: ReportPayload,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.payloads.lock().unwrap().push(payload);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.response.lock().unwrap().clone()
    }
}

/// Points source counting its fetches
#[derive(Default)]
pub struct CountingPoints {
    fetches: AtomicUsize,
    last_user: Mutex<Option<String>>,
}

impl CountingPoints {
    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn last_user(&self) -> Option<String> {
        self.last_user.lock().unwrap().clone()
    }
}

#[async_trait]
impl PointsSource for CountingPoints {
    async fn fetch_points(&self, user_id: &str) -> Result<UserPoints, ApiError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst) as i64 + 1;
        *self.last_user.lock().unwrap() = Some(user_id.to_string());
        Ok(UserPoints {
            points: n * 10,
            total_reports: n,
        })
    }
}
