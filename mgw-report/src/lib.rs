//! mgw-report library interface
//!
//! Report submission flow for Mangrove Watch:
//! - [`capture`]: camera / file-picker image acquisition
//! - [`geolocation`]: best-effort device position
//! - [`coordinator`]: validation, upload and outcome feedback
//! - [`page`]: lifecycle wrapper composing the three
//! - [`stats`]: conservation points view refreshed on `ReportsUpdated`

pub mod capture;
pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod geolocation;
pub mod outcome;
pub mod page;
pub mod stats;

pub use crate::capture::{CaptureMode, CaptureSourceManager, ImageOrigin, SelectedFile};
pub use crate::client::{ApiClient, ReportPayload, ReportTransport};
pub use crate::coordinator::{SubmissionCoordinator, SubmissionState, SubmitResult, Toast, ToastKind};
pub use crate::error::{ReportError, SubmissionError};
pub use crate::geolocation::{Coordinates, GeolocationAdvisory, LocationProvider};
pub use crate::outcome::{outcome_message, AnalysisResult, CoordinateSource, SubmissionOutcome};
pub use crate::page::ReportPage;
pub use crate::stats::{PointsSource, StatsWatcher, UserPoints};
