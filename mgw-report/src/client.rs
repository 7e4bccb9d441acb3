//! Mangrove Watch backend client
//!
//! Endpoints used:
//! - `POST /run-pipeline` (multipart) for report ingestion
//! - `GET /user/points?user_id=...` for the user's conservation points
//! - `GET /` health check

use crate::error::{ApiError, SubmissionError};
use crate::geolocation::Coordinates;
use crate::outcome::{parse_pipeline_response, SubmissionOutcome};
use crate::stats::{PointsSource, UserPoints};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use std::time::Duration;

/// Default backend
pub const DEFAULT_API_BASE_URL: &str = "https://mangrove-watch.onrender.com";

/// Default connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("mangrove-watch/", env!("CARGO_PKG_VERSION"));

/// Literal `mode` field for image reports
pub const REPORT_MODE_IMAGE: &str = "image";

/// Everything sent for one report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportPayload {
    pub image: Vec<u8>,
    pub file_name: String,
    pub mime_type: String,
    pub description: String,
    pub user_id: Option<String>,
    pub coordinates: Option<Coordinates>,
}

impl ReportPayload {
    /// Text fields in the order they are sent
    pub fn text_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("mode", REPORT_MODE_IMAGE.to_string()),
            ("description", self.description.clone()),
        ];
        if let Some(user_id) = &self.user_id {
            fields.push(("user_id", user_id.clone()));
        }
        if let Some(coords) = self.coordinates {
            fields.push(("latitude", coords.latitude.to_string()));
            fields.push(("longitude", coords.longitude.to_string()));
        }
        fields
    }
}

/// Report-ingestion endpoint
#[async_trait]
pub trait ReportTransport: Send + Sync {
    /// Send one report and narrow the response
    ///
    /// `Ok(Failure)` means the backend answered but refused the report.
    async fn submit_report(
        &self,
        payload: ReportPayload,
    ) -> Result<SubmissionOutcome, SubmissionError>;
}

#[derive(Debug, Deserialize)]
struct PointsResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<UserPoints>,
}

#[derive(Debug, Deserialize)]
struct HealthResponse {
    message: String,
}

/// HTTP client for the Mangrove Watch backend
#[derive(Debug, Clone)]
pub struct ApiClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, connect_timeout: Duration) -> Result<Self, ApiError> {
        // No overall request timeout: a slow analysis pipeline is not a failure
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn build_form(payload: ReportPayload) -> Result<Form, SubmissionError> {
        let fields = payload.text_fields();
        let image = Part::bytes(payload.image)
            .file_name(payload.file_name)
            .mime_str(&payload.mime_type)
            .map_err(|e| SubmissionError::Transport(format!("invalid image type: {}", e)))?;

        let mut form = Form::new().part("image", image);
        for (name, value) in fields {
            form = form.text(name, value);
        }
        Ok(form)
    }

    /// Backend liveness message
    pub async fn health(&self) -> Result<String, ApiError> {
        let response = self
            .http_client
            .get(self.url("/"))
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Status(status.as_u16(), error_text));
        }

        let health: HealthResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;
        Ok(health.message)
    }
}

#[async_trait]
impl ReportTransport for ApiClient {
    async fn submit_report(
        &self,
        payload: ReportPayload,
    ) -> Result<SubmissionOutcome, SubmissionError> {
        let size = payload.image.len();
        let with_coordinates = payload.coordinates.is_some();
        let form = Self::build_form(payload)?;

        tracing::debug!(size, with_coordinates, "Posting report to pipeline");

        let response = self
            .http_client
            .post(self.url("/run-pipeline"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| SubmissionError::Transport(e.to_string()))?;

        if !status.is_success() {
            // Prefer the backend's own explanation when it sent one
            return match parse_pipeline_response(&body) {
                Ok(SubmissionOutcome::Failure(msg)) if !msg.trim().is_empty() => {
                    Err(SubmissionError::Rejected(msg))
                }
                _ => Err(SubmissionError::Transport(format!("HTTP {}", status.as_u16()))),
            };
        }

        parse_pipeline_response(&body)
    }
}

#[async_trait]
impl PointsSource for ApiClient {
    async fn fetch_points(&self, user_id: &str) -> Result<UserPoints, ApiError> {
        let response = self
            .http_client
            .get(self.url("/user/points"))
            .query(&[("user_id", user_id)])
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Status(status.as_u16(), error_text));
        }

        let points: PointsResponse = response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        match (points.status.as_str(), points.data) {
            ("success", Some(data)) => Ok(data),
            ("success", None) => Err(ApiError::Parse("missing data".to_string())),
            _ => Err(ApiError::Failed(points.message.unwrap_or(points.status))),
        }
    }
}
