//! Geolocation Advisory
//!
//! Best-effort, one-shot device position. The result is only ever advice: a
//! failure becomes a message for the user and the report is sent without
//! coordinates.

use crate::error::GeolocationAdvisoryError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default position timeout
pub const LOCATION_TIMEOUT: Duration = Duration::from_secs(10);

/// WGS84 position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// Options passed to the platform location API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    pub enable_high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest cached position the platform may return; zero disables reuse
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            enable_high_accuracy: true,
            timeout: LOCATION_TIMEOUT,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Platform location API
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationAdvisoryError>;
}

/// Platform without a location API
#[derive(Debug, Clone, Copy, Default)]
pub struct UnsupportedLocation;

#[async_trait]
impl LocationProvider for UnsupportedLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationAdvisoryError> {
        Err(GeolocationAdvisoryError::Unsupported)
    }
}

/// Provider reporting a position supplied up front
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Coordinates);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<Coordinates, GeolocationAdvisoryError> {
        Ok(self.0)
    }
}

/// Holds the last position request's outcome
#[derive(Debug, Clone, Default)]
pub struct GeolocationAdvisory {
    options: PositionOptions,
    coordinates: Option<Coordinates>,
    advisory: Option<String>,
}

impl GeolocationAdvisory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: PositionOptions) -> Self {
        Self {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &PositionOptions {
        &self.options
    }

    /// Ask the provider once and keep the outcome
    pub async fn request_location(&mut self, provider: &dyn LocationProvider) -> Option<Coordinates> {
        let result = locate(provider, &self.options).await;
        self.apply(result);
        self.coordinates
    }

    /// Record the outcome of a position request
    pub fn apply(&mut self, result: Result<Coordinates, GeolocationAdvisoryError>) {
        match result {
            Ok(coords) => {
                info!(
                    latitude = coords.latitude,
                    longitude = coords.longitude,
                    "Device location acquired"
                );
                self.coordinates = Some(coords);
                self.advisory = None;
            }
            Err(e) => {
                warn!(error = %e, "Device location unavailable");
                self.coordinates = None;
                self.advisory = Some(e.to_string());
            }
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn advisory_message(&self) -> Option<&str> {
        self.advisory.as_deref()
    }

    pub fn clear(&mut self) {
        self.coordinates = None;
        self.advisory = None;
    }
}

/// One position request, bounded by `options.timeout`
pub async fn locate(
    provider: &dyn LocationProvider,
    options: &PositionOptions,
) -> Result<Coordinates, GeolocationAdvisoryError> {
    debug!(timeout = ?options.timeout, high_accuracy = options.enable_high_accuracy, "Requesting device location");
    match tokio::time::timeout(options.timeout, provider.current_position(options)).await {
        Ok(result) => result,
        Err(_) => Err(GeolocationAdvisoryError::Timeout),
    }
}
