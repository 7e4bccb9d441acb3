//! Conservation statistics view
//!
//! Keeps the logged-in user's points and report count fresh. The watcher
//! listens on the EventBus and re-fetches whenever a report is accepted or the
//! user logs in or out.

use crate::error::ApiError;
use async_trait::async_trait;
use mgw_common::events::{EventBus, MgwEvent};
use mgw_common::session::SessionContext;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Points earned through verified reports
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserPoints {
    pub points: i64,
    pub total_reports: i64,
}

/// Source of per-user statistics
#[async_trait]
pub trait PointsSource: Send + Sync {
    async fn fetch_points(&self, user_id: &str) -> Result<UserPoints, ApiError>;
}

/// Cached statistics for the current session
pub struct StatsWatcher {
    source: Arc<dyn PointsSource>,
    session: Arc<dyn SessionContext>,
    points: RwLock<Option<UserPoints>>,
}

impl StatsWatcher {
    pub fn new(source: Arc<dyn PointsSource>, session: Arc<dyn SessionContext>) -> Self {
        Self {
            source,
            session,
            points: RwLock::new(None),
        }
    }

    /// Last fetched statistics, `None` when logged out or never fetched
    pub async fn points(&self) -> Option<UserPoints> {
        self.points.read().await.clone()
    }

    /// Fetch statistics for the current session
    ///
    /// Logged out clears the cache. A failed fetch keeps the previous values.
    pub async fn refresh(&self) {
        let user_id = match self.session.get_auth() {
            Some(auth) if !auth.user_id.is_empty() => auth.user_id,
            _ => {
                debug!("No session, clearing statistics");
                *self.points.write().await = None;
                return;
            }
        };

        match self.source.fetch_points(&user_id).await {
            Ok(points) => {
                info!(
                    user_id = %user_id,
                    points = points.points,
                    total_reports = points.total_reports,
                    "Statistics refreshed"
                );
                *self.points.write().await = Some(points);
            }
            Err(e) => warn!(user_id = %user_id, error = %e, "Failed to fetch statistics"),
        }
    }

    /// Refresh on every relevant event until the bus closes
    pub async fn run(&self, mut rx: broadcast::Receiver<MgwEvent>) {
        debug!("Stats watcher started");

        loop {
            match rx.recv().await {
                Ok(event) => match event {
                    MgwEvent::ReportsUpdated | MgwEvent::AuthStateChanged { .. } => {
                        debug!(event = event.name(), "Refreshing statistics");
                        self.refresh().await;
                    }
                },
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Stats watcher lagged, refreshing once");
                    self.refresh().await;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!("Event bus closed, stats watcher shutting down");
                    break;
                }
            }
        }
    }

    /// Initial fetch, then follow the bus in a background task
    ///
    /// Subscribes before returning, so events emitted right after `spawn`
    /// are not missed.
    pub fn spawn(self: Arc<Self>, event_bus: &EventBus) -> JoinHandle<()> {
        let rx = event_bus.subscribe();
        tokio::spawn(async move {
            self.refresh().await;
            self.run(rx).await;
        })
    }
}
