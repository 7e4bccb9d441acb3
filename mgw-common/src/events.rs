//! Event types for the Mangrove Watch event system
//!
//! Provides the app-wide notification channel. Producers (the report page,
//! the session store) emit events; consumers (the statistics view) subscribe
//! and re-fetch their data.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Mangrove Watch event types
///
/// Events are broadcast via EventBus and can be serialized for logging or
/// forwarding to other processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MgwEvent {
    /// A report was accepted by the backend
    ///
    /// Carries no payload. Listeners re-fetch whatever statistics they show.
    ///
    /// Triggers:
    /// - Stats: Refresh conservation points and report count
    ReportsUpdated,

    /// The user logged in or out
    ///
    /// Triggers:
    /// - Stats: Fetch points for the new user or clear them
    AuthStateChanged {
        /// Whether a session exists after the change
        authenticated: bool,
        /// When the change happened
        timestamp: DateTime<Utc>,
    },
}

impl MgwEvent {
    /// Event name as used by listeners and in logs
    pub fn name(&self) -> &'static str {
        match self {
            MgwEvent::ReportsUpdated => "reportsUpdated",
            MgwEvent::AuthStateChanged { .. } => "authStateChanged",
        }
    }
}

/// Central event distribution bus
///
/// Thin wrapper over `tokio::sync::broadcast`. Cloning the bus yields another
/// handle to the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<MgwEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before dropping old events
    ///
    /// # Examples
    ///
    /// ```
    /// use mgw_common::events::EventBus;
    ///
    /// let event_bus = EventBus::new(64);
    /// assert_eq!(event_bus.capacity(), 64);
    /// ```
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<MgwEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: MgwEvent) -> Result<usize, broadcast::error::SendError<MgwEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    ///
    /// Notifications are fire-and-forget: nobody listening is not an error.
    pub fn emit_lossy(&self, event: MgwEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            tracing::debug!(event = name, "No subscribers for event");
        }
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(64)
    }
}
