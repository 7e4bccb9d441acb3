//! Ephemeral preview handles
//!
//! A preview handle is the display URL for the image currently on the form.
//! Handles are registered in a [`PreviewRegistry`] and revoke themselves on
//! drop, so replacing or discarding an image always releases its preview.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};
use uuid::Uuid;

/// Registry of live preview handles
#[derive(Debug, Clone, Default)]
pub struct PreviewRegistry {
    live: Arc<Mutex<HashSet<Uuid>>>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new handle
    pub fn create(&self) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        tracing::trace!(%id, "Preview handle created");
        PreviewHandle {
            id,
            url: format!("blob:mangrove-watch/{}", id),
            registry: self.clone(),
        }
    }

    /// Number of handles not yet released
    pub fn live_count(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_live(&self, handle_url: &str) -> bool {
        handle_url
            .rsplit('/')
            .next()
            .and_then(|id| Uuid::parse_str(id).ok())
            .map(|id| {
                self.live
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .contains(&id)
            })
            .unwrap_or(false)
    }

    fn revoke(&self, id: &Uuid) {
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        tracing::trace!(%id, "Preview handle revoked");
    }
}

/// Display handle for one image; revoked when dropped
#[derive(Debug)]
pub struct PreviewHandle {
    id: Uuid,
    url: String,
    registry: PreviewRegistry,
}

impl PreviewHandle {
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.registry.revoke(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_is_live_until_dropped() {
        let registry = PreviewRegistry::new();
        let handle = registry.create();
        let url = handle.url().to_string();

        assert!(url.starts_with("blob:mangrove-watch/"));
        assert!(registry.is_live(&url));
        assert_eq!(registry.live_count(), 1);

        drop(handle);
        assert!(!registry.is_live(&url));
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_handles_are_unique() {
        let registry = PreviewRegistry::new();
        let a = registry.create();
        let b = registry.create();
        assert_ne!(a.url(), b.url());
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_unknown_url_is_not_live() {
        let registry = PreviewRegistry::new();
        assert!(!registry.is_live("blob:mangrove-watch/not-a-uuid"));
    }
}
