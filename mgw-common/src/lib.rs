//! # Mangrove Watch Common Library
//!
//! Shared code for all Mangrove Watch clients including:
//! - Common error type
//! - Event types (MgwEvent enum) and the app-wide EventBus
//! - Configuration loading and root folder resolution
//! - Authentication session context

pub mod config;
pub mod error;
pub mod events;
pub mod session;

pub use error::{Error, Result};
pub use events::{EventBus, MgwEvent};
pub use session::{AuthSession, MemorySession, SessionContext, SessionStore};
