//! Test Helper Utilities
//!
//! Shared doubles, fixtures and a local backend for testing mgw-report

#![allow(dead_code)]

pub mod fixtures;
pub mod mocks;
pub mod test_server;

pub use fixtures::{jpeg_bytes, logged_in_session, ranger, write_jpeg};
pub use mocks::{CountingPoints, GatedLocation, MockCamera, RecordingTransport};
pub use test_server::{RecordedField, TestBackend};
