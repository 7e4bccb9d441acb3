//! Image and session fixtures

use mgw_common::session::{AuthSession, MemorySession};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// JPEG magic followed by zero padding, `size` bytes in total
///
/// Not decodable, but sniffed as `image/jpeg`.
pub fn jpeg_bytes(size: usize) -> Vec<u8> {
    let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, b'J', b'F', b'I', b'F', 0x00];
    bytes.resize(size.max(bytes.len()), 0);
    bytes
}

/// Write a [`jpeg_bytes`] file into `dir`
pub fn write_jpeg(dir: &Path, name: &str, size: usize) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, jpeg_bytes(size)).unwrap();
    path
}

pub fn ranger() -> AuthSession {
    AuthSession {
        username: "ranger".to_string(),
        email: "ranger@example.org".to_string(),
        user_id: "user-42".to_string(),
    }
}

pub fn logged_in_session() -> Arc<MemorySession> {
    Arc::new(MemorySession::logged_in(ranger()))
}
