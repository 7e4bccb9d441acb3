//! Configuration resolution for mgw-report
//!
//! Backend URL priority: command line → `MGW_API_BASE_URL` → TOML → compiled
//! default. Root folder resolution is delegated to mgw-common.

use crate::client::{DEFAULT_API_BASE_URL, DEFAULT_CONNECT_TIMEOUT};
use mgw_common::config::{RootFolderResolver, TomlConfig};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Module name used for the TOML file and logging
pub const MODULE_NAME: &str = "mgw-report";

/// Environment variable overriding the backend URL
pub const API_BASE_URL_ENV: &str = "MGW_API_BASE_URL";

/// Fully resolved client configuration
#[derive(Debug, Clone, PartialEq)]
pub struct ReportConfig {
    pub api_base_url: String,
    pub connect_timeout: Duration,
    pub root_folder: PathBuf,
    pub log_level: String,
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub root_folder: Option<PathBuf>,
}

impl ReportConfig {
    pub fn resolve(overrides: &ConfigOverrides, toml_config: &TomlConfig) -> Self {
        let api_base_url = resolve_api_base_url(overrides.api_base_url.as_deref(), toml_config);
        let root_folder = RootFolderResolver::new(MODULE_NAME)
            .with_toml(toml_config)
            .resolve_with_override(overrides.root_folder.as_deref());
        let connect_timeout = toml_config
            .connect_timeout_secs
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_CONNECT_TIMEOUT);

        Self {
            api_base_url,
            connect_timeout,
            root_folder,
            log_level: toml_config.logging.level.clone(),
        }
    }

    pub fn session_path(&self) -> PathBuf {
        session_path_in(&self.root_folder)
    }
}

fn session_path_in(root: &Path) -> PathBuf {
    mgw_common::config::RootFolderInitializer::new(root.to_path_buf()).session_path()
}

/// Resolve the backend URL from the available sources
pub fn resolve_api_base_url(cli: Option<&str>, toml_config: &TomlConfig) -> String {
    let env_url = std::env::var(API_BASE_URL_ENV).ok();
    let candidates = [
        ("command line", cli.map(str::to_string)),
        ("environment", env_url),
        ("TOML", toml_config.api_base_url.clone()),
    ];

    let sources: Vec<&str> = candidates
        .iter()
        .filter(|(_, v)| v.as_deref().is_some_and(is_valid_url))
        .map(|(name, _)| *name)
        .collect();
    if sources.len() > 1 {
        warn!(
            "Backend URL found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    for (source, value) in candidates {
        if let Some(url) = value.filter(|v| is_valid_url(v)) {
            let url = url.trim().to_string();
            info!(source, url = %url, "Backend URL loaded");
            return url;
        }
    }

    DEFAULT_API_BASE_URL.to_string()
}

/// Accept only non-blank http(s) URLs
pub fn is_valid_url(url: &str) -> bool {
    let url = url.trim();
    url.starts_with("http://") || url.starts_with("https://")
}
