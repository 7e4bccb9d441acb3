//! Configuration loading and root folder resolution
//!
//! Bootstrap configuration is read from a TOML file. A missing or unreadable
//! file is never fatal: the client logs a warning and continues on compiled
//! defaults.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable overriding the root folder
pub const ROOT_FOLDER_ENV: &str = "MGW_ROOT_FOLDER";

/// Application directory name under the platform config/data dirs
pub const APP_DIR_NAME: &str = "mangrove-watch";

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Root folder for persisted client state (session file)
    #[serde(default)]
    pub root_folder: Option<PathBuf>,

    /// Base URL of the Mangrove Watch backend
    #[serde(default)]
    pub api_base_url: Option<String>,

    /// Connect timeout for backend requests, in seconds
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// OS-dependent compiled defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: get_default_root_folder(),
            log_level: default_log_level(),
        }
    }
}

/// Root folder resolution
///
/// Priority order:
/// 1. Explicit override (command-line argument)
/// 2. `MGW_ROOT_FOLDER` environment variable
/// 3. `root_folder` from the module's TOML config
/// 4. OS-dependent compiled default
#[derive(Debug, Clone)]
pub struct RootFolderResolver {
    module_name: String,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            toml_root: None,
        }
    }

    /// Use an already loaded TOML config as the third priority source
    pub fn with_toml(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    /// Resolve without a command-line override
    pub fn resolve(&self) -> PathBuf {
        self.resolve_with_override(None)
    }

    pub fn resolve_with_override(&self, cli_arg: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_arg {
            info!(module = %self.module_name, "Root folder: {} (from command line)", path.display());
            return path.to_path_buf();
        }

        if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
            if !path.trim().is_empty() {
                info!(module = %self.module_name, "Root folder: {} (from {})", path, ROOT_FOLDER_ENV);
                return PathBuf::from(path);
            }
        }

        if let Some(path) = &self.toml_root {
            info!(module = %self.module_name, "Root folder: {} (from TOML config)", path.display());
            return path.clone();
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Ensures the root folder exists before state is written into it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    pub fn ensure_directory_exists(&self) -> Result<()> {
        if !self.root_folder.exists() {
            std::fs::create_dir_all(&self.root_folder)?;
            info!("Created root folder: {}", self.root_folder.display());
        }
        Ok(())
    }

    /// Path of the persisted authentication session
    pub fn session_path(&self) -> PathBuf {
        self.root_folder.join("session.json")
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }
}

/// Default TOML config path for a module: `<config dir>/mangrove-watch/<module>.toml`
pub fn config_file_path(module_name: &str) -> Result<PathBuf> {
    dirs::config_dir()
        .map(|d| d.join(APP_DIR_NAME).join(format!("{}.toml", module_name)))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))
}

/// Load a TOML config file
///
/// Missing file yields defaults with a warning. A file that exists but does
/// not parse is reported as a configuration error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        warn!("Config file not found: {} (using defaults)", path.display());
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed: {}", e)))?;
    let config = toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed: {}", e)))?;

    info!("Loaded TOML configuration from {}", path.display());
    Ok(config)
}

/// Get OS-dependent default root folder path
pub fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/mangrove-watch
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/var/lib/mangrove-watch"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/mangrove-watch
        dirs::data_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/mangrove-watch"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\mangrove-watch
        dirs::data_local_dir()
            .map(|d| d.join(APP_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\mangrove-watch"))
    } else {
        PathBuf::from("./mangrove_watch_data")
    }
}
