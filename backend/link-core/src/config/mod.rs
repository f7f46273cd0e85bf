use crate::error::config::ConfigError;
use crate::launcher::compile_ready_pattern;
use crate::protocol::DEFAULT_MAX_MESSAGE_BYTES;
use crate::{DEFAULT_PEER_COMMAND, DEFAULT_PORT, DEFAULT_READY_PATTERN};

use common::ErrorLocation;

use std::env;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "jvmlink.toml";
const CONFIG_DIR_NAME: &str = "jvmlink";
const CONFIG_VERSION: u32 = 1;

pub const ENV_PORT: &str = "JVMLINK_PORT";
pub const ENV_PEER_COMMAND: &str = "JVMLINK_PEER_COMMAND";
pub const ENV_PEER_DIR: &str = "JVMLINK_PEER_DIR";
pub const ENV_LAUNCH: &str = "JVMLINK_LAUNCH";

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_io_timeout_ms")]
    pub io_timeout_ms: u64,
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            io_timeout_ms: default_io_timeout_ms(),
            max_message_bytes: default_max_message_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeerConfig {
    /// Launch the peer ourselves; when false the client attaches to a running one.
    #[serde(default = "default_launch")]
    pub launch: bool,
    #[serde(default = "default_command")]
    pub command: String,
    #[serde(default)]
    pub working_dir: Option<PathBuf>,
    #[serde(default = "default_startup_timeout_ms")]
    pub startup_timeout_ms: u64,
    #[serde(default = "default_ready_pattern")]
    pub ready_pattern: String,
    #[serde(default = "default_shutdown_grace_ms")]
    pub shutdown_grace_ms: u64,
}

impl Default for PeerConfig {
    fn default() -> Self {
        Self {
            launch: default_launch(),
            command: default_command(),
            working_dir: None,
            startup_timeout_ms: default_startup_timeout_ms(),
            ready_pattern: default_ready_pattern(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LinkConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub connection: ConnectionConfig,

    #[serde(default)]
    pub peer: PeerConfig,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            connection: ConnectionConfig::default(),
            peer: PeerConfig::default(),
        }
    }
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_version() -> u32 {
    CONFIG_VERSION
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_connect_timeout_ms() -> u64 {
    5_000
}
fn default_io_timeout_ms() -> u64 {
    30_000
}
fn default_max_message_bytes() -> usize {
    DEFAULT_MAX_MESSAGE_BYTES
}
fn default_launch() -> bool {
    true
}
fn default_command() -> String {
    DEFAULT_PEER_COMMAND.to_string()
}
fn default_startup_timeout_ms() -> u64 {
    30_000
}
fn default_ready_pattern() -> String {
    DEFAULT_READY_PATTERN.to_string()
}
fn default_shutdown_grace_ms() -> u64 {
    2_000
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ConnectionConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

impl PeerConfig {
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_millis(self.startup_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl LinkConfig {
    /// Load config from {config_dir}/jvmlink.toml.
    ///
    /// # Returns
    ///
    /// Returns `Ok(LinkConfig)` if loaded successfully or defaults if the file is missing.
    /// Returns `Err(ConfigError)` if the file exists but cannot be read, parsed or validated.
    pub fn load(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            info!(
                "Config file not found at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }

        let config = Self::load_from_path(&config_path)?;
        info!("Config loaded from {}", config_path.display());
        Ok(config)
    }

    /// Load from a specific file.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: LinkConfig = toml::from_str(&contents).map_err(|e| {
            warn!("Failed to parse {}: {e}", path.display());
            ConfigError::ParseError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save config to {config_dir}/jvmlink.toml using a temp file and rename.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        self.validate()?;

        std::fs::create_dir_all(config_dir).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_dir.to_path_buf(),
            source: e,
        })?;

        let config_path = config_dir.join(CONFIG_FILE_NAME);
        let temp_path = config_dir.join(format!("{CONFIG_FILE_NAME}.tmp"));

        let contents =
            toml::to_string_pretty(self).map_err(|e| ConfigError::SerializeError {
                location: ErrorLocation::from(Location::caller()),
                reason: e.to_string(),
            })?;

        std::fs::write(&temp_path, contents).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: temp_path.clone(),
            source: e,
        })?;

        std::fs::rename(&temp_path, &config_path).map_err(|e| ConfigError::WriteError {
            location: ErrorLocation::from(Location::caller()),
            path: config_path.clone(),
            source: e,
        })?;

        info!("Config saved to {}", config_path.display());
        Ok(())
    }

    /// Override values from `JVMLINK_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if a variable is set but unparsable,
    /// or if the resulting config is invalid.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(port) = env::var(ENV_PORT) {
            self.connection.port = port.trim().parse().map_err(|e| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("{ENV_PORT}='{port}' is not a valid port: {e}"),
            })?;
            info!("Port overridden by {ENV_PORT}: {}", self.connection.port);
        }

        if let Ok(command) = env::var(ENV_PEER_COMMAND) {
            info!("Peer command overridden by {ENV_PEER_COMMAND}");
            self.peer.command = command;
        }

        if let Ok(dir) = env::var(ENV_PEER_DIR) {
            info!("Peer working directory overridden by {ENV_PEER_DIR}: {dir}");
            self.peer.working_dir = Some(PathBuf::from(dir));
        }

        if let Ok(launch) = env::var(ENV_LAUNCH) {
            self.peer.launch = match launch.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(ConfigError::ValidationError {
                        location: ErrorLocation::from(Location::caller()),
                        reason: format!("{ENV_LAUNCH}='{other}' is not a boolean"),
                    });
                }
            };
        }

        self.validate()
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version == 0 || self.version > CONFIG_VERSION {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!(
                    "Invalid version: {} (expected 1-{})",
                    self.version, CONFIG_VERSION
                ),
            });
        }

        if self.connection.port == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "connection.port must be non-zero".to_string(),
            });
        }

        if self.connection.connect_timeout_ms == 0 || self.connection.io_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "connection timeouts must be non-zero".to_string(),
            });
        }

        if self.connection.max_message_bytes == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "connection.max_message_bytes must be non-zero".to_string(),
            });
        }

        if self.peer.launch && self.peer.command.trim().is_empty() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "peer.command cannot be empty when peer.launch is set".to_string(),
            });
        }

        if self.peer.startup_timeout_ms == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "peer.startup_timeout_ms must be non-zero".to_string(),
            });
        }

        compile_ready_pattern(&self.peer.ready_pattern).map_err(|e| {
            ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: e.to_string(),
            }
        })?;

        Ok(())
    }
}

/// `<platform config dir>/jvmlink`.
#[track_caller]
pub fn default_config_dir() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME))
        .ok_or_else(|| ConfigError::DirectoryNotFound {
            location: ErrorLocation::from(Location::caller()),
            reason: "Platform has no user config directory".to_string(),
        })
}

/// Load `.env` from the working directory, then from the executable's directory.
///
/// Returns the path that was loaded, if any.
pub fn load_dotenv() -> Option<PathBuf> {
    if let Ok(path) = dotenvy::dotenv() {
        info!("Loaded .env from: {}", path.display());
        return Some(path);
    }

    let exe_dir = env::current_exe().ok()?.parent()?.to_path_buf();
    let env_path = exe_dir.join(".env");
    if !env_path.exists() {
        return None;
    }

    match dotenvy::from_path(&env_path) {
        Ok(()) => {
            info!("Loaded .env from: {}", env_path.display());
            Some(env_path)
        }
        Err(e) => {
            warn!("Failed to parse .env at {}: {e}", env_path.display());
            None
        }
    }
}
