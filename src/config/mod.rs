//! Configuration management for Promptline
//!
//! This module defines the per-session connection settings, the marker
//! literals the framer recognizes, and the transaction runner tuning knobs,
//! along with validation and file loading support.

pub mod loader;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use zeroize::Zeroize;

/// Main configuration structure for Promptline
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ClientConfig {
    /// Connection and credential settings
    pub connection: ConnectionConfig,

    /// Console marker literals
    pub markers: MarkerConfig,

    /// Transaction runner behavior
    pub runner: RunnerConfig,
}

impl ClientConfig {
    /// Validate the whole configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.connection.validate()?;
        self.markers.validate()?;
        self.runner.validate()?;
        Ok(())
    }
}

/// Connection settings for one console session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Console host name or address
    pub host: String,

    /// Console TCP port
    pub port: u16,

    /// Login username
    pub username: String,

    /// Login password
    pub password: Secret,

    /// Session is considered dead after this many milliseconds without data
    pub idle_timeout_ms: u64,

    /// Upper bound on accumulated response bytes before the session is
    /// declared incompatible with the expected console shape
    pub max_buffer_bytes: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8990,
            username: "jcliadmin".to_string(),
            password: Secret::new("jclipwd"),
            idle_timeout_ms: 5000,
            max_buffer_bytes: 1024 * 1024,
        }
    }
}

impl ConnectionConfig {
    /// Idle timeout as a [`Duration`]
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.is_empty() {
            return Err(ConfigError::EmptyField("connection.host"));
        }
        if self.port == 0 {
            return Err(ConfigError::ZeroPort);
        }
        if self.idle_timeout_ms == 0 {
            return Err(ConfigError::ZeroIdleTimeout);
        }
        if self.max_buffer_bytes < 1024 {
            return Err(ConfigError::BufferTooSmall(self.max_buffer_bytes));
        }
        Ok(())
    }
}

/// Marker literals recognized in the console's output stream
///
/// Defaults target the jcli shell shape; all of them are configurable so the
/// client can drive other consoles of the same general shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerConfig {
    /// Root-level prompt shown when no multi-step edit is in progress
    pub top_prompt: String,

    /// Suffix the trimmed buffer ends with while inside a nested editor
    pub submenu_suffix: String,

    /// Marker emitted after certain commit operations, treated as an
    /// alternate response boundary
    pub session_marker: String,

    /// Marker the console prints when credentials are rejected
    /// (matched case-insensitively)
    pub auth_failure: String,

    /// Login username prompt (matched case-insensitively)
    pub username_prompt: String,

    /// Login password prompt (matched case-insensitively)
    pub password_prompt: String,
}

impl Default for MarkerConfig {
    fn default() -> Self {
        Self {
            top_prompt: "jcli :".to_string(),
            submenu_suffix: ">".to_string(),
            session_marker: "Session ref:".to_string(),
            auth_failure: "incorrect username/password".to_string(),
            username_prompt: "username:".to_string(),
            password_prompt: "password:".to_string(),
        }
    }
}

impl MarkerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.top_prompt.is_empty() {
            return Err(ConfigError::EmptyField("markers.top_prompt"));
        }
        if self.submenu_suffix.is_empty() {
            return Err(ConfigError::EmptyField("markers.submenu_suffix"));
        }
        if self.session_marker.is_empty() {
            return Err(ConfigError::EmptyField("markers.session_marker"));
        }
        if self.auth_failure.is_empty() {
            return Err(ConfigError::EmptyField("markers.auth_failure"));
        }
        if self.username_prompt.is_empty() {
            return Err(ConfigError::EmptyField("markers.username_prompt"));
        }
        if self.password_prompt.is_empty() {
            return Err(ConfigError::EmptyField("markers.password_prompt"));
        }
        Ok(())
    }
}

/// How the transaction runner reacts to a submenu prompt boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SubmenuPolicy {
    /// Treat a submenu prompt exactly like the top prompt; the caller's
    /// command list is assumed to supply the correct next submenu command
    #[default]
    Linear,

    /// Send the escape command before a top-level-looking command whenever
    /// the console is still inside a nested editor
    Recovery,
}

/// Transaction runner tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Submenu boundary policy
    pub submenu_policy: SubmenuPolicy,

    /// Pause between detecting a boundary and sending the next command.
    /// Consoles of this shape can drop input sent immediately after a
    /// prompt transition.
    pub settle_delay_ms: u64,

    /// Keyword that aborts the console's current nested edit
    pub escape_command: String,

    /// Keyword that durably saves console state at the end of a sequence
    pub save_command: String,

    /// Keyword that ends the console session
    pub end_command: String,

    /// Shape of a top-level command, used by the recovery policy to decide
    /// whether the next command belongs at the root prompt
    pub top_level_pattern: String,

    /// Whether the trailing save/end interaction outputs are appended to the
    /// outputs returned from a sequence
    pub include_finalizer_outputs: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            submenu_policy: SubmenuPolicy::Linear,
            settle_delay_ms: 100,
            escape_command: "ko".to_string(),
            save_command: "persist".to_string(),
            end_command: "quit".to_string(),
            top_level_pattern: r"^\S+\s+-[A-Za-z]".to_string(),
            include_finalizer_outputs: true,
        }
    }
}

impl RunnerConfig {
    /// Settle delay as a [`Duration`]
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.settle_delay_ms > 10_000 {
            return Err(ConfigError::SettleDelayOutOfRange(self.settle_delay_ms));
        }
        if self.escape_command.trim().is_empty() {
            return Err(ConfigError::EmptyField("runner.escape_command"));
        }
        if self.save_command.trim().is_empty() {
            return Err(ConfigError::EmptyField("runner.save_command"));
        }
        if self.end_command.trim().is_empty() {
            return Err(ConfigError::EmptyField("runner.end_command"));
        }
        regex::Regex::new(&self.top_level_pattern)
            .map_err(ConfigError::InvalidTopLevelPattern)?;
        Ok(())
    }
}

/// A credential that is zeroed on drop and redacted in Debug output
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    /// Wrap a secret value
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Expose the wrapped value for writing to the console
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Validation and loading errors for [`ClientConfig`]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("field '{0}' must not be empty")]
    EmptyField(&'static str),

    #[error("connection.port must be non-zero")]
    ZeroPort,

    #[error("connection.idle_timeout_ms must be greater than zero")]
    ZeroIdleTimeout,

    #[error("connection.max_buffer_bytes must be at least 1024, got {0}")]
    BufferTooSmall(usize),

    #[error("runner.settle_delay_ms {0} is outside the supported range (0..=10000)")]
    SettleDelayOutOfRange(u64),

    #[error("runner.top_level_pattern is not a valid regex: {0}")]
    InvalidTopLevelPattern(#[source] regex::Error),

    #[error("configuration file not found")]
    NotFound,

    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
