//! Error types and Result aliases for Promptline

use std::fmt;
use std::time::Duration;

/// Result type alias for Promptline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Promptline
#[derive(Debug)]
pub enum Error {
    // === Session errors ===
    /// The console rejected the configured credentials
    AuthenticationFailed {
        reason: String,
    },

    /// TCP connect to the console failed
    ConnectFailed {
        host: String,
        port: u16,
        reason: String,
    },

    /// Socket-level failure after the connection was established
    Transport {
        reason: String,
    },

    /// No bytes arrived within the idle timeout
    Timeout {
        duration: Duration,
    },

    /// The console never produced a recognizable response boundary
    Protocol {
        reason: String,
        buffered: usize,
    },

    /// The operation was cancelled through a cancellation token
    Cancelled,

    /// A command was issued against a session that is not ready for one
    SessionNotReady {
        state: String,
    },

    // === Command errors ===
    /// Empty command
    EmptyCommand,

    // === Configuration errors ===
    /// Configuration validation or loading failed
    Config(crate::config::ConfigError),

    // === I/O and serialization errors (kept for compatibility) ===
    /// I/O errors
    Io(std::io::Error),

    /// Serialization errors
    Serde(serde_json::Error),

    /// TOML parsing errors
    Toml(toml::de::Error),

    /// Regex compilation errors
    Regex(regex::Error),

    // === Generic fallback (use sparingly) ===
    /// Generic errors (for cases not yet categorized)
    Other(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // Session errors
            Error::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {}", reason)
            }
            Error::ConnectFailed { host, port, reason } => {
                write!(f, "Failed to connect to console at {}:{}: {}", host, port, reason)
            }
            Error::Transport { reason } => {
                write!(f, "Transport error: {}", reason)
            }
            Error::Timeout { duration } => {
                write!(f, "Console produced no data within {:?}", duration)
            }
            Error::Protocol { reason, buffered } => {
                write!(f, "Protocol error: {} ({} bytes buffered)", reason, buffered)
            }
            Error::Cancelled => {
                write!(f, "Operation cancelled")
            }
            Error::SessionNotReady { state } => {
                write!(f, "Session is not ready for a command (state: {})", state)
            }

            // Command errors
            Error::EmptyCommand => {
                write!(f, "Command cannot be empty")
            }

            // Configuration errors
            Error::Config(err) => write!(f, "Configuration error: {}", err),

            // I/O and serialization errors
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::Serde(err) => write!(f, "Serialization error: {}", err),
            Error::Toml(err) => write!(f, "TOML parsing error: {}", err),
            Error::Regex(err) => write!(f, "Regex compilation error: {}", err),

            // Generic fallback
            Error::Other(msg) => write!(f, "Error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Error::Config(err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serde(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Toml(err)
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Error::Regex(err)
    }
}

impl From<Box<dyn std::error::Error>> for Error {
    fn from(err: Box<dyn std::error::Error>) -> Self {
        Error::Other(err.to_string())
    }
}

impl From<String> for Error {
    fn from(err: String) -> Self {
        Error::Other(err)
    }
}

impl From<&str> for Error {
    fn from(err: &str) -> Self {
        Error::Other(err.to_string())
    }
}
