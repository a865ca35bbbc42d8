//! Command Result Model
//!
//! Represents one executed console command together with its framed output
//! and the boundary that terminated the response. Results are immutable
//! once produced by the transaction runner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of boundary that terminated a command's response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    /// The console returned to its root prompt
    TopPrompt,

    /// The console emitted its post-commit session marker before any prompt
    SessionMarker,

    /// The console is waiting inside a nested object-creation editor
    SubmenuPrompt,

    /// The console closed the stream; produced only for the session-ending
    /// command, never for a caller-supplied command
    Disconnect,
}

impl BoundaryKind {
    /// Whether this boundary leaves the console at its root context
    pub fn is_top_level(self) -> bool {
        matches!(self, BoundaryKind::TopPrompt | BoundaryKind::SessionMarker)
    }
}

/// One executed command and its framed output
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResult {
    /// The command text that was sent
    pub command: String,

    /// Text between the echoed command and the recognized boundary,
    /// with the echo and the boundary token stripped
    pub raw_output: String,

    /// Boundary that terminated the response
    pub boundary: BoundaryKind,

    /// When the boundary was recognized
    pub completed_at: DateTime<Utc>,
}

impl CommandResult {
    /// Create a new command result
    pub fn new(command: impl Into<String>, raw_output: impl Into<String>, boundary: BoundaryKind) -> Self {
        Self {
            command: command.into(),
            raw_output: raw_output.into(),
            boundary,
            completed_at: Utc::now(),
        }
    }

    /// Iterate over the output lines
    pub fn lines(&self) -> std::str::Lines<'_> {
        self.raw_output.lines()
    }

    /// Whether the command left the console inside a nested editor
    pub fn left_submenu_open(&self) -> bool {
        self.boundary == BoundaryKind::SubmenuPrompt
    }
}
