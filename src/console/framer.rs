//! Response Framing and Boundary Detection
//!
//! Accumulates console output into a live text buffer and decides when a
//! command's response has finished arriving. The console never announces
//! completion, so the framer watches for prompt-shaped markers instead.
//!
//! Detection is substring-based and therefore heuristic: output that quotes
//! a prompt literal as data will be misclassified. That risk is accepted and
//! kept isolated behind this type so an alternative framer can be swapped in
//! without touching the session or the runner.

use crate::config::MarkerConfig;
use crate::error::{Error, Result};
use crate::models::BoundaryKind;

/// Boundary precedence, first match wins. The top prompt and the session
/// marker are checked before the submenu suffix so a submenu-looking tail
/// that also contains the top prompt is never misclassified.
const BOUNDARY_ORDER: [BoundaryKind; 3] = [
    BoundaryKind::TopPrompt,
    BoundaryKind::SessionMarker,
    BoundaryKind::SubmenuPrompt,
];

/// Frames console responses out of an unbounded byte stream
#[derive(Debug)]
pub struct ResponseFramer {
    /// Marker literals to recognize
    markers: MarkerConfig,
    /// Accumulated unconsumed text
    buffer: String,
    /// Upper bound on accumulated bytes with no recognized boundary
    max_buffer: usize,
}

impl ResponseFramer {
    /// Create a framer for the given marker set
    pub fn new(markers: MarkerConfig, max_buffer: usize) -> Self {
        Self {
            markers,
            buffer: String::new(),
            max_buffer,
        }
    }

    /// Append freshly received text to the live buffer
    ///
    /// Fails with a protocol error when the buffer outgrows `max_buffer`
    /// without any boundary becoming recognizable, which indicates a console
    /// that does not speak the expected shape.
    pub fn push(&mut self, chunk: &str) -> Result<()> {
        self.buffer.push_str(chunk);

        if self.detect().is_none() && self.buffer.len() > self.max_buffer {
            let buffered = self.buffer.len();
            self.buffer.clear();
            return Err(Error::Protocol {
                reason: "no response boundary within the buffer limit".to_string(),
                buffered,
            });
        }

        Ok(())
    }

    /// Scan the whole accumulated buffer for a response boundary
    pub fn detect(&self) -> Option<BoundaryKind> {
        BOUNDARY_ORDER
            .iter()
            .copied()
            .find(|kind| self.matches(*kind))
    }

    /// Consume the buffered response if a boundary has been recognized
    ///
    /// Returns the boundary kind and the text between the echoed command and
    /// the boundary, with the echo and the boundary token stripped. The
    /// buffer is reset, so a second call finds nothing until new data is
    /// pushed.
    pub fn take_response(&mut self, sent: &str) -> Option<(BoundaryKind, String)> {
        let kind = self.detect()?;
        let raw = self.extract(kind);
        let output = strip_echo(&raw, sent);
        self.buffer.clear();
        debug!(boundary = ?kind, bytes = output.len(), "response framed");
        Some((kind, output))
    }

    /// Discard everything accumulated so far
    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Number of unconsumed bytes in the buffer
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Whether the buffer currently holds nothing
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn matches(&self, kind: BoundaryKind) -> bool {
        match kind {
            BoundaryKind::TopPrompt => self.buffer.contains(&self.markers.top_prompt),
            BoundaryKind::SessionMarker => self.buffer.contains(&self.markers.session_marker),
            BoundaryKind::SubmenuPrompt => self
                .buffer
                .trim_end()
                .ends_with(&self.markers.submenu_suffix),
            // Never matched from buffered text; produced by the runner when
            // the peer closes the stream on the session-ending command.
            BoundaryKind::Disconnect => false,
        }
    }

    /// Cut the buffered text at the recognized boundary
    fn extract(&self, kind: BoundaryKind) -> String {
        match kind {
            BoundaryKind::TopPrompt => {
                let idx = self
                    .buffer
                    .find(&self.markers.top_prompt)
                    .unwrap_or(self.buffer.len());
                self.buffer[..idx].to_string()
            }
            BoundaryKind::SessionMarker => {
                let idx = self
                    .buffer
                    .find(&self.markers.session_marker)
                    .unwrap_or(self.buffer.len());
                self.buffer[..idx].to_string()
            }
            BoundaryKind::SubmenuPrompt => {
                // The final physical line is the submenu prompt itself
                let trimmed = self.buffer.trim_end();
                match trimmed.rfind('\n') {
                    Some(idx) => trimmed[..idx].to_string(),
                    None => String::new(),
                }
            }
            BoundaryKind::Disconnect => self.buffer.clone(),
        }
    }
}

/// Remove the console's echo of the sent command from the response head
///
/// The console reflects the sent line as the first physical line of its
/// reply, sometimes more than once when the link is in remote-echo mode.
pub(crate) fn strip_echo(text: &str, sent: &str) -> String {
    let sent = sent.trim();
    let mut lines: Vec<&str> = text.lines().collect();

    if !sent.is_empty() {
        while lines.first().is_some_and(|first| first.trim() == sent) {
            lines.remove(0);
        }
    }

    lines.join("\n").trim().to_string()
}

/// Utilities for response text cleanup
pub mod utils {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static ANSI_CODES: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\x1b\[[0-9;]*[A-Za-z]").unwrap());

    /// Strip ANSI escape sequences from console output
    ///
    /// The reference console emits plain text, but colorized consoles of the
    /// same shape would otherwise hide their prompts from the marker scan.
    pub fn strip_ansi_codes(text: &str) -> String {
        if !text.contains('\x1b') {
            return text.to_string();
        }
        ANSI_CODES.replace_all(text, "").to_string()
    }
}
