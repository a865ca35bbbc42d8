//! Console Session State Machine
//!
//! Drives a freshly connected transport through the console's login dialogue
//! to a ready state, then carries commands for the transaction runner. Login
//! prompts arrive with unpredictable byte timing, so every transition
//! re-scans the entire accumulated buffer rather than assuming one read
//! equals one line; per-chunk matching would miss prompts split across
//! reads.

use std::time::Duration;
use uuid::Uuid;

use crate::config::ClientConfig;
use crate::console::cancel::CancelToken;
use crate::console::framer::utils::strip_ansi_codes;
use crate::error::{Error, Result};
use crate::transport::{StreamTransport, Transport};

/// Lifecycle states of a console session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// TCP connection established, handshake not started
    Connecting,
    /// Waiting for the console's username prompt
    AuthAwaitUser,
    /// Waiting for the password prompt or the login outcome
    AuthAwaitPass,
    /// Authenticated and sitting at a prompt
    Ready,
    /// A command is awaiting its response boundary
    Executing,
    /// The session died; the transport is no longer usable
    Failed,
    /// The session ended and the transport was shut down
    Closed,
}

/// Outcome of one cancel- and timeout-aware transport read
enum ReadOutcome {
    Cancelled,
    TimedOut,
    Data(Result<Vec<u8>>),
}

/// One live console connection
///
/// A session is created per façade call and never reused; a stuck session
/// cannot poison a later call. The transport is torn down whenever the
/// session enters a terminal state.
pub struct Session {
    /// Identifier for log correlation
    id: Uuid,
    /// Underlying byte stream
    transport: Box<dyn Transport>,
    /// Session configuration
    config: ClientConfig,
    /// Optional cancellation signal observed at every await point
    cancel: Option<CancelToken>,
    /// Current lifecycle state
    state: SessionState,
    /// Accumulated unconsumed handshake text
    buffer: String,
    /// Command currently awaiting a response, if any
    pending_command: Option<String>,
}

impl Session {
    /// Open a TCP connection to the configured console
    pub async fn connect(config: &ClientConfig, cancel: Option<CancelToken>) -> Result<Self> {
        let conn = &config.connection;
        info!(host = %conn.host, port = conn.port, "connecting to console");

        let transport =
            StreamTransport::connect(&conn.host, conn.port, conn.idle_timeout()).await?;
        Ok(Self::over(Box::new(transport), config.clone(), cancel))
    }

    /// Build a session over an already connected transport
    pub fn over(
        transport: Box<dyn Transport>,
        config: ClientConfig,
        cancel: Option<CancelToken>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            transport,
            config,
            cancel,
            state: SessionState::Connecting,
            buffer: String::new(),
            pending_command: None,
        }
    }

    /// Drive the login dialogue to a ready prompt
    pub async fn authenticate(&mut self) -> Result<()> {
        if self.state != SessionState::Connecting {
            return Err(Error::SessionNotReady {
                state: format!("{:?}", self.state),
            });
        }

        let username = self.config.connection.username.clone();
        let password = self.config.connection.password.clone();
        let username_prompt = self.config.markers.username_prompt.to_lowercase();
        let password_prompt = self.config.markers.password_prompt.to_lowercase();
        let auth_failure = self.config.markers.auth_failure.to_lowercase();
        let top_prompt = self.config.markers.top_prompt.clone();

        debug!(session = %self.id, "starting console handshake");

        // Nudge the console into printing its first prompt
        self.transport.write_all(b"\n").await?;
        self.state = SessionState::AuthAwaitUser;

        loop {
            let chunk = self.read_chunk().await?;
            self.buffer.push_str(&chunk);

            if self.buffer.len() > self.config.connection.max_buffer_bytes {
                let buffered = self.buffer.len();
                self.state = SessionState::Failed;
                return Err(Error::Protocol {
                    reason: "no login prompt within the buffer limit".to_string(),
                    buffered,
                });
            }

            let lowered = self.buffer.to_lowercase();

            match self.state {
                SessionState::AuthAwaitUser => {
                    if lowered.contains(&username_prompt) {
                        debug!(session = %self.id, "username prompt received");
                        self.write_line(&username).await?;
                        self.buffer.clear();
                        self.state = SessionState::AuthAwaitPass;
                    } else if self.buffer.contains(&top_prompt) {
                        // Console that skips authentication entirely
                        self.buffer.clear();
                        self.state = SessionState::Ready;
                        info!(session = %self.id, "console session ready (no login required)");
                        return Ok(());
                    } else if lowered.contains(&auth_failure) {
                        self.state = SessionState::Failed;
                        return Err(Error::AuthenticationFailed {
                            reason: "credentials rejected by console".to_string(),
                        });
                    }
                }
                SessionState::AuthAwaitPass => {
                    if lowered.contains(&auth_failure) {
                        warn!(session = %self.id, "console rejected the configured credentials");
                        self.state = SessionState::Failed;
                        return Err(Error::AuthenticationFailed {
                            reason: "credentials rejected by console".to_string(),
                        });
                    } else if self.buffer.contains(&top_prompt) {
                        self.buffer.clear();
                        self.state = SessionState::Ready;
                        info!(session = %self.id, "console session ready");
                        return Ok(());
                    } else if lowered.contains(&password_prompt) {
                        debug!(session = %self.id, "password prompt received");
                        self.write_line(password.reveal()).await?;
                        self.buffer.clear();
                    }
                }
                state => {
                    self.state = SessionState::Failed;
                    return Err(Error::Other(format!(
                        "handshake in unexpected state {:?}",
                        state
                    )));
                }
            }
        }
    }

    /// Send a command line and mark the session as executing it
    pub(crate) async fn begin_command(&mut self, command: &str) -> Result<()> {
        if self.state != SessionState::Ready {
            return Err(Error::SessionNotReady {
                state: format!("{:?}", self.state),
            });
        }

        debug!(session = %self.id, command, "sending command");
        self.write_line(command).await?;
        self.state = SessionState::Executing;
        self.pending_command = Some(command.to_string());
        Ok(())
    }

    /// Mark the pending command's response as fully framed
    pub(crate) fn complete_command(&mut self) {
        self.state = SessionState::Ready;
        self.pending_command = None;
    }

    /// Read the next chunk of console output
    ///
    /// Observes the idle timeout and the cancellation token; either failure
    /// moves the session to a terminal state.
    pub(crate) async fn read_chunk(&mut self) -> Result<String> {
        let idle = self.config.connection.idle_timeout();

        let outcome = {
            let transport = self.transport.as_mut();
            match self.cancel.as_mut() {
                Some(token) => {
                    tokio::select! {
                        _ = token.cancelled() => ReadOutcome::Cancelled,
                        res = tokio::time::timeout(idle, transport.read_chunk()) => match res {
                            Ok(inner) => ReadOutcome::Data(inner),
                            Err(_) => ReadOutcome::TimedOut,
                        },
                    }
                }
                None => match tokio::time::timeout(idle, transport.read_chunk()).await {
                    Ok(inner) => ReadOutcome::Data(inner),
                    Err(_) => ReadOutcome::TimedOut,
                },
            }
        };

        match outcome {
            ReadOutcome::Cancelled => {
                warn!(session = %self.id, "operation cancelled");
                self.state = SessionState::Failed;
                Err(Error::Cancelled)
            }
            ReadOutcome::TimedOut => {
                warn!(session = %self.id, timeout = ?idle, "console went silent");
                self.state = SessionState::Failed;
                Err(Error::Timeout { duration: idle })
            }
            ReadOutcome::Data(Err(e)) => {
                self.state = SessionState::Failed;
                Err(e)
            }
            ReadOutcome::Data(Ok(bytes)) if bytes.is_empty() => {
                self.state = SessionState::Failed;
                Err(Error::Transport {
                    reason: "connection closed by remote console".to_string(),
                })
            }
            ReadOutcome::Data(Ok(bytes)) => {
                Ok(strip_ansi_codes(&String::from_utf8_lossy(&bytes)))
            }
        }
    }

    /// Read a chunk if one arrives within `wait`, otherwise return `None`
    pub(crate) async fn try_read_within(&mut self, wait: Duration) -> Result<Option<String>> {
        match tokio::time::timeout(wait, self.transport.read_chunk()).await {
            Err(_) => Ok(None),
            Ok(Ok(bytes)) if bytes.is_empty() => {
                self.state = SessionState::Failed;
                Err(Error::Transport {
                    reason: "connection closed by remote console".to_string(),
                })
            }
            Ok(Ok(bytes)) => Ok(Some(strip_ansi_codes(&String::from_utf8_lossy(&bytes)))),
            Ok(Err(e)) => {
                self.state = SessionState::Failed;
                Err(e)
            }
        }
    }

    /// Collect whatever the console still says until it closes the stream
    /// or goes quiet for `grace`
    pub(crate) async fn drain_until_close(&mut self, grace: Duration) -> String {
        let mut collected = String::new();
        loop {
            match tokio::time::timeout(grace, self.transport.read_chunk()).await {
                Ok(Ok(bytes)) if bytes.is_empty() => break,
                Ok(Ok(bytes)) => {
                    collected.push_str(&strip_ansi_codes(&String::from_utf8_lossy(&bytes)));
                }
                Ok(Err(_)) | Err(_) => break,
            }
        }
        collected
    }

    /// Shut the transport down and mark the session closed
    pub async fn close(&mut self) {
        if self.state == SessionState::Closed {
            return;
        }
        if let Err(e) = self.transport.shutdown().await {
            debug!(session = %self.id, "transport shutdown: {}", e);
        }
        self.state = SessionState::Closed;
        debug!(session = %self.id, "session closed");
    }

    /// Current lifecycle state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Session identifier
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Session configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Command currently awaiting its response, if any
    pub fn pending_command(&self) -> Option<&str> {
        self.pending_command.as_deref()
    }

    async fn write_line(&mut self, line: &str) -> Result<()> {
        let mut data = line.as_bytes().to_vec();
        data.push(b'\n');
        self.transport.write_all(&data).await
    }
}
