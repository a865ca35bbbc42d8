//! Transaction Runner
//!
//! Executes an ordered list of commands against a ready session, one at a
//! time, collecting each command's framed output. The console is stateful
//! and order-dependent, so commands are never reordered or batched; the next
//! write only happens after the previous boundary was recognized.

use std::time::Duration;

use regex::Regex;

use crate::config::SubmenuPolicy;
use crate::console::framer::{strip_echo, ResponseFramer};
use crate::console::session::{Session, SessionState};
use crate::error::{Error, Result};
use crate::models::{BoundaryKind, CommandResult};

/// Escape attempts before a stranded nested editor is declared unrecoverable
const MAX_ESCAPE_ATTEMPTS: usize = 4;

/// How long the session-ending command is given to produce its farewell
const END_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Runs command transactions over one console session
pub struct TransactionRunner<'a> {
    /// Session carrying the commands; exclusively owned for the transaction
    session: &'a mut Session,
    /// Response framer scoped to the in-flight command
    framer: ResponseFramer,
    /// Submenu boundary policy
    policy: SubmenuPolicy,
    /// Pause between a boundary and the next write
    settle_delay: Duration,
    /// Keyword that aborts the console's current nested edit
    escape_command: String,
    /// Keyword that durably saves console state
    save_command: String,
    /// Keyword that ends the console session
    end_command: String,
    /// Shape of a command that belongs at the root prompt
    top_level: Regex,
    /// Whether the last observed boundary left a nested editor open
    in_submenu: bool,
    /// Whether a boundary was consumed since the last write
    needs_settle: bool,
}

impl<'a> TransactionRunner<'a> {
    /// Create a runner over an authenticated session
    pub fn new(session: &'a mut Session) -> Result<Self> {
        let config = session.config();
        let framer = ResponseFramer::new(
            config.markers.clone(),
            config.connection.max_buffer_bytes,
        );
        let runner = &config.runner;
        let policy = runner.submenu_policy;
        let settle_delay = runner.settle_delay();
        let escape_command = runner.escape_command.clone();
        let save_command = runner.save_command.clone();
        let end_command = runner.end_command.clone();
        let top_level = Regex::new(&runner.top_level_pattern)?;

        Ok(Self {
            session,
            framer,
            policy,
            settle_delay,
            escape_command,
            save_command,
            end_command,
            top_level,
            in_submenu: false,
            needs_settle: false,
        })
    }

    /// Execute `commands` strictly in order, one result per command
    pub async fn run(&mut self, commands: &[String]) -> Result<Vec<CommandResult>> {
        self.prepare().await?;
        self.run_chunk(commands).await
    }

    /// Execute several batches over the same session
    ///
    /// The first command of every batch is treated as top-level by the
    /// recovery policy, so a batch that strands the console inside a nested
    /// editor cannot silently corrupt the batches after it.
    pub async fn run_batches(&mut self, batches: &[Vec<String>]) -> Result<Vec<CommandResult>> {
        self.prepare().await?;

        let mut results = Vec::new();
        for batch in batches {
            results.extend(self.run_chunk(batch).await?);
        }
        Ok(results)
    }

    /// Issue the terminating pair: optionally the save command (awaited like
    /// any other command), then the end command, after which the stream is
    /// drained briefly regardless of outcome.
    pub async fn finish(&mut self, save: bool) -> Result<Vec<CommandResult>> {
        let mut results = Vec::new();

        if save {
            let save_command = self.save_command.clone();
            results.push(self.dispatch(&save_command).await?);
        }

        self.settle_if_needed().await;
        let end_command = self.end_command.clone();
        self.session.begin_command(&end_command).await?;
        let farewell = self.session.drain_until_close(END_DRAIN_GRACE).await;
        self.session.complete_command();

        let output = strip_echo(&farewell, &end_command);
        results.push(CommandResult::new(
            end_command,
            output,
            BoundaryKind::Disconnect,
        ));
        Ok(results)
    }

    async fn prepare(&mut self) -> Result<()> {
        if self.session.state() != SessionState::Ready {
            return Err(Error::SessionNotReady {
                state: format!("{:?}", self.session.state()),
            });
        }
        if self.policy == SubmenuPolicy::Recovery {
            self.probe_for_stranding().await?;
        }
        Ok(())
    }

    async fn run_chunk(&mut self, commands: &[String]) -> Result<Vec<CommandResult>> {
        let mut results = Vec::with_capacity(commands.len());
        for (index, command) in commands.iter().enumerate() {
            results.push(self.run_command(command, index == 0).await?);
        }
        Ok(results)
    }

    async fn run_command(&mut self, command: &str, first: bool) -> Result<CommandResult> {
        let command = command.trim();
        if command.is_empty() {
            return Err(Error::EmptyCommand);
        }

        if self.policy == SubmenuPolicy::Recovery
            && self.in_submenu
            && self.looks_top_level(first, command)
        {
            self.escape_submenu().await?;
        }

        self.dispatch(command).await
    }

    /// Send one command and wait for its response boundary
    async fn dispatch(&mut self, command: &str) -> Result<CommandResult> {
        self.settle_if_needed().await;
        self.session.begin_command(command).await?;
        let result = self.await_boundary(command).await?;
        self.session.complete_command();
        self.in_submenu = result.boundary == BoundaryKind::SubmenuPrompt;
        self.needs_settle = true;
        Ok(result)
    }

    async fn await_boundary(&mut self, sent: &str) -> Result<CommandResult> {
        loop {
            if let Some((kind, output)) = self.framer.take_response(sent) {
                return Ok(CommandResult::new(sent, output, kind));
            }
            let chunk = self.session.read_chunk().await?;
            self.framer.push(&chunk)?;
        }
    }

    /// Back out of a nested editor the console is stuck in
    async fn escape_submenu(&mut self) -> Result<()> {
        let escape = self.escape_command.clone();
        for attempt in 1..=MAX_ESCAPE_ATTEMPTS {
            debug!(attempt, "stranded in a nested editor, sending escape command");
            let result = self.dispatch(&escape).await?;
            if result.boundary != BoundaryKind::SubmenuPrompt {
                self.in_submenu = false;
                return Ok(());
            }
        }

        Err(Error::Protocol {
            reason: format!(
                "console stayed in a nested editor after {} escape attempts",
                MAX_ESCAPE_ATTEMPTS
            ),
            buffered: self.framer.buffered(),
        })
    }

    /// Peek for a prompt the console pushed after authentication
    ///
    /// A previous session can leave the console inside a nested editor; the
    /// stale prompt shows up here before the first command is sent.
    async fn probe_for_stranding(&mut self) -> Result<()> {
        let wait = self.settle_delay.max(Duration::from_millis(50));
        if let Some(chunk) = self.session.try_read_within(wait).await? {
            self.framer.push(&chunk)?;
            if self.framer.detect() == Some(BoundaryKind::SubmenuPrompt) {
                debug!("console is already inside a nested editor");
                self.in_submenu = true;
            }
        }
        self.framer.clear();
        Ok(())
    }

    fn looks_top_level(&self, first: bool, command: &str) -> bool {
        first || self.top_level.is_match(command)
    }

    async fn settle_if_needed(&mut self) {
        if self.needs_settle && !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        self.needs_settle = false;
    }
}
