//! Client Façade
//!
//! The entry point external callers use. Every call owns exactly one
//! session: connect, authenticate, run, disconnect. There is no connection
//! pooling or reuse; the console accepts a single admin session at a time
//! and a stuck session must never poison a later call.

use crate::config::ClientConfig;
use crate::console::cancel::CancelToken;
use crate::console::runner::TransactionRunner;
use crate::console::session::Session;
use crate::error::{Error, Result};

/// Client for a line-oriented remote admin console
///
/// # Example
///
/// ```no_run
/// use promptline::{ClientConfig, ConsoleClient};
///
/// # async fn example() -> promptline::Result<()> {
/// let client = ConsoleClient::new(ClientConfig::default())?;
/// let output = client.execute("user -l").await?;
/// println!("{}", output);
/// # Ok(())
/// # }
/// ```
pub struct ConsoleClient {
    config: ClientConfig,
}

impl ConsoleClient {
    /// Create a client after validating the configuration
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Create a client with the default (jcli-shaped) configuration
    pub fn with_defaults() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// The configuration this client connects with
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Run a single command and return its echo-stripped output
    ///
    /// Opens a session, authenticates, runs the command, ends the session.
    pub async fn execute(&self, command: &str) -> Result<String> {
        self.run_single(command, None).await
    }

    /// [`execute`](Self::execute) with a cancellation token
    pub async fn execute_with_cancel(
        &self,
        command: &str,
        cancel: CancelToken,
    ) -> Result<String> {
        self.run_single(command, Some(cancel)).await
    }

    /// Run an ordered command sequence and return one output per command,
    /// followed by the trailing save/end interaction outputs unless
    /// `runner.include_finalizer_outputs` is disabled
    ///
    /// The sequence either fully completes or the whole operation fails;
    /// partial results are never returned, because a half-applied multi-step
    /// edit leaves the console in a state the next caller has to recover
    /// from.
    pub async fn execute_sequence(&self, commands: &[String]) -> Result<Vec<String>> {
        self.run_sequence(&[commands.to_vec()], None).await
    }

    /// [`execute_sequence`](Self::execute_sequence) with a cancellation token
    pub async fn execute_sequence_with_cancel(
        &self,
        commands: &[String],
        cancel: CancelToken,
    ) -> Result<Vec<String>> {
        self.run_sequence(&[commands.to_vec()], Some(cancel)).await
    }

    /// Run several batches over one session
    ///
    /// The first command of every batch is treated as top-level by the
    /// recovery policy, which keeps concatenated batches safe even when an
    /// earlier batch strands the console inside a nested editor.
    pub async fn execute_batches(&self, batches: &[Vec<String>]) -> Result<Vec<String>> {
        self.run_sequence(batches, None).await
    }

    /// [`execute_batches`](Self::execute_batches) with a cancellation token
    pub async fn execute_batches_with_cancel(
        &self,
        batches: &[Vec<String>],
        cancel: CancelToken,
    ) -> Result<Vec<String>> {
        self.run_sequence(batches, Some(cancel)).await
    }

    async fn run_single(&self, command: &str, cancel: Option<CancelToken>) -> Result<String> {
        let command = command.trim();
        if command.is_empty() {
            return Err(Error::EmptyCommand);
        }

        info!(command, "executing console command");
        let mut session = Session::connect(&self.config, cancel).await?;
        let outcome = Self::drive_single(&mut session, command).await;
        session.close().await;
        outcome
    }

    async fn drive_single(session: &mut Session, command: &str) -> Result<String> {
        session.authenticate().await?;

        let mut runner = TransactionRunner::new(session)?;
        let results = runner.run(&[command.to_string()]).await?;
        runner.finish(false).await?;

        Ok(results
            .into_iter()
            .next()
            .map(|result| result.raw_output)
            .unwrap_or_default())
    }

    async fn run_sequence(
        &self,
        batches: &[Vec<String>],
        cancel: Option<CancelToken>,
    ) -> Result<Vec<String>> {
        let total: usize = batches.iter().map(Vec::len).sum();
        info!(commands = total, "executing console command sequence");

        let mut session = Session::connect(&self.config, cancel).await?;
        let outcome = Self::drive_sequence(&mut session, batches).await;
        session.close().await;
        outcome
    }

    async fn drive_sequence(
        session: &mut Session,
        batches: &[Vec<String>],
    ) -> Result<Vec<String>> {
        session.authenticate().await?;
        let include_finalizers = session.config().runner.include_finalizer_outputs;

        let mut runner = TransactionRunner::new(session)?;
        let mut results = runner.run_batches(batches).await?;
        let finalizers = runner.finish(true).await?;
        if include_finalizers {
            results.extend(finalizers);
        }

        Ok(results
            .into_iter()
            .map(|result| result.raw_output)
            .collect())
    }
}
