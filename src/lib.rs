//! Promptline - an async client for line-oriented remote admin consoles
//!
//! Some gateways expose their administration surface as a human-oriented
//! line shell over raw TCP: a login prompt, a top-level prompt, and nested
//! sub-manager prompts for multi-step object creation. There is no framing,
//! no length prefixes, and no "response complete" signal. Promptline drives
//! such a console as if it were a machine-controllable protocol.
//!
//! ## Features
//!
//! - **Handshake state machine:** username/password login over an unframed
//!   stream, rescanning the whole accumulated buffer on every read
//! - **Response framing:** heuristic end-of-response detection with an
//!   explicit, ordered boundary rule list (top prompt, session marker,
//!   submenu prompt)
//! - **Transactions:** strictly sequential multi-command execution with a
//!   tunable settle delay and recovery from submenu stranding
//! - **Isolation:** one connection per operation; a stuck session cannot
//!   poison a later call
//! - **Configuration:** every recognized marker and keyword is configurable,
//!   with jcli-shaped defaults, loadable from TOML or JSON
//!
//! ## Module Organization
//!
//! - [`client`] - The façade external callers use
//! - [`console`] - Framer, session state machine, transaction runner
//! - [`transport`] - Byte stream abstraction over TCP
//! - [`config`] - Connection, marker, and runner configuration
//! - [`models`] - Command results and boundary kinds
//! - [`mod@error`] - Error types and Result aliases
//!
//! ## Quick Start
//!
//! ```no_run
//! use promptline::{ClientConfig, ConsoleClient};
//!
//! # async fn example() -> promptline::Result<()> {
//! let client = ConsoleClient::new(ClientConfig::default())?;
//!
//! // One command, one session
//! let listing = client.execute("user -l").await?;
//!
//! // A multi-step object creation, strictly in order
//! let outputs = client
//!     .execute_sequence(&[
//!         "group -a".to_string(),
//!         "gid operators".to_string(),
//!         "ok".to_string(),
//!     ])
//!     .await?;
//! # let _ = (listing, outputs);
//! # Ok(())
//! # }
//! ```
//!
//! ## Caveats
//!
//! Boundary detection is substring-based and therefore heuristic: command
//! output that contains a prompt literal as data will be misclassified. The
//! heuristic lives behind [`console::ResponseFramer`] so an alternative
//! framer can be substituted without touching the session or the runner.
//!
//! The remote console is a single shared resource; most gateways accept one
//! admin session at a time. Concurrent operations against the same console
//! are not made safe by this crate.

#![allow(unexpected_cfgs)]

#[macro_use]
extern crate tracing;

pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod models;
pub mod transport;

// Re-exports for core functionality
pub use client::ConsoleClient;
pub use config::{
    ClientConfig, ConnectionConfig, MarkerConfig, RunnerConfig, Secret, SubmenuPolicy,
};
pub use console::{cancel_channel, CancelHandle, CancelToken};
pub use console::{ResponseFramer, Session, SessionState, TransactionRunner};
pub use error::{Error, Result};
pub use models::{BoundaryKind, CommandResult};

// Convenience re-exports for common types
pub use config::loader::ConfigLoader;

// Version information
/// The current version of Promptline from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The crate name from Cargo.toml
pub const NAME: &str = env!("CARGO_PKG_NAME");
