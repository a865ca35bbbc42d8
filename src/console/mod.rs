//! Console Protocol Core
//!
//! The pieces that turn a human-oriented line console into a
//! machine-controllable protocol: response framing over an unbounded byte
//! stream, the login handshake state machine, and the sequential
//! transaction runner with submenu-stranding recovery.

pub mod cancel;
pub mod framer;
pub mod runner;
pub mod session;

// Re-exports for convenience
pub use cancel::{cancel_channel, CancelHandle, CancelToken};
pub use framer::ResponseFramer;
pub use runner::TransactionRunner;
pub use session::{Session, SessionState};
