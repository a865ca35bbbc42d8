//! Operation Cancellation
//!
//! A watch-channel based cancellation signal. The handle side belongs to the
//! caller; the token side is observed by the session at every await point,
//! closing the socket and surfacing a cancelled error when fired.

use tokio::sync::watch;

/// Create a connected cancellation handle/token pair
pub fn cancel_channel() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Caller-side handle that fires the cancellation signal
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    /// Cancel the operation observing the paired token
    pub fn cancel(&self) {
        // Ignore errors - they just mean no operation is listening
        let _ = self.tx.send(true);
    }

    /// Whether the signal has been fired
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

/// Session-side token that resolves once cancellation is requested
#[derive(Clone)]
pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    /// Whether the signal has been fired
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until the operation is cancelled
    ///
    /// Pends forever when the handle is dropped without firing, so a lost
    /// handle never spuriously cancels an operation.
    pub(crate) async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}
