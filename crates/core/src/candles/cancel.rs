//! Cooperative cancellation for long-running backfills.

use tokio::sync::watch;

/// Sender half; dropping it does not cancel.
pub struct Canceller {
    tx: watch::Sender<bool>,
}

impl Canceller {
    /// Signal every associated handle to stop.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

/// Cheap cloneable flag checked by the slow backfill path between
/// batches and before each backoff sleep.
#[derive(Clone)]
pub struct CancelHandle {
    rx: watch::Receiver<bool>,
}

impl CancelHandle {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }
}

/// Create a connected canceller/handle pair.
pub fn cancel_pair() -> (Canceller, CancelHandle) {
    let (tx, rx) = watch::channel(false);
    (Canceller { tx }, CancelHandle { rx })
}
