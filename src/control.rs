//! Pause and cancellation for a running transfer.

use std::sync::Arc;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::progress::DownloadProgress;

/// Handle used to suspend, resume, or abort one transfer from outside its task.
///
/// Clones share the same state.
#[derive(Debug, Clone)]
pub struct TransferControl {
    cancel: CancellationToken,
    paused: Arc<watch::Sender<bool>>,
}

impl Default for TransferControl {
    fn default() -> Self {
        Self::new()
    }
}

impl TransferControl {
    /// Creates a control that is neither paused nor cancelled.
    #[must_use]
    pub fn new() -> Self {
        let (paused, _) = watch::channel(false);
        Self {
            cancel: CancellationToken::new(),
            paused: Arc::new(paused),
        }
    }

    /// Requests cancellation. Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns true once cancellation was requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when cancellation is requested.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Returns a receiver that sees every change of the paused flag.
    #[must_use]
    pub fn pause_changes(&self) -> watch::Receiver<bool> {
        self.paused.subscribe()
    }

    /// Suspends the transfer at its next checkpoint.
    pub fn pause(&self) {
        self.paused.send_replace(true);
    }

    /// Lets a suspended transfer continue.
    pub fn resume(&self) {
        self.paused.send_replace(false);
    }

    /// Flips the paused flag and returns the new value.
    pub fn toggle_pause(&self) -> bool {
        let mut now = false;
        self.paused.send_modify(|p| {
            *p = !*p;
            now = *p;
        });
        now
    }

    /// Returns true while a pause is requested.
    #[must_use]
    pub fn is_paused(&self) -> bool {
        *self.paused.borrow()
    }

    /// Checked by the engine between progress events.
    ///
    /// Fails with [`Error::Cancelled`] once cancellation was requested. While
    /// paused, waits for resume or cancellation without spinning.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the transfer was cancelled before or
    /// during the wait.
    pub async fn checkpoint(&self, progress: &dyn DownloadProgress) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if !self.is_paused() {
            return Ok(());
        }

        log::info!("Transfer paused");
        progress.on_paused();

        let mut rx = self.paused.subscribe();
        tokio::select! {
            () = self.cancel.cancelled() => return Err(Error::Cancelled),
            // sender lives in self, so the channel cannot close here
            _ = rx.wait_for(|paused| !*paused) => {}
        }

        log::info!("Transfer resumed");
        progress.on_resumed();
        Ok(())
    }
}
