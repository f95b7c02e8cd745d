//! Coalescing refresh trigger channel.
//!
//! A single-slot mailbox: signalling never blocks and never fails, and a
//! signal sent while another is still pending merges into it. The consumer
//! therefore sees at most one pending trigger no matter how often
//! `signal` is called in between.

use tokio::sync::mpsc::{self, error::TrySendError};

/// Create a connected trigger sender/receiver pair.
pub fn channel() -> (TriggerSender, TriggerReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (TriggerSender { tx }, TriggerReceiver { rx })
}

/// Sending half of a trigger channel. Cheap to clone.
#[derive(Clone, Debug)]
pub struct TriggerSender {
    tx: mpsc::Sender<()>,
}

impl TriggerSender {
    /// Request a refresh.
    ///
    /// Returns `true` if this call created a new pending signal, `false` if
    /// it merged into one already pending or the receiver is gone.
    pub fn signal(&self) -> bool {
        match self.tx.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) => false,
            Err(TrySendError::Closed(())) => false,
        }
    }

    /// Whether the consuming side has been dropped.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of a trigger channel.
#[derive(Debug)]
pub struct TriggerReceiver {
    rx: mpsc::Receiver<()>,
}

impl TriggerReceiver {
    /// Wait for the next pending signal.
    ///
    /// Returns `None` once every sender has been dropped and no signal is
    /// pending.
    pub async fn recv(&mut self) -> Option<()> {
        self.rx.recv().await
    }

    /// Take a pending signal without waiting.
    pub fn try_recv(&mut self) -> Option<()> {
        self.rx.try_recv().ok()
    }
}
