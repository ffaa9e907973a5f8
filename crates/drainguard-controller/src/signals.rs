//! Stop signal watcher.
//!
//! The orchestrator sends SIGTERM when it decides to stop a task; SIGINT
//! covers interactive runs. The first one received is published on a
//! watch channel that the controller selects on next to its timer.
//! SIGKILL cannot be caught, so deregistration ahead of termination only
//! holds on the graceful path.

use std::fmt;
use std::io;

use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

/// A stop request delivered to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
    /// SIGTERM, sent by the orchestrator.
    Terminate,
    /// SIGINT, typically Ctrl-C during local runs.
    Interrupt,
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Terminate => f.write_str("SIGTERM"),
            Self::Interrupt => f.write_str("SIGINT"),
        }
    }
}

/// Receiving side of the stop notification. Holds `None` until a signal
/// arrives.
pub type StopNotice = watch::Receiver<Option<StopSignal>>;

/// Background task listening for stop signals.
pub struct SignalWatcher {
    handle: JoinHandle<()>,
}

impl SignalWatcher {
    /// Install the SIGTERM and SIGINT handlers and start listening.
    ///
    /// Handlers are installed before this returns, so a signal sent
    /// immediately afterwards is not lost.
    pub fn spawn() -> io::Result<(Self, StopNotice)> {
        let mut sigterm = signal(SignalKind::terminate())?;
        let mut sigint = signal(SignalKind::interrupt())?;
        let (tx, rx) = watch::channel(None);

        let handle = tokio::spawn(async move {
            let received = tokio::select! {
                _ = sigterm.recv() => StopSignal::Terminate,
                _ = sigint.recv() => StopSignal::Interrupt,
            };
            info!(signal = %received, "received stop signal");
            tx.send_replace(Some(received));
        });

        Ok((Self { handle }, rx))
    }
}

impl Drop for SignalWatcher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_display() {
        assert_eq!(StopSignal::Terminate.to_string(), "SIGTERM");
        assert_eq!(StopSignal::Interrupt.to_string(), "SIGINT");
    }

    #[tokio::test]
    async fn watcher_starts_without_a_signal() {
        let (_watcher, notice) = SignalWatcher::spawn().unwrap();
        assert!(notice.borrow().is_none());
    }

    #[tokio::test]
    async fn dropping_the_watcher_closes_the_notice() {
        let (watcher, mut notice) = SignalWatcher::spawn().unwrap();
        drop(watcher);
        // The aborted task drops the sender, so `changed` reports closure.
        assert!(notice.changed().await.is_err());
        assert!(notice.borrow().is_none());
    }
}
