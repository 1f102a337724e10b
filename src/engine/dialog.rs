//! Dialog event bridge.
//!
//! Turns the page's asynchronous dialog notifications into a per-attempt
//! signal for the reservation loop, accepting dialogs as they arrive.
//!
//! # Signal
//!
//! The signal is a capacity-one channel with a single writer (the bridge)
//! and a single reader (the attempt loop). The reader drains it before each
//! attempt, so a confirmation from a previous attempt never satisfies a later
//! wait.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, error, warn};

use crate::browser::{BrowserAgent, DialogEvent, DialogStream};

// ============================================================================
// Signal
// ============================================================================

/// Creates a connected signal pair.
#[must_use]
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    let (tx, rx) = mpsc::channel(1);
    (SignalSender { tx }, SignalReceiver { rx })
}

/// Writing half of the confirmation signal.
#[derive(Debug, Clone)]
pub struct SignalSender {
    tx: mpsc::Sender<()>,
}

impl SignalSender {
    /// Publishes the signal without waiting.
    ///
    /// Returns `false` if a signal is already pending or the reader is gone.
    pub fn notify(&self) -> bool {
        self.tx.try_send(()).is_ok()
    }
}

/// Reading half of the confirmation signal.
#[derive(Debug)]
pub struct SignalReceiver {
    rx: mpsc::Receiver<()>,
}

impl SignalReceiver {
    /// Discards any pending signal. Returns how many were discarded.
    pub fn drain(&mut self) -> usize {
        let mut stale = 0;
        while self.rx.try_recv().is_ok() {
            stale += 1;
        }
        stale
    }

    /// Waits up to `within` for a signal.
    pub async fn wait(&mut self, within: Duration) -> bool {
        matches!(timeout(within, self.rx.recv()).await, Ok(Some(())))
    }
}

// ============================================================================
// Reaction
// ============================================================================

/// What the bridge does with one dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reaction {
    /// Publish the confirmation signal.
    pub signal: bool,
    /// Press OK on the dialog.
    pub accept: bool,
}

/// Decides the bridge's reaction to `event`.
///
/// A confirmation dialog is signalled, and left open on a dry run.
/// Everything else is accepted.
#[must_use]
pub fn react(event: &DialogEvent, confirmation: &str, dry_run: bool) -> Reaction {
    let confirmed = event.contains(confirmation);
    Reaction {
        signal: confirmed,
        accept: !(confirmed && dry_run),
    }
}

// ============================================================================
// DialogBridge
// ============================================================================

/// Background task bridging one page's dialogs to its signal.
///
/// Lives as long as the session; aborted on drop.
#[derive(Debug)]
pub struct DialogBridge {
    handle: JoinHandle<()>,
}

impl DialogBridge {
    /// Spawns the bridge in the current tracing span.
    #[must_use]
    pub fn spawn(
        agent: Arc<dyn BrowserAgent>,
        mut events: DialogStream,
        signal: SignalSender,
        confirmation: String,
        dry_run: bool,
    ) -> Self {
        let task = async move {
            while let Some(event) = events.recv().await {
                warn!(message = %event.message, "Dialog");

                let reaction = react(&event, &confirmation, dry_run);

                if reaction.signal && !signal.notify() {
                    debug!("Confirmation signal already pending");
                }

                if reaction.accept {
                    let agent = Arc::clone(&agent);
                    tokio::spawn(
                        async move {
                            if let Err(e) = agent.accept_dialog().await {
                                error!(error = %e, "Failed to accept dialog");
                            }
                        }
                        .in_current_span(),
                    );
                } else {
                    debug!("Dry run: confirmation dialog left open");
                }
            }
            debug!("Dialog stream closed");
        };

        Self {
            handle: tokio::spawn(task.instrument(Span::current())),
        }
    }
}

impl Drop for DialogBridge {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

// ============================================================================
// Tests
// ============================================================================
