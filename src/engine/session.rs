//! Per-slot session: one browser, one dialog bridge, one signal.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, warn};

use crate::browser::{AgentLauncher, BrowserAgent};
use crate::config::{ReservationRequest, RunConfig};
use crate::error::Result;

use super::dialog::{DialogBridge, SignalReceiver, signal_channel};

// ============================================================================
// Session
// ============================================================================

/// Resources owned by one slot worker.
///
/// Must be released with [`Session::close`] on every exit path.
pub struct Session {
    agent: Arc<dyn BrowserAgent>,
    signal: SignalReceiver,
    bridge: DialogBridge,
}

impl Session {
    /// Launches a browser and wires its dialogs to a fresh signal.
    ///
    /// # Errors
    ///
    /// Returns the launcher's error, or the subscription error (the browser
    /// is closed first).
    pub async fn open(
        launcher: &dyn AgentLauncher,
        config: &RunConfig,
        request: &ReservationRequest,
    ) -> Result<Self> {
        let agent = launcher.launch(request.slot_id, config.headless).await?;

        let events = match agent.subscribe_dialog_events() {
            Ok(events) => events,
            Err(e) => {
                if let Err(close_err) = agent.close().await {
                    debug!(error = %close_err, "Close after failed subscribe");
                }
                return Err(e);
            }
        };

        let (sender, signal) = signal_channel();
        let bridge = DialogBridge::spawn(
            Arc::clone(&agent),
            events,
            sender,
            config.portal.phrases.confirmation.clone(),
            request.dry_run,
        );

        debug!("Session opened");
        Ok(Self {
            agent,
            signal,
            bridge,
        })
    }

    /// Returns the browser agent.
    #[inline]
    #[must_use]
    pub fn agent(&self) -> &dyn BrowserAgent {
        self.agent.as_ref()
    }

    /// Splits the session into its agent and signal for the attempt loop.
    #[inline]
    pub fn parts(&mut self) -> (&dyn BrowserAgent, &mut SignalReceiver) {
        (self.agent.as_ref(), &mut self.signal)
    }

    /// Stops the bridge and shuts the browser down. Never fails.
    pub async fn close(self) {
        let Self { agent, bridge, .. } = self;
        drop(bridge);

        if let Err(e) = agent.close().await {
            warn!(error = %e, "Browser did not close cleanly");
        }
        debug!("Session closed");
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    use crate::config::Hour;
    use crate::engine::testing::FakeLauncher;
    use crate::identifiers::WorkerId;

    fn config() -> RunConfig {
        RunConfig::builder()
            .account("A123456789")
            .password("secret")
            .date(NaiveDate::from_ymd_opt(2026, 10, 23).expect("date"))
            .hours([Hour::new(14).expect("hour")])
            .build()
            .expect("config")
    }

    #[tokio::test]
    async fn test_open_and_close_releases_browser() {
        let launcher = FakeLauncher::new();
        let config = config();
        let request = config.requests()[0];

        let session = Session::open(&launcher, &config, &request)
            .await
            .expect("opens");
        session.close().await;

        assert!(launcher.agent(0).is_closed());
    }

    #[tokio::test]
    async fn test_open_propagates_launch_error() {
        let launcher = FakeLauncher::new();
        launcher.fail_launch(0);
        let config = config();
        let request = config.requests()[0];

        let result = Session::open(&launcher, &config, &request).await;
        assert!(result.is_err());
        assert_eq!(request.slot_id, WorkerId::new(0));
    }
}
