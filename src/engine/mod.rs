//! Concurrent reservation engine.
//!
//! One worker per requested hour, all running in parallel, each with its own
//! browser, dialog bridge and signal. The [`Engine`] starts them together and
//! waits for every one to reach a terminal [`Outcome`].
//!
//! | Module | Role |
//! |--------|------|
//! | [`slot`] | Hour to table rows |
//! | [`dialog`] | Dialog bridge and confirmation signal |
//! | [`login`] | Login state machine |
//! | [`attempt`] | Slot click loop |
//! | [`outcome`] | Outcomes and text classifier |
//! | [`session`] | Per-slot resources |
//! | [`worker`] | One slot end to end |
//!
//! # Example
//!
//! ```no_run
//! use court_reserver::{ChromeLauncher, Engine, RunConfig};
//!
//! # async fn example(config: RunConfig) -> court_reserver::Result<()> {
//! let launcher = ChromeLauncher::builder().build()?;
//! let summary = Engine::new(launcher, config).run().await?;
//!
//! for report in &summary.reports {
//!     println!("{} {}", report.hour, report.outcome);
//! }
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

pub mod attempt;
pub mod dialog;
pub mod login;
pub mod outcome;
pub mod session;
pub mod slot;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{error, info};

use crate::browser::AgentLauncher;
use crate::config::RunConfig;
use crate::error::Result;

// ============================================================================
// Re-exports
// ============================================================================

pub use attempt::{AttemptOutcome, AttemptReport, reserve};
pub use dialog::{DialogBridge, Reaction, SignalReceiver, SignalSender, react, signal_channel};
pub use login::{LoginReport, LoginState, login};
pub use outcome::{FailureReason, Outcome, classify};
pub use session::Session;
pub use slot::{SlotPosition, position};
pub use worker::{SlotReport, run_slot};

// ============================================================================
// RunSummary
// ============================================================================

/// Result of one run: every slot's report, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// One report per requested hour.
    pub reports: Vec<SlotReport>,
    /// Where the operator can review bookings.
    pub order_history: String,
}

impl RunSummary {
    /// Number of confirmed reservations.
    #[must_use]
    pub fn reserved(&self) -> usize {
        self.reports
            .iter()
            .filter(|r| r.outcome.is_success())
            .count()
    }

    /// Logs one line per slot and the order history URL.
    pub fn log(&self) {
        for report in &self.reports {
            if report.outcome.is_failure() {
                error!(worker = %report.worker, hour = %report.hour, outcome = %report.outcome, "Slot result");
            } else {
                info!(worker = %report.worker, hour = %report.hour, outcome = %report.outcome, "Slot result");
            }
        }
        info!(
            reserved = self.reserved(),
            requested = self.reports.len(),
            url = %self.order_history,
            "Review your bookings"
        );
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Runs every requested slot in parallel.
pub struct Engine<L> {
    launcher: Arc<L>,
    config: Arc<RunConfig>,
}

impl<L> Clone for Engine<L> {
    fn clone(&self) -> Self {
        Self {
            launcher: Arc::clone(&self.launcher),
            config: Arc::clone(&self.config),
        }
    }
}

impl<L: AgentLauncher + 'static> Engine<L> {
    /// Creates an engine.
    #[must_use]
    pub fn new(launcher: L, config: RunConfig) -> Self {
        Self {
            launcher: Arc::new(launcher),
            config: Arc::new(config),
        }
    }

    /// Returns the run configuration.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Runs all slots and waits for all of them.
    ///
    /// # Errors
    ///
    /// Only if the browser engine cannot start at all. Per-slot failures are
    /// reported in the summary.
    pub async fn run(&self) -> Result<RunSummary> {
        self.launcher.preflight().await?;

        let config = &self.config;
        info!(
            account = %config.credentials.account,
            date = %config.date,
            hours = ?config.hours.iter().map(|h| h.value()).collect::<Vec<_>>(),
            headless = config.headless,
            dry_run = config.dry_run,
            login_attempts = config.login_policy.max_attempts,
            login_period_ms = config.login_policy.period_millis(),
            reserve_attempts = config.reserve_policy.max_attempts,
            reserve_period_ms = config.reserve_policy.period_millis(),
            "Run starting"
        );

        let requests = config.requests();
        let handles = requests.iter().map(|request| {
            let launcher = Arc::clone(&self.launcher);
            let config = Arc::clone(&self.config);
            let request = *request;
            tokio::spawn(async move { run_slot(launcher.as_ref(), &config, request).await })
        });

        let reports = join_all(handles)
            .await
            .into_iter()
            .zip(requests)
            .map(|(joined, request)| {
                joined.unwrap_or_else(|e| SlotReport {
                    worker: request.slot_id,
                    hour: request.hour,
                    outcome: Outcome::Failed(FailureReason::Navigation(format!(
                        "worker task ended abnormally: {e}"
                    ))),
                })
            })
            .collect();

        let summary = RunSummary {
            reports,
            order_history: config.portal.endpoints.order_history.clone(),
        };
        summary.log();
        Ok(summary)
    }
}

// ============================================================================
// Tests
// ============================================================================
