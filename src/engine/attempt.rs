//! Reservation attempt loop.

// ============================================================================
// Imports
// ============================================================================

use tracing::{debug, info, warn};

use crate::browser::{BrowserAgent, Locator};
use crate::config::RetryPolicy;
use crate::error::Result;

use super::dialog::SignalReceiver;

// ============================================================================
// Types
// ============================================================================

/// How the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The confirmation dialog was observed.
    Confirmed,
    /// No control to click.
    SlotUnavailable,
    /// No confirmation within the policy.
    Exhausted,
}

/// Loop result with attempts used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptReport {
    /// How the loop ended.
    pub outcome: AttemptOutcome,
    /// Attempts used, including the first.
    pub attempts: u32,
}

impl AttemptReport {
    /// Attempts beyond the first.
    #[inline]
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.attempts.saturating_sub(1)
    }
}

// ============================================================================
// Loop
// ============================================================================

/// Clicks the slot until a confirmation dialog is signalled.
///
/// Each attempt drains stale signals, locates the slot controls (first
/// match wins), clicks, and waits one policy period for the signal. An empty
/// lookup ends the loop at once: the slot is taken and retrying will not
/// change that.
///
/// # Errors
///
/// Returns browser transport errors. A click on a node that went stale is
/// counted as a failed attempt.
pub async fn reserve(
    agent: &dyn BrowserAgent,
    slot: &Locator,
    policy: &RetryPolicy,
    signal: &mut SignalReceiver,
) -> Result<AttemptReport> {
    for attempt in 1..=policy.max_attempts {
        let stale = signal.drain();
        if stale > 0 {
            debug!(attempt, stale, "Discarded stale confirmation");
        }

        let nodes = agent.locate(slot).await?;
        let Some(node) = nodes.first() else {
            warn!(attempt, "Slot control not found");
            return Ok(AttemptReport {
                outcome: AttemptOutcome::SlotUnavailable,
                attempts: attempt,
            });
        };

        match agent.click(node).await {
            Ok(()) => {}
            Err(e) if e.is_element_error() => {
                debug!(attempt, error = %e, "Slot click missed");
                continue;
            }
            Err(e) => return Err(e),
        }

        if signal.wait(policy.period).await {
            info!(attempt, "Confirmation dialog observed");
            return Ok(AttemptReport {
                outcome: AttemptOutcome::Confirmed,
                attempts: attempt,
            });
        }

        debug!(attempt, "No confirmation within period");
    }

    warn!(attempts = policy.max_attempts, "Reservation attempts exhausted");
    Ok(AttemptReport {
        outcome: AttemptOutcome::Exhausted,
        attempts: policy.max_attempts,
    })
}

// ============================================================================
// Tests
// ============================================================================
