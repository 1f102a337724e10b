//! Slot outcomes and the confirmation text classifier.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use crate::config::PortalPhrases;

// ============================================================================
// FailureReason
// ============================================================================

/// Why a slot ended in [`Outcome::Failed`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    /// The browser for this slot could not be started.
    Launch(String),
    /// Login never reached the landing page.
    LoginExhausted {
        /// Attempts used.
        attempts: u32,
    },
    /// A page or browser transport error.
    Navigation(String),
    /// No confirmation dialog within the reservation policy.
    ReservationExhausted {
        /// Attempts used.
        attempts: u32,
    },
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Launch(message) => write!(f, "browser launch failed: {message}"),
            Self::LoginExhausted { attempts } => {
                write!(f, "login failed after {attempts} attempts")
            }
            Self::Navigation(message) => write!(f, "navigation failed: {message}"),
            Self::ReservationExhausted { attempts } => {
                write!(f, "reservation attempts exhausted ({attempts})")
            }
        }
    }
}

// ============================================================================
// Outcome
// ============================================================================

/// Terminal result of one slot. Never retried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Reservation confirmed.
    Success,
    /// The account already holds the daily maximum.
    AlreadyReservedToday,
    /// No reservation control for the hour; someone else holds it.
    SlotUnavailable,
    /// The portal asked to retry later.
    PortalBusy,
    /// Dry run reached the confirmation dialog and left it open.
    DryRunCompleted,
    /// Anything else.
    Failed(FailureReason),
}

impl Outcome {
    /// Returns `true` for a confirmed reservation.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Returns `true` for [`Outcome::Failed`].
    #[inline]
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => f.write_str("reserved"),
            Self::AlreadyReservedToday => f.write_str("daily reservation limit already reached"),
            Self::SlotUnavailable => f.write_str("slot unavailable"),
            Self::PortalBusy => f.write_str("portal busy, retry later"),
            Self::DryRunCompleted => f.write_str("dry run reached confirmation"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

// ============================================================================
// Classifier
// ============================================================================

/// Classifies the confirmation page text.
///
/// Matching is a literal substring test on the portal's own wording.
#[must_use]
pub fn classify(text: &str, phrases: &PortalPhrases) -> Outcome {
    if text.contains(&phrases.daily_limit) {
        Outcome::AlreadyReservedToday
    } else if text.contains(&phrases.busy) {
        Outcome::PortalBusy
    } else {
        Outcome::Success
    }
}

// ============================================================================
// Tests
// ============================================================================
