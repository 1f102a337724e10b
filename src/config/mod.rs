//! Run configuration and the portal contract.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `portal` | Endpoints, selectors and phrases of the reservation portal |
//! | `request` | [`Hour`], [`TimeBucket`], [`RetryPolicy`], [`ReservationRequest`] |
//! | `run` | [`RunConfig`] builder and command-line value parsing |

// ============================================================================
// Submodules
// ============================================================================

/// Fixed contract with the reservation portal.
pub mod portal;

/// Per-slot request parameters and retry policies.
pub mod request;

/// Immutable run configuration and argument validation.
pub mod run;

// ============================================================================
// Re-exports
// ============================================================================

pub use portal::{Portal, PortalEndpoints, PortalPhrases, PortalSelectors};
pub use request::{FIRST_HOUR, Hour, LAST_HOUR, ReservationRequest, RetryPolicy, TimeBucket};
pub use run::{Credentials, RunConfig, RunConfigBuilder, booking_window, parse_date, parse_hours};
