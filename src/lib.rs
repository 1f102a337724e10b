//! Court Reserver - concurrent slot booking for the sports center portal.
//!
//! This library logs into the booking portal, opens the booking table for a
//! date, clicks the requested hour and confirms the reservation dialog,
//! racing other users for a handful of slots.
//!
//! # Architecture
//!
//! - **Engine**: one worker per requested hour, all in parallel, joined at
//!   the end. Workers share nothing but the read-only [`RunConfig`].
//! - **Browser**: each worker drives its own Chromium through the DevTools
//!   protocol, behind the [`BrowserAgent`] trait.
//!
//! Key design principles:
//!
//! - Each worker owns: browser process + dialog bridge + confirmation signal
//! - Dialogs arrive as events; the bridge turns them into a per-attempt signal
//! - Every slot ends in exactly one [`Outcome`]; one slot never aborts another
//! - Only failure to start the browser engine at all aborts a run
//!
//! # Quick Start
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use court_reserver::{ChromeLauncher, Engine, Hour, Result, RunConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = RunConfig::builder()
//!         .account("A123456789")
//!         .password("secret")
//!         .date(NaiveDate::from_ymd_opt(2026, 10, 23).expect("date"))
//!         .hours([Hour::new(14)?, Hour::new(15)?])
//!         .build()?;
//!
//!     let launcher = ChromeLauncher::builder().build()?;
//!     let summary = Engine::new(launcher, config).run().await?;
//!     println!("reserved {} of {}", summary.reserved(), summary.reports.len());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`browser`] | [`BrowserAgent`] seam and the Chromium implementation |
//! | [`cli`] | Command-line arguments |
//! | [`config`] | Portal contract and run configuration |
//! | [`engine`] | Slot locator, login, attempt loop, dialog bridge, orchestrator |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | DevTools message types (internal) |
//! | [`schedule`] | Cron or immediate trigger |
//! | [`transport`] | WebSocket transport layer (internal) |

// ============================================================================
// Modules
// ============================================================================

/// Browser automation seam and Chromium implementation.
///
/// - [`BrowserAgent`] - One automated page
/// - [`AgentLauncher`] - Starts one agent per worker
/// - [`ChromeLauncher`] - Chromium over the DevTools protocol
pub mod browser;

/// Command-line surface.
pub mod cli;

/// Portal contract and immutable run configuration.
pub mod config;

/// Concurrent reservation engine.
pub mod engine;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers.
///
/// Newtype wrappers prevent mixing incompatible IDs at compile time.
pub mod identifiers;

/// DevTools protocol message types.
///
/// Internal module defining command/response/event structures.
pub mod protocol;

/// Scheduling trigger.
pub mod schedule;

/// WebSocket transport layer.
///
/// Internal module handling the DevTools connection.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Browser types
pub use browser::{
    AgentLauncher, BrowserAgent, CdpPage, ChromeLauncher, ChromeLauncherBuilder, ChromeOptions,
    DialogEvent, DialogStream, Locator, NodeHandle,
};

// CLI
pub use cli::Cli;

// Configuration types
pub use config::{
    Credentials, Hour, Portal, PortalEndpoints, PortalPhrases, PortalSelectors,
    ReservationRequest, RetryPolicy, RunConfig, RunConfigBuilder, TimeBucket,
};

// Engine types
pub use engine::{
    AttemptOutcome, AttemptReport, Engine, FailureReason, LoginReport, LoginState, Outcome,
    RunSummary, SlotPosition, SlotReport, classify, position,
};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::{CdpSessionId, RequestId, TargetId, WorkerId};

// Schedule
pub use schedule::Trigger;
