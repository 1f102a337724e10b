//! Browser automation module.
//!
//! This module provides the browser seam used by the reservation engine:
//!
//! | Type | Description |
//! |------|-------------|
//! | [`BrowserAgent`] | One automated page (navigate, locate, click, dialogs) |
//! | [`AgentLauncher`] | Factory of agents, one per worker |
//! | [`ChromeLauncher`] | Launches Chromium with a private profile |
//! | [`CdpPage`] | DevTools-backed [`BrowserAgent`] |
//! | [`Locator`] | CSS or XPath element locator |
//!
//! # Example
//!
//! ```no_run
//! use court_reserver::{AgentLauncher, ChromeLauncher, Locator, Result, WorkerId};
//!
//! # async fn example() -> Result<()> {
//! let launcher = ChromeLauncher::builder().build()?;
//! let agent = launcher.launch(WorkerId::new(0), true).await?;
//!
//! agent.navigate("https://example.com").await?;
//! let text = agent.read_text(&Locator::css("h1")).await?;
//! agent.close().await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Submodules
// ============================================================================

/// Agent and launcher traits.
pub mod agent;

/// Chromium process launcher.
pub mod launcher;

/// Chromium command-line options.
pub mod options;

/// DevTools page implementation.
pub mod page;

/// Element locators.
pub mod selector;

// ============================================================================
// Re-exports
// ============================================================================

pub use agent::{AgentLauncher, BrowserAgent, DialogEvent, DialogStream, NodeHandle};
pub use launcher::{ChromeLauncher, ChromeLauncherBuilder, find_browser};
pub use options::ChromeOptions;
pub use page::CdpPage;
pub use selector::Locator;
