//! Browser automation seam.
//!
//! The reservation engine talks to the browser only through
//! [`BrowserAgent`], and obtains agents only through [`AgentLauncher`].
//! [`CdpPage`](super::CdpPage) and [`ChromeLauncher`](super::ChromeLauncher)
//! are the production implementations.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::Result;
use crate::identifiers::WorkerId;

use super::selector::Locator;

// ============================================================================
// Types
// ============================================================================

/// Opaque handle to one element resolved by [`BrowserAgent::locate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    id: String,
}

impl NodeHandle {
    /// Wraps a backend-specific node id.
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Returns the backend-specific node id.
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// A modal dialog opened by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DialogEvent {
    /// Dialog text.
    pub message: String,
}

impl DialogEvent {
    /// Creates a dialog event.
    #[inline]
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns `true` if the dialog text contains `phrase`.
    #[inline]
    #[must_use]
    pub fn contains(&self, phrase: &str) -> bool {
        self.message.contains(phrase)
    }
}

/// Stream of dialog notifications, in arrival order.
pub type DialogStream = mpsc::UnboundedReceiver<DialogEvent>;

// ============================================================================
// BrowserAgent
// ============================================================================

/// One automated browser page.
///
/// All methods are safe to call concurrently; in particular
/// [`accept_dialog`](Self::accept_dialog) is called from the dialog bridge
/// task while the worker waits on its signal.
#[async_trait]
pub trait BrowserAgent: Send + Sync {
    /// Navigates and waits for the load event.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Returns the document title.
    async fn title(&self) -> Result<String>;

    /// Resolves a locator. No match is an empty vector, not an error.
    async fn locate(&self, locator: &Locator) -> Result<Vec<NodeHandle>>;

    /// Clicks an element with real mouse events.
    ///
    /// Returns once the click is delivered, without waiting for any dialog
    /// the click opens to be closed.
    async fn click(&self, node: &NodeHandle) -> Result<()>;

    /// Focuses the first match and inserts `text`.
    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()>;

    /// Waits until any match is rendered, up to `timeout`.
    async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> Result<()>;

    /// Returns the text content of the first match.
    async fn read_text(&self, locator: &Locator) -> Result<String>;

    /// Returns the current location.
    async fn current_url(&self) -> Result<String>;

    /// Subscribes to dialog notifications.
    ///
    /// One subscriber per page; subscribing again replaces the previous one.
    fn subscribe_dialog_events(&self) -> Result<DialogStream>;

    /// Presses OK on the open dialog.
    async fn accept_dialog(&self) -> Result<()>;

    /// Shuts the browser down. Idempotent.
    async fn close(&self) -> Result<()>;
}

// ============================================================================
// AgentLauncher
// ============================================================================

/// Factory of browser agents, one per reservation worker.
#[async_trait]
pub trait AgentLauncher: Send + Sync {
    /// Checks that browsers can be started at all.
    ///
    /// A failure here is fatal to the whole run.
    async fn preflight(&self) -> Result<()>;

    /// Starts a fresh browser for `worker`.
    async fn launch(&self, worker: WorkerId, headless: bool) -> Result<Arc<dyn BrowserAgent>>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dialog_event_contains() {
        let event = DialogEvent::new("提醒：您是否確定預約此場地?");
        assert!(event.contains("您是否確定預約"));
        assert!(!event.contains("網路繁忙中"));
    }

    #[test]
    fn test_node_handle_id() {
        assert_eq!(NodeHandle::new("obj-1").id(), "obj-1");
    }

    #[test]
    fn test_agent_is_object_safe() {
        fn assert_object(_: Option<Arc<dyn BrowserAgent>>) {}
        assert_object(None);
    }
}
