//! Scripted browser double for engine tests.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::mpsc;

use crate::browser::{AgentLauncher, BrowserAgent, DialogEvent, DialogStream, Locator, NodeHandle};
use crate::config::Portal;
use crate::error::{Error, Result};
use crate::identifiers::WorkerId;

// ============================================================================
// FakeAgent
// ============================================================================

/// Mutable script and recording of a [`FakeAgent`].
struct Script {
    title: String,
    url: String,
    login_button: bool,
    login_succeeds_after: Option<u32>,
    login_clicks: u32,
    dismiss_button: bool,
    dismiss_clicks: u32,
    clicks: Vec<String>,
    slots: usize,
    stale_slots: bool,
    confirm_after: Option<u32>,
    slot_clicks: u32,
    result_text: String,
    fail_navigation: bool,
    fail_accept: bool,
    accepted: u32,
    navigations: Vec<String>,
    typed: Vec<(String, String)>,
    closed: bool,
}

/// In-memory [`BrowserAgent`] following the portal's happy path by default.
///
/// Login succeeds on the first click, one slot control is available, and
/// clicking it raises the confirmation dialog.
pub(crate) struct FakeAgent {
    portal: Portal,
    script: Mutex<Script>,
    dialogs: Mutex<Option<mpsc::UnboundedSender<DialogEvent>>>,
}

impl FakeAgent {
    pub(crate) fn new() -> Arc<Self> {
        let portal = Portal::default();
        let script = Script {
            title: "場地預約系統".to_string(),
            url: "about:blank".to_string(),
            login_button: true,
            login_succeeds_after: Some(1),
            login_clicks: 0,
            dismiss_button: true,
            dismiss_clicks: 0,
            clicks: Vec::new(),
            slots: 1,
            stale_slots: false,
            confirm_after: Some(1),
            slot_clicks: 0,
            result_text: "預約成功".to_string(),
            fail_navigation: false,
            fail_accept: false,
            accepted: 0,
            navigations: Vec::new(),
            typed: Vec::new(),
            closed: false,
        };
        Arc::new(Self {
            portal,
            script: Mutex::new(script),
            dialogs: Mutex::new(None),
        })
    }

    pub(crate) fn set_title(&self, title: &str) {
        self.script.lock().title = title.to_string();
    }

    pub(crate) fn set_login_button(&self, present: bool) {
        self.script.lock().login_button = present;
    }

    /// `None` never reaches the landing page.
    pub(crate) fn login_succeeds_after(&self, clicks: Option<u32>) {
        self.script.lock().login_succeeds_after = clicks;
    }

    pub(crate) fn set_dismiss_button(&self, present: bool) {
        self.script.lock().dismiss_button = present;
    }

    /// Slot clicks fail as if the node had been detached.
    pub(crate) fn set_stale_slots(&self, stale: bool) {
        self.script.lock().stale_slots = stale;
    }

    pub(crate) fn set_slots(&self, slots: usize) {
        self.script.lock().slots = slots;
    }

    /// `None` never raises the confirmation dialog.
    pub(crate) fn confirm_after(&self, clicks: Option<u32>) {
        self.script.lock().confirm_after = clicks;
    }

    pub(crate) fn set_result_text(&self, text: &str) {
        self.script.lock().result_text = text.to_string();
    }

    pub(crate) fn fail_navigation(&self, fail: bool) {
        self.script.lock().fail_navigation = fail;
    }

    pub(crate) fn fail_accept(&self, fail: bool) {
        self.script.lock().fail_accept = fail;
    }

    /// Emits a dialog as the page would.
    pub(crate) fn raise_dialog(&self, message: &str) {
        if let Some(tx) = self.dialogs.lock().as_ref() {
            let _ = tx.send(DialogEvent::new(message));
        }
    }

    pub(crate) fn accepted_dialogs(&self) -> u32 {
        self.script.lock().accepted
    }

    pub(crate) fn login_clicks(&self) -> u32 {
        self.script.lock().login_clicks
    }

    pub(crate) fn dismiss_clicks(&self) -> u32 {
        self.script.lock().dismiss_clicks
    }

    /// Node ids of every click, in order.
    pub(crate) fn clicks(&self) -> Vec<String> {
        self.script.lock().clicks.clone()
    }

    pub(crate) fn slot_clicks(&self) -> u32 {
        self.script.lock().slot_clicks
    }

    pub(crate) fn navigations(&self) -> Vec<String> {
        self.script.lock().navigations.clone()
    }

    pub(crate) fn typed(&self) -> Vec<(String, String)> {
        self.script.lock().typed.clone()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.script.lock().closed
    }

    fn is_slot(locator_value: &str) -> bool {
        locator_value.contains("PlaceBtn")
    }
}

#[async_trait]
impl BrowserAgent for FakeAgent {
    async fn navigate(&self, url: &str) -> Result<()> {
        let mut script = self.script.lock();
        if script.fail_navigation {
            return Err(Error::navigation(url, "net::ERR_CONNECTION_RESET"));
        }
        script.navigations.push(url.to_string());
        script.url = url.to_string();
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        Ok(self.script.lock().title.clone())
    }

    async fn locate(&self, locator: &Locator) -> Result<Vec<NodeHandle>> {
        let script = self.script.lock();
        let count = if Self::is_slot(locator.value()) {
            script.slots
        } else if *locator == self.portal.selectors.login_button {
            usize::from(script.login_button)
        } else if *locator == self.portal.selectors.login_failure_dismiss {
            usize::from(script.dismiss_button)
        } else {
            1
        };
        Ok(vec![NodeHandle::new(locator.value()); count])
    }

    async fn click(&self, node: &NodeHandle) -> Result<()> {
        let raise = {
            let mut script = self.script.lock();
            script.clicks.push(node.id().to_string());
            if node.id() == self.portal.selectors.login_button.value() {
                script.login_clicks += 1;
                if script
                    .login_succeeds_after
                    .is_some_and(|after| script.login_clicks >= after)
                {
                    script.url = self.portal.endpoints.landing.clone();
                }
                false
            } else if node.id() == self.portal.selectors.login_failure_dismiss.value() {
                script.dismiss_clicks += 1;
                false
            } else if Self::is_slot(node.id()) {
                script.slot_clicks += 1;
                if script.stale_slots {
                    return Err(Error::element_not_found(node.id()));
                }
                script
                    .confirm_after
                    .is_some_and(|after| script.slot_clicks >= after)
            } else {
                false
            }
        };

        if raise {
            self.raise_dialog(&format!("{}此場地?", self.portal.phrases.confirmation));
        }
        Ok(())
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        self.script
            .lock()
            .typed
            .push((locator.value().to_string(), text.to_string()));
        Ok(())
    }

    async fn wait_visible(&self, _locator: &Locator, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn read_text(&self, locator: &Locator) -> Result<String> {
        if *locator == self.portal.selectors.result_text {
            Ok(self.script.lock().result_text.clone())
        } else {
            Err(Error::element_not_found(locator.to_string()))
        }
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.script.lock().url.clone())
    }

    fn subscribe_dialog_events(&self) -> Result<DialogStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.dialogs.lock() = Some(tx);
        Ok(rx)
    }

    async fn accept_dialog(&self) -> Result<()> {
        let mut script = self.script.lock();
        if script.fail_accept {
            return Err(Error::protocol("No dialog is showing"));
        }
        script.accepted += 1;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.script.lock().closed = true;
        self.dialogs.lock().take();
        Ok(())
    }
}

// ============================================================================
// FakeLauncher
// ============================================================================

/// Hands out pre-scripted [`FakeAgent`]s by worker.
pub(crate) struct FakeLauncher {
    agents: Mutex<FxHashMap<WorkerId, Arc<FakeAgent>>>,
    failing: Mutex<FxHashSet<WorkerId>>,
    preflight_fails: bool,
}

impl FakeLauncher {
    pub(crate) fn new() -> Self {
        Self {
            agents: Mutex::new(FxHashMap::default()),
            failing: Mutex::new(FxHashSet::default()),
            preflight_fails: false,
        }
    }

    pub(crate) fn broken() -> Self {
        Self {
            preflight_fails: true,
            ..Self::new()
        }
    }

    /// Returns the agent worker `index` will receive, creating it if needed.
    pub(crate) fn agent(&self, index: usize) -> Arc<FakeAgent> {
        Arc::clone(
            self.agents
                .lock()
                .entry(WorkerId::new(index))
                .or_insert_with(FakeAgent::new),
        )
    }

    pub(crate) fn fail_launch(&self, index: usize) {
        self.failing.lock().insert(WorkerId::new(index));
    }
}

#[async_trait]
impl AgentLauncher for FakeLauncher {
    async fn preflight(&self) -> Result<()> {
        if self.preflight_fails {
            return Err(Error::browser_not_found("chromium"));
        }
        Ok(())
    }

    async fn launch(&self, worker: WorkerId, _headless: bool) -> Result<Arc<dyn BrowserAgent>> {
        if self.failing.lock().contains(&worker) {
            return Err(Error::process_launch_failed("spawn refused"));
        }
        Ok(self.agent(worker.index()))
    }
}
