//! Engine behaviour against a scripted browser, through the public API.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use court_reserver::{
    AgentLauncher, BrowserAgent, DialogEvent, DialogStream, Engine, Error, FailureReason, Hour,
    Locator, NodeHandle, Outcome, Portal, Result, RetryPolicy, RunConfig, WorkerId,
};

// ============================================================================
// Scripted browser
// ============================================================================

/// Portal page that confirms every slot click and raises a stray notice
/// right after login.
struct Page {
    portal: Portal,
    slot_present: bool,
    url: Mutex<String>,
    accepted: Mutex<u32>,
    dialogs: Mutex<Option<mpsc::UnboundedSender<DialogEvent>>>,
}

impl Page {
    fn new(slot_present: bool) -> Arc<Self> {
        Arc::new(Self {
            portal: Portal::default(),
            slot_present,
            url: Mutex::new(String::new()),
            accepted: Mutex::new(0),
            dialogs: Mutex::new(None),
        })
    }

    fn raise(&self, message: &str) {
        if let Some(tx) = self.dialogs.lock().as_ref() {
            let _ = tx.send(DialogEvent::new(message));
        }
    }
}

#[async_trait]
impl BrowserAgent for Page {
    async fn navigate(&self, url: &str) -> Result<()> {
        *self.url.lock() = url.to_string();
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        Ok("臺北市大同運動中心".to_string())
    }

    async fn locate(&self, locator: &Locator) -> Result<Vec<NodeHandle>> {
        let is_slot = locator.value().contains("PlaceBtn");
        if is_slot && !self.slot_present {
            return Ok(Vec::new());
        }
        Ok(vec![NodeHandle::new(locator.value())])
    }

    async fn click(&self, node: &NodeHandle) -> Result<()> {
        if node.id() == self.portal.selectors.login_button.value() {
            *self.url.lock() = self.portal.endpoints.landing.clone();
            self.raise("登入成功，請注意場地使用規範");
        } else if node.id().contains("PlaceBtn") {
            self.raise(&self.portal.phrases.confirmation);
        }
        Ok(())
    }

    async fn type_text(&self, _locator: &Locator, _text: &str) -> Result<()> {
        Ok(())
    }

    async fn wait_visible(&self, _locator: &Locator, _timeout: Duration) -> Result<()> {
        Ok(())
    }

    async fn read_text(&self, _locator: &Locator) -> Result<String> {
        Ok(self.portal.phrases.busy.clone())
    }

    async fn current_url(&self) -> Result<String> {
        Ok(self.url.lock().clone())
    }

    fn subscribe_dialog_events(&self) -> Result<DialogStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.dialogs.lock() = Some(tx);
        Ok(rx)
    }

    async fn accept_dialog(&self) -> Result<()> {
        *self.accepted.lock() += 1;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        self.dialogs.lock().take();
        Ok(())
    }
}

struct Launcher {
    pages: Vec<Arc<Page>>,
}

#[async_trait]
impl AgentLauncher for Launcher {
    async fn preflight(&self) -> Result<()> {
        Ok(())
    }

    async fn launch(&self, worker: WorkerId, _headless: bool) -> Result<Arc<dyn BrowserAgent>> {
        let page = self
            .pages
            .get(worker.index())
            .ok_or_else(|| Error::process_launch_failed("no page scripted"))?;
        Ok(Arc::clone(page) as Arc<dyn BrowserAgent>)
    }
}

fn config(hours: &[i64], dry_run: bool) -> RunConfig {
    RunConfig::builder()
        .account("A123456789")
        .password("secret")
        .date(NaiveDate::from_ymd_opt(2026, 10, 23).expect("date"))
        .hours(hours.iter().map(|h| Hour::new(*h).expect("hour")))
        .dry_run(dry_run)
        .login_policy(RetryPolicy::new(2, 1).expect("policy"))
        .reserve_policy(RetryPolicy::new(2, 100).expect("policy"))
        .build()
        .expect("config")
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn busy_portal_and_taken_slot_reported_per_worker() {
    let pages = vec![Page::new(true), Page::new(false), Page::new(true)];
    let launcher = Launcher {
        pages: pages.clone(),
    };

    let summary = Engine::new(launcher, config(&[8, 14, 20], false))
        .run()
        .await
        .expect("engine starts");

    let outcomes: Vec<Outcome> = summary.reports.iter().map(|r| r.outcome.clone()).collect();
    assert_eq!(
        outcomes,
        vec![Outcome::PortalBusy, Outcome::SlotUnavailable, Outcome::PortalBusy]
    );
}

#[tokio::test]
async fn dry_run_accepts_stray_notice_only() {
    let page = Page::new(true);
    let launcher = Launcher {
        pages: vec![Arc::clone(&page)],
    };

    let summary = Engine::new(launcher, config(&[14], true))
        .run()
        .await
        .expect("engine starts");
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(summary.reports[0].outcome, Outcome::DryRunCompleted);
    assert_eq!(*page.accepted.lock(), 1);
}

#[tokio::test]
async fn missing_browser_for_worker_is_a_slot_failure() {
    let launcher = Launcher { pages: Vec::new() };

    let summary = Engine::new(launcher, config(&[14], false))
        .run()
        .await
        .expect("engine starts");

    assert!(matches!(
        summary.reports[0].outcome,
        Outcome::Failed(FailureReason::Launch(_))
    ));
}
