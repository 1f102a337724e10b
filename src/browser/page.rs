//! DevTools-backed browser page.
//!
//! Each [`CdpPage`] owns:
//! - One Chromium process (child process)
//! - One DevTools WebSocket connection
//! - One temporary profile directory
//!
//! and is attached to a single page target through a flat session.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tempfile::TempDir;
use tokio::process::Child;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::identifiers::{CdpSessionId, TargetId, WorkerId};
use crate::protocol::{
    BrowserCommand, Command, Event, InputCommand, MouseEventType, PageCommand, ParsedEvent,
    RuntimeCommand, TargetCommand,
};
use crate::transport::Connection;

use super::agent::{BrowserAgent, DialogEvent, DialogStream, NodeHandle};
use super::selector::Locator;

// ============================================================================
// Constants
// ============================================================================

/// Time allowed for a navigation to reach the load event.
const NAVIGATION_TIMEOUT: Duration = Duration::from_secs(30);

/// Time allowed for a graceful `Browser.close`.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(2);

/// Poll interval for [`BrowserAgent::wait_visible`].
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Returns the viewport centre of `this` after scrolling it into view.
const CENTER_FN: &str = "function() { \
    this.scrollIntoView({ block: 'center', inline: 'center' }); \
    const rect = this.getBoundingClientRect(); \
    return [rect.left + rect.width / 2, rect.top + rect.height / 2]; \
}";

/// Focuses `this` and clears any existing value.
const FOCUS_FN: &str = "function() { \
    this.focus(); \
    if ('value' in this) { this.value = ''; } \
}";

// ============================================================================
// ProcessGuard
// ============================================================================

/// Guards a child process and ensures it is killed when dropped.
pub(crate) struct ProcessGuard {
    /// The child process handle.
    child: Option<Child>,
    /// Process ID for logging.
    pid: u32,
}

impl ProcessGuard {
    /// Creates a new process guard.
    pub(crate) fn new(child: Child) -> Self {
        let pid = child.id().unwrap_or(0);
        debug!(pid, "Process guard created");
        Self {
            child: Some(child),
            pid,
        }
    }

    /// Kills the process and waits for it to exit.
    async fn kill(&mut self) {
        if let Some(mut child) = self.child.take() {
            debug!(pid = self.pid, "Killing browser process");
            if let Err(e) = child.kill().await {
                debug!(pid = self.pid, error = %e, "Failed to kill process");
            }
            if let Err(e) = child.wait().await {
                debug!(pid = self.pid, error = %e, "Failed to wait for process");
            }
            info!(pid = self.pid, "Process terminated");
        }
    }

    /// Returns the process ID.
    #[inline]
    pub(crate) fn pid(&self) -> u32 {
        self.pid
    }
}

impl Drop for ProcessGuard {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take()
            && let Err(e) = child.start_kill()
        {
            debug!(pid = self.pid, error = %e, "Failed to send kill signal in Drop");
        }
    }
}

// ============================================================================
// PageEvents
// ============================================================================

/// Event sinks shared with the connection's event handler.
#[derive(Default)]
struct PageEvents {
    /// Current dialog subscriber.
    dialogs: Mutex<Option<mpsc::UnboundedSender<DialogEvent>>>,
    /// Waiter for the next load event.
    load: Mutex<Option<oneshot::Sender<()>>>,
}

impl PageEvents {
    /// Routes one event belonging to this page.
    fn handle(&self, worker: WorkerId, event: &Event) {
        match event.parse() {
            ParsedEvent::DialogOpening {
                message,
                dialog_type,
            } => {
                debug!(%worker, dialog_type = %dialog_type, "Dialog opened");
                let delivered = self
                    .dialogs
                    .lock()
                    .as_ref()
                    .is_some_and(|tx| tx.send(DialogEvent::new(message)).is_ok());
                if !delivered {
                    warn!(%worker, "Dialog opened with no subscriber");
                }
            }

            ParsedEvent::LoadEventFired => {
                if let Some(tx) = self.load.lock().take() {
                    let _ = tx.send(());
                }
            }

            ParsedEvent::Detached { reason } => {
                warn!(%worker, reason = %reason, "Page session detached");
            }

            ParsedEvent::Unknown { .. } => {}
        }
    }
}

// ============================================================================
// CdpPage
// ============================================================================

/// A browser page driven over the Chrome DevTools Protocol.
///
/// When dropped, the browser process is killed and the profile removed.
pub struct CdpPage {
    /// Worker this page serves (for logging).
    worker: WorkerId,
    /// DevTools connection.
    connection: Connection,
    /// Page target.
    target_id: TargetId,
    /// Flat session attached to the target.
    session_id: CdpSessionId,
    /// Event sinks.
    events: Arc<PageEvents>,
    /// Browser process, taken on close.
    process: Mutex<Option<ProcessGuard>>,
    /// Profile directory, removed on drop.
    _profile: TempDir,
}

impl fmt::Debug for CdpPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CdpPage")
            .field("worker", &self.worker)
            .field("target_id", &self.target_id)
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// CdpPage - Constructor
// ============================================================================

impl CdpPage {
    /// Opens a page target on `connection` and attaches to it.
    ///
    /// # Errors
    ///
    /// Returns an error if the target cannot be created or attached.
    pub(crate) async fn attach(
        worker: WorkerId,
        connection: Connection,
        process: ProcessGuard,
        profile: TempDir,
    ) -> Result<Self> {
        let created = connection
            .call(
                None,
                Command::Target(TargetCommand::CreateTarget {
                    url: "about:blank".to_string(),
                }),
            )
            .await?;
        let target_id = TargetId::new(string_field(&created, "targetId")?);

        let attached = connection
            .call(
                None,
                Command::Target(TargetCommand::AttachToTarget {
                    target_id: target_id.clone(),
                    flatten: true,
                }),
            )
            .await?;
        let session_id = CdpSessionId::new(string_field(&attached, "sessionId")?);

        let events = Arc::new(PageEvents::default());
        {
            let events = Arc::clone(&events);
            let session = session_id.clone();
            connection.set_event_handler(Box::new(move |event: Event| {
                if event.is_for(&session) {
                    events.handle(worker, &event);
                }
            }));
        }

        connection
            .call(Some(&session_id), Command::Page(PageCommand::Enable))
            .await?;

        info!(%worker, target = %target_id, "Page attached");

        Ok(Self {
            worker,
            connection,
            target_id,
            session_id,
            events,
            process: Mutex::new(Some(process)),
            _profile: profile,
        })
    }
}

// ============================================================================
// CdpPage - Internal API
// ============================================================================

impl CdpPage {
    /// Sends a command on this page's session.
    async fn call(&self, command: Command) -> Result<Value> {
        self.connection.call(Some(&self.session_id), command).await
    }

    /// Evaluates an expression and returns its JSON value.
    async fn evaluate(&self, expression: String) -> Result<Value> {
        let result = self
            .call(Command::Runtime(RuntimeCommand::Evaluate {
                expression,
                return_by_value: true,
                await_promise: false,
            }))
            .await?;

        check_exception(&result)?;
        Ok(result.pointer("/result/value").cloned().unwrap_or(Value::Null))
    }

    /// Calls `function` with `this` bound to `node`, returning its JSON value.
    async fn call_on(&self, node: &NodeHandle, function: &str) -> Result<Value> {
        let result = self
            .call(Command::Runtime(RuntimeCommand::CallFunctionOn {
                function_declaration: function.to_string(),
                object_id: node.id().to_string(),
                return_by_value: true,
            }))
            .await?;

        check_exception(&result)?;
        Ok(result.pointer("/result/value").cloned().unwrap_or(Value::Null))
    }

    /// Returns the first match or [`Error::ElementNotFound`].
    async fn first(&self, locator: &Locator) -> Result<NodeHandle> {
        self.locate(locator)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| Error::element_not_found(locator.to_string()))
    }
}

// ============================================================================
// CdpPage - BrowserAgent
// ============================================================================

#[async_trait]
impl BrowserAgent for CdpPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        let (load_tx, load_rx) = oneshot::channel();
        *self.events.load.lock() = Some(load_tx);

        let result = self
            .call(Command::Page(PageCommand::Navigate {
                url: url.to_string(),
            }))
            .await?;

        if let Some(reason) = result
            .get("errorText")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            self.events.load.lock().take();
            return Err(Error::navigation(url, reason));
        }

        timeout(NAVIGATION_TIMEOUT, load_rx)
            .await
            .map_err(|_| {
                Error::timeout(format!("load of {url}"), NAVIGATION_TIMEOUT.as_millis() as u64)
            })??;

        debug!(worker = %self.worker, url, "Navigation complete");
        Ok(())
    }

    async fn title(&self) -> Result<String> {
        let value = self.evaluate("document.title".to_string()).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    async fn locate(&self, locator: &Locator) -> Result<Vec<NodeHandle>> {
        let result = self
            .call(Command::Runtime(RuntimeCommand::Evaluate {
                expression: locator.collect_script(),
                return_by_value: false,
                await_promise: false,
            }))
            .await?;
        check_exception(&result)?;

        let array_id = result
            .pointer("/result/objectId")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::protocol(format!("{locator} did not yield an array")))?
            .to_string();

        let properties = self
            .call(Command::Runtime(RuntimeCommand::GetProperties {
                object_id: array_id.clone(),
                own_properties: true,
            }))
            .await?;

        let mut indexed: Vec<(usize, NodeHandle)> = properties
            .get("result")
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(|property| {
                let index = property.get("name")?.as_str()?.parse::<usize>().ok()?;
                let object_id = property.pointer("/value/objectId")?.as_str()?;
                Some((index, NodeHandle::new(object_id)))
            })
            .collect();
        indexed.sort_by_key(|(index, _)| *index);

        let _ = self.connection.dispatch(
            Some(&self.session_id),
            Command::Runtime(RuntimeCommand::ReleaseObject {
                object_id: array_id,
            }),
        );

        Ok(indexed.into_iter().map(|(_, node)| node).collect())
    }

    async fn click(&self, node: &NodeHandle) -> Result<()> {
        let center = self.call_on(node, CENTER_FN).await?;
        let (x, y) = match center.as_array().map(Vec::as_slice) {
            Some([x, y]) => (
                x.as_f64().unwrap_or_default(),
                y.as_f64().unwrap_or_default(),
            ),
            _ => return Err(Error::script_error("element has no layout box")),
        };

        self.call(Command::Input(InputCommand::mouse(MouseEventType::Moved, x, y)))
            .await?;
        self.call(Command::Input(InputCommand::mouse(MouseEventType::Pressed, x, y)))
            .await?;

        // The release reply is withheld while a dialog it opened stays open.
        self.connection.dispatch(
            Some(&self.session_id),
            Command::Input(InputCommand::mouse(MouseEventType::Released, x, y)),
        )
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> Result<()> {
        let node = self.first(locator).await?;
        self.call_on(&node, FOCUS_FN).await?;
        self.call(Command::Input(InputCommand::InsertText {
            text: text.to_string(),
        }))
        .await?;
        Ok(())
    }

    async fn wait_visible(&self, locator: &Locator, wait: Duration) -> Result<()> {
        let started = Instant::now();
        loop {
            if self.evaluate(locator.visible_script()).await?.as_bool() == Some(true) {
                return Ok(());
            }
            if started.elapsed() >= wait {
                return Err(Error::timeout(
                    format!("visibility of {locator}"),
                    wait.as_millis() as u64,
                ));
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn read_text(&self, locator: &Locator) -> Result<String> {
        match self.evaluate(locator.text_script()).await? {
            Value::String(text) => Ok(text),
            _ => Err(Error::element_not_found(locator.to_string())),
        }
    }

    async fn current_url(&self) -> Result<String> {
        let value = self.evaluate("location.href".to_string()).await?;
        value
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| Error::protocol("location.href is not a string"))
    }

    fn subscribe_dialog_events(&self) -> Result<DialogStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.events.dialogs.lock() = Some(tx);
        Ok(rx)
    }

    async fn accept_dialog(&self) -> Result<()> {
        self.call(Command::Page(PageCommand::HandleJavaScriptDialog { accept: true }))
            .await?;
        Ok(())
    }

    async fn close(&self) -> Result<()> {
        let process = self.process.lock().take();
        let Some(mut process) = process else {
            return Ok(());
        };

        if let Err(e) = timeout(
            CLOSE_TIMEOUT,
            self.connection.call(None, Command::Browser(BrowserCommand::Close)),
        )
        .await
        .unwrap_or_else(|_| Err(Error::timeout("Browser.close", CLOSE_TIMEOUT.as_millis() as u64)))
        {
            debug!(worker = %self.worker, error = %e, "Graceful close failed");
        }

        self.connection.clear_event_handler();
        self.connection.shutdown();
        self.events.dialogs.lock().take();

        process.kill().await;
        info!(worker = %self.worker, "Browser closed");
        Ok(())
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Reads a required string field of a command result.
fn string_field(result: &Value, key: &str) -> Result<String> {
    result
        .get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::protocol(format!("missing '{key}' in reply")))
}

/// Converts `exceptionDetails` of a Runtime reply into an error.
fn check_exception(result: &Value) -> Result<()> {
    let Some(details) = result.get("exceptionDetails") else {
        return Ok(());
    };

    let message = details
        .pointer("/exception/description")
        .or_else(|| details.get("text"))
        .and_then(Value::as_str)
        .unwrap_or("script threw");

    Err(Error::script_error(message))
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use serde_json::{from_str, json};

    fn event(raw: &str) -> Event {
        from_str(raw).expect("event json")
    }

    #[test]
    fn test_check_exception() {
        assert!(check_exception(&json!({"result": {"value": 1}})).is_ok());

        let err = check_exception(&json!({
            "result": {},
            "exceptionDetails": {"text": "Uncaught", "exception": {"description": "TypeError: x"}}
        }))
        .expect_err("exception");
        assert!(err.to_string().contains("TypeError: x"));
    }

    #[test]
    fn test_string_field() {
        assert_eq!(
            string_field(&json!({"targetId": "T1"}), "targetId").expect("present"),
            "T1"
        );
        assert!(string_field(&json!({}), "sessionId").is_err());
    }

    #[tokio::test]
    async fn test_dialog_event_reaches_subscriber() {
        let events = PageEvents::default();
        let (tx, mut rx) = mpsc::unbounded_channel();
        *events.dialogs.lock() = Some(tx);

        events.handle(
            WorkerId::new(0),
            &event(r#"{"method":"Page.javascriptDialogOpening","params":{"message":"您是否確定預約","type":"confirm"}}"#),
        );

        assert_eq!(rx.recv().await, Some(DialogEvent::new("您是否確定預約")));
    }

    #[tokio::test]
    async fn test_load_event_wakes_waiter_once() {
        let events = PageEvents::default();
        let (tx, rx) = oneshot::channel();
        *events.load.lock() = Some(tx);

        let load = event(r#"{"method":"Page.loadEventFired","params":{"timestamp":1.0}}"#);
        events.handle(WorkerId::new(0), &load);
        events.handle(WorkerId::new(0), &load);

        assert!(rx.await.is_ok());
        assert!(events.load.lock().is_none());
    }
}
