//! Command definitions organized by CDP domain.
//!
//! Only the handful of DevTools methods the reservation flow needs.
//!
//! # Command Domains
//!
//! | Domain | Commands |
//! |--------|----------|
//! | `Target` | Create and attach the page target |
//! | `Page` | Enable events, navigate, answer dialogs |
//! | `Runtime` | Evaluate scripts, call functions on remote objects |
//! | `Input` | Mouse events, text insertion |
//! | `Browser` | Shutdown |

// ============================================================================
// Imports
// ============================================================================

use serde::Serialize;

use crate::identifiers::TargetId;

// ============================================================================
// Command Wrapper
// ============================================================================

/// All protocol commands organized by domain.
///
/// Serializes to `{"method": "Domain.method", "params": {...}}`.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Command {
    /// Target domain commands.
    Target(TargetCommand),
    /// Page domain commands.
    Page(PageCommand),
    /// Runtime domain commands.
    Runtime(RuntimeCommand),
    /// Input domain commands.
    Input(InputCommand),
    /// Browser domain commands.
    Browser(BrowserCommand),
}

impl Command {
    /// Returns the CDP method name, for logging.
    #[must_use]
    pub fn method(&self) -> &'static str {
        match self {
            Self::Target(TargetCommand::CreateTarget { .. }) => "Target.createTarget",
            Self::Target(TargetCommand::AttachToTarget { .. }) => "Target.attachToTarget",
            Self::Page(PageCommand::Enable) => "Page.enable",
            Self::Page(PageCommand::Navigate { .. }) => "Page.navigate",
            Self::Page(PageCommand::HandleJavaScriptDialog { .. }) => {
                "Page.handleJavaScriptDialog"
            }
            Self::Runtime(RuntimeCommand::Evaluate { .. }) => "Runtime.evaluate",
            Self::Runtime(RuntimeCommand::CallFunctionOn { .. }) => "Runtime.callFunctionOn",
            Self::Runtime(RuntimeCommand::GetProperties { .. }) => "Runtime.getProperties",
            Self::Runtime(RuntimeCommand::ReleaseObject { .. }) => "Runtime.releaseObject",
            Self::Input(InputCommand::DispatchMouseEvent { .. }) => "Input.dispatchMouseEvent",
            Self::Input(InputCommand::InsertText { .. }) => "Input.insertText",
            Self::Browser(BrowserCommand::Close) => "Browser.close",
        }
    }
}

// ============================================================================
// Target Commands
// ============================================================================

/// Target domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum TargetCommand {
    /// Opens a new page target.
    #[serde(rename = "Target.createTarget")]
    CreateTarget {
        /// Initial URL.
        url: String,
    },

    /// Attaches to a target, returning a session id.
    #[serde(rename = "Target.attachToTarget")]
    AttachToTarget {
        /// Target to attach to.
        #[serde(rename = "targetId")]
        target_id: TargetId,
        /// Use flat session mode (session id on each message).
        flatten: bool,
    },
}

// ============================================================================
// Page Commands
// ============================================================================

/// Page domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum PageCommand {
    /// Enables page events (load, dialogs).
    #[serde(rename = "Page.enable")]
    Enable,

    /// Navigates the page.
    #[serde(rename = "Page.navigate")]
    Navigate {
        /// URL to navigate to.
        url: String,
    },

    /// Accepts or dismisses the open JavaScript dialog.
    #[serde(rename = "Page.handleJavaScriptDialog")]
    HandleJavaScriptDialog {
        /// `true` to press OK.
        accept: bool,
    },
}

// ============================================================================
// Runtime Commands
// ============================================================================

/// Runtime domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum RuntimeCommand {
    /// Evaluates an expression in the page's main world.
    #[serde(rename = "Runtime.evaluate")]
    Evaluate {
        /// JavaScript expression.
        expression: String,
        /// Return a JSON value instead of a remote object.
        #[serde(rename = "returnByValue")]
        return_by_value: bool,
        /// Await a returned promise.
        #[serde(rename = "awaitPromise")]
        await_promise: bool,
    },

    /// Calls a function with `this` bound to a remote object.
    #[serde(rename = "Runtime.callFunctionOn")]
    CallFunctionOn {
        /// Function source.
        #[serde(rename = "functionDeclaration")]
        function_declaration: String,
        /// Remote object used as `this`.
        #[serde(rename = "objectId")]
        object_id: String,
        /// Return a JSON value instead of a remote object.
        #[serde(rename = "returnByValue")]
        return_by_value: bool,
    },

    /// Lists properties of a remote object (used to split arrays).
    #[serde(rename = "Runtime.getProperties")]
    GetProperties {
        /// Remote object.
        #[serde(rename = "objectId")]
        object_id: String,
        /// Skip the prototype chain.
        #[serde(rename = "ownProperties")]
        own_properties: bool,
    },

    /// Releases a remote object.
    #[serde(rename = "Runtime.releaseObject")]
    ReleaseObject {
        /// Remote object.
        #[serde(rename = "objectId")]
        object_id: String,
    },
}

// ============================================================================
// Input Commands
// ============================================================================

/// Mouse event kind for [`InputCommand::DispatchMouseEvent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MouseEventType {
    /// Pointer move.
    #[serde(rename = "mouseMoved")]
    Moved,
    /// Button down.
    #[serde(rename = "mousePressed")]
    Pressed,
    /// Button up.
    #[serde(rename = "mouseReleased")]
    Released,
}

/// Input domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum InputCommand {
    /// Dispatches a left-button mouse event at viewport coordinates.
    #[serde(rename = "Input.dispatchMouseEvent")]
    DispatchMouseEvent {
        /// Event kind.
        #[serde(rename = "type")]
        event_type: MouseEventType,
        /// Viewport x.
        x: f64,
        /// Viewport y.
        y: f64,
        /// Mouse button (`left`).
        button: String,
        /// Click count (1 for press/release, 0 for move).
        #[serde(rename = "clickCount")]
        click_count: u32,
    },

    /// Inserts text into the focused element.
    #[serde(rename = "Input.insertText")]
    InsertText {
        /// Text to insert.
        text: String,
    },
}

impl InputCommand {
    /// Left-button mouse event at `(x, y)`.
    #[must_use]
    pub fn mouse(event_type: MouseEventType, x: f64, y: f64) -> Self {
        let click_count = match event_type {
            MouseEventType::Moved => 0,
            MouseEventType::Pressed | MouseEventType::Released => 1,
        };
        Self::DispatchMouseEvent {
            event_type,
            x,
            y,
            button: "left".to_string(),
            click_count,
        }
    }
}

// ============================================================================
// Browser Commands
// ============================================================================

/// Browser domain commands.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "method", content = "params")]
pub enum BrowserCommand {
    /// Closes the browser gracefully.
    #[serde(rename = "Browser.close")]
    Close,
}

// ============================================================================
// Tests
// ============================================================================
