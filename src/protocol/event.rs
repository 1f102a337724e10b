//! Event message types.
//!
//! Events are notifications the browser pushes without a request id.
//!
//! # Event Types
//!
//! | Method | Parsed as |
//! |--------|-----------|
//! | `Page.javascriptDialogOpening` | [`ParsedEvent::DialogOpening`] |
//! | `Page.loadEventFired` | [`ParsedEvent::LoadEventFired`] |
//! | `Target.detachedFromTarget` | [`ParsedEvent::Detached`] |
//! | anything else | [`ParsedEvent::Unknown`] |

// ============================================================================
// Imports
// ============================================================================

use serde::Deserialize;
use serde_json::Value;

use crate::identifiers::CdpSessionId;

// ============================================================================
// Event
// ============================================================================

/// An event notification from the browser.
///
/// # Format
///
/// ```json
/// {
///   "method": "Page.javascriptDialogOpening",
///   "params": { "message": "...", "type": "confirm" },
///   "sessionId": "8F1C..."
/// }
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Event {
    /// Event name in `Domain.eventName` format.
    pub method: String,

    /// Event-specific data.
    #[serde(default)]
    pub params: Value,

    /// Session the event belongs to (absent for browser-level events).
    #[serde(rename = "sessionId", default)]
    pub session_id: Option<CdpSessionId>,
}

impl Event {
    /// Returns the domain name from the method.
    #[inline]
    #[must_use]
    pub fn domain(&self) -> &str {
        self.method.split('.').next().unwrap_or_default()
    }

    /// Returns `true` if the event belongs to `session`.
    #[inline]
    #[must_use]
    pub fn is_for(&self, session: &CdpSessionId) -> bool {
        self.session_id.as_ref() == Some(session)
    }

    /// Parses the event into a typed variant.
    #[must_use]
    pub fn parse(&self) -> ParsedEvent {
        match self.method.as_str() {
            "Page.javascriptDialogOpening" => ParsedEvent::DialogOpening {
                message: self.param_str("message"),
                dialog_type: self.param_str("type"),
            },
            "Page.loadEventFired" => ParsedEvent::LoadEventFired,
            "Target.detachedFromTarget" => ParsedEvent::Detached {
                reason: self.param_str("reason"),
            },
            _ => ParsedEvent::Unknown {
                method: self.method.clone(),
            },
        }
    }

    fn param_str(&self, key: &str) -> String {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

// ============================================================================
// ParsedEvent
// ============================================================================

/// Typed view of the events the driver reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedEvent {
    /// A modal `alert`/`confirm`/`prompt` opened.
    DialogOpening {
        /// Dialog text.
        message: String,
        /// `alert`, `confirm`, `prompt` or `beforeunload`.
        dialog_type: String,
    },
    /// The page finished loading.
    LoadEventFired,
    /// The session was detached from its target.
    Detached {
        /// Browser supplied reason, may be empty.
        reason: String,
    },
    /// Anything not handled above.
    Unknown {
        /// Original method name.
        method: String,
    },
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dialog_opening() {
        let event: Event = serde_json::from_str(
            r#"{
                "method": "Page.javascriptDialogOpening",
                "params": {"message": "您是否確定預約?", "type": "confirm", "url": "x"},
                "sessionId": "S1"
            }"#,
        )
        .expect("parse");

        assert_eq!(event.domain(), "Page");
        assert!(event.is_for(&CdpSessionId::new("S1")));
        assert_eq!(
            event.parse(),
            ParsedEvent::DialogOpening {
                message: "您是否確定預約?".to_string(),
                dialog_type: "confirm".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_load_without_session() {
        let event: Event =
            serde_json::from_str(r#"{"method": "Page.loadEventFired", "params": {}}"#)
                .expect("parse");
        assert_eq!(event.parse(), ParsedEvent::LoadEventFired);
        assert!(!event.is_for(&CdpSessionId::new("S1")));
    }

    #[test]
    fn test_parse_unknown() {
        let event: Event =
            serde_json::from_str(r#"{"method": "Network.requestWillBeSent"}"#).expect("parse");
        assert_eq!(
            event.parse(),
            ParsedEvent::Unknown {
                method: "Network.requestWillBeSent".to_string()
            }
        );
    }
}
