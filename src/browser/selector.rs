//! Element locator strategies.
//!
//! Locators are resolved inside the page by a small JavaScript expression
//! returning matching elements as an array in document order.
//!
//! # Example
//!
//! ```ignore
//! use court_reserver::Locator;
//!
//! let button = Locator::css(r#"input[name="login_but"]"#);
//! let cells = Locator::xpath("//table/tbody/tr[position()=2]/td[4]/img");
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;

use serde_json::Value;

// ============================================================================
// Locator
// ============================================================================

/// Element locator strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// CSS selector.
    Css(String),

    /// XPath expression. Unions (`a | b`) are returned in document order.
    XPath(String),
}

impl Locator {
    /// Creates a CSS locator.
    #[inline]
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Creates an XPath locator.
    #[inline]
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Returns the strategy name.
    #[inline]
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Css(_) => "css",
            Self::XPath(_) => "xpath",
        }
    }

    /// Returns the selector or expression.
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        match self {
            Self::Css(v) | Self::XPath(v) => v,
        }
    }

    /// Returns a JavaScript expression evaluating to an `Array` of the
    /// matching elements, in document order.
    #[must_use]
    pub fn collect_script(&self) -> String {
        let literal = Value::String(self.value().to_string()).to_string();
        match self {
            Self::Css(_) => format!("Array.from(document.querySelectorAll({literal}))"),
            Self::XPath(_) => format!(
                "(() => {{ \
                    const snapshot = document.evaluate({literal}, document, null, \
                        XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); \
                    const found = []; \
                    for (let i = 0; i < snapshot.snapshotLength; i++) {{ \
                        found.push(snapshot.snapshotItem(i)); \
                    }} \
                    return found; \
                }})()"
            ),
        }
    }

    /// Returns an expression that is `true` once any match is rendered.
    #[must_use]
    pub fn visible_script(&self) -> String {
        format!(
            "{}.some((el) => {{ \
                const style = window.getComputedStyle(el); \
                const rect = el.getBoundingClientRect(); \
                return style.visibility !== 'hidden' && style.display !== 'none' \
                    && rect.width > 0 && rect.height > 0; \
            }})",
            self.collect_script()
        )
    }

    /// Returns an expression yielding the first match's text, or `null`.
    #[must_use]
    pub fn text_script(&self) -> String {
        format!(
            "(() => {{ const found = {}; return found.length ? found[0].textContent : null; }})()",
            self.collect_script()
        )
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.strategy(), self.value())
    }
}

// ============================================================================
// Tests
// ============================================================================
