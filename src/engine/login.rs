//! Login state machine.
//!
//! ```text
//! Init → ClickLogin → CheckRedirect → Success
//!            ↑              │
//!            └─ RetryDismiss ┘        (after max attempts: Failed)
//! ```

// ============================================================================
// Imports
// ============================================================================

use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::browser::{BrowserAgent, Locator};
use crate::config::{Portal, RetryPolicy};
use crate::error::Result;

// ============================================================================
// Types
// ============================================================================

/// Login state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// Not started.
    Init,
    /// About to press the login control.
    ClickLogin,
    /// Checking whether the portal redirected to the landing page.
    CheckRedirect,
    /// Dismissing the failure notice before the next attempt.
    RetryDismiss,
    /// Landed on the post-login page.
    Success,
    /// Attempts exhausted.
    Failed,
}

/// Terminal state and attempts used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoginReport {
    /// `Success` or `Failed`.
    pub state: LoginState,
    /// Login clicks attempted.
    pub attempts: u32,
}

impl LoginReport {
    /// Returns `true` if the landing page was reached.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.state == LoginState::Success
    }
}

// ============================================================================
// Login
// ============================================================================

/// Presses login until the landing URL is reached or the policy runs out.
///
/// Credentials must already be typed in. A missing login or dismiss control
/// is tolerated; only an exact landing URL match counts as success.
///
/// # Errors
///
/// Returns browser transport errors; an unsuccessful login is a
/// [`LoginState::Failed`] report, not an error.
pub async fn login(
    agent: &dyn BrowserAgent,
    portal: &Portal,
    policy: &RetryPolicy,
) -> Result<LoginReport> {
    let selectors = &portal.selectors;
    let mut state = LoginState::Init;
    let mut attempts = 0;

    loop {
        state = match state {
            LoginState::Init => LoginState::ClickLogin,

            LoginState::ClickLogin if attempts >= policy.max_attempts => LoginState::Failed,

            LoginState::ClickLogin => {
                attempts += 1;
                sleep(policy.period).await;
                click_if_present(agent, &selectors.login_button).await?;
                LoginState::CheckRedirect
            }

            LoginState::CheckRedirect => {
                sleep(policy.period).await;
                let url = agent.current_url().await?;
                if portal.endpoints.is_landing(&url) {
                    LoginState::Success
                } else {
                    debug!(attempt = attempts, url = %url, "Still on login page");
                    LoginState::RetryDismiss
                }
            }

            LoginState::RetryDismiss => {
                sleep(policy.period).await;
                click_if_present(agent, &selectors.login_failure_dismiss).await?;
                LoginState::ClickLogin
            }

            LoginState::Success => {
                info!(attempts, "Login succeeded");
                return Ok(LoginReport { state, attempts });
            }

            LoginState::Failed => {
                warn!(attempts, "Login attempts exhausted");
                return Ok(LoginReport { state, attempts });
            }
        };
    }
}

/// Clicks the first match, if any. Returns whether a click happened.
async fn click_if_present(agent: &dyn BrowserAgent, locator: &Locator) -> Result<bool> {
    match agent.locate(locator).await?.first() {
        Some(node) => {
            agent.click(node).await?;
            Ok(true)
        }
        None => {
            debug!(locator = %locator, "Control absent, skipped");
            Ok(false)
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
