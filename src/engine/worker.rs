//! One slot, start to finish.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tracing::{Instrument, error, info, info_span};

use crate::browser::{AgentLauncher, BrowserAgent};
use crate::config::{Hour, ReservationRequest, RunConfig};
use crate::error::{Error, Result};
use crate::identifiers::WorkerId;

use super::attempt::{AttemptOutcome, reserve};
use super::login::login;
use super::outcome::{FailureReason, Outcome, classify};
use super::session::Session;
use super::slot::position;

// ============================================================================
// Constants
// ============================================================================

/// Wait for page elements rendered after a navigation or click.
const RENDER_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// SlotReport
// ============================================================================

/// Terminal report of one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotReport {
    /// Worker that handled the slot.
    pub worker: WorkerId,
    /// Requested hour.
    pub hour: Hour,
    /// How it ended.
    pub outcome: Outcome,
}

// ============================================================================
// Worker
// ============================================================================

/// Runs one request to a terminal outcome. Never fails.
///
/// The session is closed on every path. Errors are folded into
/// [`Outcome::Failed`]; nothing here affects other workers.
pub async fn run_slot(
    launcher: &dyn AgentLauncher,
    config: &RunConfig,
    request: ReservationRequest,
) -> SlotReport {
    let span = info_span!("slot", worker = %request.slot_id, hour = %request.hour);

    async move {
        info!(date = %request.date, dry_run = request.dry_run, "Slot started");

        let outcome = match Session::open(launcher, config, &request).await {
            Ok(mut session) => {
                let outcome = match drive(&mut session, config, &request).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        error!(error = %e, "Slot aborted");
                        Outcome::Failed(FailureReason::Navigation(e.to_string()))
                    }
                };
                session.close().await;
                outcome
            }
            Err(e) => {
                error!(error = %e, "Browser launch failed");
                Outcome::Failed(FailureReason::Launch(e.to_string()))
            }
        };

        info!(outcome = %outcome, "Slot finished");
        SlotReport {
            worker: request.slot_id,
            hour: request.hour,
            outcome,
        }
    }
    .instrument(span)
    .await
}

/// Login, booking page, slot click, result.
async fn drive(
    session: &mut Session,
    config: &RunConfig,
    request: &ReservationRequest,
) -> Result<Outcome> {
    let portal = &config.portal;
    let selectors = &portal.selectors;

    {
        let agent = session.agent();
        sign_in_page(agent, config).await?;

        let report = login(agent, portal, &config.login_policy).await?;
        if !report.is_success() {
            return Ok(Outcome::Failed(FailureReason::LoginExhausted {
                attempts: report.attempts,
            }));
        }

        let url = portal
            .endpoints
            .booking_url(request.date, request.hour.bucket());
        info!(url = %url, "Opening booking page");
        agent.navigate(&url).await?;
        agent
            .wait_visible(&selectors.booking_table, RENDER_TIMEOUT)
            .await?;
    }

    let slot = position(request.hour.value()).locator(&selectors.booking_table_id);
    let (agent, signal) = session.parts();
    let report = reserve(agent, &slot, &config.reserve_policy, signal).await?;

    match report.outcome {
        AttemptOutcome::SlotUnavailable => Ok(Outcome::SlotUnavailable),
        AttemptOutcome::Exhausted => Ok(Outcome::Failed(FailureReason::ReservationExhausted {
            attempts: report.attempts,
        })),
        AttemptOutcome::Confirmed if request.dry_run => Ok(Outcome::DryRunCompleted),
        AttemptOutcome::Confirmed => {
            agent
                .wait_visible(&selectors.result_label, RENDER_TIMEOUT)
                .await?;
            let text = agent.read_text(&selectors.result_text).await?;
            info!(text = %text.trim(), "Portal response");
            Ok(classify(&text, &portal.phrases))
        }
    }
}

/// Opens the login page, dismisses the announcement and types credentials.
async fn sign_in_page(agent: &dyn BrowserAgent, config: &RunConfig) -> Result<()> {
    let endpoints = &config.portal.endpoints;
    let selectors = &config.portal.selectors;

    agent.navigate(&endpoints.login).await?;

    let title = agent.title().await?;
    if title.trim().is_empty() {
        return Err(Error::navigation(&endpoints.login, "unexpected landing page"));
    }
    info!(title = %title, "Portal reached");

    agent
        .wait_visible(&selectors.notice_confirm, RENDER_TIMEOUT)
        .await?;
    let notice = agent.locate(&selectors.notice_confirm).await?;
    let button = notice
        .first()
        .ok_or_else(|| Error::element_not_found(selectors.notice_confirm.to_string()))?;
    agent.click(button).await?;

    agent
        .type_text(&selectors.account_input, &config.credentials.account)
        .await?;
    agent
        .type_text(&selectors.password_input, &config.credentials.password)
        .await?;
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::NaiveDate;

    use crate::config::RetryPolicy;
    use crate::engine::testing::FakeLauncher;

    fn config(dry_run: bool) -> RunConfig {
        RunConfig::builder()
            .account("A123456789")
            .password("secret")
            .date(NaiveDate::from_ymd_opt(2026, 10, 23).expect("date"))
            .hours([Hour::new(14).expect("hour")])
            .dry_run(dry_run)
            .login_policy(RetryPolicy::new(3, 1).expect("policy"))
            .reserve_policy(RetryPolicy::new(3, 50).expect("policy"))
            .build()
            .expect("config")
    }

    async fn run(launcher: &FakeLauncher, config: &RunConfig) -> Outcome {
        run_slot(launcher, config, config.requests()[0]).await.outcome
    }

    #[tokio::test]
    async fn test_happy_path_books_afternoon_table() {
        let launcher = FakeLauncher::new();
        let config = config(false);

        assert_eq!(run(&launcher, &config).await, Outcome::Success);

        let agent = launcher.agent(0);
        let navigations = agent.navigations();
        assert_eq!(navigations[0], config.portal.endpoints.login);
        assert!(navigations[1].ends_with("2026/10/23&D2=2"));
        assert_eq!(
            agent.typed(),
            vec![
                (
                    config.portal.selectors.account_input.value().to_string(),
                    "A123456789".to_string()
                ),
                (
                    config.portal.selectors.password_input.value().to_string(),
                    "secret".to_string()
                ),
            ]
        );

        // Accepting runs on its own task.
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(agent.accepted_dialogs(), 1);
        assert!(agent.is_closed());
    }

    #[tokio::test]
    async fn test_dry_run_is_distinct_terminal_state() {
        let launcher = FakeLauncher::new();
        let config = config(true);

        let outcome = run(&launcher, &config).await;

        assert_eq!(outcome, Outcome::DryRunCompleted);
        assert!(!outcome.is_success());
        assert!(!outcome.is_failure());
        assert_eq!(launcher.agent(0).accepted_dialogs(), 0);
        assert!(launcher.agent(0).is_closed());
    }

    #[tokio::test]
    async fn test_daily_limit_text() {
        let launcher = FakeLauncher::new();
        let config = config(false);
        launcher
            .agent(0)
            .set_result_text(&config.portal.phrases.daily_limit);

        assert_eq!(run(&launcher, &config).await, Outcome::AlreadyReservedToday);
    }

    #[tokio::test]
    async fn test_empty_title_is_navigation_failure() {
        let launcher = FakeLauncher::new();
        launcher.agent(0).set_title("");
        let config = config(false);

        let outcome = run(&launcher, &config).await;

        assert!(matches!(
            outcome,
            Outcome::Failed(FailureReason::Navigation(_))
        ));
        assert!(launcher.agent(0).is_closed());
    }

    #[tokio::test]
    async fn test_transport_error_closes_session() {
        let launcher = FakeLauncher::new();
        launcher.agent(0).fail_navigation(true);
        let config = config(false);

        let outcome = run(&launcher, &config).await;

        assert!(matches!(
            outcome,
            Outcome::Failed(FailureReason::Navigation(_))
        ));
        assert!(launcher.agent(0).is_closed());
    }

    #[tokio::test]
    async fn test_login_exhausted() {
        let launcher = FakeLauncher::new();
        launcher.agent(0).login_succeeds_after(None);
        let config = config(false);

        assert_eq!(
            run(&launcher, &config).await,
            Outcome::Failed(FailureReason::LoginExhausted { attempts: 3 })
        );
    }

    #[tokio::test]
    async fn test_unavailable_slot() {
        let launcher = FakeLauncher::new();
        launcher.agent(0).set_slots(0);
        let config = config(false);

        assert_eq!(run(&launcher, &config).await, Outcome::SlotUnavailable);
        assert_eq!(launcher.agent(0).slot_clicks(), 0);
    }

    #[tokio::test]
    async fn test_launch_failure() {
        let launcher = FakeLauncher::new();
        launcher.fail_launch(0);
        let config = config(false);

        assert!(matches!(
            run(&launcher, &config).await,
            Outcome::Failed(FailureReason::Launch(_))
        ));
    }
}
