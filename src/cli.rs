//! Command-line surface.
//!
//! Parses arguments into the immutable [`RunConfig`] and a [`Trigger`].
//! Validation happens here, before any browser starts.

// ============================================================================
// Imports
// ============================================================================

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::Parser;

use crate::browser::ChromeOptions;
use crate::config::{RetryPolicy, RunConfig, parse_date, parse_hours};
use crate::error::Result;
use crate::schedule::Trigger;

// ============================================================================
// Cli
// ============================================================================

/// Reserve court time slots on the sports center booking portal.
#[derive(Parser, Debug, Clone)]
#[command(name = "court-reserver", version)]
pub struct Cli {
    /// Portal account (national ID number)
    #[arg(short = 'n', long, env = "COURT_ACCOUNT", value_name = "ID")]
    pub account: Option<String>,

    /// Portal password
    #[arg(
        short = 'p',
        long,
        env = "COURT_PASSWORD",
        hide_env_values = true,
        value_name = "PASSWORD"
    )]
    pub password: Option<String>,

    /// Day to book as MM-DD, within the next 7 days [default: 7 days from today]
    #[arg(short = 'd', long, value_name = "MM-DD")]
    pub date: Option<String>,

    /// Hours to book, comma separated, 6-21 (e.g. 14,15)
    #[arg(short = 'H', long, value_name = "HOURS")]
    pub hours: String,

    /// Start time as a six-field cron expression: sec min hour day month weekday.
    /// Weekday is 0-6 with Sunday as 0, or Mon..Sun. Without it, runs now.
    #[arg(short = 'c', long, value_name = "EXPR")]
    pub cron: Option<String>,

    /// Run browsers without a window
    #[arg(long)]
    pub headless: bool,

    /// Stop at the confirmation dialog without booking
    #[arg(long)]
    pub dry_run: bool,

    /// Login attempts
    #[arg(long, default_value_t = 5, value_name = "N")]
    pub login_retries: u32,

    /// Wait between login steps (ms)
    #[arg(long, default_value_t = 300, value_name = "MS")]
    pub login_period: u64,

    /// Slot click attempts
    #[arg(long, default_value_t = 5, value_name = "N")]
    pub reserve_retries: u32,

    /// Wait for the confirmation dialog per click (ms)
    #[arg(long, default_value_t = 150, value_name = "MS")]
    pub reserve_period: u64,

    /// Chromium-family browser executable [default: auto-detect]
    #[arg(long, value_name = "PATH")]
    pub browser: Option<PathBuf>,

    /// Debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Validates the arguments into a run configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`](crate::Error::InvalidArgument)
    /// describing the first invalid argument.
    pub fn to_config(&self, today: NaiveDate) -> Result<RunConfig> {
        let hours = parse_hours(&self.hours)?;
        let date = parse_date(self.date.as_deref(), today)?;

        let mut builder = RunConfig::builder()
            .date(date)
            .hours(hours)
            .headless(self.headless)
            .dry_run(self.dry_run)
            .login_policy(RetryPolicy::new(self.login_retries, self.login_period)?)
            .reserve_policy(RetryPolicy::new(self.reserve_retries, self.reserve_period)?);

        if let Some(account) = &self.account {
            builder = builder.account(account);
        }
        if let Some(password) = &self.password {
            builder = builder.password(password);
        }

        builder.build()
    }

    /// Parses the start time.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schedule`](crate::Error::Schedule) for an invalid
    /// expression.
    pub fn trigger(&self) -> Result<Trigger> {
        Trigger::parse(self.cron.as_deref())
    }

    /// Browser process options.
    #[must_use]
    pub fn chrome_options(&self) -> ChromeOptions {
        ChromeOptions::new().with_window_size(1280, 900)
    }

    /// Default log filter when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_filter(&self) -> &'static str {
        if self.debug {
            "court_reserver=debug"
        } else {
            "court_reserver=info"
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use clap::CommandFactory;

    use crate::error::Error;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).expect("date")
    }

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["court-reserver"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("parses")
    }

    #[test]
    fn test_command_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_full_arguments() {
        let cli = parse(&[
            "-n", "A123456789", "-p", "pw", "-d", "10-20", "-H", "14, 15", "--dry-run",
            "--login-retries", "3", "--reserve-period", "200",
        ]);
        let config = cli.to_config(today()).expect("valid");

        assert_eq!(config.date, NaiveDate::from_ymd_opt(2026, 10, 20).expect("date"));
        assert_eq!(config.hours.len(), 2);
        assert!(config.dry_run);
        assert_eq!(config.login_policy.max_attempts, 3);
        assert_eq!(config.reserve_policy.period_millis(), 200);
        assert_eq!(config.reserve_policy.max_attempts, 5);
    }

    #[test]
    fn test_default_date_is_a_week_out() {
        let cli = parse(&["-n", "A1", "-p", "pw", "-H", "20"]);
        let config = cli.to_config(today()).expect("valid");
        assert_eq!(config.date, NaiveDate::from_ymd_opt(2026, 10, 23).expect("date"));
    }

    #[test]
    fn test_missing_account_rejected() {
        let cli = Cli {
            account: None,
            ..parse(&["-p", "pw", "-H", "20"])
        };
        assert!(matches!(
            cli.to_config(today()),
            Err(Error::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_zero_retries_rejected() {
        let cli = parse(&["-n", "A1", "-p", "pw", "-H", "20", "--reserve-retries", "0"]);
        assert!(cli.to_config(today()).is_err());
    }

    #[test]
    fn test_trigger_and_filter() {
        let cli = parse(&["-n", "A1", "-p", "pw", "-H", "20", "-c", "0 0 0 * * *", "--debug"]);
        assert!(matches!(cli.trigger(), Ok(Trigger::Cron { .. })));
        assert_eq!(cli.log_filter(), "court_reserver=debug");

        let bad = parse(&["-n", "A1", "-p", "pw", "-H", "20", "-c", "0 0 * * *"]);
        assert!(bad.trigger().is_err());
    }
}
