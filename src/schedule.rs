//! Scheduling trigger.
//!
//! Runs a job once right away, or at every match of a six-field cron
//! expression (`sec min hour day-of-month month day-of-week`) until Ctrl-C.
//!
//! Day-of-week is `0-6` with Sunday as `0`, or a name (`Mon`, `Sat`).
//! Numeric days are shifted to the `cron` crate's `1-7` numbering before
//! parsing, so `0 0 0 ? * 5` fires on Fridays.
//!
//! # Example
//!
//! ```no_run
//! use court_reserver::Trigger;
//!
//! # async fn example() -> court_reserver::Result<()> {
//! // Every Friday at 00:00:00.
//! let trigger = Trigger::parse(Some("0 0 0 ? * 5"))?;
//! trigger.run(|| async { println!("fire") }).await?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::future::Future;
use std::io;
use std::result::Result as StdResult;
use std::str::FromStr;
use std::time::Duration;

use chrono::{DateTime, Local};
use cron::Schedule;
use tokio::time::sleep;
use tracing::info;

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Fields in an accepted expression.
const CRON_FIELDS: usize = 6;

/// Position of the day-of-week field.
const WEEKDAY_FIELD: usize = 5;

/// Highest numeric day-of-week (Saturday).
const LAST_WEEKDAY: u8 = 6;

// ============================================================================
// Trigger
// ============================================================================

/// When to run.
#[derive(Debug, Clone)]
pub enum Trigger {
    /// Once, now.
    Immediate,
    /// At every match of the expression.
    Cron {
        /// Expression as given.
        expression: String,
        /// Parsed schedule.
        schedule: Box<Schedule>,
    },
}

impl Trigger {
    /// Parses an optional cron expression; `None` or blank is immediate.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Schedule`] if the expression does not have exactly
    /// six fields, names a numeric weekday outside `0-6`, or does not parse.
    pub fn parse(expression: Option<&str>) -> Result<Self> {
        let Some(expression) = expression.map(str::trim).filter(|s| !s.is_empty()) else {
            return Ok(Self::Immediate);
        };

        let mut fields: Vec<String> = expression.split_whitespace().map(str::to_string).collect();
        if fields.len() != CRON_FIELDS {
            return Err(Error::schedule(
                expression,
                format!(
                    "expected {CRON_FIELDS} fields (sec min hour day month weekday), got {}",
                    fields.len()
                ),
            ));
        }

        fields[WEEKDAY_FIELD] = shift_weekdays(&fields[WEEKDAY_FIELD])
            .map_err(|message| Error::schedule(expression, message))?;

        let schedule = Schedule::from_str(&fields.join(" "))
            .map_err(|e| Error::schedule(expression, e.to_string()))?;

        Ok(Self::Cron {
            expression: expression.to_string(),
            schedule: Box::new(schedule),
        })
    }

    /// Returns the first firing strictly after `after`.
    ///
    /// Immediate triggers fire at `after` itself.
    #[must_use]
    pub fn next_fire(&self, after: DateTime<Local>) -> Option<DateTime<Local>> {
        match self {
            Self::Immediate => Some(after),
            Self::Cron { schedule, .. } => schedule.after(&after).next(),
        }
    }

    /// Returns how long to sleep from `now` until the next firing.
    #[must_use]
    pub fn next_wait(&self, now: DateTime<Local>) -> Option<Duration> {
        self.next_fire(now)
            .map(|next| (next - now).to_std().unwrap_or(Duration::ZERO))
    }

    /// Runs `job` according to the trigger, stopping on Ctrl-C.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the Ctrl-C handler cannot be installed.
    pub async fn run<F, Fut>(&self, job: F) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        self.run_until(job, tokio::signal::ctrl_c()).await
    }

    /// Runs `job` according to the trigger until `stop` completes.
    ///
    /// A cron trigger keeps waiting for the next match after each run and
    /// returns when `stop` completes (checked while waiting) or when the
    /// schedule has no future match. A running job is never interrupted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if `stop` fails.
    pub async fn run_until<F, Fut, S>(&self, mut job: F, stop: S) -> Result<()>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
        S: Future<Output = io::Result<()>>,
    {
        let expression = match self {
            Self::Immediate => {
                job().await;
                return Ok(());
            }
            Self::Cron { expression, .. } => expression,
        };

        tokio::pin!(stop);

        loop {
            let now = Local::now();
            let Some(wait) = self.next_wait(now) else {
                info!(expression = %expression, "Schedule has no further matches");
                return Ok(());
            };

            info!(expression = %expression, wait_ms = wait.as_millis() as u64, "Waiting for schedule");

            tokio::select! {
                () = sleep(wait) => job().await,
                stopped = &mut stop => {
                    stopped?;
                    info!("Interrupted, stopping scheduler");
                    return Ok(());
                }
            }
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Rewrites numeric days in a day-of-week field from `0-6` (Sunday = 0) to
/// the `1-7` (Sunday = 1) numbering the `cron` crate expects.
///
/// Lists, ranges and the range part of steps are shifted; step sizes, `*`,
/// `?` and day names are kept.
fn shift_weekdays(field: &str) -> StdResult<String, String> {
    field
        .split(',')
        .map(|item| -> StdResult<String, String> {
            let (range, step) = match item.split_once('/') {
                Some((range, step)) => (range, Some(step)),
                None => (item, None),
            };

            let range = range
                .split('-')
                .map(shift_weekday)
                .collect::<StdResult<Vec<_>, _>>()?
                .join("-");

            Ok(match step {
                Some(step) => format!("{range}/{step}"),
                None => range,
            })
        })
        .collect::<StdResult<Vec<_>, _>>()
        .map(|items| items.join(","))
}

/// Shifts one day token; non-numeric tokens pass through.
fn shift_weekday(token: &str) -> StdResult<String, String> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(token.to_string());
    }

    match token.parse::<u8>() {
        Ok(day) if day <= LAST_WEEKDAY => Ok((day + 1).to_string()),
        _ => Err(format!(
            "day-of-week '{token}' is outside 0-{LAST_WEEKDAY} (Sunday is 0)"
        )),
    }
}

// ============================================================================
// Tests
// ============================================================================
