//! Immutable run configuration and argument validation.
//!
//! A [`RunConfig`] is built once, before anything runs, and shared
//! read-only with the engine and every worker.
//!
//! # Example
//!
//! ```ignore
//! use court_reserver::config::{RunConfig, parse_hours, parse_date};
//!
//! let today = chrono::Local::now().date_naive();
//! let config = RunConfig::builder()
//!     .account("A123456789")
//!     .password("secret")
//!     .date(parse_date(Some("03-07"), today)?)
//!     .hours(parse_hours("14,15")?)
//!     .dry_run(true)
//!     .build()?;
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;

use crate::error::{Error, Result};
use crate::identifiers::WorkerId;

use super::portal::Portal;
use super::request::{Hour, ReservationRequest, RetryPolicy};

// ============================================================================
// Constants
// ============================================================================

/// Furthest day (from today) the portal accepts bookings for.
const BOOKING_HORIZON_DAYS: u64 = 7;

/// `M-DD` / `MM-DD`.
static DATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<month>\d{1,2})-(?P<day>\d{2})$").expect("static date pattern")
});

// ============================================================================
// Credentials
// ============================================================================

/// Portal login. The password never appears in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// National ID used as the account name.
    pub account: String,
    /// Account password.
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account", &self.account)
            .field("password", &"<redacted>")
            .finish()
    }
}

// ============================================================================
// RunConfig
// ============================================================================

/// Everything one run needs. Constructed once; never mutated.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Portal login.
    pub credentials: Credentials,
    /// Date to book.
    pub date: NaiveDate,
    /// Hours to book, one worker each, in command-line order.
    pub hours: Vec<Hour>,
    /// Run browsers without a visible window.
    pub headless: bool,
    /// Stop at the confirmation dialog.
    pub dry_run: bool,
    /// Login retry policy.
    pub login_policy: RetryPolicy,
    /// Slot click retry policy.
    pub reserve_policy: RetryPolicy,
    /// Portal contract.
    pub portal: Portal,
}

impl RunConfig {
    /// Creates a configuration builder.
    #[inline]
    #[must_use]
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder::new()
    }

    /// Expands the configuration into one request per hour.
    #[must_use]
    pub fn requests(&self) -> Vec<ReservationRequest> {
        self.hours
            .iter()
            .enumerate()
            .map(|(index, hour)| ReservationRequest {
                slot_id: WorkerId::new(index),
                hour: *hour,
                date: self.date,
                dry_run: self.dry_run,
            })
            .collect()
    }
}

// ============================================================================
// RunConfigBuilder
// ============================================================================

/// Builder for [`RunConfig`].
#[derive(Debug, Clone)]
pub struct RunConfigBuilder {
    account: Option<String>,
    password: Option<String>,
    date: Option<NaiveDate>,
    hours: Vec<Hour>,
    headless: bool,
    dry_run: bool,
    login_policy: RetryPolicy,
    reserve_policy: RetryPolicy,
    portal: Portal,
}

impl Default for RunConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RunConfigBuilder {
    /// Creates a builder with default policies and portal.
    #[must_use]
    pub fn new() -> Self {
        Self {
            account: None,
            password: None,
            date: None,
            hours: Vec::new(),
            headless: false,
            dry_run: false,
            login_policy: RetryPolicy::login_default(),
            reserve_policy: RetryPolicy::reservation_default(),
            portal: Portal::default(),
        }
    }

    /// Sets the account (national ID).
    #[inline]
    #[must_use]
    pub fn account(mut self, account: impl Into<String>) -> Self {
        self.account = Some(account.into());
        self
    }

    /// Sets the password.
    #[inline]
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the date to book.
    #[inline]
    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Sets the hours to book.
    #[inline]
    #[must_use]
    pub fn hours(mut self, hours: impl IntoIterator<Item = Hour>) -> Self {
        self.hours = hours.into_iter().collect();
        self
    }

    /// Enables or disables headless browsers.
    #[inline]
    #[must_use]
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Enables or disables dry-run mode.
    #[inline]
    #[must_use]
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Overrides the login retry policy.
    #[inline]
    #[must_use]
    pub fn login_policy(mut self, policy: RetryPolicy) -> Self {
        self.login_policy = policy;
        self
    }

    /// Overrides the reservation retry policy.
    #[inline]
    #[must_use]
    pub fn reserve_policy(mut self, policy: RetryPolicy) -> Self {
        self.reserve_policy = policy;
        self
    }

    /// Overrides the portal contract.
    #[inline]
    #[must_use]
    pub fn portal(mut self, portal: Portal) -> Self {
        self.portal = portal;
        self
    }

    /// Builds the configuration with validation.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidArgument`] if account, password, date or hours are missing
    /// - [`Error::Config`] if a portal endpoint is malformed
    pub fn build(self) -> Result<RunConfig> {
        let account = self
            .account
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::invalid_argument("account is required"))?;
        let password = self
            .password
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::invalid_argument("password is required"))?;
        let date = self
            .date
            .ok_or_else(|| Error::invalid_argument("date is required"))?;
        if self.hours.is_empty() {
            return Err(Error::invalid_argument("at least one hour is required"));
        }
        self.portal.endpoints.validate()?;

        Ok(RunConfig {
            credentials: Credentials { account, password },
            date,
            hours: self.hours,
            headless: self.headless,
            dry_run: self.dry_run,
            login_policy: self.login_policy,
            reserve_policy: self.reserve_policy,
            portal: self.portal,
        })
    }
}

// ============================================================================
// Argument Parsing
// ============================================================================

/// Parses a comma separated hour list such as `"14, 15"`.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for an empty list, a non-numeric
/// entry, or an hour outside opening hours.
pub fn parse_hours(input: &str) -> Result<Vec<Hour>> {
    if input.trim().is_empty() {
        return Err(Error::invalid_argument("no hours given"));
    }

    input
        .split(',')
        .map(str::trim)
        .map(|entry| {
            let value: i64 = entry.parse().map_err(|e| {
                Error::invalid_argument(format!("cannot parse hour '{entry}': {e}"))
            })?;
            Hour::new(value)
        })
        .collect()
}

/// Returns the inclusive range of bookable dates: tomorrow through a week out.
#[must_use]
pub fn booking_window(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today.checked_add_days(Days::new(1)).unwrap_or(today);
    let end = today
        .checked_add_days(Days::new(BOOKING_HORIZON_DAYS))
        .unwrap_or(today);
    (start, end)
}

/// Parses the `MM-DD` date argument.
///
/// Without input, the last bookable day (today + 7) is used. The year is
/// the one that puts the date inside the booking window, so `01-02` typed
/// on December 30th means next January.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] if the text does not match `MM-DD`,
/// names no real calendar day, or falls outside the booking window.
pub fn parse_date(input: Option<&str>, today: NaiveDate) -> Result<NaiveDate> {
    let (start, end) = booking_window(today);

    let Some(input) = input.filter(|s| !s.is_empty()) else {
        return Ok(end);
    };

    let captures = DATE_PATTERN
        .captures(input)
        .ok_or_else(|| Error::invalid_argument(format!("date '{input}' is not MM-DD")))?;

    let month: u32 = captures["month"]
        .parse()
        .map_err(|_| Error::invalid_argument(format!("cannot parse month in '{input}'")))?;
    let day: u32 = captures["day"]
        .parse()
        .map_err(|_| Error::invalid_argument(format!("cannot parse day in '{input}'")))?;

    let candidates: Vec<NaiveDate> = [today.year(), today.year() + 1]
        .into_iter()
        .filter_map(|year| NaiveDate::from_ymd_opt(year, month, day))
        .collect();

    if candidates.is_empty() {
        return Err(Error::invalid_argument(format!(
            "date '{input}' is not a calendar day"
        )));
    }

    candidates
        .into_iter()
        .find(|date| *date >= start && *date <= end)
        .ok_or_else(|| {
            Error::invalid_argument(format!(
                "date '{input}' must be between {} and {}",
                start.format("%m-%d"),
                end.format("%m-%d")
            ))
        })
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
    }

    #[test]
    fn test_parse_hours_trims_entries() {
        let hours = parse_hours("14, 15 ,6").expect("valid hours");
        let values: Vec<u8> = hours.iter().map(Hour::value).collect();
        assert_eq!(values, vec![14, 15, 6]);
    }

    #[test]
    fn test_parse_hours_rejects_garbage() {
        let err = parse_hours("14,abc").unwrap_err();
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_parse_hours_rejects_empty() {
        assert!(parse_hours("").is_err());
        assert!(parse_hours("   ").is_err());
    }

    #[test]
    fn test_parse_hours_rejects_closing_time() {
        assert!(parse_hours("21,22").is_err());
    }

    #[test]
    fn test_parse_date_defaults_to_last_bookable_day() {
        let today = day(2025, 4, 16);
        assert_eq!(parse_date(None, today).expect("default"), day(2025, 4, 23));
        assert_eq!(parse_date(Some(""), today).expect("default"), day(2025, 4, 23));
    }

    #[test]
    fn test_parse_date_inside_window() {
        let today = day(2025, 4, 16);
        assert_eq!(parse_date(Some("04-17"), today).expect("tomorrow"), day(2025, 4, 17));
        assert_eq!(parse_date(Some("4-23"), today).expect("week out"), day(2025, 4, 23));
    }

    #[test]
    fn test_parse_date_rejects_today_and_beyond_horizon() {
        let today = day(2025, 4, 16);
        assert!(parse_date(Some("04-16"), today).is_err());
        assert!(parse_date(Some("04-24"), today).is_err());
    }

    #[test]
    fn test_parse_date_rolls_over_year() {
        let today = day(2025, 12, 30);
        assert_eq!(parse_date(Some("01-02"), today).expect("january"), day(2026, 1, 2));
    }

    #[test]
    fn test_parse_date_rejects_bad_format_and_calendar() {
        let today = day(2025, 4, 16);
        assert!(parse_date(Some("2025-04-17"), today).is_err());
        assert!(parse_date(Some("04-7"), today).is_err());
        let err = parse_date(Some("02-30"), today).unwrap_err();
        assert!(err.to_string().contains("calendar day"));
    }

    #[test]
    fn test_builder_requires_credentials() {
        let err = RunConfig::builder()
            .date(day(2025, 4, 20))
            .hours(parse_hours("14").expect("valid"))
            .build()
            .unwrap_err();
        assert!(err.to_string().contains("account"));
    }

    #[test]
    fn test_requests_follow_hour_order() {
        let config = RunConfig::builder()
            .account("A123456789")
            .password("pw")
            .date(day(2025, 4, 20))
            .hours(parse_hours("18,7").expect("valid"))
            .dry_run(true)
            .build()
            .expect("valid config");

        let requests = config.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].slot_id, WorkerId::new(0));
        assert_eq!(requests[0].hour.value(), 18);
        assert_eq!(requests[1].slot_id, WorkerId::new(1));
        assert_eq!(requests[1].hour.value(), 7);
        assert!(requests.iter().all(|r| r.dry_run));
    }

    #[test]
    fn test_credentials_debug_hides_password() {
        let credentials = Credentials {
            account: "A123456789".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("A123456789"));
        assert!(!rendered.contains("hunter2"));
    }
}
