//! Per-slot request parameters and retry policies.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};

use crate::error::{Error, Result};
use crate::identifiers::WorkerId;

// ============================================================================
// Constants
// ============================================================================

/// First bookable hour (the venue opens at 06:00).
pub const FIRST_HOUR: u8 = 6;

/// Last bookable hour (the 21:00 slot ends at closing time).
pub const LAST_HOUR: u8 = 21;

/// Closing hour; rejected with its own message.
const CLOSING_HOUR: i64 = 22;

// ============================================================================
// Hour
// ============================================================================

/// A bookable hour, always within `6..=21`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Hour(u8);

impl Hour {
    /// Creates an hour, rejecting values outside opening hours.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] for negative values, the closing
    /// hour, and anything else outside `6..=21`.
    pub fn new(value: i64) -> Result<Self> {
        if value < 0 {
            return Err(Error::invalid_argument(format!(
                "hour {value} is negative"
            )));
        }
        if value == CLOSING_HOUR {
            return Err(Error::invalid_argument(format!(
                "hour {value} is closing time; opening hours are {FIRST_HOUR}-{CLOSING_HOUR}"
            )));
        }
        if value < i64::from(FIRST_HOUR) || value > i64::from(LAST_HOUR) {
            return Err(Error::invalid_argument(format!(
                "hour {value} is outside opening hours {FIRST_HOUR}-{CLOSING_HOUR}"
            )));
        }
        Ok(Self(value as u8))
    }

    /// Returns the hour of day.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns the table view this hour is rendered in.
    #[inline]
    #[must_use]
    pub fn bucket(&self) -> TimeBucket {
        TimeBucket::from_hour(self.0)
    }
}

impl fmt::Display for Hour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:00", self.0)
    }
}

// ============================================================================
// TimeBucket
// ============================================================================

/// Time-of-day table view rendered by the booking page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeBucket {
    /// Hours before noon.
    Morning,
    /// Hours 12 through 17.
    Afternoon,
    /// Hours from 18 on.
    Evening,
}

impl TimeBucket {
    /// Selects the bucket containing `hour`.
    #[must_use]
    pub fn from_hour(hour: u8) -> Self {
        match hour {
            12..=17 => Self::Afternoon,
            18.. => Self::Evening,
            _ => Self::Morning,
        }
    }

    /// Returns the portal's query code (`D2=`).
    #[inline]
    #[must_use]
    pub const fn code(&self) -> u8 {
        match self {
            Self::Morning => 1,
            Self::Afternoon => 2,
            Self::Evening => 3,
        }
    }
}

// ============================================================================
// RetryPolicy
// ============================================================================

/// Bounded retry with a fixed period. Never mutated after construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed wait used between steps / as the per-attempt timeout.
    pub period: Duration,
}

impl RetryPolicy {
    /// Creates a policy.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArgument`] if `max_attempts` is zero.
    pub fn new(max_attempts: u32, period_millis: u64) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::invalid_argument(
                "retry policy needs at least one attempt",
            ));
        }
        Ok(Self {
            max_attempts,
            period: Duration::from_millis(period_millis),
        })
    }

    /// Login default: 5 attempts, 300 ms.
    #[inline]
    #[must_use]
    pub const fn login_default() -> Self {
        Self {
            max_attempts: 5,
            period: Duration::from_millis(300),
        }
    }

    /// Reservation default: 5 attempts, 150 ms.
    #[inline]
    #[must_use]
    pub const fn reservation_default() -> Self {
        Self {
            max_attempts: 5,
            period: Duration::from_millis(150),
        }
    }

    /// Returns the period in milliseconds.
    #[inline]
    #[must_use]
    pub fn period_millis(&self) -> u64 {
        self.period.as_millis() as u64
    }
}

// ============================================================================
// ReservationRequest
// ============================================================================

/// One desired hour on one date. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReservationRequest {
    /// Worker handling this request.
    pub slot_id: WorkerId,
    /// Requested hour.
    pub hour: Hour,
    /// Requested date (year resolved at parse time).
    pub date: NaiveDate,
    /// Stop at the confirmation dialog without accepting it.
    pub dry_run: bool,
}

impl ReservationRequest {
    /// Requested month (1-12).
    #[inline]
    #[must_use]
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    /// Requested day of month.
    #[inline]
    #[must_use]
    pub fn day(&self) -> u32 {
        self.date.day()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hour_accepts_opening_hours() {
        assert_eq!(Hour::new(6).expect("valid").value(), 6);
        assert_eq!(Hour::new(21).expect("valid").value(), 21);
    }

    #[test]
    fn test_hour_rejects_negative() {
        let err = Hour::new(-1).unwrap_err();
        assert!(err.to_string().contains("negative"));
    }

    #[test]
    fn test_hour_rejects_closing_time() {
        let err = Hour::new(22).unwrap_err();
        assert!(err.to_string().contains("closing time"));
    }

    #[test]
    fn test_hour_rejects_out_of_range() {
        assert!(Hour::new(5).is_err());
        assert!(Hour::new(23).is_err());
    }

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(TimeBucket::from_hour(6), TimeBucket::Morning);
        assert_eq!(TimeBucket::from_hour(11), TimeBucket::Morning);
        assert_eq!(TimeBucket::from_hour(12), TimeBucket::Afternoon);
        assert_eq!(TimeBucket::from_hour(17), TimeBucket::Afternoon);
        assert_eq!(TimeBucket::from_hour(18), TimeBucket::Evening);
        assert_eq!(TimeBucket::from_hour(21), TimeBucket::Evening);
    }

    #[test]
    fn test_bucket_codes() {
        assert_eq!(TimeBucket::Morning.code(), 1);
        assert_eq!(TimeBucket::Afternoon.code(), 2);
        assert_eq!(TimeBucket::Evening.code(), 3);
    }

    #[test]
    fn test_retry_policy_rejects_zero_attempts() {
        assert!(RetryPolicy::new(0, 100).is_err());
        let policy = RetryPolicy::new(3, 250).expect("valid");
        assert_eq!(policy.period_millis(), 250);
    }

    #[test]
    fn test_request_month_and_day() {
        let request = ReservationRequest {
            slot_id: WorkerId::new(0),
            hour: Hour::new(14).expect("valid"),
            date: NaiveDate::from_ymd_opt(2025, 4, 23).expect("valid"),
            dry_run: false,
        };
        assert_eq!(request.month(), 4);
        assert_eq!(request.day(), 23);
    }
}
