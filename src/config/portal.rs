//! Fixed contract with the reservation portal.
//!
//! Endpoints, DOM selectors and the literal phrases the portal prints.
//! All of it is specific to one portal layout; nothing here tries to be
//! generic.

// ============================================================================
// Imports
// ============================================================================

use chrono::{Datelike, NaiveDate};
use url::Url;

use crate::browser::Locator;
use crate::error::{Error, Result};

use super::request::TimeBucket;

// ============================================================================
// Constants
// ============================================================================

/// Login page.
pub const LOGIN_URL: &str = "https://bwd.xuanen.com.tw/wd02.aspx?module=login_page&files=login";

/// Landing page reached only after a successful login.
pub const LANDING_URL: &str = "https://bwd.xuanen.com.tw/wd02.aspx?Module=ind&files=ind";

/// Booking page prefix; the date and bucket code are appended.
pub const BOOKING_URL_BASE: &str = "https://bwd.xuanen.com.tw/wd02.aspx?module=net_booking&files=booking_place&StepFlag=2&PT=1&D=";

/// Order history, shown to the operator after every run.
pub const ORDER_HISTORY_URL: &str =
    "https://bwd.xuanen.com.tw/wd02.aspx?module=member&files=orderx_mt";

/// Element id of the booking table container.
pub const BOOKING_TABLE_ID: &str = "ContentPlaceHolder1_Step2_data";

// ============================================================================
// PortalEndpoints
// ============================================================================

/// URLs the reservation flow visits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalEndpoints {
    /// Login page.
    pub login: String,
    /// Expected location after a successful login (exact match).
    pub landing: String,
    /// Booking page prefix, followed by `YYYY/MM/DD&D2=<bucket>`.
    pub booking_base: String,
    /// Order history page.
    pub order_history: String,
}

impl Default for PortalEndpoints {
    fn default() -> Self {
        Self {
            login: LOGIN_URL.to_string(),
            landing: LANDING_URL.to_string(),
            booking_base: BOOKING_URL_BASE.to_string(),
            order_history: ORDER_HISTORY_URL.to_string(),
        }
    }
}

impl PortalEndpoints {
    /// Builds the booking page URL for a date and time-of-day bucket.
    ///
    /// ```ignore
    /// // https://...&D=2025/03/07&D2=2
    /// let url = endpoints.booking_url(date, TimeBucket::Afternoon);
    /// ```
    #[must_use]
    pub fn booking_url(&self, date: NaiveDate, bucket: TimeBucket) -> String {
        format!(
            "{}{}/{:02}/{:02}&D2={}",
            self.booking_base,
            date.year(),
            date.month(),
            date.day(),
            bucket.code()
        )
    }

    /// Returns `true` if `current` is exactly the post-login landing URL.
    #[inline]
    #[must_use]
    pub fn is_landing(&self, current: &str) -> bool {
        current == self.landing
    }

    /// Validates that every endpoint is an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first malformed endpoint.
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("login", &self.login),
            ("landing", &self.landing),
            ("booking", &self.booking_base),
            ("order history", &self.order_history),
        ] {
            Url::parse(value)
                .map_err(|e| Error::config(format!("{name} URL '{value}' is invalid: {e}")))?;
        }
        Ok(())
    }
}

// ============================================================================
// PortalSelectors
// ============================================================================

/// DOM locators used by the login and booking flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalSelectors {
    /// Confirm button of the announcement popup shown on the login page.
    pub notice_confirm: Locator,
    /// National ID input.
    pub account_input: Locator,
    /// Password input.
    pub password_input: Locator,
    /// Login submit control.
    pub login_button: Locator,
    /// Button closing the "login failed" popup.
    pub login_failure_dismiss: Locator,
    /// Booking table container; must be visible before slot lookup.
    pub booking_table: Locator,
    /// Element id of the booking table container (slot XPath root).
    pub booking_table_id: String,
    /// Result label on the confirmation step.
    pub result_label: Locator,
    /// Text node of the result label holding the portal message.
    pub result_text: Locator,
}

impl Default for PortalSelectors {
    fn default() -> Self {
        Self {
            notice_confirm: Locator::css("button.swal2-confirm.swal2-styled"),
            account_input: Locator::css(r#"input[name="ctl00$ContentPlaceHolder1$loginid"]"#),
            password_input: Locator::css(r#"input[name="loginpw"]"#),
            login_button: Locator::css(r#"input[name="login_but"]"#),
            login_failure_dismiss: Locator::xpath("/html/body/div[2]/div/div[3]/button[1]"),
            booking_table: Locator::css(format!("#{BOOKING_TABLE_ID}")),
            booking_table_id: BOOKING_TABLE_ID.to_string(),
            result_label: Locator::xpath(r#"//*[@id="ContentPlaceHolder1_Step3Info_lab"]"#),
            result_text: Locator::xpath(r#"//*[@id="ContentPlaceHolder1_Step3Info_lab"]/span[2]"#),
        }
    }
}

// ============================================================================
// PortalPhrases
// ============================================================================

/// Literal portal messages matched by substring.
///
/// The portal's wording is the only signal available. Matching is kept
/// literal: any change in the portal text silently degrades detection to
/// the default branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalPhrases {
    /// Confirmation dialog ("are you sure you want to reserve").
    pub confirmation: String,
    /// Daily quota exceeded ("exceeded your daily 2-slot (2-hour) limit").
    pub daily_limit: String,
    /// Portal overloaded ("system busy, please retry later").
    pub busy: String,
}

impl Default for PortalPhrases {
    fn default() -> Self {
        Self {
            confirmation: "您是否確定預約".to_string(),
            daily_limit: "您今日已預約超過可預約場地2場次(2小時)".to_string(),
            busy: "網路繁忙中，請您稍後重新執行預約作業".to_string(),
        }
    }
}

// ============================================================================
// Portal
// ============================================================================

/// Everything the engine needs to know about the portal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Portal {
    /// URLs.
    pub endpoints: PortalEndpoints,
    /// DOM locators.
    pub selectors: PortalSelectors,
    /// Matched message literals.
    pub phrases: PortalPhrases,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_booking_url_pads_month_and_day() {
        let endpoints = PortalEndpoints::default();
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).expect("valid date");

        let url = endpoints.booking_url(date, TimeBucket::Afternoon);

        assert_eq!(url, format!("{BOOKING_URL_BASE}2025/03/07&D2=2"));
    }

    #[test]
    fn test_is_landing_requires_exact_match() {
        let endpoints = PortalEndpoints::default();
        assert!(endpoints.is_landing(LANDING_URL));
        assert!(!endpoints.is_landing(LOGIN_URL));
        assert!(!endpoints.is_landing(&format!("{LANDING_URL}#top")));
    }

    #[test]
    fn test_default_endpoints_validate() {
        assert!(PortalEndpoints::default().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_relative_url() {
        let endpoints = PortalEndpoints {
            login: "/login".to_string(),
            ..Default::default()
        };
        let err = endpoints.validate().unwrap_err();
        assert!(err.to_string().contains("login URL"));
    }

    #[test]
    fn test_booking_table_selector_uses_id() {
        let selectors = PortalSelectors::default();
        assert_eq!(
            selectors.booking_table,
            Locator::css("#ContentPlaceHolder1_Step2_data")
        );
    }
}
