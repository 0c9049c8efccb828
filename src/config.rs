//! Engine configuration
//!
//! Lock date, fiscal-year boundaries, and the classifier budget are passed
//! into the engine at construction instead of being read from ambient state,
//! so the engine stays testable in isolation.

use chrono::{Datelike, NaiveDate};
use std::time::Duration;

/// Configuration for an accounting engine instance
#[derive(Debug, Clone)]
pub struct EngineSettings {
    /// Postings dated on or before this date are rejected
    pub lock_date: Option<NaiveDate>,
    /// First month of the fiscal year, 1-12 (4 = April, the GST convention)
    pub fiscal_year_start_month: u32,
    /// Reporting currency code; informational, the engine never converts or formats
    pub currency: String,
    /// Budget for the anomaly classifier call
    pub classifier_timeout: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            lock_date: None,
            fiscal_year_start_month: 4,
            currency: "INR".to_string(),
            classifier_timeout: Duration::from_secs(5),
        }
    }
}

impl EngineSettings {
    /// Settings with a posting lock through `lock_date`.
    pub fn with_lock_date(lock_date: NaiveDate) -> Self {
        Self {
            lock_date: Some(lock_date),
            ..Self::default()
        }
    }

    /// True when `date` falls in a locked period.
    pub fn is_date_locked(&self, date: NaiveDate) -> bool {
        self.lock_date.is_some_and(|lock| date <= lock)
    }

    /// First day of the fiscal year containing `date`.
    pub fn fiscal_year_start(&self, date: NaiveDate) -> NaiveDate {
        let month = self.fiscal_year_start_month.clamp(1, 12);
        let year = if date.month() >= month {
            date.year()
        } else {
            date.year() - 1
        };
        // Month is clamped to 1-12 and day 1 always exists.
        NaiveDate::from_ymd_opt(year, month, 1).expect("valid fiscal year start")
    }

    /// Fiscal-year label for `date`: "FY2025-26" when the year straddles
    /// calendar years, "FY2025" when it starts in January.
    pub fn fiscal_year(&self, date: NaiveDate) -> String {
        let start = self.fiscal_year_start(date);
        if self.fiscal_year_start_month.clamp(1, 12) == 1 {
            format!("FY{}", start.year())
        } else {
            format!("FY{}-{:02}", start.year(), (start.year() + 1) % 100)
        }
    }
}
