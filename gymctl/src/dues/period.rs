//! Billing periods and calendar month ordering.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Calendar month. Stored as the Postgres `billing_month` enum, whose
/// declaration order matches the variant order here, so both Rust and SQL
/// comparisons are calendar comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "billing_month")]
pub enum Month {
    January,
    February,
    March,
    April,
    May,
    June,
    July,
    August,
    September,
    October,
    November,
    December,
}

impl Month {
    pub const ALL: [Month; 12] = [
        Month::January,
        Month::February,
        Month::March,
        Month::April,
        Month::May,
        Month::June,
        Month::July,
        Month::August,
        Month::September,
        Month::October,
        Month::November,
        Month::December,
    ];

    /// 1-based calendar index (January = 1)
    pub fn index(self) -> u32 {
        self as u32 + 1
    }

    pub fn from_index(index: u32) -> Option<Month> {
        Month::ALL.get(index.checked_sub(1)? as usize).copied()
    }
}

impl fmt::Display for Month {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

/// A (year, month) billing period. Derived ordering is calendar ordering
/// because `year` precedes `month` in field order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub struct BillingPeriod {
    pub year: i32,
    pub month: Month,
}

impl BillingPeriod {
    pub fn new(year: i32, month: Month) -> Self {
        Self { year, month }
    }

    /// The billing period a given date falls in
    pub fn containing(date: NaiveDate) -> Self {
        // month() is always 1..=12
        let month = Month::from_index(date.month()).unwrap_or(Month::January);
        Self { year: date.year(), month }
    }

    /// First day of the period, used as the due date of generated records.
    /// None only for years outside chrono's supported range.
    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month.index(), 1)
    }
}

impl fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_index_round_trip() {
        for month in Month::ALL {
            assert_eq!(Month::from_index(month.index()), Some(month));
        }
        assert_eq!(Month::from_index(0), None);
        assert_eq!(Month::from_index(13), None);
    }

    #[test]
    fn test_month_ordering_is_calendar_not_alphabetical() {
        // Alphabetically April < August < December < February...
        assert!(Month::February < Month::April);
        assert!(Month::August < Month::December);
        assert!(Month::January < Month::September);
    }

    #[test]
    fn test_period_ordering_year_dominates() {
        let dec_2025 = BillingPeriod::new(2025, Month::December);
        let jan_2026 = BillingPeriod::new(2026, Month::January);
        assert!(dec_2025 < jan_2026);

        let jul = BillingPeriod::new(2026, Month::July);
        let aug = BillingPeriod::new(2026, Month::August);
        assert!(jul < aug);
    }

    #[test]
    fn test_containing_date() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 23).unwrap();
        assert_eq!(BillingPeriod::containing(date), BillingPeriod::new(2026, Month::August));
    }

    #[test]
    fn test_first_day() {
        let period = BillingPeriod::new(2026, Month::August);
        assert_eq!(period.first_day(), NaiveDate::from_ymd_opt(2026, 8, 1));
    }

    #[test]
    fn test_display() {
        assert_eq!(BillingPeriod::new(2026, Month::August).to_string(), "August 2026");
    }
}
