//! Standing classification: is a member paid up, due, or overdue?

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::period::BillingPeriod;

/// Lifecycle state of a single payment record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Due,
    Paid,
}

/// A member's overall standing, derived from their payment records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Standing {
    Paid,
    Due,
    Overdue,
}

/// The slice of a payment record the classifier needs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodRecord {
    pub period: BillingPeriod,
    pub status: PaymentStatus,
    pub amount: i64,
}

/// Classification result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StandingReport {
    pub status: Standing,
    /// Unpaid records from periods strictly before the current one
    pub overdue_count: u32,
    /// Human-readable summary, e.g. "Paid", "Due", "Due x 3". The count
    /// shown includes the current period's record when it is itself unpaid.
    pub display_text: String,
}

/// Classify a member's standing for the given current period.
///
/// - overdue: any unpaid record from a strictly earlier period exists
/// - paid: the current period's record exists and is paid, and nothing is
///   overdue
/// - due: everything else (no current record yet, or current record unpaid)
pub fn classify(records: &[PeriodRecord], current: BillingPeriod) -> StandingReport {
    let overdue_count = records
        .iter()
        .filter(|r| r.status == PaymentStatus::Due && r.period < current)
        .count() as u32;

    let current_record = records.iter().find(|r| r.period == current);
    let current_due = current_record.is_some_and(|r| r.status == PaymentStatus::Due);
    let current_paid = current_record.is_some_and(|r| r.status == PaymentStatus::Paid);

    if overdue_count > 0 {
        let display_count = overdue_count + u32::from(current_due);
        StandingReport {
            status: Standing::Overdue,
            overdue_count,
            display_text: format!("Due x {display_count}"),
        }
    } else if current_paid {
        StandingReport {
            status: Standing::Paid,
            overdue_count: 0,
            display_text: "Paid".to_string(),
        }
    } else {
        StandingReport {
            status: Standing::Due,
            overdue_count: 0,
            display_text: "Due".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dues::period::Month;

    fn record(year: i32, month: Month, status: PaymentStatus) -> PeriodRecord {
        PeriodRecord {
            period: BillingPeriod::new(year, month),
            status,
            amount: 500,
        }
    }

    const CURRENT: BillingPeriod = BillingPeriod {
        year: 2026,
        month: Month::August,
    };

    #[test]
    fn test_no_records_is_due() {
        let report = classify(&[], CURRENT);
        assert_eq!(report.status, Standing::Due);
        assert_eq!(report.overdue_count, 0);
        assert_eq!(report.display_text, "Due");
    }

    #[test]
    fn test_current_paid_no_history_is_paid() {
        let records = [record(2026, Month::August, PaymentStatus::Paid)];
        let report = classify(&records, CURRENT);
        assert_eq!(report.status, Standing::Paid);
        assert_eq!(report.display_text, "Paid");
    }

    #[test]
    fn test_current_due_is_due() {
        let records = [record(2026, Month::August, PaymentStatus::Due)];
        let report = classify(&records, CURRENT);
        assert_eq!(report.status, Standing::Due);
        assert_eq!(report.overdue_count, 0);
    }

    #[test]
    fn test_prior_unpaid_is_overdue() {
        let records = [
            record(2026, Month::July, PaymentStatus::Due),
            record(2026, Month::August, PaymentStatus::Paid),
        ];
        let report = classify(&records, CURRENT);
        assert_eq!(report.status, Standing::Overdue);
        assert_eq!(report.overdue_count, 1);
        // Current is paid, so the displayed count stays at the prior count
        assert_eq!(report.display_text, "Due x 1");
    }

    #[test]
    fn test_display_count_includes_unpaid_current() {
        let records = [
            record(2026, Month::June, PaymentStatus::Due),
            record(2026, Month::July, PaymentStatus::Due),
            record(2026, Month::August, PaymentStatus::Due),
        ];
        let report = classify(&records, CURRENT);
        assert_eq!(report.status, Standing::Overdue);
        assert_eq!(report.overdue_count, 2);
        assert_eq!(report.display_text, "Due x 3");
    }

    #[test]
    fn test_paid_requires_zero_overdue() {
        // Current paid, but July still outstanding: not "paid"
        let records = [
            record(2026, Month::July, PaymentStatus::Due),
            record(2026, Month::August, PaymentStatus::Paid),
        ];
        assert_eq!(classify(&records, CURRENT).status, Standing::Overdue);
    }

    #[test]
    fn test_prior_year_unpaid_counts() {
        let records = [
            record(2025, Month::December, PaymentStatus::Due),
            record(2026, Month::August, PaymentStatus::Due),
        ];
        let report = classify(&records, CURRENT);
        assert_eq!(report.status, Standing::Overdue);
        assert_eq!(report.overdue_count, 1);
        assert_eq!(report.display_text, "Due x 2");
    }

    #[test]
    fn test_future_records_ignored_for_overdue() {
        // A September record (pre-generated) must not count as overdue
        let records = [
            record(2026, Month::September, PaymentStatus::Due),
            record(2026, Month::August, PaymentStatus::Paid),
        ];
        let report = classify(&records, CURRENT);
        assert_eq!(report.status, Standing::Paid);
        assert_eq!(report.overdue_count, 0);
    }

    #[test]
    fn test_paid_history_does_not_count() {
        let records = [
            record(2026, Month::June, PaymentStatus::Paid),
            record(2026, Month::July, PaymentStatus::Paid),
            record(2026, Month::August, PaymentStatus::Paid),
        ];
        assert_eq!(classify(&records, CURRENT).status, Standing::Paid);
    }
}
