//! Charge amounts: monthly accrual and admission charges.

use super::period::BillingPeriod;
use super::status::{PaymentStatus, PeriodRecord};

/// The amounts a new payment record is created with.
///
/// Invariant at creation time: `amount = monthly_fee + accumulated_dues`
/// (plus the discounted admission fee for first payments, which
/// [`admission_charge`] folds into `amount` directly).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargePlan {
    pub amount: i64,
    pub monthly_fee: i64,
    pub accumulated_dues: i64,
}

/// Sum of unpaid amounts from periods strictly before `current`.
pub fn accumulated_dues(records: &[PeriodRecord], current: BillingPeriod) -> i64 {
    records
        .iter()
        .filter(|r| r.status == PaymentStatus::Due && r.period < current)
        .map(|r| r.amount)
        .sum()
}

/// The charge for a regular generated monthly record: the member's fee plus
/// everything they still owe from earlier periods.
pub fn monthly_charge(monthly_fee: i64, accumulated_dues: i64) -> ChargePlan {
    ChargePlan {
        amount: monthly_fee + accumulated_dues,
        monthly_fee,
        accumulated_dues,
    }
}

/// The charge for the first payment created at admission: the (possibly
/// discounted) admission fee plus the first month's fee. Nothing has
/// accrued yet.
pub fn admission_charge(discounted_fee: i64, monthly_fee: i64) -> ChargePlan {
    ChargePlan {
        amount: discounted_fee + monthly_fee,
        monthly_fee,
        accumulated_dues: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dues::period::Month;

    fn record(year: i32, month: Month, status: PaymentStatus, amount: i64) -> PeriodRecord {
        PeriodRecord {
            period: BillingPeriod::new(year, month),
            status,
            amount,
        }
    }

    const CURRENT: BillingPeriod = BillingPeriod {
        year: 2026,
        month: Month::August,
    };

    #[test]
    fn test_no_history_accrues_nothing() {
        assert_eq!(accumulated_dues(&[], CURRENT), 0);
    }

    #[test]
    fn test_single_unpaid_month_accrues() {
        // July unpaid at 500, fee 500: August owes 1000
        let records = [record(2026, Month::July, PaymentStatus::Due, 500)];
        let accrued = accumulated_dues(&records, CURRENT);
        assert_eq!(accrued, 500);

        let plan = monthly_charge(500, accrued);
        assert_eq!(plan.amount, 1000);
        assert_eq!(plan.monthly_fee, 500);
        assert_eq!(plan.accumulated_dues, 500);
    }

    #[test]
    fn test_accrual_compounds_across_months() {
        // July's 1000 already contains June's 500; skipping both months
        // means September sees 1500 outstanding, not 500 + 1000 + more
        let records = [
            record(2026, Month::June, PaymentStatus::Due, 500),
            record(2026, Month::July, PaymentStatus::Due, 1000),
        ];
        assert_eq!(accumulated_dues(&records, CURRENT), 1500);
    }

    #[test]
    fn test_paid_records_do_not_accrue() {
        let records = [
            record(2026, Month::June, PaymentStatus::Paid, 500),
            record(2026, Month::July, PaymentStatus::Due, 500),
        ];
        assert_eq!(accumulated_dues(&records, CURRENT), 500);
    }

    #[test]
    fn test_current_period_record_does_not_accrue() {
        let records = [record(2026, Month::August, PaymentStatus::Due, 500)];
        assert_eq!(accumulated_dues(&records, CURRENT), 0);
    }

    #[test]
    fn test_prior_year_accrues() {
        let records = [record(2025, Month::December, PaymentStatus::Due, 700)];
        assert_eq!(accumulated_dues(&records, CURRENT), 700);
    }

    #[test]
    fn test_admission_charge() {
        // List price 2000 discounted to 1800, monthly fee 500
        let plan = admission_charge(1800, 500);
        assert_eq!(plan.amount, 2300);
        assert_eq!(plan.monthly_fee, 500);
        assert_eq!(plan.accumulated_dues, 0);
    }

    #[test]
    fn test_monthly_charge_without_arrears() {
        let plan = monthly_charge(500, 0);
        assert_eq!(plan.amount, 500);
        assert_eq!(plan.accumulated_dues, 0);
    }
}
