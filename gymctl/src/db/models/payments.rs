//! Database models for payment records.

use crate::dues::{BillingPeriod, Month, PaymentStatus, PeriodRecord};
use crate::types::{MemberId, PaymentId};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// Database request for creating a payment record
#[derive(Debug, Clone)]
pub struct PaymentCreateDBRequest {
    pub member_id: MemberId,
    pub member_name: String,
    pub amount: i64,
    pub monthly_fee: i64,
    pub accumulated_dues: i64,
    pub status: PaymentStatus,
    pub month: Month,
    pub year: i32,
    pub due_date: NaiveDate,
    pub paid_date: Option<DateTime<Utc>>,
    pub is_first_payment: bool,
}

/// Database request for updating a payment record. `None` fields are left
/// unchanged; `paid_date` is managed by the settlement logic, not set
/// directly by callers.
#[derive(Debug, Clone, Default)]
pub struct PaymentUpdateDBRequest {
    pub status: Option<PaymentStatus>,
    pub amount: Option<i64>,
    pub paid_date: Option<DateTime<Utc>>,
}

/// Database response for a payment record
#[derive(Debug, Clone, FromRow)]
pub struct PaymentDBResponse {
    pub id: PaymentId,
    pub member_id: MemberId,
    pub member_name: String,
    pub amount: i64,
    pub monthly_fee: i64,
    pub accumulated_dues: i64,
    pub status: PaymentStatus,
    pub month: Month,
    pub year: i32,
    pub due_date: NaiveDate,
    pub paid_date: Option<DateTime<Utc>>,
    pub is_first_payment: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentDBResponse {
    pub fn period(&self) -> BillingPeriod {
        BillingPeriod::new(self.year, self.month)
    }

    /// Projection handed to the dues engine
    pub fn as_period_record(&self) -> PeriodRecord {
        PeriodRecord {
            period: self.period(),
            status: self.status,
            amount: self.amount,
        }
    }
}
