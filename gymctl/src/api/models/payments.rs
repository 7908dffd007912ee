//! API request/response models for payment records.

use super::pagination::Pagination;
use crate::db::models::payments::PaymentDBResponse;
use crate::dues::{Month, PaymentStatus};
use crate::types::{MemberId, PaymentId};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Request body for recording a payment manually.
///
/// Used for corrections and backfills. Regular records come from the monthly
/// generation sweep and admission, which compute amounts themselves; here the
/// caller supplies them, with `amount` falling back to the member's monthly
/// fee and `due_date` to the first day of the billing period.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentCreate {
    pub member_id: MemberId,
    pub month: Month,
    pub year: i32,
    pub amount: Option<i64>,
    #[serde(default)]
    pub accumulated_dues: i64,
    pub status: Option<PaymentStatus>,
    pub due_date: Option<NaiveDate>,
    pub paid_date: Option<DateTime<Utc>>,
}

/// Request body for updating a payment record. Omitted fields are left
/// unchanged. Marking a record paid settles it, which also clears any
/// arrears it absorbed; marking it due reopens it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct PaymentUpdate {
    pub status: Option<PaymentStatus>,
    pub amount: Option<i64>,
    /// Settlement timestamp; defaults to now when marking paid
    pub paid_date: Option<DateTime<Utc>>,
}

/// Payment record as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PaymentId,
    pub member_id: MemberId,
    /// Member name at the time of the last write, kept in sync on rename
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

impl From<PaymentDBResponse> for PaymentResponse {
    fn from(db: PaymentDBResponse) -> Self {
        Self {
            id: db.id,
            member_id: db.member_id,
            member_name: db.member_name,
            amount: db.amount,
            monthly_fee: db.monthly_fee,
            accumulated_dues: db.accumulated_dues,
            status: db.status,
            month: db.month,
            year: db.year,
            due_date: db.due_date,
            paid_date: db.paid_date,
            is_first_payment: db.is_first_payment,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Result of settling (or reopening) a payment record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SettlementResponse {
    pub payment: PaymentResponse,
    /// Prior unpaid records closed by the settlement cascade
    pub settled_prior: u64,
}

/// Query parameters for listing payment records.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListPaymentsQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter by member business ID
    pub member_id: Option<MemberId>,

    /// Filter by payment status
    pub status: Option<PaymentStatus>,
}

/// Request body for the monthly generation sweep. The billing period
/// defaults to the current month.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct GenerateRequest {
    pub month: Option<Month>,
    pub year: Option<i32>,
}

/// One member the generation sweep could not process.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationFailure {
    pub member_id: MemberId,
    pub message: String,
}

/// Outcome of a monthly generation sweep.
///
/// `skipped` counts members who already had a record for the period,
/// including races lost to a concurrent sweep. Failures are reported
/// per member; one bad member never aborts the sweep.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct GenerationSummary {
    pub month: Month,
    pub year: i32,
    pub created: u64,
    pub skipped: u64,
    pub failures: Vec<GenerationFailure>,
}
