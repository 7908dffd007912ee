//! API request/response models for gym members.

use super::pagination::Pagination;
use crate::db::models::members::MemberDBResponse;
use crate::dues::{Standing, StandingReport};
use crate::types::MemberId;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Physique classification recorded at admission.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "body_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    #[default]
    Normal,
    Fatty,
}

/// Request body for registering a new member.
///
/// `admission_fee` falls back to the configured list price when omitted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberCreate {
    /// Business identifier, e.g. "GM20260001". Unique across all members.
    pub member_id: MemberId,
    pub name: String,
    pub mobile_number: String,
    pub blood_group: String,
    pub reference_id: String,
    pub age: i32,
    pub height: f64,
    pub weight: f64,
    #[serde(default)]
    pub body_type: BodyType,
    /// Optional photo, as a data URL or object-store key
    pub image: Option<String>,
    pub admission_date: NaiveDate,
    pub admission_fee: Option<i64>,
    /// Admission fee actually charged after any discount
    pub discounted_fee: i64,
    /// Recurring monthly fee
    pub monthly_salary: i64,
}

/// Request body for updating a member. Omitted fields are left unchanged.
/// The business `member_id` cannot be changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct MemberUpdate {
    pub name: Option<String>,
    pub mobile_number: Option<String>,
    pub blood_group: Option<String>,
    pub reference_id: Option<String>,
    pub age: Option<i32>,
    pub height: Option<f64>,
    pub weight: Option<f64>,
    pub body_type: Option<BodyType>,
    pub image: Option<String>,
    pub admission_date: Option<NaiveDate>,
    pub discounted_fee: Option<i64>,
    pub monthly_salary: Option<i64>,
}

/// Member profile as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: uuid::Uuid,
    pub member_id: MemberId,
    pub name: String,
    pub mobile_number: String,
    pub blood_group: String,
    pub reference_id: String,
    pub age: i32,
    pub height: f64,
    pub weight: f64,
    pub body_type: BodyType,
    pub image: Option<String>,
    pub admission_date: NaiveDate,
    pub admission_fee: i64,
    pub discounted_fee: i64,
    pub monthly_salary: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<MemberDBResponse> for MemberResponse {
    fn from(db: MemberDBResponse) -> Self {
        Self {
            id: db.id,
            member_id: db.member_id,
            name: db.name,
            mobile_number: db.mobile_number,
            blood_group: db.blood_group,
            reference_id: db.reference_id,
            age: db.age,
            height: db.height,
            weight: db.weight,
            body_type: db.body_type,
            image: db.image,
            admission_date: db.admission_date,
            admission_fee: db.admission_fee,
            discounted_fee: db.discounted_fee,
            monthly_salary: db.monthly_salary,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing members.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListMembersQuery {
    /// Pagination parameters
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Filter members by name or member ID (case-insensitive substring match)
    pub search: Option<String>,
}

/// Query parameters for the member-ID availability check.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct MemberIdQuery {
    /// Candidate business identifier to check
    pub id: MemberId,
}

/// Result of a member-ID availability check.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberIdCheck {
    /// Whether the requested ID is free to use
    pub available: bool,
    /// Next unused ID for the current year, offered regardless of
    /// availability so the client can always prefill the form
    pub suggestion: MemberId,
}

/// Current dues standing of a member, derived from their payment history.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct StandingResponse {
    pub member_id: MemberId,
    pub status: Standing,
    /// Number of billing periods before the current one still owed
    pub overdue_count: u32,
    /// Human-readable label, e.g. "Paid", "Due", "Due x 3"
    pub display_text: String,
}

impl StandingResponse {
    pub fn new(member_id: MemberId, report: StandingReport) -> Self {
        Self {
            member_id,
            status: report.status,
            overdue_count: report.overdue_count,
            display_text: report.display_text,
        }
    }
}
