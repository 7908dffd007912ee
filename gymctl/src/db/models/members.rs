//! Database models for gym members.

use crate::api::models::members::{BodyType, MemberCreate, MemberUpdate};
use crate::types::MemberId;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;
use uuid::Uuid;

/// Database request for creating a new member
#[derive(Debug, Clone)]
pub struct MemberCreateDBRequest {
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
}

impl MemberCreateDBRequest {
    /// `admission_fee_default` fills in the list price when the request
    /// leaves it unset.
    pub fn new(api: MemberCreate, admission_fee_default: i64) -> Self {
        Self {
            member_id: api.member_id,
            name: api.name,
            mobile_number: api.mobile_number,
            blood_group: api.blood_group,
            reference_id: api.reference_id,
            age: api.age,
            height: api.height,
            weight: api.weight,
            body_type: api.body_type,
            image: api.image,
            admission_date: api.admission_date,
            admission_fee: api.admission_fee.unwrap_or(admission_fee_default),
            discounted_fee: api.discounted_fee,
            monthly_salary: api.monthly_salary,
        }
    }
}

/// Database request for updating a member. `None` fields are left unchanged.
/// The business `member_id` is immutable; payments key on it.
#[derive(Debug, Clone, Default)]
pub struct MemberUpdateDBRequest {
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

impl From<MemberUpdate> for MemberUpdateDBRequest {
    fn from(api: MemberUpdate) -> Self {
        Self {
            name: api.name,
            mobile_number: api.mobile_number,
            blood_group: api.blood_group,
            reference_id: api.reference_id,
            age: api.age,
            height: api.height,
            weight: api.weight,
            body_type: api.body_type,
            image: api.image,
            admission_date: api.admission_date,
            discounted_fee: api.discounted_fee,
            monthly_salary: api.monthly_salary,
        }
    }
}

/// Database response for a member
#[derive(Debug, Clone, FromRow)]
pub struct MemberDBResponse {
    pub id: Uuid,
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
