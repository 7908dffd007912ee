//! Database repository for gym members.
//!
//! Members are addressed by their human-facing business id (`member_id`),
//! not the UUID storage id, because payment records key on the business id.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::members::{MemberCreateDBRequest, MemberDBResponse, MemberUpdateDBRequest},
};
use crate::types::MemberId;
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing members
#[derive(Debug, Clone)]
pub struct MemberFilter {
    /// Case-insensitive substring match on name or member id
    pub search: Option<String>,
    pub skip: i64,
    pub limit: i64,
}

impl MemberFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self { search: None, skip, limit }
    }
}

pub struct Members<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Members<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Total member count, for pagination and the dashboard
    #[instrument(skip(self), err)]
    pub async fn count(&mut self, filter: &MemberFilter) -> Result<i64> {
        let pattern = filter.search.as_ref().map(|s| format!("%{s}%"));
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM members WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR member_id ILIKE $1)",
        )
        .bind(pattern)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(count)
    }

    /// Whether a business id is already taken
    #[instrument(skip(self), err)]
    pub async fn member_id_exists(&mut self, member_id: &str) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM members WHERE member_id = $1)")
            .bind(member_id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }

    /// Next sequential business id for the given prefix and year, e.g.
    /// `GM20260007`. Scans existing ids and takes the highest numeric
    /// suffix + 1; a fresh year starts at 1.
    #[instrument(skip(self), err)]
    pub async fn next_member_id(&mut self, prefix: &str, year: i32) -> Result<String> {
        let stem = format!("{prefix}{year}");
        let ids = sqlx::query_scalar::<_, String>("SELECT member_id FROM members WHERE member_id LIKE $1")
            .bind(format!("{stem}%"))
            .fetch_all(&mut *self.db)
            .await?;

        let max_suffix = ids
            .iter()
            .filter_map(|id| id.strip_prefix(&stem))
            .filter_map(|suffix| suffix.parse::<u32>().ok())
            .max()
            .unwrap_or(0);

        Ok(format!("{stem}{:04}", max_suffix + 1))
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Members<'c> {
    type CreateRequest = MemberCreateDBRequest;
    type UpdateRequest = MemberUpdateDBRequest;
    type Response = MemberDBResponse;
    type Id = MemberId;
    type Filter = MemberFilter;

    #[instrument(skip(self, request), fields(member_id = %request.member_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id = Uuid::new_v4();

        let member = sqlx::query_as::<_, MemberDBResponse>(
            r#"
            INSERT INTO members (
                id, member_id, name, mobile_number, blood_group, reference_id,
                age, height, weight, body_type, image, admission_date,
                admission_fee, discounted_fee, monthly_salary
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.member_id)
        .bind(&request.name)
        .bind(&request.mobile_number)
        .bind(&request.blood_group)
        .bind(&request.reference_id)
        .bind(request.age)
        .bind(request.height)
        .bind(request.weight)
        .bind(request.body_type)
        .bind(&request.image)
        .bind(request.admission_date)
        .bind(request.admission_fee)
        .bind(request.discounted_fee)
        .bind(request.monthly_salary)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(member)
    }

    #[instrument(skip(self), fields(member_id = %id), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let member = sqlx::query_as::<_, MemberDBResponse>("SELECT * FROM members WHERE member_id = $1")
            .bind(&id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(member)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let members = sqlx::query_as::<_, MemberDBResponse>("SELECT * FROM members WHERE member_id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(members.into_iter().map(|m| (m.member_id.clone(), m)).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let pattern = filter.search.as_ref().map(|s| format!("%{s}%"));
        let members = sqlx::query_as::<_, MemberDBResponse>(
            r#"
            SELECT * FROM members
            WHERE ($1::TEXT IS NULL OR name ILIKE $1 OR member_id ILIKE $1)
            ORDER BY admission_date DESC, member_id
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(pattern)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(members)
    }

    #[instrument(skip(self), fields(member_id = %id), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        // Payments go with the member via ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM members WHERE member_id = $1")
            .bind(&id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(member_id = %id), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let member = sqlx::query_as::<_, MemberDBResponse>(
            r#"
            UPDATE members
            SET name = COALESCE($2, name),
                mobile_number = COALESCE($3, mobile_number),
                blood_group = COALESCE($4, blood_group),
                reference_id = COALESCE($5, reference_id),
                age = COALESCE($6, age),
                height = COALESCE($7, height),
                weight = COALESCE($8, weight),
                body_type = COALESCE($9, body_type),
                image = COALESCE($10, image),
                admission_date = COALESCE($11, admission_date),
                discounted_fee = COALESCE($12, discounted_fee),
                monthly_salary = COALESCE($13, monthly_salary),
                updated_at = NOW()
            WHERE member_id = $1
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(&request.name)
        .bind(&request.mobile_number)
        .bind(&request.blood_group)
        .bind(&request.reference_id)
        .bind(request.age)
        .bind(request.height)
        .bind(request.weight)
        .bind(request.body_type)
        .bind(&request.image)
        .bind(request.admission_date)
        .bind(request.discounted_fee)
        .bind(request.monthly_salary)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(member)
    }
}
