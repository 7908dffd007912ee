//! Database repository for payment records.
//!
//! Besides plain CRUD this repository owns the two lifecycle operations:
//! per-member monthly generation (with accumulated-dues accrual) and
//! settlement, including the cascade that clears absorbed prior dues.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        members::MemberDBResponse,
        payments::{PaymentCreateDBRequest, PaymentDBResponse, PaymentUpdateDBRequest},
    },
};
use crate::dues::{self, BillingPeriod, PaymentStatus};
use crate::types::{abbrev_uuid, MemberId, PaymentId};
use chrono::Utc;
use sqlx::{Connection, FromRow, PgConnection};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing payments
#[derive(Debug, Clone)]
pub struct PaymentFilter {
    pub member_id: Option<MemberId>,
    pub status: Option<PaymentStatus>,
    pub skip: i64,
    pub limit: i64,
}

impl PaymentFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            member_id: None,
            status: None,
            skip,
            limit,
        }
    }
}

/// Current-period aggregates for the dashboard
#[derive(Debug, Clone, FromRow)]
pub struct PeriodStats {
    pub paid_members: i64,
    pub due_members: i64,
    pub revenue: i64,
}

pub struct Payments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Payments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Full payment history for one member, oldest period first
    #[instrument(skip(self), err)]
    pub async fn list_for_member(&mut self, member_id: &str) -> Result<Vec<PaymentDBResponse>> {
        let payments = sqlx::query_as::<_, PaymentDBResponse>("SELECT * FROM payments WHERE member_id = $1 ORDER BY year, month")
            .bind(member_id)
            .fetch_all(&mut *self.db)
            .await?;
        Ok(payments)
    }

    #[instrument(skip(self, filter), err)]
    pub async fn count(&mut self, filter: &PaymentFilter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM payments
            WHERE ($1::TEXT IS NULL OR member_id = $1)
              AND ($2::payment_status IS NULL OR status = $2)
            "#,
        )
        .bind(&filter.member_id)
        .bind(filter.status)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(count)
    }

    /// Ensure the member has a record for `period`.
    ///
    /// Returns `Ok(None)` when a record for the period already exists. The
    /// new record's amount folds in everything still owed from earlier
    /// periods. A concurrent sweep can still win the insert race; the
    /// resulting unique violation surfaces as a `DbError` the caller treats
    /// as a skip.
    #[instrument(skip(self, member), fields(member_id = %member.member_id, period = %period), err)]
    pub async fn generate_for_member(&mut self, member: &MemberDBResponse, period: BillingPeriod) -> Result<Option<PaymentDBResponse>> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM payments WHERE member_id = $1 AND month = $2 AND year = $3)")
            .bind(&member.member_id)
            .bind(period.month)
            .bind(period.year)
            .fetch_one(&mut *self.db)
            .await?;
        if exists {
            return Ok(None);
        }

        let history = self.list_for_member(&member.member_id).await?;
        let records: Vec<_> = history.iter().map(|p| p.as_period_record()).collect();
        let accrued = dues::accumulated_dues(&records, period);
        let plan = dues::monthly_charge(member.monthly_salary, accrued);

        let due_date = period
            .first_day()
            .ok_or_else(|| DbError::Other(anyhow::anyhow!("billing period {period} has no valid first day")))?;

        let payment = self
            .create(&PaymentCreateDBRequest {
                member_id: member.member_id.clone(),
                member_name: member.name.clone(),
                amount: plan.amount,
                monthly_fee: plan.monthly_fee,
                accumulated_dues: plan.accumulated_dues,
                status: PaymentStatus::Due,
                month: period.month,
                year: period.year,
                due_date,
                paid_date: None,
                is_first_payment: false,
            })
            .await?;

        Ok(Some(payment))
    }

    /// Apply a settlement update to a payment record.
    ///
    /// Marking a record paid stamps `paid_date` (supplied or now) and, when
    /// the record absorbed prior dues (`accumulated_dues > 0`), bulk-settles
    /// the member's other due records from distinct periods with the same
    /// paid date. Marking a record due clears `paid_date` and never reverses
    /// a cascade. An amount override rewrites `amount` only.
    ///
    /// Returns the updated record and the number of cascade-settled records.
    #[instrument(skip(self, request), fields(payment_id = %abbrev_uuid(&id)), err)]
    pub async fn settle(&mut self, id: PaymentId, request: &PaymentUpdateDBRequest) -> Result<(PaymentDBResponse, u64)> {
        let mut tx = self.db.begin().await?;

        let payment = sqlx::query_as::<_, PaymentDBResponse>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::NotFound)?;

        let mut settled_prior = 0u64;
        let paid_date = match request.status {
            Some(PaymentStatus::Paid) => {
                let paid_date = request.paid_date.unwrap_or_else(Utc::now);
                if payment.accumulated_dues > 0 {
                    // The cleared records are the ones this record's
                    // accumulated_dues absorbed; no sum verification here.
                    let result = sqlx::query(
                        r#"
                        UPDATE payments
                        SET status = 'paid', paid_date = $1, updated_at = NOW()
                        WHERE member_id = $2
                          AND status = 'due'
                          AND (year < $3 OR (year = $3 AND month <> $4))
                        "#,
                    )
                    .bind(paid_date)
                    .bind(&payment.member_id)
                    .bind(payment.year)
                    .bind(payment.month)
                    .execute(&mut *tx)
                    .await?;
                    settled_prior = result.rows_affected();
                }
                Some(paid_date)
            }
            Some(PaymentStatus::Due) => None,
            None => payment.paid_date,
        };

        let updated = sqlx::query_as::<_, PaymentDBResponse>(
            r#"
            UPDATE payments
            SET status = COALESCE($2, status),
                amount = COALESCE($3, amount),
                paid_date = $4,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(request.status)
        .bind(request.amount)
        .bind(paid_date)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((updated, settled_prior))
    }

    /// Propagate a member rename into the denormalized `member_name` column
    #[instrument(skip(self), err)]
    pub async fn rename_member(&mut self, member_id: &str, name: &str) -> Result<u64> {
        let result = sqlx::query("UPDATE payments SET member_name = $2, updated_at = NOW() WHERE member_id = $1")
            .bind(member_id)
            .bind(name)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Paid/due member counts and collected revenue for one period
    #[instrument(skip(self), fields(period = %period), err)]
    pub async fn period_stats(&mut self, period: BillingPeriod) -> Result<PeriodStats> {
        let stats = sqlx::query_as::<_, PeriodStats>(
            r#"
            SELECT
                COUNT(DISTINCT member_id) FILTER (WHERE status = 'paid') AS paid_members,
                COUNT(DISTINCT member_id) FILTER (WHERE status = 'due') AS due_members,
                COALESCE(SUM(amount) FILTER (WHERE status = 'paid'), 0)::BIGINT AS revenue
            FROM payments
            WHERE month = $1 AND year = $2
            "#,
        )
        .bind(period.month)
        .bind(period.year)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(stats)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Payments<'c> {
    type CreateRequest = PaymentCreateDBRequest;
    type UpdateRequest = PaymentUpdateDBRequest;
    type Response = PaymentDBResponse;
    type Id = PaymentId;
    type Filter = PaymentFilter;

    #[instrument(skip(self, request), fields(member_id = %request.member_id), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let id = Uuid::new_v4();

        let payment = sqlx::query_as::<_, PaymentDBResponse>(
            r#"
            INSERT INTO payments (
                id, member_id, member_name, amount, monthly_fee, accumulated_dues,
                status, month, year, due_date, paid_date, is_first_payment
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(&request.member_id)
        .bind(&request.member_name)
        .bind(request.amount)
        .bind(request.monthly_fee)
        .bind(request.accumulated_dues)
        .bind(request.status)
        .bind(request.month)
        .bind(request.year)
        .bind(request.due_date)
        .bind(request.paid_date)
        .bind(request.is_first_payment)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(payment)
    }

    #[instrument(skip(self), fields(payment_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>("SELECT * FROM payments WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(payment)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        let payments = sqlx::query_as::<_, PaymentDBResponse>("SELECT * FROM payments WHERE id = ANY($1)")
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(payments.into_iter().map(|p| (p.id, p)).collect())
    }

    #[instrument(skip(self, filter), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let payments = sqlx::query_as::<_, PaymentDBResponse>(
            r#"
            SELECT * FROM payments
            WHERE ($1::TEXT IS NULL OR member_id = $1)
              AND ($2::payment_status IS NULL OR status = $2)
            ORDER BY year DESC, month DESC, member_id
            OFFSET $3 LIMIT $4
            "#,
        )
        .bind(&filter.member_id)
        .bind(filter.status)
        .bind(filter.skip)
        .bind(filter.limit)
        .fetch_all(&mut *self.db)
        .await?;
        Ok(payments)
    }

    #[instrument(skip(self), fields(payment_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        // Only reachable through the member delete cascade in the API; kept
        // for completeness at the repository level.
        let result = sqlx::query("DELETE FROM payments WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(payment_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let (payment, _) = self.settle(id, request).await?;
        Ok(payment)
    }
}
