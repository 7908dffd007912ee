//! Payment record endpoints: listing, manual corrections, settlement and
//! the monthly generation sweep.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use tracing::warn;

use crate::{
    api::models::{
        pagination::PaginatedResponse,
        payments::{
            GenerateRequest, GenerationFailure, GenerationSummary, ListPaymentsQuery, PaymentCreate, PaymentResponse, PaymentUpdate,
            SettlementResponse,
        },
        users::CurrentUser,
    },
    auth::require_admin,
    db::{
        errors::DbError,
        handlers::{members::MemberFilter, payments::PaymentFilter, Members, Payments, Repository},
        models::payments::{PaymentCreateDBRequest, PaymentUpdateDBRequest},
    },
    dues::{BillingPeriod, PaymentStatus},
    errors::Error,
    types::{abbrev_uuid, Operation, PaymentId, Resource},
    AppState,
};

/// List payment records
#[utoipa::path(
    get,
    path = "/payments",
    params(ListPaymentsQuery),
    tag = "payments",
    responses(
        (status = 200, description = "List of payments", body = PaginatedResponse<PaymentResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_payments(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListPaymentsQuery>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut conn);

    let mut filter = PaymentFilter::new(skip, limit);
    filter.member_id = query.member_id;
    filter.status = query.status;

    let payments = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    let data = payments.into_iter().map(PaymentResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

/// Record a payment manually
///
/// For corrections and backfills; the regular path is the generation sweep.
/// The amount defaults to the member's monthly fee plus any supplied
/// accumulated dues, and the due date to the first day of the billing period.
#[utoipa::path(
    post,
    path = "/payments",
    request_body = PaymentCreate,
    tag = "payments",
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Billing period already has a record"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<PaymentCreate>,
) -> Result<(StatusCode, Json<PaymentResponse>), Error> {
    require_admin(&current_user, Operation::Create, Resource::Payments)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut members = Members::new(&mut conn);
    let member = members.get_by_id(request.member_id.clone()).await?.ok_or_else(|| Error::NotFound {
        resource: "Member".to_string(),
        id: request.member_id.clone(),
    })?;

    let period = BillingPeriod::new(request.year, request.month);
    let due_date = match request.due_date {
        Some(date) => date,
        None => period.first_day().ok_or_else(|| Error::BadRequest {
            message: format!("invalid billing period {period}"),
        })?,
    };

    let status = request.status.unwrap_or(PaymentStatus::Due);
    let amount = request.amount.unwrap_or(member.monthly_salary + request.accumulated_dues);

    let mut repo = Payments::new(&mut conn);
    let payment = repo
        .create(&PaymentCreateDBRequest {
            member_id: member.member_id.clone(),
            member_name: member.name.clone(),
            amount,
            monthly_fee: member.monthly_salary,
            accumulated_dues: request.accumulated_dues,
            status,
            month: request.month,
            year: request.year,
            due_date,
            paid_date: match status {
                PaymentStatus::Paid => Some(request.paid_date.unwrap_or_else(Utc::now)),
                PaymentStatus::Due => None,
            },
            is_first_payment: false,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(PaymentResponse::from(payment))))
}

/// Generate monthly payment records for all members
///
/// Idempotent per (member, period): members who already have a record for
/// the period are skipped, as are races lost to a concurrent sweep. Each
/// member gets their own transaction so one failure never aborts the sweep.
#[utoipa::path(
    post,
    path = "/payments/generate",
    request_body = GenerateRequest,
    tag = "payments",
    responses(
        (status = 200, description = "Sweep outcome", body = GenerationSummary),
        (status = 403, description = "Admin required"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn generate_payments(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerationSummary>, Error> {
    require_admin(&current_user, Operation::Create, Resource::Payments)?;

    let today = BillingPeriod::containing(Utc::now().date_naive());
    let period = BillingPeriod::new(request.year.unwrap_or(today.year), request.month.unwrap_or(today.month));

    // Snapshot the member list outside the per-member transactions; members
    // admitted mid-sweep get their record from admission itself.
    let members = {
        let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
        let mut repo = Members::new(&mut conn);
        let total = repo.count(&MemberFilter::new(0, 1)).await?;
        repo.list(&MemberFilter::new(0, total.max(1))).await?
    };

    let mut summary = GenerationSummary {
        month: period.month,
        year: period.year,
        created: 0,
        skipped: 0,
        failures: Vec::new(),
    };

    for member in &members {
        let result = async {
            let mut tx = state.db.begin().await.map_err(DbError::from)?;
            let generated = Payments::new(&mut tx).generate_for_member(member, period).await?;
            tx.commit().await.map_err(DbError::from)?;
            Ok::<_, DbError>(generated)
        }
        .await;

        match result {
            Ok(Some(_)) => summary.created += 1,
            Ok(None) => summary.skipped += 1,
            // Losing the insert race to a concurrent sweep means the record
            // exists, which is what we wanted
            Err(e) if e.is_period_conflict() => summary.skipped += 1,
            Err(e) => {
                warn!(member_id = %member.member_id, error = %e, "generation failed for member");
                summary.failures.push(GenerationFailure {
                    member_id: member.member_id.clone(),
                    message: Error::from(e).user_message(),
                });
            }
        }
    }

    Ok(Json(summary))
}

/// Get a payment record
#[utoipa::path(
    get,
    path = "/payments/{payment_id}",
    params(("payment_id" = String, Path, description = "Payment UUID")),
    tag = "payments",
    responses(
        (status = 200, description = "Payment", body = PaymentResponse),
        (status = 404, description = "Payment not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(payment_id = %abbrev_uuid(&payment_id)))]
pub async fn get_payment(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(payment_id): Path<PaymentId>,
) -> Result<Json<PaymentResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut conn);

    let payment = repo.get_by_id(payment_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Payment".to_string(),
        id: payment_id.to_string(),
    })?;

    Ok(Json(PaymentResponse::from(payment)))
}

/// Update a payment record
///
/// Marking a record paid settles it; if the record absorbed prior dues, the
/// member's older due records are settled with the same paid date. Marking
/// it due reopens it. There is no delete endpoint: records only leave with
/// their member.
#[utoipa::path(
    patch,
    path = "/payments/{payment_id}",
    params(("payment_id" = String, Path, description = "Payment UUID")),
    request_body = PaymentUpdate,
    tag = "payments",
    responses(
        (status = 200, description = "Settlement outcome", body = SettlementResponse),
        (status = 404, description = "Payment not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(payment_id = %abbrev_uuid(&payment_id)))]
pub async fn update_payment(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(payment_id): Path<PaymentId>,
    Json(request): Json<PaymentUpdate>,
) -> Result<Json<SettlementResponse>, Error> {
    require_admin(&current_user, Operation::Update, Resource::Payments)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Payments::new(&mut conn);

    let update = PaymentUpdateDBRequest {
        status: request.status,
        amount: request.amount,
        paid_date: request.paid_date,
    };

    let (payment, settled_prior) = match repo.settle(payment_id, &update).await {
        Ok(outcome) => outcome,
        Err(DbError::NotFound) => {
            return Err(Error::NotFound {
                resource: "Payment".to_string(),
                id: payment_id.to_string(),
            })
        }
        Err(e) => return Err(e.into()),
    };

    Ok(Json(SettlementResponse {
        payment: PaymentResponse::from(payment),
        settled_prior,
    }))
}
