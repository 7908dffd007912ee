//! Member management endpoints.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{Datelike, Utc};

use crate::{
    api::models::{
        members::{ListMembersQuery, MemberCreate, MemberIdCheck, MemberIdQuery, MemberResponse, MemberUpdate, StandingResponse},
        pagination::PaginatedResponse,
        payments::PaymentResponse,
        users::CurrentUser,
    },
    auth::require_admin,
    db::{
        handlers::{members::MemberFilter, Members, Payments, Repository},
        models::{
            members::{MemberCreateDBRequest, MemberUpdateDBRequest},
            payments::PaymentCreateDBRequest,
        },
    },
    dues::{self, BillingPeriod, PaymentStatus},
    errors::Error,
    types::{Operation, Resource},
    AppState,
};

/// List members with optional search
#[utoipa::path(
    get,
    path = "/members",
    params(ListMembersQuery),
    tag = "members",
    responses(
        (status = 200, description = "List of members", body = PaginatedResponse<MemberResponse>),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_members(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<ListMembersQuery>,
) -> Result<Json<PaginatedResponse<MemberResponse>>, Error> {
    let (skip, limit) = query.pagination.params();
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Members::new(&mut conn);

    let mut filter = MemberFilter::new(skip, limit);
    filter.search = query.search;

    let members = repo.list(&filter).await?;
    let total_count = repo.count(&filter).await?;

    let data = members.into_iter().map(MemberResponse::from).collect();
    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

/// Register a new member
///
/// Also creates the member's first payment record for the current billing
/// period, charging the discounted admission fee plus the first month's fee.
#[utoipa::path(
    post,
    path = "/members",
    request_body = MemberCreate,
    tag = "members",
    responses(
        (status = 201, description = "Member registered", body = MemberResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "Member ID already taken"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_member(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<MemberCreate>,
) -> Result<(StatusCode, Json<MemberResponse>), Error> {
    require_admin(&current_user, Operation::Create, Resource::Members)?;

    let period = BillingPeriod::containing(Utc::now().date_naive());
    let due_date = period.first_day().ok_or_else(|| Error::Internal {
        operation: format!("compute due date for {period}"),
    })?;

    // Member row and first payment commit together
    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut members = Members::new(&mut tx);
    let member = members
        .create(&MemberCreateDBRequest::new(request, state.config.billing.admission_fee_default))
        .await?;

    let plan = dues::admission_charge(member.discounted_fee, member.monthly_salary);
    let mut payments = Payments::new(&mut tx);
    payments
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
            is_first_payment: true,
        })
        .await?;

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok((StatusCode::CREATED, Json(MemberResponse::from(member))))
}

/// Check whether a member ID is available
///
/// Always returns a suggested next ID for the current year so the client
/// can prefill the registration form.
#[utoipa::path(
    get,
    path = "/members/check-id",
    params(MemberIdQuery),
    tag = "members",
    responses(
        (status = 200, description = "Availability and suggestion", body = MemberIdCheck),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn check_member_id(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<MemberIdQuery>,
) -> Result<Json<MemberIdCheck>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Members::new(&mut conn);

    let taken = repo.member_id_exists(&query.id).await?;
    let suggestion = repo
        .next_member_id(&state.config.billing.member_id_prefix, Utc::now().year())
        .await?;

    Ok(Json(MemberIdCheck {
        available: !taken,
        suggestion,
    }))
}

/// Get a member by business ID
#[utoipa::path(
    get,
    path = "/members/{member_id}",
    params(("member_id" = String, Path, description = "Member business ID")),
    tag = "members",
    responses(
        (status = 200, description = "Member", body = MemberResponse),
        (status = 404, description = "Member not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(member_id = %member_id))]
pub async fn get_member(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(member_id): Path<String>,
) -> Result<Json<MemberResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Members::new(&mut conn);

    let member = repo.get_by_id(member_id.clone()).await?.ok_or_else(|| Error::NotFound {
        resource: "Member".to_string(),
        id: member_id,
    })?;

    Ok(Json(MemberResponse::from(member)))
}

/// Update a member
///
/// A name change propagates to the denormalized `member_name` on the
/// member's payment records.
#[utoipa::path(
    put,
    path = "/members/{member_id}",
    params(("member_id" = String, Path, description = "Member business ID")),
    request_body = MemberUpdate,
    tag = "members",
    responses(
        (status = 200, description = "Updated member", body = MemberResponse),
        (status = 404, description = "Member not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(member_id = %member_id))]
pub async fn update_member(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(member_id): Path<String>,
    Json(request): Json<MemberUpdate>,
) -> Result<Json<MemberResponse>, Error> {
    require_admin(&current_user, Operation::Update, Resource::Members)?;

    let mut tx = state.db.begin().await.map_err(|e| Error::Database(e.into()))?;

    let mut members = Members::new(&mut tx);
    let existing = members.get_by_id(member_id.clone()).await?.ok_or_else(|| Error::NotFound {
        resource: "Member".to_string(),
        id: member_id.clone(),
    })?;

    let new_name = request.name.clone();
    let member = members.update(member_id.clone(), &MemberUpdateDBRequest::from(request)).await?;

    if let Some(name) = new_name {
        if name != existing.name {
            let mut payments = Payments::new(&mut tx);
            payments.rename_member(&member_id, &name).await?;
        }
    }

    tx.commit().await.map_err(|e| Error::Database(e.into()))?;

    Ok(Json(MemberResponse::from(member)))
}

/// Delete a member
///
/// The member's payment records go with them.
#[utoipa::path(
    delete,
    path = "/members/{member_id}",
    params(("member_id" = String, Path, description = "Member business ID")),
    tag = "members",
    responses(
        (status = 204, description = "Member deleted"),
        (status = 404, description = "Member not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(member_id = %member_id))]
pub async fn delete_member(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(member_id): Path<String>,
) -> Result<StatusCode, Error> {
    require_admin(&current_user, Operation::Delete, Resource::Members)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Members::new(&mut conn);

    if repo.delete(member_id.clone()).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(Error::NotFound {
            resource: "Member".to_string(),
            id: member_id,
        })
    }
}

/// Full payment history for one member, oldest period first
#[utoipa::path(
    get,
    path = "/members/{member_id}/payments",
    params(("member_id" = String, Path, description = "Member business ID")),
    tag = "members",
    responses(
        (status = 200, description = "Payment history", body = Vec<PaymentResponse>),
        (status = 404, description = "Member not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(member_id = %member_id))]
pub async fn list_member_payments(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(member_id): Path<String>,
) -> Result<Json<Vec<PaymentResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut members = Members::new(&mut conn);
    if members.get_by_id(member_id.clone()).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Member".to_string(),
            id: member_id,
        });
    }

    let mut payments = Payments::new(&mut conn);
    let history = payments.list_for_member(&member_id).await?;

    Ok(Json(history.into_iter().map(PaymentResponse::from).collect()))
}

/// Current dues standing of a member
#[utoipa::path(
    get,
    path = "/members/{member_id}/standing",
    params(("member_id" = String, Path, description = "Member business ID")),
    tag = "members",
    responses(
        (status = 200, description = "Standing report", body = StandingResponse),
        (status = 404, description = "Member not found"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all, fields(member_id = %member_id))]
pub async fn get_member_standing(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(member_id): Path<String>,
) -> Result<Json<StandingResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let mut members = Members::new(&mut conn);
    if members.get_by_id(member_id.clone()).await?.is_none() {
        return Err(Error::NotFound {
            resource: "Member".to_string(),
            id: member_id,
        });
    }

    let mut payments = Payments::new(&mut conn);
    let history = payments.list_for_member(&member_id).await?;
    let records: Vec<_> = history.iter().map(|p| p.as_period_record()).collect();

    let current = BillingPeriod::containing(Utc::now().date_naive());
    let report = dues::classify(&records, current);

    Ok(Json(StandingResponse::new(member_id, report)))
}
