//! Dashboard statistics endpoint.

use axum::{extract::State, Json};
use chrono::Utc;

use crate::{
    api::models::{dashboard::DashboardStats, users::CurrentUser},
    db::handlers::{members::MemberFilter, Members, Payments},
    dues::BillingPeriod,
    errors::Error,
    AppState,
};

/// Aggregate statistics for the current billing period
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Not authenticated"),
    ),
    security(("session_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_dashboard(State(state): State<AppState>, _current_user: CurrentUser) -> Result<Json<DashboardStats>, Error> {
    let period = BillingPeriod::containing(Utc::now().date_naive());
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let total_members = Members::new(&mut conn).count(&MemberFilter::new(0, 1)).await?;
    let stats = Payments::new(&mut conn).period_stats(period).await?;

    Ok(Json(DashboardStats {
        total_members,
        paid_this_month: stats.paid_members,
        due_this_month: stats.due_members,
        total_revenue: stats.revenue,
    }))
}
