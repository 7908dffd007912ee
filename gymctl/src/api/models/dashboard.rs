//! API response models for the dashboard.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Headline statistics for the current billing period.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DashboardStats {
    /// Total registered members
    pub total_members: i64,
    /// Distinct members with a paid record this period
    pub paid_this_month: i64,
    /// Distinct members with an unpaid record this period
    pub due_this_month: i64,
    /// Sum of amounts settled this period
    pub total_revenue: i64,
}
