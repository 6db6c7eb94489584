//! Dashboard statistics endpoint

use axum::{extract::State, Json};

use crate::{error::AppResult, models::loan::DashboardStats};

use super::CurrentAdmin;

/// Dashboard aggregate: device counts per status plus the open loans,
/// read as one snapshot
#[utoipa::path(
    get,
    path = "/stats/dashboard",
    tag = "stats",
    responses(
        (status = 200, description = "Dashboard statistics", body = DashboardStats),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn get_dashboard(
    State(state): State<crate::AppState>,
    CurrentAdmin(_admin): CurrentAdmin,
) -> AppResult<Json<DashboardStats>> {
    let stats = state.services.ledger.dashboard().await?;
    Ok(Json(stats))
}
