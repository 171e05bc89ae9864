//! Manual triggers for the daily lifecycle sweeps. Platform admin only.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// POST /api/v1/admin/lifecycle/deletion-sweep
pub async fn run_deletion_sweep(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(user_id = admin.user_id, "Manual deletion sweep requested");
    let result = state.scheduler.run_deletion_sweep().await?;
    Ok(Json(DataResponse { data: result }))
}

/// POST /api/v1/admin/lifecycle/milestone-sweep
pub async fn run_milestone_sweep(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<impl IntoResponse> {
    tracing::info!(user_id = admin.user_id, "Manual milestone sweep requested");
    let result = state.scheduler.run_milestone_sweep().await?;
    Ok(Json(DataResponse { data: result }))
}
