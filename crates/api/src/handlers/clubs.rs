//! Handlers for club deactivation, reactivation and the countdown overview.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use clubhouse_core::types::DbId;
use clubhouse_lifecycle::clubs::DeactivateClub;

use crate::error::AppResult;
use crate::middleware::rbac::RequireClubAdmin;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/clubs/{club_id}/lifecycle
pub async fn lifecycle_overview(
    _admin: RequireClubAdmin,
    State(state): State<AppState>,
    Path(club_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let overview = state.clubs.lifecycle_overview(club_id).await?;
    Ok(Json(DataResponse { data: overview }))
}

/// POST /api/v1/clubs/{club_id}/deactivate
///
/// Body: `{ "confirmation_name": "...", "grace_period_days": 30 }`. The
/// grace period is raised to the platform minimum when shorter.
pub async fn deactivate_club(
    RequireClubAdmin(auth): RequireClubAdmin,
    State(state): State<AppState>,
    Path(club_id): Path<DbId>,
    Json(input): Json<DeactivateClub>,
) -> AppResult<impl IntoResponse> {
    let club = state.clubs.deactivate(club_id, &input, auth.user_id).await?;
    Ok(Json(DataResponse { data: club }))
}

/// POST /api/v1/clubs/{club_id}/reactivate
pub async fn reactivate_club(
    RequireClubAdmin(auth): RequireClubAdmin,
    State(state): State<AppState>,
    Path(club_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let club = state.clubs.reactivate(club_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: club }))
}
