//! Handlers for `/clubs/{club_id}/members`.
//!
//! Reads need any authenticated user of the club; status changes,
//! cancellations and deletion need club admin rights.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use clubhouse_core::types::DbId;
use clubhouse_db::models::member::{CreateMember, UpdateMember};
use clubhouse_lifecycle::members::{
    BulkStatusChange, RevokeCancellation, SetCancellation, StatusChange,
};

use crate::error::AppResult;
use crate::middleware::rbac::{RequireAuth, RequireClubAdmin};
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// CRUD
// ---------------------------------------------------------------------------

/// GET /api/v1/clubs/{club_id}/members
pub async fn list_members(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path(club_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_club_access(club_id)?;
    let members = state.members.list_members(club_id).await?;
    Ok(Json(DataResponse { data: members }))
}

/// POST /api/v1/clubs/{club_id}/members
///
/// Register a member. Returns 201 with the created row.
pub async fn create_member(
    RequireClubAdmin(auth): RequireClubAdmin,
    State(state): State<AppState>,
    Path(club_id): Path<DbId>,
    Json(input): Json<CreateMember>,
) -> AppResult<impl IntoResponse> {
    let member = state
        .members
        .create_member(club_id, &input, auth.user_id)
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: member })))
}

/// GET /api/v1/clubs/{club_id}/members/{id}
pub async fn get_member(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_club_access(club_id)?;
    let member = state.members.get_member(club_id, member_id).await?;
    Ok(Json(DataResponse { data: member }))
}

/// PUT /api/v1/clubs/{club_id}/members/{id}
///
/// Field edit guarded by `version`. A stale version is a 409.
pub async fn update_member(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(DbId, DbId)>,
    Json(input): Json<UpdateMember>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_club_access(club_id)?;
    let member = state
        .members
        .update_member(club_id, member_id, &input)
        .await?;
    Ok(Json(DataResponse { data: member }))
}

/// DELETE /api/v1/clubs/{club_id}/members/{id}
///
/// Soft delete. Only members that have left can be deleted.
pub async fn delete_member(
    RequireClubAdmin(auth): RequireClubAdmin,
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(DbId, DbId)>,
) -> AppResult<StatusCode> {
    state
        .members
        .soft_delete_member(club_id, member_id, auth.user_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// POST /api/v1/clubs/{club_id}/members/{id}/status
pub async fn change_status(
    RequireClubAdmin(auth): RequireClubAdmin,
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(DbId, DbId)>,
    Json(input): Json<StatusChange>,
) -> AppResult<impl IntoResponse> {
    let member = state
        .members
        .change_status(club_id, member_id, &input, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: member }))
}

/// POST /api/v1/clubs/{club_id}/members/bulk-status
///
/// Always 200. Members that could not be changed are listed under `skipped`.
pub async fn bulk_change_status(
    RequireClubAdmin(auth): RequireClubAdmin,
    State(state): State<AppState>,
    Path(club_id): Path<DbId>,
    Json(input): Json<BulkStatusChange>,
) -> AppResult<impl IntoResponse> {
    let result = state
        .members
        .bulk_change_status(club_id, &input, auth.user_id)
        .await;
    Ok(Json(DataResponse { data: result }))
}

/// GET /api/v1/clubs/{club_id}/members/{id}/status-history
pub async fn status_history(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_club_access(club_id)?;
    let history = state
        .members
        .get_status_history(club_id, member_id)
        .await?;
    Ok(Json(DataResponse { data: history }))
}

/// GET /api/v1/clubs/{club_id}/members/{id}/periods
pub async fn membership_periods(
    RequireAuth(auth): RequireAuth,
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(DbId, DbId)>,
) -> AppResult<impl IntoResponse> {
    auth.ensure_club_access(club_id)?;
    let periods = state
        .members
        .get_membership_periods(club_id, member_id)
        .await?;
    Ok(Json(DataResponse { data: periods }))
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

/// PUT /api/v1/clubs/{club_id}/members/{id}/cancellation
pub async fn set_cancellation(
    RequireClubAdmin(auth): RequireClubAdmin,
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(DbId, DbId)>,
    Json(input): Json<SetCancellation>,
) -> AppResult<impl IntoResponse> {
    let member = state
        .members
        .set_cancellation(club_id, member_id, &input, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: member }))
}

/// DELETE /api/v1/clubs/{club_id}/members/{id}/cancellation
pub async fn revoke_cancellation(
    RequireClubAdmin(auth): RequireClubAdmin,
    State(state): State<AppState>,
    Path((club_id, member_id)): Path<(DbId, DbId)>,
    Json(input): Json<RevokeCancellation>,
) -> AppResult<impl IntoResponse> {
    let member = state
        .members
        .revoke_cancellation(club_id, member_id, &input, auth.user_id)
        .await?;
    Ok(Json(DataResponse { data: member }))
}
