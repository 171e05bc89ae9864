//! Role-based access control (RBAC) extractors.
//!
//! Each extractor wraps [`AuthUser`] and rejects requests whose role does not
//! meet the minimum requirement.

use std::collections::HashMap;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use clubhouse_core::error::CoreError;
use clubhouse_core::roles::{ROLE_ADMIN, ROLE_CLUB_ADMIN};
use clubhouse_core::types::DbId;

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the platform `admin` role. Rejects with 403 Forbidden otherwise.
///
/// ```ignore
/// async fn admin_only(RequireAdmin(user): RequireAdmin) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role != ROLE_ADMIN {
            return Err(AppError::Core(CoreError::Forbidden(
                "Admin role required".into(),
            )));
        }
        Ok(RequireAdmin(user))
    }
}

/// Requires `club_admin` for the club named by the `{club_id}` path segment,
/// or the platform `admin` role. Rejects with 403 Forbidden otherwise.
///
/// Only usable on routes that carry a `{club_id}` parameter.
pub struct RequireClubAdmin(pub AuthUser);

impl FromRequestParts<AppState> for RequireClubAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if user.role == ROLE_ADMIN {
            return Ok(RequireClubAdmin(user));
        }

        let club_id = path_club_id(parts, state).await?;
        if user.role != ROLE_CLUB_ADMIN || user.club_id != Some(club_id) {
            return Err(AppError::Core(CoreError::Forbidden(
                "Club admin role required".into(),
            )));
        }
        Ok(RequireClubAdmin(user))
    }
}

async fn path_club_id(parts: &mut Parts, state: &AppState) -> Result<DbId, AppError> {
    let Path(params) = Path::<HashMap<String, String>>::from_request_parts(parts, state)
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;
    let raw = params
        .get("club_id")
        .ok_or_else(|| AppError::InternalError("Route has no {club_id} segment".into()))?;
    raw.parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid club id '{raw}'")))
}

/// Requires any authenticated user (any valid role).
///
/// Functionally equivalent to [`AuthUser`] but named explicitly for use in
/// route definitions where the intent "this route requires authentication"
/// should be self-documenting.
pub struct RequireAuth(pub AuthUser);

impl FromRequestParts<AppState> for RequireAuth {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        Ok(RequireAuth(user))
    }
}
