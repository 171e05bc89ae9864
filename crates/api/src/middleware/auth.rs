//! JWT-based authentication extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use clubhouse_core::error::CoreError;
use clubhouse_core::roles::ROLE_ADMIN;
use clubhouse_core::types::DbId;

use crate::auth::jwt::validate_token;
use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user extracted from a JWT Bearer token in the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    /// The user's role name (e.g. `"admin"`, `"club_admin"`, `"staff"`).
    pub role: String,
    /// The club the user belongs to; `None` for platform admins.
    pub club_id: Option<DbId>,
}

impl AuthUser {
    pub fn is_platform_admin(&self) -> bool {
        self.role == ROLE_ADMIN
    }

    /// Platform admins see every club; everyone else only their own.
    pub fn ensure_club_access(&self, club_id: DbId) -> Result<(), AppError> {
        if self.is_platform_admin() || self.club_id == Some(club_id) {
            return Ok(());
        }
        Err(AppError::Core(CoreError::Forbidden(format!(
            "No access to club {club_id}"
        ))))
    }
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = validate_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        Ok(AuthUser {
            user_id: claims.sub,
            role: claims.role,
            club_id: claims.club_id,
        })
    }
}
