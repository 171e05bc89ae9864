pub mod admin;
pub mod clubs;
pub mod health;
pub mod members;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /clubs/{club_id}/members                          list, create
/// /clubs/{club_id}/members/bulk-status              bulk status change (POST)
/// /clubs/{club_id}/members/{id}                     get, update, soft delete
/// /clubs/{club_id}/members/{id}/status              status change (POST)
/// /clubs/{club_id}/members/{id}/cancellation        set (PUT), revoke (DELETE)
/// /clubs/{club_id}/members/{id}/status-history      audit trail (GET)
/// /clubs/{club_id}/members/{id}/periods             membership periods (GET)
///
/// /clubs/{club_id}/lifecycle                        deactivation overview (GET)
/// /clubs/{club_id}/deactivate                       deactivate (POST)
/// /clubs/{club_id}/reactivate                       reactivate (POST)
///
/// /admin/lifecycle/deletion-sweep                   run deletion sweep (POST)
/// /admin/lifecycle/milestone-sweep                  run milestone sweep (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(members::router())
        .merge(clubs::router())
        .nest("/admin/lifecycle", admin::router())
}
