//! Route definitions for club members.

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::members;
use crate::state::AppState;

/// ```text
/// GET    /clubs/{club_id}/members                        -> list_members
/// POST   /clubs/{club_id}/members                        -> create_member
/// POST   /clubs/{club_id}/members/bulk-status            -> bulk_change_status
/// GET    /clubs/{club_id}/members/{id}                   -> get_member
/// PUT    /clubs/{club_id}/members/{id}                   -> update_member
/// DELETE /clubs/{club_id}/members/{id}                   -> delete_member
/// POST   /clubs/{club_id}/members/{id}/status            -> change_status
/// PUT    /clubs/{club_id}/members/{id}/cancellation      -> set_cancellation
/// DELETE /clubs/{club_id}/members/{id}/cancellation      -> revoke_cancellation
/// GET    /clubs/{club_id}/members/{id}/status-history    -> status_history
/// GET    /clubs/{club_id}/members/{id}/periods           -> membership_periods
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/clubs/{club_id}/members",
            get(members::list_members).post(members::create_member),
        )
        .route(
            "/clubs/{club_id}/members/bulk-status",
            post(members::bulk_change_status),
        )
        .route(
            "/clubs/{club_id}/members/{id}",
            get(members::get_member)
                .put(members::update_member)
                .delete(members::delete_member),
        )
        .route(
            "/clubs/{club_id}/members/{id}/status",
            post(members::change_status),
        )
        .route(
            "/clubs/{club_id}/members/{id}/cancellation",
            put(members::set_cancellation).delete(members::revoke_cancellation),
        )
        .route(
            "/clubs/{club_id}/members/{id}/status-history",
            get(members::status_history),
        )
        .route(
            "/clubs/{club_id}/members/{id}/periods",
            get(members::membership_periods),
        )
}
