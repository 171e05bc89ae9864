//! Route definitions for the club lifecycle.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::clubs;
use crate::state::AppState;

/// ```text
/// GET    /clubs/{club_id}/lifecycle     -> lifecycle_overview
/// POST   /clubs/{club_id}/deactivate    -> deactivate_club
/// POST   /clubs/{club_id}/reactivate    -> reactivate_club
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clubs/{club_id}/lifecycle", get(clubs::lifecycle_overview))
        .route("/clubs/{club_id}/deactivate", post(clubs::deactivate_club))
        .route("/clubs/{club_id}/reactivate", post(clubs::reactivate_club))
}
