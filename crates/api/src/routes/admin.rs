//! Route definitions for platform admin lifecycle triggers.

use axum::routing::post;
use axum::Router;

use crate::handlers::lifecycle_admin;
use crate::state::AppState;

/// Routes mounted at `/admin/lifecycle`.
///
/// ```text
/// POST   /deletion-sweep     -> run_deletion_sweep
/// POST   /milestone-sweep    -> run_milestone_sweep
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/deletion-sweep", post(lifecycle_admin::run_deletion_sweep))
        .route("/milestone-sweep", post(lifecycle_admin::run_milestone_sweep))
}
