//! Statistics API endpoints

use api_types::{envelope::ApiResponse, stats::TransactionStatistics};
use axum::{Extension, Json, extract::State};

use crate::server::{AuthUser, ServerState};

/// Global totals for the authenticated user; list filters do not apply.
pub async fn get_stats(
    Extension(AuthUser(user)): Extension<AuthUser>,
    State(state): State<ServerState>,
) -> Json<ApiResponse<TransactionStatistics>> {
    Json(ApiResponse::ok(state.ledger.statistics(&user).await))
}
