//! Pool and session diagnostics

use axum::{extract::State, Json};
use dbsession_db::PoolStatus;
use serde::Serialize;

use crate::extractors::DbSession;
use crate::response::ApiResult;
use crate::state::AppState;

/// Pool occupancy as reported by the session manager
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatusResponse {
    pub strategy: String,
    pub store: String,
    pub checked_out: usize,
    pub idle: usize,
    pub open: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<usize>,
    pub recycled: u64,
}

impl PoolStatusResponse {
    fn new(status: PoolStatus, store: String) -> Self {
        Self {
            strategy: status.strategy.to_string(),
            store,
            checked_out: status.checked_out,
            idle: status.idle,
            open: status.open,
            capacity: status.capacity,
            recycled: status.recycled,
        }
    }
}

/// Result of opening and probing one session
#[derive(Debug, Clone, Serialize)]
pub struct SessionCheckResponse {
    pub connection_id: u64,
    pub state: String,
}

/// GET /api/v1/pool
pub async fn pool_status(State(state): State<AppState>) -> Json<PoolStatusResponse> {
    let sessions = state.sessions();
    Json(PoolStatusResponse::new(
        sessions.status(),
        sessions.pool().target(),
    ))
}

/// Open a session, ping the store on it and close it again
///
/// GET /api/v1/session
pub async fn session_check(DbSession(mut session): DbSession) -> ApiResult<Json<SessionCheckResponse>> {
    let connection_id = session.connection_id().unwrap_or_default();
    session.ping().await?;
    session.close().await;

    Ok(Json(SessionCheckResponse {
        connection_id,
        state: session.state().to_string(),
    }))
}
