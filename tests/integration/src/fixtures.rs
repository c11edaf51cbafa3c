//! Response shapes the API returns, for deserializing in tests

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Deserialize)]
pub struct HealthChecks {
    pub database: String,
}

#[derive(Debug, Deserialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Deserialize)]
pub struct PoolStatusResponse {
    pub strategy: String,
    pub store: String,
    pub checked_out: usize,
    pub idle: usize,
    pub open: usize,
    pub capacity: Option<usize>,
    pub recycled: u64,
}

#[derive(Debug, Deserialize)]
pub struct SessionCheckResponse {
    pub connection_id: u64,
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}
