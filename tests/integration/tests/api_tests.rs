//! API Integration Tests
//!
//! Run against the in-memory store by default. The PostgreSQL tests also
//! need `DATABASE_URL` and are skipped without it.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use std::collections::HashSet;
use std::time::Duration;

use dbsession_db::{BoundedPoolOptions, PoolStrategy};
use integration_tests::{
    assert_json, assert_status, database_config, memory_manager, ErrorBody, HealthResponse,
    PoolStatusResponse, ReadinessResponse, SessionCheckResponse, TestServer,
};
use reqwest::StatusCode;

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health").await.expect("Request failed");
    let body: HealthResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body.status, "healthy");
}

#[tokio::test]
async fn test_health_ready() {
    let server = TestServer::start().await.expect("Failed to start server");
    let response = server.get("/health/ready").await.expect("Request failed");
    let body: ReadinessResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body.status, "ready");
    assert_eq!(body.checks.database, "healthy");
}

#[tokio::test]
async fn test_health_ready_when_store_unreachable() {
    let (manager, store) = memory_manager(PoolStrategy::default()).unwrap();
    let server = TestServer::start_with_manager(manager).await.unwrap();

    store.set_reachable(false);
    let response = server.get("/health/ready").await.unwrap();
    let body: ReadinessResponse = assert_json(response, StatusCode::SERVICE_UNAVAILABLE)
        .await
        .unwrap();
    assert_eq!(body.checks.database, "unhealthy");

    store.set_reachable(true);
    let response = server.get("/health/ready").await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

// ============================================================================
// Session Tests
// ============================================================================

#[tokio::test]
async fn test_unpooled_sessions_leave_nothing_open() {
    let server = TestServer::start().await.unwrap();

    let mut ids = HashSet::new();
    for _ in 0..20 {
        let response = server.get("/api/v1/session").await.unwrap();
        let body: SessionCheckResponse = assert_json(response, StatusCode::OK).await.unwrap();
        assert_eq!(body.state, "closed");
        ids.insert(body.connection_id);
    }
    assert_eq!(ids.len(), 20, "every unpooled session opens its own connection");

    let response = server.get("/api/v1/pool").await.unwrap();
    let pool: PoolStatusResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(pool.strategy, "unbounded");
    assert_eq!(pool.open, 0);
    assert_eq!(pool.checked_out, 0);
    assert_eq!(pool.capacity, None);
}

#[tokio::test]
async fn test_pooled_sessions_reuse_connection() {
    let (manager, store) = memory_manager(PoolStrategy::default()).unwrap();
    let server = TestServer::start_with_manager(manager).await.unwrap();

    for _ in 0..10 {
        let response = server.get("/api/v1/session").await.unwrap();
        assert_status(response, StatusCode::OK).await.unwrap();
    }
    assert_eq!(store.total_connections(), 1);

    let response = server.get("/api/v1/pool").await.unwrap();
    let pool: PoolStatusResponse = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(pool.strategy, "bounded");
    assert_eq!(pool.store, "memory://integration");
    assert_eq!(pool.capacity, Some(15));
    assert_eq!(pool.idle, 1);
    assert_eq!(pool.recycled, 0);
}

#[tokio::test]
async fn test_exhausted_pool_returns_503() {
    let strategy = PoolStrategy::bounded(
        BoundedPoolOptions::default()
            .with_base_size(1)
            .with_max_overflow(0)
            .with_acquire_timeout(Duration::from_millis(200)),
    );
    let (manager, _store) = memory_manager(strategy).unwrap();
    let server = TestServer::start_with_manager(manager.clone()).await.unwrap();

    let mut held = manager.acquire_session().await.unwrap();

    let response = server.get("/api/v1/session").await.unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::SERVICE_UNAVAILABLE)
        .await
        .unwrap();
    assert_eq!(body.error.code, "POOL_EXHAUSTED");
    assert!(!body.error.message.is_empty());

    held.close().await;
    let response = server.get("/api/v1/session").await.unwrap();
    assert_status(response, StatusCode::OK).await.unwrap();
}

#[tokio::test]
async fn test_unreachable_store_returns_503() {
    let (manager, store) = memory_manager(PoolStrategy::Unbounded).unwrap();
    let server = TestServer::start_with_manager(manager).await.unwrap();

    store.set_reachable(false);
    let response = server.get("/api/v1/session").await.unwrap();
    let body: ErrorBody = assert_json(response, StatusCode::SERVICE_UNAVAILABLE)
        .await
        .unwrap();
    assert_eq!(body.error.code, "CONNECTION_ERROR");
}

#[tokio::test]
async fn test_request_id_header() {
    let server = TestServer::start().await.unwrap();
    let response = server.get("/health").await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

// ============================================================================
// PostgreSQL Tests
// ============================================================================

#[tokio::test]
async fn test_postgres_readiness() {
    let Some(config) = database_config() else {
        return;
    };

    for strategy in [PoolStrategy::Unbounded, PoolStrategy::default()] {
        let server = TestServer::start_with_config(config.clone(), strategy)
            .await
            .expect("Failed to start server");

        let response = server.get("/health/ready").await.unwrap();
        assert_status(response, StatusCode::OK).await.unwrap();

        let response = server.get("/api/v1/session").await.unwrap();
        assert_status(response, StatusCode::OK).await.unwrap();
    }
}
