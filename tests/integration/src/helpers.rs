//! Test helpers for integration tests
//!
//! Provides utilities for spawning test servers and checking responses.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use dbsession_api::{create_app, create_app_state_with, AppState};
use dbsession_common::{AppConfig, AppSettings, DatabaseConfig, ServerConfig};
use dbsession_db::{
    build_pool_with_connector, MemoryConnector, MemoryStore, PoolStrategy, SessionManager,
};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Test server instance that manages lifecycle
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    _handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a server on the in-memory store without pooling, the way the
    /// test suite runs against a real database
    pub async fn start() -> Result<Self> {
        let config = memory_config();
        let state = create_app_state_with(config, PoolStrategy::Unbounded)?;
        Self::start_with_state(state).await
    }

    /// Start a server around a manager the test keeps a handle to
    pub async fn start_with_manager(manager: Arc<SessionManager>) -> Result<Self> {
        Self::start_with_state(AppState::new(manager, memory_config())).await
    }

    /// Start a server with the given config and strategy
    pub async fn start_with_config(config: AppConfig, strategy: PoolStrategy) -> Result<Self> {
        Self::start_with_state(create_app_state_with(config, strategy)?).await
    }

    async fn start_with_state(state: AppState) -> Result<Self> {
        let app = create_app(state);

        let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0))).await?;
        let addr = listener.local_addr()?;

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            addr,
            client,
            _handle: handle,
        })
    }

    /// Get base URL for the server
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> Result<Response> {
        let url = format!("{}{}", self.base_url(), path);
        Ok(self.client.get(&url).send().await?)
    }
}

/// App config pointing at a fresh in-memory store
pub fn memory_config() -> AppConfig {
    AppConfig {
        app: AppSettings::default(),
        api: ServerConfig::default(),
        database: DatabaseConfig::new("memory://integration").with_pool(false),
    }
}

/// Session manager over a store the test controls
pub fn memory_manager(strategy: PoolStrategy) -> Result<(Arc<SessionManager>, Arc<MemoryStore>)> {
    let store = MemoryStore::new();
    let connector = Arc::new(MemoryConnector::named("integration", Arc::clone(&store)));
    let pool = build_pool_with_connector(connector, strategy)?;
    Ok((Arc::new(SessionManager::from_pool(pool)), store))
}

/// Configuration for a real database, when `DATABASE_URL` is set
pub fn database_config() -> Option<AppConfig> {
    dotenvy::dotenv().ok();

    match AppConfig::from_env() {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Skipping test: {e}");
            None
        }
    }
}

/// Assert response status and parse JSON body
pub async fn assert_json<T: DeserializeOwned>(
    response: Response,
    expected_status: StatusCode,
) -> Result<T> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(response.json().await?)
}

/// Assert response status without parsing body
pub async fn assert_status(response: Response, expected_status: StatusCode) -> Result<()> {
    let status = response.status();
    if status != expected_status {
        let body = response.text().await?;
        anyhow::bail!(
            "Expected status {}, got {}. Body: {}",
            expected_status,
            status,
            body
        );
    }
    Ok(())
}
