//! Database session extractor
//!
//! Opens a session from the injected manager before the handler runs.

use std::ops::{Deref, DerefMut};

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use dbsession_db::Session;

use crate::response::ApiError;
use crate::state::AppState;

/// Session opened for the current request.
///
/// Handlers should `close()` it when done; if they return early the session
/// is dropped, which rolls back any open transaction and releases the
/// connection.
#[derive(Debug)]
pub struct DbSession(pub Session);

impl DbSession {
    pub fn into_inner(self) -> Session {
        self.0
    }
}

impl Deref for DbSession {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for DbSession {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for DbSession
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(_parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);

        let session = app_state.sessions().acquire_session().await.map_err(|e| {
            tracing::warn!(error = %e, "Could not open database session");
            ApiError::from(e)
        })?;

        Ok(DbSession(session))
    }
}
