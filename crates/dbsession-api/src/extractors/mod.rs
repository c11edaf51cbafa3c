//! Axum extractors for request handling

mod session;

pub use session::DbSession;
