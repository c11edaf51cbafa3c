//! Error types shared by the binaries

mod app_error;

pub use app_error::AppError;
