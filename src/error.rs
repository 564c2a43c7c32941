//! Unified application error model and mapping helpers.
//! `StoreError` carries the domain outcomes raised by the record store, registry and
//! transfer coordinator; `AppError` is the transport-facing shape the HTTP layer
//! serializes, with an HTTP status mapping.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Failures raised by the core operations.
///
/// Out-of-range indexes are not errors: operations report "no change" instead.
/// Unreadable route files are recovered inside `storage::io` and never surface here.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("route not found: {0}")]
    RouteNotFound(String),

    #[error("permutation length {actual} does not match record count {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("order is not a permutation of the current record positions")]
    InvalidPermutation,

    #[error("route registry error: {0}")]
    Registry(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("table error: {0}")]
    Table(#[from] polars::prelude::PolarsError),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppError {
    UserInput { code: String, message: String },
    NotFound { code: String, message: String },
    Io { code: String, message: String },
    Internal { code: String, message: String },
}

impl AppError {
    pub fn code_str(&self) -> &str {
        match self {
            AppError::UserInput { code, .. }
            | AppError::NotFound { code, .. }
            | AppError::Io { code, .. }
            | AppError::Internal { code, .. } => code.as_str(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            AppError::UserInput { message, .. }
            | AppError::NotFound { message, .. }
            | AppError::Io { message, .. }
            | AppError::Internal { message, .. } => message.as_str(),
        }
    }

    pub fn user<S: Into<String>>(code: S, msg: S) -> Self { AppError::UserInput { code: code.into(), message: msg.into() } }
    pub fn not_found<S: Into<String>>(code: S, msg: S) -> Self { AppError::NotFound { code: code.into(), message: msg.into() } }
    pub fn io<S: Into<String>>(code: S, msg: S) -> Self { AppError::Io { code: code.into(), message: msg.into() } }
    pub fn internal<S: Into<String>>(code: S, msg: S) -> Self { AppError::Internal { code: code.into(), message: msg.into() } }

    /// Map to HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            AppError::UserInput { .. } => 400,
            AppError::NotFound { .. } => 404,
            AppError::Io { .. } => 503,
            AppError::Internal { .. } => 500,
        }
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code_str(), self.message())
    }
}

impl std::error::Error for AppError {}

pub type AppResult<T> = Result<T, AppError>;

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::RouteNotFound(_) => AppError::not_found("route_not_found".to_string(), message),
            StoreError::LengthMismatch { .. } => AppError::user("length_mismatch".to_string(), message),
            StoreError::InvalidPermutation => AppError::user("invalid_permutation".to_string(), message),
            StoreError::Io(_) => AppError::io("storage_io".to_string(), message),
            StoreError::Registry(_) => AppError::internal("registry_error".to_string(), message),
            StoreError::Table(_) | StoreError::Json(_) => AppError::internal("storage_error".to_string(), message),
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal { code: "internal_error".into(), message: err.to_string() }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
