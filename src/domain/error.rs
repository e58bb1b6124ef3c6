use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Serialize, Deserialize)]
pub enum AppError {
    StoreUnavailable(String),
    SchemaEmpty(String),
    GeneratorUnavailable(String),
    GeneratorTimeout(String),
    UnsafeStatement(String),
    ExecutionError(String),
    Unauthorized(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::StoreUnavailable(msg) => write!(f, "Store unavailable: {}", msg),
            AppError::SchemaEmpty(msg) => write!(f, "Schema empty: {}", msg),
            AppError::GeneratorUnavailable(msg) => write!(f, "Generator unavailable: {}", msg),
            AppError::GeneratorTimeout(msg) => write!(f, "Generator timed out: {}", msg),
            AppError::UnsafeStatement(msg) => write!(f, "Unsafe statement: {}", msg),
            AppError::ExecutionError(msg) => write!(f, "Execution error: {}", msg),
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::StoreUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
