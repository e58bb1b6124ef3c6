use crate::domain::error::{AppError, Result};
use serde_json::{Map, Value};

/// Rows returned by a validated query, in store-native column and row order.
/// Row objects keep insertion order, so serialized records list columns the
/// way the store returned them.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl ResultSet {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Serialize to a JSON records array (`[{"col": value, ...}, ...]`).
    /// An empty set serializes to `[]`, never to an error or null.
    pub fn to_json_records(&self) -> Result<String> {
        serde_json::to_string(&self.rows)
            .map_err(|e| AppError::ExecutionError(format!("Failed to serialize rows: {}", e)))
    }

    /// The rows as JSON objects, for callers that want the native form.
    pub fn to_json_values(&self) -> Vec<Value> {
        self.rows.iter().cloned().map(Value::Object).collect()
    }
}
