//! Task store error types.

use thiserror::Error;

/// Errors that can occur during task store operations.
#[derive(Debug, Error)]
pub enum TaskStoreError {
    /// Input failed validation; nothing was sent to the database.
    #[error("Invalid {field}: {message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Entity not found.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The database engine rejected a statement.
    #[error("{operation} failed{}: {source}", fmt_id(.id))]
    Storage {
        operation: &'static str,
        id: Option<String>,
        #[source]
        source: sqlx::Error,
    },

    /// Schema setup failed. A later call retries it.
    #[error("Failed to initialize {table} table: {message}")]
    Initialization {
        table: &'static str,
        message: String,
    },

    /// A stored row could not be mapped back into an entity.
    #[error("Corrupt {entity_type} row {id}, column {column}: {message}")]
    CorruptRow {
        entity_type: &'static str,
        id: String,
        column: &'static str,
        message: String,
    },
}

fn fmt_id(id: &Option<String>) -> String {
    id.as_ref()
        .map(|id| format!(" for {id}"))
        .unwrap_or_default()
}

impl TaskStoreError {
    /// Creates a validation error.
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            field,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Wraps an engine error with the operation and the affected id.
    pub fn storage(operation: &'static str, id: Option<&str>, source: sqlx::Error) -> Self {
        Self::Storage {
            operation,
            id: id.map(str::to_string),
            source,
        }
    }

    /// Creates a corrupt row error.
    pub fn corrupt_row(
        entity_type: &'static str,
        id: impl Into<String>,
        column: &'static str,
        message: impl ToString,
    ) -> Self {
        Self::CorruptRow {
            entity_type,
            id: id.into(),
            column,
            message: message.to_string(),
        }
    }

    /// Returns true for input errors the caller can fix.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Returns true when the target row does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for task store operations.
pub type TaskStoreResult<T> = Result<T, TaskStoreError>;
