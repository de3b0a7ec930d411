use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation on {}", .table.as_deref().unwrap_or("unknown table"))]
    UniqueViolation {
        table: Option<String>,
        column: Option<String>,
        message: String,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation { message: String },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation { message: String },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// True when this is a unique violation on the given `table.column`.
    pub fn is_unique_violation_on(&self, table: &str, column: &str) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { table: Some(t), column: Some(c), .. } if t == table && c == column
        )
    }
}

/// Convert from sqlx::Error using sqlx's error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                if db_err.is_unique_violation() {
                    let (table, column) = match constraint_target(&message) {
                        Some((table, column)) => (Some(table), Some(column)),
                        None => (None, None),
                    };
                    DbError::UniqueViolation { table, column, message }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation { message }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation { message }
                } else {
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// SQLite does not report constraint names through the driver, only a message
/// such as `UNIQUE constraint failed: users.email`. Pull the first
/// `table.column` pair out of it.
fn constraint_target(message: &str) -> Option<(String, String)> {
    let (_, targets) = message.split_once("failed: ")?;
    let first = targets.split(',').next()?.trim();
    let (table, column) = first.split_once('.')?;
    Some((table.to_string(), column.to_string()))
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_target_single_column() {
        assert_eq!(
            constraint_target("UNIQUE constraint failed: users.email"),
            Some(("users".to_string(), "email".to_string()))
        );
    }

    #[test]
    fn test_constraint_target_composite() {
        assert_eq!(
            constraint_target("UNIQUE constraint failed: transactions.user_id, transactions.recipient"),
            Some(("transactions".to_string(), "user_id".to_string()))
        );
    }

    #[test]
    fn test_constraint_target_unrecognised() {
        assert_eq!(constraint_target("database is locked"), None);
    }

    #[test]
    fn test_is_unique_violation_on() {
        let err = DbError::UniqueViolation {
            table: Some("users".to_string()),
            column: Some("email".to_string()),
            message: "UNIQUE constraint failed: users.email".to_string(),
        };
        assert!(err.is_unique_violation_on("users", "email"));
        assert!(!err.is_unique_violation_on("users", "id"));
        assert!(!DbError::NotFound.is_unique_violation_on("users", "email"));
    }
}
