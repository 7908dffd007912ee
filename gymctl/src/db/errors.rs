use thiserror::Error;

/// Unified error type for database operations that application code can handle
#[derive(Error, Debug)]
pub enum DbError {
    /// Entity not found by the given identifier
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Unique constraint violation")]
    UniqueViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
        /// The conflicting value that caused the violation (if extractable)
        conflicting_value: Option<String>,
    },

    /// Foreign key constraint violation
    #[error("Foreign key constraint violation")]
    ForeignKeyViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Check constraint violation
    #[error("Check constraint violation")]
    CheckViolation {
        constraint: Option<String>,
        table: Option<String>,
        message: String,
    },

    /// Catch-all for non-recoverable errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DbError {
    /// Whether this is a unique violation on the one-payment-per-period
    /// constraint. The generation sweep treats these as recoverable skips.
    pub fn is_period_conflict(&self) -> bool {
        matches!(
            self,
            DbError::UniqueViolation { constraint: Some(c), .. } if c == "payments_member_period_unique"
        )
    }
}

/// Convert from sqlx::Error using proper sqlx error categorization
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => DbError::NotFound,
            sqlx::Error::Database(db_err) => {
                if db_err.is_unique_violation() {
                    let constraint = db_err.constraint().map(|s| s.to_string());

                    // Extract the conflicting key value from the Postgres detail
                    let conflicting_value = if let Some(pg_err) = db_err.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
                        pg_err.detail().and_then(extract_conflicting_value)
                    } else {
                        None
                    };

                    DbError::UniqueViolation {
                        constraint,
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                        conflicting_value,
                    }
                } else if db_err.is_foreign_key_violation() {
                    DbError::ForeignKeyViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else if db_err.is_check_violation() {
                    DbError::CheckViolation {
                        constraint: db_err.constraint().map(|s| s.to_string()),
                        table: db_err.table().map(|s| s.to_string()),
                        message: db_err.message().to_string(),
                    }
                } else {
                    // All other database errors are non-recoverable - convert to anyhow
                    DbError::Other(anyhow::Error::from(err))
                }
            }
            // All other sqlx errors are non-recoverable - convert to anyhow with context
            _ => DbError::Other(anyhow::Error::from(err)),
        }
    }
}

/// Extract the conflicting value from a PostgreSQL unique violation detail.
/// Details look like: "Key (member_id, month, year)=(GM0001, August, 2026) already exists."
fn extract_conflicting_value(detail: &str) -> Option<String> {
    let start = detail.find("=(")?;
    let end = detail[start + 2..].find(')')?;
    Some(detail[start + 2..start + 2 + end].to_string())
}

/// Type alias for database operation results
pub type Result<T> = std::result::Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_conflicting_value() {
        let detail = "Key (member_id, month, year)=(GM0001, August, 2026) already exists.";
        assert_eq!(extract_conflicting_value(detail), Some("GM0001, August, 2026".to_string()));
    }

    #[test]
    fn test_extract_conflicting_value_malformed() {
        assert_eq!(extract_conflicting_value("no key here"), None);
        assert_eq!(extract_conflicting_value("Key (x)=(unterminated"), None);
    }
}
