use core_types::CoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Failed to load environment variables for database connection: {0}")]
    ConnectionConfigError(String),

    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Database migration failed: {0}")]
    MigrationError(#[from] sqlx::migrate::MigrateError),

    #[error("No such {resource}: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error(transparent)]
    Validation(#[from] CoreError),
}

impl DbError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }

    /// HTTP-equivalent status the route layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            DbError::NotFound { .. } => 404,
            DbError::Validation(_) => 400,
            _ => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_carries_404() {
        let err = DbError::not_found("customer", 42);
        assert_eq!(err.status(), 404);
        assert_eq!(err.to_string(), "No such customer: 42");
    }

    #[test]
    fn validation_carries_400() {
        let err = DbError::from(CoreError::invalid_input("search", "expected a last name"));
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn driver_errors_are_500() {
        assert_eq!(DbError::from(sqlx::Error::RowNotFound).status(), 500);
    }
}
