use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(sqlx::Error),

    #[error("Record not found")]
    NotFound,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database connection error: {0}")]
    ConnectionError(String),
}

impl DatabaseError {
    /// True when the database could not be reached, as opposed to a failing query.
    pub fn is_unavailable(&self) -> bool {
        match self {
            DatabaseError::ConnectionError(_) => true,
            DatabaseError::Sqlx(err) => is_connectivity(err),
            _ => false,
        }
    }
}

fn is_connectivity(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::WorkerCrashed
    )
}

impl From<sqlx::Error> for DatabaseError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DatabaseError::NotFound,
            err if is_connectivity(&err) => DatabaseError::ConnectionError(err.to_string()),
            err => DatabaseError::Sqlx(err),
        }
    }
}

impl From<validator::ValidationErrors> for DatabaseError {
    fn from(errors: validator::ValidationErrors) -> Self {
        DatabaseError::InvalidInput(errors.to_string())
    }
}
