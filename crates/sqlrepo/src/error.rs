//! Error types for sqlrepo

use thiserror::Error;

/// Result type alias for sqlrepo operations
pub type RepoResult<T> = Result<T, RepoError>;

/// Boxed driver error carried verbatim by [`RepoError::Execution`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error types for repository operations
#[derive(Debug, Error)]
pub enum RepoError {
    /// Statement construction failed (malformed table/column/value sets)
    #[error("Query build error: {0}")]
    QueryBuild(String),

    /// The database rejected or failed to run the statement
    #[error("Execution error: {0}")]
    Execution(#[source] BoxError),

    /// A single-row lookup matched zero rows
    #[error("Not found: {0}")]
    NotFound(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// Statement exceeded the configured timeout
    #[error("Statement timeout after {0:?}")]
    Timeout(std::time::Duration),

    /// Statement was cancelled before it started
    #[error("Statement cancelled")]
    Cancelled,

    /// Database handle could not be opened or used
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

/// Constraint class of an execution failure, see [`RepoError::constraint_violation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintKind {
    Unique,
    ForeignKey,
    Check,
    NotNull,
}

impl RepoError {
    /// Create a query build error
    pub fn query_build(message: impl Into<String>) -> Self {
        Self::QueryBuild(message.into())
    }

    /// Wrap a driver error without altering it
    pub fn execution(err: impl Into<BoxError>) -> Self {
        Self::Execution(err.into())
    }

    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }

    /// Check if this is a statement construction error
    pub fn is_query_build(&self) -> bool {
        matches!(self, Self::QueryBuild(_))
    }

    /// Check if the database reported an execution failure
    pub fn is_execution(&self) -> bool {
        matches!(self, Self::Execution(_))
    }

    /// Classify an execution failure as a constraint violation.
    ///
    /// The driver error stays untouched inside [`RepoError::Execution`]; this only
    /// inspects it. Returns `None` for every other variant.
    pub fn constraint_violation(&self) -> Option<ConstraintKind> {
        let Self::Execution(source) = self else {
            return None;
        };

        if let Some(err) = source.downcast_ref::<tokio_postgres::Error>() {
            let db_err = err.as_db_error()?;
            return match db_err.code().code() {
                "23505" => Some(ConstraintKind::Unique),
                "23503" => Some(ConstraintKind::ForeignKey),
                "23514" => Some(ConstraintKind::Check),
                "23502" => Some(ConstraintKind::NotNull),
                _ => None,
            };
        }

        #[cfg(feature = "sqlite")]
        if let Some(rusqlite::Error::SqliteFailure(err, _)) = source.downcast_ref::<rusqlite::Error>()
        {
            use rusqlite::ffi;
            return match err.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    Some(ConstraintKind::Unique)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => Some(ConstraintKind::ForeignKey),
                ffi::SQLITE_CONSTRAINT_CHECK => Some(ConstraintKind::Check),
                ffi::SQLITE_CONSTRAINT_NOTNULL => Some(ConstraintKind::NotNull),
                _ => None,
            };
        }

        None
    }
}

impl From<tokio_postgres::Error> for RepoError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::execution(err)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for RepoError {
    fn from(err: rusqlite::Error) -> Self {
        Self::execution(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for RepoError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}
