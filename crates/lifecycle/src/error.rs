use clubhouse_core::error::CoreError;

/// Failure inside a [`LifecycleStore`](crate::store::LifecycleStore)
/// implementation.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write would leave a dangling reference. The in-memory store raises
    /// this where PostgreSQL would raise a foreign key violation.
    #[error("Integrity violation: {0}")]
    Integrity(String),

    /// The in-memory store was told to fail this operation.
    #[error("Injected failure: {0}")]
    Injected(String),
}

/// Error returned by every lifecycle operation.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<sqlx::Error> for LifecycleError {
    fn from(e: sqlx::Error) -> Self {
        Self::Store(StoreError::Database(e))
    }
}

impl From<validator::ValidationErrors> for LifecycleError {
    fn from(e: validator::ValidationErrors) -> Self {
        Self::Core(CoreError::Validation(e.to_string()))
    }
}

impl LifecycleError {
    /// The domain error, if this is one.
    pub fn as_core(&self) -> Option<&CoreError> {
        match self {
            Self::Core(e) => Some(e),
            Self::Store(_) => None,
        }
    }
}

pub type LifecycleResult<T> = Result<T, LifecycleError>;
