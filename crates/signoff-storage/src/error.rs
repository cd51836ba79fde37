/// Errors a [`crate::Storage`] or [`crate::Permission`] backend may return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// The requested object does not exist.
    #[error("not found: {0}")]
    NotFound(String),
    /// A write would violate a uniqueness constraint (e.g. duplicate id).
    #[error("unicity violation: {0}")]
    UnicityViolation(String),
    /// The backend failed for a reason that is not a simple not-found.
    #[error("backend error: {0}")]
    Backend(String),
}

impl From<StorageError> for signoff_error::SignoffError {
    fn from(err: StorageError) -> Self {
        let code = match &err {
            StorageError::NotFound(_) => signoff_error::ErrorCode::StorageNotFound,
            StorageError::UnicityViolation(_) | StorageError::Backend(_) => {
                signoff_error::ErrorCode::StorageFailed
            }
        };
        signoff_error::SignoffError::new(code, err.to_string())
    }
}
