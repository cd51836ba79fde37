use signoff_error::{ErrorCode, SignoffError};
use signoff_policy::TransitionOutcome;

/// Errors the engine can raise while processing a notification.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A transition was rejected by workflow policy.
    #[error("{message}")]
    Rejected {
        /// Stable error code for the rejection.
        code: ErrorCode,
        /// Human-readable rejection reason.
        message: String,
    },
    /// The source collection's timestamp is behind the destination's.
    #[error("source collection timestamp is behind destination: {0} < {1}")]
    StorageSkew(i64, i64),
    /// A storage backend call failed.
    #[error(transparent)]
    Storage(#[from] signoff_storage::StorageError),
    /// A signer call failed.
    #[error(transparent)]
    Signer(#[from] signoff_signer::SignerError),
    /// No resource in the configured map matches the changed URI.
    #[error("no configured resource matches {0}")]
    NoMatchingResource(String),
    /// Reading key material for the resolved signer settings failed.
    #[error(transparent)]
    KeyMaterial(#[from] std::io::Error),
}

impl From<TransitionOutcome> for EngineError {
    /// Only meaningful for a `Reject` outcome; an `Accept` has nothing to
    /// convert into an error and should be handled by the caller before
    /// this conversion is reached.
    fn from(outcome: TransitionOutcome) -> Self {
        match outcome {
            TransitionOutcome::Reject { code, message } => Self::Rejected { code, message },
            TransitionOutcome::Accept { next_status, .. } => Self::Rejected {
                code: ErrorCode::Internal,
                message: format!("accepted transition to {next_status} passed to error conversion"),
            },
        }
    }
}

impl From<EngineError> for SignoffError {
    fn from(err: EngineError) -> Self {
        let code = match &err {
            EngineError::Rejected { code, .. } => *code,
            EngineError::StorageSkew(..) => ErrorCode::WorkflowStorageSkew,
            EngineError::Storage(_) => ErrorCode::StorageFailed,
            EngineError::Signer(inner) => match inner {
                signoff_signer::SignerError::BadSignature(_) => ErrorCode::SigningBadSignature,
                _ => ErrorCode::SigningUnavailable,
            },
            EngineError::NoMatchingResource(_) => ErrorCode::ConfigInvalidResourceMap,
            EngineError::KeyMaterial(_) => ErrorCode::ConfigInvalidSetting,
        };
        SignoffError::new(code, err.to_string())
    }
}
