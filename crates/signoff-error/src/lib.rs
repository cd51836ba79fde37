// SPDX-License-Identifier: MIT OR Apache-2.0
//! Unified error taxonomy with stable error codes for the signoff engine.
//!
//! Every engine error carries an [`ErrorCode`] (a machine-readable, stable
//! string tag), a human-readable message, an optional cause chain, and
//! arbitrary key-value context. Use [`SignoffError::new`] to build one.
#![deny(unsafe_code)]
#![warn(missing_docs)]

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ErrorCategory
// ---------------------------------------------------------------------------

/// Broad family an [`ErrorCode`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Settings / resource-map parsing failures, raised at init.
    Config,
    /// Workflow (status transition, authorization) rejections.
    Workflow,
    /// Signature production / verification failures.
    Signing,
    /// Backend storage or permission-store failures.
    Storage,
    /// Catch-all for unexpected internal errors.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Config => "config",
            Self::Workflow => "workflow",
            Self::Signing => "signing",
            Self::Storage => "storage",
            Self::Internal => "internal",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// ErrorCode
// ---------------------------------------------------------------------------

/// Machine-readable, stable error code.
///
/// Each variant serializes to a `SCREAMING_SNAKE_CASE` string. `http_status`
/// gives the response code a host HTTP adapter should surface: 4xx codes are
/// raised synchronously from validation, while 5xx codes from the signer set
/// the response status without failing the whole process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// The `signer.resources` grammar (or a referenced setting) is invalid.
    ConfigInvalidResourceMap,
    /// A scoped setting required by a signer or group is missing/invalid.
    ConfigInvalidSetting,

    /// An unknown or forbidden `status` string was posted.
    WorkflowInvalidStatus,
    /// A tracking field was posted by a non-plugin principal.
    WorkflowTrackingFieldTampered,
    /// `status` was removed from a collection that had one.
    WorkflowStatusRemoved,
    /// `to-sign` was requested without a prior `to-review` (or refresh).
    WorkflowNotReviewed,
    /// Caller is not a member of the editors group.
    WorkflowNotInEditorsGroup,
    /// Caller is not a member of the reviewers group.
    WorkflowNotInReviewersGroup,
    /// The requesting editor attempted to review their own request.
    WorkflowEditorCannotReview,
    /// A destination collection cannot be deleted while its source exists.
    WorkflowDestinationInUse,
    /// The source collection's timestamp is behind the destination's.
    WorkflowStorageSkew,

    /// Signature verification failed.
    SigningBadSignature,
    /// The remote signer is unreachable or returned an error.
    SigningUnavailable,

    /// The requested object does not exist in the backend.
    StorageNotFound,
    /// The backend returned an error that is not a simple not-found.
    StorageFailed,

    /// Catch-all for unexpected internal errors.
    Internal,
}

impl ErrorCode {
    /// Returns the broad [`ErrorCategory`] this code belongs to.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ConfigInvalidResourceMap | Self::ConfigInvalidSetting => ErrorCategory::Config,

            Self::WorkflowInvalidStatus
            | Self::WorkflowTrackingFieldTampered
            | Self::WorkflowStatusRemoved
            | Self::WorkflowNotReviewed
            | Self::WorkflowNotInEditorsGroup
            | Self::WorkflowNotInReviewersGroup
            | Self::WorkflowEditorCannotReview
            | Self::WorkflowDestinationInUse
            | Self::WorkflowStorageSkew => ErrorCategory::Workflow,

            Self::SigningBadSignature | Self::SigningUnavailable => ErrorCategory::Signing,

            Self::StorageNotFound | Self::StorageFailed => ErrorCategory::Storage,

            Self::Internal => ErrorCategory::Internal,
        }
    }

    /// HTTP status a host adapter should report for this code, if any.
    ///
    /// `None` means the error never crosses the HTTP boundary directly
    /// (e.g. [`Self::SigningBadSignature`] is only ever raised from
    /// self-tests and heartbeats, never from a request handler).
    #[must_use]
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::WorkflowInvalidStatus
            | Self::WorkflowTrackingFieldTampered
            | Self::WorkflowStatusRemoved
            | Self::WorkflowNotReviewed
            | Self::WorkflowStorageSkew
            | Self::ConfigInvalidResourceMap
            | Self::ConfigInvalidSetting => Some(400),

            Self::WorkflowNotInEditorsGroup
            | Self::WorkflowNotInReviewersGroup
            | Self::WorkflowEditorCannotReview
            | Self::WorkflowDestinationInUse => Some(403),

            Self::StorageNotFound => Some(404),

            Self::SigningUnavailable => Some(503),

            Self::SigningBadSignature | Self::StorageFailed | Self::Internal => None,
        }
    }

    /// Stable `&'static str` representation (e.g. `"WORKFLOW_NOT_REVIEWED"`).
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConfigInvalidResourceMap => "CONFIG_INVALID_RESOURCE_MAP",
            Self::ConfigInvalidSetting => "CONFIG_INVALID_SETTING",
            Self::WorkflowInvalidStatus => "WORKFLOW_INVALID_STATUS",
            Self::WorkflowTrackingFieldTampered => "WORKFLOW_TRACKING_FIELD_TAMPERED",
            Self::WorkflowStatusRemoved => "WORKFLOW_STATUS_REMOVED",
            Self::WorkflowNotReviewed => "WORKFLOW_NOT_REVIEWED",
            Self::WorkflowNotInEditorsGroup => "WORKFLOW_NOT_IN_EDITORS_GROUP",
            Self::WorkflowNotInReviewersGroup => "WORKFLOW_NOT_IN_REVIEWERS_GROUP",
            Self::WorkflowEditorCannotReview => "WORKFLOW_EDITOR_CANNOT_REVIEW",
            Self::WorkflowDestinationInUse => "WORKFLOW_DESTINATION_IN_USE",
            Self::WorkflowStorageSkew => "WORKFLOW_STORAGE_SKEW",
            Self::SigningBadSignature => "SIGNING_BAD_SIGNATURE",
            Self::SigningUnavailable => "SIGNING_UNAVAILABLE",
            Self::StorageNotFound => "STORAGE_NOT_FOUND",
            Self::StorageFailed => "STORAGE_FAILED",
            Self::Internal => "INTERNAL",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// SignoffError
// ---------------------------------------------------------------------------

/// Unified engine error.
///
/// Carries a stable [`ErrorCode`], a human-readable message, an optional
/// source error for cause-chaining, and arbitrary structured context.
///
/// ```
/// use signoff_error::{SignoffError, ErrorCode};
///
/// let err = SignoffError::new(ErrorCode::WorkflowNotReviewed, "Collection not reviewed")
///     .with_context("collection", "/buckets/main/collections/blocklist");
/// assert_eq!(err.code.http_status(), Some(400));
/// ```
pub struct SignoffError {
    /// Machine-readable error code.
    pub code: ErrorCode,
    /// Human-readable description, e.g. `"Editor cannot review"`.
    pub message: String,
    /// Optional underlying cause.
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
    /// Arbitrary structured context for diagnostics.
    pub context: BTreeMap<String, serde_json::Value>,
}

impl SignoffError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
            context: BTreeMap::new(),
        }
    }

    /// Attach a key-value pair to the diagnostic context.
    ///
    /// The value is converted via [`serde_json::to_value`]; if serialization
    /// fails, the entry is silently skipped.
    #[must_use]
    pub fn with_context(mut self, key: impl Into<String>, value: impl Serialize) -> Self {
        if let Ok(v) = serde_json::to_value(value) {
            self.context.insert(key.into(), v);
        }
        self
    }

    /// Attach an underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Shorthand for `self.code.category()`.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        self.code.category()
    }
}

impl fmt::Debug for SignoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct("SignoffError");
        d.field("code", &self.code);
        d.field("message", &self.message);
        if let Some(ref src) = self.source {
            d.field("source", &src.to_string());
        }
        if !self.context.is_empty() {
            d.field("context", &self.context);
        }
        d.finish()
    }
}

impl fmt::Display for SignoffError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)?;
        if !self.context.is_empty() {
            if let Ok(ctx) = serde_json::to_string(&self.context) {
                write!(f, " {ctx}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for SignoffError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}
