use signoff_core::Status;
use signoff_error::ErrorCode;

use crate::{Caller, WorkflowSettings};

/// An action the engine must take to realize an accepted transition. Several
/// may apply to one transition (e.g. stamping tracking fields always
/// accompanies a status change, so callers add that themselves; this enum
/// covers what's distinctive per transition).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Stamp `last_review_request_{by,date}`; no mirroring yet.
    StampReviewRequested,
    /// Cancel an in-flight review request, back to work-in-progress.
    CancelReview,
    /// Mirror source records to preview/destination and sign.
    MirrorAndSign,
    /// Re-sign the current destination without mirroring.
    RefreshSignature,
    /// Replace source records with a copy of the destination's, then sign.
    RollbackAndSign,
}

/// The caller's requested status change, plus everything needed to decide it.
pub struct TransitionRequest<'a> {
    /// The collection's current status, or `None` if it has never had one.
    pub current_status: Option<Status>,
    /// The status the caller is attempting to PATCH in.
    pub requested_status: Status,
    /// The authenticated caller.
    pub caller: &'a Caller,
    /// Userid that requested the current pending review, if any.
    pub last_review_request_by: Option<&'a str>,
    /// Authorization settings in effect for this resource.
    pub settings: &'a WorkflowSettings,
}

/// Result of validating a status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// The transition is allowed; `next_status` is what gets stored and
    /// `effects` lists what the engine must additionally do.
    Accept {
        /// The status to store.
        next_status: Status,
        /// Side effects the engine must carry out.
        effects: Vec<Effect>,
    },
    /// The transition is rejected outright; nothing changes.
    Reject {
        /// Stable error code for the rejection.
        code: ErrorCode,
        /// Human-readable rejection reason.
        message: String,
    },
}

fn reject(code: ErrorCode, message: impl Into<String>) -> TransitionOutcome {
    TransitionOutcome::Reject {
        code,
        message: message.into(),
    }
}

fn accept(next_status: Status, effects: Vec<Effect>) -> TransitionOutcome {
    TransitionOutcome::Accept { next_status, effects }
}

/// Validate removing `status` from a collection that had one — always
/// forbidden. `Ok(())` means there was nothing to remove (status was
/// already absent).
///
/// # Errors
/// Returns the rejection outcome if `current_status` was `Some`.
pub fn validate_status_removal(current_status: Option<Status>) -> Result<(), TransitionOutcome> {
    match current_status {
        Some(_) => Err(reject(ErrorCode::WorkflowStatusRemoved, "Cannot remove status")),
        None => Ok(()),
    }
}

/// Validate a requested status transition against the workflow DAG and the
/// authorization settings in effect.
#[must_use]
pub fn validate_transition(req: &TransitionRequest<'_>) -> TransitionOutcome {
    use Status::{Signed, ToRefresh, ToReview, ToRollback, ToSign, WorkInProgress};

    match req.requested_status {
        Signed => reject(ErrorCode::WorkflowInvalidStatus, "Cannot set status to 'signed'"),

        ToReview => {
            if let Some(code_msg) = check_editors_group(req) {
                return code_msg;
            }
            accept(ToReview, vec![Effect::StampReviewRequested])
        }

        WorkInProgress => match req.current_status {
            Some(ToReview) => accept(WorkInProgress, vec![Effect::CancelReview]),
            _ => reject(
                ErrorCode::WorkflowInvalidStatus,
                "Cannot move to 'work-in-progress' from this status",
            ),
        },

        ToSign => validate_to_sign(req),

        ToRefresh => accept(Signed, vec![Effect::RefreshSignature]),

        ToRollback => accept(Signed, vec![Effect::RollbackAndSign]),
    }
}

fn check_editors_group(req: &TransitionRequest<'_>) -> Option<TransitionOutcome> {
    if !req.settings.group_check_enabled {
        return None;
    }
    let editors = req.settings.editors_group.as_deref()?;
    if req.caller.has_principal(editors) {
        None
    } else {
        Some(reject(ErrorCode::WorkflowNotInEditorsGroup, "Not in editors group"))
    }
}

fn check_reviewers_group(req: &TransitionRequest<'_>) -> Option<TransitionOutcome> {
    if !req.settings.group_check_enabled {
        return None;
    }
    let reviewers = req.settings.reviewers_group.as_deref()?;
    if req.caller.has_principal(reviewers) {
        None
    } else {
        Some(reject(
            ErrorCode::WorkflowNotInReviewersGroup,
            "Not in reviewers group",
        ))
    }
}

fn validate_to_sign(req: &TransitionRequest<'_>) -> TransitionOutcome {
    match req.current_status {
        // Refresh: collection is already signed, any authorized caller may re-sign.
        Some(Status::Signed) => accept(Status::Signed, vec![Effect::RefreshSignature]),

        Some(Status::ToReview) => {
            if req.settings.to_review_enabled
                && let Some(last) = req.last_review_request_by
                && req.caller.is(last)
            {
                return reject(ErrorCode::WorkflowEditorCannotReview, "Editor cannot review");
            }
            if let Some(outcome) = check_reviewers_group(req) {
                return outcome;
            }
            accept(Status::Signed, vec![Effect::MirrorAndSign])
        }

        _ => {
            if req.settings.to_review_enabled {
                reject(ErrorCode::WorkflowNotReviewed, "Collection not reviewed")
            } else {
                if let Some(outcome) = check_reviewers_group(req) {
                    return outcome;
                }
                accept(Status::Signed, vec![Effect::MirrorAndSign])
            }
        }
    }
}
