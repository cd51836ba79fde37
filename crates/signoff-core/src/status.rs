use serde::{Deserialize, Serialize};
use std::fmt;

/// A source collection's workflow status.
///
/// The "absent" state is represented as `Option<Status>` at the call sites
/// rather than as a variant here, so that "no status field" and "an invalid
/// status string" remain distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    /// Author is actively editing; not yet requested for review.
    WorkInProgress,
    /// Editor has requested review.
    ToReview,
    /// Reviewer approved; engine will sign on the next transition.
    ToSign,
    /// Re-sign the current destination without moving records (cert roll).
    ToRefresh,
    /// Discard pending source edits, reverting to the signed destination.
    ToRollback,
    /// Destination has been (re)signed; the terminal, engine-only state.
    Signed,
}

/// A `status` string was neither empty nor one of the recognized values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid status '{0}'")]
pub struct UnknownStatus(pub String);

impl Status {
    /// Stable wire representation, e.g. `"work-in-progress"`.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WorkInProgress => "work-in-progress",
            Self::ToReview => "to-review",
            Self::ToSign => "to-sign",
            Self::ToRefresh => "to-refresh",
            Self::ToRollback => "to-rollback",
            Self::Signed => "signed",
        }
    }

    /// Parse a status string.
    ///
    /// Accepts `"to-resign"` as an alias for `"to-refresh"`: older deployments
    /// used `to-resign`, newer ones use `to-refresh`. Both normalize to
    /// [`Status::ToRefresh`].
    pub fn parse(s: &str) -> Result<Self, UnknownStatus> {
        match s {
            "work-in-progress" => Ok(Self::WorkInProgress),
            "to-review" => Ok(Self::ToReview),
            "to-sign" => Ok(Self::ToSign),
            "to-refresh" | "to-resign" => Ok(Self::ToRefresh),
            "to-rollback" => Ok(Self::ToRollback),
            "signed" => Ok(Self::Signed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_str() {
        let all = [
            Status::WorkInProgress,
            Status::ToReview,
            Status::ToSign,
            Status::ToRefresh,
            Status::ToRollback,
            Status::Signed,
        ];
        for status in all {
            assert_eq!(Status::parse(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn to_resign_is_an_alias_for_to_refresh() {
        assert_eq!(Status::parse("to-resign").unwrap(), Status::ToRefresh);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let err = Status::parse("published").unwrap_err();
        assert_eq!(err.0, "published");
        assert_eq!(err.to_string(), "Invalid status 'published'");
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&Status::ToReview).unwrap();
        assert_eq!(json, "\"to-review\"");
        let back: Status = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Status::ToReview);
    }
}
