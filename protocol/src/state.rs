//! Rating submission states.

use std::fmt;

/// Where one widget's submission currently stands.
///
/// `Idle`, `Done` and `Failed` are resting states; every other state means a
/// submission is in flight and further attempts are ignored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SubmissionState {
    #[default]
    Idle,
    CheckingEligibility,
    AwaitingSignature,
    WritingReview,
    UpdatingAggregate,
    Done,
    Failed,
}

impl SubmissionState {
    pub fn is_in_flight(&self) -> bool {
        !matches!(self, Self::Idle | Self::Done | Self::Failed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::CheckingEligibility => "checking_eligibility",
            Self::AwaitingSignature => "awaiting_signature",
            Self::WritingReview => "writing_review",
            Self::UpdatingAggregate => "updating_aggregate",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for SubmissionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
