use ratings_store::StoreError;
use ratings_types::WalletAddress;
use ratings_wallet_core::WalletError;
use thiserror::Error;

/// Why a rating submission did not complete.
///
/// Benign duplicates are not errors; they surface as
/// [`SubmitOutcome::AlreadyVoted`](crate::SubmitOutcome::AlreadyVoted).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubmissionError {
    #[error("connect a wallet to rate services")]
    IdentityMissing,

    #[error("rating must be between 1 and 5 stars, got {0}")]
    InvalidRating(u8),

    /// The user declined or dismissed the signature prompt.
    #[error("signature request cancelled")]
    Cancelled,

    #[error("wallet error: {0}")]
    Wallet(WalletError),

    #[error("could not save your rating: {0}")]
    Store(#[from] StoreError),
}

impl SubmissionError {
    pub fn is_user_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Faults are store or wallet failures, as opposed to user decisions or
    /// blocked input.
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::Wallet(_) | Self::Store(_))
    }
}

impl From<WalletError> for SubmissionError {
    fn from(err: WalletError) -> Self {
        match err {
            WalletError::Rejected => Self::Cancelled,
            WalletError::NotConnected => Self::IdentityMissing,
            other => Self::Wallet(other),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CreateServiceError {
    #[error("{0} is required")]
    MissingField(&'static str),

    /// Carries the requester, or `None` when no wallet was connected.
    #[error("not authorized to add services")]
    Unauthorized(Option<WalletAddress>),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wallet_rejection_is_cancellation() {
        let err = SubmissionError::from(WalletError::Rejected);
        assert_eq!(err, SubmissionError::Cancelled);
        assert!(err.is_user_cancellation());
        assert!(!err.is_fault());
    }

    #[test]
    fn wallet_failure_is_fault() {
        let err = SubmissionError::from(WalletError::Signing("device unplugged".into()));
        assert!(err.is_fault());
        assert!(!err.is_user_cancellation());
    }
}
