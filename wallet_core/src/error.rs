use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WalletError {
    #[error("no wallet connected")]
    NotConnected,

    /// The user declined or dismissed the signature request.
    #[error("signature request rejected by user")]
    Rejected,

    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("key error: {0}")]
    Key(String),

    #[error("signing error: {0}")]
    Signing(String),

    #[error("{0}")]
    Other(String),
}

impl WalletError {
    /// Whether this error is the user saying no rather than a fault.
    pub fn is_user_cancellation(&self) -> bool {
        matches!(self, Self::Rejected)
    }
}
