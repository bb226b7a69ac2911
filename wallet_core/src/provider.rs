//! The wallet contract consumed by the rating flow.

use async_trait::async_trait;
use ratings_types::{Signature, WalletAddress};

use crate::WalletError;

/// Supplies the connected account and signs messages on demand.
///
/// Implementations are shared across rating widgets, so they must be
/// `Send + Sync`. Signing may wait indefinitely for the user.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// The connected, normalized address, or `None` when no wallet is connected.
    fn current_address(&self) -> Option<WalletAddress>;

    /// Ask the user to sign `message`.
    ///
    /// Returns [`WalletError::Rejected`] when the user declines or dismisses
    /// the request.
    async fn sign_message(&self, message: &str) -> Result<Signature, WalletError>;
}

/// Decides whether a signature request goes ahead.
#[async_trait]
pub trait ApprovalGate: Send + Sync {
    async fn approve(&self, message: &str) -> bool;
}

/// Approves every request. For non-interactive use.
pub struct AutoApprove;

#[async_trait]
impl ApprovalGate for AutoApprove {
    async fn approve(&self, _message: &str) -> bool {
        true
    }
}
