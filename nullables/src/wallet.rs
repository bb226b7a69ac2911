//! Nullable wallet: scripted signature responses.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use ratings_types::{Signature, WalletAddress};
use ratings_wallet_core::{WalletError, WalletProvider};
use tokio::sync::watch;

/// How the next signature requests are answered.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignResponse {
    Approve,
    /// The user declines the prompt.
    Reject,
    /// The wallet fails for a reason other than the user.
    Fail(String),
}

/// A wallet whose account and answers are set by the test.
///
/// Approved signatures echo the message bytes, so a stored signature shows
/// exactly which message was signed. While [`NullWallet::hold`] is in
/// effect, sign requests are recorded but wait until
/// [`NullWallet::release`] before answering.
pub struct NullWallet {
    address: Mutex<Option<WalletAddress>>,
    response: Mutex<SignResponse>,
    requests: Mutex<Vec<String>>,
    seen: watch::Sender<usize>,
    held: watch::Sender<bool>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl NullWallet {
    pub fn connected(address: WalletAddress) -> Self {
        Self::with_address(Some(address))
    }

    pub fn disconnected() -> Self {
        Self::with_address(None)
    }

    fn with_address(address: Option<WalletAddress>) -> Self {
        Self {
            address: Mutex::new(address),
            response: Mutex::new(SignResponse::Approve),
            requests: Mutex::new(Vec::new()),
            seen: watch::Sender::new(0),
            held: watch::Sender::new(false),
        }
    }

    pub fn set_address(&self, address: Option<WalletAddress>) {
        *lock(&self.address) = address;
    }

    pub fn respond_with(&self, response: SignResponse) {
        *lock(&self.response) = response;
    }

    /// Park subsequent sign requests until [`NullWallet::release`].
    pub fn hold(&self) {
        self.held.send_replace(true);
    }

    pub fn release(&self) {
        self.held.send_replace(false);
    }

    /// Every message this wallet was asked to sign, in order.
    pub fn sign_requests(&self) -> Vec<String> {
        lock(&self.requests).clone()
    }

    /// Wait until at least `count` sign requests have arrived.
    pub async fn wait_for_requests(&self, count: usize) {
        let mut rx = self.seen.subscribe();
        // The sender lives as long as `self`, so this cannot fail.
        let _ = rx.wait_for(|seen| *seen >= count).await;
    }
}

#[async_trait]
impl WalletProvider for NullWallet {
    fn current_address(&self) -> Option<WalletAddress> {
        lock(&self.address).clone()
    }

    async fn sign_message(&self, message: &str) -> Result<Signature, WalletError> {
        if self.current_address().is_none() {
            return Err(WalletError::NotConnected);
        }
        let mut held = self.held.subscribe();
        lock(&self.requests).push(message.to_string());
        self.seen.send_modify(|n| *n += 1);

        let _ = held.wait_for(|held| !*held).await;

        match lock(&self.response).clone() {
            SignResponse::Approve => Ok(Signature(message.as_bytes().to_vec())),
            SignResponse::Reject => Err(WalletError::Rejected),
            SignResponse::Fail(reason) => Err(WalletError::Signing(reason)),
        }
    }
}
