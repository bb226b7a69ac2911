//! Rating submission state machine, one per listed service.
//!
//! ```text
//! idle -> checking_eligibility -> awaiting_signature -> writing_review
//!      -> updating_aggregate -> done
//! ```
//!
//! Any step may land on `failed` instead. An existing review, found either
//! by the pre-check or through the store's uniqueness constraint, ends in
//! `done` with the stored rating adopted.
//!
//! The widget's mutex guards only its own state and is never held across an
//! `.await`, so a widget waiting on a signature does not block other
//! widgets, and a second submit on the same widget sees the in-flight state
//! and backs off.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use ratings_store::{NewReview, RatingStore, Review};
use ratings_types::{Rating, ServiceId, WalletAddress};
use ratings_wallet_core::WalletProvider;

use crate::aggregate::{apply_vote, AggregatePolicy};
use crate::eligibility::{check_eligibility, Eligibility};
use crate::message::canonical_message;
use crate::refresh::ListRefresh;
use crate::state::SubmissionState;
use crate::SubmissionError;

/// How a submit call ended, short of an error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new review was stored and the aggregate updated.
    Recorded(Review),
    /// The store already held a review from this voter. Its rating is
    /// adopted as the user's rating.
    AlreadyVoted(Rating),
    /// Nothing was attempted.
    Ignored(IgnoreReason),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another submission on this widget has not finished yet.
    InFlight,
    /// This widget already knows the voter's rating.
    AlreadyVoted(Rating),
}

#[derive(Debug, Default)]
struct WidgetState {
    state: SubmissionState,
    /// Last known vote, keyed to the voter it belongs to.
    known_vote: Option<(WalletAddress, Rating)>,
}

/// Drives rating submissions for one service.
pub struct RatingWidget<S: ?Sized, W: ?Sized> {
    service_id: ServiceId,
    store: Arc<S>,
    wallet: Arc<W>,
    refresh: Arc<dyn ListRefresh>,
    policy: AggregatePolicy,
    inner: Mutex<WidgetState>,
}

impl<S, W> RatingWidget<S, W>
where
    S: RatingStore + ?Sized,
    W: WalletProvider + ?Sized,
{
    pub fn new(
        service_id: ServiceId,
        store: Arc<S>,
        wallet: Arc<W>,
        refresh: Arc<dyn ListRefresh>,
        policy: AggregatePolicy,
    ) -> Self {
        Self {
            service_id,
            store,
            wallet,
            refresh,
            policy,
            inner: Mutex::new(WidgetState::default()),
        }
    }

    pub fn service_id(&self) -> ServiceId {
        self.service_id
    }

    pub fn state(&self) -> SubmissionState {
        self.lock().state
    }

    /// The connected voter's rating for this service, if this widget has
    /// seen one.
    pub fn user_rating(&self) -> Option<Rating> {
        let voter = self.wallet.current_address()?;
        match &self.lock().known_vote {
            Some((known, rating)) if *known == voter => Some(*rating),
            _ => None,
        }
    }

    /// Run the eligibility check for the connected voter and remember an
    /// existing vote. Call when the service comes into view.
    pub fn load(&self) -> Result<Eligibility, SubmissionError> {
        let voter = self.wallet.current_address();
        let eligibility = check_eligibility(&*self.store, self.service_id, voter.as_ref())?;
        if let (Some(voter), Eligibility::AlreadyVoted(rating)) = (voter, eligibility) {
            self.lock().known_vote = Some((voter, rating));
        }
        Ok(eligibility)
    }

    /// Submit a rating of `stars` for this service on behalf of the
    /// connected voter.
    ///
    /// Blocked input (no wallet, out-of-range stars) is rejected before any
    /// state change. Store and wallet failures, and the user declining to
    /// sign, leave the widget in [`SubmissionState::Failed`] ready for a
    /// fresh attempt.
    pub async fn submit(&self, stars: u8) -> Result<SubmitOutcome, SubmissionError> {
        let rating = Rating::new(stars).map_err(|_| SubmissionError::InvalidRating(stars))?;
        let voter = self
            .wallet
            .current_address()
            .ok_or(SubmissionError::IdentityMissing)?;

        let attempt = match self.begin(&voter) {
            Ok(attempt) => attempt,
            Err(reason) => {
                tracing::debug!(service_id = %self.service_id, ?reason, "submission ignored");
                return Ok(SubmitOutcome::Ignored(reason));
            }
        };

        // Re-checked against the store: another tab may have voted since load.
        match check_eligibility(&*self.store, self.service_id, Some(&voter)) {
            Ok(Eligibility::AlreadyVoted(existing)) => {
                return Ok(attempt.already_voted(voter, existing));
            }
            Ok(_) => {}
            Err(e) => return Err(attempt.fail(e.into())),
        }

        attempt.advance(SubmissionState::AwaitingSignature);
        let message = canonical_message(self.service_id, rating);
        let signature = match self.wallet.sign_message(&message).await {
            Ok(signature) => signature,
            Err(e) => return Err(attempt.fail(e.into())),
        };

        attempt.advance(SubmissionState::WritingReview);
        let new_review = NewReview {
            service_id: self.service_id,
            voter: voter.clone(),
            rating,
            signature,
        };
        let review = match self.store.insert_review(&new_review) {
            Ok(review) => review,
            Err(e) if e.is_unique_violation() => {
                // Lost a race with another session for the same voter.
                return match self.store.find_review(self.service_id, &voter) {
                    Ok(Some(existing)) => Ok(attempt.already_voted(voter, existing.rating)),
                    Ok(None) => Err(attempt.fail(e.into())),
                    Err(lookup) => Err(attempt.fail(lookup.into())),
                };
            }
            Err(e) => return Err(attempt.fail(e.into())),
        };

        attempt.advance(SubmissionState::UpdatingAggregate);
        let aggregate = match apply_vote(&*self.store, self.service_id, rating, self.policy) {
            Ok(aggregate) => aggregate,
            Err(e) => return Err(attempt.fail(e.into())),
        };

        attempt.finish(SubmissionState::Done, Some((voter, rating)));
        tracing::info!(
            service_id = %self.service_id,
            voter = %review.voter,
            rating = %rating,
            rating_sum = aggregate.rating_sum,
            rating_count = aggregate.rating_count,
            "vote recorded"
        );
        self.refresh.refresh();
        Ok(SubmitOutcome::Recorded(review))
    }

    fn begin(&self, voter: &WalletAddress) -> Result<Attempt<'_>, IgnoreReason> {
        let mut inner = self.lock();
        if inner.state.is_in_flight() {
            return Err(IgnoreReason::InFlight);
        }
        if let Some((known, rating)) = &inner.known_vote {
            if known == voter {
                return Err(IgnoreReason::AlreadyVoted(*rating));
            }
        }
        inner.state = SubmissionState::CheckingEligibility;
        drop(inner);
        log_transition(self.service_id, SubmissionState::CheckingEligibility);
        Ok(Attempt {
            service_id: self.service_id,
            inner: &self.inner,
            settled: false,
        })
    }

    fn lock(&self) -> MutexGuard<'_, WidgetState> {
        lock(&self.inner)
    }
}

fn lock(inner: &Mutex<WidgetState>) -> MutexGuard<'_, WidgetState> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

fn log_transition(service_id: ServiceId, state: SubmissionState) {
    tracing::debug!(%service_id, %state, "submission state");
}

/// One in-flight submission. Dropping it unsettled marks the widget
/// `Failed`, so no exit path leaves the widget locked.
struct Attempt<'a> {
    service_id: ServiceId,
    inner: &'a Mutex<WidgetState>,
    settled: bool,
}

impl Attempt<'_> {
    fn advance(&self, state: SubmissionState) {
        lock(self.inner).state = state;
        log_transition(self.service_id, state);
    }

    fn finish(mut self, state: SubmissionState, vote: Option<(WalletAddress, Rating)>) {
        {
            let mut inner = lock(self.inner);
            inner.state = state;
            if vote.is_some() {
                inner.known_vote = vote;
            }
        }
        self.settled = true;
        log_transition(self.service_id, state);
    }

    fn already_voted(self, voter: WalletAddress, rating: Rating) -> SubmitOutcome {
        tracing::info!(
            service_id = %self.service_id,
            %voter,
            rating = %rating,
            "voter has already rated this service"
        );
        self.finish(SubmissionState::Done, Some((voter, rating)));
        SubmitOutcome::AlreadyVoted(rating)
    }

    fn fail(self, error: SubmissionError) -> SubmissionError {
        if error.is_user_cancellation() {
            tracing::info!(service_id = %self.service_id, "signature request cancelled by user");
        } else {
            tracing::warn!(service_id = %self.service_id, %error, "rating submission failed");
        }
        self.finish(SubmissionState::Failed, None);
        error
    }
}

impl Drop for Attempt<'_> {
    fn drop(&mut self) {
        if !self.settled {
            lock(self.inner).state = SubmissionState::Failed;
            log_transition(self.service_id, SubmissionState::Failed);
        }
    }
}

