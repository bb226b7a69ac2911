//! List refresh callback.

/// Invoked after a vote is recorded so the displayed list can be re-fetched.
pub trait ListRefresh: Send + Sync {
    fn refresh(&self);
}

impl<F> ListRefresh for F
where
    F: Fn() + Send + Sync,
{
    fn refresh(&self) {
        self()
    }
}

/// A refresh callback that does nothing.
pub struct NoRefresh;

impl ListRefresh for NoRefresh {
    fn refresh(&self) {}
}
