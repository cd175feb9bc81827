//! Cancellation plumbing between the UI layer and the runner.
//!
//! The runner depends only on a plain polled predicate; it never learns
//! about buttons, dialogs or batch state. [`CancelToken`] is the explicit
//! token collaborators share instead of a global "cancelled" flag;
//! [`CancelWatch`] bundles the predicate with the optional progress
//! callback and the poll interval for one execution call.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Interval at which the runner re-evaluates "is the child still running";
/// the cancel predicate is checked five times within each interval.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cloneable cancellation token. Cancellation is level-triggered and
/// final: once set, every clone observes it and nothing resets it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Idempotent.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Cancellation bridge for one [`run_cancellable`](crate::run_cancellable)
/// call: the cancel predicate, an optional progress callback invoked once
/// per poll tick, and the poll interval. The runner only reads it.
pub struct CancelWatch<'a> {
    cancel: Box<dyn Fn() -> bool + Send + Sync + 'a>,
    progress: Option<Box<dyn Fn() + Send + Sync + 'a>>,
    poll_interval: Duration,
}

impl<'a> CancelWatch<'a> {
    pub fn new(cancel: impl Fn() -> bool + Send + Sync + 'a) -> Self {
        Self {
            cancel: Box::new(cancel),
            progress: None,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    /// Watch a [`CancelToken`] directly.
    pub fn from_token(token: &CancelToken) -> CancelWatch<'static> {
        let token = token.clone();
        CancelWatch::new(move || token.is_cancelled())
    }

    /// Invoke `progress` once per poll tick while the child runs. Must not
    /// block for longer than the poll granularity.
    pub fn with_progress(mut self, progress: impl Fn() + Send + Sync + 'a) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        (self.cancel)()
    }

    pub(crate) fn tick_progress(&self) {
        if let Some(progress) = &self.progress {
            progress();
        }
    }

    pub(crate) fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_shared_across_clones() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn cancel_is_idempotent_and_final() {
        let token = CancelToken::new();
        token.cancel();
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn watch_reads_token_level() {
        let token = CancelToken::new();
        let watch = CancelWatch::from_token(&token);
        assert!(!watch.is_cancelled());
        token.cancel();
        assert!(watch.is_cancelled());
    }

    #[test]
    fn watch_defaults_and_overrides() {
        let watch = CancelWatch::new(|| false);
        assert_eq!(watch.poll_interval(), DEFAULT_POLL_INTERVAL);

        let watch = watch.with_poll_interval(Duration::from_millis(10));
        assert_eq!(watch.poll_interval(), Duration::from_millis(10));
    }
}
