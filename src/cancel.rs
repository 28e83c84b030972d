//! Cooperative cancellation for in-flight resize requests.
//!
//! A [`CancelToken`] is created per request and shared with every job of
//! that request. It trips either explicitly ([`CancelToken::cancel`]) or when
//! its optional deadline passes. Workers check it before starting a job; a
//! job that has started always finishes and keeps its result.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// A token that only trips when cancelled explicitly.
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that also trips once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            flag: Arc::default(),
            deadline: Instant::now().checked_add(timeout),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Cancel this token when the returned guard is dropped, unless disarmed.
    ///
    /// Held across an `.await` by a request handler: if the handler future is
    /// dropped (client went away), the guard cancels the remaining jobs.
    pub fn cancel_on_drop(self) -> CancelOnDrop {
        CancelOnDrop { token: Some(self) }
    }
}

#[derive(Debug)]
pub struct CancelOnDrop {
    token: Option<CancelToken>,
}

impl CancelOnDrop {
    pub fn disarm(mut self) {
        self.token = None;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            token.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_token_is_live() {
        assert!(!CancelToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_through_clones() {
        let token = CancelToken::new();
        let worker_view = token.clone();
        token.cancel();
        assert!(worker_view.is_cancelled());
    }

    #[test]
    fn deadline_trips_token() {
        let token = CancelToken::with_timeout(Duration::ZERO);
        assert!(token.is_cancelled());

        let token = CancelToken::with_timeout(Duration::from_secs(3600));
        assert!(!token.is_cancelled());
    }

    #[test]
    fn dropped_guard_cancels() {
        let token = CancelToken::new();
        drop(token.clone().cancel_on_drop());
        assert!(token.is_cancelled());
    }

    #[test]
    fn disarmed_guard_leaves_token_live() {
        let token = CancelToken::new();
        token.clone().cancel_on_drop().disarm();
        assert!(!token.is_cancelled());
    }
}
