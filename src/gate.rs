use tokio::sync::watch;

use crate::error::{Cancelled, Error};

#[derive(Clone, Debug, Default)]
struct GateState {
    resolved: bool,
    cancelled: Option<Cancelled>,
}

impl GateState {
    #[inline]
    const fn is_settled(&self) -> bool { self.resolved || self.cancelled.is_some() }
}

/// One-shot readiness signal.
///
/// Resolution and cancellation are tracked independently: a resolved gate can
/// still be cancelled, and once cancelled every wait fails with the cause.
#[derive(Debug)]
pub struct CompletionGate {
    state: watch::Sender<GateState>,
}

impl Default for CompletionGate {
    fn default() -> Self { Self::new() }
}

impl CompletionGate {
    #[must_use]
    pub fn new() -> Self {
        let (state, _) = watch::channel(GateState::default());
        Self { state }
    }

    /// Resolves the gate and releases every waiter.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub fn resolve(&self) -> bool {
        let resolved = self.state.send_if_modified(|state| {
            if state.is_settled() {
                return false;
            }
            state.resolved = true;
            true
        });
        if resolved {
            tracing::debug!("completion gate resolved");
        }
        resolved
    }

    /// Cancels the gate, failing current and future waiters with `cause`.
    ///
    /// The first cause wins; returns `false` if the gate was already cancelled.
    pub fn cancel(&self, cause: Cancelled) -> bool {
        self.state.send_if_modified(move |state| {
            if state.cancelled.is_some() {
                return false;
            }
            tracing::debug!(resolved = state.resolved, "completion gate cancelled: {cause}");
            state.cancelled = Some(cause);
            true
        })
    }

    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool { self.state.borrow().resolved }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.state.borrow().cancelled.is_some() }

    /// Waits until the gate is resolved.
    ///
    /// Returns immediately if it already is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the gate is cancelled before or while
    /// waiting, even if it had been resolved.
    pub async fn wait(&self) -> Result<(), Error> {
        let mut receiver = self.state.subscribe();
        let mut cancelled = None;
        let settled = receiver.wait_for(|state| {
            cancelled.clone_from(&state.cancelled);
            state.is_settled()
        });
        if settled.await.is_err() {
            return Err(Error::Closed);
        }
        cancelled.map_or(Ok(()), |source| Err(Error::Cancelled { source }))
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use futures::FutureExt;

    use super::*;

    #[test]
    fn resolve_is_idempotent() {
        let gate = CompletionGate::new();
        assert!(!gate.is_resolved());
        assert!(gate.resolve());
        assert!(!gate.resolve());
        assert!(!gate.resolve());
        assert!(gate.is_resolved());
    }

    #[test]
    fn wait_on_resolved_gate_does_not_suspend() {
        let gate = CompletionGate::new();
        assert!(gate.wait().now_or_never().is_none());

        assert!(gate.resolve());
        assert!(matches!(gate.wait().now_or_never(), Some(Ok(()))));
    }

    #[tokio::test]
    async fn resolve_releases_all_waiters() {
        let gate = Arc::new(CompletionGate::new());
        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let gate = gate.clone();
                tokio::spawn(async move { gate.wait().await })
            })
            .collect();

        tokio::task::yield_now().await;
        assert!(gate.resolve());

        for waiter in waiters {
            let result = tokio::time::timeout(Duration::from_secs(1), waiter).await;
            assert!(matches!(result, Ok(Ok(Ok(())))));
        }
    }

    #[tokio::test]
    async fn cancel_releases_waiters_with_cause() {
        let gate = Arc::new(CompletionGate::new());
        let waiter = {
            let gate = gate.clone();
            tokio::spawn(async move { gate.wait().await })
        };

        tokio::task::yield_now().await;
        assert!(gate.cancel(Cancelled::with_message("closed")));

        let err = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter must not hang")
            .expect("waiter must not panic")
            .expect_err("waiter must fail");
        assert_eq!(err.cancellation().and_then(Cancelled::message), Some("closed"));
    }

    #[test]
    fn cancellation_overrides_resolution() {
        let gate = CompletionGate::new();
        assert!(gate.resolve());
        assert!(gate.cancel(Cancelled::Requested));
        assert!(gate.is_resolved());
        assert!(gate.is_cancelled());

        let err = gate.wait().now_or_never().expect("cancelled gate must not suspend");
        assert!(matches!(err, Err(Error::Cancelled { source: Cancelled::Requested })));
    }

    #[test]
    fn first_cancel_wins() {
        let gate = CompletionGate::new();
        assert!(gate.cancel(Cancelled::with_message("first")));
        assert!(!gate.cancel(Cancelled::with_message("second")));
        assert!(!gate.resolve());
        assert!(!gate.is_resolved());

        let err = gate.wait().now_or_never().and_then(Result::err).expect("must fail");
        assert_eq!(err.cancellation().and_then(Cancelled::message), Some("first"));
    }
}
