use crate::{
    conflated::{ConflatedDistributor, Subscription},
    error::{CancelCause, Error},
    gate::CompletionGate,
};

/// A conflated broadcast whose current value can be awaited.
///
/// [`value`](Self::value) never returns before the first publish: it waits
/// until one happens or the broadcast is cancelled. Every publish resolves the
/// gate before the value reaches the distributor, so the first publish opens
/// the gate exactly once.
///
/// Share it between tasks behind an [`Arc`](std::sync::Arc).
#[derive(Debug)]
pub struct AwaitBroadcast<T> {
    gate: CompletionGate,
    distributor: ConflatedDistributor<T>,
}

impl<T> Default for AwaitBroadcast<T> {
    fn default() -> Self { Self::new() }
}

impl<T> AwaitBroadcast<T> {
    #[must_use]
    pub fn new() -> Self {
        Self { gate: CompletionGate::new(), distributor: ConflatedDistributor::new() }
    }

    /// Publishes `value` without suspending.
    ///
    /// Returns `false` if the broadcast has been cancelled; the value is
    /// dropped in that case.
    pub fn offer(&self, value: T) -> bool {
        self.open_gate();
        self.distributor.offer(value)
    }

    /// Publishes `value`, yielding to the scheduler before it becomes visible.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the broadcast is cancelled before the
    /// value is stored.
    pub async fn send(&self, value: T) -> Result<(), Error> {
        self.open_gate();
        self.distributor.send(value).await
    }

    /// Opens a stream subscription. It is not gated: a subscription created
    /// before the first publish simply waits for it.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> { self.distributor.subscribe() }

    /// Cancels the broadcast.
    ///
    /// Every task waiting in [`value`](Self::value), [`send`](Self::send) or on
    /// a subscription is released with the normalized cause before this
    /// returns. Only the first cancellation takes effect.
    pub fn cancel<C: Into<CancelCause>>(&self, cause: C) {
        let cancelled = cause.into().into_cancelled();
        let cause = cancelled.to_string();
        let distributor_cancelled = self.distributor.cancel(cancelled.clone());
        let gate_cancelled = self.gate.cancel(cancelled);
        if distributor_cancelled || gate_cancelled {
            tracing::debug!(has_value = self.has_value(), "broadcast cancelled: {cause}");
        } else {
            tracing::trace!("broadcast already cancelled, ignoring cause: {cause}");
        }
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.gate.is_cancelled() }

    /// Whether a value has ever been stored.
    ///
    /// A `send` that opened the gate but was cancelled or dropped before its
    /// value landed does not count.
    #[inline]
    #[must_use]
    pub fn has_value(&self) -> bool { self.distributor.has_value() }

    fn open_gate(&self) {
        if self.gate.resolve() {
            tracing::trace!("broadcast received its first publish");
        }
    }
}

impl<T: Clone> AwaitBroadcast<T> {
    /// Returns the latest value, waiting for the first publish if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the broadcast is cancelled, whether or
    /// not a value had been published.
    pub async fn value(&self) -> Result<T, Error> {
        self.gate.wait().await?;
        // the gate opens just before the first store lands
        self.distributor.current().await
    }

    /// The latest value without waiting; `None` before the first publish and
    /// after cancellation.
    #[must_use]
    pub fn try_value(&self) -> Option<T> {
        if self.gate.is_cancelled() {
            return None;
        }
        self.distributor.latest()
    }
}
