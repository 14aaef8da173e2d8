mod subscription;

use tokio::sync::watch;

pub use self::subscription::Subscription;
use crate::error::{Cancelled, Error};

/// Shared state behind a [`ConflatedDistributor`].
///
/// `version` counts accepted publishes, so a subscription can tell a new value
/// from the one it already consumed even when both are equal.
#[derive(Debug)]
struct Slot<T> {
    latest: Option<T>,
    version: u64,
    cancelled: Option<Cancelled>,
}

impl<T> Default for Slot<T> {
    fn default() -> Self { Self { latest: None, version: 0, cancelled: None } }
}

impl<T: Clone> Slot<T> {
    fn snapshot(&self) -> Option<Result<T, Cancelled>> {
        if let Some(cancelled) = &self.cancelled {
            return Some(Err(cancelled.clone()));
        }
        self.latest.clone().map(Ok)
    }

    fn newer_than(&self, seen: u64) -> Option<Result<(u64, T), Cancelled>> {
        if let Some(cancelled) = &self.cancelled {
            return Some(Err(cancelled.clone()));
        }
        match &self.latest {
            Some(value) if self.version != seen => Some(Ok((self.version, value.clone()))),
            _ => None,
        }
    }
}

/// Holds the latest published value and hands out conflating subscriptions.
#[derive(Debug)]
pub struct ConflatedDistributor<T> {
    slot: watch::Sender<Slot<T>>,
}

impl<T> Default for ConflatedDistributor<T> {
    fn default() -> Self { Self::new() }
}

impl<T> ConflatedDistributor<T> {
    #[must_use]
    pub fn new() -> Self {
        let (slot, _) = watch::channel(Slot::default());
        Self { slot }
    }

    /// Replaces the latest value without suspending.
    ///
    /// Returns `false` if the distributor has been cancelled.
    pub fn offer(&self, value: T) -> bool { self.store(value).is_ok() }

    /// Replaces the latest value after yielding to the scheduler once.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the distributor is cancelled by the time
    /// the value would be stored.
    pub async fn send(&self, value: T) -> Result<(), Error> {
        tokio::task::yield_now().await;
        self.store(value).map_err(|source| Error::Cancelled { source })
    }

    /// Cancels the distributor: live subscriptions surface `cause` and later
    /// publishes are rejected. Returns `false` if it was already cancelled.
    pub fn cancel(&self, cause: Cancelled) -> bool {
        let subscribers = self.slot.receiver_count();
        self.slot.send_if_modified(move |slot| {
            if slot.cancelled.is_some() {
                return false;
            }
            tracing::debug!(subscribers, "conflated distributor cancelled: {cause}");
            slot.cancelled = Some(cause);
            true
        })
    }

    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool { self.slot.borrow().cancelled.is_some() }

    /// Whether a publish has ever been accepted.
    #[inline]
    #[must_use]
    pub fn has_value(&self) -> bool { self.slot.borrow().version > 0 }

    /// Opens a subscription that observes publishes made from now on.
    #[must_use]
    pub fn subscribe(&self) -> Subscription<T> {
        let receiver = self.slot.subscribe();
        let seen = receiver.borrow().version;
        Subscription::new(receiver, seen)
    }

    fn store(&self, value: T) -> Result<(), Cancelled> {
        let mut rejected = None;
        let accepted = self.slot.send_if_modified(|slot| {
            if let Some(cancelled) = &slot.cancelled {
                rejected = Some(cancelled.clone());
                return false;
            }
            slot.latest = Some(value);
            slot.version += 1;
            true
        });
        tracing::trace!(accepted, "conflated distributor publish");
        rejected.map_or(Ok(()), Err)
    }
}

impl<T: Clone> ConflatedDistributor<T> {
    /// The latest value, or `None` if nothing was published or the distributor
    /// has been cancelled.
    #[must_use]
    pub fn latest(&self) -> Option<T> { self.slot.borrow().snapshot().and_then(Result::ok) }

    /// Waits until a value is present and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the distributor is cancelled before a
    /// value is observed.
    pub async fn current(&self) -> Result<T, Error> {
        observe(&mut self.slot.subscribe(), Slot::snapshot).await
    }
}

/// Waits on `receiver` until `pick` yields something, then returns it.
async fn observe<T, R, F>(receiver: &mut watch::Receiver<Slot<T>>, mut pick: F) -> Result<R, Error>
where
    F: FnMut(&Slot<T>) -> Option<Result<R, Cancelled>>,
{
    let mut picked = None;
    let ready = receiver.wait_for(|slot| {
        picked = pick(slot);
        picked.is_some()
    });
    if ready.await.is_err() {
        return Err(Error::Closed);
    }
    match picked {
        Some(Ok(value)) => Ok(value),
        Some(Err(source)) => Err(Error::Cancelled { source }),
        None => Err(Error::Closed),
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use futures::FutureExt;

    use super::*;

    #[test]
    fn latest_wins() {
        let distributor = ConflatedDistributor::new();
        assert_eq!(distributor.latest(), None);

        for value in [1, 2, 3] {
            assert!(distributor.offer(value));
        }
        assert_eq!(distributor.latest(), Some(3));
        assert!(matches!(distributor.current().now_or_never(), Some(Ok(3))));
    }

    #[test]
    fn offer_after_cancel_is_rejected() {
        let distributor = ConflatedDistributor::new();
        assert!(distributor.offer("first"));
        assert!(distributor.cancel(Cancelled::Requested));
        assert!(!distributor.cancel(Cancelled::Requested));

        assert!(!distributor.offer("second"));
        assert!(distributor.is_cancelled());
        assert_eq!(distributor.latest(), None);
    }

    #[tokio::test]
    async fn send_stores_value() {
        let distributor = ConflatedDistributor::new();
        distributor.send(7_u32).await.expect("open distributor accepts values");
        assert_eq!(distributor.latest(), Some(7));
    }

    #[tokio::test]
    async fn send_after_cancel_fails() {
        let distributor = ConflatedDistributor::new();
        assert!(distributor.cancel(Cancelled::with_message("closed")));

        let err = distributor.send(7_u32).await.expect_err("cancelled distributor rejects sends");
        assert_eq!(err.cancellation().and_then(Cancelled::message), Some("closed"));
    }

    #[tokio::test]
    async fn send_cancelled_while_suspended_fails() {
        let distributor = Arc::new(ConflatedDistributor::new());
        let sender = {
            let distributor = distributor.clone();
            tokio::spawn(async move { distributor.send(1_u8).await })
        };

        // `send` yields before storing, and the spawned task has not been polled yet
        assert!(distributor.cancel(Cancelled::Requested));
        let result = tokio::time::timeout(Duration::from_secs(1), sender).await;
        assert!(matches!(result, Ok(Ok(Err(Error::Cancelled { .. })))));
        assert_eq!(distributor.latest(), None);
    }

    #[test]
    fn has_value_counts_accepted_publishes_only() {
        let distributor = ConflatedDistributor::new();
        assert!(!distributor.has_value());

        assert!(distributor.cancel(Cancelled::Requested));
        assert!(!distributor.offer(1));
        assert!(!distributor.has_value());

        let distributor = ConflatedDistributor::new();
        assert!(distributor.offer(1));
        assert!(distributor.cancel(Cancelled::Requested));
        assert!(distributor.has_value());
    }

    #[test]
    fn subscription_baseline_matches_its_receiver() {
        let distributor = ConflatedDistributor::new();
        assert!(distributor.offer(1));
        assert!(distributor.offer(2));

        let mut subscription = distributor.subscribe();
        assert!(subscription.recv().now_or_never().is_none());

        assert!(distributor.offer(3));
        assert!(matches!(subscription.recv().now_or_never(), Some(Ok(3))));
    }

    #[test]
    fn current_waits_for_first_value() {
        let distributor = ConflatedDistributor::new();
        let mut current = Box::pin(distributor.current());
        assert!((&mut current).now_or_never().is_none());

        assert!(distributor.offer('a'));
        assert!(matches!(current.now_or_never(), Some(Ok('a'))));
    }
}
