use futures::Stream;
use tokio::sync::watch;

use super::{Slot, observe};
use crate::error::Error;

/// An independent view on a [`ConflatedDistributor`](super::ConflatedDistributor).
///
/// Each read returns the latest value published since the previous read;
/// values published in between are skipped.
#[derive(Debug)]
pub struct Subscription<T> {
    receiver: watch::Receiver<Slot<T>>,
    seen: u64,
}

impl<T> Subscription<T> {
    pub(super) const fn new(receiver: watch::Receiver<Slot<T>>, seen: u64) -> Self {
        Self { receiver, seen }
    }
}

impl<T: Clone> Subscription<T> {
    /// Waits for a value newer than the last one this subscription returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] once the distributor is cancelled, and
    /// [`Error::Closed`] once it is dropped.
    pub async fn recv(&mut self) -> Result<T, Error> {
        let seen = self.seen;
        let (version, value) = observe(&mut self.receiver, |slot| slot.newer_than(seen)).await?;
        self.seen = version;
        Ok(value)
    }

    /// Turns the subscription into a stream.
    ///
    /// A cancellation is yielded once as an error, then the stream ends. A
    /// dropped distributor ends the stream without an error.
    pub fn into_stream(self) -> impl Stream<Item = Result<T, Error>> {
        futures::stream::unfold(Some(self), |subscription| async move {
            let mut subscription = subscription?;
            match subscription.recv().await {
                Ok(value) => Some((Ok(value), Some(subscription))),
                Err(Error::Closed) => None,
                Err(err) => Some((Err(err), None)),
            }
        })
    }
}
