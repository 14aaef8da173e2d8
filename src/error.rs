use std::sync::Arc;

use snafu::Snafu;

/// A failure shared between every waiter and stream released by one cancellation.
pub type SharedFailure = Arc<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Clone, Debug, Snafu)]
pub enum Error {
    #[snafu(display("Broadcast was cancelled, error: {}", source))]
    Cancelled { source: Cancelled },

    #[snafu(display("Broadcast was closed"))]
    Closed,
}

impl Error {
    /// The cancellation cause, if this error is a cancellation.
    #[must_use]
    pub const fn cancellation(&self) -> Option<&Cancelled> {
        match self {
            Self::Cancelled { source } => Some(source),
            Self::Closed => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_cancelled(&self) -> bool { matches!(self, Self::Cancelled { .. }) }
}

impl From<Cancelled> for Error {
    fn from(source: Cancelled) -> Self { Self::Cancelled { source } }
}

/// The cause carried by a cancellation to everything it releases.
#[derive(Clone, Debug, Snafu)]
pub enum Cancelled {
    #[snafu(display("cancellation requested"))]
    Requested,

    #[snafu(display("{}", message))]
    Message { message: String },

    #[snafu(display("cancelled by failure, error: {}", source))]
    Failure { source: SharedFailure },
}

impl Cancelled {
    #[inline]
    pub fn with_message<S: Into<String>>(message: S) -> Self {
        Self::Message { message: message.into() }
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Message { message } => Some(message),
            Self::Requested | Self::Failure { .. } => None,
        }
    }
}

/// What a caller may hand to `cancel`.
///
/// Only [`Cancelled`] travels past the cancel call: every other cause is folded
/// into one by [`CancelCause::into_cancelled`].
#[derive(Clone, Debug, Default)]
pub enum CancelCause {
    #[default]
    Unspecified,
    Cancelled(Cancelled),
    Failure(SharedFailure),
}

impl CancelCause {
    #[inline]
    pub fn failure<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::Failure(Arc::new(error))
    }

    /// Normalizes the cause, wrapping it unless it already is a cancellation.
    #[must_use]
    pub fn into_cancelled(self) -> Cancelled {
        match self {
            Self::Unspecified => Cancelled::Requested,
            Self::Cancelled(cancelled) => cancelled,
            Self::Failure(source) => match source.downcast_ref::<Cancelled>() {
                Some(cancelled) => cancelled.clone(),
                None => match source.downcast_ref::<Error>() {
                    Some(Error::Cancelled { source: cancelled }) => cancelled.clone(),
                    _ => Cancelled::Failure { source },
                },
            },
        }
    }
}

impl From<Cancelled> for CancelCause {
    fn from(cancelled: Cancelled) -> Self { Self::Cancelled(cancelled) }
}

impl From<Option<Cancelled>> for CancelCause {
    fn from(cancelled: Option<Cancelled>) -> Self {
        cancelled.map_or(Self::Unspecified, Self::Cancelled)
    }
}

impl From<SharedFailure> for CancelCause {
    fn from(failure: SharedFailure) -> Self { Self::Failure(failure) }
}
