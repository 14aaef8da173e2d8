pub mod broadcast;
pub mod conflated;
pub mod error;
pub mod gate;
pub mod parameter;

pub use self::{
    broadcast::AwaitBroadcast,
    conflated::{ConflatedDistributor, Subscription},
    error::{CancelCause, Cancelled, Error},
    gate::CompletionGate,
};
