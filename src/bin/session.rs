use std::{fmt, sync::Arc, time::Duration};

use awaitcast::{
    AwaitBroadcast, Cancelled, Error as BroadcastError, Subscription,
    parameter::{CameraParameters, FpsRange},
};
use futures::StreamExt;
use serde::Serialize;
use snafu::ResultExt;

use crate::{
    config::{Config, Subscriber},
    error::{self, Error},
    signal_handler,
};

const MAX_ZOOM_LEVEL: f32 = 4.0;

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Termination {
    Cancelled { cause: String },
    Closed,
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancelled { cause } => write!(f, "cancelled ({cause})"),
            Self::Closed => f.write_str("closed"),
        }
    }
}

impl From<BroadcastError> for Termination {
    fn from(err: BroadcastError) -> Self {
        match err {
            BroadcastError::Cancelled { source } => Self::Cancelled { cause: source.to_string() },
            BroadcastError::Closed => Self::Closed,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct SubscriberReport {
    pub name: String,
    pub processing_delay_ms: u64,
    pub received: u64,
    pub last_frame: Option<u64>,
    pub ended: Termination,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionReport {
    pub fps_range: FpsRange,
    pub published: u64,
    pub first_value_frame: Option<u64>,
    pub interrupted: bool,
    pub subscribers: Vec<SubscriberReport>,
}

/// Runs a simulated camera session and reports what each observer saw.
pub async fn run(config: Config) -> Result<SessionReport, Error> {
    let fps_range = config.preview_fps_range()?;
    let interval = config.publish_interval()?;
    tracing::info!("Starting camera session with FPS range {fps_range}");

    let parameters = Arc::new(AwaitBroadcast::new());

    let first_value = {
        let parameters = parameters.clone();
        tokio::spawn(async move { parameters.value().await })
    };

    let consumers: Vec<_> = config
        .subscribers
        .iter()
        .map(|subscriber| {
            let subscription = parameters.subscribe();
            tokio::spawn(consume(subscriber.clone(), subscription))
        })
        .collect();

    let signal_handle = {
        let parameters = parameters.clone();
        signal_handler::start(Box::new(move || {
            parameters.cancel(Cancelled::with_message("session interrupted"));
        }))
    };

    let published = produce(&parameters, fps_range, config.updates, interval).await;
    let interrupted = parameters.is_cancelled();
    parameters.cancel(Cancelled::with_message("session finished"));
    signal_handle.abort();

    let first_value_frame = first_value
        .await
        .context(error::JoinTaskSnafu { task: "first value reader" })?
        .ok()
        .map(|params| params.frame);

    let mut subscribers = Vec::with_capacity(consumers.len());
    for consumer in consumers {
        subscribers.push(consumer.await.context(error::JoinTaskSnafu { task: "subscriber" })?);
    }

    tracing::info!("Camera session ended after {published} publishes");
    Ok(SessionReport { fps_range, published, first_value_frame, interrupted, subscribers })
}

async fn produce(
    parameters: &AwaitBroadcast<CameraParameters>,
    fps_range: FpsRange,
    updates: u64,
    interval: Duration,
) -> u64 {
    let mut ticker = tokio::time::interval(interval);
    let mut current = CameraParameters::new(fps_range);
    let mut published = 0;

    while published < updates {
        let _ = ticker.tick().await;

        // alternate between the suspending and the non-suspending publish
        let accepted = if published % 2 == 0 {
            parameters.send(current.clone()).await.is_ok()
        } else {
            parameters.offer(current.clone())
        };
        if !accepted {
            tracing::info!("Parameters were cancelled, stop publishing");
            break;
        }

        published += 1;
        let zoom_level = if current.zoom_level >= MAX_ZOOM_LEVEL {
            1.0
        } else {
            current.zoom_level + 0.25
        };
        current = current.next_frame(zoom_level);
    }

    published
}

async fn consume(
    subscriber: Subscriber,
    subscription: Subscription<CameraParameters>,
) -> SubscriberReport {
    let mut stream = Box::pin(subscription.into_stream());
    let mut received = 0;
    let mut last_frame = None;

    let ended = loop {
        match stream.next().await {
            Some(Ok(params)) => {
                tracing::debug!(
                    subscriber = %subscriber.name,
                    frame = params.frame,
                    zoom_level = params.zoom_level,
                    "Parameters received"
                );
                received += 1;
                last_frame = Some(params.frame);
                tokio::time::sleep(subscriber.processing_delay()).await;
            }
            Some(Err(err)) => break Termination::from(err),
            None => break Termination::Closed,
        }
    };

    tracing::info!("Subscriber [{}] received {received} values, {ended}", subscriber.name);
    SubscriberReport {
        name: subscriber.name,
        processing_delay_ms: subscriber.processing_delay_ms,
        received,
        last_frame,
        ended,
    }
}
