use futures::FutureExt;
use snafu::ResultExt;
use tokio::signal::unix::{SignalKind, signal};

use crate::error::{self, Error};

pub type ShutdownHookFn = Box<dyn FnOnce() + Send>;

async fn run(shutdown_hook: ShutdownHookFn) -> Result<(), Error> {
    let mut term_signal = signal(SignalKind::terminate()).context(error::InstallSignalHandlerSnafu)?;
    let mut int_signal = signal(SignalKind::interrupt()).context(error::InstallSignalHandlerSnafu)?;

    let mut shutdown_hook = Some(shutdown_hook);

    loop {
        futures::select! {
            _ = term_signal.recv().fuse() => tracing::info!("SIGTERM received!"),
            _ = int_signal.recv().fuse() => tracing::info!("SIGINT received!"),
        }

        match shutdown_hook.take() {
            Some(shutdown_hook) => {
                tracing::info!("Shutting down cleanly. Interrupt again to shut down immediately.");
                shutdown_hook();
            }
            None => {
                tracing::info!("Terminating process!");
                std::process::abort();
            }
        }
    }
}

pub fn start(shutdown_hook: ShutdownHookFn) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn(async move {
        if let Err(err) = run(shutdown_hook).await {
            tracing::warn!("{err}");
        }
    })
}
