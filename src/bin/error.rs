use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Could not initialize tokio runtime, error: {}", source))]
    InitializeTokioRuntime { source: std::io::Error },

    #[snafu(display("Could not install signal handler, error: {}", source))]
    InstallSignalHandler { source: std::io::Error },

    #[snafu(display("Configuration error, error: {}", source))]
    Config { source: crate::config::Error },

    #[snafu(display("Could not join {} task, error: {}", task, source))]
    JoinTask { task: String, source: tokio::task::JoinError },

    #[snafu(display("Could not serialize session report, error: {}", source))]
    SerializeReport { source: serde_json::Error },
}

impl From<crate::config::Error> for Error {
    fn from(source: crate::config::Error) -> Self { Self::Config { source } }
}
