use std::path::PathBuf;

use snafu::Snafu;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Read configuration file {:?}, error: {}", file_name.display(), source))]
    ReadConfigFile { source: std::io::Error, file_name: PathBuf },

    #[snafu(display("Deserialize configuration file {:?}, error: {}", file_name.display(), source))]
    DeserializeConfig { source: toml::de::Error, file_name: PathBuf },

    #[snafu(display("Could not serialize configuration, error: {}", source))]
    SerializeConfig { source: toml::ser::Error },

    #[snafu(display("No FPS range is provided"))]
    NoFpsRangeProvided,

    #[snafu(display("Publish interval must be greater than zero"))]
    ZeroPublishInterval,

    #[snafu(display("Invalid FPS range {}, minimum is greater than maximum", range))]
    InvalidFpsRange { range: awaitcast::parameter::FpsRange },
}
