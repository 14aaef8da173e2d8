mod error;

use std::{path::Path, time::Duration};

use awaitcast::parameter::FpsRange;
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt};

pub use self::error::Error;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Config {
    pub updates: u64,
    pub publish_interval_ms: u64,
    pub fps_ranges: Vec<FpsRange>,
    pub subscribers: Vec<Subscriber>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Subscriber {
    pub name: String,

    #[serde(default)]
    pub processing_delay_ms: u64,
}

impl Subscriber {
    #[inline]
    pub const fn processing_delay(&self) -> Duration {
        Duration::from_millis(self.processing_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            updates: 20,
            publish_interval_ms: 50,
            fps_ranges: vec![
                FpsRange::new(15000, 15000),
                FpsRange::new(15000, 30000),
                FpsRange::new(30000, 30000),
                FpsRange::new(24000, 30000),
            ],
            subscribers: vec![
                Subscriber { name: "preview".to_owned(), processing_delay_ms: 0 },
                Subscriber { name: "focus".to_owned(), processing_delay_ms: 120 },
                Subscriber { name: "recorder".to_owned(), processing_delay_ms: 400 },
            ],
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let file_name = path.as_ref().to_owned();
        let content = std::fs::read_to_string(&file_name)
            .context(error::ReadConfigFileSnafu { file_name: file_name.clone() })?;
        toml::from_str(&content).context(error::DeserializeConfigSnafu { file_name })
    }

    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).context(error::SerializeConfigSnafu)
    }

    pub fn publish_interval(&self) -> Result<Duration, Error> {
        snafu::ensure!(self.publish_interval_ms > 0, error::ZeroPublishIntervalSnafu);
        Ok(Duration::from_millis(self.publish_interval_ms))
    }

    /// The range the session runs with: the largest candidate by bounds.
    pub fn preview_fps_range(&self) -> Result<FpsRange, Error> {
        if let Some(&range) = self.fps_ranges.iter().find(|range| range.min > range.max) {
            return error::InvalidFpsRangeSnafu { range }.fail();
        }
        awaitcast::parameter::max_by_bounds(&self.fps_ranges).context(error::NoFpsRangeProvidedSnafu)
    }
}
