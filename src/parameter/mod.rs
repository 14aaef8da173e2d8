mod fps_range;

use serde::{Deserialize, Serialize};

pub use self::fps_range::{FpsRange, compare_by_bounds, max_by_bounds, min_by_bounds};

/// A snapshot of the parameters a camera session publishes to its observers.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct CameraParameters {
    pub frame: u64,
    pub fps_range: FpsRange,
    pub zoom_level: f32,
}

impl CameraParameters {
    #[inline]
    #[must_use]
    pub const fn new(fps_range: FpsRange) -> Self { Self { frame: 0, fps_range, zoom_level: 1.0 } }

    /// The parameters of the next frame, with `zoom_level` applied.
    #[must_use]
    pub const fn next_frame(&self, zoom_level: f32) -> Self {
        Self { frame: self.frame + 1, fps_range: self.fps_range, zoom_level }
    }
}
