use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

/// A preview frame rate range, in frames per second times 1000.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct FpsRange {
    pub min: u32,
    pub max: u32,
}

impl FpsRange {
    #[inline]
    #[must_use]
    pub const fn new(min: u32, max: u32) -> Self { Self { min, max } }

    #[inline]
    #[must_use]
    pub const fn is_fixed(&self) -> bool { self.min == self.max }

    #[inline]
    #[must_use]
    pub const fn contains(&self, fps: u32) -> bool { self.min <= fps && fps <= self.max }
}

impl fmt::Display for FpsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Orders ranges by their lower bound, then by their upper bound.
#[must_use]
pub fn compare_by_bounds(a: &FpsRange, b: &FpsRange) -> Ordering {
    a.min.cmp(&b.min).then(a.max.cmp(&b.max))
}

#[must_use]
pub fn max_by_bounds(ranges: &[FpsRange]) -> Option<FpsRange> {
    ranges.iter().copied().max_by(compare_by_bounds)
}

#[must_use]
pub fn min_by_bounds(ranges: &[FpsRange]) -> Option<FpsRange> {
    ranges.iter().copied().min_by(compare_by_bounds)
}
