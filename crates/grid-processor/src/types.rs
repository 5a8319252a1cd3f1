//! Core types shared by the grid and vector builders.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A projected (or geographic) coordinate pair `[x, y]`.
pub type Point = [f64; 2];

/// Polygon vertices in projected space.
pub type Polygon = Vec<Point>;

/// Binding of every non-spatial dimension to one raw coordinate value,
/// keyed by the dimension's coordinate variable name.
pub type DimensionFilter = BTreeMap<String, f64>;

/// Bounding box in projected space: `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Extent {
    pub min: Point,
    pub max: Point,
}

impl Extent {
    pub fn new(min: Point, max: Point) -> Self {
        Self { min, max }
    }

    /// Smallest extent covering every point; `None` for an empty iterator.
    pub fn from_points<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut extent = Self::new(first, first);
        for [x, y] in iter {
            extent.min[0] = extent.min[0].min(x);
            extent.min[1] = extent.min[1].min(y);
            extent.max[0] = extent.max[0].max(x);
            extent.max[1] = extent.max[1].max(y);
        }
        Some(extent)
    }

    pub fn width(&self) -> f64 {
        self.max[0] - self.min[0]
    }

    pub fn height(&self) -> f64 {
        self.max[1] - self.min[1]
    }

    pub fn contains(&self, [x, y]: Point) -> bool {
        x >= self.min[0] && x <= self.max[0] && y >= self.min[1] && y <= self.max[1]
    }
}

/// How cell edges were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundsMode {
    /// Read from a CF `bounds` variable.
    Definitive,
    /// Half-way points between adjacent axis samples.
    Interpolated,
    /// Taken from 2-D ordinate arrays of a projected source.
    Projected,
}

/// Flattened `[lo0, hi0, lo1, hi1, ...]` edges for one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AxisBounds {
    pub bounds: Vec<f64>,
    pub mode: BoundsMode,
}

impl AxisBounds {
    /// Edges of cell `i`, if present.
    pub fn cell(&self, i: usize) -> Option<(f64, f64)> {
        let lo = *self.bounds.get(2 * i)?;
        let hi = *self.bounds.get(2 * i + 1)?;
        Some((lo, hi))
    }
}

/// Unprojected bounding box of the dataset's spatial axes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XyBbox {
    pub min: Point,
    pub max: Point,
    pub mode: BoundsMode,
}

/// Cache performance statistics.
#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

impl CacheStats {
    /// Calculate the cache hit rate (0.0 - 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
