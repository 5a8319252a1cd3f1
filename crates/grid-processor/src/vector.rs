//! Resampled vector fields.
//!
//! Two component variables are sampled cell by cell, projected, and dropped
//! into the buckets of a coarse pixel grid laid over the dataset's projected
//! extent. Each bucket is later averaged into a single arrow by
//! [`VectorField::aggregate`].

use std::fmt;

use projection::{Projection, SharedProjection};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::cache::ProjectionCache;
use crate::config::GridProcessorConfig;
use crate::dataset::CfDataset;
use crate::error::{GridProcessorError, Result};
use crate::session::RenderSession;
use crate::slice::SliceLayout;
use crate::types::{DimensionFilter, Extent};

/// Step, in degrees, used to probe the projection for arrow bearings.
const ANGLE_PROBE: f64 = 1e-4;

/// How the two source variables are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorMode {
    /// Eastward `u` and northward `v` components.
    #[default]
    Uv,
    /// Magnitude and direction in degrees.
    MagnitudeDirection,
}

/// Vector components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UvVector {
    pub u: f64,
    pub v: f64,
}

/// Vector magnitude and direction (degrees, `[0, 360)`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MdVector {
    pub magnitude: f64,
    pub direction: f64,
}

/// Components of a vector blowing *from* `direction`.
pub fn uv_from_magnitude_direction(magnitude: f64, direction: f64) -> UvVector {
    let theta = direction.to_radians();
    UvVector {
        u: -magnitude * theta.sin(),
        v: -magnitude * theta.cos(),
    }
}

/// Magnitude and meteorological direction of `(u, v)`.
pub fn magnitude_direction_from_uv(u: f64, v: f64) -> MdVector {
    let mut direction = (-u).atan2(-v).to_degrees();
    if direction < 0.0 {
        direction += 360.0;
    }
    MdVector {
        magnitude: u.hypot(v),
        direction,
    }
}

/// Screen angle of a bearing at `(lon, lat)` under a non-orthogonal
/// projection, estimated from two nearby projected points.
///
/// The result is measured from the screen's upward axis with Y pointing down.
pub fn projected_angle(
    projection: &dyn Projection,
    cache: &mut ProjectionCache,
    lon: f64,
    lat: f64,
    angle: f64,
) -> Option<f64> {
    let rad = angle.to_radians();
    let lon_offset = ANGLE_PROBE * rad.cos() / lat.to_radians().cos();
    let lat_offset = ANGLE_PROBE * rad.sin();
    let [x, y] = cache.project(projection, lon, lat)?;
    let [x2, y2] = cache.project(projection, lon + lon_offset, lat + lat_offset)?;
    let theta = (x2 - x).atan2(y - y2).to_degrees();
    theta.is_finite().then_some(theta)
}

/// One source sample placed in the pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorSample {
    /// Offset from the extent's left edge, in projected units.
    pub px: f64,
    /// Offset from the extent's top edge, in projected units.
    pub py: f64,
    pub u: f64,
    pub v: f64,
    /// Arrow rotation in degrees.
    pub render_angle: f64,
}

/// Mean of one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VectorAggregate {
    pub magnitude: f64,
    /// Mathematical angle of the mean vector, degrees counter-clockwise from east.
    pub angle: f64,
    pub count: usize,
    pub u: f64,
    pub v: f64,
    /// Mean of the non-zero render angles.
    pub render_angle: Option<f64>,
    /// Mean rotation between neighbouring samples along the mean flow.
    pub angular_change: Option<f64>,
}

impl VectorAggregate {
    /// Average a bucket; `None` when no sample has usable components.
    ///
    /// Opposing samples cancel, so a bucket can average to zero magnitude.
    pub fn from_samples(samples: &[VectorSample], with_angular_change: bool) -> Option<Self> {
        let usable: Vec<&VectorSample> = samples
            .iter()
            .filter(|s| s.u.is_finite() && s.v.is_finite())
            .collect();
        if usable.is_empty() {
            return None;
        }

        let count = usable.len();
        let u = usable.iter().map(|s| s.u).sum::<f64>() / count as f64;
        let v = usable.iter().map(|s| s.v).sum::<f64>() / count as f64;

        let angles: Vec<f64> = samples
            .iter()
            .map(|s| s.render_angle)
            .filter(|a| *a != 0.0 && a.is_finite())
            .collect();
        let render_angle =
            (!angles.is_empty()).then(|| angles.iter().sum::<f64>() / angles.len() as f64);

        Some(Self {
            magnitude: u.hypot(v),
            angle: v.atan2(u).to_degrees(),
            count,
            u,
            v,
            render_angle,
            angular_change: with_angular_change.then(|| angular_change(&usable, u, v)),
        })
    }
}

/// Mean wrapped change of vector angle between samples ordered along the
/// mean flow direction `(u, v)`.
fn angular_change(samples: &[&VectorSample], u: f64, v: f64) -> f64 {
    let norm = u.hypot(v);
    if samples.len() < 2 || norm == 0.0 {
        return 0.0;
    }
    let (dir_x, dir_y) = (u / norm, v / norm);

    let mut ordered: Vec<(f64, f64)> = samples
        .iter()
        .map(|s| (s.px * dir_x + s.py * dir_y, s.v.atan2(s.u).to_degrees()))
        .collect();
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

    let total: f64 = ordered
        .windows(2)
        .map(|w| {
            let mut delta = w[1].1 - w[0].1;
            if delta > 180.0 {
                delta -= 360.0;
            }
            if delta < -180.0 {
                delta += 360.0;
            }
            delta
        })
        .sum();
    total / (ordered.len() - 1) as f64
}

/// Samples bucketed into an `(x_grid_size + 1) × (y_grid_size + 1)` grid,
/// indexed `[x][y]`.
#[derive(Clone, Serialize, Deserialize)]
pub struct VectorField {
    pub u_variable: String,
    pub v_variable: String,
    pub mode: VectorMode,
    pub x_grid_size: usize,
    pub y_grid_size: usize,
    pub extent: Extent,
    pub filter: DimensionFilter,
    pub buckets: Vec<Vec<Vec<VectorSample>>>,
    #[serde(skip)]
    projection: Option<SharedProjection>,
}

impl fmt::Debug for VectorField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VectorField")
            .field("u_variable", &self.u_variable)
            .field("v_variable", &self.v_variable)
            .field("mode", &self.mode)
            .field("x_grid_size", &self.x_grid_size)
            .field("y_grid_size", &self.y_grid_size)
            .field("samples", &self.sample_count())
            .finish()
    }
}

impl VectorField {
    pub fn bucket(&self, x: usize, y: usize) -> Option<&[VectorSample]> {
        self.buckets.get(x)?.get(y).map(Vec::as_slice)
    }

    pub fn sample_count(&self) -> usize {
        self.buckets.iter().flatten().map(Vec::len).sum()
    }

    /// Average every bucket.
    pub fn aggregate(&self, with_angular_change: bool) -> Vec<Vec<Option<VectorAggregate>>> {
        self.buckets
            .iter()
            .map(|column| {
                column
                    .iter()
                    .map(|b| VectorAggregate::from_samples(b, with_angular_change))
                    .collect()
            })
            .collect()
    }

    pub fn projection(&self) -> Option<&SharedProjection> {
        self.projection.as_ref()
    }

    pub fn into_transferable(mut self) -> Self {
        self.projection = None;
        self
    }

    pub fn with_projection(mut self, projection: SharedProjection) -> Self {
        self.projection = Some(projection);
        self
    }
}

/// Bucket index of an offset along one axis, if inside the grid.
fn bucket_index(offset: f64, range: f64, grid_size: usize) -> Option<usize> {
    let scaled = if range > 0.0 {
        (offset / range * grid_size as f64).round()
    } else {
        0.0
    };
    (scaled.is_finite() && scaled >= 0.0 && scaled <= grid_size as f64).then_some(scaled as usize)
}

/// Builds [`VectorField`]s from two component variables.
pub struct VectorFieldBuilder<'a> {
    dataset: &'a CfDataset,
    projection: SharedProjection,
    mode: VectorMode,
    rotation_offset: f64,
    non_orthogonal: bool,
}

impl<'a> VectorFieldBuilder<'a> {
    pub fn new(dataset: &'a CfDataset, projection: SharedProjection) -> Self {
        Self {
            dataset,
            projection,
            mode: VectorMode::default(),
            rotation_offset: GridProcessorConfig::default().rotation_offset,
            non_orthogonal: false,
        }
    }

    pub fn with_config(mut self, config: &GridProcessorConfig) -> Self {
        self.rotation_offset = config.rotation_offset;
        self
    }

    pub fn mode(mut self, mode: VectorMode) -> Self {
        self.mode = mode;
        self
    }

    /// Degrees added to each direction before rendering.
    pub fn rotation_offset(mut self, degrees: f64) -> Self {
        self.rotation_offset = degrees;
        self
    }

    /// Estimate render angles numerically, for projections that do not keep
    /// north pointing up.
    pub fn non_orthogonal(mut self, enabled: bool) -> Self {
        self.non_orthogonal = enabled;
        self
    }

    /// Sample `first`/`second` into an `x_grid_size × y_grid_size` pixel grid.
    pub fn build(
        &self,
        first: &str,
        second: &str,
        filter: &DimensionFilter,
        x_grid_size: usize,
        y_grid_size: usize,
        session: &mut RenderSession,
    ) -> Result<VectorField> {
        if x_grid_size == 0 || y_grid_size == 0 {
            return Err(GridProcessorError::validation("vector grid size must be > 0"));
        }
        let layout1 = SliceLayout::prepare(self.dataset, first, filter)?;
        let layout2 = SliceLayout::prepare(self.dataset, second, filter)?;

        let extent = session.extent(self.dataset, &*self.projection)?;
        let data1 = self.dataset.cleansed_data(first)?;
        let data2 = self.dataset.cleansed_data(second)?;

        let points: Vec<(f64, f64)> = if self.dataset.is_projected_source() {
            let (lons, lats) = self.dataset.ordinates()?;
            lons.into_iter().zip(lats).collect()
        } else {
            layout1
                .positions()
                .map(|(i, j)| {
                    (
                        self.dataset.world_wrap(layout1.x_values[i]),
                        layout1.y_values[j],
                    )
                })
                .collect()
        };

        let cache = session.projection_cache_mut();
        let mut buckets = vec![vec![Vec::new(); y_grid_size + 1]; x_grid_size + 1];
        let mut dropped = 0usize;
        for (k, (lon, lat)) in points.into_iter().enumerate() {
            let a = data1.get(layout1.starting_offset + k).copied().flatten();
            let b = data2.get(layout2.starting_offset + k).copied().flatten();
            let (Some(a), Some(b)) = (a, b) else {
                continue;
            };
            let Some(sample) = self.sample(lon, lat, a, b, &extent, cache) else {
                dropped += 1;
                continue;
            };
            match (
                bucket_index(sample.px, extent.width(), x_grid_size),
                bucket_index(sample.py, extent.height(), y_grid_size),
            ) {
                (Some(x), Some(y)) => buckets[x][y].push(sample),
                _ => dropped += 1,
            }
        }
        if dropped > 0 {
            debug!(dropped, "vector samples outside the pixel grid or unprojectable");
        }

        let field = VectorField {
            u_variable: first.to_string(),
            v_variable: second.to_string(),
            mode: self.mode,
            x_grid_size,
            y_grid_size,
            extent,
            filter: layout1.filter,
            buckets,
            projection: Some(self.projection.clone()),
        };
        info!(
            first,
            second,
            samples = field.sample_count(),
            x_grid_size,
            y_grid_size,
            "built vector field"
        );
        Ok(field)
    }

    fn sample(
        &self,
        lon: f64,
        lat: f64,
        first: f64,
        second: f64,
        extent: &Extent,
        cache: &mut ProjectionCache,
    ) -> Option<VectorSample> {
        let (uv, md) = match self.mode {
            VectorMode::Uv => (
                UvVector { u: first, v: second },
                magnitude_direction_from_uv(first, second),
            ),
            VectorMode::MagnitudeDirection => (
                uv_from_magnitude_direction(first, second),
                MdVector {
                    magnitude: first,
                    direction: second,
                },
            ),
        };

        let projection = &*self.projection;
        let [x, y] = cache.project(projection, lon, lat)?;
        let render_angle = if self.non_orthogonal {
            let bearing = (magnitude_direction_from_uv(uv.u, uv.v).direction
                + self.rotation_offset)
                .rem_euclid(360.0);
            projected_angle(projection, cache, lon, lat, bearing)?
        } else {
            (md.direction + self.rotation_offset).rem_euclid(360.0)
        };

        Some(VectorSample {
            px: x - extent.min[0],
            py: extent.max[1] - y,
            u: uv.u,
            v: uv.v,
            render_angle,
        })
    }
}
