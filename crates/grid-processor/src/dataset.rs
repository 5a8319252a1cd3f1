//! CF view over a decoded NetCDF file.
//!
//! [`CfDataset`] pairs a [`NetCdfFile`] with its resolved axes and answers
//! the coordinate questions the builders ask: cleansed values, cell bounds,
//! bounding boxes and projected extents.

use std::path::Path;

use bytes::Bytes;
use netcdf_parser::{Header, NetCdfFile};
use projection::Projection;
use tracing::{debug, warn};

use crate::axis::{AxisBinding, AxisBindings, AxisKind};
use crate::cache::ProjectionCache;
use crate::cleanse::{Cleanser, VariableStats};
use crate::config::GridProcessorConfig;
use crate::error::{GridProcessorError, Result};
use crate::time::time_iso_string;
use crate::types::{AxisBounds, BoundsMode, Extent, XyBbox};

/// Normalize a longitude into `[0, 360]` when `enabled`.
///
/// Values above 360 land in `(0, 360]`, negative values in `[0, 360)`.
/// Non-finite values are returned unchanged.
pub fn world_wrap(lon: f64, enabled: bool) -> f64 {
    if !enabled || !lon.is_finite() || (0.0..=360.0).contains(&lon) {
        return lon;
    }
    let wrapped = lon.rem_euclid(360.0);
    if lon > 360.0 && wrapped == 0.0 {
        360.0
    } else {
        wrapped
    }
}

/// Cell edges half-way between adjacent samples, flattened to
/// `[lo0, hi0, lo1, hi1, ...]`.
///
/// The first cell reuses the half-width of the first interval; every other
/// cell takes the half-width of the interval before it. A single sample
/// yields a zero-width cell.
pub fn interpolate_bounds(values: &[f64]) -> Vec<f64> {
    let mut bounds = Vec::with_capacity(values.len() * 2);
    for (i, &v) in values.iter().enumerate() {
        let delta = match i {
            0 if values.len() > 1 => (values[1] - values[0]) / 2.0,
            0 => 0.0,
            _ => (v - values[i - 1]) / 2.0,
        };
        bounds.push(v - delta);
        bounds.push(v + delta);
    }
    bounds
}

fn span<I: IntoIterator<Item = f64>>(values: I) -> Option<(f64, f64)> {
    values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

/// A decoded file with CF axis semantics.
#[derive(Debug, Clone)]
pub struct CfDataset {
    file: NetCdfFile,
    axes: AxisBindings,
    longitude_wrap: bool,
}

impl CfDataset {
    pub fn new(file: NetCdfFile, config: &GridProcessorConfig) -> Self {
        let axes = AxisBindings::resolve(file.header());
        Self {
            file,
            axes,
            longitude_wrap: config.longitude_wrap,
        }
    }

    pub fn from_bytes(data: impl Into<Bytes>, config: &GridProcessorConfig) -> Result<Self> {
        Ok(Self::new(NetCdfFile::from_bytes(data)?, config))
    }

    pub fn open(path: impl AsRef<Path>, config: &GridProcessorConfig) -> Result<Self> {
        Ok(Self::new(NetCdfFile::open(path)?, config))
    }

    /// Replace the resolved axes, for files whose metadata defeats the
    /// heuristics.
    pub fn with_axes(mut self, axes: AxisBindings) -> Self {
        self.axes = axes;
        self
    }

    pub fn file(&self) -> &NetCdfFile {
        &self.file
    }

    pub fn header(&self) -> &Header {
        self.file.header()
    }

    pub fn axes(&self) -> &AxisBindings {
        &self.axes
    }

    pub fn longitude_wrap(&self) -> bool {
        self.longitude_wrap
    }

    pub fn is_projected_source(&self) -> bool {
        self.axes.is_projected_source()
    }

    /// The binding for `kind`, or a validation error naming the axis.
    pub fn axis(&self, kind: AxisKind) -> Result<&AxisBinding> {
        self.axes.get(kind).ok_or_else(|| {
            GridProcessorError::validation(format!(
                "{} axis not resolved; set it with CfDataset::with_axes",
                kind.label()
            ))
        })
    }

    pub fn world_wrap(&self, lon: f64) -> f64 {
        world_wrap(lon, self.longitude_wrap)
    }

    /// Raw (uncleansed) values of a coordinate variable.
    pub fn coordinate_data(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.file.read_variable(name)?.to_f64_vec())
    }

    /// Raw 2-D longitude (world-wrapped) and latitude ordinates of a
    /// projected source.
    pub fn ordinates(&self) -> Result<(Vec<f64>, Vec<f64>)> {
        let (x, y) = (self.axis(AxisKind::X)?, self.axis(AxisKind::Y)?);
        let (Some(x_ord), Some(y_ord)) = (&x.ordinate, &y.ordinate) else {
            return Err(GridProcessorError::validation(
                "dataset is not a projected source: X and Y need ordinate variables",
            ));
        };
        let lons = self
            .coordinate_data(x_ord)?
            .into_iter()
            .map(|lon| self.world_wrap(lon))
            .collect();
        Ok((lons, self.coordinate_data(y_ord)?))
    }

    pub fn cleanser(&self, variable: &str) -> Result<Cleanser> {
        Ok(Cleanser::for_variable(self.file.variable(variable)?))
    }

    /// Every value of `variable` with fill values removed and packing applied.
    pub fn cleansed_data(&self, variable: &str) -> Result<Vec<Option<f64>>> {
        let cleanser = self.cleanser(variable)?;
        Ok(cleanser.apply_all(&self.coordinate_data(variable)?))
    }

    /// Cleanse a single raw value of `variable`.
    pub fn cleanse_value(&self, variable: &str, raw: f64) -> Result<Option<f64>> {
        Ok(self.cleanser(variable)?.apply(raw))
    }

    pub fn stats(&self, variable: &str) -> Result<VariableStats> {
        Ok(VariableStats::from_values(&self.cleansed_data(variable)?))
    }

    /// First `units` attribute (name matched case-insensitively).
    pub fn units(&self, variable: &str) -> Result<Option<&str>> {
        Ok(self
            .file
            .variable(variable)?
            .attribute_ignore_case("units")
            .and_then(|v| v.as_str()))
    }

    /// Cell edges for a 1-D axis: the CF `bounds` variable when one is named
    /// and holds two edges per sample, otherwise interpolated from the samples.
    pub fn search_bounds(&self, kind: AxisKind) -> Result<AxisBounds> {
        let binding = self.axis(kind)?;
        let variable = self.file.variable(&binding.axis)?;
        let samples = self.coordinate_data(&binding.axis)?;

        let named = variable
            .attributes
            .iter()
            .filter(|a| a.name.eq_ignore_ascii_case("bounds"))
            .filter_map(|a| a.value.as_str());
        for name in named {
            match self.file.read_variable(name) {
                Ok(data) if data.len() == samples.len() * 2 && !data.is_empty() => {
                    debug!(axis = kind.label(), bounds = name, "using definitive bounds");
                    return Ok(AxisBounds {
                        bounds: data.to_f64_vec(),
                        mode: BoundsMode::Definitive,
                    });
                }
                Ok(data) => warn!(
                    axis = kind.label(),
                    bounds = name,
                    len = data.len(),
                    expected = samples.len() * 2,
                    "bounds variable has the wrong length"
                ),
                Err(e) => debug!(axis = kind.label(), bounds = name, error = %e, "bounds unreadable"),
            }
        }

        Ok(AxisBounds {
            bounds: interpolate_bounds(&samples),
            mode: BoundsMode::Interpolated,
        })
    }

    /// Unprojected bounding box of the spatial axes.
    pub fn xy_bbox(&self) -> Result<XyBbox> {
        let no_values =
            |axis: &str| GridProcessorError::validation(format!("{} axis has no coordinate values", axis));

        if self.is_projected_source() {
            let (lons, lats) = self.ordinates()?;
            let (min_x, max_x) = span(lons).ok_or_else(|| no_values("X"))?;
            let (min_y, max_y) = span(lats).ok_or_else(|| no_values("Y"))?;
            return Ok(XyBbox {
                min: [min_x, min_y],
                max: [max_x, max_y],
                mode: BoundsMode::Projected,
            });
        }

        let x = self.search_bounds(AxisKind::X)?;
        let y = self.search_bounds(AxisKind::Y)?;
        let (min_x, max_x) =
            span(x.bounds.iter().map(|&b| self.world_wrap(b))).ok_or_else(|| no_values("X"))?;
        let (min_y, max_y) = span(y.bounds.iter().copied()).ok_or_else(|| no_values("Y"))?;
        let mode = if x.mode == BoundsMode::Interpolated || y.mode == BoundsMode::Interpolated {
            BoundsMode::Interpolated
        } else {
            BoundsMode::Definitive
        };
        Ok(XyBbox {
            min: [min_x, min_y],
            max: [max_x, max_y],
            mode,
        })
    }

    /// Projected bounding box over the full coordinate range.
    ///
    /// Cartesian sources project every pairing of X and Y cell edges;
    /// projected sources project every ordinate point. Points the projection
    /// rejects are ignored.
    pub fn find_extent(
        &self,
        projection: &dyn Projection,
        cache: &mut ProjectionCache,
    ) -> Result<Extent> {
        let mut points = Vec::new();
        if self.is_projected_source() {
            let (lons, lats) = self.ordinates()?;
            for (&lon, &lat) in lons.iter().zip(&lats) {
                points.extend(cache.project(projection, lon, lat));
            }
        } else {
            let x = self.search_bounds(AxisKind::X)?;
            let y = self.search_bounds(AxisKind::Y)?;
            for &xb in &x.bounds {
                let lon = self.world_wrap(xb);
                for &yb in &y.bounds {
                    points.extend(cache.project(projection, lon, yb));
                }
            }
        }

        let extent = Extent::from_points(points).ok_or_else(|| {
            GridProcessorError::projection("no coordinate of the dataset could be projected")
        })?;
        debug!(min = ?extent.min, max = ?extent.max, "computed extent");
        Ok(extent)
    }

    /// Raw values of the T coordinate.
    pub fn time_values(&self) -> Result<Vec<f64>> {
        let t = self.axis(AxisKind::T)?;
        self.coordinate_data(&t.axis)
    }

    /// T coordinate values as RFC 3339 strings, where the units allow.
    pub fn time_iso_strings(&self) -> Result<Vec<String>> {
        let t = self.axis(AxisKind::T)?;
        let units = self.units(&t.axis)?.unwrap_or_default();
        Ok(self
            .time_values()?
            .into_iter()
            .map(|v| time_iso_string(v, units))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_world_wrap() {
        assert_eq!(world_wrap(-10.0, true), 350.0);
        assert_eq!(world_wrap(725.0, true), 5.0);
        assert_eq!(world_wrap(360.0, true), 360.0);
        assert_eq!(world_wrap(-10.0, false), -10.0);
        assert!(world_wrap(f64::NAN, true).is_nan());
        assert_eq!(world_wrap(720.0, true), 360.0);
        assert_eq!(world_wrap(-720.0, true), 0.0);
        assert_eq!(world_wrap(1e20, true), 280.0);
        assert_eq!(world_wrap(-7.2e5 - 10.0, true), 350.0);
    }

    #[test]
    fn test_interpolated_bounds() {
        let bounds = interpolate_bounds(&[0.0, 10.0, 20.0, 30.0]);
        assert_eq!(bounds, vec![-5.0, 5.0, 5.0, 15.0, 15.0, 25.0, 25.0, 35.0]);

        let descending = interpolate_bounds(&[10.0, 0.0, -10.0]);
        assert_eq!(descending.len(), 6);
        assert!(descending.windows(2).all(|w| w[0] >= w[1]));

        assert_eq!(interpolate_bounds(&[7.0]), vec![7.0, 7.0]);
        assert!(interpolate_bounds(&[]).is_empty());
    }

    #[test]
    fn test_span_ignores_nan() {
        assert_eq!(span([3.0, f64::NAN, -1.0]), Some((-1.0, 3.0)));
        assert_eq!(span([f64::NAN]), None);
    }
}
