//! Scalar grids: one value-bearing polygon per source cell.
//!
//! Cartesian sources build each cell from its X/Y edges (read from a CF
//! `bounds` variable or interpolated), giving a closed 5-point polygon.
//! Projected sources have no usable edges, so each cell's corners are the
//! centroids of the four quadrants of its 3×3 ordinate neighbourhood,
//! giving 4 points. Cells whose geometry cannot be built keep their value
//! but have no polygon.

use std::fmt;

use projection::SharedProjection;
use serde::{Deserialize, Serialize};
use tracing::{info, trace};

use crate::axis::AxisKind;
use crate::cache::ProjectionCache;
use crate::dataset::CfDataset;
use crate::error::{GridProcessorError, Result};
use crate::session::RenderSession;
use crate::slice::SliceLayout;
use crate::types::{AxisBounds, DimensionFilter, Point, Polygon};

/// One cell of a built grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridCell {
    /// Index along X.
    pub i: usize,
    /// Index along Y.
    pub j: usize,
    /// X coordinate value (world-wrapped for cartesian sources).
    pub x: f64,
    /// Y coordinate value.
    pub y: f64,
    /// Projected outline; `None` where geometry could not be built.
    pub polygon: Option<Polygon>,
    /// Cleansed value; `None` for fill values or missing data.
    pub value: Option<f64>,
    /// Full dimension binding of this cell, including X and Y.
    pub dimensions: DimensionFilter,
}

/// Cells sharing one coordinate value of the outer axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridRow {
    pub value: f64,
    pub cells: Vec<GridCell>,
}

/// A built 2-D slice.
///
/// Rows follow the variable's storage order: when X is the outer axis each
/// row holds one X value and its cells run along Y, and vice versa.
#[derive(Clone, Serialize, Deserialize)]
pub struct DataGrid {
    pub variable: String,
    pub outer_axis: AxisKind,
    pub rows: Vec<GridRow>,
    pub x_size: usize,
    pub y_size: usize,
    pub filter: DimensionFilter,
    pub longitude_wrap: bool,
    #[serde(skip)]
    projection: Option<SharedProjection>,
}

impl fmt::Debug for DataGrid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataGrid")
            .field("variable", &self.variable)
            .field("outer_axis", &self.outer_axis)
            .field("x_size", &self.x_size)
            .field("y_size", &self.y_size)
            .field("filter", &self.filter)
            .field("has_projection", &self.projection.is_some())
            .finish()
    }
}

impl DataGrid {
    pub fn cells(&self) -> impl Iterator<Item = &GridCell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }

    pub fn len(&self) -> usize {
        self.rows.iter().map(|r| r.cells.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a cell by its X and Y coordinate values.
    pub fn cell(&self, x: f64, y: f64) -> Option<&GridCell> {
        let (outer, inner) = match self.outer_axis {
            AxisKind::X => (x, y),
            _ => (y, x),
        };
        let row = self.rows.iter().find(|r| r.value == outer)?;
        row.cells.iter().find(|c| match self.outer_axis {
            AxisKind::X => c.y == inner,
            _ => c.x == inner,
        })
    }

    /// Look up a cell by its grid indices.
    pub fn cell_at(&self, i: usize, j: usize) -> Option<&GridCell> {
        let (row, col) = match self.outer_axis {
            AxisKind::X => (i, j),
            _ => (j, i),
        };
        self.rows.get(row)?.cells.get(col)
    }

    pub fn projection(&self) -> Option<&SharedProjection> {
        self.projection.as_ref()
    }

    /// The projection handle, or a validation error for a stripped grid.
    pub fn require_projection(&self) -> Result<&SharedProjection> {
        self.projection.as_ref().ok_or_else(|| {
            GridProcessorError::validation(
                "grid has no projection; restore it with DataGrid::with_projection",
            )
        })
    }

    /// Drop the projection handle so the grid can be serialized.
    pub fn into_transferable(mut self) -> Self {
        self.projection = None;
        self
    }

    /// Reattach a projection after the grid has been transferred.
    pub fn with_projection(mut self, projection: SharedProjection) -> Self {
        self.projection = Some(projection);
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Deserialize a transferred grid. The projection must be reattached.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Arrange per-position cells into rows following the slice's storage order.
pub(crate) fn assemble_rows<F>(layout: &SliceLayout, x_values: &[f64], mut make_cell: F) -> Vec<GridRow>
where
    F: FnMut(usize, usize, usize) -> GridCell,
{
    let (outer_len, inner_len) = if layout.x_major {
        (layout.x_size(), layout.y_size())
    } else {
        (layout.y_size(), layout.x_size())
    };

    let mut rows = Vec::with_capacity(outer_len);
    let mut offset = layout.starting_offset;
    for o in 0..outer_len {
        let value = if layout.x_major {
            x_values[o]
        } else {
            layout.y_values[o]
        };
        let mut cells = Vec::with_capacity(inner_len);
        for n in 0..inner_len {
            let (i, j) = if layout.x_major { (o, n) } else { (n, o) };
            cells.push(make_cell(i, j, offset));
            offset += 1;
        }
        rows.push(GridRow { value, cells });
    }
    rows
}

/// Builds [`DataGrid`]s from a dataset under one projection.
pub struct GridBuilder<'a> {
    dataset: &'a CfDataset,
    projection: SharedProjection,
    meridian_skip: Option<f64>,
}

impl<'a> GridBuilder<'a> {
    pub fn new(dataset: &'a CfDataset, projection: SharedProjection) -> Self {
        Self {
            dataset,
            projection,
            meridian_skip: None,
        }
    }

    pub fn dataset(&self) -> &'a CfDataset {
        self.dataset
    }

    /// Omit cells that straddle this longitude.
    pub fn meridian_skip(mut self, meridian: Option<f64>) -> Self {
        self.meridian_skip = meridian.filter(|m| m.is_finite());
        self
    }

    /// Build the slice of `variable` selected by `filter`.
    pub fn build(
        &self,
        variable: &str,
        filter: &DimensionFilter,
        session: &mut RenderSession,
    ) -> Result<DataGrid> {
        let layout = SliceLayout::prepare(self.dataset, variable, filter)?;
        let values = self.dataset.cleansed_data(variable)?;
        let cache = session.projection_cache_mut();

        let rows = if self.dataset.is_projected_source() {
            self.projected_rows(&layout, &values, cache)?
        } else {
            self.cartesian_rows(&layout, &values, cache)?
        };

        let grid = DataGrid {
            variable: variable.to_string(),
            outer_axis: if layout.x_major { AxisKind::X } else { AxisKind::Y },
            rows,
            x_size: layout.x_size(),
            y_size: layout.y_size(),
            filter: layout.filter,
            longitude_wrap: self.dataset.longitude_wrap(),
            projection: Some(self.projection.clone()),
        };
        info!(
            variable = %grid.variable,
            cells = grid.len(),
            projected = self.dataset.is_projected_source(),
            "built grid"
        );
        Ok(grid)
    }

    fn cell(layout: &SliceLayout, i: usize, j: usize, x: f64, y: f64) -> GridCell {
        let mut dimensions = layout.filter.clone();
        dimensions.insert(layout.x_name.clone(), x);
        dimensions.insert(layout.y_name.clone(), y);
        GridCell {
            i,
            j,
            x,
            y,
            polygon: None,
            value: None,
            dimensions,
        }
    }

    fn cartesian_rows(
        &self,
        layout: &SliceLayout,
        values: &[Option<f64>],
        cache: &mut ProjectionCache,
    ) -> Result<Vec<GridRow>> {
        let x_bounds = self.dataset.search_bounds(AxisKind::X)?;
        let y_bounds = self.dataset.search_bounds(AxisKind::Y)?;
        let x_values: Vec<f64> = layout
            .x_values
            .iter()
            .map(|&x| self.dataset.world_wrap(x))
            .collect();

        Ok(assemble_rows(layout, &x_values, |i, j, offset| {
            let mut cell = Self::cell(layout, i, j, x_values[i], layout.y_values[j]);
            cell.value = values.get(offset).copied().flatten();
            cell.polygon = self.cartesian_polygon(i, j, &x_bounds, &y_bounds, cache);
            cell
        }))
    }

    /// Closed outline `[(x1,y1), (x1,y2), (x2,y2), (x2,y1), (x1,y1)]`.
    fn cartesian_polygon(
        &self,
        i: usize,
        j: usize,
        x_bounds: &AxisBounds,
        y_bounds: &AxisBounds,
        cache: &mut ProjectionCache,
    ) -> Option<Polygon> {
        let (x_lo, x_hi) = x_bounds.cell(i)?;
        let (y1, y2) = y_bounds.cell(j)?;

        if let Some(skip) = self.meridian_skip {
            if x_lo <= skip && x_hi > skip {
                return None;
            }
        }

        let x1 = self.dataset.world_wrap(x_lo);
        let x2 = self.dataset.world_wrap(x_hi);
        if self.dataset.longitude_wrap() && (x1 - x2).abs() > 180.0 {
            return None;
        }

        let projection = &*self.projection;
        let mut polygon = Vec::with_capacity(5);
        for (lon, lat) in [(x1, y1), (x1, y2), (x2, y2), (x2, y1)] {
            match cache.project(projection, lon, lat) {
                Some(p) => polygon.push(p),
                None => {
                    trace!(i, j, lon, lat, "cell corner did not project");
                    return None;
                }
            }
        }
        polygon.push(polygon[0]);
        Some(polygon)
    }

    fn projected_rows(
        &self,
        layout: &SliceLayout,
        values: &[Option<f64>],
        cache: &mut ProjectionCache,
    ) -> Result<Vec<GridRow>> {
        let (lons, lats) = self.dataset.ordinates()?;
        let hood = Neighbourhood::new(self.dataset, layout)?;

        Ok(assemble_rows(layout, &layout.x_values, |i, j, offset| {
            let mut cell = Self::cell(layout, i, j, layout.x_values[i], layout.y_values[j]);
            cell.value = values.get(offset).copied().flatten();
            cell.polygon = hood.polygon(
                i,
                j,
                &lons,
                &lats,
                self.meridian_skip,
                &*self.projection,
                cache,
            );
            cell
        }))
    }
}

fn centroid(points: [Point; 4]) -> Point {
    let n = points.len() as f64;
    let (sx, sy) = points
        .iter()
        .fold((0.0, 0.0), |(sx, sy), p| (sx + p[0], sy + p[1]));
    [sx / n, sy / n]
}

/// Addressing of the 2-D ordinate arrays around a cell.
pub(crate) struct Neighbourhood {
    x_size: usize,
    y_size: usize,
    /// Ordinates stored `(y, x)`; otherwise `(x, y)`.
    xy_physical: bool,
    longitude_wrap: bool,
}

impl Neighbourhood {
    pub(crate) fn new(dataset: &CfDataset, layout: &SliceLayout) -> Result<Self> {
        let header = dataset.header();
        let x_dim = header.dimension_index(&layout.x_name);
        let y_dim = header.dimension_index(&layout.y_name);
        let ordinate = dataset
            .axis(AxisKind::X)?
            .ordinate
            .as_deref()
            .and_then(|name| header.variable(name));

        let xy_physical = match ordinate {
            Some(var) if var.dimensions.len() > 1 => {
                Some(var.dimensions[0]) == y_dim && Some(var.dimensions[1]) == x_dim
            }
            _ => true,
        };

        Ok(Self {
            x_size: layout.x_size(),
            y_size: layout.y_size(),
            xy_physical,
            longitude_wrap: dataset.longitude_wrap(),
        })
    }

    /// Linear index of neighbour `(a, b)` of cell `(i, j)`, with `a` along X
    /// and `b` along Y, both in `0..3`.
    fn index(&self, i: usize, j: usize, a: usize, b: usize) -> usize {
        if self.xy_physical {
            (j + b - 1) * self.x_size + i + a - 1
        } else {
            (i + b - 1) * self.y_size + j + a - 1
        }
    }

    /// Four corners `[NW, SW, SE, NE]` of cell `(i, j)`, or `None` near the
    /// grid border, across a seam, or where a neighbour fails to project.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn polygon(
        &self,
        i: usize,
        j: usize,
        lons: &[f64],
        lats: &[f64],
        meridian_skip: Option<f64>,
        projection: &dyn projection::Projection,
        cache: &mut ProjectionCache,
    ) -> Option<Polygon> {
        if i <= 1 || j <= 1 || i + 2 >= self.x_size || j + 2 >= self.y_size {
            return None;
        }

        let mut lonlat = [[[0.0; 2]; 3]; 3];
        for (a, column) in lonlat.iter_mut().enumerate() {
            for (b, point) in column.iter_mut().enumerate() {
                let k = self.index(i, j, a, b);
                *point = [*lons.get(k)?, *lats.get(k)?];
            }
        }

        let (min_lon, max_lon) = lonlat
            .iter()
            .flatten()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
                (lo.min(p[0]), hi.max(p[0]))
            });
        if let Some(skip) = meridian_skip {
            if min_lon <= skip && max_lon > skip {
                return None;
            }
        }
        if self.longitude_wrap && max_lon - min_lon > 180.0 {
            return None;
        }

        let mut p = [[[0.0; 2]; 3]; 3];
        for a in 0..3 {
            for b in 0..3 {
                let [lon, lat] = lonlat[a][b];
                match cache.project(projection, lon, lat) {
                    Some(point) => p[a][b] = point,
                    None => {
                        trace!(i, j, lon, lat, "ordinate did not project");
                        return None;
                    }
                }
            }
        }

        let nw = centroid([p[0][0], p[0][1], p[1][1], p[1][0]]);
        let sw = centroid([p[0][1], p[0][2], p[1][2], p[1][1]]);
        let se = centroid([p[1][1], p[1][2], p[2][2], p[2][1]]);
        let ne = centroid([p[1][0], p[1][1], p[2][1], p[2][0]]);
        let polygon = vec![nw, sw, se, ne];

        polygon
            .iter()
            .all(|v| v[0].is_finite() && v[1].is_finite())
            .then_some(polygon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centroid() {
        assert_eq!(
            centroid([[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0]]),
            [1.0, 1.0]
        );
    }

    #[test]
    fn test_neighbour_index_orderings() {
        let xy = Neighbourhood {
            x_size: 6,
            y_size: 5,
            xy_physical: true,
            longitude_wrap: false,
        };
        // (i, j) = (2, 3): centre at row 3, column 2
        assert_eq!(xy.index(2, 3, 1, 1), 3 * 6 + 2);
        assert_eq!(xy.index(2, 3, 0, 0), 2 * 6 + 1);

        let yx = Neighbourhood {
            xy_physical: false,
            ..xy
        };
        assert_eq!(yx.index(2, 3, 1, 1), 2 * 5 + 3);
    }

    #[test]
    fn test_border_cells_have_no_polygon() {
        let hood = Neighbourhood {
            x_size: 6,
            y_size: 6,
            xy_physical: true,
            longitude_wrap: false,
        };
        let lons: Vec<f64> = (0..36).map(|k| (k % 6) as f64).collect();
        let lats: Vec<f64> = (0..36).map(|k| (k / 6) as f64).collect();
        let identity = |lon: f64, lat: f64| Some((lon, lat));
        let mut cache = ProjectionCache::new(64);

        for (i, j) in [(1, 2), (2, 1), (4, 2), (2, 4)] {
            assert!(hood
                .polygon(i, j, &lons, &lats, None, &identity, &mut cache)
                .is_none());
        }
        let poly = hood
            .polygon(2, 2, &lons, &lats, None, &identity, &mut cache)
            .unwrap();
        assert_eq!(poly, vec![[1.5, 1.5], [1.5, 2.5], [2.5, 2.5], [2.5, 1.5]]);
    }
}
