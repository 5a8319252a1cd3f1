//! Point lookup against a built grid.

use crate::error::Result;
use crate::grid::{DataGrid, GridCell};
use crate::types::Point;

/// Even-odd ray casting test.
pub fn point_in_polygon(polygon: &[Point], [px, py]: Point) -> bool {
    let mut inside = false;
    let mut j = polygon.len().wrapping_sub(1);
    for (i, &[xi, yi]) in polygon.iter().enumerate() {
        let [xj, yj] = polygon[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

impl DataGrid {
    /// First cell whose polygon contains the projected `(lon, lat)`.
    ///
    /// Scans every cell; cells without a polygon never match.
    pub fn cell_containing(&self, lon: f64, lat: f64) -> Result<Option<&GridCell>> {
        self.find_containing(lon, lat, |_| true)
    }

    /// Value of the first cell containing `(lon, lat)` whose value is present
    /// and not rejected by `omit`. Overlapping cells are tried in order.
    pub fn value_at<F>(&self, lon: f64, lat: f64, omit: F) -> Result<Option<f64>>
    where
        F: Fn(f64) -> bool,
    {
        let cell = self.find_containing(lon, lat, |cell| cell.value.is_some_and(|v| !omit(v)))?;
        Ok(cell.and_then(|c| c.value))
    }

    fn find_containing<P>(&self, lon: f64, lat: f64, accept: P) -> Result<Option<&GridCell>>
    where
        P: Fn(&GridCell) -> bool,
    {
        let projection = self.require_projection()?;
        let lon = crate::dataset::world_wrap(lon, self.longitude_wrap);
        let Some((x, y)) = projection.project(lon, lat) else {
            return Ok(None);
        };
        Ok(self.cells().find(|cell| {
            cell.polygon
                .as_deref()
                .is_some_and(|poly| point_in_polygon(poly, [x, y]))
                && accept(cell)
        }))
    }
}
