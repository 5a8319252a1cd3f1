//! Validation and addressing of a 2-D slice of a variable.
//!
//! A variable may have any number of leading dimensions, but X and Y must be
//! its two trailing dimensions. Every leading dimension is pinned to one
//! coordinate value by the [`DimensionFilter`], which selects the 2-D slice
//! read by the builders.

use tracing::debug;

use crate::axis::AxisKind;
use crate::dataset::CfDataset;
use crate::error::{GridProcessorError, Result};
use crate::types::DimensionFilter;

/// Where a validated slice lives inside a variable's data.
#[derive(Debug, Clone)]
pub struct SliceLayout {
    pub variable: String,
    pub x_name: String,
    pub y_name: String,
    /// Raw X coordinate values.
    pub x_values: Vec<f64>,
    /// Raw Y coordinate values.
    pub y_values: Vec<f64>,
    /// `true` when X is the slower-varying of the two trailing dimensions.
    pub x_major: bool,
    /// Filter with single-valued dimensions bound.
    pub filter: DimensionFilter,
    /// Index of the slice's first element in the variable's data.
    pub starting_offset: usize,
}

impl SliceLayout {
    /// Validate `variable` against `filter` and locate its slice.
    pub fn prepare(dataset: &CfDataset, variable: &str, filter: &DimensionFilter) -> Result<Self> {
        let header = dataset.header();
        let x_name = dataset.axis(AxisKind::X)?.axis.clone();
        let y_name = dataset.axis(AxisKind::Y)?.axis.clone();

        let x_dim = header.dimension_index(&x_name).ok_or_else(|| {
            GridProcessorError::validation(format!("X axis {} is not a dimension", x_name))
        })?;
        let y_dim = header.dimension_index(&y_name).ok_or_else(|| {
            GridProcessorError::validation(format!("Y axis {} is not a dimension", y_name))
        })?;

        let var = header
            .variable(variable)
            .ok_or_else(|| GridProcessorError::lookup(format!("variable {}", variable)))?;
        let dims = &var.dimensions;

        let x_pos = dims.iter().position(|&d| d == x_dim).ok_or_else(|| {
            GridProcessorError::validation(format!("{} does not use X dimension {}", variable, x_name))
        })?;
        let y_pos = dims.iter().position(|&d| d == y_dim).ok_or_else(|| {
            GridProcessorError::validation(format!("{} does not use Y dimension {}", variable, y_name))
        })?;

        // X and Y must occupy the last two positions
        let n = dims.len();
        if (n - (x_pos + 1)) + (n - (y_pos + 1)) != 1 {
            return Err(GridProcessorError::validation(format!(
                "interlaced data not supported: X and Y must be the trailing dimensions of {}",
                variable
            )));
        }

        let mut resolved = filter.clone();
        let mut starting_offset = 1usize;
        let mut offset_applies = false;

        for (pos, &dim_id) in dims.iter().enumerate() {
            if pos == x_pos || pos == y_pos {
                continue;
            }
            let name = &header
                .dimensions
                .get(dim_id)
                .ok_or_else(|| {
                    GridProcessorError::validation(format!("undefined dimension id {}", dim_id))
                })?
                .name;
            if header.variable(name).is_none() {
                return Err(GridProcessorError::validation(format!(
                    "dimension {} of {} has no coordinate variable",
                    name, variable
                )));
            }
            let coords = dataset.coordinate_data(name)?;

            if !resolved.contains_key(name) && coords.len() == 1 {
                debug!(dimension = %name, value = coords[0], "auto-bound single-valued dimension");
                resolved.insert(name.clone(), coords[0]);
            }

            match resolved.get(name) {
                Some(&value) => {
                    let index = coords.iter().position(|&c| c == value).ok_or_else(|| {
                        GridProcessorError::validation(format!("value not found: {} in {}", value, name))
                    })?;
                    if index > 0 {
                        starting_offset = starting_offset.saturating_mul(index);
                        offset_applies = true;
                    }
                }
                None if !coords.is_empty() => {
                    return Err(GridProcessorError::validation(format!(
                        "unbound dimension: {}",
                        name
                    )));
                }
                None => {}
            }
        }

        let x_values = dataset.coordinate_data(&x_name)?;
        let y_values = dataset.coordinate_data(&y_name)?;
        let grid_size = x_values.len() * y_values.len();
        let starting_offset = if offset_applies {
            grid_size.saturating_mul(starting_offset)
        } else {
            0
        };

        Ok(Self {
            variable: variable.to_string(),
            x_major: dims.last() == Some(&y_dim),
            x_name,
            y_name,
            x_values,
            y_values,
            filter: resolved,
            starting_offset,
        })
    }

    pub fn x_size(&self) -> usize {
        self.x_values.len()
    }

    pub fn y_size(&self) -> usize {
        self.y_values.len()
    }

    pub fn grid_size(&self) -> usize {
        self.x_size() * self.y_size()
    }

    /// Slice-local `(i, j)` grid positions in data order.
    pub fn positions(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let (xs, ys) = (self.x_size(), self.y_size());
        let x_major = self.x_major;
        (0..xs * ys).map(move |k| if x_major { (k / ys, k % ys) } else { (k % xs, k / xs) })
    }
}
