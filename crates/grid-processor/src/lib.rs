//! CF geometry engine for NetCDF-3 datasets.
//!
//! Turns a 2-D slice of a NetCDF variable into renderable geometry under an
//! arbitrary map projection: a grid of value-bearing polygons, or a vector
//! field resampled onto a coarse pixel grid.
//!
//! # Architecture
//!
//! ```text
//! NetCDF bytes
//!      │
//!      ▼
//! CfDataset::from_bytes ──► AxisBindings (X / Y / T, projected source?)
//!      │
//!      ├─► GridBuilder::build(variable, filter, session)
//!      │         │
//!      │         ├─► SliceLayout: validate dims, bind filter, find offset
//!      │         ├─► cleanse values (fill, scale, offset)
//!      │         └─► cell polygons via ProjectionCache
//!      │                   │
//!      │                   ▼
//!      │              DataGrid ──► value_at(lon, lat)
//!      │
//!      └─► VectorFieldBuilder::build(u, v, filter, nx, ny, session)
//!                │
//!                ├─► ExtentCache: projected extent of the dataset
//!                └─► bucket samples into (nx + 1) × (ny + 1) cells
//!                          │
//!                          ▼
//!                     VectorField ──► aggregate()
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use grid_processor::{CfDataset, DimensionFilter, GridBuilder, GridProcessorConfig, RenderSession};
//! use projection::WebMercator;
//!
//! let config = GridProcessorConfig::from_env();
//! let dataset = CfDataset::open("sst.nc", &config)?;
//! let mut session = RenderSession::new(&config);
//!
//! let grid = GridBuilder::new(&dataset, Arc::new(WebMercator::default()))
//!     .meridian_skip(config.meridian_skip)
//!     .build("sst", &DimensionFilter::new(), &mut session)?;
//!
//! let sst = grid.value_at(151.2, -33.9, |v| v.is_nan())?;
//! ```

pub mod axis;
pub mod cache;
pub mod cleanse;
pub mod config;
pub mod dataset;
pub mod error;
pub mod grid;
pub mod query;
pub mod session;
pub mod slice;
pub mod style;
pub mod time;
pub mod types;
pub mod vector;

// Re-export commonly used types at crate root
pub use axis::{search_axis, AxisBinding, AxisBindings, AxisKind};
pub use cache::{ExtentCache, ProjectionCache};
pub use cleanse::{Cleanser, VariableStats};
pub use config::GridProcessorConfig;
pub use dataset::{interpolate_bounds, world_wrap, CfDataset};
pub use error::{GridProcessorError, Result};
pub use grid::{DataGrid, GridBuilder, GridCell, GridRow};
pub use query::point_in_polygon;
pub use session::{build_timeseries, RenderSession, SequenceHandle, TimeSlice, TimeseriesOutcome};
pub use slice::SliceLayout;
pub use style::{
    hex_to_rgb, linear_hex_color, linear_opacity, stepped_hex_color, stepped_opacity, ColorStop,
    OpacityStop, Styled,
};
pub use time::{time_iso_string, time_to_datetime};
pub use types::{
    AxisBounds, BoundsMode, CacheStats, DimensionFilter, Extent, Point, Polygon, XyBbox,
};
pub use vector::{
    magnitude_direction_from_uv, projected_angle, uv_from_magnitude_direction, MdVector,
    UvVector, VectorAggregate, VectorField, VectorFieldBuilder, VectorMode, VectorSample,
};
