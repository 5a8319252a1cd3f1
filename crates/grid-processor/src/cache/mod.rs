//! Caches shared across grid and vector builds of one dataset + projection.

mod extent_cache;
mod projection_cache;

pub use extent_cache::ExtentCache;
pub use projection_cache::{PointKey, ProjectionCache};
