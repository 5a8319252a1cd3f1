//! Coordinate reference system transformations.
//!
//! Implements map projections from scratch without external dependencies.
//! Every projection maps geographic degrees `(lon, lat)` to planar `(x, y)`
//! and must be pure: the same input always yields the same output, which is
//! what allows results to be memoized across grid builds.

use std::sync::Arc;

pub mod geographic;
pub mod mercator;
pub mod mollweide;

pub use geographic::Geographic;
pub use mercator::WebMercator;
pub use mollweide::Mollweide;

/// A forward map projection.
///
/// Returns `None` where the projection is undefined (off the visible disc,
/// singular points, non-finite input).
pub trait Projection: Send + Sync {
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)>;
}

impl<F> Projection for F
where
    F: Fn(f64, f64) -> Option<(f64, f64)> + Send + Sync,
{
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        self(lon, lat)
    }
}

/// Shared, thread-safe projection handle.
pub type SharedProjection = Arc<dyn Projection>;

/// Reject non-finite projected coordinates.
pub(crate) fn finite(x: f64, y: f64) -> Option<(f64, f64)> {
    (x.is_finite() && y.is_finite()).then_some((x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_projection() {
        let shift = |lon: f64, lat: f64| Some((lon + 1.0, lat - 1.0));
        assert_eq!(shift.project(10.0, 20.0), Some((11.0, 19.0)));

        let shared: SharedProjection = Arc::new(shift);
        assert_eq!(shared.project(0.0, 0.0), Some((1.0, -1.0)));
    }
}
