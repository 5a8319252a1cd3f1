//! Identity (plate carrée in degrees) projection.

use crate::{finite, Projection};

/// Passes geographic coordinates through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Geographic;

impl Projection for Geographic {
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        finite(lon, lat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        assert_eq!(Geographic.project(-75.5, 40.25), Some((-75.5, 40.25)));
        assert_eq!(Geographic.project(f64::NAN, 0.0), None);
    }
}
