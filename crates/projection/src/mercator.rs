//! Spherical (Web) Mercator projection, EPSG:3857.

use std::f64::consts::FRAC_PI_4;

use crate::{finite, Projection};

/// WGS84 semi-major axis used as the sphere radius (meters).
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Latitude at which the Web Mercator square is clipped.
pub const MAX_LATITUDE: f64 = 85.0511287798;

/// Spherical Mercator with latitude clamped to ±[`MAX_LATITUDE`].
#[derive(Debug, Clone, Copy)]
pub struct WebMercator {
    /// Sphere radius in meters
    pub radius: f64,
    /// Clamp latitude in degrees
    pub max_latitude: f64,
}

impl Default for WebMercator {
    fn default() -> Self {
        Self {
            radius: EARTH_RADIUS,
            max_latitude: MAX_LATITUDE,
        }
    }
}

impl WebMercator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Projection for WebMercator {
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let lat = lat.clamp(-self.max_latitude, self.max_latitude);
        let x = self.radius * lon.to_radians();
        let y = self.radius * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
        finite(x, y)
    }
}
