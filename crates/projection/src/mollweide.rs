//! Mollweide equal-area projection on the unit sphere.
//!
//! Forward: solve `2θ + sin 2θ = π sin φ` by Newton-Raphson, then
//! `x = (2√2/π) λ cos θ`, `y = √2 sin θ`. The full map spans
//! `x ∈ [-2√2, 2√2]`, `y ∈ [-√2, √2]`.

use std::f64::consts::{PI, SQRT_2};

use crate::{finite, Projection};

const MAX_ITERATIONS: usize = 500;
const EPSILON: f64 = 1e-10;

#[derive(Debug, Clone, Copy, Default)]
pub struct Mollweide {
    /// Central meridian in degrees
    pub central_meridian: f64,
}

impl Mollweide {
    pub fn new(central_meridian: f64) -> Self {
        Self { central_meridian }
    }

    /// Map a pixel in a `width`×`height` image of the whole map back to
    /// `(lon, lat)` degrees. Longitudes are returned in [0, 360].
    ///
    /// Returns `None` outside the projected ellipse.
    pub fn inverse_pixel(&self, px: f64, py: f64, width: f64, height: f64) -> Option<(f64, f64)> {
        let x = px - width / 2.0;
        let y = height / 2.0 - py;
        let r = width / (4.0 * SQRT_2);

        if y.abs() > SQRT_2 * r || x.abs() > 2.0 * SQRT_2 * r {
            return None;
        }

        // theta here is the full auxiliary angle (2θ in the forward formula)
        let theta = 2.0 * (y / (SQRT_2 * r)).asin();
        let lat = ((theta + theta.sin()) / PI).asin();
        let half_cos = (theta / 2.0).cos();
        if half_cos.abs() < EPSILON {
            return None;
        }
        let lambda = PI * x / (2.0 * r * SQRT_2 * half_cos);

        let mut lon = lambda.to_degrees() + self.central_meridian;
        while lon < 0.0 {
            lon += 360.0;
        }
        while lon > 360.0 {
            lon -= 360.0;
        }
        finite(lon, lat.to_degrees())
    }

    /// Whether a pixel of a `width`×`height` image lies inside the ellipse.
    pub fn contains_pixel(px: f64, py: f64, width: f64, height: f64) -> bool {
        let x = px - width / 2.0;
        let y = height / 2.0 - py;
        let r = width / (4.0 * SQRT_2);
        let nx = x / (2.0 * SQRT_2 * r);
        let ny = y / (SQRT_2 * r);
        nx * nx + ny * ny <= 1.0
    }
}

impl Projection for Mollweide {
    fn project(&self, lon: f64, lat: f64) -> Option<(f64, f64)> {
        let lon = if lon > 180.0 { lon - 360.0 } else { lon };
        let mut lambda = (lon - self.central_meridian).to_radians();
        while lambda > PI {
            lambda -= 2.0 * PI;
        }
        while lambda < -PI {
            lambda += 2.0 * PI;
        }

        let phi = lat.to_radians();
        let target = PI * phi.sin();
        let mut theta = phi;
        for _ in 0..MAX_ITERATIONS {
            let denom = 1.0 + theta.cos();
            // Converged onto a pole
            if denom.abs() < EPSILON {
                break;
            }
            let next = theta - (theta + theta.sin() - target) / denom;
            let done = (next - theta).abs() < EPSILON;
            theta = next;
            if done {
                break;
            }
        }

        let x = 2.0 * SQRT_2 * lambda * (theta / 2.0).cos() / PI;
        let y = SQRT_2 * (theta / 2.0).sin();
        finite(x, y)
    }
}
