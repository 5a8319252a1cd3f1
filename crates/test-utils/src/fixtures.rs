//! Canned CF-convention datasets.
//!
//! Each fixture returns the raw bytes of a small NetCDF-3 file describing a
//! common layout: a plain lat/lon grid, a grid with fill values, a record
//! (time) dimension, competing axis candidates, and a projected source with
//! 2-D longitude/latitude ordinates.

use crate::generators::{linspace, sequential_values, Netcdf3Builder, Values};

/// Longitudes of the basic grid.
pub const GRID_LONS: [f64; 4] = [0.0, 10.0, 20.0, 30.0];
/// Latitudes of the basic grid.
pub const GRID_LATS: [f64; 3] = [-10.0, 0.0, 10.0];
/// Fill value used by [`grid_with_fill`].
pub const FILL_VALUE: f32 = -999.0;

fn lat_lon_axes() -> Netcdf3Builder {
    Netcdf3Builder::new()
        .dimension("lat", GRID_LATS.len())
        .dimension("lon", GRID_LONS.len())
        .variable("lat", &["lat"], Values::Double(GRID_LATS.to_vec()))
        .attribute("lat", "standard_name", Values::text("latitude"))
        .attribute("lat", "units", Values::text("degrees_north"))
        .variable("lon", &["lon"], Values::Double(GRID_LONS.to_vec()))
        .attribute("lon", "standard_name", Values::text("longitude"))
        .attribute("lon", "units", Values::text("degrees_east"))
}

/// `temp(lat, lon)` float with values `0..12` in row-major order.
pub fn basic_grid() -> Vec<u8> {
    lat_lon_axes()
        .variable("temp", &["lat", "lon"], Values::Float(sequential_values(12)))
        .attribute("temp", "units", Values::text("K"))
        .build()
}

/// [`basic_grid`] with the raw value at `fill_index` set to `_FillValue`.
pub fn grid_with_fill(fill_index: usize) -> Vec<u8> {
    let mut values = sequential_values(12);
    values[fill_index] = FILL_VALUE;
    lat_lon_axes()
        .variable("temp", &["lat", "lon"], Values::Float(values))
        .attribute("temp", "_FillValue", Values::Float(vec![FILL_VALUE]))
        .build()
}

/// Packed `short` data with `scale_factor = 0.5` and `add_offset = 100`.
pub fn packed_grid() -> Vec<u8> {
    let raw: Vec<i16> = (0..12).collect();
    lat_lon_axes()
        .variable("pressure", &["lat", "lon"], Values::Short(raw))
        .attribute("pressure", "missing_value", Values::Short(vec![5]))
        .attribute("pressure", "scale_factor", Values::Float(vec![0.5]))
        .attribute("pressure", "add_offset", Values::Float(vec![100.0]))
        .build()
}

/// `temp(lon, lat)`: spatial dimensions stored X-major.
pub fn x_major_grid() -> Vec<u8> {
    lat_lon_axes()
        .variable("temp", &["lon", "lat"], Values::Float(sequential_values(12)))
        .build()
}

/// Two X candidates: `lon_a` (standard_name) declared before `lon_b` (axis=X).
pub fn competing_x_axes() -> Vec<u8> {
    Netcdf3Builder::new()
        .dimension("lon_a", 2)
        .dimension("lon_b", 2)
        .dimension("lat", 2)
        .variable("lon_a", &["lon_a"], Values::Double(vec![0.0, 1.0]))
        .attribute("lon_a", "standard_name", Values::text("longitude"))
        .variable("lon_b", &["lon_b"], Values::Double(vec![5.0, 6.0]))
        .attribute("lon_b", "axis", Values::text("X"))
        .variable("lat", &["lat"], Values::Double(vec![0.0, 1.0]))
        .attribute("lat", "axis", Values::text("Y"))
        .build()
}

/// `temp(level, lat, lon)` with a two-valued `level` coordinate.
pub fn multi_level_grid() -> Vec<u8> {
    Netcdf3Builder::new()
        .dimension("level", 2)
        .dimension("lat", GRID_LATS.len())
        .dimension("lon", GRID_LONS.len())
        .variable("level", &["level"], Values::Float(vec![850.0, 500.0]))
        .attribute("level", "units", Values::text("hPa"))
        .variable("lat", &["lat"], Values::Double(GRID_LATS.to_vec()))
        .attribute("lat", "axis", Values::text("Y"))
        .variable("lon", &["lon"], Values::Double(GRID_LONS.to_vec()))
        .attribute("lon", "axis", Values::text("X"))
        .variable("temp", &["level", "lat", "lon"], Values::Float(sequential_values(24)))
        .build()
}

/// Record dataset: `temp(time, lat, lon)` over three hourly records.
pub fn timeseries_grid() -> Vec<u8> {
    let lats = GRID_LATS.len();
    let lons = GRID_LONS.len();
    lat_lon_axes()
        .unlimited("time", 3)
        .variable("time", &["time"], Values::Double(vec![0.0, 1.0, 2.0]))
        .attribute("time", "axis", Values::text("T"))
        .attribute("time", "units", Values::text("hours since 2024-01-01 00:00:00"))
        .variable(
            "temp",
            &["time", "lat", "lon"],
            Values::Float(sequential_values(3 * lats * lons)),
        )
        .build()
}

/// Wind components `u(lat, lon)` and `v(lat, lon)` on an evenly spaced grid.
pub fn wind_grid(width: usize, height: usize, u: f32, v: f32) -> Vec<u8> {
    Netcdf3Builder::new()
        .dimension("lat", height)
        .dimension("lon", width)
        .variable("lat", &["lat"], Values::Double(linspace(-40.0, 80.0 / (height.max(2) - 1) as f64, height)))
        .attribute("lat", "standard_name", Values::text("latitude"))
        .variable("lon", &["lon"], Values::Double(linspace(-40.0, 80.0 / (width.max(2) - 1) as f64, width)))
        .attribute("lon", "standard_name", Values::text("longitude"))
        .variable("u", &["lat", "lon"], Values::Float(vec![u; width * height]))
        .variable("v", &["lat", "lon"], Values::Float(vec![v; width * height]))
        .build()
}

/// Projected source: index axes `x`/`y` with 2-D `lon(y, x)`/`lat(y, x)`
/// ordinates spaced one degree apart starting at (`lon0`, `lat0`).
pub fn projected_grid(nx: usize, ny: usize, lon0: f64, lat0: f64) -> Vec<u8> {
    let mut lons = Vec::with_capacity(nx * ny);
    let mut lats = Vec::with_capacity(nx * ny);
    for y in 0..ny {
        for x in 0..nx {
            lons.push(lon0 + x as f64);
            lats.push(lat0 + y as f64);
        }
    }
    Netcdf3Builder::new()
        .dimension("y", ny)
        .dimension("x", nx)
        .variable("x", &["x"], Values::Double(linspace(0.0, 1000.0, nx)))
        .attribute("x", "standard_name", Values::text("projection_x_coordinate"))
        .variable("y", &["y"], Values::Double(linspace(0.0, 1000.0, ny)))
        .attribute("y", "standard_name", Values::text("projection_y_coordinate"))
        .variable("lon", &["y", "x"], Values::Double(lons))
        .attribute("lon", "standard_name", Values::text("longitude"))
        .variable("lat", &["y", "x"], Values::Double(lats))
        .attribute("lat", "standard_name", Values::text("latitude"))
        .variable("field", &["y", "x"], Values::Float(sequential_values(nx * ny)))
        .build()
}

/// `temp(lat, lon)` on a 2×2 grid (`lon = [0, 10]`) whose `lon` axis names a
/// one-dimensional `lon_bnds` variable holding `lon_bounds` verbatim.
pub fn grid_with_lon_bounds(lon_bounds: Vec<f64>) -> Vec<u8> {
    Netcdf3Builder::new()
        .dimension("lat", 2)
        .dimension("lon", 2)
        .dimension("nb", lon_bounds.len())
        .variable("lat", &["lat"], Values::Double(vec![0.0, 10.0]))
        .attribute("lat", "axis", Values::text("Y"))
        .variable("lon", &["lon"], Values::Double(vec![0.0, 10.0]))
        .attribute("lon", "axis", Values::text("X"))
        .attribute("lon", "bounds", Values::text("lon_bnds"))
        .variable("lon_bnds", &["nb"], Values::Double(lon_bounds))
        .variable("temp", &["lat", "lon"], Values::Float(sequential_values(4)))
        .build()
}

/// Two cells on one row whose definitive longitude bounds overlap on
/// `[0, 10]`: cell 0 spans `[-10, 10]`, cell 1 spans `[0, 20]`. Both span
/// latitudes `[-5, 5]`. Values equal to [`FILL_VALUE`] are missing.
pub fn overlapping_cells(first: f32, second: f32) -> Vec<u8> {
    Netcdf3Builder::new()
        .dimension("lat", 1)
        .dimension("lon", 2)
        .dimension("nv", 2)
        .variable("lat", &["lat"], Values::Double(vec![0.0]))
        .attribute("lat", "axis", Values::text("Y"))
        .attribute("lat", "bounds", Values::text("lat_bnds"))
        .variable("lon", &["lon"], Values::Double(vec![0.0, 10.0]))
        .attribute("lon", "axis", Values::text("X"))
        .attribute("lon", "bounds", Values::text("lon_bnds"))
        .variable("lat_bnds", &["lat", "nv"], Values::Double(vec![-5.0, 5.0]))
        .variable("lon_bnds", &["lon", "nv"], Values::Double(vec![-10.0, 10.0, 0.0, 20.0]))
        .variable("temp", &["lat", "lon"], Values::Float(vec![first, second]))
        .attribute("temp", "_FillValue", Values::Float(vec![FILL_VALUE]))
        .build()
}
