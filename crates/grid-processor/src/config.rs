//! Configuration for the grid processor.

use serde::{Deserialize, Serialize};

/// Configuration for grid and vector construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridProcessorConfig {
    /// Normalize longitudes into [0, 360] and drop cells spanning more than 180°.
    pub longitude_wrap: bool,

    /// Longitude at which cells are omitted to avoid seam artifacts.
    pub meridian_skip: Option<f64>,

    /// Degrees added to vector directions before rendering.
    pub rotation_offset: f64,

    /// Target arrow spacing in pixels when deriving vector grid sizes.
    pub ideal_arrow_size: u32,

    /// Maximum number of memoized projected points.
    pub projection_cache_capacity: usize,
}

impl Default for GridProcessorConfig {
    fn default() -> Self {
        Self {
            longitude_wrap: false,
            meridian_skip: None,
            rotation_offset: 180.0,
            ideal_arrow_size: 24,
            projection_cache_capacity: 1_000_000,
        }
    }
}

impl GridProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("CF_LONGITUDE_WRAP") {
            config.longitude_wrap = val.to_lowercase() == "true" || val == "1";
        }

        if let Ok(val) = std::env::var("CF_MERIDIAN_SKIP") {
            config.meridian_skip = val.parse().ok();
        }

        if let Ok(val) = std::env::var("CF_ROTATION_OFFSET") {
            if let Ok(offset) = val.parse() {
                config.rotation_offset = offset;
            }
        }

        if let Ok(val) = std::env::var("CF_IDEAL_ARROW_SIZE") {
            if let Ok(size) = val.parse() {
                config.ideal_arrow_size = size;
            }
        }

        if let Ok(val) = std::env::var("CF_PROJECTION_CACHE_CAPACITY") {
            if let Ok(capacity) = val.parse() {
                config.projection_cache_capacity = capacity;
            }
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.ideal_arrow_size == 0 {
            return Err("ideal_arrow_size must be > 0".to_string());
        }

        if self.projection_cache_capacity == 0 {
            return Err("projection_cache_capacity must be > 0".to_string());
        }

        if let Some(skip) = self.meridian_skip {
            if !skip.is_finite() {
                return Err("meridian_skip must be finite".to_string());
            }
        }

        Ok(())
    }

    /// Vector grid cells across an image of `width` pixels.
    pub fn vector_grid_size(&self, width: u32) -> usize {
        width.div_ceil(self.ideal_arrow_size.max(1)) as usize
    }
}
