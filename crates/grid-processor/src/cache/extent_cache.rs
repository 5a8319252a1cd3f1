//! Memo of a dataset's projected extent.

use crate::error::Result;
use crate::types::Extent;

/// Holds the projected extent of a dataset once computed.
///
/// The extent covers the full coordinate range, so it does not depend on the
/// dimension filter and stays valid for every slice of the dataset.
#[derive(Debug, Clone, Default)]
pub struct ExtentCache {
    extent: Option<Extent>,
}

impl ExtentCache {
    pub fn get(&self) -> Option<Extent> {
        self.extent
    }

    pub fn set(&mut self, extent: Extent) {
        self.extent = Some(extent);
    }

    pub fn clear(&mut self) {
        self.extent = None;
    }

    /// Return the cached extent, computing and storing it on first use.
    ///
    /// A failed computation leaves the cache empty.
    pub fn get_or_compute<F>(&mut self, compute: F) -> Result<Extent>
    where
        F: FnOnce() -> Result<Extent>,
    {
        if let Some(extent) = self.extent {
            return Ok(extent);
        }
        let extent = compute()?;
        self.extent = Some(extent);
        Ok(extent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GridProcessorError;

    #[test]
    fn test_computes_once() {
        let mut cache = ExtentCache::default();
        let mut calls = 0;
        for _ in 0..3 {
            let extent = cache
                .get_or_compute(|| {
                    calls += 1;
                    Ok(Extent::new([0.0, 0.0], [1.0, 1.0]))
                })
                .unwrap();
            assert_eq!(extent.max, [1.0, 1.0]);
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_failure_not_cached() {
        let mut cache = ExtentCache::default();
        let err = cache
            .get_or_compute(|| Err(GridProcessorError::projection("nothing projected")))
            .unwrap_err();
        assert!(matches!(err, GridProcessorError::Projection(_)));
        assert!(cache.get().is_none());
    }
}
