//! Render sessions and cooperative timeseries builds.
//!
//! A [`RenderSession`] carries everything that outlives a single build for
//! one dataset + projection pair: the projection memo, the projected extent
//! and a generation counter used to cancel stale timeseries sequences.
//! Discard the session when the projection or dataset changes.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use projection::Projection;
use tracing::{debug, info};

use crate::axis::AxisKind;
use crate::cache::{ExtentCache, ProjectionCache};
use crate::config::GridProcessorConfig;
use crate::dataset::CfDataset;
use crate::error::{GridProcessorError, Result};
use crate::grid::{DataGrid, GridBuilder};
use crate::time::time_iso_string;
use crate::types::{DimensionFilter, Extent};

/// Shared generation counter.
///
/// Starting a sequence takes a new generation; any later `begin` or
/// `cancel` through a clone of the handle makes it stale.
#[derive(Debug, Clone, Default)]
pub struct SequenceHandle {
    generation: Arc<AtomicU64>,
}

impl SequenceHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Start a new sequence, invalidating all earlier ones.
    pub fn begin(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Invalidate every running sequence.
    pub fn cancel(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.current() == generation
    }
}

/// Caches and sequence state reused across builds.
pub struct RenderSession {
    projection_cache: ProjectionCache,
    extent_cache: ExtentCache,
    sequence: SequenceHandle,
}

impl RenderSession {
    pub fn new(config: &GridProcessorConfig) -> Self {
        Self {
            projection_cache: ProjectionCache::new(config.projection_cache_capacity),
            extent_cache: ExtentCache::default(),
            sequence: SequenceHandle::new(),
        }
    }

    /// Validate `config` before creating the session.
    pub fn try_new(config: &GridProcessorConfig) -> Result<Self> {
        config.validate().map_err(GridProcessorError::Config)?;
        Ok(Self::new(config))
    }

    pub fn projection_cache(&self) -> &ProjectionCache {
        &self.projection_cache
    }

    pub fn projection_cache_mut(&mut self) -> &mut ProjectionCache {
        &mut self.projection_cache
    }

    pub fn extent_cache(&self) -> &ExtentCache {
        &self.extent_cache
    }

    /// A handle sharing this session's generation counter.
    pub fn sequence(&self) -> SequenceHandle {
        self.sequence.clone()
    }

    /// The dataset's projected extent, computed on first use.
    pub fn extent(&mut self, dataset: &CfDataset, projection: &dyn Projection) -> Result<Extent> {
        if self.extent_cache.get().is_some() {
            debug!("extent cache hit");
        }
        let cache = &mut self.projection_cache;
        self.extent_cache
            .get_or_compute(|| dataset.find_extent(projection, cache))
    }

    /// Forget cached projections and extent.
    pub fn clear(&mut self) {
        self.projection_cache.clear();
        self.extent_cache.clear();
    }
}

impl Default for RenderSession {
    fn default() -> Self {
        Self::new(&GridProcessorConfig::default())
    }
}

/// One built time step.
#[derive(Debug, Clone)]
pub struct TimeSlice {
    pub index: usize,
    pub time_value: f64,
    pub time_iso: String,
    pub grid: DataGrid,
}

/// How a timeseries build ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeseriesOutcome {
    Completed { slices: usize },
    /// A newer sequence started before step `at` was built.
    Cancelled { at: usize },
}

/// Build one grid per value of the T axis, handing each to `on_slice`.
///
/// The loop yields to the runtime between steps and stops as soon as its
/// sequence is no longer current. A step that has started always finishes.
pub async fn build_timeseries<F>(
    builder: &GridBuilder<'_>,
    variable: &str,
    filter: &DimensionFilter,
    session: &mut RenderSession,
    mut on_slice: F,
) -> Result<TimeseriesOutcome>
where
    F: FnMut(TimeSlice),
{
    let dataset = builder.dataset();
    let t_name = dataset.axis(AxisKind::T)?.axis.clone();
    let units = dataset.units(&t_name)?.unwrap_or_default().to_string();
    let times = dataset.time_values()?;

    let sequence = session.sequence();
    let generation = sequence.begin();

    for (index, &time_value) in times.iter().enumerate() {
        if !sequence.is_current(generation) {
            info!(variable, generation, at = index, "timeseries cancelled");
            return Ok(TimeseriesOutcome::Cancelled { at: index });
        }

        let mut step_filter = filter.clone();
        step_filter.insert(t_name.clone(), time_value);
        let grid = builder.build(variable, &step_filter, session)?;
        on_slice(TimeSlice {
            index,
            time_value,
            time_iso: time_iso_string(time_value, &units),
            grid,
        });

        tokio::task::yield_now().await;
    }

    debug!(variable, slices = times.len(), "timeseries complete");
    Ok(TimeseriesOutcome::Completed {
        slices: times.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sequence_handle() {
        let handle = SequenceHandle::new();
        let first = handle.begin();
        assert!(handle.is_current(first));

        let other = handle.clone();
        let second = other.begin();
        assert!(!handle.is_current(first));
        assert!(handle.is_current(second));

        other.cancel();
        assert!(!handle.is_current(second));
    }

    #[test]
    fn test_try_new_rejects_invalid_config() {
        let config = GridProcessorConfig {
            ideal_arrow_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            RenderSession::try_new(&config),
            Err(GridProcessorError::Config(_))
        ));
        assert!(RenderSession::try_new(&GridProcessorConfig::default()).is_ok());
    }
}
