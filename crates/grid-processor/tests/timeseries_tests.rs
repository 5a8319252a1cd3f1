//! Time-stepped grid builds over a record dimension.

use std::sync::Arc;

use grid_processor::{
    build_timeseries, CfDataset, DimensionFilter, GridBuilder, GridProcessorConfig, RenderSession,
    TimeSlice, TimeseriesOutcome,
};
use projection::Geographic;
use test_utils::{fixtures, init_test_tracing};

fn dataset() -> CfDataset {
    CfDataset::from_bytes(fixtures::timeseries_grid(), &GridProcessorConfig::default()).unwrap()
}

#[tokio::test]
async fn test_builds_every_time_step() {
    init_test_tracing();
    let ds = dataset();
    let builder = GridBuilder::new(&ds, Arc::new(Geographic));
    let mut session = RenderSession::default();

    let mut slices: Vec<TimeSlice> = Vec::new();
    let outcome = build_timeseries(&builder, "temp", &DimensionFilter::new(), &mut session, |s| {
        slices.push(s)
    })
    .await
    .unwrap();

    assert_eq!(outcome, TimeseriesOutcome::Completed { slices: 3 });
    assert_eq!(slices.len(), 3);
    for (k, slice) in slices.iter().enumerate() {
        assert_eq!(slice.index, k);
        assert_eq!(slice.time_value, k as f64);
        assert_eq!(slice.time_iso, format!("2024-01-01T0{}:00:00.000Z", k));
        assert_eq!(slice.grid.cell_at(0, 0).unwrap().value, Some((12 * k) as f64));
        assert_eq!(slice.grid.filter.get("time"), Some(&(k as f64)));
    }
}

#[tokio::test]
async fn test_newer_sequence_cancels_build() {
    let ds = dataset();
    let builder = GridBuilder::new(&ds, Arc::new(Geographic));
    let mut session = RenderSession::default();
    let handle = session.sequence();

    let mut built = 0;
    let outcome = build_timeseries(&builder, "temp", &DimensionFilter::new(), &mut session, |_| {
        built += 1;
        handle.begin();
    })
    .await
    .unwrap();

    assert_eq!(outcome, TimeseriesOutcome::Cancelled { at: 1 });
    assert_eq!(built, 1);
}

#[tokio::test]
async fn test_missing_time_axis_fails() {
    let ds = CfDataset::from_bytes(fixtures::basic_grid(), &GridProcessorConfig::default()).unwrap();
    let builder = GridBuilder::new(&ds, Arc::new(Geographic));
    let mut session = RenderSession::default();

    let err = build_timeseries(&builder, "temp", &DimensionFilter::new(), &mut session, |_| {})
        .await
        .unwrap_err();
    assert!(err.is_validation());
}

#[tokio::test]
async fn test_sequences_across_tasks() {
    let session = RenderSession::default();
    let handle = session.sequence();
    let generation = handle.begin();

    let remote = handle.clone();
    tokio::spawn(async move {
        remote.cancel();
    })
    .await
    .unwrap();

    assert!(!handle.is_current(generation));
}
