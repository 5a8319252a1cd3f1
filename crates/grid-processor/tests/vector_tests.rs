//! Vector field resampling against synthetic wind datasets.

use std::sync::Arc;

use grid_processor::{
    CfDataset, DimensionFilter, GridProcessorConfig, RenderSession, VectorFieldBuilder, VectorMode,
};
use projection::{Geographic, SharedProjection, WebMercator};
use test_utils::{fixtures, init_test_tracing};

fn dataset(bytes: Vec<u8>) -> CfDataset {
    CfDataset::from_bytes(bytes, &GridProcessorConfig::default()).unwrap()
}

fn identity() -> SharedProjection {
    Arc::new(Geographic)
}

// ============================================================================
// Bucketing
// ============================================================================

#[test]
fn test_one_sample_per_bucket() {
    init_test_tracing();
    // 5×5 samples at -40..40 step 20; extent -50..50
    let ds = dataset(fixtures::wind_grid(5, 5, 3.0, 4.0));
    let mut session = RenderSession::default();
    let field = VectorFieldBuilder::new(&ds, identity())
        .build("u", "v", &DimensionFilter::new(), 4, 4, &mut session)
        .unwrap();

    assert_eq!(field.buckets.len(), 5);
    assert!(field.buckets.iter().all(|column| column.len() == 5));
    assert_eq!(field.sample_count(), 25);
    assert_eq!(field.extent.min, [-50.0, -50.0]);
    assert_eq!(field.extent.max, [50.0, 50.0]);

    for x in 0..5 {
        for y in 0..5 {
            assert_eq!(field.bucket(x, y).unwrap().len(), 1, "bucket ({}, {})", x, y);
        }
    }

    // Top-left bucket holds the north-west sample
    let nw = field.bucket(0, 0).unwrap()[0];
    assert_eq!((nw.px, nw.py), (10.0, 10.0));

    for aggregate in field.aggregate(false).into_iter().flatten() {
        let aggregate = aggregate.unwrap();
        assert_eq!(aggregate.count, 1);
        assert!((aggregate.magnitude - 5.0).abs() < 1e-9);
        assert!((aggregate.angle - 53.130_102_354_155_98).abs() < 1e-9);
        assert!((aggregate.render_angle.unwrap() - 36.869_897_645_844_02).abs() < 1e-9);
        assert!(aggregate.angular_change.is_none());
    }
}

#[test]
fn test_coarse_grid_merges_samples() {
    let ds = dataset(fixtures::wind_grid(5, 5, 3.0, 4.0));
    let mut session = RenderSession::default();
    let field = VectorFieldBuilder::new(&ds, identity())
        .build("u", "v", &DimensionFilter::new(), 2, 2, &mut session)
        .unwrap();

    assert_eq!(field.sample_count(), 25);
    assert_eq!(field.bucket(1, 1).unwrap().len(), 9);
    assert_eq!(field.bucket(0, 0).unwrap().len(), 1);
    assert_eq!(field.bucket(2, 1).unwrap().len(), 3);

    let aggregates = field.aggregate(true);
    let centre = aggregates[1][1].unwrap();
    assert_eq!(centre.count, 9);
    assert!((centre.u - 3.0).abs() < 1e-9);
    assert!((centre.v - 4.0).abs() < 1e-9);
    // Uniform flow does not turn
    assert!(centre.angular_change.unwrap().abs() < 1e-9);
}

#[test]
fn test_zero_grid_size_rejected() {
    let ds = dataset(fixtures::wind_grid(3, 3, 1.0, 1.0));
    let mut session = RenderSession::default();
    let err = VectorFieldBuilder::new(&ds, identity())
        .build("u", "v", &DimensionFilter::new(), 0, 4, &mut session)
        .unwrap_err();
    assert!(err.is_validation());
}

// ============================================================================
// Modes and angles
// ============================================================================

#[test]
fn test_magnitude_direction_mode() {
    // Magnitude 10 from the east
    let ds = dataset(fixtures::wind_grid(3, 3, 10.0, 90.0));
    let mut session = RenderSession::default();
    let field = VectorFieldBuilder::new(&ds, identity())
        .mode(VectorMode::MagnitudeDirection)
        .rotation_offset(0.0)
        .build("u", "v", &DimensionFilter::new(), 2, 2, &mut session)
        .unwrap();

    assert_eq!(field.mode, VectorMode::MagnitudeDirection);
    for sample in field.buckets.iter().flatten().flatten() {
        assert!((sample.u + 10.0).abs() < 1e-9);
        assert!(sample.v.abs() < 1e-9);
        assert!((sample.render_angle - 90.0).abs() < 1e-9);
    }
}

#[test]
fn test_rotation_offset_from_config() {
    let ds = dataset(fixtures::wind_grid(3, 3, 0.0, 5.0));
    let config = GridProcessorConfig {
        rotation_offset: 10.0,
        ..Default::default()
    };
    let mut session = RenderSession::new(&config);
    let field = VectorFieldBuilder::new(&ds, identity())
        .with_config(&config)
        .build("u", "v", &DimensionFilter::new(), 2, 2, &mut session)
        .unwrap();

    // Southerly wind: direction 180
    let sample = field.bucket(0, 0).unwrap()[0];
    assert!((sample.render_angle - 190.0).abs() < 1e-9);
}

#[test]
fn test_non_orthogonal_angles_are_finite() {
    let ds = dataset(fixtures::wind_grid(5, 5, 3.0, 4.0));
    let mut session = RenderSession::default();
    let field = VectorFieldBuilder::new(&ds, Arc::new(WebMercator::default()))
        .non_orthogonal(true)
        .build("u", "v", &DimensionFilter::new(), 4, 4, &mut session)
        .unwrap();

    assert_eq!(field.sample_count(), 25);
    assert!(field
        .buckets
        .iter()
        .flatten()
        .flatten()
        .all(|s| s.render_angle.is_finite()));
}

// ============================================================================
// Sources and slices
// ============================================================================

#[test]
fn test_projected_source_samples_every_ordinate() {
    let ds = dataset(fixtures::projected_grid(6, 6, 100.0, -20.0));
    let mut session = RenderSession::default();
    let field = VectorFieldBuilder::new(&ds, identity())
        .build("field", "field", &DimensionFilter::new(), 5, 5, &mut session)
        .unwrap();

    assert_eq!(field.extent.min, [100.0, -20.0]);
    assert_eq!(field.extent.max, [105.0, -15.0]);
    assert_eq!(field.sample_count(), 36);
}

#[test]
fn test_unbound_dimension_rejected() {
    let ds = dataset(fixtures::multi_level_grid());
    let mut session = RenderSession::default();
    let err = VectorFieldBuilder::new(&ds, identity())
        .build("temp", "temp", &DimensionFilter::new(), 4, 4, &mut session)
        .unwrap_err();
    assert!(err.to_string().contains("unbound dimension: level"), "{}", err);
}

#[test]
fn test_extent_reused_across_builds() {
    let ds = dataset(fixtures::wind_grid(5, 5, 3.0, 4.0));
    let mut session = RenderSession::default();
    let builder = VectorFieldBuilder::new(&ds, identity());

    let first = builder
        .build("u", "v", &DimensionFilter::new(), 4, 4, &mut session)
        .unwrap();
    let misses = session.projection_cache().stats().misses;
    let second = builder
        .build("u", "v", &DimensionFilter::new(), 2, 2, &mut session)
        .unwrap();

    assert_eq!(first.extent, second.extent);
    assert_eq!(session.projection_cache().stats().misses, misses);
}

#[test]
fn test_transferable_field_round_trip() {
    let ds = dataset(fixtures::wind_grid(3, 3, 1.0, 0.0));
    let mut session = RenderSession::default();
    let field = VectorFieldBuilder::new(&ds, identity())
        .build("u", "v", &DimensionFilter::new(), 2, 2, &mut session)
        .unwrap()
        .into_transferable();
    assert!(field.projection().is_none());

    let json = serde_json::to_string(&field).unwrap();
    let received: grid_processor::VectorField = serde_json::from_str(&json).unwrap();
    assert_eq!(received.sample_count(), 9);
    assert!(received.with_projection(identity()).projection().is_some());
}
