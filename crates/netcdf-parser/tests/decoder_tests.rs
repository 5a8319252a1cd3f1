//! Integration tests for NetCDF-3 decoding against synthetic files.

use netcdf_parser::{
    AttributeValue, DecoderOptions, NcType, NetCdfError, NetCdfFile, VariableData,
};
use test_utils::{fixtures, Netcdf3Builder, Values};

// ============================================================================
// Header tests
// ============================================================================

#[test]
fn test_basic_grid_header() {
    let file = NetCdfFile::from_bytes(fixtures::basic_grid()).unwrap();
    assert_eq!(file.version(), 1);
    assert!(file.record_dimension().is_none());

    let dims: Vec<(&str, usize)> = file
        .dimensions()
        .iter()
        .map(|d| (d.name.as_str(), d.size))
        .collect();
    assert_eq!(dims, vec![("lat", 3), ("lon", 4)]);

    let temp = file.variable("temp").unwrap();
    assert_eq!(temp.nc_type, NcType::Float);
    assert_eq!(temp.dimensions, vec![0, 1]);
    assert!(!temp.is_record);
    assert_eq!(
        temp.attribute("units"),
        Some(&AttributeValue::Text("K".into()))
    );
}

#[test]
fn test_non_record_byte_size_matches_dimensions() {
    let file = NetCdfFile::from_bytes(fixtures::basic_grid()).unwrap();
    let header = file.header();
    for var in header.variables.iter().filter(|v| !v.is_record) {
        let product: usize = var
            .dimensions
            .iter()
            .map(|&id| header.dimensions[id].size)
            .product();
        assert_eq!(
            var.byte_size as usize,
            product * var.nc_type.width(),
            "variable {}",
            var.name
        );
    }
}

#[test]
fn test_global_attributes() {
    let bytes = Netcdf3Builder::new()
        .global_attribute("title", Values::text("synthetic"))
        .global_attribute("version", Values::Int(vec![3, 1]))
        .build();
    let file = NetCdfFile::from_bytes(bytes).unwrap();
    assert_eq!(file.attribute("title").unwrap().as_str(), Some("synthetic"));
    assert_eq!(
        file.attribute("version").unwrap(),
        &AttributeValue::Ints(vec![3, 1])
    );
    assert!(file.attribute_exists("title"));
    assert!(!file.attribute_exists("history"));
}

#[test]
fn test_char_attribute_trailing_nul_trimmed() {
    let bytes = Netcdf3Builder::new()
        .global_attribute("source", Values::text("model\0"))
        .build();
    let file = NetCdfFile::from_bytes(bytes).unwrap();
    assert_eq!(file.attribute("source").unwrap().as_str(), Some("model"));
}

#[test]
fn test_summary_lists_everything() {
    let file = NetCdfFile::from_bytes(fixtures::basic_grid()).unwrap();
    let summary = file.summary();
    assert!(summary.contains("lat"));
    assert!(summary.contains("float temp(lat, lon)"));
    assert!(summary.contains("temp:units = K"));
}

// ============================================================================
// Data tests
// ============================================================================

#[test]
fn test_read_non_record_variable() {
    let file = NetCdfFile::from_bytes(fixtures::basic_grid()).unwrap();
    let temp = file.read_variable("temp").unwrap();
    let expected: Vec<f32> = (0..12).map(|i| i as f32).collect();
    assert_eq!(temp, VariableData::Floats(expected));

    let lon = file.read_variable("lon").unwrap().to_f64_vec();
    assert_eq!(lon, fixtures::GRID_LONS.to_vec());
}

#[test]
fn test_read_record_variables_are_deinterleaved() {
    let file = NetCdfFile::from_bytes(fixtures::timeseries_grid()).unwrap();
    let rec = file.record_dimension().unwrap();
    assert_eq!(rec.name, "time");
    assert_eq!(rec.length, 3);
    // time (8 bytes) + temp (12 floats) per record
    assert_eq!(file.header().record_step, 8 + 48);

    let time = file.read_variable("time").unwrap().to_f64_vec();
    assert_eq!(time, vec![0.0, 1.0, 2.0]);

    let temp = file.read_variable("temp").unwrap().to_f64_vec();
    assert_eq!(temp.len(), 36);
    assert_eq!(temp[12], 12.0);
    assert_eq!(temp[35], 35.0);
}

#[test]
fn test_padded_short_variable() {
    let bytes = Netcdf3Builder::new()
        .dimension("n", 3)
        .variable("s", &["n"], Values::Short(vec![-1, 2, 300]))
        .variable("after", &["n"], Values::Int(vec![7, 8, 9]))
        .build();
    let file = NetCdfFile::from_bytes(bytes).unwrap();
    assert_eq!(file.variable("s").unwrap().byte_size, 8);
    assert_eq!(
        file.read_variable("s").unwrap(),
        VariableData::Shorts(vec![-1, 2, 300])
    );
    assert_eq!(
        file.read_variable("after").unwrap(),
        VariableData::Ints(vec![7, 8, 9])
    );
}

#[test]
fn test_byte_variable_options() {
    let bytes = Netcdf3Builder::new()
        .dimension("n", 4)
        .variable("flags", &["n"], Values::Byte(vec![-1, 0, 1, 127]))
        .build();

    let file = NetCdfFile::from_bytes(bytes.clone()).unwrap();
    assert_eq!(
        file.read_variable("flags").unwrap(),
        VariableData::Bytes(vec![-1, 0, 1, 127])
    );

    let raw = NetCdfFile::with_options(
        bytes,
        DecoderOptions {
            read_byte_as_integer: false,
        },
    )
    .unwrap();
    assert_eq!(
        raw.read_variable("flags").unwrap(),
        VariableData::RawBytes(vec![255, 0, 1, 127])
    );
}

#[test]
fn test_char_variable_as_string() {
    let bytes = Netcdf3Builder::new()
        .dimension("len", 8)
        .variable("station", &["len"], Values::text("ABC\0\0\0\0\0"))
        .build();
    let file = NetCdfFile::from_bytes(bytes).unwrap();
    assert_eq!(file.read_variable_as_string("station").unwrap(), "ABC");
}

#[test]
fn test_version_2_file() {
    let bytes = Netcdf3Builder::new()
        .version(2)
        .dimension("n", 2)
        .variable("d", &["n"], Values::Double(vec![1.5, 2.5]))
        .build();
    let file = NetCdfFile::from_bytes(bytes).unwrap();
    assert_eq!(file.version(), 2);
    assert_eq!(file.read_variable("d").unwrap().to_f64_vec(), vec![1.5, 2.5]);
}

#[test]
fn test_open_from_disk() {
    let tmp = test_utils::write_temp_file(&fixtures::basic_grid());
    let file = NetCdfFile::open(tmp.path()).unwrap();
    assert!(file.data_variable_exists("temp"));
}

// ============================================================================
// Error tests
// ============================================================================

#[test]
fn test_bad_magic_is_format_error() {
    let mut bytes = fixtures::basic_grid();
    bytes[0] = b'X';
    let err = NetCdfFile::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, NetCdfError::Format(_)));
    assert!(err.to_string().contains("CDF"));
}

#[test]
fn test_unknown_version_is_format_error() {
    let mut bytes = fixtures::basic_grid();
    bytes[3] = 5;
    assert!(matches!(
        NetCdfFile::from_bytes(bytes).unwrap_err(),
        NetCdfError::Format(_)
    ));
}

#[test]
fn test_wrong_list_tag_is_format_error() {
    let mut bytes = fixtures::basic_grid();
    // dimension list tag follows magic and numrecs
    bytes[11] = 99;
    let err = NetCdfFile::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, NetCdfError::Format(_)));
    assert!(err.to_string().contains("dimensions"));
}

#[test]
fn test_truncated_header_is_format_error() {
    let bytes = fixtures::basic_grid();
    let err = NetCdfFile::from_bytes(bytes[..40].to_vec()).unwrap_err();
    assert!(matches!(err, NetCdfError::Format(_)));
}

#[test]
fn test_truncated_data_fails_on_read() {
    let bytes = fixtures::basic_grid();
    let file = NetCdfFile::from_bytes(bytes[..bytes.len() - 4].to_vec()).unwrap();
    assert!(matches!(
        file.read_variable("temp").unwrap_err(),
        NetCdfError::Format(_)
    ));
}

#[test]
fn test_oversize_sentinel_is_range_error() {
    let bytes = Netcdf3Builder::new()
        .dimension("n", 2)
        .variable("big", &["n"], Values::Float(vec![0.0, 0.0]))
        .byte_size_override("big", 0xFFFF_FFFF)
        .build();
    assert!(matches!(
        NetCdfFile::from_bytes(bytes).unwrap_err(),
        NetCdfError::Range(_)
    ));
}

#[test]
fn test_64bit_offset_is_range_error() {
    let bytes = Netcdf3Builder::new()
        .version(2)
        .dimension("n", 2)
        .variable("far", &["n"], Values::Float(vec![0.0, 0.0]))
        .high_offset_word("far", 1)
        .build();
    let err = NetCdfFile::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, NetCdfError::Range(_)));
    assert!(err.to_string().contains("4GB"));
}

#[test]
fn test_inconsistent_byte_size_is_format_error() {
    let bytes = Netcdf3Builder::new()
        .dimension("n", 2)
        .variable("v", &["n"], Values::Float(vec![0.0, 0.0]))
        .byte_size_override("v", 12)
        .build();
    assert!(matches!(
        NetCdfFile::from_bytes(bytes).unwrap_err(),
        NetCdfError::Format(_)
    ));
}

#[test]
fn test_missing_variable_is_lookup_error() {
    let file = NetCdfFile::from_bytes(fixtures::basic_grid()).unwrap();
    assert!(matches!(
        file.read_variable("salinity").unwrap_err(),
        NetCdfError::Lookup(_)
    ));
    assert!(matches!(
        file.variable_attribute("temp", "long_name").unwrap_err(),
        NetCdfError::Lookup(_)
    ));
}
