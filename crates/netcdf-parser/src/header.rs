//! NetCDF-3 header parsing.
//!
//! Layout (all big-endian, variable-length fields padded to 4 bytes):
//!
//! ```text
//! header  = magic numrecs dim_list gatt_list var_list
//! magic   = 'C' 'D' 'F' VERSION
//! list    = ABSENT | TAG nelems [elem ...]
//! ABSENT  = ZERO ZERO
//! ```

use tracing::debug;

use crate::cursor::ByteCursor;
use crate::error::{NetCdfError, NetCdfResult};
use crate::types::{
    Attribute, AttributeValue, Dimension, Header, NcType, RecordDimension, Variable,
};

const ZERO: u32 = 0;
const NC_DIMENSION: u32 = 10;
const NC_VARIABLE: u32 = 11;
const NC_ATTRIBUTE: u32 = 12;
const NC_UNLIMITED: u32 = 0;
/// `numrecs` value for files still being written.
const STREAMING: u32 = 0xFFFF_FFFF;
/// `vsize` sentinel for variables of 4 GiB or more.
const OVERSIZE: u32 = 0xFFFF_FFFF;

// ============================================================================
// Parsing Functions
// ============================================================================

/// Parse the complete header, leaving the cursor at the end of it.
pub fn parse_header<B: AsRef<[u8]>>(cursor: &mut ByteCursor<B>) -> NetCdfResult<Header> {
    let magic = cursor
        .read_bytes(3)
        .map_err(|_| NetCdfError::format("not a valid NetCDF file: too short for magic"))?;
    if magic != b"CDF" {
        return Err(NetCdfError::format(
            "not a valid NetCDF file: should start with CDF",
        ));
    }

    let version = cursor.read_u8()?;
    if version != 1 && version != 2 {
        return Err(NetCdfError::format(format!(
            "unknown NetCDF format version {} (expected 1 or 2)",
            version
        )));
    }

    let numrecs = cursor.read_u32()?;
    if numrecs == STREAMING {
        return Err(NetCdfError::range(
            "streaming record count (numrecs = 0xFFFFFFFF) not supported",
        ));
    }

    let (dimensions, record_id) = parse_dimensions(cursor)?;
    let global_attributes = parse_attributes(cursor)?;
    let (variables, record_step) = parse_variables(cursor, &dimensions, record_id, version)?;

    let record_dimension = record_id.map(|id| RecordDimension {
        id,
        name: dimensions[id].name.clone(),
        length: numrecs as usize,
    });

    debug!(
        version,
        dimensions = dimensions.len(),
        variables = variables.len(),
        numrecs,
        record_step,
        "parsed NetCDF header"
    );

    Ok(Header {
        version,
        record_dimension,
        record_step,
        dimensions,
        global_attributes,
        variables,
    })
}

/// Read a list tag; `Ok(None)` for an absent (empty) list.
fn read_list_tag<B: AsRef<[u8]>>(
    cursor: &mut ByteCursor<B>,
    expected: u32,
    what: &str,
) -> NetCdfResult<Option<usize>> {
    let tag = cursor.read_u32()?;
    if tag == ZERO {
        if cursor.read_u32()? != ZERO {
            return Err(NetCdfError::format(format!(
                "wrong empty tag for list of {}",
                what
            )));
        }
        return Ok(None);
    }
    if tag != expected {
        return Err(NetCdfError::format(format!(
            "wrong tag {} for list of {} (expected {})",
            tag, what, expected
        )));
    }
    Ok(Some(cursor.read_u32()? as usize))
}

fn read_name<B: AsRef<[u8]>>(cursor: &mut ByteCursor<B>) -> NetCdfResult<String> {
    let len = cursor.read_u32()? as usize;
    let name = cursor.read_chars(len)?;
    cursor.align4()?;
    Ok(name)
}

fn parse_dimensions<B: AsRef<[u8]>>(
    cursor: &mut ByteCursor<B>,
) -> NetCdfResult<(Vec<Dimension>, Option<usize>)> {
    let Some(count) = read_list_tag(cursor, NC_DIMENSION, "dimensions")? else {
        return Ok((Vec::new(), None));
    };

    let mut dimensions = Vec::with_capacity(count);
    let mut record_id = None;
    for id in 0..count {
        let name = read_name(cursor)?;
        let size = cursor.read_u32()?;
        if size == NC_UNLIMITED {
            if record_id.is_some() {
                return Err(NetCdfError::format(format!(
                    "dimension {} is a second unlimited dimension",
                    name
                )));
            }
            record_id = Some(id);
        }
        dimensions.push(Dimension {
            name,
            size: size as usize,
        });
    }
    Ok((dimensions, record_id))
}

/// Parse an attribute list (global or per-variable).
fn parse_attributes<B: AsRef<[u8]>>(cursor: &mut ByteCursor<B>) -> NetCdfResult<Vec<Attribute>> {
    let Some(count) = read_list_tag(cursor, NC_ATTRIBUTE, "attributes")? else {
        return Ok(Vec::new());
    };

    let mut attributes = Vec::with_capacity(count);
    for _ in 0..count {
        let name = read_name(cursor)?;
        let nc_type = NcType::from_code(cursor.read_u32()?)?;
        let nelems = cursor.read_u32()? as usize;
        let value = read_attribute_values(cursor, nc_type, nelems)?;
        cursor.align4()?;
        attributes.push(Attribute { name, value });
    }
    Ok(attributes)
}

fn read_attribute_values<B: AsRef<[u8]>>(
    cursor: &mut ByteCursor<B>,
    nc_type: NcType,
    n: usize,
) -> NetCdfResult<AttributeValue> {
    // Refuse element counts the buffer cannot hold before allocating for them
    let bytes = n
        .checked_mul(nc_type.width())
        .ok_or_else(|| NetCdfError::range(format!("attribute of {} elements too large", n)))?;
    if !cursor.available(bytes) {
        return Err(NetCdfError::format(format!(
            "truncated buffer: attribute needs {} bytes at offset {}",
            bytes,
            cursor.offset()
        )));
    }

    Ok(match nc_type {
        NcType::Byte => {
            AttributeValue::Bytes((0..n).map(|_| cursor.read_i8()).collect::<Result<_, _>>()?)
        }
        NcType::Char => AttributeValue::Text(trim_nul(cursor.read_chars(n)?)),
        NcType::Short => {
            AttributeValue::Shorts((0..n).map(|_| cursor.read_i16()).collect::<Result<_, _>>()?)
        }
        NcType::Int => {
            AttributeValue::Ints((0..n).map(|_| cursor.read_i32()).collect::<Result<_, _>>()?)
        }
        NcType::Float => {
            AttributeValue::Floats((0..n).map(|_| cursor.read_f32()).collect::<Result<_, _>>()?)
        }
        NcType::Double => {
            AttributeValue::Doubles((0..n).map(|_| cursor.read_f64()).collect::<Result<_, _>>()?)
        }
    })
}

/// Strip trailing NUL padding from character data.
pub(crate) fn trim_nul(mut text: String) -> String {
    let trimmed = text.trim_end_matches('\0').len();
    text.truncate(trimmed);
    text
}

fn parse_variables<B: AsRef<[u8]>>(
    cursor: &mut ByteCursor<B>,
    dimensions: &[Dimension],
    record_id: Option<usize>,
    version: u8,
) -> NetCdfResult<(Vec<Variable>, u64)> {
    let Some(count) = read_list_tag(cursor, NC_VARIABLE, "variables")? else {
        return Ok((Vec::new(), 0));
    };

    let mut variables = Vec::with_capacity(count);
    let mut record_step: u64 = 0;

    for _ in 0..count {
        let name = read_name(cursor)?;

        let dimensionality = cursor.read_u32()? as usize;
        let mut dim_ids = Vec::with_capacity(dimensionality.min(64));
        for _ in 0..dimensionality {
            let id = cursor.read_u32()? as usize;
            if id >= dimensions.len() {
                return Err(NetCdfError::format(format!(
                    "variable {} references dimension id {} but only {} dimensions exist",
                    name,
                    id,
                    dimensions.len()
                )));
            }
            dim_ids.push(id);
        }

        let attributes = parse_attributes(cursor)?;
        let nc_type = NcType::from_code(cursor.read_u32()?)?;

        let byte_size = cursor.read_u32()?;
        if byte_size == OVERSIZE {
            return Err(NetCdfError::range(format!(
                "variable {} is 4GB or larger, not supported",
                name
            )));
        }

        if version == 2 {
            let high = cursor.read_u32()?;
            if high > 0 {
                return Err(NetCdfError::range(format!(
                    "variable {}: offsets larger than 4GB not supported",
                    name
                )));
            }
        }
        let offset = cursor.read_u32()? as u64;

        let is_record = record_id.is_some() && dim_ids.first().copied() == record_id;
        if is_record {
            record_step += byte_size as u64;
        } else {
            check_byte_size(&name, &dim_ids, dimensions, nc_type, byte_size)?;
        }

        variables.push(Variable {
            name,
            dimensions: dim_ids,
            attributes,
            nc_type,
            byte_size,
            offset,
            is_record,
        });
    }

    Ok((variables, record_step))
}

/// Non-record sizes must equal the dimension product times the type width,
/// allowing for the 4-byte padding writers apply to short and byte data.
fn check_byte_size(
    name: &str,
    dim_ids: &[usize],
    dimensions: &[Dimension],
    nc_type: NcType,
    byte_size: u32,
) -> NetCdfResult<()> {
    let expected = dim_ids
        .iter()
        .try_fold(nc_type.width() as u64, |acc, &id| {
            acc.checked_mul(dimensions[id].size as u64)
        })
        .ok_or_else(|| NetCdfError::range(format!("variable {} size overflows", name)))?;
    let padded = expected.div_ceil(4) * 4;
    let actual = byte_size as u64;
    if actual != expected && actual != padded {
        return Err(NetCdfError::format(format!(
            "variable {} declares {} bytes but its dimensions need {}",
            name, actual, expected
        )));
    }
    Ok(())
}
