//! Decoded NetCDF-3 file: header plus on-demand variable reads.

use std::fmt::Write as _;
use std::path::Path;

use bytes::Bytes;
use tracing::{debug, trace};

use crate::cursor::ByteCursor;
use crate::error::{NetCdfError, NetCdfResult};
use crate::header::{parse_header, trim_nul};
use crate::types::{
    AttributeValue, Dimension, Header, NcType, RecordDimension, Variable, VariableData,
};

/// Decoding options.
#[derive(Debug, Clone, Copy)]
pub struct DecoderOptions {
    /// Surface `byte` data as signed integers rather than raw bytes.
    pub read_byte_as_integer: bool,
}

impl Default for DecoderOptions {
    fn default() -> Self {
        Self {
            read_byte_as_integer: true,
        }
    }
}

/// A NetCDF-3 file held in memory.
///
/// The header is parsed once on construction; variable data is decoded from
/// the retained buffer each time it is requested.
#[derive(Debug, Clone)]
pub struct NetCdfFile {
    data: Bytes,
    header: Header,
    options: DecoderOptions,
}

impl NetCdfFile {
    /// Decode the header of an in-memory file.
    pub fn from_bytes(data: impl Into<Bytes>) -> NetCdfResult<Self> {
        Self::with_options(data, DecoderOptions::default())
    }

    pub fn with_options(data: impl Into<Bytes>, options: DecoderOptions) -> NetCdfResult<Self> {
        let data = data.into();
        let mut cursor = ByteCursor::new(data.clone());
        let header = parse_header(&mut cursor)?;
        Ok(Self {
            data,
            header,
            options,
        })
    }

    /// Read and decode a file from disk.
    pub fn open(path: impl AsRef<Path>) -> NetCdfResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        debug!(path = %path.display(), bytes = data.len(), "read NetCDF file");
        Self::from_bytes(data)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn version(&self) -> u8 {
        self.header.version
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.header.dimensions
    }

    pub fn variables(&self) -> &[Variable] {
        &self.header.variables
    }

    pub fn record_dimension(&self) -> Option<&RecordDimension> {
        self.header.record_dimension.as_ref()
    }

    /// Look up a variable by name.
    pub fn variable(&self, name: &str) -> NetCdfResult<&Variable> {
        self.header
            .variable(name)
            .ok_or_else(|| NetCdfError::lookup(format!("variable {}", name)))
    }

    /// Look up a global attribute by name.
    pub fn attribute(&self, name: &str) -> NetCdfResult<&AttributeValue> {
        self.header
            .global_attribute(name)
            .ok_or_else(|| NetCdfError::lookup(format!("global attribute {}", name)))
    }

    /// Look up an attribute of a variable by name.
    pub fn variable_attribute(&self, variable: &str, name: &str) -> NetCdfResult<&AttributeValue> {
        self.variable(variable)?
            .attribute(name)
            .ok_or_else(|| NetCdfError::lookup(format!("attribute {} of variable {}", name, variable)))
    }

    pub fn data_variable_exists(&self, name: &str) -> bool {
        self.header.variable(name).is_some()
    }

    pub fn attribute_exists(&self, name: &str) -> bool {
        self.header.global_attribute(name).is_some()
    }

    /// Decode all values of a variable, flattened in file order.
    pub fn read_variable(&self, name: &str) -> NetCdfResult<VariableData> {
        let variable = self.variable(name)?;
        let mut cursor = ByteCursor::new(self.data.clone());
        cursor.seek(to_usize(variable.offset)?)?;

        let data = if variable.is_record {
            self.read_record(&mut cursor, variable)?
        } else {
            let count = self.element_count(&variable.dimensions);
            let mut data = self.empty_data(variable.nc_type, count);
            self.decode_block(&mut cursor, variable.nc_type, count, &mut data)?;
            data
        };

        trace!(variable = %name, elements = data.len(), "decoded variable");
        Ok(data)
    }

    /// Decode a character variable as a single string.
    pub fn read_variable_as_string(&self, name: &str) -> NetCdfResult<String> {
        let variable = self.variable(name)?;
        if variable.nc_type != NcType::Char {
            return Err(NetCdfError::lookup(format!(
                "variable {} is {}, not char",
                name, variable.nc_type
            )));
        }
        Ok(self.read_variable(name)?.as_text().unwrap_or_default())
    }

    /// Record variables are interleaved: each record holds one slab of every
    /// record variable, so consecutive slabs are `record_step` bytes apart.
    fn read_record(
        &self,
        cursor: &mut ByteCursor<Bytes>,
        variable: &Variable,
    ) -> NetCdfResult<VariableData> {
        let records = self
            .header
            .record_dimension
            .as_ref()
            .map(|r| r.length)
            .unwrap_or(0);
        let per_record = self.element_count(&variable.dimensions[1..]);
        let mut data = self.empty_data(variable.nc_type, records.saturating_mul(per_record));

        for record in 0..records {
            let start = variable
                .offset
                .checked_add(record as u64 * self.header.record_step)
                .ok_or_else(|| NetCdfError::range("record offset overflows"))?;
            cursor.seek(to_usize(start)?)?;
            self.decode_block(cursor, variable.nc_type, per_record, &mut data)?;
        }
        Ok(data)
    }

    fn element_count(&self, dim_ids: &[usize]) -> usize {
        dim_ids
            .iter()
            .map(|&id| self.header.dimensions[id].size)
            .product()
    }

    fn empty_data(&self, nc_type: NcType, capacity: usize) -> VariableData {
        let capacity = capacity.min(self.data.len());
        match nc_type {
            NcType::Byte if self.options.read_byte_as_integer => {
                VariableData::Bytes(Vec::with_capacity(capacity))
            }
            NcType::Byte => VariableData::RawBytes(Vec::with_capacity(capacity)),
            NcType::Char => VariableData::Text(Vec::new()),
            NcType::Short => VariableData::Shorts(Vec::with_capacity(capacity)),
            NcType::Int => VariableData::Ints(Vec::with_capacity(capacity)),
            NcType::Float => VariableData::Floats(Vec::with_capacity(capacity)),
            NcType::Double => VariableData::Doubles(Vec::with_capacity(capacity)),
        }
    }

    /// Append `count` elements read at the cursor to `out`.
    fn decode_block(
        &self,
        cursor: &mut ByteCursor<Bytes>,
        nc_type: NcType,
        count: usize,
        out: &mut VariableData,
    ) -> NetCdfResult<()> {
        let len = count
            .checked_mul(nc_type.width())
            .ok_or_else(|| NetCdfError::range(format!("{} elements of {} overflow", count, nc_type)))?;
        let bytes = cursor.read_bytes(len)?;
        match out {
            VariableData::Bytes(v) => v.extend(bytes.iter().map(|&b| b as i8)),
            VariableData::RawBytes(v) => v.extend_from_slice(bytes),
            VariableData::Text(v) => {
                v.push(trim_nul(String::from_utf8_lossy(bytes).into_owned()))
            }
            VariableData::Shorts(v) => v.extend(
                bytes
                    .chunks_exact(2)
                    .map(|c| i16::from_be_bytes([c[0], c[1]])),
            ),
            VariableData::Ints(v) => v.extend(
                bytes
                    .chunks_exact(4)
                    .map(|c| i32::from_be_bytes([c[0], c[1], c[2], c[3]])),
            ),
            VariableData::Floats(v) => v.extend(
                bytes
                    .chunks_exact(4)
                    .map(|c| f32::from_be_bytes([c[0], c[1], c[2], c[3]])),
            ),
            VariableData::Doubles(v) => v.extend(bytes.chunks_exact(8).map(|c| {
                f64::from_be_bytes([c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7]])
            })),
        }
        Ok(())
    }

    /// Human-readable dump of the header, in the spirit of `ncdump -h`.
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "DIMENSIONS");
        for dim in &self.header.dimensions {
            let _ = writeln!(out, "  {:<20} size = {}", dim.name, dim.size);
        }
        let _ = writeln!(out, "\nGLOBAL ATTRIBUTES");
        for attr in &self.header.global_attributes {
            let _ = writeln!(out, "  {:<20} = {}", attr.name, attr.value);
        }
        let _ = writeln!(out, "\nVARIABLES");
        for var in &self.header.variables {
            let dims: Vec<&str> = var
                .dimensions
                .iter()
                .map(|&id| self.header.dimensions[id].name.as_str())
                .collect();
            let _ = writeln!(
                out,
                "  {} {}({}){}",
                var.nc_type,
                var.name,
                dims.join(", "),
                if var.is_record { " [record]" } else { "" }
            );
            for attr in &var.attributes {
                let _ = writeln!(out, "    {}:{} = {}", var.name, attr.name, attr.value);
            }
        }
        out
    }
}

fn to_usize(offset: u64) -> NetCdfResult<usize> {
    usize::try_from(offset).map_err(|_| NetCdfError::range(format!("offset {} too large", offset)))
}
