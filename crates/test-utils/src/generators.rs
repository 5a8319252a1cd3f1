//! Synthetic NetCDF-3 file generator.
//!
//! Builds byte-exact classic or 64-bit-offset files in memory so tests can
//! exercise the decoder and the geometry builders without external data.
//!
//! # Example
//!
//! ```
//! use test_utils::{Netcdf3Builder, Values};
//!
//! let bytes = Netcdf3Builder::new()
//!     .dimension("lon", 2)
//!     .variable("lon", &["lon"], Values::Float(vec![0.0, 10.0]))
//!     .attribute("lon", "units", Values::text("degrees_east"))
//!     .build();
//! assert_eq!(&bytes[..4], b"CDF\x01");
//! ```

use netcdf_parser::{ByteCursor, NcType};

/// Typed values for attributes and variable data.
#[derive(Debug, Clone, PartialEq)]
pub enum Values {
    Byte(Vec<i8>),
    Char(String),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl Values {
    pub fn text(s: impl Into<String>) -> Self {
        Self::Char(s.into())
    }

    pub fn nc_type(&self) -> NcType {
        match self {
            Self::Byte(_) => NcType::Byte,
            Self::Char(_) => NcType::Char,
            Self::Short(_) => NcType::Short,
            Self::Int(_) => NcType::Int,
            Self::Float(_) => NcType::Float,
            Self::Double(_) => NcType::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Byte(v) => v.len(),
            Self::Char(s) => s.len(),
            Self::Short(v) => v.len(),
            Self::Int(v) => v.len(),
            Self::Float(v) => v.len(),
            Self::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write elements `start..start + count` (no padding).
    fn write_range(&self, cursor: &mut ByteCursor, start: usize, count: usize) {
        let end = start + count;
        match self {
            Self::Byte(v) => v[start..end].iter().for_each(|&x| {
                cursor.write_i8(x);
            }),
            Self::Char(s) => {
                cursor.write_bytes(&s.as_bytes()[start..end]);
            }
            Self::Short(v) => v[start..end].iter().for_each(|&x| {
                cursor.write_i16(x);
            }),
            Self::Int(v) => v[start..end].iter().for_each(|&x| {
                cursor.write_i32(x);
            }),
            Self::Float(v) => v[start..end].iter().for_each(|&x| {
                cursor.write_f32(x);
            }),
            Self::Double(v) => v[start..end].iter().for_each(|&x| {
                cursor.write_f64(x);
            }),
        }
    }
}

#[derive(Debug, Clone)]
struct VarSpec {
    name: String,
    dims: Vec<String>,
    attributes: Vec<(String, Values)>,
    data: Values,
    byte_size_override: Option<u32>,
    high_offset_word: u32,
}

/// In-memory NetCDF-3 writer.
#[derive(Debug, Clone)]
pub struct Netcdf3Builder {
    version: u8,
    numrecs: usize,
    dimensions: Vec<(String, usize)>,
    global_attributes: Vec<(String, Values)>,
    variables: Vec<VarSpec>,
}

impl Default for Netcdf3Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Netcdf3Builder {
    pub fn new() -> Self {
        Self {
            version: 1,
            numrecs: 0,
            dimensions: Vec::new(),
            global_attributes: Vec::new(),
            variables: Vec::new(),
        }
    }

    /// 1 = classic, 2 = 64-bit offset.
    pub fn version(mut self, version: u8) -> Self {
        self.version = version;
        self
    }

    pub fn dimension(mut self, name: impl Into<String>, size: usize) -> Self {
        self.dimensions.push((name.into(), size));
        self
    }

    /// Declare the unlimited dimension holding `numrecs` records.
    pub fn unlimited(mut self, name: impl Into<String>, numrecs: usize) -> Self {
        self.dimensions.push((name.into(), 0));
        self.numrecs = numrecs;
        self
    }

    pub fn global_attribute(mut self, name: impl Into<String>, value: Values) -> Self {
        self.global_attributes.push((name.into(), value));
        self
    }

    /// Add a variable; `data` holds every element in file order.
    pub fn variable(mut self, name: impl Into<String>, dims: &[&str], data: Values) -> Self {
        self.variables.push(VarSpec {
            name: name.into(),
            dims: dims.iter().map(|d| d.to_string()).collect(),
            attributes: Vec::new(),
            data,
            byte_size_override: None,
            high_offset_word: 0,
        });
        self
    }

    /// Attach an attribute to a previously added variable.
    pub fn attribute(mut self, variable: &str, name: impl Into<String>, value: Values) -> Self {
        if let Some(var) = self.variables.iter_mut().find(|v| v.name == variable) {
            var.attributes.push((name.into(), value));
        }
        self
    }

    /// Write a specific `vsize` instead of the computed one.
    pub fn byte_size_override(mut self, variable: &str, size: u32) -> Self {
        if let Some(var) = self.variables.iter_mut().find(|v| v.name == variable) {
            var.byte_size_override = Some(size);
        }
        self
    }

    /// Set the high word of a version-2 offset.
    pub fn high_offset_word(mut self, variable: &str, word: u32) -> Self {
        if let Some(var) = self.variables.iter_mut().find(|v| v.name == variable) {
            var.high_offset_word = word;
        }
        self
    }

    fn dim_id(&self, name: &str) -> usize {
        self.dimensions
            .iter()
            .position(|(d, _)| d == name)
            .unwrap_or_else(|| panic!("unknown dimension {name}"))
    }

    fn is_record(&self, var: &VarSpec) -> bool {
        var.dims
            .first()
            .map(|d| self.dimensions[self.dim_id(d)].1 == 0)
            .unwrap_or(false)
    }

    /// Elements per record (record variables) or in total (others).
    fn slab_len(&self, var: &VarSpec) -> usize {
        let skip = usize::from(self.is_record(var));
        var.dims[skip..]
            .iter()
            .map(|d| self.dimensions[self.dim_id(d)].1)
            .product()
    }

    fn vsize(&self, var: &VarSpec) -> u32 {
        let raw = self.slab_len(var) * var.data.nc_type().width();
        (raw.div_ceil(4) * 4) as u32
    }

    /// Serialize the file.
    pub fn build(&self) -> Vec<u8> {
        let mut cursor = ByteCursor::with_capacity(1024);
        cursor
            .write_chars("CDF")
            .write_u8(self.version)
            .write_u32(self.numrecs as u32);

        // Dimensions
        if self.dimensions.is_empty() {
            cursor.write_u32(0).write_u32(0);
        } else {
            cursor.write_u32(10).write_u32(self.dimensions.len() as u32);
            for (name, size) in &self.dimensions {
                write_name(&mut cursor, name);
                cursor.write_u32(*size as u32);
            }
        }

        write_attributes(&mut cursor, &self.global_attributes);

        // Variables, remembering where each offset goes
        let mut offset_slots = Vec::with_capacity(self.variables.len());
        if self.variables.is_empty() {
            cursor.write_u32(0).write_u32(0);
        } else {
            cursor.write_u32(11).write_u32(self.variables.len() as u32);
            for var in &self.variables {
                write_name(&mut cursor, &var.name);
                cursor.write_u32(var.dims.len() as u32);
                for dim in &var.dims {
                    cursor.write_u32(self.dim_id(dim) as u32);
                }
                write_attributes(&mut cursor, &var.attributes);
                cursor
                    .write_u32(var.data.nc_type().code())
                    .write_u32(var.byte_size_override.unwrap_or_else(|| self.vsize(var)));
                if self.version == 2 {
                    cursor.write_u32(var.high_offset_word);
                }
                offset_slots.push(cursor.offset());
                cursor.write_u32(0);
            }
        }

        let mut offsets = vec![0usize; self.variables.len()];

        // Non-record data
        for (i, var) in self.variables.iter().enumerate() {
            if self.is_record(var) {
                continue;
            }
            offsets[i] = cursor.offset();
            let count = self.slab_len(var).min(var.data.len());
            var.data.write_range(&mut cursor, 0, count);
            cursor.pad4();
        }

        // Record data, interleaved one slab per variable per record
        let mut first_record = true;
        for record in 0..self.numrecs {
            for (i, var) in self.variables.iter().enumerate() {
                if !self.is_record(var) {
                    continue;
                }
                if first_record {
                    offsets[i] = cursor.offset();
                }
                let slab = self.slab_len(var);
                let start = (record * slab).min(var.data.len());
                let count = slab.min(var.data.len() - start);
                var.data.write_range(&mut cursor, start, count);
                cursor.pad4();
            }
            first_record = false;
        }
        for (i, var) in self.variables.iter().enumerate() {
            if self.is_record(var) && self.numrecs == 0 {
                offsets[i] = cursor.offset();
            }
        }

        let end = cursor.offset();
        for (slot, offset) in offset_slots.iter().zip(&offsets) {
            cursor
                .seek(*slot)
                .expect("offset slot inside written header")
                .write_u32(*offset as u32);
        }
        cursor.seek(end).expect("end of written data");
        cursor.to_vec()
    }
}

fn write_name(cursor: &mut ByteCursor, name: &str) {
    cursor.write_u32(name.len() as u32).write_chars(name).pad4();
}

fn write_attributes(cursor: &mut ByteCursor, attributes: &[(String, Values)]) {
    if attributes.is_empty() {
        cursor.write_u32(0).write_u32(0);
        return;
    }
    cursor.write_u32(12).write_u32(attributes.len() as u32);
    for (name, value) in attributes {
        write_name(cursor, name);
        cursor
            .write_u32(value.nc_type().code())
            .write_u32(value.len() as u32);
        value.write_range(cursor, 0, value.len());
        cursor.pad4();
    }
}

/// Grid values `0, 1, 2, ...` in row-major order.
pub fn sequential_values(len: usize) -> Vec<f32> {
    (0..len).map(|i| i as f32).collect()
}

/// Evenly spaced coordinate values.
pub fn linspace(start: f64, step: f64, len: usize) -> Vec<f64> {
    (0..len).map(|i| start + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_file_layout() {
        let bytes = Netcdf3Builder::new().build();
        // magic, numrecs, three absent lists
        assert_eq!(bytes.len(), 4 + 4 + 8 * 3);
        assert_eq!(&bytes[..4], b"CDF\x01");
    }

    #[test]
    fn test_short_data_is_padded() {
        let bytes = Netcdf3Builder::new()
            .dimension("n", 3)
            .variable("s", &["n"], Values::Short(vec![1, 2, 3]))
            .build();
        assert_eq!(bytes.len() % 4, 0);
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(-10.0, 10.0, 3), vec![-10.0, 0.0, 10.0]);
        assert_eq!(sequential_values(3), vec![0.0, 1.0, 2.0]);
    }
}
