//! Header data model: dimensions, attributes, variables and their values.

use std::fmt;

use crate::error::{NetCdfError, NetCdfResult};

/// NetCDF-3 external data types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NcType {
    Byte,
    Char,
    Short,
    Int,
    Float,
    Double,
}

impl NcType {
    /// Decode a type code (1-6).
    pub fn from_code(code: u32) -> NetCdfResult<Self> {
        match code {
            1 => Ok(Self::Byte),
            2 => Ok(Self::Char),
            3 => Ok(Self::Short),
            4 => Ok(Self::Int),
            5 => Ok(Self::Float),
            6 => Ok(Self::Double),
            other => Err(NetCdfError::format(format!(
                "non valid type code {} (expected 1-6)",
                other
            ))),
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            Self::Byte => 1,
            Self::Char => 2,
            Self::Short => 3,
            Self::Int => 4,
            Self::Float => 5,
            Self::Double => 6,
        }
    }

    /// Width of one element in bytes.
    pub fn width(&self) -> usize {
        match self {
            Self::Byte | Self::Char => 1,
            Self::Short => 2,
            Self::Int | Self::Float => 4,
            Self::Double => 8,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
        }
    }
}

impl fmt::Display for NcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A named dimension. Size 0 marks the unlimited (record) dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct Dimension {
    pub name: String,
    pub size: usize,
}

impl Dimension {
    pub fn is_unlimited(&self) -> bool {
        self.size == 0
    }
}

/// Attribute payload. Character attributes are NUL-trimmed text.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Bytes(Vec<i8>),
    Text(String),
    Shorts(Vec<i16>),
    Ints(Vec<i32>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
}

impl AttributeValue {
    pub fn nc_type(&self) -> NcType {
        match self {
            Self::Bytes(_) => NcType::Byte,
            Self::Text(_) => NcType::Char,
            Self::Shorts(_) => NcType::Short,
            Self::Ints(_) => NcType::Int,
            Self::Floats(_) => NcType::Float,
            Self::Doubles(_) => NcType::Double,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(v) => v.len(),
            Self::Text(s) => s.len(),
            Self::Shorts(v) => v.len(),
            Self::Ints(v) => v.len(),
            Self::Floats(v) => v.len(),
            Self::Doubles(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Text value, if this is a character attribute.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// First numeric element as f64. `None` for text or empty attributes.
    pub fn as_f64(&self) -> Option<f64> {
        self.to_f64_vec().first().copied()
    }

    /// All numeric elements as f64. Empty for text attributes.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Self::Bytes(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Text(_) => Vec::new(),
            Self::Shorts(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Ints(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Floats(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Doubles(v) => v.clone(),
        }
    }
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, values: &[T]) -> fmt::Result {
    if values.len() == 1 {
        return write!(f, "{}", values[0]);
    }
    write!(f, "[")?;
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", v)?;
    }
    write!(f, "]")
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bytes(v) => write_list(f, v),
            Self::Text(s) => write!(f, "{}", s),
            Self::Shorts(v) => write_list(f, v),
            Self::Ints(v) => write_list(f, v),
            Self::Floats(v) => write_list(f, v),
            Self::Doubles(v) => write_list(f, v),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: AttributeValue,
}

/// Variable metadata from the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    /// Dimension ids, slowest-varying first.
    pub dimensions: Vec<usize>,
    pub attributes: Vec<Attribute>,
    pub nc_type: NcType,
    /// Declared size in bytes (per record for record variables).
    pub byte_size: u32,
    /// Absolute file offset of the first element.
    pub offset: u64,
    /// True when the first dimension is the record dimension.
    pub is_record: bool,
}

impl Variable {
    /// First attribute with exactly this name.
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// First attribute whose name matches ignoring ASCII case.
    pub fn attribute_ignore_case(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| &a.value)
    }
}

/// The unlimited dimension and its current length.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDimension {
    pub id: usize,
    pub name: String,
    /// Number of records (`numrecs` in the header).
    pub length: usize,
}

/// Parsed header. Immutable once decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Header {
    /// 1 = classic, 2 = 64-bit offset.
    pub version: u8,
    pub record_dimension: Option<RecordDimension>,
    /// Bytes between consecutive records (sum of record variable sizes).
    pub record_step: u64,
    pub dimensions: Vec<Dimension>,
    pub global_attributes: Vec<Attribute>,
    pub variables: Vec<Variable>,
}

impl Header {
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variable_index(&self, name: &str) -> Option<usize> {
        self.variables.iter().position(|v| v.name == name)
    }

    pub fn dimension_index(&self, name: &str) -> Option<usize> {
        self.dimensions.iter().position(|d| d.name == name)
    }

    pub fn global_attribute(&self, name: &str) -> Option<&AttributeValue> {
        self.global_attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// Effective length of a dimension; the record dimension reports `numrecs`.
    pub fn dimension_length(&self, id: usize) -> Option<usize> {
        let dim = self.dimensions.get(id)?;
        match &self.record_dimension {
            Some(rec) if rec.id == id => Some(rec.length),
            _ => Some(dim.size),
        }
    }
}

/// Decoded variable contents, flattened in file order.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableData {
    Bytes(Vec<i8>),
    /// Byte variables when `read_byte_as_integer` is off.
    RawBytes(Vec<u8>),
    /// One string per record (a single entry for non-record variables).
    Text(Vec<String>),
    Shorts(Vec<i16>),
    Ints(Vec<i32>),
    Floats(Vec<f32>),
    Doubles(Vec<f64>),
}

impl VariableData {
    pub fn len(&self) -> usize {
        match self {
            Self::Bytes(v) => v.len(),
            Self::RawBytes(v) => v.len(),
            Self::Text(v) => v.len(),
            Self::Shorts(v) => v.len(),
            Self::Ints(v) => v.len(),
            Self::Floats(v) => v.len(),
            Self::Doubles(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Numeric contents widened to f64. Text variables yield an empty vector.
    pub fn to_f64_vec(&self) -> Vec<f64> {
        match self {
            Self::Bytes(v) => v.iter().map(|&x| x as f64).collect(),
            Self::RawBytes(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Text(_) => Vec::new(),
            Self::Shorts(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Ints(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Floats(v) => v.iter().map(|&x| x as f64).collect(),
            Self::Doubles(v) => v.clone(),
        }
    }

    /// Text contents joined, for character variables.
    pub fn as_text(&self) -> Option<String> {
        match self {
            Self::Text(parts) => Some(parts.concat()),
            _ => None,
        }
    }
}
