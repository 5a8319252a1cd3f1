//! NetCDF-3 file decoder.
//!
//! Decodes classic (`CDF\x01`) and 64-bit-offset (`CDF\x02`) files entirely in
//! Rust, without the netCDF C library. The header is parsed once into an
//! immutable [`Header`]; variable data is decoded on request from the retained
//! buffer, including record (unlimited-dimension) variables interleaved across
//! records.
//!
//! ```ignore
//! use netcdf_parser::NetCdfFile;
//!
//! let file = NetCdfFile::open("sst.nc")?;
//! let sst = file.read_variable("sst")?.to_f64_vec();
//! ```
//!
//! NetCDF-4/HDF5 files are not supported, and 64-bit-offset files are limited
//! to variable offsets below 4 GiB.

pub mod cursor;
pub mod error;
pub mod header;
pub mod reader;
pub mod types;

pub use cursor::ByteCursor;
pub use error::{NetCdfError, NetCdfResult};
pub use header::parse_header;
pub use reader::{DecoderOptions, NetCdfFile};
pub use types::{
    Attribute, AttributeValue, Dimension, Header, NcType, RecordDimension, Variable, VariableData,
};
