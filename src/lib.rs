//! # datum-codec - Datum Encodings for an Ordered Key-Value Store
//!
//! Converts typed SQL values ("datums") into bytes for an ordered key-value
//! store and back. Two encodings are provided:
//!
//! - **Key encoding**: byte-wise comparable. Comparing encoded keys with
//!   `memcmp` reproduces the logical order of the values, per column
//!   ascending or descending.
//! - **Value encoding**: compact tagged entries for non-key columns. Not
//!   ordered, but self-delimiting so a row can be scanned entry by entry.
//!
//! ## Quick Start
//!
//! ```ignore
//! use datum_codec::{decode_key, encode_key, ColumnType, Datum, DatumAlloc, Direction};
//!
//! let ty = ColumnType::int8();
//! let mut key = Vec::new();
//! encode_key(&ty, &Datum::Int(42), Direction::Descending, &mut key)?;
//!
//! let alloc = DatumAlloc::new();
//! let (datum, consumed) = decode_key(&alloc, &ty, &key, Direction::Descending)?;
//! assert_eq!(datum, Datum::Int(42));
//! assert_eq!(consumed, key.len());
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │  index key builders, row writers, range scanners    │
//! ├──────────────────────────┬─────────────────────────┤
//! │  encoding::key/composite │  encoding::value         │
//! │  encoding::skip          │  encoding::marshal       │
//! ├──────────────────────────┴─────────────────────────┤
//! │  types (Family, ColumnType, Datum, Decimal)         │
//! ├────────────────────────────────────────────────────┤
//! │  memory::DatumAlloc (arena backing decoded datums)  │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Decoded datums borrow either the input buffer (zero-copy) or a
//! [`DatumAlloc`]. Resetting the allocator needs `&mut`, so the borrow checker
//! rejects any datum that would outlive its backing storage.
//!
//! ## Module Overview
//!
//! - [`types`]: type descriptors, families, the key-encodability policy, datums
//! - [`encoding`]: key, value and marshalled encodings plus the key skipper
//! - [`memory`]: the datum arena
//! - [`error`]: `CodecError` and its kinds
//! - [`config`]: format constants and arena tuning

pub mod config;
pub mod encoding;
pub mod error;
pub mod memory;
pub mod types;

pub use encoding::{
    decode_key, decode_tuple_key, decode_value, decode_value_header, encode_key,
    encode_tuple_key, encode_value, marshal_column_value, skip_key, skip_tuple_key, skip_value,
    unmarshal_column_value, ColumnId, Direction, ValueEntry, ValueHeader, ValueScanner, ValueTag,
};
pub use error::{error_kind, CodecError, CodecErrorKind};
pub use memory::DatumAlloc;
pub use types::{
    family_of, interval_micros, is_key_encodable, ColumnType, Datum, Decimal, DecimalForm, Family,
};
