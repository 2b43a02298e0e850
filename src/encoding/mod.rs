//! # Encoding Module
//!
//! Byte encodings for datums, split by what the bytes are used for:
//!
//! - **Key encoding** ([`key`], [`composite`]): order-preserving, prefix-free
//!   encodings for index keys in either sort direction
//! - **Key skipping** ([`skip`]): component boundaries without decoding
//! - **Value encoding** ([`value`]): compact tagged entries for row values,
//!   self-delimiting so a row can be scanned without its schema
//! - **Marshalling** ([`marshal`]): checksummed single-value storage
//! - **Varint** ([`varint`]): lengths, column ids and tags inside values

pub mod composite;
pub(crate) mod decimal;
pub mod key;
pub mod marshal;
pub mod skip;
pub mod value;
pub mod varint;

pub use composite::{decode_tuple_key, encode_tuple_key};
pub use key::{decode_key, encode_key, Direction};
pub use marshal::{marshal_column_value, unmarshal_column_value};
pub use skip::{skip_key, skip_tuple_key};
pub use value::{
    decode_value, decode_value_header, encode_value, skip_value, ColumnId, ValueEntry,
    ValueHeader, ValueScanner, ValueTag,
};
pub use varint::{decode_varint, encode_varint, put_varint, varint_len};
