//! # Type System for the Datum Codec
//!
//! The codec is driven entirely by type descriptors: a [`ColumnType`] says
//! which family a column belongs to and carries the parameters the encoders
//! need, while a [`Datum`] is the runtime value being encoded or decoded.
//!
//! ## Module Structure
//!
//! - `family`: `Family` discriminant and the key-encodability classifier
//! - `column`: `ColumnType` descriptor with family parameters
//! - `decimal`: arbitrary-precision `Decimal<'a>`
//! - `datum`: runtime `Datum<'a>` with zero-copy support
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `Family` | Encoding-strategy discriminant |
//! | `ColumnType` | Column type descriptor |
//! | `Decimal<'a>` | Decimal value with preserved scale |
//! | `Datum<'a>` | Runtime value (borrowed from input or arena) |
//!
//! ## Usage
//!
//! ```ignore
//! use datum_codec::types::{is_key_encodable, ColumnType, Datum};
//!
//! let ty = ColumnType::array(ColumnType::int8());
//! assert!(is_key_encodable(&ty));
//! let value = Datum::array(vec![Datum::Int(1), Datum::Null]);
//! ```

mod column;
mod datum;
mod decimal;
mod family;

pub use column::ColumnType;
pub use datum::{interval_micros, Datum};
pub use decimal::{Decimal, DecimalForm};
pub use family::{family_of, is_key_encodable, Family};
