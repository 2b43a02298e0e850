//! # Type Families and Key Encodability
//!
//! A [`Family`] groups SQL types that share an encoding strategy. The family
//! is derived once from a [`ColumnType`] and every codec entry point dispatches
//! on it with a single `match`.
//!
//! ## Discriminant Values
//!
//! Discriminants are grouped by category, mirroring the storage layout:
//! - 0-9: Fixed-width scalars
//! - 20-26: Variable-length scalars
//! - 30-31: Numeric
//! - 70-71: Composite
//!
//! ## Key Encodability
//!
//! | Family | Key-encodable |
//! |--------|---------------|
//! | Json, CollatedString, Tuple, Geometry, Geography | no |
//! | Array | iff its element type is |
//! | everything else (Decimal included) | yes |
//!
//! The excluded set is a policy table, not a derived property. Adding a
//! family to the key-encodable set requires an order-preservation proof (and
//! a property test) for that family first.

use super::ColumnType;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Bool = 0,
    Int = 1,
    Float = 2,
    Date = 3,
    Time = 4,
    Timestamp = 5,
    TimestampTz = 6,
    Interval = 7,
    Uuid = 8,
    Oid = 9,

    String = 20,
    Bytes = 21,
    CollatedString = 22,
    Json = 23,
    Geometry = 24,
    Geography = 25,
    Enum = 26,

    Decimal = 30,

    Array = 70,
    Tuple = 71,
}

impl Family {
    pub fn name(&self) -> &'static str {
        match self {
            Family::Bool => "BOOL",
            Family::Int => "INT",
            Family::Float => "FLOAT",
            Family::Date => "DATE",
            Family::Time => "TIME",
            Family::Timestamp => "TIMESTAMP",
            Family::TimestampTz => "TIMESTAMPTZ",
            Family::Interval => "INTERVAL",
            Family::Uuid => "UUID",
            Family::Oid => "OID",
            Family::String => "STRING",
            Family::Bytes => "BYTES",
            Family::CollatedString => "COLLATEDSTRING",
            Family::Json => "JSONB",
            Family::Geometry => "GEOMETRY",
            Family::Geography => "GEOGRAPHY",
            Family::Enum => "ENUM",
            Family::Decimal => "DECIMAL",
            Family::Array => "ARRAY",
            Family::Tuple => "TUPLE",
        }
    }

    /// Families that never have a key encoding of their own, regardless of
    /// parameters.
    fn excluded_from_keys(&self) -> bool {
        matches!(
            self,
            Family::Json
                | Family::CollatedString
                | Family::Tuple
                | Family::Geometry
                | Family::Geography
        )
    }
}

impl TryFrom<u8> for Family {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Family::Bool),
            1 => Ok(Family::Int),
            2 => Ok(Family::Float),
            3 => Ok(Family::Date),
            4 => Ok(Family::Time),
            5 => Ok(Family::Timestamp),
            6 => Ok(Family::TimestampTz),
            7 => Ok(Family::Interval),
            8 => Ok(Family::Uuid),
            9 => Ok(Family::Oid),
            20 => Ok(Family::String),
            21 => Ok(Family::Bytes),
            22 => Ok(Family::CollatedString),
            23 => Ok(Family::Json),
            24 => Ok(Family::Geometry),
            25 => Ok(Family::Geography),
            26 => Ok(Family::Enum),
            30 => Ok(Family::Decimal),
            70 => Ok(Family::Array),
            71 => Ok(Family::Tuple),
            _ => eyre::bail!("invalid Family discriminant: {}", value),
        }
    }
}

/// Returns the family of a type descriptor.
pub fn family_of(ty: &ColumnType) -> Family {
    ty.family()
}

/// Reports whether values of this type may participate in an index key.
pub fn is_key_encodable(ty: &ColumnType) -> bool {
    match ty.family() {
        Family::Array => ty.element_type().is_some_and(is_key_encodable),
        family => !family.excluded_from_keys(),
    }
}
