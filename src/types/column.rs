//! # Column Type Descriptors
//!
//! [`ColumnType`] pairs a [`Family`] with the family-specific parameters the
//! codec needs:
//!
//! - `width`: INT2/INT4/INT8 (2, 4 or 8 bytes)
//! - `precision/scale`: DECIMAL(p,s), informational only
//! - `locale`: collation locale for collated strings
//! - `element`: ARRAY element type
//! - `fields/labels`: TUPLE field types and optional labels
//! - `enum_type_id`: the user-defined enum this column belongs to
//!
//! Descriptors are owned by the schema layer and only borrowed by the codec.
//!
//! ## Usage
//!
//! ```ignore
//! use datum_codec::types::ColumnType;
//!
//! let id = ColumnType::int8();
//! let tags = ColumnType::array(ColumnType::string());
//! let pair = ColumnType::labeled_tuple(
//!     vec![ColumnType::int8(), ColumnType::string()],
//!     vec!["a".into(), "b".into()],
//! );
//! ```

use super::Family;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnType {
    family: Family,
    width: u8,
    precision: Option<u8>,
    scale: Option<u8>,
    locale: Option<String>,
    element: Option<Box<ColumnType>>,
    fields: Vec<ColumnType>,
    labels: Vec<String>,
    enum_type_id: Option<u32>,
}

impl ColumnType {
    /// Creates a descriptor with default parameters for the family.
    pub fn new(family: Family) -> Self {
        Self {
            family,
            width: if family == Family::Int { 8 } else { 0 },
            precision: None,
            scale: None,
            locale: None,
            element: None,
            fields: Vec::new(),
            labels: Vec::new(),
            enum_type_id: None,
        }
    }

    pub fn bool() -> Self {
        Self::new(Family::Bool)
    }

    /// Creates an integer type of the given byte width (2, 4 or 8).
    pub fn int(width: u8) -> Self {
        debug_assert!(matches!(width, 2 | 4 | 8), "invalid INT width {}", width);
        Self {
            width,
            ..Self::new(Family::Int)
        }
    }

    pub fn int2() -> Self {
        Self::int(2)
    }

    pub fn int4() -> Self {
        Self::int(4)
    }

    pub fn int8() -> Self {
        Self::int(8)
    }

    pub fn float() -> Self {
        Self::new(Family::Float)
    }

    pub fn decimal(precision: u8, scale: u8) -> Self {
        Self {
            precision: Some(precision),
            scale: Some(scale),
            ..Self::new(Family::Decimal)
        }
    }

    pub fn string() -> Self {
        Self::new(Family::String)
    }

    pub fn bytes() -> Self {
        Self::new(Family::Bytes)
    }

    pub fn collated_string(locale: impl Into<String>) -> Self {
        Self {
            locale: Some(locale.into()),
            ..Self::new(Family::CollatedString)
        }
    }

    pub fn json() -> Self {
        Self::new(Family::Json)
    }

    pub fn geometry() -> Self {
        Self::new(Family::Geometry)
    }

    pub fn geography() -> Self {
        Self::new(Family::Geography)
    }

    pub fn enumeration(type_id: u32) -> Self {
        Self {
            enum_type_id: Some(type_id),
            ..Self::new(Family::Enum)
        }
    }

    /// Creates an ARRAY type with the given element type. Nested arrays are
    /// built by passing another array type.
    pub fn array(element: ColumnType) -> Self {
        Self {
            element: Some(Box::new(element)),
            ..Self::new(Family::Array)
        }
    }

    pub fn tuple(fields: Vec<ColumnType>) -> Self {
        Self {
            fields,
            ..Self::new(Family::Tuple)
        }
    }

    /// Creates a TUPLE type with labels. Labels must be empty or match the
    /// field count.
    pub fn labeled_tuple(fields: Vec<ColumnType>, labels: Vec<String>) -> Self {
        debug_assert!(labels.is_empty() || labels.len() == fields.len());
        Self {
            fields,
            labels,
            ..Self::new(Family::Tuple)
        }
    }

    pub fn family(&self) -> Family {
        self.family
    }

    /// Returns the integer width in bytes. Zero for non-integer families.
    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn precision(&self) -> Option<u8> {
        self.precision
    }

    pub fn scale(&self) -> Option<u8> {
        self.scale
    }

    pub fn locale(&self) -> Option<&str> {
        self.locale.as_deref()
    }

    pub fn element_type(&self) -> Option<&ColumnType> {
        self.element.as_deref()
    }

    pub fn fields(&self) -> &[ColumnType] {
        &self.fields
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn enum_type_id(&self) -> Option<u32> {
        self.enum_type_id
    }
}
