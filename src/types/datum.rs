//! # Runtime Datum Representation
//!
//! [`Datum<'a>`] is the logical value handed to and returned by the codec.
//! Variable-length payloads use `Cow` so that decoders can borrow straight from
//! the input buffer (zero-copy) or from a `DatumAlloc` arena, while callers
//! building values for encoding can hand over owned data.
//!
//! ## Variants
//!
//! | Variant | Rust Type | Family |
//! |---------|-----------|--------|
//! | Null | - | any |
//! | Bool | bool | Bool |
//! | Int | i64 | Int |
//! | Float | f64 | Float |
//! | Decimal | Decimal<'a> | Decimal |
//! | Date | i32 days since epoch | Date |
//! | Time | i64 micros since midnight | Time |
//! | Timestamp | i64 micros since epoch | Timestamp |
//! | TimestampTz | {micros (UTC), offset_secs} | TimestampTz |
//! | Interval | {months, days, micros} | Interval |
//! | String | Cow<str> | String |
//! | Bytes | Cow<[u8]> | Bytes |
//! | CollatedString | Cow<str> | CollatedString (locale lives in the type) |
//! | Uuid | [u8; 16] | Uuid |
//! | Oid | u32 | Oid |
//! | Enum | u32 ordinal | Enum |
//! | Json | Cow<str> | Json |
//! | Geometry / Geography | Cow<[u8]> (EWKB) | Geometry / Geography |
//! | Array | Cow<[Datum]> | Array |
//! | Tuple | Cow<[Datum]> | Tuple |
//!
//! ## Comparison Semantics
//!
//! [`Datum::compare`] is a total order used for sorting and for checking the
//! key encoding: NULL sorts first, NaN sorts below every other float,
//! `-0.0 == 0.0`, TIMESTAMPTZ compares the UTC instant only, arrays and tuples
//! compare element-wise with a strict prefix sorting first. Equality is
//! defined by the same order, so `1.50 == 1.5`.

use super::{Decimal, Family};
use crate::config::{DAYS_PER_MONTH, MICROS_PER_DAY};
use std::borrow::Cow;
use std::cmp::Ordering;

#[derive(Debug, Clone)]
pub enum Datum<'a> {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal<'a>),
    Date(i32),
    Time(i64),
    Timestamp(i64),
    TimestampTz { micros: i64, offset_secs: i32 },
    Interval { months: i32, days: i32, micros: i64 },
    String(Cow<'a, str>),
    Bytes(Cow<'a, [u8]>),
    CollatedString(Cow<'a, str>),
    Uuid([u8; 16]),
    Oid(u32),
    Enum(u32),
    Json(Cow<'a, str>),
    Geometry(Cow<'a, [u8]>),
    Geography(Cow<'a, [u8]>),
    Array(Cow<'a, [Datum<'a>]>),
    Tuple(Cow<'a, [Datum<'a>]>),
}

impl<'a> Datum<'a> {
    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null)
    }

    /// Returns the family this datum belongs to, or None for NULL.
    pub fn family(&self) -> Option<Family> {
        let family = match self {
            Datum::Null => return None,
            Datum::Bool(_) => Family::Bool,
            Datum::Int(_) => Family::Int,
            Datum::Float(_) => Family::Float,
            Datum::Decimal(_) => Family::Decimal,
            Datum::Date(_) => Family::Date,
            Datum::Time(_) => Family::Time,
            Datum::Timestamp(_) => Family::Timestamp,
            Datum::TimestampTz { .. } => Family::TimestampTz,
            Datum::Interval { .. } => Family::Interval,
            Datum::String(_) => Family::String,
            Datum::Bytes(_) => Family::Bytes,
            Datum::CollatedString(_) => Family::CollatedString,
            Datum::Uuid(_) => Family::Uuid,
            Datum::Oid(_) => Family::Oid,
            Datum::Enum(_) => Family::Enum,
            Datum::Json(_) => Family::Json,
            Datum::Geometry(_) => Family::Geometry,
            Datum::Geography(_) => Family::Geography,
            Datum::Array(_) => Family::Array,
            Datum::Tuple(_) => Family::Tuple,
        };
        Some(family)
    }

    pub fn string(s: impl Into<Cow<'a, str>>) -> Self {
        Datum::String(s.into())
    }

    pub fn bytes(b: impl Into<Cow<'a, [u8]>>) -> Self {
        Datum::Bytes(b.into())
    }

    pub fn array(elements: Vec<Datum<'a>>) -> Self {
        Datum::Array(Cow::Owned(elements))
    }

    pub fn tuple(fields: Vec<Datum<'a>>) -> Self {
        Datum::Tuple(Cow::Owned(fields))
    }

    /// True when this datum, or any element nested in it, owns a heap
    /// buffer that must be dropped to be freed.
    pub(crate) fn owns_heap(&self) -> bool {
        match self {
            Datum::Decimal(d) => d.owns_heap(),
            Datum::String(Cow::Owned(s))
            | Datum::CollatedString(Cow::Owned(s))
            | Datum::Json(Cow::Owned(s)) => s.capacity() > 0,
            Datum::Bytes(Cow::Owned(b))
            | Datum::Geometry(Cow::Owned(b))
            | Datum::Geography(Cow::Owned(b)) => b.capacity() > 0,
            Datum::Array(Cow::Owned(elems)) | Datum::Tuple(Cow::Owned(elems)) => {
                elems.capacity() > 0
            }
            Datum::Array(Cow::Borrowed(elems)) | Datum::Tuple(Cow::Borrowed(elems)) => {
                elems.iter().any(Datum::owns_heap)
            }
            _ => false,
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Datum::Null => 0,
            Datum::Bool(_) => 1,
            Datum::Int(_) => 2,
            Datum::Float(_) => 3,
            Datum::Decimal(_) => 4,
            Datum::Date(_) => 5,
            Datum::Time(_) => 6,
            Datum::Timestamp(_) => 7,
            Datum::TimestampTz { .. } => 8,
            Datum::Interval { .. } => 9,
            Datum::String(_) => 10,
            Datum::Bytes(_) => 11,
            Datum::CollatedString(_) => 12,
            Datum::Uuid(_) => 13,
            Datum::Oid(_) => 14,
            Datum::Enum(_) => 15,
            Datum::Json(_) => 16,
            Datum::Geometry(_) => 17,
            Datum::Geography(_) => 18,
            Datum::Array(_) => 19,
            Datum::Tuple(_) => 20,
        }
    }

    /// Compares two datums with NULL sorting first. Datums of different
    /// families are ordered by family so the result is always total.
    pub fn compare(&self, other: &Datum) -> Ordering {
        match (self, other) {
            (Datum::Null, Datum::Null) => Ordering::Equal,
            (Datum::Bool(a), Datum::Bool(b)) => a.cmp(b),
            (Datum::Int(a), Datum::Int(b)) => a.cmp(b),
            (Datum::Float(a), Datum::Float(b)) => compare_floats(*a, *b),
            (Datum::Decimal(a), Datum::Decimal(b)) => a.compare(b),
            (Datum::Date(a), Datum::Date(b)) => a.cmp(b),
            (Datum::Time(a), Datum::Time(b)) => a.cmp(b),
            (Datum::Timestamp(a), Datum::Timestamp(b)) => a.cmp(b),
            (Datum::TimestampTz { micros: a, .. }, Datum::TimestampTz { micros: b, .. }) => {
                a.cmp(b)
            }
            (
                Datum::Interval {
                    months: am,
                    days: ad,
                    micros: a,
                },
                Datum::Interval {
                    months: bm,
                    days: bd,
                    micros: b,
                },
            ) => (interval_micros(*am, *ad, *a), am, ad)
                .cmp(&(interval_micros(*bm, *bd, *b), bm, bd)),
            (Datum::String(a), Datum::String(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Datum::Bytes(a), Datum::Bytes(b)) => a.cmp(b),
            (Datum::CollatedString(a), Datum::CollatedString(b)) => a.cmp(b),
            (Datum::Uuid(a), Datum::Uuid(b)) => a.cmp(b),
            (Datum::Oid(a), Datum::Oid(b)) => a.cmp(b),
            (Datum::Enum(a), Datum::Enum(b)) => a.cmp(b),
            (Datum::Json(a), Datum::Json(b)) => a.cmp(b),
            (Datum::Geometry(a), Datum::Geometry(b)) => a.cmp(b),
            (Datum::Geography(a), Datum::Geography(b)) => a.cmp(b),
            (Datum::Array(a), Datum::Array(b)) => compare_sequences(a, b),
            (Datum::Tuple(a), Datum::Tuple(b)) => compare_sequences(a, b),
            _ => self.rank().cmp(&other.rank()),
        }
    }

    /// Detaches this datum from any buffer or arena it borrows from.
    pub fn into_owned(self) -> Datum<'static> {
        match self {
            Datum::Null => Datum::Null,
            Datum::Bool(b) => Datum::Bool(b),
            Datum::Int(i) => Datum::Int(i),
            Datum::Float(f) => Datum::Float(f),
            Datum::Decimal(d) => Datum::Decimal(d.into_owned()),
            Datum::Date(d) => Datum::Date(d),
            Datum::Time(t) => Datum::Time(t),
            Datum::Timestamp(t) => Datum::Timestamp(t),
            Datum::TimestampTz {
                micros,
                offset_secs,
            } => Datum::TimestampTz {
                micros,
                offset_secs,
            },
            Datum::Interval {
                months,
                days,
                micros,
            } => Datum::Interval {
                months,
                days,
                micros,
            },
            Datum::String(s) => Datum::String(Cow::Owned(s.into_owned())),
            Datum::Bytes(b) => Datum::Bytes(Cow::Owned(b.into_owned())),
            Datum::CollatedString(s) => Datum::CollatedString(Cow::Owned(s.into_owned())),
            Datum::Uuid(u) => Datum::Uuid(u),
            Datum::Oid(o) => Datum::Oid(o),
            Datum::Enum(e) => Datum::Enum(e),
            Datum::Json(j) => Datum::Json(Cow::Owned(j.into_owned())),
            Datum::Geometry(g) => Datum::Geometry(Cow::Owned(g.into_owned())),
            Datum::Geography(g) => Datum::Geography(Cow::Owned(g.into_owned())),
            Datum::Array(elems) => Datum::Array(Cow::Owned(owned_elements(elems))),
            Datum::Tuple(fields) => Datum::Tuple(Cow::Owned(owned_elements(fields))),
        }
    }
}

fn owned_elements(elems: Cow<'_, [Datum<'_>]>) -> Vec<Datum<'static>> {
    elems.iter().cloned().map(Datum::into_owned).collect()
}

/// Normalized length of an interval in microseconds, counting a month as 30
/// days. Equal durations with different field splits are ordered by months
/// then days.
pub fn interval_micros(months: i32, days: i32, micros: i64) -> i128 {
    (months as i128 * DAYS_PER_MONTH + days as i128) * MICROS_PER_DAY + micros as i128
}

fn compare_floats(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn compare_sequences(a: &[Datum], b: &[Datum]) -> Ordering {
    for (x, y) in a.iter().zip(b.iter()) {
        match x.compare(y) {
            Ordering::Equal => continue,
            unequal => return unequal,
        }
    }
    a.len().cmp(&b.len())
}

impl<'b> PartialEq<Datum<'b>> for Datum<'_> {
    fn eq(&self, other: &Datum<'b>) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl Eq for Datum<'_> {}

impl PartialOrd for Datum<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.compare(other))
    }
}

impl Ord for Datum<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.compare(other)
    }
}

impl From<i64> for Datum<'_> {
    fn from(v: i64) -> Self {
        Datum::Int(v)
    }
}

impl From<f64> for Datum<'_> {
    fn from(v: f64) -> Self {
        Datum::Float(v)
    }
}

impl From<bool> for Datum<'_> {
    fn from(v: bool) -> Self {
        Datum::Bool(v)
    }
}

impl<'a> From<&'a str> for Datum<'a> {
    fn from(v: &'a str) -> Self {
        Datum::String(Cow::Borrowed(v))
    }
}

impl<'a> From<Decimal<'a>> for Datum<'a> {
    fn from(v: Decimal<'a>) -> Self {
        Datum::Decimal(v)
    }
}
