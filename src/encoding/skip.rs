//! # Key Skipper
//!
//! Range scans and key-prefix comparisons need to step over key columns they
//! do not care about. Decoding those columns would allocate and validate far
//! more than needed, so the skipper only follows markers, escapes and
//! terminators far enough to find where a component ends.
//!
//! | Family | Boundary found by |
//! |--------|-------------------|
//! | Int, Oid, Enum | marker encodes the magnitude length |
//! | Float | marker (0 or 8 payload bytes) |
//! | Decimal | marker, optional exponent, even terminal mantissa byte |
//! | Date/Time/Timestamp/Interval/Uuid | fixed payload after marker |
//! | String, Bytes | unescaped `0x00 0x01` terminator |
//! | Array | per-element skip until `0x00` |
//!
//! For every well-formed component, `skip_key` returns exactly the length
//! `decode_key` consumes. Malformed input fails with the same error kinds.

use super::decimal::skip_decimal_key;
use super::key::{
    ensure_key_encodable, expect_marker, fixed_layout, float_payload_len, int_payload_len,
    markers, scan_escaped, Direction, KeyReader,
};
use crate::error::CodecError;
use crate::types::{ColumnType, Family};
use eyre::{bail, Result};

fn skip_int(r: &mut KeyReader, family: Family, unsigned: bool) -> Result<()> {
    let marker = r.read_u8()?;
    match int_payload_len(marker) {
        Some(_) if unsigned && marker <= markers::INT_NEG_MAX => {}
        Some(len) => return r.advance(len),
        None => {}
    }
    bail!(CodecError::malformed(format!(
        "invalid {} key marker {:#04x}",
        family.name(),
        marker
    )))
}

pub(crate) fn skip_component(r: &mut KeyReader, ty: &ColumnType) -> Result<()> {
    if r.peek()? == markers::NULL {
        return r.advance(1);
    }

    let family = ty.family();
    match family {
        Family::Bool => match r.read_u8()? {
            markers::FALSE | markers::TRUE => Ok(()),
            other => bail!(CodecError::malformed(format!(
                "invalid bool key marker {:#04x}",
                other
            ))),
        },
        Family::Int => skip_int(r, family, false),
        Family::Oid | Family::Enum => skip_int(r, family, true),
        Family::Float => {
            let marker = r.read_u8()?;
            match float_payload_len(marker) {
                Some(len) => r.advance(len),
                None => bail!(CodecError::malformed(format!(
                    "invalid float key marker {:#04x}",
                    marker
                ))),
            }
        }
        Family::Decimal => skip_decimal_key(r),
        Family::Date
        | Family::Time
        | Family::Timestamp
        | Family::TimestampTz
        | Family::Interval
        | Family::Uuid => {
            let Some((marker, len)) = fixed_layout(family) else {
                bail!(CodecError::internal(format!(
                    "{} has no fixed key layout",
                    family.name()
                )));
            };
            expect_marker(r, marker, family)?;
            r.advance(len)
        }
        Family::String | Family::Bytes => {
            expect_marker(r, markers::BYTES, family)?;
            scan_escaped(r).map(|_| ())
        }
        Family::Array => {
            let Some(elem_ty) = ty.element_type() else {
                bail!(CodecError::internal("array type without element type"));
            };
            expect_marker(r, markers::ARRAY, family)?;
            loop {
                match r.peek()? {
                    markers::ARRAY_TERMINATOR => return r.advance(1),
                    markers::ARRAY_NULL_ELEMENT => r.advance(1)?,
                    _ => skip_component(r, elem_ty)?,
                }
            }
        }
        Family::Json
        | Family::CollatedString
        | Family::Tuple
        | Family::Geometry
        | Family::Geography => bail!(CodecError::internal(format!(
            "{} reached the key skipper",
            family.name()
        ))),
    }
}

/// Returns the number of bytes the key component at the front of `buf`
/// occupies, without decoding it.
pub fn skip_key(buf: &[u8], ty: &ColumnType, dir: Direction) -> Result<usize> {
    ensure_key_encodable(ty)?;
    let mut r = KeyReader::new(buf, dir);
    skip_component(&mut r, ty)?;
    Ok(r.position())
}

/// Returns the number of bytes a tuple key written by `encode_tuple_key`
/// occupies.
pub fn skip_tuple_key(buf: &[u8], ty: &ColumnType, dir: Direction) -> Result<usize> {
    if ty.family() != Family::Tuple {
        bail!(CodecError::mismatch(format!(
            "tuple key skip requested for {} column",
            ty.family().name()
        )));
    }
    let mut r = KeyReader::new(buf, dir);
    for field in ty.fields() {
        ensure_key_encodable(field)?;
        skip_component(&mut r, field)?;
    }
    Ok(r.position())
}
