//! # Composite Key Encoding
//!
//! ## Arrays
//!
//! ```text
//! 0x40 [elem | 0x01]* 0x00
//! ```
//!
//! Each element is either `0x01` (NULL) or the element's own ascending key
//! encoding, whose marker is always `>= 0x02`. The terminator `0x00` sorts
//! below every element, so an array that is a strict prefix of another sorts
//! first: `[1, NULL] < [1, NULL, 3]`. No element count is stored.
//!
//! ## Tuples
//!
//! Tuple keys are the concatenation of each field's key encoding in declared
//! order, all written in one tuple-wide direction. NULL fields use the regular
//! `0x00` NULL marker. Tuples are not key-encodable as a single column; they
//! are encoded through [`encode_tuple_key`] when a key is made of several
//! logical parts.

use super::key::{
    apply_direction, decode_component, encode_ascending, ensure_key_encodable, expect_marker,
    markers, Direction, KeyReader,
};
use crate::error::CodecError;
use crate::memory::DatumAlloc;
use crate::types::{ColumnType, Datum, Family};
use eyre::{bail, Result};
use std::borrow::Cow;

pub(crate) fn encode_array_key(
    elem_ty: &ColumnType,
    elems: &[Datum],
    buf: &mut Vec<u8>,
) -> Result<()> {
    buf.push(markers::ARRAY);
    for elem in elems {
        if elem.is_null() {
            buf.push(markers::ARRAY_NULL_ELEMENT);
        } else {
            encode_ascending(elem_ty, elem, buf)?;
        }
    }
    buf.push(markers::ARRAY_TERMINATOR);
    Ok(())
}

pub(crate) fn decode_array_key<'a>(
    alloc: &'a DatumAlloc,
    elem_ty: &ColumnType,
    r: &mut KeyReader<'a>,
) -> Result<Datum<'a>> {
    expect_marker(r, markers::ARRAY, Family::Array)?;
    let mut elems = alloc.datum_vec(4);
    loop {
        match r.peek()? {
            markers::ARRAY_TERMINATOR => {
                r.read_u8()?;
                break;
            }
            markers::ARRAY_NULL_ELEMENT => {
                r.read_u8()?;
                elems.push(Datum::Null);
            }
            _ => elems.push(decode_component(alloc, elem_ty, r)?),
        }
    }
    Ok(Datum::Array(Cow::Borrowed(elems.into_bump_slice())))
}

fn tuple_fields<'t>(ty: &'t ColumnType) -> Result<&'t [ColumnType]> {
    if ty.family() != Family::Tuple {
        bail!(CodecError::mismatch(format!(
            "tuple key requested for {} column",
            ty.family().name()
        )));
    }
    for field in ty.fields() {
        ensure_key_encodable(field)?;
    }
    Ok(ty.fields())
}

/// Appends the key encoding of every field of a tuple datum. On error `buf` is
/// left as it was on entry.
pub fn encode_tuple_key(
    ty: &ColumnType,
    datum: &Datum,
    dir: Direction,
    buf: &mut Vec<u8>,
) -> Result<()> {
    let fields = tuple_fields(ty)?;
    let Datum::Tuple(values) = datum else {
        bail!(CodecError::mismatch(
            "tuple key requires a tuple datum; NULL tuples have no key encoding"
        ));
    };
    if values.len() != fields.len() {
        bail!(CodecError::mismatch(format!(
            "tuple datum has {} fields, type declares {}",
            values.len(),
            fields.len()
        )));
    }

    let start = buf.len();
    for (field_ty, value) in fields.iter().zip(values.iter()) {
        if let Err(e) = encode_ascending(field_ty, value, buf) {
            buf.truncate(start);
            return Err(e);
        }
    }
    apply_direction(buf, start, dir);
    Ok(())
}

/// Decodes a tuple key written by [`encode_tuple_key`], returning the tuple
/// datum and the bytes consumed.
pub fn decode_tuple_key<'a>(
    alloc: &'a DatumAlloc,
    ty: &ColumnType,
    buf: &'a [u8],
    dir: Direction,
) -> Result<(Datum<'a>, usize)> {
    let fields = tuple_fields(ty)?;
    let mut r = KeyReader::new(buf, dir);
    let mut values = alloc.datum_vec(fields.len());
    for field_ty in fields {
        values.push(decode_component(alloc, field_ty, &mut r)?);
    }
    Ok((Datum::Tuple(Cow::Borrowed(values.into_bump_slice())), r.position()))
}
