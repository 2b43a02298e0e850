//! # Column Value Encoding
//!
//! Non-key columns are stored as a packed run of self-describing entries:
//!
//! ```text
//! +---------------+------------+-------------------------------+
//! | column_id     | tag        | payload                       |
//! | varint        | varint     | fixed LE | varint(len) body   |
//! +---------------+------------+-------------------------------+
//! ```
//!
//! The encoding is not order preserving. It is compact, tagged with the
//! column so readers can pick out the columns they need, and skippable
//! without a type descriptor: the tag alone determines the payload size.
//!
//! ## Value Tags
//!
//! The tag refines the schema type. Readers accept any tag of the column's
//! family, so an `INT8` column still reads entries written as `Int4` while a
//! schema change is in flight.
//!
//! | Tag | Payload |
//! |-----|---------|
//! | Null, False, True | none |
//! | Int2 / Int4 / Int8 | 2 / 4 / 8 bytes LE |
//! | Float | f64 bits LE |
//! | Date | days i32 LE |
//! | Time, Timestamp | micros i64 LE |
//! | TimestampTz | micros i64 LE, offset_secs i32 LE |
//! | Interval | micros i64 LE, days i32 LE, months i32 LE |
//! | Uuid | 16 bytes |
//! | Enum, Oid | u32 LE |
//! | Decimal | varint(len), flags u8, exponent i32 LE, packed digits |
//! | String, Bytes, CollatedString, Json, Geometry, Geography | varint(len), bytes |
//! | Array, Tuple | varint(len), varint(count), nested entries |
//!
//! Nested array elements and tuple fields are full entries tagged with
//! `NO_COLUMN_ID`, so NULL elements cost two bytes.
//!
//! ## Decimal Body
//!
//! ```text
//! flags:    bit 0 = negative, bits 1-2 = form (0 finite, 1 infinite, 2 NaN)
//! exponent: i32 LE, value = digits × 10^exponent
//! digits:   two per byte, high nibble first; odd counts end in a 0xF nibble
//! ```
//!
//! Digits are stored exactly as given, so `1.50` reads back with its scale.
//!
//! ## Selective Decoding
//!
//! [`ValueScanner`] walks a row's entries left to right, yielding the column
//! id, tag and raw bytes of each without decoding payloads.

use super::key::{check_int_width, mismatch};
use super::varint::{decode_varint, decode_varint_u32, put_varint};
use crate::config::{MAX_DECIMAL_DIGITS, MAX_VALUE_PAYLOAD_LEN, NO_COLUMN_ID};
use crate::error::CodecError;
use crate::memory::DatumAlloc;
use crate::types::{ColumnType, Datum, Decimal, DecimalForm, Family};
use eyre::{bail, Result};
use smallvec::SmallVec;
use std::borrow::Cow;

pub type ColumnId = u32;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueTag {
    Null = 0,
    False = 1,
    True = 2,
    Int2 = 3,
    Int4 = 4,
    Int8 = 5,
    Float = 6,
    Decimal = 7,
    String = 8,
    Bytes = 9,
    CollatedString = 10,
    Json = 11,
    Geometry = 12,
    Geography = 13,
    Date = 14,
    Time = 15,
    Timestamp = 16,
    TimestampTz = 17,
    Interval = 18,
    Uuid = 19,
    Enum = 20,
    Oid = 21,
    Array = 22,
    Tuple = 23,
}

impl ValueTag {
    /// Family the tag belongs to. NULL belongs to every family.
    pub fn family(&self) -> Option<Family> {
        let family = match self {
            ValueTag::Null => return None,
            ValueTag::False | ValueTag::True => Family::Bool,
            ValueTag::Int2 | ValueTag::Int4 | ValueTag::Int8 => Family::Int,
            ValueTag::Float => Family::Float,
            ValueTag::Decimal => Family::Decimal,
            ValueTag::String => Family::String,
            ValueTag::Bytes => Family::Bytes,
            ValueTag::CollatedString => Family::CollatedString,
            ValueTag::Json => Family::Json,
            ValueTag::Geometry => Family::Geometry,
            ValueTag::Geography => Family::Geography,
            ValueTag::Date => Family::Date,
            ValueTag::Time => Family::Time,
            ValueTag::Timestamp => Family::Timestamp,
            ValueTag::TimestampTz => Family::TimestampTz,
            ValueTag::Interval => Family::Interval,
            ValueTag::Uuid => Family::Uuid,
            ValueTag::Enum => Family::Enum,
            ValueTag::Oid => Family::Oid,
            ValueTag::Array => Family::Array,
            ValueTag::Tuple => Family::Tuple,
        };
        Some(family)
    }

    /// Payload size for fixed-size tags, None for length-prefixed ones.
    pub fn fixed_payload_len(&self) -> Option<usize> {
        match self {
            ValueTag::Null | ValueTag::False | ValueTag::True => Some(0),
            ValueTag::Int2 => Some(2),
            ValueTag::Int4 => Some(4),
            ValueTag::Int8 => Some(8),
            ValueTag::Float => Some(8),
            ValueTag::Date => Some(4),
            ValueTag::Time | ValueTag::Timestamp => Some(8),
            ValueTag::TimestampTz => Some(12),
            ValueTag::Interval | ValueTag::Uuid => Some(16),
            ValueTag::Enum | ValueTag::Oid => Some(4),
            ValueTag::Decimal
            | ValueTag::String
            | ValueTag::Bytes
            | ValueTag::CollatedString
            | ValueTag::Json
            | ValueTag::Geometry
            | ValueTag::Geography
            | ValueTag::Array
            | ValueTag::Tuple => None,
        }
    }
}

impl TryFrom<u8> for ValueTag {
    type Error = eyre::Report;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let tag = match value {
            0 => ValueTag::Null,
            1 => ValueTag::False,
            2 => ValueTag::True,
            3 => ValueTag::Int2,
            4 => ValueTag::Int4,
            5 => ValueTag::Int8,
            6 => ValueTag::Float,
            7 => ValueTag::Decimal,
            8 => ValueTag::String,
            9 => ValueTag::Bytes,
            10 => ValueTag::CollatedString,
            11 => ValueTag::Json,
            12 => ValueTag::Geometry,
            13 => ValueTag::Geography,
            14 => ValueTag::Date,
            15 => ValueTag::Time,
            16 => ValueTag::Timestamp,
            17 => ValueTag::TimestampTz,
            18 => ValueTag::Interval,
            19 => ValueTag::Uuid,
            20 => ValueTag::Enum,
            21 => ValueTag::Oid,
            22 => ValueTag::Array,
            23 => ValueTag::Tuple,
            _ => bail!(CodecError::malformed(format!("invalid value tag: {}", value))),
        };
        Ok(tag)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValueHeader {
    pub column_id: ColumnId,
    pub tag: ValueTag,
    /// Bytes occupied by the column id and tag varints.
    pub header_len: usize,
}

// ============================================================================
// ENCODING
// ============================================================================

/// Chooses the tag for a datum of the given column type.
pub(crate) fn value_tag(ty: &ColumnType, datum: &Datum) -> Result<ValueTag> {
    let tag = match (ty.family(), datum) {
        (_, Datum::Null) => ValueTag::Null,
        (Family::Bool, Datum::Bool(false)) => ValueTag::False,
        (Family::Bool, Datum::Bool(true)) => ValueTag::True,
        (Family::Int, Datum::Int(v)) => {
            check_int_width(ty, *v)?;
            match ty.width() {
                2 => ValueTag::Int2,
                4 => ValueTag::Int4,
                _ => ValueTag::Int8,
            }
        }
        (Family::Float, Datum::Float(_)) => ValueTag::Float,
        (Family::Decimal, Datum::Decimal(d)) => {
            if d.digits().len() > MAX_DECIMAL_DIGITS {
                bail!(CodecError::overflow(format!(
                    "decimal of {} digits exceeds {}",
                    d.digits().len(),
                    MAX_DECIMAL_DIGITS
                )));
            }
            ValueTag::Decimal
        }
        (Family::String, Datum::String(_)) => ValueTag::String,
        (Family::Bytes, Datum::Bytes(_)) => ValueTag::Bytes,
        (Family::CollatedString, Datum::CollatedString(_)) => ValueTag::CollatedString,
        (Family::Json, Datum::Json(_)) => ValueTag::Json,
        (Family::Geometry, Datum::Geometry(_)) => ValueTag::Geometry,
        (Family::Geography, Datum::Geography(_)) => ValueTag::Geography,
        (Family::Date, Datum::Date(_)) => ValueTag::Date,
        (Family::Time, Datum::Time(_)) => ValueTag::Time,
        (Family::Timestamp, Datum::Timestamp(_)) => ValueTag::Timestamp,
        (Family::TimestampTz, Datum::TimestampTz { .. }) => ValueTag::TimestampTz,
        (Family::Interval, Datum::Interval { .. }) => ValueTag::Interval,
        (Family::Uuid, Datum::Uuid(_)) => ValueTag::Uuid,
        (Family::Enum, Datum::Enum(_)) => ValueTag::Enum,
        (Family::Oid, Datum::Oid(_)) => ValueTag::Oid,
        (Family::Array, Datum::Array(_)) => ValueTag::Array,
        (Family::Tuple, Datum::Tuple(_)) => ValueTag::Tuple,
        _ => bail!(mismatch(ty, datum)),
    };
    Ok(tag)
}

fn put_length_prefixed(buf: &mut Vec<u8>, body: &[u8]) {
    put_varint(buf, body.len() as u64);
    buf.extend_from_slice(body);
}

fn decimal_body(d: &Decimal) -> SmallVec<[u8; 32]> {
    let form = match d.form() {
        DecimalForm::Finite => 0u8,
        DecimalForm::Infinite => 1,
        DecimalForm::NaN => 2,
    };
    let mut body = SmallVec::new();
    body.push((form << 1) | d.is_negative() as u8);
    body.extend_from_slice(&d.exponent().to_le_bytes());
    for chunk in d.digits().chunks(2) {
        let lo = chunk.get(1).copied().unwrap_or(0x0F);
        body.push((chunk[0] << 4) | lo);
    }
    body
}

/// Appends the payload for `datum`, whose tag was chosen by `value_tag`.
pub(crate) fn encode_payload(ty: &ColumnType, datum: &Datum, buf: &mut Vec<u8>) -> Result<()> {
    match datum {
        Datum::Null | Datum::Bool(_) => {}
        Datum::Int(v) => match ty.width() {
            2 => buf.extend_from_slice(&(*v as i16).to_le_bytes()),
            4 => buf.extend_from_slice(&(*v as i32).to_le_bytes()),
            _ => buf.extend_from_slice(&v.to_le_bytes()),
        },
        Datum::Float(f) => buf.extend_from_slice(&f.to_bits().to_le_bytes()),
        Datum::Decimal(d) => put_length_prefixed(buf, &decimal_body(d)),
        Datum::Date(days) => buf.extend_from_slice(&days.to_le_bytes()),
        Datum::Time(micros) | Datum::Timestamp(micros) => {
            buf.extend_from_slice(&micros.to_le_bytes())
        }
        Datum::TimestampTz {
            micros,
            offset_secs,
        } => {
            buf.extend_from_slice(&micros.to_le_bytes());
            buf.extend_from_slice(&offset_secs.to_le_bytes());
        }
        Datum::Interval {
            months,
            days,
            micros,
        } => {
            buf.extend_from_slice(&micros.to_le_bytes());
            buf.extend_from_slice(&days.to_le_bytes());
            buf.extend_from_slice(&months.to_le_bytes());
        }
        Datum::Uuid(bytes) => buf.extend_from_slice(bytes),
        Datum::Enum(v) | Datum::Oid(v) => buf.extend_from_slice(&v.to_le_bytes()),
        Datum::String(s) | Datum::CollatedString(s) | Datum::Json(s) => {
            put_length_prefixed(buf, s.as_bytes())
        }
        Datum::Bytes(b) | Datum::Geometry(b) | Datum::Geography(b) => put_length_prefixed(buf, b),
        Datum::Array(elems) => {
            let Some(elem_ty) = ty.element_type() else {
                bail!(CodecError::internal("array type without element type"));
            };
            let mut body = Vec::new();
            put_varint(&mut body, elems.len() as u64);
            for elem in elems.iter() {
                encode_value(NO_COLUMN_ID, elem_ty, elem, &mut body)?;
            }
            put_length_prefixed(buf, &body);
        }
        Datum::Tuple(values) => {
            let fields = ty.fields();
            if values.len() != fields.len() {
                bail!(CodecError::mismatch(format!(
                    "tuple datum has {} fields, type declares {}",
                    values.len(),
                    fields.len()
                )));
            }
            let mut body = Vec::new();
            put_varint(&mut body, values.len() as u64);
            for (field_ty, value) in fields.iter().zip(values.iter()) {
                encode_value(NO_COLUMN_ID, field_ty, value, &mut body)?;
            }
            put_length_prefixed(buf, &body);
        }
    }
    Ok(())
}

/// Appends one `(column_id, tag, payload)` entry to `buf`. On error `buf` is
/// left as it was on entry.
pub fn encode_value(
    column_id: ColumnId,
    ty: &ColumnType,
    datum: &Datum,
    buf: &mut Vec<u8>,
) -> Result<()> {
    let tag = value_tag(ty, datum)?;
    let start = buf.len();
    put_varint(buf, column_id as u64);
    put_varint(buf, tag as u64);
    if let Err(e) = encode_payload(ty, datum, buf) {
        buf.truncate(start);
        return Err(e);
    }
    Ok(())
}

// ============================================================================
// DECODING
// ============================================================================

fn fixed<const N: usize>(buf: &[u8], tag: ValueTag) -> Result<[u8; N]> {
    match buf.get(..N) {
        Some(bytes) => {
            let mut out = [0u8; N];
            out.copy_from_slice(bytes);
            Ok(out)
        }
        None => bail!(CodecError::truncated(format!(
            "{:?} payload needs {} bytes, {} available",
            tag,
            N,
            buf.len()
        ))),
    }
}

/// Reads a `varint(len) body` payload, returning the body and the total bytes
/// consumed.
fn length_prefixed(buf: &[u8]) -> Result<(&[u8], usize)> {
    let (len, n) = decode_varint(buf)?;
    let remaining = buf.len() - n;
    if len > MAX_VALUE_PAYLOAD_LEN || len > remaining as u64 {
        bail!(CodecError::overflow(format!(
            "payload length {} exceeds {} remaining bytes",
            len, remaining
        )));
    }
    let len = usize::try_from(len)
        .map_err(|_| CodecError::overflow(format!("payload length {} exceeds usize", len)))?;
    Ok((&buf[n..n + len], n + len))
}

/// Size of the payload that follows a tag.
pub(crate) fn payload_len(tag: ValueTag, buf: &[u8]) -> Result<usize> {
    match tag.fixed_payload_len() {
        Some(n) if n > buf.len() => bail!(CodecError::truncated(format!(
            "{:?} payload needs {} bytes, {} available",
            tag,
            n,
            buf.len()
        ))),
        Some(n) => Ok(n),
        None => length_prefixed(buf).map(|(_, n)| n),
    }
}

fn utf8(bytes: &[u8], tag: ValueTag) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| CodecError::invalid(format!("{:?} payload is not UTF-8: {}", tag, e)).into())
}

fn decode_decimal_body<'a>(alloc: &'a DatumAlloc, body: &[u8]) -> Result<Decimal<'a>> {
    let Some((&flags, rest)) = body.split_first() else {
        bail!(CodecError::truncated("decimal payload missing flags"));
    };
    let exponent = i32::from_le_bytes(fixed(rest, ValueTag::Decimal)?);
    let packed = &rest[4..];
    let negative = flags & 1 == 1;
    match flags >> 1 {
        0 => {}
        1 if negative => return Ok(Decimal::neg_infinity()),
        1 => return Ok(Decimal::infinity()),
        2 => return Ok(Decimal::nan()),
        other => bail!(CodecError::invalid(format!("invalid decimal form {}", other))),
    }

    let odd = packed.last().is_some_and(|b| b & 0x0F == 0x0F);
    let count = packed.len() * 2 - odd as usize;
    if count > MAX_DECIMAL_DIGITS {
        bail!(CodecError::overflow(format!(
            "decimal payload holds {} digits, limit {}",
            count, MAX_DECIMAL_DIGITS
        )));
    }

    let slot = alloc.alloc_decimal_digits(count);
    for (i, digit) in slot.iter_mut().enumerate() {
        let byte = packed[i / 2];
        let nibble = if i % 2 == 0 { byte >> 4 } else { byte & 0x0F };
        if nibble > 9 {
            bail!(CodecError::invalid(format!("decimal digit nibble {:#x}", nibble)));
        }
        *digit = nibble;
    }
    let digits: &'a [u8] = slot;
    Ok(Decimal::from_parts_unchecked(negative, Cow::Borrowed(digits), exponent))
}

fn decode_nested<'a, 't>(
    alloc: &'a DatumAlloc,
    body: &'a [u8],
    expected: Option<usize>,
    type_at: impl Fn(usize) -> &'t ColumnType,
) -> Result<&'a [Datum<'a>]> {
    let (count, mut pos) = decode_varint(body)?;
    let remaining = (body.len() - pos) as u64;
    // every nested entry takes at least two bytes
    if count > remaining / 2 {
        bail!(CodecError::overflow(format!(
            "element count {} exceeds {} remaining bytes",
            count, remaining
        )));
    }
    let count = count as usize;
    if let Some(expected) = expected {
        if count != expected {
            bail!(CodecError::mismatch(format!(
                "tuple payload has {} fields, type declares {}",
                count, expected
            )));
        }
    }

    let mut out = alloc.datum_vec(count);
    for i in 0..count {
        let (column_id, datum, n) = decode_value(alloc, type_at(i), &body[pos..])?;
        if column_id != NO_COLUMN_ID {
            bail!(CodecError::invalid(format!(
                "nested entry carries column id {}",
                column_id
            )));
        }
        out.push(datum);
        pos += n;
    }
    if pos != body.len() {
        bail!(CodecError::invalid(format!(
            "{} trailing bytes after nested entries",
            body.len() - pos
        )));
    }
    Ok(out.into_bump_slice())
}

/// Decodes the payload following `tag`, returning the datum and the payload
/// bytes consumed.
pub(crate) fn decode_payload<'a>(
    alloc: &'a DatumAlloc,
    ty: &ColumnType,
    tag: ValueTag,
    buf: &'a [u8],
) -> Result<(Datum<'a>, usize)> {
    if let Some(family) = tag.family() {
        if family != ty.family() {
            bail!(CodecError::mismatch(format!(
                "value tagged {:?} read as {}",
                tag,
                ty.family().name()
            )));
        }
    }

    let datum = match tag {
        ValueTag::Null => Datum::Null,
        ValueTag::False => Datum::Bool(false),
        ValueTag::True => Datum::Bool(true),
        ValueTag::Int2 | ValueTag::Int4 | ValueTag::Int8 => {
            let v = match tag {
                ValueTag::Int2 => i16::from_le_bytes(fixed(buf, tag)?) as i64,
                ValueTag::Int4 => i32::from_le_bytes(fixed(buf, tag)?) as i64,
                _ => i64::from_le_bytes(fixed(buf, tag)?),
            };
            check_int_width(ty, v)?;
            Datum::Int(v)
        }
        ValueTag::Float => Datum::Float(f64::from_bits(u64::from_le_bytes(fixed(buf, tag)?))),
        ValueTag::Date => Datum::Date(i32::from_le_bytes(fixed(buf, tag)?)),
        ValueTag::Time => Datum::Time(i64::from_le_bytes(fixed(buf, tag)?)),
        ValueTag::Timestamp => Datum::Timestamp(i64::from_le_bytes(fixed(buf, tag)?)),
        ValueTag::TimestampTz => {
            let raw: [u8; 12] = fixed(buf, tag)?;
            Datum::TimestampTz {
                micros: i64::from_le_bytes(fixed(&raw, tag)?),
                offset_secs: i32::from_le_bytes(fixed(&raw[8..], tag)?),
            }
        }
        ValueTag::Interval => {
            let raw: [u8; 16] = fixed(buf, tag)?;
            Datum::Interval {
                micros: i64::from_le_bytes(fixed(&raw, tag)?),
                days: i32::from_le_bytes(fixed(&raw[8..], tag)?),
                months: i32::from_le_bytes(fixed(&raw[12..], tag)?),
            }
        }
        ValueTag::Uuid => Datum::Uuid(fixed(buf, tag)?),
        ValueTag::Enum => Datum::Enum(u32::from_le_bytes(fixed(buf, tag)?)),
        ValueTag::Oid => Datum::Oid(u32::from_le_bytes(fixed(buf, tag)?)),
        ValueTag::Decimal
        | ValueTag::String
        | ValueTag::Bytes
        | ValueTag::CollatedString
        | ValueTag::Json
        | ValueTag::Geometry
        | ValueTag::Geography
        | ValueTag::Array
        | ValueTag::Tuple => {
            let (body, consumed) = length_prefixed(buf)?;
            let datum = match tag {
                ValueTag::Decimal => Datum::Decimal(decode_decimal_body(alloc, body)?),
                ValueTag::String => Datum::String(Cow::Borrowed(utf8(body, tag)?)),
                ValueTag::CollatedString => Datum::CollatedString(Cow::Borrowed(utf8(body, tag)?)),
                ValueTag::Json => Datum::Json(Cow::Borrowed(utf8(body, tag)?)),
                ValueTag::Bytes => Datum::Bytes(Cow::Borrowed(body)),
                ValueTag::Geometry => Datum::Geometry(Cow::Borrowed(body)),
                ValueTag::Geography => Datum::Geography(Cow::Borrowed(body)),
                ValueTag::Array => {
                    let Some(elem_ty) = ty.element_type() else {
                        bail!(CodecError::internal("array type without element type"));
                    };
                    Datum::Array(Cow::Borrowed(decode_nested(alloc, body, None, |_| elem_ty)?))
                }
                _ => {
                    let fields = ty.fields();
                    let elems = decode_nested(alloc, body, Some(fields.len()), |i| &fields[i])?;
                    Datum::Tuple(Cow::Borrowed(elems))
                }
            };
            return Ok((datum, consumed));
        }
    };
    let consumed = tag.fixed_payload_len().unwrap_or(0);
    Ok((datum, consumed))
}

/// Reads the column id and tag of the entry at the front of `buf`.
pub fn decode_value_header(buf: &[u8]) -> Result<ValueHeader> {
    let (column_id, id_len) = decode_varint_u32(buf)?;
    let (raw_tag, tag_len) = decode_varint(&buf[id_len..])?;
    let raw_tag = u8::try_from(raw_tag)
        .map_err(|_| CodecError::malformed(format!("invalid value tag: {}", raw_tag)))?;
    Ok(ValueHeader {
        column_id,
        tag: ValueTag::try_from(raw_tag)?,
        header_len: id_len + tag_len,
    })
}

/// Decodes the entry at the front of `buf`, returning its column id, datum and
/// total length. Bytes past the entry are not read.
pub fn decode_value<'a>(
    alloc: &'a DatumAlloc,
    ty: &ColumnType,
    buf: &'a [u8],
) -> Result<(ColumnId, Datum<'a>, usize)> {
    let header = decode_value_header(buf)?;
    let (datum, n) = decode_payload(alloc, ty, header.tag, &buf[header.header_len..])?;
    Ok((header.column_id, datum, header.header_len + n))
}

/// Returns the length of the entry at the front of `buf` without a type
/// descriptor and without decoding its payload.
pub fn skip_value(buf: &[u8]) -> Result<usize> {
    let header = decode_value_header(buf)?;
    let n = payload_len(header.tag, &buf[header.header_len..])?;
    Ok(header.header_len + n)
}

/// One raw entry yielded by [`ValueScanner`].
#[derive(Debug, Clone, Copy)]
pub struct ValueEntry<'a> {
    pub column_id: ColumnId,
    pub tag: ValueTag,
    /// Offset of the entry within the scanned row.
    pub offset: usize,
    /// The complete entry, header included.
    pub bytes: &'a [u8],
}

impl<'a> ValueEntry<'a> {
    pub fn is_null(&self) -> bool {
        self.tag == ValueTag::Null
    }

    pub fn decode(&self, alloc: &'a DatumAlloc, ty: &ColumnType) -> Result<Datum<'a>> {
        decode_value(alloc, ty, self.bytes).map(|(_, datum, _)| datum)
    }
}

/// Iterates over the packed entries of a row. After the first error the
/// scanner yields nothing further.
pub struct ValueScanner<'a> {
    buf: &'a [u8],
    pos: usize,
    failed: bool,
}

impl<'a> ValueScanner<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            failed: false,
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    /// Advances to the entry for `column_id`, skipping everything before it.
    pub fn seek_column(&mut self, column_id: ColumnId) -> Result<Option<ValueEntry<'a>>> {
        for entry in self.by_ref() {
            let entry = entry?;
            if entry.column_id == column_id {
                return Ok(Some(entry));
            }
        }
        Ok(None)
    }
}

impl<'a> Iterator for ValueScanner<'a> {
    type Item = Result<ValueEntry<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.pos >= self.buf.len() {
            return None;
        }
        let rest = &self.buf[self.pos..];
        let entry = decode_value_header(rest).and_then(|header| {
            let len = skip_value(rest)?;
            Ok(ValueEntry {
                column_id: header.column_id,
                tag: header.tag,
                offset: self.pos,
                bytes: &rest[..len],
            })
        });
        match entry {
            Ok(entry) => {
                self.pos += entry.bytes.len();
                Some(Ok(entry))
            }
            Err(e) => {
                self.failed = true;
                Some(Err(e))
            }
        }
    }
}
