//! # Order-Preserving Key Encoding
//!
//! Key-encoded datums compare with a single `memcmp`: lexicographic order of
//! the encoded bytes equals the logical order of the values. Index keys,
//! range boundaries and the storage engine's sort order all rely on this, so
//! every encoding here is checked by property tests for order preservation.
//!
//! ## Design Goals
//!
//! 1. **Byte-comparable**: encoded order matches `Datum::compare`
//! 2. **Prefix-free**: no encoding is a proper prefix of another, so a decoder
//!    always knows where a component ends
//! 3. **Direction by complement**: the descending encoding is the bitwise
//!    complement of the ascending one, for every family
//! 4. **NULL at the edge**: NULL is `0x00` and every non-null marker is at
//!    least `0x02`, so NULL sorts first ascending and last descending
//!
//! ## Marker Scheme
//!
//! ```text
//! 0x00       NULL, string terminator escape, array terminator
//! 0x01       NULL array element
//! 0x02-0x03  Booleans (FALSE < TRUE)
//! 0x04-0x07  Floats (NaN < negative < zero < positive)
//! 0x12       Strings and bytes (escaped, terminated)
//! 0x18-0x35  Decimals (see encoding::decimal)
//! 0x40       Arrays
//! 0x50-0x58  Date/time, interval, UUID
//! 0x80-0x87  Negative integers, 8 down to 1 magnitude bytes
//! 0x88-0xF5  Integers 0..=109 inline
//! 0xF6-0xFD  Positive integers, 1 up to 8 magnitude bytes
//! ```
//!
//! ## Integer Encoding
//!
//! ```text
//! i64::MIN ... -257  -256 ... -1   0 ... 109   110 ... 255   256 ... i64::MAX
//! [80 x8]  ..  [86 x2] [87 x1]     [88]..[F5]  [F6 x1]       [F7 x2] .. [FD x8]
//! ```
//!
//! Negative values keep the low bytes of their two's complement form, which
//! for a fixed byte count already sort numerically. Longer negatives get
//! smaller markers. OIDs and enum ordinals use the non-negative half only.
//!
//! ## String Encoding
//!
//! ```text
//! 0x12 [bytes with 0x00 -> 0x00 0xFF] 0x00 0x01
//! ```
//!
//! The terminator `0x00 0x01` sorts below the escape `0x00 0xFF`, so `"a"`
//! sorts before `"a\0"`, and below every unescaped byte, so `"a"` sorts
//! before `"ab"`.
//!
//! ## Fixed-Width Families
//!
//! Signed fields are written big-endian with the sign bit flipped:
//!
//! | Family | Marker | Payload |
//! |--------|--------|---------|
//! | DATE | 0x50 | days i32 |
//! | TIME | 0x51 | micros i64 |
//! | TIMESTAMP | 0x52 | micros i64 |
//! | TIMESTAMPTZ | 0x53 | UTC micros i64 (offset not stored) |
//! | INTERVAL | 0x54 | normalized micros i128, months i32, days i32 |
//! | UUID | 0x58 | 16 raw bytes |
//!
//! Intervals sort by their length with a month counted as 30 days. Months
//! and days follow as tie-breakers, so `'1 month'` and `'30 days'` stay
//! distinct keys. Decoding recovers micros from the other three fields.
//!
//! ## Usage Example
//!
//! ```ignore
//! use datum_codec::encoding::key::{decode_key, encode_key, Direction};
//!
//! let mut buf = Vec::new();
//! encode_key(&ColumnType::int8(), &Datum::Int(42), Direction::Ascending, &mut buf)?;
//! let (datum, consumed) = decode_key(&alloc, &ColumnType::int8(), &buf, Direction::Ascending)?;
//! assert_eq!(consumed, buf.len());
//! ```

use super::{composite, decimal};
use crate::error::CodecError;
use crate::memory::DatumAlloc;
use crate::types::{interval_micros, is_key_encodable, ColumnType, Datum, Family};
use eyre::{bail, Result};
use std::borrow::Cow;

pub mod markers {
    pub const NULL: u8 = 0x00;
    pub const ARRAY_TERMINATOR: u8 = 0x00;
    pub const ARRAY_NULL_ELEMENT: u8 = 0x01;

    pub const FALSE: u8 = 0x02;
    pub const TRUE: u8 = 0x03;

    pub const FLOAT_NAN: u8 = 0x04;
    pub const FLOAT_NEG: u8 = 0x05;
    pub const FLOAT_ZERO: u8 = 0x06;
    pub const FLOAT_POS: u8 = 0x07;

    pub const BYTES: u8 = 0x12;
    pub const ESCAPE: u8 = 0x00;
    pub const ESCAPED_TERM: u8 = 0x01;
    pub const ESCAPED_00: u8 = 0xFF;

    pub const DECIMAL_NAN: u8 = 0x18;
    pub const DECIMAL_NEG_INF: u8 = 0x19;
    pub const DECIMAL_NEG_LARGE: u8 = 0x1a;
    pub const DECIMAL_NEG_MEDIUM: u8 = 0x1b;
    pub const DECIMAL_NEG_SMALL: u8 = 0x26;
    pub const DECIMAL_ZERO: u8 = 0x27;
    pub const DECIMAL_POS_SMALL: u8 = 0x28;
    pub const DECIMAL_POS_MEDIUM: u8 = 0x29;
    pub const DECIMAL_POS_LARGE: u8 = 0x34;
    pub const DECIMAL_INF: u8 = 0x35;

    pub const ARRAY: u8 = 0x40;

    pub const DATE: u8 = 0x50;
    pub const TIME: u8 = 0x51;
    pub const TIMESTAMP: u8 = 0x52;
    pub const TIMESTAMPTZ: u8 = 0x53;
    pub const INTERVAL: u8 = 0x54;
    pub const UUID: u8 = 0x58;

    pub const INT_MIN: u8 = 0x80;
    pub const INT_NEG_MAX: u8 = 0x87;
    pub const INT_ZERO: u8 = 0x88;
    pub const INT_SMALL: u64 = 109;
    pub const INT_POS_MIN: u8 = 0xF6;
    pub const INT_MAX: u8 = 0xFD;
}

const _: () = assert!(
    markers::INT_ZERO as u64 + markers::INT_SMALL + 1 == markers::INT_POS_MIN as u64,
    "inline integer range must end right below the positive markers"
);
const _: () = assert!(
    markers::DECIMAL_NEG_MEDIUM + 10 + 1 == markers::DECIMAL_NEG_SMALL,
    "negative medium exponents must fill 0x1b..=0x25"
);
const _: () = assert!(
    markers::DECIMAL_POS_MEDIUM + 10 + 1 == markers::DECIMAL_POS_LARGE,
    "positive medium exponents must fill 0x29..=0x33"
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    /// XOR mask applied to every byte of an encoding in this direction.
    pub fn mask(&self) -> u8 {
        match self {
            Direction::Ascending => 0x00,
            Direction::Descending => 0xFF,
        }
    }
}

/// Cursor over a key buffer that undoes the direction mask on every read.
pub(crate) struct KeyReader<'a> {
    buf: &'a [u8],
    pos: usize,
    mask: u8,
}

impl<'a> KeyReader<'a> {
    pub(crate) fn new(buf: &'a [u8], dir: Direction) -> Self {
        Self {
            buf,
            pos: 0,
            mask: dir.mask(),
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.pos
    }

    pub(crate) fn mask(&self) -> u8 {
        self.mask
    }

    pub(crate) fn peek(&self) -> Result<u8> {
        match self.buf.get(self.pos) {
            Some(b) => Ok(b ^ self.mask),
            None => bail!(CodecError::truncated(format!(
                "key ends at offset {} before a component starts",
                self.pos
            ))),
        }
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Ok(b)
    }

    pub(crate) fn advance(&mut self, n: usize) -> Result<()> {
        let remaining = self.buf.len() - self.pos;
        if n > remaining {
            bail!(CodecError::truncated(format!(
                "need {} bytes at offset {}, {} available",
                n, self.pos, remaining
            )));
        }
        self.pos += n;
        Ok(())
    }

    pub(crate) fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let start = self.pos;
        self.advance(N)?;
        let mut out = [0u8; N];
        for (dst, src) in out.iter_mut().zip(&self.buf[start..self.pos]) {
            *dst = src ^ self.mask;
        }
        Ok(out)
    }

    /// Returns still-masked input bytes between two offsets already read.
    pub(crate) fn raw(&self, start: usize, end: usize) -> &'a [u8] {
        &self.buf[start..end]
    }

    /// Runs `f` with the mask flipped, for sub-fields written in the opposite
    /// direction of their enclosing component.
    pub(crate) fn inverted<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.mask ^= 0xFF;
        let result = f(self);
        self.mask ^= 0xFF;
        result
    }
}

pub(crate) fn expect_marker(r: &mut KeyReader, expected: u8, family: Family) -> Result<()> {
    let marker = r.read_u8()?;
    if marker != expected {
        bail!(CodecError::malformed(format!(
            "unexpected marker {:#04x} for {} key at offset {}",
            marker,
            family.name(),
            r.position() - 1
        )));
    }
    Ok(())
}

pub(crate) fn mismatch(ty: &ColumnType, datum: &Datum) -> CodecError {
    CodecError::mismatch(format!(
        "datum of family {} does not match column type {}",
        datum.family().map_or("NULL", |f| f.name()),
        ty.family().name()
    ))
}

pub(crate) fn ensure_key_encodable(ty: &ColumnType) -> Result<()> {
    if !is_key_encodable(ty) {
        bail!(CodecError::unsupported(format!(
            "{} has no key encoding",
            ty.family().name()
        )));
    }
    Ok(())
}

/// Checks that an integer fits the declared column width.
pub(crate) fn check_int_width(ty: &ColumnType, v: i64) -> Result<()> {
    let fits = match ty.width() {
        2 => i16::try_from(v).is_ok(),
        4 => i32::try_from(v).is_ok(),
        _ => true,
    };
    if !fits {
        bail!(CodecError::overflow(format!(
            "integer {} out of range for INT{}",
            v,
            ty.width()
        )));
    }
    Ok(())
}

// ============================================================================
// INTEGERS
// ============================================================================

pub fn encode_int_key(buf: &mut Vec<u8>, v: i64) {
    if v >= 0 {
        encode_uvarint_key(buf, v as u64);
        return;
    }
    let len = (8 - (!v as u64).leading_zeros() as usize / 8).max(1);
    buf.push(markers::INT_MIN + (8 - len) as u8);
    buf.extend_from_slice(&v.to_be_bytes()[8 - len..]);
}

pub fn encode_uvarint_key(buf: &mut Vec<u8>, v: u64) {
    if v <= markers::INT_SMALL {
        buf.push(markers::INT_ZERO + v as u8);
        return;
    }
    let len = 8 - v.leading_zeros() as usize / 8;
    buf.push(markers::INT_POS_MIN - 1 + len as u8);
    buf.extend_from_slice(&v.to_be_bytes()[8 - len..]);
}

/// Number of magnitude bytes following an integer marker, or None when the
/// byte is not an integer marker.
pub(crate) fn int_payload_len(marker: u8) -> Option<usize> {
    match marker {
        markers::INT_MIN..=markers::INT_NEG_MAX => Some(8 - (marker - markers::INT_MIN) as usize),
        markers::INT_ZERO..=0xF5 => Some(0),
        markers::INT_POS_MIN..=markers::INT_MAX => {
            Some((marker - markers::INT_POS_MIN) as usize + 1)
        }
        _ => None,
    }
}

pub(crate) fn decode_int_key(r: &mut KeyReader) -> Result<i64> {
    let marker = r.peek()?;
    if marker > markers::INT_NEG_MAX {
        let v = decode_uvarint_key(r)?;
        return i64::try_from(v).map_err(|_| {
            CodecError::overflow(format!("integer key {} exceeds i64", v)).into()
        });
    }
    if marker < markers::INT_MIN {
        bail!(CodecError::malformed(format!(
            "invalid integer key marker {:#04x}",
            marker
        )));
    }
    r.read_u8()?;
    let len = 8 - (marker - markers::INT_MIN) as usize;
    let mut v: i64 = -1;
    for _ in 0..len {
        v = (v << 8) | r.read_u8()? as i64;
    }
    Ok(v)
}

pub(crate) fn decode_uvarint_key(r: &mut KeyReader) -> Result<u64> {
    let marker = r.read_u8()?;
    match marker {
        markers::INT_ZERO..=0xF5 => Ok((marker - markers::INT_ZERO) as u64),
        markers::INT_POS_MIN..=markers::INT_MAX => {
            let len = (marker - markers::INT_POS_MIN) as usize + 1;
            let mut v: u64 = 0;
            for _ in 0..len {
                v = (v << 8) | r.read_u8()? as u64;
            }
            Ok(v)
        }
        _ => bail!(CodecError::malformed(format!(
            "invalid unsigned key marker {:#04x}",
            marker
        ))),
    }
}

fn decode_u32_key(r: &mut KeyReader, family: Family) -> Result<u32> {
    let v = decode_uvarint_key(r)?;
    u32::try_from(v).map_err(|_| {
        CodecError::overflow(format!("{} key {} exceeds u32", family.name(), v)).into()
    })
}

// ============================================================================
// FLOATS
// ============================================================================

pub fn encode_float_key(buf: &mut Vec<u8>, f: f64) {
    if f.is_nan() {
        buf.push(markers::FLOAT_NAN);
    } else if f == 0.0 {
        buf.push(markers::FLOAT_ZERO);
    } else if f < 0.0 {
        buf.push(markers::FLOAT_NEG);
        buf.extend_from_slice(&(!f.to_bits()).to_be_bytes());
    } else {
        buf.push(markers::FLOAT_POS);
        buf.extend_from_slice(&f.to_bits().to_be_bytes());
    }
}

fn decode_float_key(r: &mut KeyReader) -> Result<f64> {
    let marker = r.read_u8()?;
    match marker {
        markers::FLOAT_NAN => Ok(f64::NAN),
        markers::FLOAT_ZERO => Ok(0.0),
        markers::FLOAT_NEG => Ok(f64::from_bits(!u64::from_be_bytes(r.read_array()?))),
        markers::FLOAT_POS => Ok(f64::from_bits(u64::from_be_bytes(r.read_array()?))),
        _ => bail!(CodecError::malformed(format!(
            "invalid float key marker {:#04x}",
            marker
        ))),
    }
}

pub(crate) fn float_payload_len(marker: u8) -> Option<usize> {
    match marker {
        markers::FLOAT_NAN | markers::FLOAT_ZERO => Some(0),
        markers::FLOAT_NEG | markers::FLOAT_POS => Some(8),
        _ => None,
    }
}

// ============================================================================
// STRINGS AND BYTES
// ============================================================================

pub fn encode_bytes_key(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.push(markers::BYTES);
    let mut rest = bytes;
    while let Some(idx) = rest.iter().position(|b| *b == markers::ESCAPE) {
        buf.extend_from_slice(&rest[..idx]);
        buf.extend_from_slice(&[markers::ESCAPE, markers::ESCAPED_00]);
        rest = &rest[idx + 1..];
    }
    buf.extend_from_slice(rest);
    buf.extend_from_slice(&[markers::ESCAPE, markers::ESCAPED_TERM]);
}

/// Advances past an escaped string body (marker already consumed), returning
/// the still-masked body bytes and whether any escapes occurred.
pub(crate) fn scan_escaped<'a>(r: &mut KeyReader<'a>) -> Result<(&'a [u8], bool)> {
    let start = r.position();
    let mut escaped = false;
    loop {
        if r.read_u8()? != markers::ESCAPE {
            continue;
        }
        match r.read_u8()? {
            markers::ESCAPED_TERM => break,
            markers::ESCAPED_00 => escaped = true,
            other => bail!(CodecError::malformed(format!(
                "invalid escape {:#04x} in string key at offset {}",
                other,
                r.position() - 1
            ))),
        }
    }
    Ok((r.raw(start, r.position() - 2), escaped))
}

fn decode_bytes_key<'a>(alloc: &'a DatumAlloc, r: &mut KeyReader<'a>) -> Result<&'a [u8]> {
    let mask = r.mask();
    let (raw, escaped) = scan_escaped(r)?;
    if mask == 0 && !escaped {
        return Ok(raw);
    }

    let mut out = alloc.byte_buf(raw.len());
    let mut bytes = raw.iter().map(|b| b ^ mask);
    while let Some(b) = bytes.next() {
        out.push(b);
        if b == markers::ESCAPE {
            // scan_escaped validated the 0xFF that follows
            bytes.next();
        }
    }
    Ok(out.into_bump_slice())
}

fn decode_str_key<'a>(alloc: &'a DatumAlloc, r: &mut KeyReader<'a>) -> Result<&'a str> {
    let offset = r.position();
    let bytes = decode_bytes_key(alloc, r)?;
    std::str::from_utf8(bytes).map_err(|e| {
        CodecError::invalid(format!("string key at offset {} is not UTF-8: {}", offset, e)).into()
    })
}

// ============================================================================
// FIXED-WIDTH FAMILIES
// ============================================================================

fn put_i32_flipped(buf: &mut Vec<u8>, v: i32) {
    buf.extend_from_slice(&((v as u32) ^ 0x8000_0000).to_be_bytes());
}

fn put_i64_flipped(buf: &mut Vec<u8>, v: i64) {
    buf.extend_from_slice(&((v as u64) ^ (1 << 63)).to_be_bytes());
}

fn put_i128_flipped(buf: &mut Vec<u8>, v: i128) {
    buf.extend_from_slice(&((v as u128) ^ (1 << 127)).to_be_bytes());
}

fn read_i32_flipped(r: &mut KeyReader) -> Result<i32> {
    Ok((u32::from_be_bytes(r.read_array()?) ^ 0x8000_0000) as i32)
}

fn read_i64_flipped(r: &mut KeyReader) -> Result<i64> {
    Ok((u64::from_be_bytes(r.read_array()?) ^ (1 << 63)) as i64)
}

fn read_i128_flipped(r: &mut KeyReader) -> Result<i128> {
    Ok((u128::from_be_bytes(r.read_array()?) ^ (1 << 127)) as i128)
}

/// Marker and payload size of the fixed-width families.
pub(crate) fn fixed_layout(family: Family) -> Option<(u8, usize)> {
    match family {
        Family::Date => Some((markers::DATE, 4)),
        Family::Time => Some((markers::TIME, 8)),
        Family::Timestamp => Some((markers::TIMESTAMP, 8)),
        Family::TimestampTz => Some((markers::TIMESTAMPTZ, 8)),
        Family::Interval => Some((markers::INTERVAL, 24)),
        Family::Uuid => Some((markers::UUID, 16)),
        _ => None,
    }
}

// ============================================================================
// DISPATCH
// ============================================================================

/// Appends the ascending encoding of `datum`. Callers complement the
/// appended range for descending keys.
pub(crate) fn encode_ascending(ty: &ColumnType, datum: &Datum, buf: &mut Vec<u8>) -> Result<()> {
    let family = ty.family();
    match (family, datum) {
        (_, Datum::Null) => buf.push(markers::NULL),
        (Family::Bool, Datum::Bool(b)) => {
            buf.push(if *b { markers::TRUE } else { markers::FALSE })
        }
        (Family::Int, Datum::Int(v)) => {
            check_int_width(ty, *v)?;
            encode_int_key(buf, *v);
        }
        (Family::Float, Datum::Float(f)) => encode_float_key(buf, *f),
        (Family::Decimal, Datum::Decimal(d)) => decimal::encode_decimal_key(buf, d)?,
        (Family::Date, Datum::Date(days)) => {
            buf.push(markers::DATE);
            put_i32_flipped(buf, *days);
        }
        (Family::Time, Datum::Time(micros)) => {
            buf.push(markers::TIME);
            put_i64_flipped(buf, *micros);
        }
        (Family::Timestamp, Datum::Timestamp(micros)) => {
            buf.push(markers::TIMESTAMP);
            put_i64_flipped(buf, *micros);
        }
        (Family::TimestampTz, Datum::TimestampTz { micros, .. }) => {
            buf.push(markers::TIMESTAMPTZ);
            put_i64_flipped(buf, *micros);
        }
        (
            Family::Interval,
            Datum::Interval {
                months,
                days,
                micros,
            },
        ) => {
            buf.push(markers::INTERVAL);
            put_i128_flipped(buf, interval_micros(*months, *days, *micros));
            put_i32_flipped(buf, *months);
            put_i32_flipped(buf, *days);
        }
        (Family::Uuid, Datum::Uuid(bytes)) => {
            buf.push(markers::UUID);
            buf.extend_from_slice(bytes);
        }
        (Family::Oid, Datum::Oid(v)) => encode_uvarint_key(buf, *v as u64),
        (Family::Enum, Datum::Enum(v)) => encode_uvarint_key(buf, *v as u64),
        (Family::String, Datum::String(s)) => encode_bytes_key(buf, s.as_bytes()),
        (Family::Bytes, Datum::Bytes(b)) => encode_bytes_key(buf, b),
        (Family::Array, Datum::Array(elems)) => {
            let Some(elem_ty) = ty.element_type() else {
                bail!(CodecError::internal("array type without element type"));
            };
            composite::encode_array_key(elem_ty, elems, buf)?;
        }
        (
            Family::Json
            | Family::CollatedString
            | Family::Tuple
            | Family::Geometry
            | Family::Geography,
            _,
        ) => bail!(CodecError::internal(format!(
            "{} reached the key encoder",
            family.name()
        ))),
        _ => bail!(mismatch(ty, datum)),
    }
    Ok(())
}

/// Decodes one component (NULL included) from the reader.
pub(crate) fn decode_component<'a>(
    alloc: &'a DatumAlloc,
    ty: &ColumnType,
    r: &mut KeyReader<'a>,
) -> Result<Datum<'a>> {
    if r.peek()? == markers::NULL {
        r.read_u8()?;
        return Ok(Datum::Null);
    }

    let family = ty.family();
    let datum = match family {
        Family::Bool => match r.read_u8()? {
            markers::FALSE => Datum::Bool(false),
            markers::TRUE => Datum::Bool(true),
            other => bail!(CodecError::malformed(format!(
                "invalid bool key marker {:#04x}",
                other
            ))),
        },
        Family::Int => {
            let v = decode_int_key(r)?;
            check_int_width(ty, v)?;
            Datum::Int(v)
        }
        Family::Float => Datum::Float(decode_float_key(r)?),
        Family::Decimal => Datum::Decimal(decimal::decode_decimal_key(alloc, r)?),
        Family::Date => {
            expect_marker(r, markers::DATE, family)?;
            Datum::Date(read_i32_flipped(r)?)
        }
        Family::Time => {
            expect_marker(r, markers::TIME, family)?;
            Datum::Time(read_i64_flipped(r)?)
        }
        Family::Timestamp => {
            expect_marker(r, markers::TIMESTAMP, family)?;
            Datum::Timestamp(read_i64_flipped(r)?)
        }
        Family::TimestampTz => {
            expect_marker(r, markers::TIMESTAMPTZ, family)?;
            Datum::TimestampTz {
                micros: read_i64_flipped(r)?,
                offset_secs: 0,
            }
        }
        Family::Interval => {
            expect_marker(r, markers::INTERVAL, family)?;
            let length = read_i128_flipped(r)?;
            let months = read_i32_flipped(r)?;
            let days = read_i32_flipped(r)?;
            let micros = length
                .checked_sub(interval_micros(months, days, 0))
                .and_then(|rest| i64::try_from(rest).ok());
            let Some(micros) = micros else {
                bail!(CodecError::invalid(format!(
                    "interval key length {} does not match {} months {} days",
                    length, months, days
                )));
            };
            Datum::Interval {
                months,
                days,
                micros,
            }
        }
        Family::Uuid => {
            expect_marker(r, markers::UUID, family)?;
            Datum::Uuid(r.read_array()?)
        }
        Family::Oid => Datum::Oid(decode_u32_key(r, family)?),
        Family::Enum => Datum::Enum(decode_u32_key(r, family)?),
        Family::String => {
            expect_marker(r, markers::BYTES, family)?;
            Datum::String(Cow::Borrowed(decode_str_key(alloc, r)?))
        }
        Family::Bytes => {
            expect_marker(r, markers::BYTES, family)?;
            Datum::Bytes(Cow::Borrowed(decode_bytes_key(alloc, r)?))
        }
        Family::Array => {
            let Some(elem_ty) = ty.element_type() else {
                bail!(CodecError::internal("array type without element type"));
            };
            composite::decode_array_key(alloc, elem_ty, r)?
        }
        Family::Json
        | Family::CollatedString
        | Family::Tuple
        | Family::Geometry
        | Family::Geography => bail!(CodecError::internal(format!(
            "{} reached the key decoder",
            family.name()
        ))),
    };
    Ok(datum)
}

/// Complements `buf[start..]`, turning an ascending encoding into a
/// descending one.
pub(crate) fn apply_direction(buf: &mut [u8], start: usize, dir: Direction) {
    let mask = dir.mask();
    if mask != 0 {
        for b in &mut buf[start..] {
            *b ^= mask;
        }
    }
}

/// Appends the key encoding of `datum` to `buf`. On error `buf` is left as it
/// was on entry.
pub fn encode_key(ty: &ColumnType, datum: &Datum, dir: Direction, buf: &mut Vec<u8>) -> Result<()> {
    ensure_key_encodable(ty)?;
    let start = buf.len();
    if let Err(e) = encode_ascending(ty, datum, buf) {
        buf.truncate(start);
        return Err(e);
    }
    apply_direction(buf, start, dir);
    Ok(())
}

/// Decodes one key component from the front of `buf`, returning the datum and
/// the number of bytes it occupied. Trailing bytes are left untouched.
pub fn decode_key<'a>(
    alloc: &'a DatumAlloc,
    ty: &ColumnType,
    buf: &'a [u8],
    dir: Direction,
) -> Result<(Datum<'a>, usize)> {
    ensure_key_encodable(ty)?;
    let mut r = KeyReader::new(buf, dir);
    let datum = decode_component(alloc, ty, &mut r)?;
    Ok((datum, r.position()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_DECIMAL_DIGITS;
    use crate::error::{error_kind, CodecErrorKind};

    fn key(ty: &ColumnType, datum: &Datum, dir: Direction) -> Vec<u8> {
        let mut buf = Vec::new();
        encode_key(ty, datum, dir, &mut buf).unwrap();
        buf
    }

    #[test]
    fn null_is_single_marker_byte() {
        let ty = ColumnType::int8();
        assert_eq!(key(&ty, &Datum::Null, Direction::Ascending), vec![0x00]);
        assert_eq!(key(&ty, &Datum::Null, Direction::Descending), vec![0xFF]);
    }

    #[test]
    fn integer_layouts() {
        let ty = ColumnType::int8();
        let asc = |v: i64| key(&ty, &Datum::Int(v), Direction::Ascending);
        assert_eq!(asc(0), vec![0x88]);
        assert_eq!(asc(42), vec![0x88 + 42]);
        assert_eq!(asc(109), vec![0xF5]);
        assert_eq!(asc(110), vec![0xF6, 110]);
        assert_eq!(asc(256), vec![0xF7, 0x01, 0x00]);
        assert_eq!(asc(-1), vec![0x87, 0xFF]);
        assert_eq!(asc(-256), vec![0x87, 0x00]);
        assert_eq!(asc(-257), vec![0x86, 0xFE, 0xFF]);
        assert_eq!(asc(i64::MIN)[0], 0x80);
        assert_eq!(asc(i64::MAX)[0], 0xFD);
    }

    #[test]
    fn integer_order_across_marker_classes() {
        let ty = ColumnType::int8();
        let values = [
            i64::MIN,
            -65_536,
            -257,
            -256,
            -1,
            0,
            1,
            109,
            110,
            255,
            256,
            1 << 40,
            i64::MAX,
        ];
        for pair in values.windows(2) {
            let a = key(&ty, &Datum::Int(pair[0]), Direction::Ascending);
            let b = key(&ty, &Datum::Int(pair[1]), Direction::Ascending);
            assert!(a < b, "{} vs {}", pair[0], pair[1]);
            let a = key(&ty, &Datum::Int(pair[0]), Direction::Descending);
            let b = key(&ty, &Datum::Int(pair[1]), Direction::Descending);
            assert!(a > b, "{} vs {} descending", pair[0], pair[1]);
        }
    }

    #[test]
    fn string_escaping() {
        let ty = ColumnType::bytes();
        let encoded = key(&ty, &Datum::bytes(&b"a\x00b"[..]), Direction::Ascending);
        assert_eq!(encoded, vec![0x12, b'a', 0x00, 0xFF, b'b', 0x00, 0x01]);

        let alloc = DatumAlloc::new();
        let (datum, n) = decode_key(&alloc, &ty, &encoded, Direction::Ascending).unwrap();
        assert_eq!(datum, Datum::bytes(&b"a\x00b"[..]));
        assert_eq!(n, encoded.len());
    }

    #[test]
    fn ascending_strings_without_escapes_borrow_input() {
        let ty = ColumnType::string();
        let encoded = key(&ty, &Datum::string("hello"), Direction::Ascending);
        let alloc = DatumAlloc::new();
        let (datum, _) = decode_key(&alloc, &ty, &encoded, Direction::Ascending).unwrap();
        match datum {
            Datum::String(Cow::Borrowed(s)) => {
                assert_eq!(s, "hello");
                assert_eq!(s.as_ptr(), encoded[1..].as_ptr());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn float_zero_signs_collapse() {
        let ty = ColumnType::float();
        assert_eq!(
            key(&ty, &Datum::Float(-0.0), Direction::Ascending),
            key(&ty, &Datum::Float(0.0), Direction::Ascending)
        );
        assert!(
            key(&ty, &Datum::Float(f64::NAN), Direction::Ascending)
                < key(&ty, &Datum::Float(f64::NEG_INFINITY), Direction::Ascending)
        );
    }

    #[test]
    fn timestamptz_key_drops_offset() {
        let ty = ColumnType::new(Family::TimestampTz);
        let datum = Datum::TimestampTz {
            micros: 1_700_000_000_000_000,
            offset_secs: -18_000,
        };
        let encoded = key(&ty, &datum, Direction::Descending);
        let alloc = DatumAlloc::new();
        let (decoded, _) = decode_key(&alloc, &ty, &encoded, Direction::Descending).unwrap();
        assert_eq!(
            decoded,
            Datum::TimestampTz {
                micros: 1_700_000_000_000_000,
                offset_secs: 0
            }
        );
    }

    #[test]
    fn non_key_families_are_unsupported() {
        let mut buf = vec![0xAB];
        let err = encode_key(
            &ColumnType::json(),
            &Datum::Json("{}".into()),
            Direction::Ascending,
            &mut buf,
        )
        .unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::UnsupportedFamily));
        assert_eq!(buf, vec![0xAB]);
    }

    #[test]
    fn datum_family_mismatch_leaves_buffer_untouched() {
        let mut buf = Vec::new();
        let err = encode_key(
            &ColumnType::int8(),
            &Datum::string("x"),
            Direction::Ascending,
            &mut buf,
        )
        .unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::TypeMismatch));
        assert!(buf.is_empty());
    }

    #[test]
    fn int_width_is_enforced() {
        let mut buf = Vec::new();
        let err = encode_key(
            &ColumnType::int2(),
            &Datum::Int(40_000),
            Direction::Ascending,
            &mut buf,
        )
        .unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::LengthOverflow));
    }

    #[test]
    fn corrupt_markers_are_reported() {
        let alloc = DatumAlloc::new();
        let asc = Direction::Ascending;

        let err = decode_key(&alloc, &ColumnType::bool(), &[0x07], asc).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::MalformedMarker));

        let bad_escape = [0x12, b'a', 0x00, 0x05];
        let err = decode_key(&alloc, &ColumnType::bytes(), &bad_escape, asc).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::MalformedMarker));

        let err = decode_key(&alloc, &ColumnType::int8(), &[0xF7, 0x01], asc).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::Truncated));

        let bad_utf8 = [0x12, 0xC3, 0x28, 0x00, 0x01];
        let err = decode_key(&alloc, &ColumnType::string(), &bad_utf8, asc).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::InvalidData));
    }

    #[test]
    fn oid_rejects_values_beyond_u32() {
        let mut buf = Vec::new();
        encode_uvarint_key(&mut buf, u32::MAX as u64 + 1);
        let alloc = DatumAlloc::new();
        let ty = ColumnType::new(Family::Oid);
        let err = decode_key(&alloc, &ty, &buf, Direction::Ascending).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::LengthOverflow));
    }

    #[test]
    fn decimal_exponent_overflow_is_an_error() {
        let alloc = DatumAlloc::new();
        let ty = ColumnType::decimal(10, 2);
        let buf = [0x34, 0xFD, 0x40, 0, 0, 0, 0, 0, 0, 0, 0x02];
        let err = decode_key(&alloc, &ty, &buf, Direction::Ascending).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::LengthOverflow));
    }

    #[test]
    fn oversized_decimal_is_refused() {
        let wide: crate::types::Decimal = "9".repeat(MAX_DECIMAL_DIGITS + 1).parse().unwrap();
        let mut buf = vec![0x01];
        let err = encode_key(
            &ColumnType::decimal(38, 0),
            &Datum::Decimal(wide),
            Direction::Descending,
            &mut buf,
        )
        .unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::LengthOverflow));
        assert_eq!(buf, vec![0x01]);
    }

    fn interval(months: i32, days: i32, micros: i64) -> Datum<'static> {
        Datum::Interval {
            months,
            days,
            micros,
        }
    }

    #[test]
    fn intervals_sort_by_length() {
        let ty = ColumnType::new(Family::Interval);
        let day = 86_400_000_000i64;
        let ordered = [
            interval(-2, 0, 0),
            interval(0, -31, 0),
            interval(0, 0, -1),
            interval(0, 0, 0),
            interval(0, 0, day),
            interval(0, 1, 0),
            interval(0, 29, day - 1),
            interval(0, 30, 0),
            interval(1, 0, 0),
            interval(0, 40, 0),
            interval(i32::MAX, i32::MAX, i64::MAX),
        ];
        for pair in ordered.windows(2) {
            assert!(pair[0] < pair[1], "{:?} < {:?}", pair[0], pair[1]);
            let a = key(&ty, &pair[0], Direction::Ascending);
            let b = key(&ty, &pair[1], Direction::Ascending);
            assert!(a < b, "{:?} vs {:?}", pair[0], pair[1]);
            let a = key(&ty, &pair[0], Direction::Descending);
            let b = key(&ty, &pair[1], Direction::Descending);
            assert!(a > b, "{:?} vs {:?} descending", pair[0], pair[1]);
        }

        let alloc = DatumAlloc::new();
        for d in ordered.iter().chain([&interval(i32::MIN, i32::MIN, i64::MIN)]) {
            let buf = key(&ty, d, Direction::Descending);
            assert_eq!(buf.len(), 25);
            let (decoded, n) = decode_key(&alloc, &ty, &buf, Direction::Descending).unwrap();
            let decoded = decoded.into_owned();
            assert_eq!((decoded, n), (d.clone(), buf.len()));
        }
    }

    #[test]
    fn interval_length_must_match_fields() {
        let ty = ColumnType::new(Family::Interval);
        let mut buf = key(&ty, &interval(0, 0, i64::MAX), Direction::Ascending);
        // add 2^64 micros to the stored length
        buf[8] += 1;
        let alloc = DatumAlloc::new();
        let err = decode_key(&alloc, &ty, &buf, Direction::Ascending).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::InvalidData));

        let mut buf = vec![markers::INTERVAL];
        buf.extend_from_slice(&[0xFF; 16]);
        buf.extend_from_slice(&[0x00; 8]);
        let err = decode_key(&alloc, &ty, &buf, Direction::Ascending).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::InvalidData));
    }
}
