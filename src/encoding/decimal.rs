//! # Decimal Key Encoding
//!
//! Decimals with different scales but equal values (`1.50`, `1.5`, `15e-1`)
//! must produce identical keys, so the encoder first normalizes to the
//! significant digits `d` and a base-100 exponent `e` with
//!
//! ```text
//! |value| = 0.(d1 d2)(d3 d4)... × 100^e      first pair non-zero
//! ```
//!
//! and writes a marker, the exponent, then the mantissa one base-100 pair per
//! byte. A pair `p` is written as `2p + 1` when more pairs follow and `2p` when
//! it is the last, so the terminal byte is always even and a shorter mantissa
//! sorts before any longer one sharing its prefix.
//!
//! ## Markers
//!
//! ```text
//! 0x18        NaN
//! 0x19        -Infinity
//! 0x1a        negative, e > 10      exponent: uvarint, complemented
//! 0x1b..0x25  negative, 0 <= e <= 10 (0x1b + 10 - e)
//! 0x26        negative, e < 0       exponent: uvarint of -e
//! 0x27        zero
//! 0x28        positive, e < 0       exponent: uvarint of -e, complemented
//! 0x29..0x33  positive, 0 <= e <= 10 (0x29 + e)
//! 0x34        positive, e > 10      exponent: uvarint
//! 0x35        +Infinity
//! ```
//!
//! Negative values complement their mantissa so that larger magnitudes sort
//! first. Exponent uvarints reuse the integer key format from `encoding::key`.

use super::key::{decode_uvarint_key, encode_uvarint_key, markers, KeyReader};
use crate::config::{DECIMAL_MEDIUM_EXPONENT_MAX, MAX_DECIMAL_DIGITS};
use crate::error::CodecError;
use crate::memory::DatumAlloc;
use crate::types::{Decimal, DecimalForm};
use eyre::{bail, Result};
use smallvec::SmallVec;
use std::borrow::Cow;

type Pairs = SmallVec<[u8; 32]>;

/// Groups significant digits into base-100 pairs, returning the pairs and the
/// base-100 exponent.
fn to_base100(digits: &[u8], e10: i64) -> (Pairs, i64) {
    let mut pairs = Pairs::new();
    let (e100, padded) = if e10 % 2 != 0 {
        ((e10 + 1) / 2, true)
    } else {
        (e10 / 2, false)
    };

    let mut iter = digits.iter().copied();
    if padded {
        pairs.push(iter.next().unwrap_or(0));
    }
    loop {
        let Some(hi) = iter.next() else { break };
        let lo = iter.next().unwrap_or(0);
        pairs.push(hi * 10 + lo);
    }
    (pairs, e100)
}

fn put_exponent(buf: &mut Vec<u8>, value: u64, complement: bool) {
    let start = buf.len();
    encode_uvarint_key(buf, value);
    if complement {
        for b in &mut buf[start..] {
            *b = !*b;
        }
    }
}

/// Writes the key form of `d`. Mantissas the decoder would reject are refused
/// before anything is written.
pub(crate) fn encode_decimal_key(buf: &mut Vec<u8>, d: &Decimal) -> Result<()> {
    let marker = match d.form() {
        DecimalForm::NaN => Some(markers::DECIMAL_NAN),
        DecimalForm::Infinite if d.is_negative() => Some(markers::DECIMAL_NEG_INF),
        DecimalForm::Infinite => Some(markers::DECIMAL_INF),
        DecimalForm::Finite => None,
    };
    if let Some(marker) = marker {
        buf.push(marker);
        return Ok(());
    }

    let (digits, e10) = d.significant();
    if digits.is_empty() {
        buf.push(markers::DECIMAL_ZERO);
        return Ok(());
    }
    let (pairs, e) = to_base100(digits, e10);
    if pairs.len() * 2 > MAX_DECIMAL_DIGITS {
        bail!(CodecError::overflow(format!(
            "decimal mantissa of {} digits exceeds {}",
            digits.len(),
            MAX_DECIMAL_DIGITS
        )));
    }
    let negative = d.is_negative();

    match (negative, e) {
        (false, e) if e < 0 => {
            buf.push(markers::DECIMAL_POS_SMALL);
            put_exponent(buf, e.unsigned_abs(), true);
        }
        (false, e) if e <= DECIMAL_MEDIUM_EXPONENT_MAX => {
            buf.push(markers::DECIMAL_POS_MEDIUM + e as u8);
        }
        (false, e) => {
            buf.push(markers::DECIMAL_POS_LARGE);
            put_exponent(buf, e as u64, false);
        }
        (true, e) if e < 0 => {
            buf.push(markers::DECIMAL_NEG_SMALL);
            put_exponent(buf, e.unsigned_abs(), false);
        }
        (true, e) if e <= DECIMAL_MEDIUM_EXPONENT_MAX => {
            buf.push(markers::DECIMAL_NEG_MEDIUM + (DECIMAL_MEDIUM_EXPONENT_MAX - e) as u8);
        }
        (true, e) => {
            buf.push(markers::DECIMAL_NEG_LARGE);
            put_exponent(buf, e as u64, true);
        }
    }

    let complement = if negative { 0xFF } else { 0x00 };
    let last = pairs.len() - 1;
    for (i, p) in pairs.iter().enumerate() {
        let byte = if i == last { p * 2 } else { p * 2 + 1 };
        buf.push(byte ^ complement);
    }
    Ok(())
}

/// Parsed marker: sign and base-100 exponent of a finite non-zero decimal, or
/// the complete value for the special forms.
enum Header {
    Special(Decimal<'static>),
    Finite { negative: bool, e100: i64 },
}

/// Base-100 exponents beyond `i32` cannot come from an `i32` scale and a
/// capped digit count.
fn exponent_from(v: u64) -> Result<i64> {
    match i32::try_from(v) {
        Ok(e) => Ok(e as i64),
        Err(_) => bail!(CodecError::overflow(format!(
            "decimal exponent {} too large",
            v
        ))),
    }
}

fn read_header(r: &mut KeyReader) -> Result<Header> {
    let marker = r.read_u8()?;
    let header = match marker {
        markers::DECIMAL_NAN => Header::Special(Decimal::nan()),
        markers::DECIMAL_NEG_INF => Header::Special(Decimal::neg_infinity()),
        markers::DECIMAL_INF => Header::Special(Decimal::infinity()),
        markers::DECIMAL_ZERO => Header::Special(Decimal::zero()),
        markers::DECIMAL_NEG_LARGE => {
            let e = r.inverted(decode_uvarint_key)?;
            Header::Finite {
                negative: true,
                e100: exponent_from(e)?,
            }
        }
        m if (markers::DECIMAL_NEG_MEDIUM..markers::DECIMAL_NEG_SMALL).contains(&m) => {
            Header::Finite {
                negative: true,
                e100: DECIMAL_MEDIUM_EXPONENT_MAX - (m - markers::DECIMAL_NEG_MEDIUM) as i64,
            }
        }
        markers::DECIMAL_NEG_SMALL => {
            let e = decode_uvarint_key(r)?;
            Header::Finite {
                negative: true,
                e100: -exponent_from(e)?,
            }
        }
        markers::DECIMAL_POS_SMALL => {
            let e = r.inverted(decode_uvarint_key)?;
            Header::Finite {
                negative: false,
                e100: -exponent_from(e)?,
            }
        }
        m if (markers::DECIMAL_POS_MEDIUM..markers::DECIMAL_POS_LARGE).contains(&m) => {
            Header::Finite {
                negative: false,
                e100: (m - markers::DECIMAL_POS_MEDIUM) as i64,
            }
        }
        markers::DECIMAL_POS_LARGE => {
            let e = decode_uvarint_key(r)?;
            Header::Finite {
                negative: false,
                e100: exponent_from(e)?,
            }
        }
        other => bail!(CodecError::malformed(format!(
            "invalid decimal key marker {:#04x}",
            other
        ))),
    };
    Ok(header)
}

/// Reads mantissa bytes up to and including the terminal one, handing each
/// base-100 pair to `sink`.
fn read_mantissa(r: &mut KeyReader, negative: bool, mut sink: impl FnMut(u8)) -> Result<()> {
    let complement = if negative { 0xFF } else { 0x00 };
    let mut count = 0usize;
    loop {
        let offset = r.position();
        let byte = r.read_u8()? ^ complement;
        if byte == 0 || byte > 199 {
            bail!(CodecError::malformed(format!(
                "invalid decimal mantissa byte {:#04x} at offset {}",
                byte, offset
            )));
        }
        count += 1;
        if count * 2 > MAX_DECIMAL_DIGITS {
            bail!(CodecError::overflow(format!(
                "decimal mantissa exceeds {} digits",
                MAX_DECIMAL_DIGITS
            )));
        }
        sink(byte / 2);
        if byte % 2 == 0 {
            return Ok(());
        }
    }
}

pub(crate) fn decode_decimal_key<'a>(
    alloc: &'a DatumAlloc,
    r: &mut KeyReader<'a>,
) -> Result<Decimal<'a>> {
    let (negative, e100) = match read_header(r)? {
        Header::Special(d) => return Ok(d),
        Header::Finite { negative, e100 } => (negative, e100),
    };

    let mut digits = Pairs::new();
    read_mantissa(r, negative, |p| {
        digits.push(p / 10);
        digits.push(p % 10);
    })?;

    let first = digits.iter().position(|d| *d != 0).unwrap_or(digits.len());
    let last = digits.iter().rposition(|d| *d != 0).map_or(first, |i| i + 1);
    let significant = &digits[first..last];
    if significant.is_empty() {
        bail!(CodecError::invalid("decimal key mantissa is all zeros"));
    }

    // value = 0.digits × 10^(2·e100); drop the trailing zeros from the scale.
    let trailing = digits.len() - last;
    let exponent = e100
        .checked_mul(2)
        .and_then(|e| e.checked_sub(digits.len() as i64))
        .and_then(|e| e.checked_add(trailing as i64))
        .and_then(|e| i32::try_from(e).ok());
    let Some(exponent) = exponent else {
        bail!(CodecError::overflow(format!(
            "decimal exponent for base-100 exponent {} exceeds i32",
            e100
        )));
    };

    let slot = alloc.alloc_decimal_digits(significant.len());
    slot.copy_from_slice(significant);
    let stored: &'a [u8] = slot;
    Ok(Decimal::from_parts_unchecked(negative, Cow::Borrowed(stored), exponent))
}

pub(crate) fn skip_decimal_key(r: &mut KeyReader) -> Result<()> {
    match read_header(r)? {
        Header::Special(_) => Ok(()),
        Header::Finite { negative, .. } => read_mantissa(r, negative, |_| {}),
    }
}
