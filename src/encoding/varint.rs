//! # Length-Prefix Varints
//!
//! The value encoding writes column identifiers, value tags, payload lengths
//! and element counts as variable-length unsigned integers. These varints are
//! never compared byte-wise, so the format optimizes for size: values up to
//! 240 take a single byte, which covers nearly every column id, tag and short
//! string length.
//!
//! ## Format
//!
//! | Value Range              | Bytes | Layout                              |
//! |--------------------------|-------|-------------------------------------|
//! | 0 - 240                  | 1     | `[v]`                               |
//! | 241 - 2287               | 2     | `[241 + (v-240)>>8, (v-240)&0xFF]`  |
//! | 2288 - 67823             | 3     | `[249, (v-2288)>>8, (v-2288)&0xFF]` |
//! | 67824 - 0xFF_FFFF        | 4     | `[250, 3 bytes BE]`                 |
//! | 0x100_0000 - u32::MAX    | 5     | `[251, 4 bytes BE]`                 |
//! | above u32::MAX           | 9     | `[255, 8 bytes BE]`                 |
//!
//! Leading bytes 252-254 are never produced and decode as `MalformedMarker`.
//!
//! Key encodings do not use this format; order-preserving integers live in
//! `encoding::key`.

use crate::error::CodecError;
use eyre::{bail, Result};

pub fn varint_len(value: u64) -> usize {
    if value <= 240 {
        1
    } else if value <= 2287 {
        2
    } else if value <= 67823 {
        3
    } else if value <= 0xFF_FFFF {
        4
    } else if value <= 0xFFFF_FFFF {
        5
    } else {
        9
    }
}

/// Writes `value` into `buf`, returning the number of bytes written. `buf`
/// must hold at least `varint_len(value)` bytes.
pub fn encode_varint(value: u64, buf: &mut [u8]) -> usize {
    if value <= 240 {
        buf[0] = value as u8;
        1
    } else if value <= 2287 {
        let v = value - 240;
        buf[0] = ((v >> 8) + 241) as u8;
        buf[1] = v as u8;
        2
    } else if value <= 67823 {
        let v = value - 2288;
        buf[0] = 249;
        buf[1] = (v >> 8) as u8;
        buf[2] = v as u8;
        3
    } else if value <= 0xFF_FFFF {
        buf[0] = 250;
        buf[1..4].copy_from_slice(&value.to_be_bytes()[5..]);
        4
    } else if value <= 0xFFFF_FFFF {
        buf[0] = 251;
        buf[1..5].copy_from_slice(&value.to_be_bytes()[4..]);
        5
    } else {
        buf[0] = 255;
        buf[1..9].copy_from_slice(&value.to_be_bytes());
        9
    }
}

/// Appends `value` to a growable buffer.
pub fn put_varint(buf: &mut Vec<u8>, value: u64) {
    let mut scratch = [0u8; 9];
    let n = encode_varint(value, &mut scratch);
    buf.extend_from_slice(&scratch[..n]);
}

/// Decodes a varint from the front of `buf`, returning the value and the
/// number of bytes consumed.
pub fn decode_varint(buf: &[u8]) -> Result<(u64, usize)> {
    let Some(&first) = buf.first() else {
        bail!(CodecError::truncated("empty buffer for varint"));
    };

    let width = match first {
        0..=240 => return Ok((first as u64, 1)),
        241..=248 => 2,
        249 => 3,
        250 => 4,
        251 => 5,
        255 => 9,
        _ => bail!(CodecError::malformed(format!("invalid varint marker: {}", first))),
    };
    if buf.len() < width {
        bail!(CodecError::truncated(format!(
            "{}-byte varint with {} bytes available",
            width,
            buf.len()
        )));
    }

    let value = match first {
        241..=248 => 240 + ((first as u64 - 241) << 8) + buf[1] as u64,
        249 => 2288 + ((buf[1] as u64) << 8) + buf[2] as u64,
        _ => buf[1..width]
            .iter()
            .fold(0u64, |acc, b| (acc << 8) | *b as u64),
    };
    Ok((value, width))
}

/// Decodes a varint that must fit in a `u32`, such as a column identifier.
pub fn decode_varint_u32(buf: &[u8]) -> Result<(u32, usize)> {
    let (value, n) = decode_varint(buf)?;
    let value = u32::try_from(value)
        .map_err(|_| CodecError::overflow(format!("varint {} exceeds u32", value)))?;
    Ok((value, n))
}
