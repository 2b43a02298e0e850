//! # Standalone Column Value Marshalling
//!
//! A single column value stored on its own (outside a packed row) carries a
//! checksum instead of a column id:
//!
//! ```text
//! +----------------+-----+---------+
//! | crc32 (BE, 4)  | tag | payload |
//! +----------------+-----+---------+
//!   covers ------------> tag + payload
//! ```
//!
//! The tag and payload use the same layout as the packed value encoding. An
//! empty buffer is NULL. Unmarshalling verifies the checksum, then requires
//! the payload to account for every remaining byte.

use super::value::{decode_payload, encode_payload, value_tag, ValueTag};
use crate::config::{MARSHALLED_HEADER_SIZE, VALUE_CHECKSUM_SIZE};
use crate::error::CodecError;
use crate::memory::DatumAlloc;
use crate::types::{ColumnType, Datum};
use crc::{Crc, CRC_32_ISO_HDLC};
use eyre::{bail, Result};

const CHECKSUM: Crc<u32> = Crc::<u32>::new(&CRC_32_ISO_HDLC);

fn checksum(bytes: &[u8]) -> u32 {
    let mut digest = CHECKSUM.digest();
    digest.update(bytes);
    digest.finalize()
}

pub fn marshal_column_value(ty: &ColumnType, datum: &Datum) -> Result<Vec<u8>> {
    let tag = value_tag(ty, datum)?;
    if tag == ValueTag::Null {
        return Ok(Vec::new());
    }

    let mut buf = Vec::with_capacity(MARSHALLED_HEADER_SIZE + 16);
    buf.extend_from_slice(&[0u8; VALUE_CHECKSUM_SIZE]);
    buf.push(tag as u8);
    encode_payload(ty, datum, &mut buf)?;

    let sum = checksum(&buf[VALUE_CHECKSUM_SIZE..]);
    buf[..VALUE_CHECKSUM_SIZE].copy_from_slice(&sum.to_be_bytes());
    Ok(buf)
}

pub fn unmarshal_column_value<'a>(
    alloc: &'a DatumAlloc,
    ty: &ColumnType,
    buf: &'a [u8],
) -> Result<Datum<'a>> {
    if buf.is_empty() {
        return Ok(Datum::Null);
    }
    if buf.len() < MARSHALLED_HEADER_SIZE {
        bail!(CodecError::truncated(format!(
            "marshalled value of {} bytes is shorter than its header",
            buf.len()
        )));
    }

    let (stored, body) = buf.split_at(VALUE_CHECKSUM_SIZE);
    let mut expected = [0u8; VALUE_CHECKSUM_SIZE];
    expected.copy_from_slice(stored);
    let expected = u32::from_be_bytes(expected);
    let actual = checksum(body);
    if expected != actual {
        bail!(CodecError::checksum(format!(
            "stored {:#010x}, computed {:#010x}",
            expected, actual
        )));
    }

    let tag = ValueTag::try_from(body[0])?;
    let payload = &body[1..];
    let (datum, consumed) = decode_payload(alloc, ty, tag, payload)?;
    if consumed != payload.len() {
        bail!(CodecError::invalid(format!(
            "{} trailing bytes after marshalled {:?} value",
            payload.len() - consumed,
            tag
        )));
    }
    Ok(datum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{error_kind, CodecErrorKind};

    #[test]
    fn null_marshals_to_empty() {
        let buf = marshal_column_value(&ColumnType::int8(), &Datum::Null).unwrap();
        assert!(buf.is_empty());
        let alloc = DatumAlloc::new();
        assert!(unmarshal_column_value(&alloc, &ColumnType::int8(), &buf).unwrap().is_null());
    }

    #[test]
    fn roundtrip_with_checksum() {
        let ty = ColumnType::string();
        let buf = marshal_column_value(&ty, &Datum::string("payload")).unwrap();
        assert_eq!(buf[4], ValueTag::String as u8);
        assert_eq!(&buf[..4], &checksum(&buf[4..]).to_be_bytes());

        let alloc = DatumAlloc::new();
        let datum = unmarshal_column_value(&alloc, &ty, &buf).unwrap();
        assert_eq!(datum, Datum::string("payload"));
    }

    #[test]
    fn flipped_bit_fails_checksum() {
        let ty = ColumnType::int8();
        let mut buf = marshal_column_value(&ty, &Datum::Int(99)).unwrap();
        let last = buf.len() - 1;
        buf[last] ^= 0x01;
        let alloc = DatumAlloc::new();
        let err = unmarshal_column_value(&alloc, &ty, &buf).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::ChecksumMismatch));
    }

    #[test]
    fn trailing_bytes_are_rejected() {
        let ty = ColumnType::new(crate::types::Family::Date);
        let mut body = vec![ValueTag::Date as u8];
        body.extend_from_slice(&5i32.to_le_bytes());
        body.push(0xAA);
        let mut buf = checksum(&body).to_be_bytes().to_vec();
        buf.extend_from_slice(&body);

        let alloc = DatumAlloc::new();
        let err = unmarshal_column_value(&alloc, &ty, &buf).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::InvalidData));
    }

    #[test]
    fn short_buffers_are_truncated() {
        let alloc = DatumAlloc::new();
        let err = unmarshal_column_value(&alloc, &ColumnType::int8(), &[0, 0, 0]).unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::Truncated));
    }
}
