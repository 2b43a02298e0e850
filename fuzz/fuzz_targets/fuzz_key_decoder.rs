//! Fuzz testing for the key decoder and key skipper.
//!
//! Arbitrary bytes are decoded as a key of an arbitrary key-encodable type in
//! either direction. Decoding must never panic, and whenever it succeeds the
//! skipper must report the same length and the re-encoded datum must decode
//! back to an equal value.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use datum_codec::{decode_key, encode_key, skip_key, ColumnType, DatumAlloc, Direction, Family};

#[derive(Debug, Arbitrary)]
struct KeyInput {
    key_type: FuzzKeyType,
    descending: bool,
    data: Vec<u8>,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzKeyType {
    Bool,
    Int,
    Oid,
    Float,
    Decimal,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Interval,
    String,
    Bytes,
    Uuid,
    IntArray,
    StringArray,
}

impl From<FuzzKeyType> for ColumnType {
    fn from(fkt: FuzzKeyType) -> Self {
        match fkt {
            FuzzKeyType::Bool => ColumnType::bool(),
            FuzzKeyType::Int => ColumnType::int8(),
            FuzzKeyType::Oid => ColumnType::new(Family::Oid),
            FuzzKeyType::Float => ColumnType::float(),
            FuzzKeyType::Decimal => ColumnType::decimal(38, 10),
            FuzzKeyType::Date => ColumnType::new(Family::Date),
            FuzzKeyType::Time => ColumnType::new(Family::Time),
            FuzzKeyType::Timestamp => ColumnType::new(Family::Timestamp),
            FuzzKeyType::TimestampTz => ColumnType::new(Family::TimestampTz),
            FuzzKeyType::Interval => ColumnType::new(Family::Interval),
            FuzzKeyType::String => ColumnType::string(),
            FuzzKeyType::Bytes => ColumnType::bytes(),
            FuzzKeyType::Uuid => ColumnType::new(Family::Uuid),
            FuzzKeyType::IntArray => ColumnType::array(ColumnType::int8()),
            FuzzKeyType::StringArray => ColumnType::array(ColumnType::string()),
        }
    }
}

fuzz_target!(|input: KeyInput| {
    let ty: ColumnType = input.key_type.into();
    let dir = if input.descending {
        Direction::Descending
    } else {
        Direction::Ascending
    };

    let alloc = DatumAlloc::new();
    let skipped = skip_key(&input.data, &ty, dir);
    let Ok((datum, consumed)) = decode_key(&alloc, &ty, &input.data, dir) else {
        return;
    };
    assert_eq!(skipped.ok(), Some(consumed));

    let mut reencoded = Vec::new();
    encode_key(&ty, &datum, dir, &mut reencoded).unwrap();
    let (again, n) = decode_key(&alloc, &ty, &reencoded, dir).unwrap();
    assert_eq!(again, datum);
    assert_eq!(n, reencoded.len());
});
