//! Fuzz testing for the packed value decoder.
//!
//! Arbitrary bytes are scanned as a row and each entry is decoded against an
//! arbitrary column type. Nothing may panic, and for every entry the scanner
//! yields, `skip_value` and a successful `decode_value` must agree on its
//! length.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use datum_codec::{
    decode_value, skip_value, unmarshal_column_value, ColumnType, DatumAlloc, Family, ValueScanner,
};

#[derive(Debug, Arbitrary)]
struct RowInput {
    column_types: Vec<FuzzValueType>,
    data: Vec<u8>,
}

#[derive(Debug, Arbitrary, Clone, Copy)]
enum FuzzValueType {
    Bool,
    Int2,
    Int4,
    Int8,
    Float,
    Decimal,
    Date,
    TimestampTz,
    Interval,
    String,
    Bytes,
    Json,
    Uuid,
    Enum,
    StringArray,
    Pair,
}

impl From<FuzzValueType> for ColumnType {
    fn from(fvt: FuzzValueType) -> Self {
        match fvt {
            FuzzValueType::Bool => ColumnType::bool(),
            FuzzValueType::Int2 => ColumnType::int2(),
            FuzzValueType::Int4 => ColumnType::int4(),
            FuzzValueType::Int8 => ColumnType::int8(),
            FuzzValueType::Float => ColumnType::float(),
            FuzzValueType::Decimal => ColumnType::decimal(20, 6),
            FuzzValueType::Date => ColumnType::new(Family::Date),
            FuzzValueType::TimestampTz => ColumnType::new(Family::TimestampTz),
            FuzzValueType::Interval => ColumnType::new(Family::Interval),
            FuzzValueType::String => ColumnType::string(),
            FuzzValueType::Bytes => ColumnType::bytes(),
            FuzzValueType::Json => ColumnType::json(),
            FuzzValueType::Uuid => ColumnType::new(Family::Uuid),
            FuzzValueType::Enum => ColumnType::enumeration(1),
            FuzzValueType::StringArray => ColumnType::array(ColumnType::string()),
            FuzzValueType::Pair => ColumnType::tuple(vec![ColumnType::int8(), ColumnType::bytes()]),
        }
    }
}

fuzz_target!(|input: RowInput| {
    if input.column_types.is_empty() || input.column_types.len() > 64 {
        return;
    }

    let column_types: Vec<ColumnType> = input.column_types.into_iter().map(Into::into).collect();
    let alloc = DatumAlloc::new();

    for (entry, ty) in ValueScanner::new(&input.data).zip(column_types.iter().cycle()) {
        let Ok(entry) = entry else {
            break;
        };
        assert_eq!(skip_value(entry.bytes).ok(), Some(entry.bytes.len()));
        if let Ok((_, _, consumed)) = decode_value(&alloc, ty, entry.bytes) {
            assert_eq!(consumed, entry.bytes.len());
        }
    }

    let _ = unmarshal_column_value(&alloc, &column_types[0], &input.data);
});
