//! Fuzz testing for key order preservation.
//!
//! Two arbitrary values of the same type are key-encoded in both directions;
//! byte order of the encodings must match the logical order of the values.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;

use datum_codec::{encode_key, ColumnType, Datum, Decimal, Direction};

#[derive(Debug, Arbitrary)]
enum Pair {
    Int(Option<i64>, Option<i64>),
    Float(f64, f64),
    Decimal((i64, i16), (i64, i16)),
    Bytes(Vec<u8>, Vec<u8>),
    String(String, String),
    Array(Vec<Option<i32>>, Vec<Option<i32>>),
}

fn int(v: Option<i64>) -> Datum<'static> {
    v.map_or(Datum::Null, Datum::Int)
}

fn array(elems: Vec<Option<i32>>) -> Datum<'static> {
    Datum::array(
        elems
            .into_iter()
            .map(|e| e.map_or(Datum::Null, |v| Datum::Int(v as i64)))
            .collect(),
    )
}

fn decimal((coefficient, exponent): (i64, i16)) -> Datum<'static> {
    Datum::Decimal(Decimal::from_i128(coefficient as i128, exponent as i32))
}

fn check(ty: &ColumnType, a: &Datum, b: &Datum) {
    for dir in [Direction::Ascending, Direction::Descending] {
        let mut ka = Vec::new();
        let mut kb = Vec::new();
        encode_key(ty, a, dir, &mut ka).unwrap();
        encode_key(ty, b, dir, &mut kb).unwrap();
        let expected = match dir {
            Direction::Ascending => a.compare(b),
            Direction::Descending => b.compare(a),
        };
        assert_eq!(ka.cmp(&kb), expected, "{:?} vs {:?} ({:?})", a, b, dir);
    }
}

fuzz_target!(|pair: Pair| {
    match pair {
        Pair::Int(a, b) => check(&ColumnType::int8(), &int(a), &int(b)),
        Pair::Float(a, b) => check(&ColumnType::float(), &Datum::Float(a), &Datum::Float(b)),
        Pair::Decimal(a, b) => check(&ColumnType::decimal(38, 10), &decimal(a), &decimal(b)),
        Pair::Bytes(a, b) => check(&ColumnType::bytes(), &Datum::bytes(a), &Datum::bytes(b)),
        Pair::String(a, b) => check(&ColumnType::string(), &Datum::string(a), &Datum::string(b)),
        Pair::Array(a, b) => check(
            &ColumnType::array(ColumnType::int4()),
            &array(a),
            &array(b),
        ),
    }
});
