//! # Key Encoding Test Suite
//!
//! Integration tests for the order-preserving key encoding, exercised only
//! through the public API.
//!
//! ## Test Categories
//!
//! 1. **Scenarios**: fixed worked examples with known byte layouts
//! 2. **Round-trip properties**: decode(encode(d)) == d, consuming every byte
//! 3. **Order properties**: byte order matches `Datum::compare` both directions
//! 4. **Skip properties**: `skip_key` length equals the decoded length
//! 5. **Adversarial bytes**: content dense in 0x00, 0x01 and 0xFF
//!
//! ## Usage
//!
//! ```sh
//! cargo test --test key_encoding
//! ```

use datum_codec::{
    decode_key, decode_tuple_key, encode_key, encode_tuple_key, error_kind, is_key_encodable,
    skip_key, skip_tuple_key, CodecErrorKind, ColumnType, Datum, DatumAlloc, Decimal, Direction,
    Family,
};
use proptest::prelude::*;
use std::cmp::Ordering;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

const BOTH: [Direction; 2] = [Direction::Ascending, Direction::Descending];

fn key(ty: &ColumnType, datum: &Datum, dir: Direction) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_key(ty, datum, dir, &mut buf).expect("encodable datum");
    buf
}

fn decimal(s: &str) -> Datum<'static> {
    Datum::Decimal(s.parse::<Decimal>().expect("valid decimal literal"))
}

fn expected_order(a: &Datum, b: &Datum, dir: Direction) -> Ordering {
    match dir {
        Direction::Ascending => a.compare(b),
        Direction::Descending => b.compare(a),
    }
}

fn check_roundtrip(ty: &ColumnType, datum: &Datum) -> Result<(), TestCaseError> {
    for dir in BOTH {
        let mut buf = key(ty, datum, dir);
        let len = buf.len();
        buf.extend_from_slice(&[0x00, 0x01, 0xFF]);

        let alloc = DatumAlloc::new();
        let (decoded, consumed) = decode_key(&alloc, ty, &buf, dir).expect("decodes");
        prop_assert_eq!(&decoded, datum);
        prop_assert_eq!(consumed, len);
        prop_assert_eq!(skip_key(&buf, ty, dir).expect("skips"), len);
    }
    Ok(())
}

fn check_order(ty: &ColumnType, a: &Datum, b: &Datum) -> Result<(), TestCaseError> {
    for dir in BOTH {
        let ka = key(ty, a, dir);
        let kb = key(ty, b, dir);
        let expected = expected_order(a, b, dir);
        prop_assert_eq!(ka.cmp(&kb), expected, "{:?} vs {:?} {:?}", a, b, dir);
    }
    Ok(())
}

fn nullable<S>(inner: S) -> impl Strategy<Value = Datum<'static>>
where
    S: Strategy<Value = Datum<'static>> + 'static,
{
    prop_oneof![1 => Just(Datum::Null), 8 => inner]
}

fn adversarial_bytes() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![Just(0x00u8), Just(0x01u8), Just(0xFFu8), any::<u8>()],
        0..24,
    )
}

/// Decimals with up to 40 significant digits, beyond any machine integer.
fn wide_decimal() -> impl Strategy<Value = Datum<'static>> {
    ("-?[1-9][0-9]{19,39}", -60i32..60)
        .prop_map(|(digits, e)| decimal(&format!("{}e{}", digits, e)))
}

fn decimal_datum() -> impl Strategy<Value = Datum<'static>> {
    prop_oneof![
        6 => (any::<i64>(), -60i32..60)
            .prop_map(|(c, e)| Datum::Decimal(Decimal::from_i128(c as i128, e))),
        2 => (any::<i128>(), -10i32..10)
            .prop_map(|(c, e)| Datum::Decimal(Decimal::from_i128(c, e))),
        3 => wide_decimal(),
        1 => Just(Datum::Decimal(Decimal::nan())),
        1 => Just(Datum::Decimal(Decimal::infinity())),
        1 => Just(Datum::Decimal(Decimal::neg_infinity())),
        1 => Just(Datum::Decimal(Decimal::zero())),
    ]
}

fn float_datum() -> impl Strategy<Value = Datum<'static>> {
    prop_oneof![
        8 => any::<f64>().prop_map(Datum::Float),
        1 => Just(Datum::Float(f64::NAN)),
        1 => Just(Datum::Float(-0.0)),
        1 => Just(Datum::Float(f64::INFINITY)),
        1 => Just(Datum::Float(f64::NEG_INFINITY)),
    ]
}

fn int_array_datum() -> impl Strategy<Value = Datum<'static>> {
    prop::collection::vec(prop::option::of(-300i64..300), 0..6).prop_map(|elems| {
        Datum::array(
            elems
                .into_iter()
                .map(|e| e.map_or(Datum::Null, Datum::Int))
                .collect(),
        )
    })
}

fn short_string() -> impl Strategy<Value = String> {
    "[\\x00\\x01a-c\\x{FF}]{0,12}"
}

/// Every key-encodable column type the property tests draw from.
fn key_types() -> Vec<ColumnType> {
    vec![
        ColumnType::bool(),
        ColumnType::int8(),
        ColumnType::new(Family::Oid),
        ColumnType::enumeration(7),
        ColumnType::float(),
        ColumnType::decimal(40, 10),
        ColumnType::new(Family::Date),
        ColumnType::new(Family::Time),
        ColumnType::new(Family::Timestamp),
        ColumnType::new(Family::TimestampTz),
        ColumnType::new(Family::Interval),
        ColumnType::string(),
        ColumnType::bytes(),
        ColumnType::new(Family::Uuid),
        ColumnType::array(ColumnType::bool()),
        ColumnType::array(ColumnType::decimal(40, 10)),
        ColumnType::array(ColumnType::array(ColumnType::string())),
    ]
}

/// Non-null datums of the given key-encodable type.
fn datum_for(ty: &ColumnType) -> BoxedStrategy<Datum<'static>> {
    match ty.family() {
        Family::Bool => any::<bool>().prop_map(Datum::Bool).boxed(),
        Family::Int => any::<i64>().prop_map(Datum::Int).boxed(),
        Family::Oid => any::<u32>().prop_map(Datum::Oid).boxed(),
        Family::Enum => any::<u32>().prop_map(Datum::Enum).boxed(),
        Family::Float => float_datum().boxed(),
        Family::Decimal => decimal_datum().boxed(),
        Family::Date => any::<i32>().prop_map(Datum::Date).boxed(),
        Family::Time => any::<i64>().prop_map(Datum::Time).boxed(),
        Family::Timestamp => any::<i64>().prop_map(Datum::Timestamp).boxed(),
        Family::TimestampTz => (any::<i64>(), -50_000i32..50_000)
            .prop_map(|(micros, offset_secs)| Datum::TimestampTz {
                micros,
                offset_secs,
            })
            .boxed(),
        Family::Interval => any::<(i32, i32, i64)>()
            .prop_map(|(months, days, micros)| Datum::Interval {
                months,
                days,
                micros,
            })
            .boxed(),
        Family::String => short_string().prop_map(Datum::string).boxed(),
        Family::Bytes => adversarial_bytes().prop_map(Datum::bytes).boxed(),
        Family::Uuid => any::<[u8; 16]>().prop_map(Datum::Uuid).boxed(),
        Family::Array => {
            let elem = ty.element_type().expect("array element type");
            prop::collection::vec(nullable(datum_for(elem)), 0..4)
                .prop_map(Datum::array)
                .boxed()
        }
        other => panic!("{:?} is not key-encodable", other),
    }
}

/// A key-encodable type with two values of it.
fn key_pair() -> impl Strategy<Value = (ColumnType, Datum<'static>, Datum<'static>)> {
    prop::sample::select(key_types()).prop_flat_map(|ty| {
        let values = datum_for(&ty);
        (Just(ty), values.clone(), values)
    })
}

// ============================================================================
// SCENARIOS
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn small_int_roundtrips_in_one_byte() {
        let ty = ColumnType::int8();
        let asc = key(&ty, &Datum::Int(42), Direction::Ascending);
        assert_eq!(asc, vec![0xB2]);

        let desc = key(&ty, &Datum::Int(42), Direction::Descending);
        assert_eq!(desc, vec![0x4D]);

        let alloc = DatumAlloc::new();
        let (d, n) = decode_key(&alloc, &ty, &desc, Direction::Descending).unwrap();
        assert_eq!(d, Datum::Int(42));
        assert_eq!(n, 1);
    }

    #[test]
    fn decimal_scale_does_not_affect_order() {
        let ty = ColumnType::decimal(10, 2);
        let a = decimal("1.50");
        let b = decimal("2.5");

        assert!(key(&ty, &a, Direction::Ascending) < key(&ty, &b, Direction::Ascending));
        assert!(key(&ty, &a, Direction::Descending) > key(&ty, &b, Direction::Descending));
        assert_eq!(
            key(&ty, &a, Direction::Ascending),
            key(&ty, &decimal("1.5"), Direction::Ascending)
        );
    }

    #[test]
    fn null_sorts_first_ascending_and_last_descending() {
        let ty = ColumnType::int8();
        let null = key(&ty, &Datum::Null, Direction::Ascending);
        assert_eq!(null, vec![0x00]);
        assert!(null < key(&ty, &Datum::Int(7), Direction::Ascending));
        assert!(
            key(&ty, &Datum::Null, Direction::Descending)
                > key(&ty, &Datum::Int(7), Direction::Descending)
        );
    }

    #[test]
    fn skip_string_leaves_trailing_bytes() {
        let ty = ColumnType::string();
        let mut buf = key(&ty, &Datum::string("hello"), Direction::Ascending);
        assert_eq!(buf, b"\x12hello\x00\x01".to_vec());
        buf.extend_from_slice(&[0x88, 0x12]);
        assert_eq!(skip_key(&buf, &ty, Direction::Ascending).unwrap(), 8);
    }

    #[test]
    fn one_month_sorts_below_forty_days() {
        let ty = ColumnType::new(Family::Interval);
        let month = Datum::Interval {
            months: 1,
            days: 0,
            micros: 0,
        };
        let forty_days = Datum::Interval {
            months: 0,
            days: 40,
            micros: 0,
        };
        assert!(
            key(&ty, &month, Direction::Ascending) < key(&ty, &forty_days, Direction::Ascending)
        );
        assert!(
            key(&ty, &month, Direction::Descending) > key(&ty, &forty_days, Direction::Descending)
        );
    }

    #[test]
    fn nested_string_arrays_roundtrip() {
        let ty = ColumnType::array(ColumnType::array(ColumnType::string()));
        let datum = Datum::array(vec![
            Datum::array(vec![Datum::string("a\0"), Datum::Null]),
            Datum::Null,
            Datum::array(vec![]),
        ]);
        for dir in BOTH {
            let buf = key(&ty, &datum, dir);
            let alloc = DatumAlloc::new();
            let (decoded, n) = decode_key(&alloc, &ty, &buf, dir).unwrap();
            let decoded = decoded.into_owned();
            assert_eq!((decoded, n), (datum.clone(), buf.len()));
        }
    }

    #[test]
    fn shorter_array_sorts_first() {
        let ty = ColumnType::array(ColumnType::int8());
        let short = Datum::array(vec![Datum::Int(1), Datum::Null]);
        let long = Datum::array(vec![Datum::Int(1), Datum::Null, Datum::Int(3)]);

        assert!(key(&ty, &short, Direction::Ascending) < key(&ty, &long, Direction::Ascending));
        assert!(key(&ty, &short, Direction::Descending) > key(&ty, &long, Direction::Descending));
    }

    #[test]
    fn concatenated_columns_decode_in_sequence() {
        let id = ColumnType::int8();
        let name = ColumnType::string();
        let mut buf = key(&id, &Datum::Int(-9), Direction::Ascending);
        buf.extend(key(&name, &Datum::string("a\0z"), Direction::Descending));

        let alloc = DatumAlloc::new();
        let (first, n) = decode_key(&alloc, &id, &buf, Direction::Ascending).unwrap();
        let (second, m) = decode_key(&alloc, &name, &buf[n..], Direction::Descending).unwrap();
        assert_eq!(first, Datum::Int(-9));
        assert_eq!(second, Datum::string("a\0z"));
        assert_eq!(n + m, buf.len());
    }
}

// ============================================================================
// CLASSIFIER AND ERROR TESTS
// ============================================================================

mod classifier_tests {
    use super::*;

    #[test]
    fn key_encodability_policy() {
        assert!(is_key_encodable(&ColumnType::decimal(5, 1)));
        assert!(is_key_encodable(&ColumnType::new(Family::Uuid)));
        assert!(is_key_encodable(&ColumnType::array(ColumnType::string())));
        assert!(!is_key_encodable(&ColumnType::json()));
        assert!(!is_key_encodable(&ColumnType::collated_string("de")));
        assert!(!is_key_encodable(&ColumnType::geometry()));
        assert!(!is_key_encodable(&ColumnType::geography()));
        assert!(!is_key_encodable(&ColumnType::tuple(vec![ColumnType::int8()])));
        assert!(!is_key_encodable(&ColumnType::array(ColumnType::json())));
    }

    #[test]
    fn unsupported_family_leaves_buffer_untouched() {
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
    fn mismatched_datum_is_rejected() {
        let mut buf = Vec::new();
        let err = encode_key(
            &ColumnType::int8(),
            &Datum::string("7"),
            Direction::Ascending,
            &mut buf,
        )
        .unwrap_err();
        assert_eq!(error_kind(&err), Some(CodecErrorKind::TypeMismatch));
        assert!(buf.is_empty());
    }

    #[test]
    fn corrupt_keys_report_their_kind() {
        let alloc = DatumAlloc::new();
        let cases: [(&ColumnType, &[u8], CodecErrorKind); 4] = [
            (&ColumnType::int8(), &[0xF8, 0x01], CodecErrorKind::Truncated),
            (&ColumnType::bool(), &[0x09], CodecErrorKind::MalformedMarker),
            (
                &ColumnType::string(),
                &[0x12, 0xC3, 0x28, 0x00, 0x01],
                CodecErrorKind::InvalidData,
            ),
            (&ColumnType::bytes(), &[0x12, 0x00, 0x07], CodecErrorKind::MalformedMarker),
        ];
        for (ty, bytes, kind) in cases {
            let err = decode_key(&alloc, ty, bytes, Direction::Ascending).unwrap_err();
            assert_eq!(error_kind(&err), Some(kind), "{:?}", bytes);
            assert!(kind.is_corruption());
        }
    }

    #[test]
    fn tuple_keys_cover_every_field() {
        let ty = ColumnType::tuple(vec![ColumnType::string(), ColumnType::decimal(8, 2)]);
        let datum = Datum::tuple(vec![Datum::string("x"), decimal("-3.25")]);
        let mut buf = Vec::new();
        encode_tuple_key(&ty, &datum, Direction::Descending, &mut buf).unwrap();

        let alloc = DatumAlloc::new();
        let (decoded, n) = decode_tuple_key(&alloc, &ty, &buf, Direction::Descending).unwrap();
        assert_eq!(decoded, datum);
        assert_eq!(n, buf.len());
        assert_eq!(skip_tuple_key(&buf, &ty, Direction::Descending).unwrap(), n);
    }
}

// ============================================================================
// PROPERTY TESTS
// ============================================================================

proptest! {
    #[test]
    fn int_roundtrip(d in nullable(any::<i64>().prop_map(Datum::Int))) {
        check_roundtrip(&ColumnType::int8(), &d)?;
    }

    #[test]
    fn int_order(a in any::<i64>(), b in any::<i64>()) {
        check_order(&ColumnType::int8(), &Datum::Int(a), &Datum::Int(b))?;
    }

    #[test]
    fn oid_order(a in any::<u32>(), b in any::<u32>()) {
        let ty = ColumnType::new(Family::Oid);
        check_roundtrip(&ty, &Datum::Oid(a))?;
        check_order(&ty, &Datum::Oid(a), &Datum::Oid(b))?;
    }

    #[test]
    fn float_roundtrip_and_order(a in float_datum(), b in float_datum()) {
        let ty = ColumnType::float();
        check_roundtrip(&ty, &a)?;
        check_order(&ty, &a, &b)?;
    }

    #[test]
    fn decimal_roundtrip_and_order(a in decimal_datum(), b in decimal_datum()) {
        let ty = ColumnType::decimal(30, 10);
        check_roundtrip(&ty, &a)?;
        check_order(&ty, &a, &b)?;
    }

    #[test]
    fn string_roundtrip_and_order(a in short_string(), b in short_string()) {
        let ty = ColumnType::string();
        let (a, b) = (Datum::string(a), Datum::string(b));
        check_roundtrip(&ty, &a)?;
        check_order(&ty, &a, &b)?;
    }

    #[test]
    fn adversarial_bytes_roundtrip_and_order(a in adversarial_bytes(), b in adversarial_bytes()) {
        let ty = ColumnType::bytes();
        let (a, b) = (Datum::bytes(a), Datum::bytes(b));
        check_roundtrip(&ty, &a)?;
        check_order(&ty, &a, &b)?;
    }

    #[test]
    fn temporal_roundtrip_and_order(
        a in any::<i64>(),
        b in any::<i64>(),
        offset in -50_000i32..50_000,
    ) {
        for family in [Family::Time, Family::Timestamp] {
            let ty = ColumnType::new(family);
            let (da, db) = match family {
                Family::Time => (Datum::Time(a), Datum::Time(b)),
                _ => (Datum::Timestamp(a), Datum::Timestamp(b)),
            };
            check_roundtrip(&ty, &da)?;
            check_order(&ty, &da, &db)?;
        }

        let tz = ColumnType::new(Family::TimestampTz);
        let da = Datum::TimestampTz { micros: a, offset_secs: offset };
        let db = Datum::TimestampTz { micros: b, offset_secs: 0 };
        check_order(&tz, &da, &db)?;
    }

    #[test]
    fn interval_order(a in any::<(i32, i32, i64)>(), b in any::<(i32, i32, i64)>()) {
        let ty = ColumnType::new(Family::Interval);
        let da = Datum::Interval { months: a.0, days: a.1, micros: a.2 };
        let db = Datum::Interval { months: b.0, days: b.1, micros: b.2 };
        check_roundtrip(&ty, &da)?;
        check_order(&ty, &da, &db)?;
    }

    #[test]
    fn date_and_uuid_order(
        a in any::<i32>(),
        b in any::<i32>(),
        ua in any::<[u8; 16]>(),
        ub in any::<[u8; 16]>(),
    ) {
        let date = ColumnType::new(Family::Date);
        check_roundtrip(&date, &Datum::Date(a))?;
        check_order(&date, &Datum::Date(a), &Datum::Date(b))?;

        let uuid = ColumnType::new(Family::Uuid);
        check_roundtrip(&uuid, &Datum::Uuid(ua))?;
        check_order(&uuid, &Datum::Uuid(ua), &Datum::Uuid(ub))?;
    }

    #[test]
    fn array_roundtrip_and_order(
        a in nullable(int_array_datum()),
        b in nullable(int_array_datum()),
    ) {
        let ty = ColumnType::array(ColumnType::int8());
        check_roundtrip(&ty, &a)?;
        check_order(&ty, &a, &b)?;
    }

    #[test]
    fn null_bounds_every_value((ty, d, _) in key_pair()) {
        for dir in BOTH {
            let null = key(&ty, &Datum::Null, dir);
            let value = key(&ty, &d, dir);
            match dir {
                Direction::Ascending => prop_assert!(null < value, "{:?}", d),
                Direction::Descending => prop_assert!(null > value, "{:?}", d),
            }
        }
    }

    #[test]
    fn every_family_roundtrips_and_orders((ty, a, b) in key_pair()) {
        check_roundtrip(&ty, &a)?;
        check_roundtrip(&ty, &b)?;
        check_order(&ty, &a, &b)?;
    }

    #[test]
    fn tuple_order(
        a in (nullable(any::<i64>().prop_map(Datum::Int)), adversarial_bytes()),
        b in (nullable(any::<i64>().prop_map(Datum::Int)), adversarial_bytes()),
    ) {
        let ty = ColumnType::tuple(vec![ColumnType::int8(), ColumnType::bytes()]);
        let ta = Datum::tuple(vec![a.0, Datum::bytes(a.1)]);
        let tb = Datum::tuple(vec![b.0, Datum::bytes(b.1)]);
        for dir in BOTH {
            let mut ka = Vec::new();
            let mut kb = Vec::new();
            encode_tuple_key(&ty, &ta, dir, &mut ka).unwrap();
            encode_tuple_key(&ty, &tb, dir, &mut kb).unwrap();
            prop_assert_eq!(ka.cmp(&kb), expected_order(&ta, &tb, dir));
            prop_assert_eq!(skip_tuple_key(&ka, &ty, dir).unwrap(), ka.len());
        }
    }

    #[test]
    fn decoding_garbage_never_panics(bytes in adversarial_bytes()) {
        let alloc = DatumAlloc::new();
        for ty in [
            ColumnType::int8(),
            ColumnType::decimal(10, 2),
            ColumnType::string(),
            ColumnType::array(ColumnType::bytes()),
            ColumnType::new(Family::Interval),
        ] {
            for dir in BOTH {
                let decoded = decode_key(&alloc, &ty, &bytes, dir).map(|(_, n)| n).ok();
                let skipped = skip_key(&bytes, &ty, dir).ok();
                if let Some(n) = decoded {
                    prop_assert_eq!(skipped, Some(n));
                }
            }
        }
    }
}
