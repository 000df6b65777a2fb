//! Behavioral properties of the codec, checked against hand-computed bytes.

mod common;

use bitlayout::{
    decode, decode_prefix, encode,
    schema::{
        array, bit, bitfield, branch, byte, byteslice, embed, field, nibble, sequence, widefield,
    },
    value::uints,
    wide, BigUint, ErrorKind, Node, Record, Value,
};

fn record(pairs: &[(&str, Value)]) -> Value {
    pairs.iter().map(|(k, v)| (*k, v.clone())).collect()
}

fn widths(widths: &[u32]) -> Node {
    let slots = widths
        .iter()
        .enumerate()
        .map(|(i, w)| field(format!("f{i}"), bitfield(*w).unwrap()));
    sequence(slots).unwrap()
}

fn values(values: &[u64]) -> Value {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("f{i}"), Value::Uint(*v)))
        .collect()
}

#[test]
fn test_byte_boundary_decode() {
    common::init_tracing();

    let schema = array(4, nibble());
    let decoded = decode(&schema, &[0b00001111, 0b00100001]).unwrap();

    assert_eq!(decoded, uints([0u8, 15, 2, 1]));
}

#[test]
fn test_cross_byte_decode() {
    common::init_tracing();

    let decoded = decode(&widths(&[4, 1, 4, 7]), &[0b00001111, 0b01101100]).unwrap();

    assert_eq!(decoded, values(&[0, 1, 14, 108]));
}

#[test]
fn test_overflow_is_clipped_on_encode() {
    common::init_tracing();

    let schema = widths(&[7, 12, 5]);
    let overflowing = encode(&schema, &values(&[0b11111111, 0b1111110101101101, 0b11101011])).unwrap();
    let masked = encode(&schema, &values(&[0b1111111, 0b110101101101, 0b01011])).unwrap();

    assert_eq!(overflowing, masked);
    assert_eq!(overflowing, [0b11111111, 0b10101101, 0b10101011]);
}

#[test]
fn test_dynamic_array_length() {
    common::init_tracing();

    let schema = sequence([field("count", byte()), field("items", array("count", bit()))]).unwrap();
    let (decoded, end) = decode_prefix(&schema, &[3, 0b10100000]).unwrap();

    assert_eq!(decoded.get("items"), Some(&uints([1u8, 0, 1])));
    assert_eq!(end, (1, 3));

    // Same layout with nibbles consumes exactly `count` elements.
    let schema = sequence([field("count", byte()), field("items", array("count", nibble()))]).unwrap();
    let (decoded, end) = decode_prefix(&schema, &[3, 0b10100000, 0b01110000]).unwrap();

    assert_eq!(decoded.get("items"), Some(&uints([0b1010u8, 0, 0b0111])));
    assert_eq!(end, (2, 4));
}

#[test]
fn test_branch_dispatch_with_else() {
    common::init_tracing();

    let case_a = sequence([field("a", byte())]).unwrap();
    let case_b = sequence([field("b", nibble()), field("b2", nibble())]).unwrap();
    let case_c = sequence([field("c", byte())]).unwrap();

    let with_else = sequence([
        field("type", byte()),
        field(
            "body",
            branch("type", [(0, case_a.clone()), (1, case_b.clone())], Some(case_c)),
        ),
    ])
    .unwrap();

    let decoded = decode(&with_else, &[0, 0xAB]).unwrap();
    assert_eq!(decoded.get("body"), Some(&record(&[("a", Value::Uint(0xAB))])));

    let decoded = decode(&with_else, &[1, 0xAB]).unwrap();
    assert_eq!(
        decoded.get("body"),
        Some(&record(&[("b", Value::Uint(0xA)), ("b2", Value::Uint(0xB))]))
    );

    for other in [2u8, 17, 255] {
        let decoded = decode(&with_else, &[other, 0xAB]).unwrap();
        assert_eq!(decoded.get("body"), Some(&record(&[("c", Value::Uint(0xAB))])));
    }

    let without_else = sequence([
        field("type", byte()),
        field("body", branch("type", [(0, case_a), (1, case_b)], None)),
    ])
    .unwrap();

    let err = decode(&without_else, &[2, 0xAB]).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::NoMatchingBranch { value: 2 });
    assert_eq!(err.path().to_string(), "body");
}

#[test]
fn test_embed_merge_later_field_wins() {
    common::init_tracing();

    let inner = sequence([field("x", byte()), field("y", byte())]).unwrap();

    let embedded_first = sequence([embed(inner.clone()), field("x", byte())]).unwrap();
    let decoded = decode(&embedded_first, &[1, 2, 3]).unwrap();
    assert_eq!(decoded, record(&[("x", Value::Uint(3)), ("y", Value::Uint(2))]));

    let embedded_last = sequence([field("x", byte()), embed(inner)]).unwrap();
    let decoded = decode(&embedded_last, &[1, 2, 3]).unwrap();
    assert_eq!(decoded, record(&[("x", Value::Uint(2)), ("y", Value::Uint(3))]));

    let fields: Vec<&String> = decoded.as_record().unwrap().keys().collect();
    assert_eq!(fields, ["x", "y"]);
}

#[test]
fn test_byteslice_requires_alignment() {
    common::init_tracing();

    let schema = sequence([field("flags", bitfield(3).unwrap()), field("data", byteslice(1))]).unwrap();

    let err = decode(&schema, &[0xFF, 0xFF]).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MisalignedAccess { bit_offset: 3 });
    assert_eq!(err.path().to_string(), "data");

    let value = record(&[("flags", Value::Uint(1)), ("data", Value::Bytes(vec![0]))]);
    let err = encode(&schema, &value).unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::MisalignedAccess { bit_offset: 3 });
}

#[test]
fn test_wide_field_precision() {
    common::init_tracing();

    let schema = widefield(128).unwrap();
    let bytes = [0xFFu8; 16];

    let decoded = decode(&schema, &bytes).unwrap();
    let expected = (BigUint::from(1u8) << 128u32) - 1u8;
    assert_eq!(decoded, Value::Wide(expected));

    assert_eq!(encode(&schema, &decoded).unwrap(), bytes);
}

#[test]
fn test_wide_field_off_boundary() {
    common::init_tracing();

    let schema = sequence([
        field("lead", bitfield(3).unwrap()),
        field("big", widefield(70).unwrap()),
        field("tail", bitfield(7).unwrap()),
    ])
    .unwrap();

    let big = wide::from_binary_str(&"10".repeat(35)).unwrap();
    let value = record(&[
        ("lead", Value::Uint(0b101)),
        ("big", Value::Wide(big.clone())),
        ("tail", Value::Uint(0b1111111)),
    ]);

    let bytes = encode(&schema, &value).unwrap();
    assert_eq!(bytes.len(), 10);
    assert_eq!(decode(&schema, &bytes).unwrap(), value);
    assert_eq!(decode(&schema, &bytes).unwrap().get("big"), Some(&Value::Wide(big)));
}

#[test]
fn test_round_trip_of_decoded_value() {
    common::init_tracing();

    let schema = sequence([
        field("kind", bitfield(2).unwrap()),
        field("len", bitfield(6).unwrap()),
        embed(branch(
            "kind",
            [
                (0, sequence([field("data", byteslice("len"))]).unwrap()),
                (1, sequence([field("items", array("len", nibble()))]).unwrap()),
            ],
            None,
        )),
    ])
    .unwrap();

    for buffer in [
        vec![0b00_000010, 0xDE, 0xAD],
        vec![0b01_000011, 0x12, 0x30],
        vec![0b00_000000],
    ] {
        let decoded = decode(&schema, &buffer).unwrap();
        let encoded = encode(&schema, &decoded).unwrap();

        assert_eq!(encoded, buffer);
        assert_eq!(decode(&schema, &encoded).unwrap(), decoded);
    }
}

#[test]
fn test_errors_carry_field_path() {
    common::init_tracing();

    let entry = sequence([field("id", byte()), field("name", byteslice(2))]).unwrap();
    let schema = sequence([field("count", byte()), field("entries", array("count", entry))]).unwrap();

    let err = decode(&schema, &[2, 1, b'a', b'b', 2, b'c']).unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::TruncatedInput(_)));
    assert_eq!(err.path().to_string(), "entries[1].name");

    let entries = vec![
        record(&[("id", Value::Uint(1)), ("name", Value::Bytes(b"ab".to_vec()))]),
        record(&[("id", Value::Uint(2))]),
    ];

    let mut value = Record::new();
    value.insert("count".into(), Value::Uint(2));
    value.insert("entries".into(), Value::List(entries));

    let err = encode(&schema, &Value::Record(value)).unwrap_err();
    assert_eq!(
        err.kind(),
        &ErrorKind::TypeMismatch {
            expected: "bytes",
            found: "nothing".to_string()
        }
    );
    assert_eq!(err.path().to_string(), "entries[1].name");
}
