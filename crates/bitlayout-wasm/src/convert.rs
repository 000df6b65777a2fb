use std::collections::BTreeMap;

use bitlayout::{Record, Value};
use serde::Serialize;
use wasm_bindgen::JsValue;

/// Shape handed to JavaScript. Wide integers become decimal strings since
/// they may exceed the safe integer range of a JS number.
#[derive(Debug, Serialize, PartialEq)]
#[serde(untagged)]
pub enum JsValueOut {
    Number(u64),
    Text(String),
    Bytes(Vec<u8>),
    Array(Vec<JsValueOut>),
    Object(BTreeMap<String, JsValueOut>),
}

pub fn value_to_out(value: Value) -> JsValueOut {
    match value {
        Value::Uint(x) => JsValueOut::Number(x),
        Value::Wide(x) => JsValueOut::Text(x.to_str_radix(10)),
        Value::Bytes(bytes) => JsValueOut::Bytes(bytes),
        Value::Text(text) => JsValueOut::Text(text),
        Value::List(values) => JsValueOut::Array(values.into_iter().map(value_to_out).collect()),
        Value::Record(record) => JsValueOut::Object(
            record
                .into_iter()
                .map(|(k, v)| (k, value_to_out(v)))
                .collect(),
        ),
    }
}

pub fn value_to_js(value: Value) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value_to_out(value)
        .serialize(&serializer)
        .map_err(error_to_js)
}

/// Maps a JSON value from JavaScript onto a codec value. Numbers must be
/// non-negative integers; `null` object members are treated as absent.
pub fn json_to_value(value: serde_json::Value) -> Result<Value, String> {
    match value {
        serde_json::Value::Number(n) => n
            .as_u64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            })
            .map(Value::Uint)
            .ok_or_else(|| format!("{n} is not an unsigned integer")),
        serde_json::Value::Bool(b) => Ok(Value::Uint(b as u64)),
        serde_json::Value::String(s) => Ok(Value::Text(s)),
        serde_json::Value::Array(values) => values
            .into_iter()
            .map(json_to_value)
            .collect::<Result<Vec<_>, _>>()
            .map(Value::List),
        serde_json::Value::Object(map) => {
            let mut record = Record::new();
            for (k, v) in map {
                if v.is_null() {
                    continue;
                }
                record.insert(k, json_to_value(v)?);
            }
            Ok(Value::Record(record))
        }
        serde_json::Value::Null => Err("null cannot be encoded".to_string()),
    }
}

pub fn error_to_js(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitlayout::BigUint;
    use serde_json::json;

    #[test]
    fn test_json_to_value() {
        let value = json_to_value(json!({
            "id": 7,
            "name": "abc",
            "flags": [1, 0, true],
            "skipped": null,
            "nested": { "x": 2.0 }
        }))
        .unwrap();

        let expected: Value = [
            ("id", Value::Uint(7)),
            ("name", Value::Text("abc".into())),
            ("flags", bitlayout::value::uints([1u8, 0, 1])),
            ("nested", [("x", 2u8)].into_iter().collect::<Value>()),
        ]
        .into_iter()
        .collect();

        assert_eq!(value, expected);
    }

    #[test]
    fn test_json_to_value_rejects_signed_and_fractional() {
        assert!(json_to_value(json!(-1)).is_err());
        assert!(json_to_value(json!(1.5)).is_err());
        assert!(json_to_value(json!(null)).is_err());
    }

    #[test]
    fn test_value_to_out_shape() {
        let value: Value = [
            ("a", Value::Uint(1)),
            ("big", Value::Wide(BigUint::from(u128::MAX))),
            ("raw", Value::Bytes(vec![0xDE, 0xAD])),
            ("list", bitlayout::value::uints([3u8, 4])),
        ]
        .into_iter()
        .collect();

        let rendered = serde_json::to_value(value_to_out(value)).unwrap();
        assert_eq!(
            rendered,
            json!({
                "a": 1,
                "big": "340282366920938463463374607431768211455",
                "raw": [222, 173],
                "list": [3, 4]
            })
        );
    }

    #[test]
    fn test_wide_field_survives_json() {
        use bitlayout::schema::{byte, field, sequence, widefield};

        let schema = sequence([
            field("id", byte()),
            field("small", widefield(40).unwrap()),
            field("big", widefield(128).unwrap()),
        ])
        .unwrap();
        let mut bytes = vec![7, 0, 0, 0, 0, 5];
        bytes.extend_from_slice(&[0xFF; 16]);

        let decoded = bitlayout::decode(&schema, &bytes).unwrap();
        let json = serde_json::to_value(value_to_out(decoded)).unwrap();
        assert_eq!(json["small"], json!("5"));

        let value = json_to_value(json).unwrap();
        assert_eq!(bitlayout::encode(&schema, &value).unwrap(), bytes);
    }
}
