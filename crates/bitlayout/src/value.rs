//! Structured values produced by decoding and consumed by encoding.

use std::collections::BTreeMap;

use num_bigint::BigUint;

/// A decoded sequence: field name to value. Field order only matters for the
/// byte layout, so the record itself is keyed, not ordered.
pub type Record = BTreeMap<String, Value>;

/// A value produced when decoding a node, or supplied to encode one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Native unsigned integer from a bit field.
    Uint(u64),
    /// Arbitrary-precision unsigned integer from a wide field.
    Wide(BigUint),
    /// Raw bytes from a byte slice.
    Bytes(Vec<u8>),
    /// Decoded text.
    Text(String),
    /// Named fields of a sequence.
    Record(Record),
    /// Elements of an array.
    List(Vec<Value>),
}

impl Value {
    /// Short shape name used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Uint(_) => "integer",
            Value::Wide(_) => "wide integer",
            Value::Bytes(_) => "bytes",
            Value::Text(_) => "text",
            Value::Record(_) => "record",
            Value::List(_) => "list",
        }
    }

    pub fn as_uint(&self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_wide(&self) -> Option<&BigUint> {
        match self {
            Value::Wide(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    /// Integer view used to resolve lengths and discriminants: native
    /// integers, or wide integers small enough to fit a `u64`.
    pub fn to_index(&self) -> Option<u64> {
        match self {
            Value::Uint(v) => Some(*v),
            Value::Wide(v) => crate::wide::to_u64(v),
            _ => None,
        }
    }

    /// Looks up a field when this value is a record.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.as_record().and_then(|record| record.get(name))
    }
}

macro_rules! impl_from_uint {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Uint(value as u64)
                }
            }
        )*
    };
}

impl_from_uint!(u8, u16, u32, u64);

impl From<BigUint> for Value {
    fn from(value: BigUint) -> Self {
        Value::Wide(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Bytes(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<Record> for Value {
    fn from(value: Record) -> Self {
        Value::Record(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::List(value)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    /// Collects `(name, value)` pairs into a [Value::Record].
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Value::Record(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// Builds a [Value::List] of native integers.
pub fn uints<I, T>(values: I) -> Value
where
    I: IntoIterator<Item = T>,
    T: Into<u64>,
{
    Value::List(values.into_iter().map(|v| Value::Uint(v.into())).collect())
}
