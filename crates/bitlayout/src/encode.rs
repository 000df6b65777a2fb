//! Encode interpreter: walks a schema tree against a value, writing bits.
//!
//! References are resolved from the value being encoded. A sequence makes its
//! whole input record visible to its slots, so a length or discriminant
//! field can be found wherever it sits in the record.

use std::borrow::Cow;

use num_bigint::BigUint;
use tracing::{debug, trace, warn};

use crate::{
    bits::BitWriter,
    decode::resolve_sibling,
    errors::{CodecError, ErrorKind, FieldPath, Segment},
    schema::{Length, Node, NodeKind, Slot},
    value::{Record, Value},
    wide,
};

/// Encodes `value` according to `node` into a newly allocated buffer.
///
/// A schema that does not end on a byte boundary leaves zero bits in the low
/// end of the final byte.
pub fn encode(node: &Node, value: &Value) -> Result<Vec<u8>, CodecError> {
    let mut encoder = Encoder::new();
    encoder.node(node, Some(value), None)?;
    let out = encoder.writer.finish();

    debug!(schema = node.kind_name(), output_len = out.len(), "encoded");

    Ok(out)
}

struct Encoder {
    writer: BitWriter,
    path: FieldPath,
}

fn found(value: Option<&Value>) -> String {
    value.map_or("nothing", Value::kind_name).to_string()
}

impl Encoder {
    fn new() -> Self {
        Self {
            writer: BitWriter::new(),
            path: FieldPath::new(),
        }
    }

    fn fail(&self, kind: impl Into<ErrorKind>) -> CodecError {
        CodecError::new(self.path.clone(), kind.into())
    }

    fn mismatch(&self, expected: &'static str, value: Option<&Value>) -> CodecError {
        self.fail(ErrorKind::TypeMismatch {
            expected,
            found: found(value),
        })
    }

    /// Encodes one node. `value` is `None` when the record has no entry for
    /// the slot; `siblings` is the input record of the nearest enclosing
    /// sequence.
    fn node(
        &mut self,
        node: &Node,
        value: Option<&Value>,
        siblings: Option<&Record>,
    ) -> Result<(), CodecError> {
        trace!(
            node = node.kind_name(),
            len = self.writer.len(),
            bit = self.writer.bit_offset(),
            path = %self.path,
            "encode"
        );

        match &node.0 {
            NodeKind::Sequence(slots) => match value {
                Some(Value::Record(record)) => self.sequence(slots, value, record),
                other => Err(self.mismatch("record", other)),
            },
            NodeKind::Array { length, element } => {
                let Some(Value::List(values)) = value else {
                    return Err(self.mismatch("list", value));
                };

                let expected = self.resolve_length(length, siblings)?;
                if expected != values.len() {
                    return Err(self.fail(ErrorKind::LengthMismatch {
                        expected,
                        actual: values.len(),
                    }));
                }

                for (i, element_value) in values.iter().enumerate() {
                    self.path.push(Segment::Index(i));
                    self.node(element, Some(element_value), None)?;
                    self.path.pop();
                }

                Ok(())
            }
            NodeKind::Branch {
                discriminant,
                cases,
                else_case,
            } => {
                let siblings = siblings.ok_or_else(|| self.fail(ErrorKind::ScopeError))?;
                let key = resolve_sibling(discriminant, Some(siblings)).map_err(|e| self.fail(e))?;
                let selected = cases
                    .get(&key)
                    .or(else_case.as_deref())
                    .ok_or_else(|| self.fail(ErrorKind::NoMatchingBranch { value: key }))?;

                self.node(selected, value, Some(siblings))
            }
            NodeKind::Bits(width) => {
                let raw = match value {
                    Some(Value::Uint(v)) => *v,
                    Some(Value::Wide(v)) => low_u64(v),
                    Some(Value::Text(s)) => match wide::from_decimal_str(s) {
                        Some(v) => low_u64(&v),
                        None => return Err(self.mismatch("integer", value)),
                    },
                    other => return Err(self.mismatch("integer", other)),
                };

                self.writer.write_bits(*width, raw);
                Ok(())
            }
            NodeKind::Wide(width) => {
                let raw = match value {
                    Some(Value::Wide(v)) => Cow::Borrowed(v),
                    Some(Value::Uint(v)) => Cow::Owned(BigUint::from(*v)),
                    // Decimal digits, the form wide values take in JSON.
                    Some(Value::Text(s)) => match wide::from_decimal_str(s) {
                        Some(v) => Cow::Owned(v),
                        None => return Err(self.mismatch("integer", value)),
                    },
                    other => return Err(self.mismatch("integer", other)),
                };

                wide::write(&mut self.writer, *width, &raw);
                Ok(())
            }
            NodeKind::Slice(length) => {
                self.ensure_aligned()?;
                let expected = self.resolve_length(length, siblings)?;
                let bytes = extract_bytes(value).ok_or_else(|| self.mismatch("bytes", value))?;

                self.write_bytes(expected, &bytes);
                Ok(())
            }
            NodeKind::Text { length, encoding } => {
                self.ensure_aligned()?;
                let expected = self.resolve_length(length, siblings)?;
                let Some(Value::Text(text)) = value else {
                    return Err(self.mismatch("text", value));
                };
                let bytes = encoding.encode(text).map_err(|e| self.fail(e))?;

                self.write_bytes(expected, &bytes);
                Ok(())
            }
            NodeKind::Padding(width) => {
                self.writer.write_zeros(*width);
                Ok(())
            }
        }
    }

    /// `whole` is the sequence's own input value, i.e. `record` as a [Value].
    fn sequence(
        &mut self,
        slots: &[Slot],
        whole: Option<&Value>,
        record: &Record,
    ) -> Result<(), CodecError> {
        for slot in slots {
            match slot {
                Slot::Named(name, child) => {
                    self.path.push(Segment::Field(name.clone()));
                    self.node(child, record.get(name), Some(record))?;
                    self.path.pop();
                }
                // The embedded child destructures its fields from the parent record.
                Slot::Embedded(child) => self.node(child, whole, Some(record))?,
                Slot::Padding(child) => self.node(child, None, Some(record))?,
            }
        }

        Ok(())
    }

    fn ensure_aligned(&self) -> Result<(), CodecError> {
        if self.writer.is_aligned() {
            return Ok(());
        }

        Err(self.fail(ErrorKind::MisalignedAccess {
            bit_offset: self.writer.bit_offset(),
        }))
    }

    fn resolve_length(&self, length: &Length, siblings: Option<&Record>) -> Result<usize, CodecError> {
        match length {
            Length::Fixed(len) => Ok(*len),
            Length::Field(name) => {
                let value = resolve_sibling(name, siblings).map_err(|e| self.fail(e))?;
                usize::try_from(value).map_err(|_| {
                    self.fail(ErrorKind::UnresolvedReference {
                        name: name.clone(),
                        found: format!("{value}, too large for a length"),
                    })
                })
            }
        }
    }

    /// Appends caller bytes verbatim, even when the count disagrees with the
    /// resolved length.
    fn write_bytes(&mut self, expected: usize, bytes: &[u8]) {
        if bytes.len() != expected {
            warn!(
                path = %self.path,
                expected,
                actual = bytes.len(),
                "byte count differs from resolved length, writing as given"
            );
        }

        self.writer.write_bytes(bytes);
    }
}

/// Low 64 bits of a wide value; the bit field mask drops the rest anyway.
fn low_u64(value: &BigUint) -> u64 {
    value.iter_u64_digits().next().unwrap_or(0)
}

/// Raw bytes from a [Value::Bytes], or from a list of byte-sized integers.
fn extract_bytes(value: Option<&Value>) -> Option<Cow<'_, [u8]>> {
    match value? {
        Value::Bytes(bytes) => Some(Cow::Borrowed(bytes.as_slice())),
        Value::List(values) => values
            .iter()
            .map(|v| v.as_uint().and_then(|x| u8::try_from(x).ok()))
            .collect::<Option<Vec<u8>>>()
            .map(Cow::Owned),
        _ => None,
    }
}
