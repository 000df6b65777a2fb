//! Decode interpreter: walks a schema tree against an input buffer.

use std::collections::BTreeMap;

use tracing::{debug, trace};

use crate::{
    bits::BitReader,
    errors::{CodecError, ErrorKind, FieldPath, ReadError, Segment},
    schema::{Length, Node, NodeKind, Slot},
    value::{Record, Value},
    wide,
};

/// Decodes `data` from its first bit according to `node`.
///
/// Bytes left over after the schema is satisfied are ignored.
pub fn decode(node: &Node, data: &[u8]) -> Result<Value, CodecError> {
    decode_prefix(node, data).map(|(value, _)| value)
}

/// Like [decode], but also returns the `(byte index, bit offset)` of the
/// first bit the schema did not consume.
pub fn decode_prefix(node: &Node, data: &[u8]) -> Result<(Value, (usize, u8)), CodecError> {
    let mut decoder = Decoder::new(data);
    let value = decoder.node(node, None)?;
    let end = decoder.reader.position();

    debug!(
        schema = node.kind_name(),
        input_len = data.len(),
        end_byte = end.0,
        end_bit = end.1,
        "decoded"
    );

    Ok((value, end))
}

struct Decoder<'a> {
    reader: BitReader<'a>,
    path: FieldPath,
}

impl<'a> Decoder<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self {
            reader: BitReader::new(data),
            path: FieldPath::new(),
        }
    }

    fn fail(&self, kind: impl Into<ErrorKind>) -> CodecError {
        CodecError::new(self.path.clone(), kind.into())
    }

    /// Decodes one node. `siblings` is the record built so far by the nearest
    /// enclosing sequence, if there is one.
    fn node(&mut self, node: &Node, siblings: Option<&Record>) -> Result<Value, CodecError> {
        let (byte, bit) = self.reader.position();
        trace!(node = node.kind_name(), byte, bit, path = %self.path, "decode");

        match &node.0 {
            NodeKind::Sequence(slots) => self.sequence(slots).map(Value::Record),
            NodeKind::Array { length, element } => {
                let count = self.resolve_length(length, siblings)?;
                // Zero-width elements consume nothing, so a count taken from the
                // input is bounded by the input instead.
                if element.bit_width() == Some(0) && count as u64 > self.reader.remaining_bits() {
                    return Err(self.fail(ReadError::OutOfBounds {
                        needed_bits: count as u64,
                        available_bits: self.reader.remaining_bits(),
                    }));
                }

                let mut values = Vec::with_capacity(count.min(self.reader.remaining_bits() as usize));

                for i in 0..count {
                    self.path.push(Segment::Index(i));
                    values.push(self.node(element, None)?);
                    self.path.pop();
                }

                Ok(Value::List(values))
            }
            NodeKind::Branch {
                discriminant,
                cases,
                else_case,
            } => {
                let siblings = siblings.ok_or_else(|| self.fail(ErrorKind::ScopeError))?;
                let selected = self.select(discriminant, cases, else_case.as_deref(), siblings)?;

                self.node(selected, Some(siblings))
            }
            NodeKind::Bits(width) => self
                .reader
                .read_bits(*width)
                .map(Value::Uint)
                .map_err(|e| self.fail(e)),
            NodeKind::Wide(width) => wide::read(&mut self.reader, *width)
                .map(Value::Wide)
                .map_err(|e| self.fail(e)),
            NodeKind::Slice(length) => self.bytes(length, siblings).map(Value::Bytes),
            NodeKind::Text { length, encoding } => {
                let bytes = self.bytes(length, siblings)?;
                encoding
                    .decode(&bytes)
                    .map(Value::Text)
                    .map_err(|e| self.fail(e))
            }
            NodeKind::Padding(width) => {
                self.reader.skip_bits(*width).map_err(|e| self.fail(e))?;
                Ok(Value::Uint(0))
            }
        }
    }

    fn sequence(&mut self, slots: &[Slot]) -> Result<Record, CodecError> {
        let mut record = Record::new();
        self.sequence_into(slots, &mut record)?;
        Ok(record)
    }

    /// Decodes `slots` into `record`, so each slot sees every field written
    /// before it, including those of an enclosing sequence when embedded.
    fn sequence_into(&mut self, slots: &[Slot], record: &mut Record) -> Result<(), CodecError> {
        for slot in slots {
            match slot {
                Slot::Named(name, child) => {
                    self.path.push(Segment::Field(name.clone()));
                    let value = self.node(child, Some(&*record))?;
                    self.path.pop();

                    // Later names win on collision.
                    record.insert(name.clone(), value);
                }
                Slot::Embedded(child) => self.embed(child, record)?,
                Slot::Padding(child) => {
                    self.node(child, Some(&*record))?;
                }
            }
        }

        Ok(())
    }

    /// Decodes an embedded node straight into the parent record. Sequences
    /// reached directly or through a branch share the parent's scope, the same
    /// record encode resolves their references against.
    fn embed(&mut self, node: &Node, record: &mut Record) -> Result<(), CodecError> {
        match &node.0 {
            NodeKind::Sequence(slots) => self.sequence_into(slots, record),
            NodeKind::Branch {
                discriminant,
                cases,
                else_case,
            } => {
                let selected = self.select(discriminant, cases, else_case.as_deref(), record)?;
                self.embed(selected, record)
            }
            _ => {
                let value = self.node(node, Some(&*record))?;
                Err(self.fail(ErrorKind::TypeMismatch {
                    expected: "record to embed",
                    found: value.kind_name().to_string(),
                }))
            }
        }
    }

    fn select<'n>(
        &self,
        discriminant: &str,
        cases: &'n BTreeMap<u64, Node>,
        else_case: Option<&'n Node>,
        siblings: &Record,
    ) -> Result<&'n Node, CodecError> {
        let value = self.resolve(discriminant, Some(siblings))?;
        cases
            .get(&value)
            .or(else_case)
            .ok_or_else(|| self.fail(ErrorKind::NoMatchingBranch { value }))
    }

    fn bytes(&mut self, length: &Length, siblings: Option<&Record>) -> Result<Vec<u8>, CodecError> {
        if !self.reader.is_aligned() {
            return Err(self.fail(ErrorKind::MisalignedAccess {
                bit_offset: self.reader.bit_offset(),
            }));
        }

        let len = self.resolve_length(length, siblings)?;
        self.reader
            .read_bytes(len)
            .map(<[u8]>::to_vec)
            .map_err(|e| self.fail(e))
    }

    fn resolve_length(&self, length: &Length, siblings: Option<&Record>) -> Result<usize, CodecError> {
        match length {
            Length::Fixed(len) => Ok(*len),
            Length::Field(name) => {
                let value = self.resolve(name, siblings)?;
                usize::try_from(value).map_err(|_| {
                    self.fail(ErrorKind::UnresolvedReference {
                        name: name.clone(),
                        found: format!("{value}, too large for a length"),
                    })
                })
            }
        }
    }

    fn resolve(&self, name: &str, siblings: Option<&Record>) -> Result<u64, CodecError> {
        resolve_sibling(name, siblings).map_err(|kind| self.fail(kind))
    }
}

/// Looks up an integer sibling by name. Shared with the encoder so both
/// directions resolve references identically.
pub(crate) fn resolve_sibling(name: &str, siblings: Option<&Record>) -> Result<u64, ErrorKind> {
    let unresolved = |found: &str| ErrorKind::UnresolvedReference {
        name: name.to_string(),
        found: found.to_string(),
    };

    let value = siblings
        .and_then(|record| record.get(name))
        .ok_or_else(|| unresolved("missing"))?;

    value.to_index().ok_or_else(|| unresolved(value.kind_name()))
}
