//! Error types for schema construction, bit cursor access, and decode/encode.

use std::fmt;

use thiserror::Error;

/// Errors produced while building a [crate::schema::Node].
///
/// These are shape problems in the schema itself, caught once at construction
/// time rather than on every decode or encode.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// A sequence slot holds a bare node that is not padding.
    #[error("sequence slot {index} has no name and is not padding")]
    UnnamedSlot { index: usize },
    /// A native bit field was asked to hold more than 31 bits.
    #[error("bit field of {width} bits exceeds the 31-bit native limit, use a wide field")]
    BitFieldTooWide { width: u32 },
    /// A bit or wide field was declared with zero width.
    #[error("field width must be at least one bit")]
    ZeroWidth,
    /// The text encoding label is not known to the text codec.
    #[error("unknown text encoding {0:?}")]
    UnknownEncoding(String),
    /// A serialized schema definition could not be turned into a node.
    #[error("invalid schema definition: {0}")]
    InvalidDefinition(String),
}

/// Errors produced by the bit cursor when reading a buffer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReadError {
    /// Requested bit window extends beyond the end of the data.
    #[error("read of {needed_bits} bits past end of input ({available_bits} bits left)")]
    OutOfBounds {
        needed_bits: u64,
        available_bits: u64,
    },
    /// More bits were requested in a single native read than fit a `u64` window.
    #[error("cannot read {0} bits in a single native window")]
    TooManyBitsRead(u32),
}

/// What went wrong during a decode or encode call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A read extended past the end of the input buffer.
    #[error("truncated input: {0}")]
    TruncatedInput(ReadError),
    /// A length or discriminant reference names a sibling that is missing or not an integer.
    #[error("sibling {name:?} is {found}, expected an integer")]
    UnresolvedReference { name: String, found: String },
    /// The discriminant value has no case and the branch has no else case.
    #[error("no path matching value {value} and no else path specified")]
    NoMatchingBranch { value: u64 },
    /// A byte slice or text node was entered with a non-zero bit offset.
    #[error("byte-aligned field entered at bit offset {bit_offset}")]
    MisalignedAccess { bit_offset: u8 },
    /// The value to encode does not have the shape the node requires.
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },
    /// An array value has a different element count than its resolved length.
    #[error("expected array with length {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    /// A branch was evaluated with no enclosing sequence.
    #[error("can only branch as part of a sequence")]
    ScopeError,
    /// The text codec rejected the bytes or characters.
    #[error("text is not representable as {encoding}")]
    InvalidText { encoding: &'static str },
}

impl From<ReadError> for ErrorKind {
    fn from(value: ReadError) -> Self {
        ErrorKind::TruncatedInput(value)
    }
}

/// One step in a [FieldPath].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

/// Location of a failing node inside the value being decoded or encoded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldPath(Vec<Segment>);

impl FieldPath {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    pub(crate) fn push(&mut self, segment: Segment) {
        self.0.push(segment);
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }

        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => f.write_str(name)?,
                Segment::Field(name) => write!(f, ".{name}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }

        Ok(())
    }
}

impl<S: Into<String>> FromIterator<S> for FieldPath {
    /// Builds a path of named fields, mostly useful in tests.
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        FieldPath(iter.into_iter().map(|s| Segment::Field(s.into())).collect())
    }
}

/// Error returned by [crate::decode] and [crate::encode]: the failure and where it happened.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind} (at {path})")]
pub struct CodecError {
    pub path: FieldPath,
    pub kind: ErrorKind,
}

impl CodecError {
    pub fn new(path: FieldPath, kind: ErrorKind) -> Self {
        Self { path, kind }
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn path(&self) -> &FieldPath {
        &self.path
    }
}
