//! Schema nodes and the builder functions that construct them.
//!
//! A schema is an immutable tree of [Node]s. Nodes are only built through the
//! functions in this module, which validate shape up front so that decode and
//! encode never meet a malformed tree.
//!
//! ```
//! use bitlayout::schema::{array, bitfield, byte, field, sequence};
//! use bitlayout::value::uints;
//!
//! let schema = sequence([
//!     field("count", byte()),
//!     field("items", array("count", bitfield(4).unwrap())),
//! ])
//! .unwrap();
//!
//! let decoded = bitlayout::decode(&schema, &[2, 0x9A]).unwrap();
//! assert_eq!(decoded.get("items"), Some(&uints([9u8, 10])));
//! assert_eq!(bitlayout::encode(&schema, &decoded).unwrap(), vec![2, 0x9A]);
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::{
    errors::{CodecError, SchemaError},
    text::TextEncoding,
    value::Value,
};

/// Widest field a [bitfield] may declare. Anything wider needs [widefield].
pub const MAX_BITFIELD_WIDTH: u32 = 31;

/// Element count of an array, or byte count of a slice or text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Length {
    /// Known when the schema is built.
    Fixed(usize),
    /// Read from an integer field placed earlier in the enclosing sequence.
    Field(String),
}

impl From<usize> for Length {
    fn from(value: usize) -> Self {
        Length::Fixed(value)
    }
}

impl From<&str> for Length {
    fn from(value: &str) -> Self {
        Length::Field(value.to_string())
    }
}

impl From<String> for Length {
    fn from(value: String) -> Self {
        Length::Field(value)
    }
}

/// Name given to a sequence slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotName {
    /// Store the child's value under this name.
    Field(String),
    /// Merge the child's record into the parent record.
    Embed,
}

/// Slot name that splats a child record into its parent. See [embed].
pub const EMBED: SlotName = SlotName::Embed;

impl From<&str> for SlotName {
    fn from(value: &str) -> Self {
        SlotName::Field(value.to_string())
    }
}

impl From<String> for SlotName {
    fn from(value: String) -> Self {
        SlotName::Field(value)
    }
}

/// Unvalidated input to [sequence]: a node with or without a name.
#[derive(Debug, Clone)]
pub struct SlotSpec {
    name: Option<SlotName>,
    node: Node,
}

impl From<Node> for SlotSpec {
    /// A bare node. Only padding may appear unnamed.
    fn from(node: Node) -> Self {
        SlotSpec { name: None, node }
    }
}

impl<N: Into<SlotName>> From<(N, Node)> for SlotSpec {
    fn from((name, node): (N, Node)) -> Self {
        field(name, node)
    }
}

/// A `(name, node)` slot. Pass [EMBED] as the name to splat the child.
pub fn field(name: impl Into<SlotName>, node: Node) -> SlotSpec {
    SlotSpec {
        name: Some(name.into()),
        node,
    }
}

/// A slot whose record is merged into the parent record instead of nested.
pub fn embed(node: Node) -> SlotSpec {
    field(EMBED, node)
}

/// A validated sequence slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Slot {
    Named(String, Node),
    Embedded(Node),
    Padding(Node),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Sequence(Vec<Slot>),
    Array {
        length: Length,
        element: Box<Node>,
    },
    Branch {
        discriminant: String,
        cases: BTreeMap<u64, Node>,
        else_case: Option<Box<Node>>,
    },
    Bits(u32),
    Wide(u64),
    Slice(Length),
    Text {
        length: Length,
        encoding: TextEncoding,
    },
    Padding(u64),
}

/// One node of a schema tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node(pub(crate) NodeKind);

impl Node {
    /// Short name of the node kind, as used in logs and JSON definitions.
    pub fn kind_name(&self) -> &'static str {
        match &self.0 {
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Array { .. } => "array",
            NodeKind::Branch { .. } => "branch",
            NodeKind::Bits(_) => "bits",
            NodeKind::Wide(_) => "wide",
            NodeKind::Slice(_) => "slice",
            NodeKind::Text { .. } => "text",
            NodeKind::Padding(_) => "padding",
        }
    }

    pub fn is_padding(&self) -> bool {
        matches!(self.0, NodeKind::Padding(_))
    }

    /// Total bits this node occupies, when that does not depend on the data.
    ///
    /// Returns `None` for lengths read from sibling fields, for branches
    /// whose cases differ in width, and when the total overflows `u64`.
    pub fn bit_width(&self) -> Option<u64> {
        match &self.0 {
            NodeKind::Sequence(slots) => slots.iter().try_fold(0u64, |acc, slot| {
                let node = match slot {
                    Slot::Named(_, node) | Slot::Embedded(node) | Slot::Padding(node) => node,
                };
                acc.checked_add(node.bit_width()?)
            }),
            NodeKind::Array {
                length: Length::Fixed(count),
                element,
            } => (*count as u64).checked_mul(element.bit_width()?),
            NodeKind::Array { .. } => None,
            NodeKind::Branch {
                cases, else_case, ..
            } => {
                let mut widths = cases.values().chain(else_case.as_deref()).map(Node::bit_width);
                let first = widths.next()??;
                widths.all(|w| w == Some(first)).then_some(first)
            }
            NodeKind::Bits(width) => Some(*width as u64),
            NodeKind::Wide(width) | NodeKind::Padding(width) => Some(*width),
            NodeKind::Slice(Length::Fixed(len))
            | NodeKind::Text {
                length: Length::Fixed(len),
                ..
            } => (*len as u64).checked_mul(8),
            NodeKind::Slice(_) | NodeKind::Text { .. } => None,
        }
    }
}

/// An ordered list of slots; decodes to a [Value::Record].
///
/// Each slot is a `(name, node)` pair built with [field], an embedded child
/// built with [embed], or a bare [padding] node. Any other bare node is
/// rejected.
pub fn sequence<I, S>(slots: I) -> Result<Node, SchemaError>
where
    I: IntoIterator<Item = S>,
    S: Into<SlotSpec>,
{
    let mut validated = Vec::new();

    for (index, slot) in slots.into_iter().enumerate() {
        let SlotSpec { name, node } = slot.into();
        validated.push(match name {
            Some(SlotName::Field(name)) => Slot::Named(name, node),
            Some(SlotName::Embed) => Slot::Embedded(node),
            None if node.is_padding() => Slot::Padding(node),
            None => return Err(SchemaError::UnnamedSlot { index }),
        });
    }

    Ok(Node(NodeKind::Sequence(validated)))
}

/// `length` repetitions of `element`; decodes to a [Value::List].
///
/// Elements are decoded without a sibling context, so they cannot reference
/// fields of the record that holds the array.
pub fn array(length: impl Into<Length>, element: Node) -> Node {
    Node(NodeKind::Array {
        length: length.into(),
        element: Box::new(element),
    })
}

/// Picks a node by the value of an earlier sibling field.
pub fn branch<I>(discriminant: impl Into<String>, cases: I, else_case: Option<Node>) -> Node
where
    I: IntoIterator<Item = (u64, Node)>,
{
    Node(NodeKind::Branch {
        discriminant: discriminant.into(),
        cases: cases.into_iter().collect(),
        else_case: else_case.map(Box::new),
    })
}

/// Unsigned field of 1 to 31 bits; decodes to [Value::Uint].
pub fn bitfield(width: u32) -> Result<Node, SchemaError> {
    if width == 0 {
        return Err(SchemaError::ZeroWidth);
    }
    if width > MAX_BITFIELD_WIDTH {
        return Err(SchemaError::BitFieldTooWide { width });
    }

    Ok(Node(NodeKind::Bits(width)))
}

/// A single-bit field.
pub fn bit() -> Node {
    Node(NodeKind::Bits(1))
}

/// A 4-bit field.
pub fn nibble() -> Node {
    Node(NodeKind::Bits(4))
}

/// An 8-bit field.
pub fn byte() -> Node {
    Node(NodeKind::Bits(8))
}

/// Unsigned field of any width; decodes to [Value::Wide].
pub fn widefield(width: u64) -> Result<Node, SchemaError> {
    if width == 0 {
        return Err(SchemaError::ZeroWidth);
    }

    Ok(Node(NodeKind::Wide(width)))
}

/// Raw bytes; decodes to [Value::Bytes]. Must start on a byte boundary.
pub fn byteslice(length: impl Into<Length>) -> Node {
    Node(NodeKind::Slice(length.into()))
}

/// UTF-8 text of `length` bytes; decodes to [Value::Text].
pub fn text(length: impl Into<Length>) -> Node {
    Node(NodeKind::Text {
        length: length.into(),
        encoding: TextEncoding::utf_8(),
    })
}

/// Text of `length` bytes in the encoding named by `label`.
pub fn encoded_text(length: impl Into<Length>, label: &str) -> Result<Node, SchemaError> {
    Ok(Node(NodeKind::Text {
        length: length.into(),
        encoding: TextEncoding::for_label(label)?,
    }))
}

/// `width` bits skipped on decode and written as zeros on encode.
pub fn padding(width: u64) -> Node {
    Node(NodeKind::Padding(width))
}

/// A schema root shared behind an [Arc], cheap to clone across threads.
#[derive(Debug, Clone)]
pub struct Schema {
    root: Arc<Node>,
}

impl Schema {
    pub fn new(root: Node) -> Self {
        Self {
            root: Arc::new(root),
        }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// Decodes `data` from its start. Trailing bytes are ignored.
    pub fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        crate::decode(&self.root, data)
    }

    /// Encodes `value` into a fresh buffer.
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        crate::encode(&self.root, value)
    }
}

impl From<Node> for Schema {
    fn from(root: Node) -> Self {
        Schema::new(root)
    }
}
