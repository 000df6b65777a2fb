//! JSON-deserializable schema definitions.
//!
//! These types describe a schema tree as data, for example a layout file
//! shipped alongside an application. They compile into [Node]s through the
//! same builder functions used from Rust, so a definition gets the same
//! validation as hand-built code.
//!
//! ```json
//! { "type": "sequence", "fields": [
//!     { "name": "count", "node": { "type": "bits", "width": 8 } },
//!     { "name": "items", "node": { "type": "array", "length": "count",
//!                                  "element": { "type": "bits", "width": 4 } } },
//!     { "node": { "type": "padding", "width": 4 } }
//! ] }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    errors::SchemaError,
    schema::{self, Length, Node, NodeKind, Slot, SlotSpec},
};

/// Array, slice, or text length: a literal count or the name of an earlier field.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum LengthDef {
    Fixed(usize),
    Field(String),
}

/// One node of a schema definition.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeDef {
    /// Ordered slots; see [SlotDef].
    Sequence { fields: Vec<SlotDef> },
    /// Repeated element.
    Array {
        length: LengthDef,
        element: Box<NodeDef>,
    },
    /// Node chosen by the value of the sibling field named by `on`.
    Branch {
        on: String,
        /// Keyed by the decimal discriminant value.
        cases: BTreeMap<String, NodeDef>,
        #[serde(default, rename = "else", skip_serializing_if = "Option::is_none")]
        else_case: Option<Box<NodeDef>>,
    },
    /// Unsigned field of 1 to 31 bits.
    Bits { width: u32 },
    /// Unsigned field of any width.
    Wide { width: u64 },
    /// Raw bytes.
    Slice { length: LengthDef },
    /// Encoded text; `encoding` is a WHATWG label and defaults to UTF-8.
    Text {
        length: LengthDef,
        #[serde(default = "default_encoding")]
        encoding: String,
    },
    /// Skipped bits.
    Padding { width: u64 },
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

/// A sequence slot: named, embedded, or (for padding only) bare.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct SlotDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Merge the node's record into the parent instead of naming it.
    #[serde(default, skip_serializing_if = "is_false")]
    pub embed: bool,
    pub node: NodeDef,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl From<LengthDef> for Length {
    fn from(value: LengthDef) -> Self {
        match value {
            LengthDef::Fixed(len) => Length::Fixed(len),
            LengthDef::Field(name) => Length::Field(name),
        }
    }
}

impl From<&Length> for LengthDef {
    fn from(value: &Length) -> Self {
        match value {
            Length::Fixed(len) => LengthDef::Fixed(*len),
            Length::Field(name) => LengthDef::Field(name.clone()),
        }
    }
}

impl TryFrom<SlotDef> for SlotSpec {
    type Error = SchemaError;

    fn try_from(value: SlotDef) -> Result<Self, Self::Error> {
        let node = Node::try_from(value.node)?;

        match (value.name, value.embed) {
            (Some(name), false) => Ok(schema::field(name, node)),
            (None, true) => Ok(schema::embed(node)),
            (None, false) => Ok(SlotSpec::from(node)),
            (Some(name), true) => Err(SchemaError::InvalidDefinition(format!(
                "slot {name:?} cannot be both named and embedded"
            ))),
        }
    }
}

impl TryFrom<NodeDef> for Node {
    type Error = SchemaError;

    fn try_from(value: NodeDef) -> Result<Self, Self::Error> {
        match value {
            NodeDef::Sequence { fields } => {
                let slots = fields
                    .into_iter()
                    .map(SlotSpec::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                schema::sequence(slots)
            }
            NodeDef::Array { length, element } => {
                Ok(schema::array(Length::from(length), Node::try_from(*element)?))
            }
            NodeDef::Branch {
                on,
                cases,
                else_case,
            } => {
                let mut compiled = Vec::with_capacity(cases.len());
                for (key, def) in cases {
                    let key = key.trim().parse::<u64>().map_err(|_| {
                        SchemaError::InvalidDefinition(format!(
                            "branch case {key:?} is not an unsigned integer"
                        ))
                    })?;
                    compiled.push((key, Node::try_from(def)?));
                }

                let else_case = else_case.map(|def| Node::try_from(*def)).transpose()?;
                Ok(schema::branch(on, compiled, else_case))
            }
            NodeDef::Bits { width } => schema::bitfield(width),
            NodeDef::Wide { width } => schema::widefield(width),
            NodeDef::Slice { length } => Ok(schema::byteslice(Length::from(length))),
            NodeDef::Text { length, encoding } => {
                schema::encoded_text(Length::from(length), &encoding)
            }
            NodeDef::Padding { width } => Ok(schema::padding(width)),
        }
    }
}

impl From<&Node> for NodeDef {
    fn from(value: &Node) -> Self {
        match &value.0 {
            NodeKind::Sequence(slots) => NodeDef::Sequence {
                fields: slots
                    .iter()
                    .map(|slot| match slot {
                        Slot::Named(name, node) => SlotDef {
                            name: Some(name.clone()),
                            embed: false,
                            node: node.into(),
                        },
                        Slot::Embedded(node) => SlotDef {
                            name: None,
                            embed: true,
                            node: node.into(),
                        },
                        Slot::Padding(node) => SlotDef {
                            name: None,
                            embed: false,
                            node: node.into(),
                        },
                    })
                    .collect(),
            },
            NodeKind::Array { length, element } => NodeDef::Array {
                length: length.into(),
                element: Box::new(NodeDef::from(&**element)),
            },
            NodeKind::Branch {
                discriminant,
                cases,
                else_case,
            } => NodeDef::Branch {
                on: discriminant.clone(),
                cases: cases
                    .iter()
                    .map(|(key, node)| (key.to_string(), node.into()))
                    .collect(),
                else_case: else_case
                    .as_deref()
                    .map(|node| Box::new(NodeDef::from(node))),
            },
            NodeKind::Bits(width) => NodeDef::Bits { width: *width },
            NodeKind::Wide(width) => NodeDef::Wide { width: *width },
            NodeKind::Slice(length) => NodeDef::Slice {
                length: length.into(),
            },
            NodeKind::Text { length, encoding } => NodeDef::Text {
                length: length.into(),
                encoding: encoding.name().to_lowercase(),
            },
            NodeKind::Padding(width) => NodeDef::Padding { width: *width },
        }
    }
}

/// Parses a JSON schema definition and compiles it into a [Node].
pub fn from_json(json: &str) -> Result<Node, SchemaError> {
    let def: NodeDef =
        serde_json::from_str(json).map_err(|e| SchemaError::InvalidDefinition(e.to_string()))?;
    Node::try_from(def)
}

/// Renders a [Node] as a JSON schema definition.
pub fn to_json(node: &Node) -> Result<String, SchemaError> {
    serde_json::to_string_pretty(&NodeDef::from(node))
        .map_err(|e| SchemaError::InvalidDefinition(e.to_string()))
}
