//! # bitlayout
//!
//! Describe the bit-level layout of a binary record once, then use the same
//! description to decode bytes into a structured [Value] and to encode a
//! [Value] back into bytes.
//!
//! A layout is a tree of [schema::Node]s built with the functions in
//! [schema]: sequences of named fields, fixed or length-prefixed arrays,
//! branches on an earlier field's value, bit fields of 1 to 31 bits, wide
//! fields of any width, byte slices, encoded text, and padding. Fields may
//! straddle byte boundaries; bits are read and written MSB first.
//!
//! ## Example
//!
//! ```
//! use bitlayout::schema::{bitfield, branch, byte, byteslice, embed, field, padding, sequence};
//! use bitlayout::Value;
//!
//! let packet = sequence([
//!     field("version", bitfield(3).unwrap()),
//!     field("kind", bitfield(5).unwrap()),
//!     embed(branch(
//!         "kind",
//!         [
//!             (1, sequence([field("len", byte()), field("payload", byteslice("len"))]).unwrap()),
//!             (2, sequence([field("code", byte())]).unwrap()),
//!         ],
//!         Some(sequence([padding(8)]).unwrap()),
//!     )),
//! ])
//! .unwrap();
//!
//! let bytes = [0b010_00001, 2, 0xBE, 0xEF];
//! let decoded = bitlayout::decode(&packet, &bytes).unwrap();
//!
//! assert_eq!(decoded.get("version"), Some(&Value::Uint(2)));
//! assert_eq!(decoded.get("payload"), Some(&Value::Bytes(vec![0xBE, 0xEF])));
//! assert_eq!(bitlayout::encode(&packet, &decoded).unwrap(), bytes);
//! ```
//!
//! Encoding clips integers wider than their field instead of failing; every
//! other mismatch between value and schema is a [CodecError] carrying the
//! path of the offending field.

pub mod bits;
pub mod decode;
pub mod encode;
pub mod errors;
pub mod schema;
#[cfg(feature = "serde")]
pub mod serde;
pub mod text;
pub mod value;
pub mod wide;

pub use decode::{decode, decode_prefix};
pub use encode::encode;
pub use errors::{CodecError, ErrorKind, SchemaError};
pub use num_bigint::BigUint;
pub use schema::{Node, Schema};
pub use value::{Record, Value};
