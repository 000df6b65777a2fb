//! WASM bindings for the `bitlayout` codec.
//!
//! This crate exposes a compact API to JavaScript for decoding binary
//! payloads into plain objects, and encoding objects back into bytes,
//! according to a JSON layout definition. The definition format is the
//! one accepted by [`bitlayout::serde::from_json`].
//!
//! The entry point from JS is the [`WasmSchema`] type:
//!
//! ```text
//! // Pseudo TypeScript example
//! //
//! // const schemaJson = JSON.stringify({
//! //   type: "sequence",
//! //   fields: [
//! //     { name: "count", node: { type: "bits", width: 8 } },
//! //     { name: "items", node: { type: "array", length: "count",
//! //                              element: { type: "bits", width: 4 } } },
//! //   ],
//! // });
//! //
//! // const schema = new WasmSchema(schemaJson);
//! // const record = schema.decode(new Uint8Array([2, 0x1f]));
//! // // record is { count: 2, items: [1, 15] }
//! // const bytes = schema.encode(record);
//! ```
//!
//! Values cross the boundary as follows: integers are numbers, wide fields
//! decode to decimal strings, byte slices are arrays of numbers, text is a
//! string, and records are plain objects. Integer fields also accept
//! decimal strings on encode, so decoded wide values round-trip.
//!
//! Errors are returned as strings carrying the field path, for example
//! `"expected bytes, found nothing (at entries[1].name)"`.

mod convert;

use bitlayout::Schema;
use wasm_bindgen::prelude::*;

/// Layout compiled from JSON, reusable for any number of payloads.
#[wasm_bindgen]
pub struct WasmSchema {
    schema: Schema,
}

#[wasm_bindgen]
impl WasmSchema {
    /// Compiles a JSON layout definition.
    ///
    /// Fails if the JSON is malformed or the layout is invalid (a bare
    /// non-padding field, a bit field wider than 31 bits, an unknown text
    /// encoding, ...).
    #[wasm_bindgen(constructor)]
    pub fn new(schema_json: &str) -> Result<WasmSchema, JsValue> {
        let root = bitlayout::serde::from_json(schema_json).map_err(convert::error_to_js)?;
        Ok(WasmSchema {
            schema: Schema::new(root),
        })
    }

    /// Decodes a payload (for example a `Uint8Array`) into a JS value.
    pub fn decode(&self, data: &[u8]) -> Result<JsValue, JsValue> {
        let value = self.schema.decode(data).map_err(convert::error_to_js)?;
        convert::value_to_js(value)
    }

    /// Encodes a JS value into bytes.
    pub fn encode(&self, obj: JsValue) -> Result<Vec<u8>, JsValue> {
        // Convert JS object into a generic Rust structure
        let raw: serde_json::Value =
            serde_wasm_bindgen::from_value(obj).map_err(convert::error_to_js)?;
        let value = convert::json_to_value(raw).map_err(|e| JsValue::from_str(&e))?;

        self.schema.encode(&value).map_err(convert::error_to_js)
    }

    /// The layout as a normalized JSON definition.
    #[wasm_bindgen(js_name = toJson)]
    pub fn to_json(&self) -> Result<String, JsValue> {
        bitlayout::serde::to_json(self.schema.root()).map_err(convert::error_to_js)
    }
}
