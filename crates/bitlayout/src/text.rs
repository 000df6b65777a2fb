//! Named character encodings for text fields, backed by `encoding_rs`.
//!
//! Labels follow the WHATWG Encoding Standard (`"utf-8"`, `"utf-16le"`,
//! `"shift_jis"`, `"latin1"`, ...). Decoding never substitutes replacement
//! characters: malformed input is an error, as is text the target encoding
//! cannot represent.

use std::fmt;

use encoding_rs::{Encoding, UTF_16BE, UTF_16LE, UTF_8};

use crate::errors::{ErrorKind, SchemaError};

/// A resolved text encoding.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct TextEncoding(&'static Encoding);

impl TextEncoding {
    pub fn utf_8() -> Self {
        TextEncoding(UTF_8)
    }

    /// Resolves an encoding label, case-insensitively.
    pub fn for_label(label: &str) -> Result<Self, SchemaError> {
        Encoding::for_label(label.trim().as_bytes())
            .map(TextEncoding)
            .ok_or_else(|| SchemaError::UnknownEncoding(label.to_string()))
    }

    /// Canonical name of the encoding, e.g. `"UTF-8"`.
    pub fn name(&self) -> &'static str {
        self.0.name()
    }

    fn invalid(&self) -> ErrorKind {
        ErrorKind::InvalidText {
            encoding: self.name(),
        }
    }

    /// Converts raw bytes to text. No BOM sniffing is done.
    pub fn decode(&self, bytes: &[u8]) -> Result<String, ErrorKind> {
        self.0
            .decode_without_bom_handling_and_without_replacement(bytes)
            .map(|text| text.into_owned())
            .ok_or_else(|| self.invalid())
    }

    /// Converts text to bytes in this encoding.
    pub fn encode(&self, text: &str) -> Result<Vec<u8>, ErrorKind> {
        // The WHATWG encoder only targets ASCII-compatible encodings.
        if self.0 == UTF_16LE {
            return Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect());
        }
        if self.0 == UTF_16BE {
            return Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect());
        }

        let (bytes, used, had_errors) = self.0.encode(text);
        if had_errors || used != self.0 {
            return Err(self.invalid());
        }

        Ok(bytes.into_owned())
    }
}

impl Default for TextEncoding {
    fn default() -> Self {
        Self::utf_8()
    }
}

impl fmt::Debug for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("TextEncoding").field(&self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THINKING: [u8; 11] = [240, 159, 164, 148, 32, 104, 109, 109, 109, 109, 109];

    #[test]
    fn test_utf8_decode() {
        let encoding = TextEncoding::for_label("utf-8").unwrap();
        assert_eq!(encoding.decode(&THINKING).unwrap(), "🤔 hmmmmm");
    }

    #[test]
    fn test_utf8_encode() {
        let encoding = TextEncoding::default();
        assert_eq!(encoding.encode("🤔 hmmmmm").unwrap(), THINKING.to_vec());
    }

    #[test]
    fn test_utf8_decode_failure() {
        let encoding = TextEncoding::utf_8();
        assert_eq!(
            encoding.decode(&[0x48, 0xFF]).unwrap_err(),
            ErrorKind::InvalidText { encoding: "UTF-8" }
        );
    }

    #[test]
    fn test_label_is_case_insensitive() {
        assert_eq!(
            TextEncoding::for_label(" UTF8 ").unwrap(),
            TextEncoding::utf_8()
        );
    }

    #[test]
    fn test_unknown_label() {
        assert_eq!(
            TextEncoding::for_label("klingon").unwrap_err(),
            SchemaError::UnknownEncoding("klingon".to_string())
        );
    }

    #[test]
    fn test_utf16() {
        let le = TextEncoding::for_label("utf-16le").unwrap();
        let be = TextEncoding::for_label("utf-16be").unwrap();

        assert_eq!(le.encode("Hi").unwrap(), vec![0x48, 0, 0x69, 0]);
        assert_eq!(be.encode("Hi").unwrap(), vec![0, 0x48, 0, 0x69]);
        assert_eq!(le.decode(&[0x48, 0, 0x69, 0]).unwrap(), "Hi");
    }

    #[test]
    fn test_single_byte_encoding() {
        let latin1 = TextEncoding::for_label("latin1").unwrap();

        assert_eq!(latin1.encode("café").unwrap(), vec![0x63, 0x61, 0x66, 0xE9]);
        assert_eq!(latin1.decode(&[0x63, 0x61, 0x66, 0xE9]).unwrap(), "café");
        assert!(latin1.encode("🤔").is_err());
    }

    #[test]
    fn test_shift_jis() {
        let sjis = TextEncoding::for_label("shift_jis").unwrap();
        let bytes = sjis.encode("テスト").unwrap();

        assert_eq!(bytes, vec![0x83, 0x65, 0x83, 0x58, 0x83, 0x67]);
        assert_eq!(sjis.decode(&bytes).unwrap(), "テスト");
    }
}
