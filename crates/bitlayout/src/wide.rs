//! Arbitrary-precision unsigned integers for fields wider than a native word.
//!
//! The arithmetic itself is `num-bigint`'s; this module only adapts it to
//! fixed-width big-endian bit windows.

use num_bigint::BigUint;

use crate::bits::{BitReader, BitWriter};
use crate::errors::ReadError;

/// Keeps the low `width` bits of `value`.
pub fn mask(value: &BigUint, width: u64) -> BigUint {
    if value.bits() <= width {
        return value.clone();
    }

    let limit = BigUint::from(1u8) << width;
    value % limit
}

/// Parses a string of binary digits, e.g. `"1010"`.
pub fn from_binary_str(digits: &str) -> Option<BigUint> {
    BigUint::parse_bytes(digits.as_bytes(), 2)
}

/// Parses a non-empty string of decimal digits, e.g. `"340282366920938463463374607431768211455"`.
pub fn from_decimal_str(digits: &str) -> Option<BigUint> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    BigUint::parse_bytes(digits.as_bytes(), 10)
}

/// Renders the low `width` bits of `value` as exactly `ceil(width / 8)`
/// big-endian bytes, right-aligned so the first byte carries the
/// `width % 8` leading bits when the width is not a whole number of bytes.
pub fn to_be_window(value: &BigUint, width: u64) -> Vec<u8> {
    let len = width.div_ceil(8) as usize;
    let bytes = mask(value, width).to_bytes_be();

    let mut window = vec![0u8; len];
    if !(bytes.len() == 1 && bytes[0] == 0) {
        window[len - bytes.len()..].copy_from_slice(&bytes);
    }

    window
}

/// Builds a value from a right-aligned big-endian window of `width` bits.
pub fn from_be_window(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Narrows to `u64` when the value fits.
pub fn to_u64(value: &BigUint) -> Option<u64> {
    u64::try_from(value).ok()
}

/// Number of leading bits carried by the first byte of a `width`-bit window.
fn lead_bits(width: u64) -> u32 {
    match width % 8 {
        0 => 8,
        rem => rem as u32,
    }
}

/// Reads a `width`-bit unsigned value of any size.
pub fn read(reader: &mut BitReader<'_>, width: u64) -> Result<BigUint, ReadError> {
    if width == 0 {
        return Ok(BigUint::ZERO);
    }
    if width > reader.remaining_bits() {
        return Err(ReadError::OutOfBounds {
            needed_bits: width,
            available_bits: reader.remaining_bits(),
        });
    }

    let len = width.div_ceil(8) as usize;
    let mut window = Vec::with_capacity(len);
    window.push(reader.read_bits(lead_bits(width))? as u8);
    for _ in 1..len {
        window.push(reader.read_bits(8)? as u8);
    }

    Ok(from_be_window(&window))
}

/// Writes the low `width` bits of `value`, clipping anything above.
///
/// Only the value's significant bits go through a byte window; the leading
/// zeros of a large field are written directly.
pub fn write(writer: &mut BitWriter, width: u64, value: &BigUint) {
    let value = mask(value, width);
    let significant = value.bits();
    writer.write_zeros(width - significant);

    if significant == 0 {
        return;
    }
    for (i, byte) in to_be_window(&value, significant).into_iter().enumerate() {
        let take = if i == 0 { lead_bits(significant) } else { 8 };
        writer.write_bits(take, byte as u64);
    }
}
