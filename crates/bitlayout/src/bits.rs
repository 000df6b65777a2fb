//! Bit cursor over byte buffers.
//!
//! Bits are addressed in MSB-first order: bit 0 is the high bit of the first
//! byte. A position is a byte index plus a bit offset in `0..8` into that
//! byte. Cursors only move forward.

use crate::errors::ReadError;

/// Widest window a single [BitReader::read_bits] call accepts. A window may
/// start up to 7 bits into a byte, so 57 bits still fit a `u64` accumulator.
pub const MAX_WINDOW_BITS: u32 = 57;

/// Keeps the low `width` bits of `value`.
pub fn mask(value: u64, width: u32) -> u64 {
    if width >= 64 {
        value
    } else {
        value & ((1u64 << width) - 1)
    }
}

/// Forward-only reader over an immutable byte buffer.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    byte_pos: usize,
    bit_pos: u8,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            byte_pos: 0,
            bit_pos: 0,
        }
    }

    /// Current `(byte index, bit offset)` position.
    pub fn position(&self) -> (usize, u8) {
        (self.byte_pos, self.bit_pos)
    }

    pub fn bit_offset(&self) -> u8 {
        self.bit_pos
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// Bits left between the cursor and the end of the buffer.
    pub fn remaining_bits(&self) -> u64 {
        (self.data.len() as u64 * 8).saturating_sub(self.byte_pos as u64 * 8 + self.bit_pos as u64)
    }

    fn ensure(&self, width: u64) -> Result<(), ReadError> {
        let available = self.remaining_bits();
        if width > available {
            return Err(ReadError::OutOfBounds {
                needed_bits: width,
                available_bits: available,
            });
        }

        Ok(())
    }

    fn advance(&mut self, width: u64) {
        let end = self.bit_pos as u64 + width;
        self.byte_pos += (end / 8) as usize;
        self.bit_pos = (end % 8) as u8;
    }

    /// Reads `width` bits as an unsigned big-endian number and advances past them.
    ///
    /// The window may straddle any number of byte boundaries. Nothing is
    /// consumed when the read fails.
    pub fn read_bits(&mut self, width: u32) -> Result<u64, ReadError> {
        if width > MAX_WINDOW_BITS {
            return Err(ReadError::TooManyBitsRead(width));
        }
        self.ensure(width as u64)?;

        let mut value = 0u64;
        let mut remaining = width;
        while remaining > 0 {
            let byte = self.data[self.byte_pos] as u64;
            let free = 8 - self.bit_pos as u32;
            let take = free.min(remaining);

            let chunk = mask(byte >> (free - take), take);
            value = (value << take) | chunk;

            self.advance(take as u64);
            remaining -= take;
        }

        Ok(value)
    }

    /// Reads `len` whole bytes. The caller is responsible for checking alignment.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ReadError> {
        debug_assert!(self.is_aligned());
        self.ensure(len as u64 * 8)?;

        let bytes = &self.data[self.byte_pos..self.byte_pos + len];
        self.byte_pos += len;

        Ok(bytes)
    }

    /// Advances by `width` bits without interpreting them.
    pub fn skip_bits(&mut self, width: u64) -> Result<(), ReadError> {
        self.ensure(width)?;
        self.advance(width);
        Ok(())
    }
}

/// Append-only writer that owns the output buffer.
///
/// When the cursor sits inside a byte, that byte is the last one in the
/// buffer and new bits are merged into its low unused bits before any new
/// byte is pushed.
#[derive(Debug, Clone, Default)]
pub struct BitWriter {
    out: Vec<u8>,
    bit_pos: u8,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bit_offset(&self) -> u8 {
        self.bit_pos
    }

    pub fn is_aligned(&self) -> bool {
        self.bit_pos == 0
    }

    /// Number of bytes touched so far, including a trailing partial byte.
    pub fn len(&self) -> usize {
        self.out.len()
    }

    pub fn is_empty(&self) -> bool {
        self.out.is_empty()
    }

    /// Writes the low `width` bits of `value`, MSB first. Higher bits are
    /// dropped, so an oversized value is clipped rather than rejected.
    pub fn write_bits(&mut self, width: u32, value: u64) {
        let value = mask(value, width);
        let mut remaining = width;

        while remaining > 0 {
            if self.bit_pos == 0 {
                self.out.push(0);
            }

            let free = 8 - self.bit_pos as u32;
            let take = free.min(remaining);
            let chunk = mask(value >> (remaining - take), take);

            let last = self.out.len() - 1;
            self.out[last] |= (chunk << (free - take)) as u8;

            self.bit_pos = ((self.bit_pos as u32 + take) % 8) as u8;
            remaining -= take;
        }
    }

    /// Writes `width` zero bits.
    pub fn write_zeros(&mut self, width: u64) {
        let mut remaining = width;
        while remaining > 0 {
            let take = remaining.min(32);
            self.write_bits(take as u32, 0);
            remaining -= take;
        }
    }

    /// Appends whole bytes. The caller is responsible for checking alignment.
    pub fn write_bytes(&mut self, bytes: &[u8]) {
        debug_assert!(self.is_aligned());
        self.out.extend_from_slice(bytes);
    }

    /// Hands back the encoded bytes. A trailing partial byte keeps zero low bits.
    pub fn finish(self) -> Vec<u8> {
        self.out
    }
}
