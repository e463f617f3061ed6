//! Hit-count stream serialization.
//!
//! The counts member stores every cover-item hit count in canonical
//! depth-first order, independent of the tree structure:
//!
//! ```text
//! +------+-------+------------------------------+
//! | mode | count | mode-dependent payload       |
//! +------+-------+------------------------------+
//! ```
//!
//! Mode 0 packs each count as a fixed 4-byte little-endian `u32`; mode 1
//! packs each as a LEB128 varint. The writer picks varint whenever a count
//! exceeds `u32::MAX` (fixed encoding cannot represent it) or the varint
//! payload is smaller, which it is whenever most counts are small.
//!
//! Decoding is lazy and single-pass: the scope-tree decoder pulls values in
//! lock-step, one per cover item, and the container checks afterward that
//! both streams ended together.

use crate::error::CodecError;
use crate::varint;

/// Fixed 4-byte little-endian counts.
pub const MODE_FIXED32: u8 = 0;
/// LEB128 varint counts.
pub const MODE_VARINT: u8 = 1;

/// Serializes `counts` with the smaller of the two encodings.
pub fn serialize(counts: &[u64]) -> Vec<u8> {
    let payload = varint::encode_all(counts);
    let oversized = counts.iter().any(|&c| c > u64::from(u32::MAX));
    let mode = if oversized || payload.len() < counts.len() * 4 {
        MODE_VARINT
    } else {
        MODE_FIXED32
    };

    let mut buf = Vec::with_capacity(2 + payload.len().max(counts.len() * 4));
    buf.push(mode);
    varint::write(counts.len() as u64, &mut buf);
    match mode {
        MODE_VARINT => buf.extend_from_slice(&payload),
        _ => {
            for &count in counts {
                buf.extend_from_slice(&(count as u32).to_le_bytes());
            }
        }
    }
    buf
}

/// Lazy single-pass reader over a serialized count stream.
pub struct CountsReader<'a> {
    data: &'a [u8],
    offset: usize,
    mode: u8,
    remaining: u64,
    consumed: u64,
}

impl<'a> CountsReader<'a> {
    /// Parses the header. An empty buffer yields an empty stream.
    pub fn parse(data: &'a [u8]) -> Result<Self, CodecError> {
        if data.is_empty() {
            return Ok(Self {
                data,
                offset: 0,
                mode: MODE_VARINT,
                remaining: 0,
                consumed: 0,
            });
        }
        let mode = data[0];
        if mode != MODE_FIXED32 && mode != MODE_VARINT {
            return Err(CodecError::UnknownCountsMode(mode));
        }
        let (remaining, offset) = varint::read(data, 1)?;
        Ok(Self {
            data,
            offset,
            mode,
            remaining,
            consumed: 0,
        })
    }

    /// Decodes the next count. Pulling past the declared count is a
    /// desynchronization error.
    pub fn next(&mut self) -> Result<u64, CodecError> {
        if self.remaining == 0 {
            return Err(CodecError::CountsExhausted {
                consumed: self.consumed,
            });
        }
        let value = match self.mode {
            MODE_VARINT => {
                let (value, next) = varint::read(self.data, self.offset)?;
                self.offset = next;
                value
            }
            _ => {
                let end = self.offset + 4;
                let bytes = self
                    .data
                    .get(self.offset..end)
                    .ok_or(CodecError::EndOfBuffer(self.data.len()))?;
                self.offset = end;
                u64::from(u32::from_le_bytes(bytes.try_into().unwrap()))
            }
        };
        self.remaining -= 1;
        self.consumed += 1;
        Ok(value)
    }

    /// Values left in the stream; nonzero after a full tree decode means the
    /// tree and counts members disagree.
    pub fn remaining(&self) -> u64 {
        self.remaining
    }
}
