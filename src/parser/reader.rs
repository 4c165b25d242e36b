//! Byte-at-a-time reader for the module format.
//!
//! Every read pulls exactly the bytes it needs from the underlying source so
//! that section and function boundaries are never overrun. The LEB128 codec
//! is exposed as free functions over a byte closure so the interpreter can
//! decode instruction immediates straight out of cached bytecode.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read};

use super::encoding::TYPE_FUNC;
use super::module::{Limit, SectionKind};
use super::DecodeError;

pub struct Reader<R> {
    inner: R,
    pos: usize,
}

impl<R: Read> Reader<R> {
    pub fn new(inner: R) -> Reader<R> {
        Reader { inner, pos: 0 }
    }

    // Basic operations --------------------------------------------------------

    /// Number of bytes consumed so far.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Reads one byte, returning `None` if the source is cleanly exhausted.
    pub fn try_read_byte(&mut self) -> Result<Option<u8>, DecodeError> {
        match self.inner.read_u8() {
            Ok(byte) => {
                self.pos += 1;
                Ok(Some(byte))
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(DecodeError::Io {
                offset: self.pos,
                source: e,
            }),
        }
    }

    pub fn read_byte(&mut self) -> Result<u8, DecodeError> {
        self.try_read_byte()?
            .ok_or(DecodeError::TruncatedInput { offset: self.pos })
    }

    /// Reads exactly `len` bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, DecodeError> {
        let mut bytes = Vec::new();
        let read = (&mut self.inner)
            .take(len as u64)
            .read_to_end(&mut bytes)
            .map_err(|e| DecodeError::Io {
                offset: self.pos,
                source: e,
            })?;
        self.pos += read;
        if read < len {
            return Err(DecodeError::TruncatedInput { offset: self.pos });
        }
        Ok(bytes)
    }

    /// Consumes everything left in the source.
    pub fn read_to_end(&mut self) -> Result<Vec<u8>, DecodeError> {
        let mut bytes = Vec::new();
        let read = self
            .inner
            .read_to_end(&mut bytes)
            .map_err(|e| DecodeError::Io {
                offset: self.pos,
                source: e,
            })?;
        self.pos += read;
        Ok(bytes)
    }

    // Read and interpret types ------------------------------------------------

    // le
    pub fn read_u32(&mut self) -> Result<u32, DecodeError> {
        match self.inner.read_u32::<LittleEndian>() {
            Ok(value) => {
                self.pos += 4;
                Ok(value)
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                Err(DecodeError::TruncatedInput { offset: self.pos })
            }
            Err(e) => Err(DecodeError::Io {
                offset: self.pos,
                source: e,
            }),
        }
    }

    pub fn read_uleb128(&mut self) -> Result<u32, DecodeError> {
        read_uleb128(&mut || self.read_byte())
    }

    /// Alias of the integer codec for "N elements follow".
    pub fn read_vector_length(&mut self) -> Result<u32, DecodeError> {
        self.read_uleb128()
    }

    pub fn read_name(&mut self) -> Result<String, DecodeError> {
        let start = self.pos;
        let len = self.read_vector_length()?;
        let bytes = self.read_bytes(len as usize)?;
        String::from_utf8(bytes).map_err(|_| DecodeError::InvalidName { offset: start })
    }

    /// Reads a flag byte, then `min`, then `max` if the flag is nonzero.
    pub fn read_limit(&mut self) -> Result<Limit, DecodeError> {
        let flag = self.read_byte()?;
        let min = self.read_uleb128()?;
        let max = if flag != 0 {
            Some(self.read_uleb128()?)
        } else {
            None
        };
        Ok(Limit { min, max })
    }

    /// Consumes the 0x60 delimiter that leads every function type.
    pub fn expect_function_type_delimiter(&mut self) -> Result<(), DecodeError> {
        let offset = self.pos;
        let byte = self.read_byte()?;
        if byte != TYPE_FUNC {
            return Err(DecodeError::InvalidSection {
                section: SectionKind::Type,
                offset,
                reason: format!("expected 0x60 to lead function type, got 0x{byte:02x}"),
            });
        }
        Ok(())
    }
}

/// Decodes an unsigned LEB128 value into a u32.
///
/// There is no bound on the number of bytes consumed: bits shifted past the
/// 32-bit accumulator are silently dropped.
pub fn read_uleb128<F>(next: &mut F) -> Result<u32, DecodeError>
where
    F: FnMut() -> Result<u8, DecodeError>,
{
    let mut result: u32 = 0;
    let mut shift: u32 = 0;

    loop {
        let b = next()?;
        result |= u32::from(b & 0x7f).checked_shl(shift).unwrap_or(0);
        shift = shift.saturating_add(7);
        if (b & 0x80) == 0 {
            break;
        }
    }

    Ok(result)
}

/// Decodes a signed LEB128 value into an i32, sign-extending from the last
/// byte's bit 6.
pub fn read_sleb128_i32<F>(next: &mut F) -> Result<i32, DecodeError>
where
    F: FnMut() -> Result<u8, DecodeError>,
{
    let mut result: i32 = 0;
    let mut shift: u32 = 0;

    loop {
        let b = next()?;
        result |= i32::from(b & 0x7f).checked_shl(shift).unwrap_or(0);
        shift = shift.saturating_add(7);
        if (b & 0x80) == 0 {
            if shift < 32 && (b & 0x40) != 0 {
                result |= -1i32 << shift;
            }
            break;
        }
    }

    Ok(result)
}
