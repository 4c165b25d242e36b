//! Binary encoding primitives and wire constants for the module format.
//!
//! All emitters write directly into a caller-provided `&mut Vec<u8>` buffer,
//! avoiding intermediate allocations.

use byteorder::{LittleEndian, WriteBytesExt};

// ---------------------------------------------------------------------------
// Preamble
// ---------------------------------------------------------------------------

/// `\0asm`, read as a little-endian u32.
pub const MAGIC: u32 = 0x6d73_6100;
pub const VERSION: u32 = 0x0000_0001;

// ---------------------------------------------------------------------------
// Section ids
// ---------------------------------------------------------------------------

pub const SECTION_CUSTOM: u8 = 0;
pub const SECTION_TYPE: u8 = 1;
pub const SECTION_IMPORT: u8 = 2;
pub const SECTION_FUNCTION: u8 = 3;
pub const SECTION_TABLE: u8 = 4;
pub const SECTION_MEMORY: u8 = 5;
pub const SECTION_GLOBAL: u8 = 6;
pub const SECTION_EXPORT: u8 = 7;
pub const SECTION_START: u8 = 8;
pub const SECTION_ELEMENT: u8 = 9;
pub const SECTION_CODE: u8 = 10;
pub const SECTION_DATA: u8 = 11;
pub const SECTION_DATA_COUNT: u8 = 12;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

pub const TYPE_FUNC: u8 = 0x60;

pub const VALTYPE_I32: u8 = 0x7f;
pub const VALTYPE_I64: u8 = 0x7e;
pub const VALTYPE_F32: u8 = 0x7d;
pub const VALTYPE_F64: u8 = 0x7c;
pub const REFTYPE_FUNCREF: u8 = 0x70;
pub const REFTYPE_EXTERNREF: u8 = 0x6f;

// Export descriptor kinds
pub const DESC_FUNC: u8 = 0x00;
pub const DESC_TABLE: u8 = 0x01;
pub const DESC_MEMORY: u8 = 0x02;
pub const DESC_GLOBAL: u8 = 0x03;

// Limit flags
pub const LIMIT_MIN: u8 = 0x00;
pub const LIMIT_MIN_MAX: u8 = 0x01;

// ---------------------------------------------------------------------------
// Opcodes
// ---------------------------------------------------------------------------

pub const OP_UNREACHABLE: u8 = 0x00;
pub const OP_NOP: u8 = 0x01;
pub const OP_END: u8 = 0x0b;
pub const OP_DROP: u8 = 0x1a;
pub const OP_LOCAL_GET: u8 = 0x20;
pub const OP_LOCAL_SET: u8 = 0x21;
pub const OP_LOCAL_TEE: u8 = 0x22;
pub const OP_I32_CONST: u8 = 0x41;
pub const OP_I32_ADD: u8 = 0x6a;
pub const OP_I32_SUB: u8 = 0x6b;
pub const OP_I32_MUL: u8 = 0x6c;

// ---------------------------------------------------------------------------
// Unsigned LEB128
// ---------------------------------------------------------------------------

/// Appends the minimal unsigned LEB128 encoding of `value` to `buf`.
pub fn write_uleb128(buf: &mut Vec<u8>, mut value: u32) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            buf.push(byte);
            break;
        }
        byte |= 0x80;
        buf.push(byte);
    }
}

// ---------------------------------------------------------------------------
// Signed LEB128
// ---------------------------------------------------------------------------

/// Appends the minimal signed LEB128 encoding of `value` to `buf`.
pub fn write_sleb128_i32(buf: &mut Vec<u8>, mut value: i32) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if (value == 0 && (byte & 0x40) == 0) || (value == -1 && (byte & 0x40) != 0) {
            buf.push(byte);
            break;
        }
        byte |= 0x80;
        buf.push(byte);
    }
}

// ---------------------------------------------------------------------------
// Fixed width
// ---------------------------------------------------------------------------

/// Appends `value` as four little-endian bytes.
pub fn write_u32_le(buf: &mut Vec<u8>, value: u32) {
    // writing into a Vec cannot fail
    let _ = buf.write_u32::<LittleEndian>(value);
}

/// Appends a length-prefixed UTF-8 name.
pub fn write_name(buf: &mut Vec<u8>, name: &str) {
    write_uleb128(buf, name.len() as u32);
    buf.extend_from_slice(name.as_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_uleb128() {
        let emit = |v: u32| {
            let mut buf = Vec::new();
            write_uleb128(&mut buf, v);
            buf
        };

        assert_eq!(emit(0), vec![0]);
        assert_eq!(emit(1), vec![1]);
        assert_eq!(emit(127), vec![0x7f]);
        assert_eq!(emit(0xff), vec![0xff, 0x01]);
        assert_eq!(emit(0x1ff), vec![0xff, 0x03]);
        assert_eq!(emit(624485), vec![0b11100101, 0b10001110, 0b00100110]);
        assert_eq!(emit(0xffffffff), vec![0xff, 0xff, 0xff, 0xff, 0xf]);
    }

    #[test]
    fn test_write_sleb128_i32() {
        let emit = |v: i32| {
            let mut buf = Vec::new();
            write_sleb128_i32(&mut buf, v);
            buf
        };

        assert_eq!(emit(0), vec![0]);
        assert_eq!(emit(1), vec![1]);
        assert_eq!(emit(-1), vec![0x7f]);
        assert_eq!(emit(-128), vec![0x80, 0x7f]);
        assert_eq!(emit(63), vec![0x3f]);
        assert_eq!(emit(64), vec![0xc0, 0x00]);
        assert_eq!(emit(i32::MIN), vec![128, 128, 128, 128, 120]);
    }

    #[test]
    fn test_write_u32_le() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, MAGIC);
        assert_eq!(buf, b"\0asm");
    }
}
