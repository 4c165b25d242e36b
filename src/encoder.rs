//! Encodes a [`Module`] back to its binary form.
//!
//! This is the inverse of [`crate::parser::decode`]. Sections are emitted in
//! the module's encounter order, repeats included, so a decoded module
//! re-encodes to the same section sequence. Each section is framed as:
//!
//! ```text
//! section_id: u8 | byte_length: vu32 | contents: byte*
//! ```
//!
//! All integers use minimal LEB128.
//!
//! # Example
//!
//! ```
//! use wasmstack::encoder;
//! use wasmstack::parser::module::Module;
//!
//! let bytes = encoder::encode(&Module::new("empty"));
//! assert_eq!(&bytes[0..4], b"\0asm");
//! ```

use crate::parser::encoding::{write_name, write_u32_le, write_uleb128, LIMIT_MIN, LIMIT_MIN_MAX, MAGIC, TYPE_FUNC, VERSION};
use crate::parser::module::*;

// ===========================================================================
// Public API
// ===========================================================================

pub fn encode(module: &Module) -> Vec<u8> {
    let mut buf = Vec::new();
    write_u32_le(&mut buf, MAGIC);
    write_u32_le(&mut buf, VERSION);

    for section in module.sections() {
        let mut contents = Vec::new();
        encode_section(&mut contents, section);
        emit_section(&mut buf, section.id(), &contents);
    }

    buf
}

fn encode_section(contents: &mut Vec<u8>, section: &Section) {
    match section {
        // the payload still carries the name prefix
        Section::Custom(s) => contents.extend_from_slice(&s.payload),
        Section::Type(s) => encode_type_section(contents, s),
        Section::Function(s) => encode_function_section(contents, s),
        Section::Table(s) => encode_table_section(contents, s),
        Section::Memory(s) => encode_memory_section(contents, s),
        Section::Export(s) => encode_export_section(contents, s),
        Section::Code(s) => encode_code_section(contents, s),
        Section::Unknown(s) => contents.extend_from_slice(&s.payload),
    }
}

// ===========================================================================
// Section encoders
// ===========================================================================

/// ```text
/// typesec  ::= vec(functype)
/// functype ::= 0x60 vec(valtype) vec(valtype)
/// ```
fn encode_type_section(contents: &mut Vec<u8>, section: &TypeSection) {
    write_uleb128(contents, section.types.len() as u32);
    for ft in &section.types {
        contents.push(TYPE_FUNC);
        emit_value_types(contents, &ft.parameters);
        emit_value_types(contents, &ft.results);
    }
}

fn encode_function_section(contents: &mut Vec<u8>, section: &FunctionSection) {
    write_uleb128(contents, section.type_indices.len() as u32);
    for &index in &section.type_indices {
        write_uleb128(contents, index);
    }
}

fn encode_table_section(contents: &mut Vec<u8>, section: &TableSection) {
    write_uleb128(contents, section.tables.len() as u32);
    for table in &section.tables {
        contents.push(table.ref_type.byte());
        emit_limit(contents, &table.limit);
    }
}

fn encode_memory_section(contents: &mut Vec<u8>, section: &MemorySection) {
    write_uleb128(contents, section.memory.len() as u32);
    for memory in &section.memory {
        emit_limit(contents, &memory.limit);
    }
}

fn encode_export_section(contents: &mut Vec<u8>, section: &ExportSection) {
    write_uleb128(contents, section.exports.len() as u32);
    for export in &section.exports {
        write_name(contents, &export.name);
        contents.push(export.kind.byte());
        write_uleb128(contents, export.index);
    }
}

/// ```text
/// codesec ::= vec(code)
/// code    ::= size:u32 func
/// func    ::= vec(locals) byte*
/// locals  ::= n:u32 t:valtype
/// ```
fn encode_code_section(contents: &mut Vec<u8>, section: &CodeSection) {
    write_uleb128(contents, section.functions.len() as u32);
    for function in &section.functions {
        let mut func_buf = Vec::new();

        let runs = compress_locals(&function.locals);
        write_uleb128(&mut func_buf, runs.len() as u32);
        for (count, vt) in runs {
            write_uleb128(&mut func_buf, count);
            func_buf.push(vt.byte());
        }
        func_buf.extend_from_slice(&function.body);

        // length-prefixed function body
        write_uleb128(contents, func_buf.len() as u32);
        contents.extend(func_buf);
    }
}

/// Collapses expanded locals back into (count, type) runs.
fn compress_locals(locals: &[ValueType]) -> Vec<(u32, ValueType)> {
    let mut runs: Vec<(u32, ValueType)> = Vec::new();
    for &vt in locals {
        match runs.last_mut() {
            Some((count, last)) if *last == vt => *count += 1,
            _ => runs.push((1, vt)),
        }
    }
    runs
}

// ===========================================================================
// Shared helpers
// ===========================================================================

/// Wraps section contents with a section ID and length prefix.
fn emit_section(buf: &mut Vec<u8>, id: u8, contents: &[u8]) {
    buf.push(id);
    write_uleb128(buf, contents.len() as u32);
    buf.extend_from_slice(contents);
}

fn emit_value_types(buf: &mut Vec<u8>, types: &[ValueType]) {
    write_uleb128(buf, types.len() as u32);
    buf.extend(types.iter().map(ValueType::byte));
}

/// ```text
/// limits ::= 0x00 min:u32 | 0x01 min:u32 max:u32
/// ```
fn emit_limit(buf: &mut Vec<u8>, limit: &Limit) {
    match limit.max {
        Some(max) => {
            buf.push(LIMIT_MIN_MAX);
            write_uleb128(buf, limit.min);
            write_uleb128(buf, max);
        }
        None => {
            buf.push(LIMIT_MIN);
            write_uleb128(buf, limit.min);
        }
    }
}
