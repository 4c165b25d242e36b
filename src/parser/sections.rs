//! Per-kind section decoders.
//!
//! Each decoder consumes an already delimited content slice. Offsets in the
//! errors they return are relative to the start of that slice.

use tracing::warn;

use super::encoding::*;
use super::limits::{self, preallocation};
use super::module::*;
use super::reader::Reader;
use super::DecodeError;

type SliceReader<'a> = Reader<&'a [u8]>;

/// Decodes the content of one section frame according to its id.
pub fn read_section(id: u8, content: &[u8]) -> Result<Section, DecodeError> {
    let mut reader = Reader::new(content);
    let section = match id {
        SECTION_CUSTOM => Section::Custom(read_custom_section(&mut reader, content)?),
        SECTION_TYPE => Section::Type(read_type_section(&mut reader)?),
        SECTION_FUNCTION => Section::Function(read_function_section(&mut reader)?),
        SECTION_TABLE => Section::Table(read_table_section(&mut reader)?),
        SECTION_MEMORY => Section::Memory(read_memory_section(&mut reader)?),
        SECTION_EXPORT => Section::Export(read_export_section(&mut reader)?),
        SECTION_CODE => Section::Code(read_code_section(&mut reader)?),
        _ => Section::Unknown(UnknownSection {
            id,
            payload: reader.read_to_end()?,
        }),
    };

    if reader.pos() < content.len() {
        warn!(
            id,
            kind = %section.kind(),
            trailing = content.len() - reader.pos(),
            "section has unconsumed trailing bytes"
        );
    }

    Ok(section)
}

/// Reads a vector count and rejects it if it exceeds `max`.
fn read_count(
    reader: &mut SliceReader,
    section: SectionKind,
    what: &str,
    max: u32,
) -> Result<u32, DecodeError> {
    let offset = reader.pos();
    let count = reader.read_vector_length()?;
    if count > max {
        return Err(DecodeError::invalid_section(
            section,
            offset,
            format!("{count} {what} exceeds limit of {max}"),
        ));
    }
    Ok(count)
}

fn remaining(reader: &SliceReader, len: usize) -> usize {
    len.saturating_sub(reader.pos())
}

fn read_value_type(reader: &mut SliceReader, section: SectionKind) -> Result<ValueType, DecodeError> {
    let offset = reader.pos();
    let byte = reader.read_byte()?;
    ValueType::decode(byte).ok_or_else(|| {
        DecodeError::invalid_section(section, offset, format!("unknown value type 0x{byte:02x}"))
    })
}

fn read_result_type(
    reader: &mut SliceReader,
    len: usize,
    max: u32,
) -> Result<Vec<ValueType>, DecodeError> {
    let count = read_count(reader, SectionKind::Type, "value types", max)?;
    let mut types = Vec::with_capacity(preallocation(count, remaining(reader, len)));
    for _ in 0..count {
        types.push(read_value_type(reader, SectionKind::Type)?);
    }
    Ok(types)
}

fn read_custom_section(reader: &mut SliceReader, content: &[u8]) -> Result<CustomSection, DecodeError> {
    let name = reader.read_name()?;
    // the payload keeps the name prefix so the section re-encodes verbatim
    reader.read_to_end()?;
    Ok(CustomSection {
        name,
        payload: content.to_vec(),
    })
}

fn read_type_section(reader: &mut SliceReader) -> Result<TypeSection, DecodeError> {
    let len = reader_len(reader);
    let count = read_count(reader, SectionKind::Type, "types", limits::MAX_TYPES)?;
    let mut types = Vec::with_capacity(preallocation(count, remaining(reader, len)));
    for _ in 0..count {
        reader.expect_function_type_delimiter()?;
        let parameters = read_result_type(reader, len, limits::MAX_FUNCTION_PARAMS)?;
        let results = read_result_type(reader, len, limits::MAX_FUNCTION_RETURNS)?;
        types.push(FunctionType {
            parameters,
            results,
        });
    }
    Ok(TypeSection { types })
}

fn read_function_section(reader: &mut SliceReader) -> Result<FunctionSection, DecodeError> {
    let len = reader_len(reader);
    let count = read_count(reader, SectionKind::Function, "functions", limits::MAX_FUNCTIONS)?;
    let mut type_indices = Vec::with_capacity(preallocation(count, remaining(reader, len)));
    for _ in 0..count {
        type_indices.push(reader.read_uleb128()?);
    }
    Ok(FunctionSection { type_indices })
}

fn read_table_section(reader: &mut SliceReader) -> Result<TableSection, DecodeError> {
    let len = reader_len(reader);
    let count = read_count(reader, SectionKind::Table, "tables", limits::MAX_TABLES)?;
    let mut tables = Vec::with_capacity(preallocation(count, remaining(reader, len)));
    for _ in 0..count {
        let offset = reader.pos();
        let byte = reader.read_byte()?;
        let ref_type = RefType::decode(byte).ok_or_else(|| {
            DecodeError::invalid_section(
                SectionKind::Table,
                offset,
                format!("unknown reference type 0x{byte:02x}"),
            )
        })?;
        let limit = reader.read_limit()?;
        tables.push(Table { ref_type, limit });
    }
    Ok(TableSection { tables })
}

fn read_memory_section(reader: &mut SliceReader) -> Result<MemorySection, DecodeError> {
    let offset = reader.pos();
    let count = reader.read_vector_length()?;
    if count > limits::MAX_MEMORIES {
        return Err(DecodeError::invalid_section(
            SectionKind::Memory,
            offset,
            format!("{count} memories declared, at most one is allowed"),
        ));
    }
    let mut memory = Vec::with_capacity(count as usize);
    for _ in 0..count {
        memory.push(Memory {
            limit: reader.read_limit()?,
        });
    }
    Ok(MemorySection { memory })
}

fn read_export_section(reader: &mut SliceReader) -> Result<ExportSection, DecodeError> {
    let len = reader_len(reader);
    let count = read_count(reader, SectionKind::Export, "exports", limits::MAX_EXPORTS)?;
    let mut exports = Vec::with_capacity(preallocation(count, remaining(reader, len)));
    for _ in 0..count {
        let name = reader.read_name()?;
        let offset = reader.pos();
        let byte = reader.read_byte()?;
        let kind = ExportKind::decode(byte).ok_or_else(|| {
            DecodeError::invalid_section(
                SectionKind::Export,
                offset,
                format!("unknown export kind 0x{byte:02x}"),
            )
        })?;
        let index = reader.read_uleb128()?;
        exports.push(Export { name, kind, index });
    }
    Ok(ExportSection { exports })
}

fn read_code_section(reader: &mut SliceReader) -> Result<CodeSection, DecodeError> {
    let len = reader_len(reader);
    let count = read_count(reader, SectionKind::Code, "function bodies", limits::MAX_FUNCTIONS)?;
    let mut functions = Vec::with_capacity(preallocation(count, remaining(reader, len)));
    for _ in 0..count {
        let offset = reader.pos();
        let size = reader.read_uleb128()?;
        if size > limits::MAX_FUNCTION_SIZE {
            return Err(DecodeError::invalid_section(
                SectionKind::Code,
                offset,
                format!("function body of {size} bytes exceeds limit"),
            ));
        }
        let start = reader.pos();
        let entry = reader.read_bytes(size as usize)?;
        // the body's own size prefix bounds its locals and instructions
        functions.push(read_function(&entry).map_err(|e| e.rebase(start))?);
    }
    Ok(CodeSection { functions })
}

fn read_function(entry: &[u8]) -> Result<Function, DecodeError> {
    let mut reader = Reader::new(entry);
    let declarations = reader.read_vector_length()?;
    let mut locals = Vec::new();
    let mut total: u64 = 0;

    for _ in 0..declarations {
        let offset = reader.pos();
        let n = reader.read_uleb128()?;
        total += u64::from(n);
        if total > u64::from(limits::MAX_FUNCTION_LOCALS) {
            return Err(DecodeError::invalid_section(
                SectionKind::Code,
                offset,
                format!("too many locals, limit is {}", limits::MAX_FUNCTION_LOCALS),
            ));
        }
        let value_type = read_value_type(&mut reader, SectionKind::Code)?;
        locals.extend(std::iter::repeat(value_type).take(n as usize));
    }

    let body = reader.read_to_end()?;
    Ok(Function { locals, body })
}

/// Total length of the slice behind a fresh reader.
fn reader_len(reader: &SliceReader) -> usize {
    reader.pos() + reader.get_ref().len()
}
