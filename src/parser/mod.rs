pub mod encoding;
pub mod limits;
pub mod module;
pub mod reader;
pub mod sections;
pub mod validate;

use std::io::{self, Read};

use thiserror::Error;
use tracing::debug;

use encoding::{MAGIC, VERSION};
use module::{Module, SectionKind, SectionPosition};
use reader::Reader;

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("invalid module: {reason}")]
    InvalidModule { reason: String },

    #[error("invalid {section} section at offset 0x{offset:x}: {reason}")]
    InvalidSection {
        section: SectionKind,
        offset: usize,
        reason: String,
    },

    #[error("unexpected end of input at offset 0x{offset:x}")]
    TruncatedInput { offset: usize },

    #[error("malformed UTF-8 name at offset 0x{offset:x}")]
    InvalidName { offset: usize },

    #[error("read failed at offset 0x{offset:x}: {source}")]
    Io { offset: usize, source: io::Error },
}

impl DecodeError {
    pub fn invalid_section(section: SectionKind, offset: usize, reason: impl Into<String>) -> Self {
        DecodeError::InvalidSection {
            section,
            offset,
            reason: reason.into(),
        }
    }

    /// Shifts a slice-relative offset onto an absolute stream position.
    pub fn rebase(self, base: usize) -> Self {
        match self {
            DecodeError::InvalidSection {
                section,
                offset,
                reason,
            } => DecodeError::InvalidSection {
                section,
                offset: offset + base,
                reason,
            },
            DecodeError::TruncatedInput { offset } => DecodeError::TruncatedInput {
                offset: offset + base,
            },
            DecodeError::InvalidName { offset } => DecodeError::InvalidName {
                offset: offset + base,
            },
            DecodeError::Io { offset, source } => DecodeError::Io {
                offset: offset + base,
                source,
            },
            e @ DecodeError::InvalidModule { .. } => e,
        }
    }
}

/// Decodes a module from a byte source.
pub fn decode<R: Read>(source: R) -> Result<Module, DecodeError> {
    decode_named("module", source)
}

/// Decodes a module, tagging it with `name` for diagnostics.
pub fn decode_named<R: Read>(name: &str, source: R) -> Result<Module, DecodeError> {
    let mut reader = Reader::new(source);
    let mut module = Module::new(name);

    read_preamble(&mut reader)?;

    loop {
        let start = reader.pos();
        let id = match reader.try_read_byte()? {
            Some(id) => id,
            None => break,
        };
        let size = reader.read_uleb128()?;
        let content_start = reader.pos();
        let content = reader.read_bytes(size as usize)?;

        let section = sections::read_section(id, &content).map_err(|e| e.rebase(content_start))?;
        debug!(
            id,
            kind = %section.kind(),
            offset = start,
            size,
            "decoded section"
        );

        let position = SectionPosition::new(start, reader.pos());
        module.push(section, position);
    }

    debug!(
        name,
        sections = module.sections().len(),
        bytes = reader.pos(),
        "decoded module"
    );
    Ok(module)
}

fn read_preamble<R: Read>(reader: &mut Reader<R>) -> Result<(), DecodeError> {
    let magic = reader.read_u32().map_err(|_| DecodeError::InvalidModule {
        reason: "missing magic number".to_string(),
    })?;
    if magic != MAGIC {
        return Err(DecodeError::InvalidModule {
            reason: format!("bad magic number 0x{magic:08x}"),
        });
    }

    let version = reader.read_u32().map_err(|_| DecodeError::InvalidModule {
        reason: "missing version".to_string(),
    })?;
    if version != VERSION {
        return Err(DecodeError::InvalidModule {
            reason: format!("unsupported version {version}"),
        });
    }

    Ok(())
}
