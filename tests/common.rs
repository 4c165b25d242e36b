//! Module fixtures shared between integration tests
#![allow(dead_code)]

use wasmstack::encoder::encode;
use wasmstack::parser::module::*;

/// One zero-parameter, zero-result function exported as "fnop" whose body
/// is nop, nop, end.
pub const FNOP: [u8; 36] = [
    0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00, 0x01, 0x04, 0x01, 0x60, 0x00, 0x00, 0x03, 0x02, 0x01, 0x00,
    0x07, 0x08, 0x01, 0x04, 0x66, 0x6e, 0x6f, 0x70, 0x00, 0x00, 0x0a, 0x06, 0x01, 0x04, 0x00, 0x01, 0x01, 0x0b,
];

pub struct Func<'a> {
    pub export: &'a str,
    pub params: usize,
    pub locals: Vec<ValueType>,
    pub body: Vec<u8>,
}

impl<'a> Func<'a> {
    pub fn new(export: &'a str, params: usize, body: &[u8]) -> Self {
        Func {
            export,
            params,
            locals: Vec::new(),
            body: body.to_vec(),
        }
    }
}

/// Encodes a module with one type, function and export per entry.
pub fn module_bytes(funcs: &[Func]) -> Vec<u8> {
    let module = Module::from_sections(
        "fixture",
        vec![
            Section::Type(TypeSection {
                types: funcs
                    .iter()
                    .map(|f| FunctionType {
                        parameters: vec![ValueType::I32; f.params],
                        results: vec![],
                    })
                    .collect(),
            }),
            Section::Function(FunctionSection {
                type_indices: (0..funcs.len() as u32).collect(),
            }),
            Section::Export(ExportSection {
                exports: funcs
                    .iter()
                    .enumerate()
                    .map(|(i, f)| Export {
                        name: f.export.to_string(),
                        kind: ExportKind::Function,
                        index: i as u32,
                    })
                    .collect(),
            }),
            Section::Code(CodeSection {
                functions: funcs
                    .iter()
                    .map(|f| Function {
                        locals: f.locals.clone(),
                        body: f.body.clone(),
                    })
                    .collect(),
            }),
        ],
    );
    encode(&module)
}
