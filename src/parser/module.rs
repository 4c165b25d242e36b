use std::collections::BTreeMap;
use std::fmt;

use super::encoding::*;

/// A fully decoded module.
///
/// Sections are kept in encounter order, duplicates included, with a derived
/// index from kind to positions so that lookups stay cheap and repeated
/// sections survive for validation.
#[derive(Debug, Clone)]
pub struct Module {
    pub name: String,
    sections: Vec<Section>,
    positions: Vec<SectionPosition>,
    index: BTreeMap<SectionKind, Vec<usize>>,
}

impl Module {
    pub fn new(name: &str) -> Module {
        Module {
            name: name.to_string(),
            sections: Vec::new(),
            positions: Vec::new(),
            index: BTreeMap::new(),
        }
    }

    /// Builds a module from already-typed sections, e.g. for encoding.
    pub fn from_sections(name: &str, sections: Vec<Section>) -> Module {
        let mut module = Module::new(name);
        for section in sections {
            module.push(section, SectionPosition::new(0, 0));
        }
        module
    }

    pub(crate) fn push(&mut self, section: Section, position: SectionPosition) {
        self.index
            .entry(section.kind())
            .or_default()
            .push(self.sections.len());
        self.sections.push(section);
        self.positions.push(position);
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn position(&self, index: usize) -> Option<&SectionPosition> {
        self.positions.get(index)
    }

    /// Every section of the given kind, in encounter order.
    pub fn sections_of(&self, kind: SectionKind) -> impl Iterator<Item = &Section> + '_ {
        self.index
            .get(&kind)
            .into_iter()
            .flatten()
            .map(move |&i| &self.sections[i])
    }

    /// The section occupying the kind's slot. When a kind appears more than
    /// once the last occurrence wins; validation reports the duplicate.
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.index
            .get(&kind)
            .and_then(|slots| slots.last())
            .map(|&i| &self.sections[i])
    }

    pub fn types(&self) -> Option<&TypeSection> {
        match self.section(SectionKind::Type) {
            Some(Section::Type(section)) => Some(section),
            _ => None,
        }
    }

    pub fn functions(&self) -> Option<&FunctionSection> {
        match self.section(SectionKind::Function) {
            Some(Section::Function(section)) => Some(section),
            _ => None,
        }
    }

    pub fn tables(&self) -> Option<&TableSection> {
        match self.section(SectionKind::Table) {
            Some(Section::Table(section)) => Some(section),
            _ => None,
        }
    }

    pub fn memory(&self) -> Option<&MemorySection> {
        match self.section(SectionKind::Memory) {
            Some(Section::Memory(section)) => Some(section),
            _ => None,
        }
    }

    pub fn exports(&self) -> Option<&ExportSection> {
        match self.section(SectionKind::Export) {
            Some(Section::Export(section)) => Some(section),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&CodeSection> {
        match self.section(SectionKind::Code) {
            Some(Section::Code(section)) => Some(section),
            _ => None,
        }
    }

    pub fn customs(&self) -> impl Iterator<Item = &CustomSection> + '_ {
        self.sections_of(SectionKind::Custom).filter_map(|s| match s {
            Section::Custom(custom) => Some(custom),
            _ => None,
        })
    }

    pub fn find_export(&self, name: &str) -> Option<&Export> {
        self.exports().and_then(|exports| exports.get(name))
    }

    /// Declared signature of a function, if the Type and Function sections
    /// carry one.
    pub fn function_type(&self, function_index: u32) -> Option<&FunctionType> {
        let type_index = *self.functions()?.type_indices.get(function_index as usize)?;
        self.types()?.types.get(type_index as usize)
    }

    pub fn get_function_name(&self, index: u32) -> Option<&str> {
        self.exports()?
            .exports
            .iter()
            .find(|e| e.kind == ExportKind::Function && e.index == index)
            .map(|e| e.name.as_str())
    }
}

impl fmt::Display for Module {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "module \"{}\": {} section(s)", self.name, self.sections.len())?;
        for (section, position) in self.sections.iter().zip(&self.positions) {
            writeln!(f, "{:>9} {} {}", section.kind().to_string(), position, section.summary())?;
            write!(f, "{section}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionPosition {
    pub start: usize,
    pub end: usize,
}

impl SectionPosition {
    pub fn new(start: usize, end: usize) -> SectionPosition {
        SectionPosition { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }
}

impl fmt::Display for SectionPosition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "start=0x{:08x} end=0x{:08x} (size=0x{:08x})",
            self.start,
            self.end,
            self.len()
        )
    }
}

/// Index key for a module's section slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SectionKind {
    Custom,
    Type,
    Function,
    Table,
    Memory,
    Export,
    Code,
    Unknown,
}

impl fmt::Display for SectionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SectionKind::Custom => "custom",
            SectionKind::Type => "type",
            SectionKind::Function => "function",
            SectionKind::Table => "table",
            SectionKind::Memory => "memory",
            SectionKind::Export => "export",
            SectionKind::Code => "code",
            SectionKind::Unknown => "unknown",
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    Custom(CustomSection),
    Type(TypeSection),
    Function(FunctionSection),
    Table(TableSection),
    Memory(MemorySection),
    Export(ExportSection),
    Code(CodeSection),
    Unknown(UnknownSection),
}

impl Section {
    pub fn kind(&self) -> SectionKind {
        match self {
            Section::Custom(_) => SectionKind::Custom,
            Section::Type(_) => SectionKind::Type,
            Section::Function(_) => SectionKind::Function,
            Section::Table(_) => SectionKind::Table,
            Section::Memory(_) => SectionKind::Memory,
            Section::Export(_) => SectionKind::Export,
            Section::Code(_) => SectionKind::Code,
            Section::Unknown(_) => SectionKind::Unknown,
        }
    }

    /// The wire id this section is framed with.
    pub fn id(&self) -> u8 {
        match self {
            Section::Custom(_) => SECTION_CUSTOM,
            Section::Type(_) => SECTION_TYPE,
            Section::Function(_) => SECTION_FUNCTION,
            Section::Table(_) => SECTION_TABLE,
            Section::Memory(_) => SECTION_MEMORY,
            Section::Export(_) => SECTION_EXPORT,
            Section::Code(_) => SECTION_CODE,
            Section::Unknown(section) => section.id,
        }
    }

    fn summary(&self) -> String {
        match self {
            Section::Custom(s) => format!("\"{}\"", s.name),
            Section::Type(s) => format!("count: {}", s.types.len()),
            Section::Function(s) => format!("count: {}", s.type_indices.len()),
            Section::Table(s) => format!("count: {}", s.tables.len()),
            Section::Memory(s) => format!("count: {}", s.memory.len()),
            Section::Export(s) => format!("count: {}", s.exports.len()),
            Section::Code(s) => format!("count: {}", s.functions.len()),
            Section::Unknown(s) => format!("id: 0x{:02x}", s.id),
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Section::Custom(s) => s.fmt(f),
            Section::Type(s) => s.fmt(f),
            Section::Function(s) => s.fmt(f),
            Section::Table(s) => s.fmt(f),
            Section::Memory(s) => s.fmt(f),
            Section::Export(s) => s.fmt(f),
            Section::Code(s) => s.fmt(f),
            Section::Unknown(s) => s.fmt(f),
        }
    }
}

/// Renders at most `max` leading bytes as hex, with an ellipsis if cut.
fn preview(bytes: &[u8], max: usize) -> String {
    if bytes.len() > max {
        format!("{} ...", hex::encode(&bytes[..max]))
    } else {
        hex::encode(bytes)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CustomSection {
    pub name: String,
    /// The full section content, name prefix included.
    pub payload: Vec<u8>,
}

impl fmt::Display for CustomSection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, " - custom \"{}\" size={}", self.name, self.payload.len())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TypeSection {
    pub types: Vec<FunctionType>,
}

impl fmt::Display for TypeSection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, function_type) in self.types.iter().enumerate() {
            writeln!(f, " - type[{i}] {function_type}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionSection {
    pub type_indices: Vec<u32>,
}

impl fmt::Display for FunctionSection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, type_index) in self.type_indices.iter().enumerate() {
            writeln!(f, " - func[{i}] sig={type_index}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableSection {
    pub tables: Vec<Table>,
}

impl fmt::Display for TableSection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, table) in self.tables.iter().enumerate() {
            writeln!(f, " - table[{i}] {table}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemorySection {
    pub memory: Vec<Memory>,
}

impl fmt::Display for MemorySection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, memory) in self.memory.iter().enumerate() {
            writeln!(f, " - memory[{i}] pages: {}", memory.limit)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportSection {
    pub exports: Vec<Export>,
}

impl ExportSection {
    /// Looks up an export by name. Names are unique in a valid module; if
    /// they are not, the first declaration is returned.
    pub fn get(&self, name: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.name == name)
    }

    pub fn len(&self) -> usize {
        self.exports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exports.is_empty()
    }
}

impl fmt::Display for ExportSection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for export in &self.exports {
            writeln!(f, " - {}[{}] -> \"{}\"", export.kind, export.index, export.name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct CodeSection {
    pub functions: Vec<Function>,
}

impl CodeSection {
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn get(&self, index: u32) -> Option<&Function> {
        self.functions.get(index as usize)
    }
}

impl fmt::Display for CodeSection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, function) in self.functions.iter().enumerate() {
            writeln!(f, " - func[{i}] {function}")?;
        }
        Ok(())
    }
}

/// A section whose id has no decoder; kept verbatim.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct UnknownSection {
    pub id: u8,
    pub payload: Vec<u8>,
}

impl fmt::Display for UnknownSection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(
            f,
            " - size={}: {}",
            self.payload.len(),
            preview(&self.payload, 8)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FunctionType {
    pub parameters: Vec<ValueType>,
    pub results: Vec<ValueType>,
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let join = |types: &[ValueType]| {
            types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<String>>()
                .join(", ")
        };
        write!(
            f,
            "({}) -> {}",
            join(&self.parameters),
            match self.results.len() {
                0 => "nil".to_string(),
                1 => join(&self.results),
                _ => format!("({})", join(&self.results)),
            }
        )
    }
}

/// One code-section entry: declared locals expanded one per slot, plus the
/// raw instruction bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Function {
    pub locals: Vec<ValueType>,
    pub body: Vec<u8>,
}

impl fmt::Display for Function {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "locals={} size={} body={}",
            self.locals.len(),
            self.body.len(),
            preview(&self.body, 16)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit {
    pub min: u32,
    pub max: Option<u32>,
}

impl fmt::Display for Limit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "initial={}", self.min)?;
        if let Some(max) = self.max {
            write!(f, " max={max}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Table {
    pub ref_type: RefType,
    pub limit: Limit,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "type={} {}", ValueType::from(self.ref_type), self.limit)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Memory {
    pub limit: Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportKind {
    Function,
    Table,
    Memory,
    Global,
}

impl ExportKind {
    pub fn decode(byte: u8) -> Option<ExportKind> {
        match byte {
            DESC_FUNC => Some(ExportKind::Function),
            DESC_TABLE => Some(ExportKind::Table),
            DESC_MEMORY => Some(ExportKind::Memory),
            DESC_GLOBAL => Some(ExportKind::Global),
            _ => None,
        }
    }

    pub fn byte(&self) -> u8 {
        match self {
            ExportKind::Function => DESC_FUNC,
            ExportKind::Table => DESC_TABLE,
            ExportKind::Memory => DESC_MEMORY,
            ExportKind::Global => DESC_GLOBAL,
        }
    }
}

impl fmt::Display for ExportKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ExportKind::Function => "func",
            ExportKind::Table => "table",
            ExportKind::Memory => "memory",
            ExportKind::Global => "global",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub name: String,
    pub kind: ExportKind,
    pub index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefType {
    FuncRef,
    ExternRef,
}

impl RefType {
    pub fn decode(byte: u8) -> Option<RefType> {
        match byte {
            REFTYPE_FUNCREF => Some(RefType::FuncRef),
            REFTYPE_EXTERNREF => Some(RefType::ExternRef),
            _ => None,
        }
    }

    pub fn byte(&self) -> u8 {
        match self {
            RefType::FuncRef => REFTYPE_FUNCREF,
            RefType::ExternRef => REFTYPE_EXTERNREF,
        }
    }
}

impl From<RefType> for ValueType {
    fn from(rt: RefType) -> Self {
        match rt {
            RefType::FuncRef => ValueType::FuncRef,
            RefType::ExternRef => ValueType::ExternRef,
        }
    }
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ValueType {
    // Number types
    I32,
    I64,
    F32,
    F64,
    // Reference types
    FuncRef,
    ExternRef,
}

impl ValueType {
    pub fn decode(byte: u8) -> Option<ValueType> {
        match byte {
            VALTYPE_I32 => Some(ValueType::I32),
            VALTYPE_I64 => Some(ValueType::I64),
            VALTYPE_F32 => Some(ValueType::F32),
            VALTYPE_F64 => Some(ValueType::F64),
            REFTYPE_FUNCREF => Some(ValueType::FuncRef),
            REFTYPE_EXTERNREF => Some(ValueType::ExternRef),
            _ => None,
        }
    }

    pub fn byte(&self) -> u8 {
        match self {
            ValueType::I32 => VALTYPE_I32,
            ValueType::I64 => VALTYPE_I64,
            ValueType::F32 => VALTYPE_F32,
            ValueType::F64 => VALTYPE_F64,
            ValueType::FuncRef => REFTYPE_FUNCREF,
            ValueType::ExternRef => REFTYPE_EXTERNREF,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::FuncRef => "funcref",
            ValueType::ExternRef => "externref",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(name: &str) -> Section {
        Section::Custom(CustomSection {
            name: name.to_string(),
            payload: vec![],
        })
    }

    #[test]
    fn test_repeated_custom_sections_are_kept() {
        let module = Module::from_sections("test", vec![custom("a"), custom("b"), custom("c")]);
        let names: Vec<&str> = module.customs().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(module.sections().len(), 3);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn test_positions_past_4gib() {
        let start = u32::MAX as usize + 1;
        let mut module = Module::new("big");
        module.push(custom("far"), SectionPosition::new(start, start + 0x10));
        let position = module.position(0).unwrap();
        assert_eq!(position.start, 0x1_0000_0000);
        assert_eq!(position.len(), 0x10);
        assert_eq!(
            position.to_string(),
            "start=0x100000000 end=0x100000010 (size=0x00000010)"
        );
    }

    #[test]
    fn test_section_slot_is_last_occurrence() {
        let module = Module::from_sections(
            "test",
            vec![
                Section::Function(FunctionSection {
                    type_indices: vec![0],
                }),
                Section::Function(FunctionSection {
                    type_indices: vec![1, 2],
                }),
            ],
        );
        assert_eq!(module.sections_of(SectionKind::Function).count(), 2);
        assert_eq!(module.functions().unwrap().type_indices, vec![1, 2]);
    }

    #[test]
    fn test_function_type_lookup() {
        let module = Module::from_sections(
            "test",
            vec![
                Section::Type(TypeSection {
                    types: vec![
                        FunctionType::default(),
                        FunctionType {
                            parameters: vec![ValueType::I32, ValueType::I32],
                            results: vec![ValueType::I32],
                        },
                    ],
                }),
                Section::Function(FunctionSection {
                    type_indices: vec![1, 0],
                }),
            ],
        );
        assert_eq!(module.function_type(0).unwrap().parameters.len(), 2);
        assert_eq!(module.function_type(1).unwrap().parameters.len(), 0);
        assert!(module.function_type(2).is_none());
    }

    #[test]
    fn test_display() {
        let ft = FunctionType {
            parameters: vec![ValueType::I32, ValueType::I64],
            results: vec![ValueType::F32, ValueType::F64],
        };
        assert_eq!(ft.to_string(), "(i32, i64) -> (f32, f64)");
        assert_eq!(FunctionType::default().to_string(), "() -> nil");

        let unknown = UnknownSection {
            id: 0xef,
            payload: (0..10).collect(),
        };
        assert_eq!(unknown.to_string(), " - size=10: 0001020304050607 ...\n");

        let limit = Limit {
            min: 1,
            max: Some(2),
        };
        assert_eq!(limit.to_string(), "initial=1 max=2");
    }

    #[test]
    fn test_value_type_codes() {
        for byte in [0x7f, 0x7e, 0x7d, 0x7c, 0x70, 0x6f] {
            assert_eq!(ValueType::decode(byte).unwrap().byte(), byte);
        }
        assert!(ValueType::decode(0x7b).is_none());
        assert!(ExportKind::decode(0x04).is_none());
        assert_eq!(RefType::decode(0x70), Some(RefType::FuncRef));
    }
}
