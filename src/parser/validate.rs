use std::collections::{BTreeMap, HashSet};

use thiserror::Error;

use super::module::*;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid {section} section: {reason}")]
    InvalidSection { section: SectionKind, reason: String },

    #[error("section id {id} appears more than once")]
    DuplicateSection { id: u8 },
}

impl ValidationError {
    fn invalid(section: SectionKind, reason: impl Into<String>) -> Self {
        ValidationError::InvalidSection {
            section,
            reason: reason.into(),
        }
    }
}

/// Structural check a section applies to its own contents.
pub trait Validate {
    fn validate(&self) -> Result<(), ValidationError>;
}

/// A maximum of zero places no bound on the minimum.
impl Validate for Limit {
    fn validate(&self) -> Result<(), ValidationError> {
        match self.max {
            Some(max) if max != 0 && self.min > max => Err(ValidationError::invalid(
                SectionKind::Unknown,
                format!("limit minimum {} is larger than maximum {max}", self.min),
            )),
            _ => Ok(()),
        }
    }
}

/// Re-tags a limit failure with the section that owns the limit.
fn validate_limit(limit: &Limit, section: SectionKind) -> Result<(), ValidationError> {
    limit.validate().map_err(|e| match e {
        ValidationError::InvalidSection { reason, .. } => ValidationError::invalid(section, reason),
        e => e,
    })
}

impl Validate for MemorySection {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.memory.len() > 1 {
            return Err(ValidationError::invalid(
                SectionKind::Memory,
                format!("{} memories declared, at most one is allowed", self.memory.len()),
            ));
        }
        for memory in &self.memory {
            validate_limit(&memory.limit, SectionKind::Memory)?;
        }
        Ok(())
    }
}

impl Validate for TableSection {
    fn validate(&self) -> Result<(), ValidationError> {
        for table in &self.tables {
            validate_limit(&table.limit, SectionKind::Table)?;
        }
        Ok(())
    }
}

impl Validate for ExportSection {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut seen = HashSet::with_capacity(self.exports.len());
        for export in &self.exports {
            if !seen.insert(export.name.as_str()) {
                return Err(ValidationError::invalid(
                    SectionKind::Export,
                    format!("duplicate export name \"{}\"", export.name),
                ));
            }
        }
        Ok(())
    }
}

impl Validate for Section {
    fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Section::Memory(s) => s.validate(),
            Section::Table(s) => s.validate(),
            Section::Export(s) => s.validate(),
            // type index bounds and the like are not checked yet
            Section::Type(_) | Section::Function(_) | Section::Code(_) => Ok(()),
            Section::Custom(_) | Section::Unknown(_) => Ok(()),
        }
    }
}

impl Module {
    /// Validates every section, stopping at the first failure.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.violations().next() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Validates every section and collects all failures.
    pub fn validate_all(&self) -> Vec<ValidationError> {
        self.violations().collect()
    }

    fn violations(&self) -> impl Iterator<Item = ValidationError> + '_ {
        self.duplicate_sections()
            .into_iter()
            .chain(self.sections().iter().filter_map(|s| s.validate().err()))
    }

    fn duplicate_sections(&self) -> Vec<ValidationError> {
        let mut counts: BTreeMap<u8, usize> = BTreeMap::new();
        for section in self.sections() {
            let id = section.id();
            if (1..=12).contains(&id) {
                *counts.entry(id).or_default() += 1;
            }
        }
        counts
            .into_iter()
            .filter(|&(_, count)| count > 1)
            .map(|(id, _)| ValidationError::DuplicateSection { id })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit(min: u32, max: Option<u32>) -> Limit {
        Limit { min, max }
    }

    fn memory_section(limits: &[Limit]) -> Section {
        Section::Memory(MemorySection {
            memory: limits.iter().map(|&limit| Memory { limit }).collect(),
        })
    }

    fn export(name: &str, index: u32) -> Export {
        Export {
            name: name.to_string(),
            kind: ExportKind::Function,
            index,
        }
    }

    #[test]
    fn test_memory_rules() {
        assert!(memory_section(&[]).validate().is_ok());
        assert!(memory_section(&[limit(1, None)]).validate().is_ok());
        assert!(memory_section(&[limit(1, Some(1))]).validate().is_ok());
        assert!(memory_section(&[limit(1, Some(0))]).validate().is_ok());
        assert_eq!(
            memory_section(&[limit(2, Some(1))]).validate(),
            Err(ValidationError::InvalidSection {
                section: SectionKind::Memory,
                reason: "limit minimum 2 is larger than maximum 1".to_string()
            })
        );
        // cardinality fails whatever the contents
        assert!(matches!(
            memory_section(&[limit(0, None), limit(0, None)]).validate(),
            Err(ValidationError::InvalidSection {
                section: SectionKind::Memory,
                ..
            })
        ));
    }

    #[test]
    fn test_table_limits() {
        let table = |limit| Table {
            ref_type: RefType::FuncRef,
            limit,
        };
        let ok = Section::Table(TableSection {
            tables: vec![table(limit(0, Some(10)))],
        });
        assert!(ok.validate().is_ok());
        let zero_max = Section::Table(TableSection {
            tables: vec![table(limit(1, Some(0)))],
        });
        assert!(zero_max.validate().is_ok());
        let bad = Section::Table(TableSection {
            tables: vec![table(limit(0, None)), table(limit(11, Some(10)))],
        });
        assert!(matches!(
            bad.validate(),
            Err(ValidationError::InvalidSection {
                section: SectionKind::Table,
                ..
            })
        ));
    }

    #[test]
    fn test_duplicate_export_names() {
        let exports = Section::Export(ExportSection {
            exports: vec![export("a", 0), export("b", 1), export("a", 2)],
        });
        assert!(matches!(
            exports.validate(),
            Err(ValidationError::InvalidSection {
                section: SectionKind::Export,
                ..
            })
        ));
    }

    #[test]
    fn test_opaque_sections_always_validate() {
        let custom = Section::Custom(CustomSection::default());
        let unknown = Section::Unknown(UnknownSection {
            id: 0xef,
            payload: vec![0xff],
        });
        assert!(custom.validate().is_ok());
        assert!(unknown.validate().is_ok());
    }

    #[test]
    fn test_module_duplicate_sections() {
        let module = Module::from_sections(
            "test",
            vec![
                Section::Custom(CustomSection::default()),
                Section::Custom(CustomSection::default()),
                Section::Type(TypeSection::default()),
                Section::Type(TypeSection::default()),
                Section::Unknown(UnknownSection {
                    id: 0x20,
                    payload: vec![],
                }),
                Section::Unknown(UnknownSection {
                    id: 0x20,
                    payload: vec![],
                }),
            ],
        );
        assert_eq!(
            module.validate(),
            Err(ValidationError::DuplicateSection { id: 1 })
        );
        assert_eq!(module.validate_all().len(), 1);
    }

    #[test]
    fn test_module_validate_all_collects() {
        let module = Module::from_sections(
            "test",
            vec![
                memory_section(&[limit(5, Some(1))]),
                Section::Export(ExportSection {
                    exports: vec![export("a", 0), export("a", 0)],
                }),
                memory_section(&[]),
            ],
        );
        let errors = module.validate_all();
        assert_eq!(errors.len(), 3);
        assert_eq!(errors[0], ValidationError::DuplicateSection { id: 5 });
        assert!(module.validate().is_err());

        assert!(Module::new("empty").validate().is_ok());
    }
}
