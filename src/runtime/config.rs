//! Interpreter configuration

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::ConfigError;
use crate::parser::limits::{DEFAULT_CALL_STACK_CAPACITY, DEFAULT_DATA_STACK_CAPACITY};

/// What to run and with which bounds. Deserializes from JSON; missing fields
/// take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct VmConfig {
    pub start_function_name: String,
    /// Pushed onto the data stack, in order, before the entry call
    pub initial_stack_values: Vec<i32>,
    pub data_stack_capacity: usize,
    pub call_stack_capacity: usize,
    /// Upper bound on dispatched instructions per execution
    pub max_instructions: Option<u64>,
}

impl Default for VmConfig {
    fn default() -> Self {
        VmConfig {
            start_function_name: String::new(),
            initial_stack_values: Vec::new(),
            data_stack_capacity: DEFAULT_DATA_STACK_CAPACITY,
            call_stack_capacity: DEFAULT_CALL_STACK_CAPACITY,
            max_instructions: None,
        }
    }
}

impl VmConfig {
    pub fn new(start_function_name: &str) -> Self {
        VmConfig {
            start_function_name: start_function_name.to_string(),
            ..VmConfig::default()
        }
    }

    pub fn with_initial_stack_values(mut self, values: Vec<i32>) -> Self {
        self.initial_stack_values = values;
        self
    }

    pub fn with_max_instructions(mut self, max: u64) -> Self {
        self.max_instructions = Some(max);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub(crate) fn check(&self) -> Result<(), ConfigError> {
        if self.start_function_name.is_empty() {
            return Err(ConfigError::EmptyStartFunction);
        }
        if self.data_stack_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("data stack"));
        }
        if self.call_stack_capacity == 0 {
            return Err(ConfigError::ZeroCapacity("call stack"));
        }
        if self.initial_stack_values.len() > self.data_stack_capacity {
            return Err(ConfigError::TooManyInitialValues {
                count: self.initial_stack_values.len(),
                capacity: self.data_stack_capacity,
            });
        }
        Ok(())
    }
}
