//! Stack-machine interpreter
//!
//! Executes exported functions of a decoded [`Module`] on a fresh
//! [`InterpreterThread`] per call. Modules are never mutated, so one module
//! can back any number of concurrent executions.

pub mod config;
pub mod frame;
pub mod ops;
pub mod stack;
pub mod test_utils;
pub mod thread;
pub mod value;

pub use config::VmConfig;
pub use thread::InterpreterThread;
pub use value::Value;

use std::io;

use tracing::{debug, warn};

use crate::parser::module::{ExportKind, Module};

/// Trap kinds. Carry no location; [`ExecutionError::Fault`] adds it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RuntimeError {
    #[error("Stack underflow")]
    StackUnderflow,
    #[error("Stack overflow: capacity of {capacity} exceeded")]
    StackOverflow { capacity: usize },
    #[error("Invalid opcode: 0x{0:02x}")]
    InvalidOpcode(u8),
    #[error("Unreachable executed")]
    Unreachable,
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("Truncated instruction operand")]
    TruncatedOperand,
    #[error("Ran past the end of the function body")]
    EndOfBytecode,
    #[error("Instruction budget exhausted")]
    InstructionBudgetExhausted,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("Missing function: no export named \"{0}\"")]
    MissingFunction(String),
    #[error("Missing start function \"{name}\": {reason}")]
    MissingStartFunction { name: String, reason: String },
    #[error("Fault in function {function_index} at 0x{cursor:x}: {error}")]
    Fault {
        function_index: u32,
        cursor: usize,
        error: RuntimeError,
    },
}

impl ExecutionError {
    /// The trap kind behind a fault, if this is one.
    pub fn runtime_error(&self) -> Option<&RuntimeError> {
        match self {
            ExecutionError::Fault { error, .. } => Some(error),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("start function name is empty")]
    EmptyStartFunction,
    #[error("{0} capacity must be non-zero")]
    ZeroCapacity(&'static str),
    #[error("{count} initial values do not fit a data stack of {capacity}")]
    TooManyInitialValues { count: usize, capacity: usize },
    #[error("invalid configuration: {0}")]
    Json(#[from] serde_json::Error),
    #[error("cannot read configuration: {0}")]
    Io(#[from] io::Error),
}

/// Values left on the data stack when the entry function returned, in pop
/// order (most recently pushed first).
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionResult {
    pub values: Vec<Value>,
    pub instructions_executed: u64,
}

/// An interpreter with fixed resource bounds.
#[derive(Debug, Clone)]
pub struct Interpreter {
    data_stack_capacity: usize,
    call_stack_capacity: usize,
    max_instructions: Option<u64>,
}

/// Checks `config` and builds an interpreter bounded by it.
pub fn create_vm(config: &VmConfig) -> Result<Interpreter, ConfigError> {
    config.check()?;
    Ok(Interpreter {
        data_stack_capacity: config.data_stack_capacity,
        call_stack_capacity: config.call_stack_capacity,
        max_instructions: config.max_instructions,
    })
}

impl Interpreter {
    /// Runs the export named by `config.start_function_name` to completion.
    pub fn execute(&self, module: &Module, config: &VmConfig) -> Result<ExecutionResult, ExecutionError> {
        let name = config.start_function_name.as_str();
        let export = module
            .find_export(name)
            .ok_or_else(|| ExecutionError::MissingFunction(name.to_string()))?;
        if export.kind != ExportKind::Function {
            return Err(ExecutionError::MissingStartFunction {
                name: name.to_string(),
                reason: format!("export is a {}, not a function", export.kind),
            });
        }
        let function = module
            .code()
            .and_then(|code| code.get(export.index))
            .ok_or_else(|| ExecutionError::MissingStartFunction {
                name: name.to_string(),
                reason: format!("function index {} has no body", export.index),
            })?;

        if let Some(signature) = module.function_type(export.index) {
            if signature.parameters.len() != config.initial_stack_values.len() {
                warn!(
                    name,
                    parameters = signature.parameters.len(),
                    preloaded = config.initial_stack_values.len(),
                    "preloaded value count differs from the declared parameters"
                );
            }
        }

        debug!(name, function_index = export.index, "executing");

        let mut thread = InterpreterThread::new(self.data_stack_capacity, self.call_stack_capacity);
        let preload: Vec<Value> = config.initial_stack_values.iter().map(|&v| Value::I32(v)).collect();
        thread
            .enter(export.index, function, &preload)
            .map_err(|error| ExecutionError::Fault {
                function_index: export.index,
                cursor: 0,
                error,
            })?;
        thread.run(self.max_instructions)?;

        let instructions_executed = thread.executed();
        let values = thread.into_results();
        debug!(
            name,
            results = values.len(),
            instructions_executed,
            "execution complete"
        );
        Ok(ExecutionResult {
            values,
            instructions_executed,
        })
    }
}
