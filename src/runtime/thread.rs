//! Interpreter thread and the fetch-dispatch loop

use tracing::trace;

use super::frame::{InstructionPointer, StackFrame};
use super::ops::{self, Signal};
use super::stack::Stack;
use super::{ExecutionError, RuntimeError, Value};
use crate::parser::module::Function;
use crate::parser::reader::{read_sleb128_i32, read_uleb128};
use crate::parser::DecodeError;

/// The complete mutable state of one execution.
#[derive(Debug)]
pub struct InterpreterThread<'m> {
    pub call_stack: Stack<StackFrame<'m>>,
    pub data_stack: Stack<Value>,
    pub current: InstructionPointer<'m>,
    executed: u64,
}

impl<'m> InterpreterThread<'m> {
    pub fn new(data_stack_capacity: usize, call_stack_capacity: usize) -> Self {
        InterpreterThread {
            call_stack: Stack::new(call_stack_capacity),
            data_stack: Stack::new(data_stack_capacity),
            current: InstructionPointer::default(),
            executed: 0,
        }
    }

    /// Sets up a call into `function` from the current position.
    ///
    /// `arguments` followed by one zero per declared local become the
    /// callee's locals; the frame records the depth above them.
    pub fn enter(
        &mut self,
        function_index: u32,
        function: &'m Function,
        arguments: &[Value],
    ) -> Result<(), RuntimeError> {
        for &argument in arguments {
            self.data_stack.push(argument)?;
        }
        for &local in &function.locals {
            self.data_stack.push(Value::zero(local))?;
        }
        let caller = (!self.call_stack.is_empty()).then_some(self.current);
        self.call_stack.push(StackFrame {
            caller,
            locals_base: self.data_stack.depth(),
            locals_count: arguments.len() + function.locals.len(),
        })?;
        self.current = InstructionPointer::new(function_index, &function.body);
        trace!(function_index, locals = arguments.len() + function.locals.len(), "entered function");
        Ok(())
    }

    /// Fetches and dispatches until the outermost frame returns.
    pub fn run(&mut self, max_instructions: Option<u64>) -> Result<(), ExecutionError> {
        loop {
            let at = self.current;
            let fault = |error| ExecutionError::Fault {
                function_index: at.function_index,
                cursor: at.cursor,
                error,
            };

            if max_instructions.is_some_and(|max| self.executed >= max) {
                return Err(fault(RuntimeError::InstructionBudgetExhausted));
            }
            let opcode = at.current().ok_or_else(|| fault(RuntimeError::EndOfBytecode))?;
            let instruction = ops::lookup(opcode).ok_or_else(|| fault(RuntimeError::InvalidOpcode(opcode)))?;

            trace!(
                function_index = at.function_index,
                cursor = at.cursor,
                op = instruction.name,
                "dispatch"
            );
            self.executed += 1;

            match (instruction.execute)(self) {
                Ok(()) => {}
                Err(Signal::EndOfBlock) if self.call_stack.is_empty() => {
                    trace!("entry function returned");
                    return Ok(());
                }
                Err(Signal::EndOfBlock) => {
                    trace!(
                        function_index = self.current.function_index,
                        cursor = self.current.cursor,
                        "returned to caller"
                    );
                }
                Err(Signal::Fault(error)) => return Err(fault(error)),
            }
        }
    }

    /// The innermost call frame.
    pub fn frame(&self) -> Result<&StackFrame<'m>, RuntimeError> {
        self.call_stack.peek(0)
    }

    /// Backward data stack index of local `index` in the current frame.
    pub fn local_index(&self, index: u32) -> Result<usize, RuntimeError> {
        let slot = self.frame()?.local_slot(index).ok_or(RuntimeError::StackUnderflow)?;
        self.data_stack
            .depth()
            .checked_sub(slot + 1)
            .ok_or(RuntimeError::StackUnderflow)
    }

    /// Fails unless the current frame's body has pushed at least `count`
    /// values above its locals.
    pub fn require_operands(&self, count: usize) -> Result<(), RuntimeError> {
        let base = self.frame()?.locals_base;
        if self.data_stack.depth() < base + count {
            return Err(RuntimeError::StackUnderflow);
        }
        Ok(())
    }

    /// Steps over the opcode byte under the cursor.
    pub fn advance(&mut self) {
        self.current.cursor += 1;
    }

    /// Reads an unsigned LEB128 immediate at the cursor.
    pub fn read_u32_operand(&mut self) -> Result<u32, RuntimeError> {
        let ip = &mut self.current;
        read_uleb128(&mut || next_byte(ip)).map_err(|_| RuntimeError::TruncatedOperand)
    }

    /// Reads a signed LEB128 immediate at the cursor.
    pub fn read_i32_operand(&mut self) -> Result<i32, RuntimeError> {
        let ip = &mut self.current;
        read_sleb128_i32(&mut || next_byte(ip)).map_err(|_| RuntimeError::TruncatedOperand)
    }

    /// Number of instructions dispatched so far.
    pub fn executed(&self) -> u64 {
        self.executed
    }

    /// Residual data stack values, most recently pushed first.
    pub fn into_results(mut self) -> Vec<Value> {
        self.data_stack.drain().collect()
    }
}

fn next_byte(ip: &mut InstructionPointer<'_>) -> Result<u8, DecodeError> {
    let byte = ip
        .current()
        .ok_or(DecodeError::TruncatedInput { offset: ip.cursor })?;
    ip.cursor += 1;
    Ok(byte)
}
