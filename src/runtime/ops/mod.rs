//! Opcode table and instruction semantics
//!
//! Instructions are grouped by category. Every instruction consumes its own
//! opcode byte and any immediates, leaving `thread.current.cursor` on the next
//! opcode when it succeeds. The driving loop never moves the cursor.

pub mod control;
pub mod numeric;
pub mod parametric;
pub mod variable;

use once_cell::sync::Lazy;

pub(crate) use crate::parser::encoding::*;
pub(crate) use crate::runtime::thread::InterpreterThread;
pub(crate) use crate::runtime::{RuntimeError, Value};

/// What an instruction reports back to the loop besides plain success.
#[derive(Debug, PartialEq, Eq)]
pub enum Signal {
    /// The current frame ended; the pointer is back at the caller, or left on
    /// `end` when the host made the call.
    EndOfBlock,
    Fault(RuntimeError),
}

impl From<RuntimeError> for Signal {
    fn from(error: RuntimeError) -> Self {
        Signal::Fault(error)
    }
}

pub type Execute = fn(&mut InterpreterThread<'_>) -> Result<(), Signal>;

#[derive(Clone, Copy)]
pub struct Instruction {
    pub name: &'static str,
    pub execute: Execute,
}

impl std::fmt::Debug for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

static TABLE: Lazy<[Option<Instruction>; 256]> = Lazy::new(|| {
    let mut table = [None; 256];
    let mut register = |opcode: u8, name: &'static str, execute: Execute| {
        table[opcode as usize] = Some(Instruction { name, execute });
    };

    register(OP_UNREACHABLE, "unreachable", control::unreachable);
    register(OP_NOP, "nop", control::nop);
    register(OP_END, "end", control::end);
    register(OP_DROP, "drop", parametric::drop);
    register(OP_LOCAL_GET, "local.get", variable::local_get);
    register(OP_LOCAL_SET, "local.set", variable::local_set);
    register(OP_LOCAL_TEE, "local.tee", variable::local_tee);
    register(OP_I32_CONST, "i32.const", numeric::i32_const);
    register(OP_I32_ADD, "i32.add", numeric::i32_add);
    register(OP_I32_SUB, "i32.sub", numeric::i32_sub);
    register(OP_I32_MUL, "i32.mul", numeric::i32_mul);

    table
});

/// The instruction bound to `opcode`, if any.
pub fn lookup(opcode: u8) -> Option<&'static Instruction> {
    TABLE[opcode as usize].as_ref()
}
