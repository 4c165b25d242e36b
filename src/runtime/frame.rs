//! Instruction pointer and call frame

/// Where execution is: a function, a byte offset into its body, and the body
/// itself cached at jump time. The default pointer has no bytecode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstructionPointer<'m> {
    pub function_index: u32,
    pub cursor: usize,
    pub bytecode: &'m [u8],
}

impl<'m> InstructionPointer<'m> {
    /// Points at the first instruction of `bytecode`.
    pub fn new(function_index: u32, bytecode: &'m [u8]) -> Self {
        InstructionPointer {
            function_index,
            cursor: 0,
            bytecode,
        }
    }

    /// The byte under the cursor, if any remain.
    pub fn current(&self) -> Option<u8> {
        self.bytecode.get(self.cursor).copied()
    }
}

/// A call stack entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StackFrame<'m> {
    /// Where to resume once the callee's `end` executes, `None` when the
    /// host made the call
    pub caller: Option<InstructionPointer<'m>>,
    /// Data stack depth at call time; the callee's locals sit directly below
    pub locals_base: usize,
    /// Parameters plus declared locals
    pub locals_count: usize,
}

impl<'m> StackFrame<'m> {
    /// Absolute data stack slot of local `index`, if the frame has it.
    pub fn local_slot(&self, index: u32) -> Option<usize> {
        let index = index as usize;
        if index >= self.locals_count {
            return None;
        }
        (self.locals_base + index).checked_sub(self.locals_count)
    }
}
