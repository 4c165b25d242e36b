//! Variable instructions
//!
//! Locals live on the data stack directly below the frame's `locals_base`,
//! parameters first, then declared locals. Each access resolves the local to
//! a backward index from the current top.

use super::*;

/// local.get x - Get local variable
///
/// 1. Read the local index immediate x.
/// 2. Copy local x of the current frame.
/// 3. Push the copy.
pub fn local_get(thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    thread.advance();
    let x = thread.read_u32_operand()?;
    let value = *thread.data_stack.peek(thread.local_index(x)?)?;
    thread.data_stack.push(value)?;
    Ok(())
}

/// local.set x - Set local variable
///
/// 1. Read the local index immediate x.
/// 2. Pop the value val.
/// 3. Replace local x with val.
pub fn local_set(thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    thread.advance();
    let x = thread.read_u32_operand()?;
    thread.require_operands(1)?;
    let value = thread.data_stack.pop()?;
    thread.data_stack.poke(thread.local_index(x)?, value)?;
    Ok(())
}

/// local.tee x - Set local variable but keep value on stack
///
/// Same as local.set, except val stays on top of the stack.
pub fn local_tee(thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    thread.advance();
    let x = thread.read_u32_operand()?;
    thread.require_operands(1)?;
    let value = *thread.data_stack.peek(0)?;
    thread.data_stack.poke(thread.local_index(x)?, value)?;
    Ok(())
}
