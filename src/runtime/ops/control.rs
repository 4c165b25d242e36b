//! Control instructions

use super::*;

/// unreachable - Trap unconditionally
///
/// The cursor stays on the opcode so the fault reports its position.
pub fn unreachable(_thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    Err(RuntimeError::Unreachable.into())
}

/// nop - Do nothing
pub fn nop(thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    thread.advance();
    Ok(())
}

/// end - Return from the current frame
///
/// 1. Pop the current frame.
/// 2. Discard its locals from the data stack, keeping the values above them
///    as the results.
/// 3. Resume at the frame's caller, unless the host made the call.
/// 4. Signal the end of the block to the loop.
pub fn end(thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    let frame = thread.call_stack.pop()?;

    // operand pops stop at locals_base, so the locals region is intact
    let start = frame.locals_base.saturating_sub(frame.locals_count);
    if start < frame.locals_base {
        thread.data_stack.discard(start..frame.locals_base)?;
    }

    if let Some(caller) = frame.caller {
        thread.current = caller;
    }
    Err(Signal::EndOfBlock)
}
