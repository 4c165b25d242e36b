//! Parametric instructions

use super::*;

/// drop - Discard the top value
pub fn drop(thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    thread.advance();
    thread.require_operands(1)?;
    thread.data_stack.pop()?;
    Ok(())
}
