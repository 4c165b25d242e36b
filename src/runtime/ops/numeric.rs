//! Numeric instructions
//!
//! Integer arithmetic wraps modulo 2^32; nothing here traps on overflow.

use super::*;

/// i32.const c - Push a constant
///
/// The immediate is a signed LEB128 value.
pub fn i32_const(thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    thread.advance();
    let c = thread.read_i32_operand()?;
    thread.data_stack.push(Value::I32(c))?;
    Ok(())
}

/// Pops c2 then c1 and pushes `op(c1, c2)`.
fn i32_binary(thread: &mut InterpreterThread<'_>, op: fn(i32, i32) -> i32) -> Result<(), Signal> {
    thread.advance();
    thread.require_operands(2)?;
    let c2 = thread.data_stack.pop_i32()?;
    let c1 = thread.data_stack.pop_i32()?;
    thread.data_stack.push(Value::I32(op(c1, c2)))?;
    Ok(())
}

/// i32.add - Add two i32 values
pub fn i32_add(thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    i32_binary(thread, i32::wrapping_add)
}

/// i32.sub - Subtract two i32 values
pub fn i32_sub(thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    i32_binary(thread, i32::wrapping_sub)
}

/// i32.mul - Multiply two i32 values
pub fn i32_mul(thread: &mut InterpreterThread<'_>) -> Result<(), Signal> {
    i32_binary(thread, i32::wrapping_mul)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_utils::test::ExecutorTest;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(1, 1)]
    #[case(-1, -1)]
    #[case(624485, 624485)]
    #[case(i32::MIN, i32::MIN)]
    #[case(i32::MAX, i32::MAX)]
    fn test_i32_const(#[case] c: i32, #[case] expected: i32) {
        ExecutorTest::new()
            .i32_const(c)
            .expect_stack(vec![Value::I32(expected)]);
    }

    #[rstest]
    #[case(OP_I32_ADD, 1, 2, 3)]
    #[case(OP_I32_ADD, 0x7fffffff, 1, i32::MIN)]
    #[case(OP_I32_ADD, -1, -1, -2)]
    #[case(OP_I32_SUB, 5, 3, 2)]
    #[case(OP_I32_SUB, 3, 5, -2)]
    #[case(OP_I32_SUB, i32::MIN, 1, i32::MAX)]
    #[case(OP_I32_MUL, 6, 7, 42)]
    #[case(OP_I32_MUL, 0x10000, 0x10000, 0)]
    #[case(OP_I32_MUL, -3, 4, -12)]
    fn test_i32_binary(#[case] op: u8, #[case] c1: i32, #[case] c2: i32, #[case] expected: i32) {
        ExecutorTest::new()
            .i32_const(c1)
            .i32_const(c2)
            .op(op)
            .expect_stack(vec![Value::I32(expected)]);
    }

    #[test]
    fn test_i32_add_on_arguments() {
        ExecutorTest::new()
            .arg(0x7fffffff)
            .arg(1)
            .local_get(0)
            .local_get(1)
            .op(OP_I32_ADD)
            .expect_stack(vec![Value::I32(i32::MIN)]);
    }

    #[test]
    fn test_i32_add_underflow() {
        ExecutorTest::new()
            .i32_const(1)
            .op(OP_I32_ADD)
            .expect_trap(RuntimeError::StackUnderflow);
        ExecutorTest::new()
            .op(OP_I32_ADD)
            .expect_trap(RuntimeError::StackUnderflow);
        // arguments are locals, not operands
        ExecutorTest::new()
            .arg(1)
            .arg(2)
            .op(OP_I32_ADD)
            .expect_trap(RuntimeError::StackUnderflow);
        ExecutorTest::new()
            .arg(1)
            .i32_const(2)
            .op(OP_I32_ADD)
            .expect_trap(RuntimeError::StackUnderflow);
    }

    #[test]
    fn test_i32_add_type_mismatch() {
        ExecutorTest::new()
            .local(crate::parser::module::ValueType::I64)
            .i32_const(1)
            .local_get(0)
            .op(OP_I32_ADD)
            .expect_trap(RuntimeError::TypeMismatch {
                expected: "i32".to_string(),
                actual: "i64".to_string(),
            });
    }

    #[test]
    fn test_i32_const_truncated() {
        ExecutorTest::new()
            .raw_body(vec![OP_I32_CONST, 0xff, 0xff])
            .expect_trap(RuntimeError::TruncatedOperand);
    }
}
