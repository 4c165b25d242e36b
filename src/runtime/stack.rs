//! Fixed-capacity stack shared by the call stack and the data stack

use std::ops::Range;

use super::{RuntimeError, Value};

/// An index-addressable LIFO with a hard capacity.
///
/// Backward indices count down from the top: `peek(0)` is the most recently
/// pushed element.
#[derive(Debug, Clone)]
pub struct Stack<T> {
    values: Vec<T>,
    capacity: usize,
}

impl<T> Stack<T> {
    /// Create a new empty stack that holds at most `capacity` elements
    pub fn new(capacity: usize) -> Self {
        Stack {
            // grows on demand up to the capacity
            values: Vec::with_capacity(capacity.min(1024)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of elements currently on the stack
    pub fn depth(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Absolute index of the top element, `None` when empty
    pub fn top(&self) -> Option<usize> {
        self.values.len().checked_sub(1)
    }

    /// Push a value onto the stack
    pub fn push(&mut self, value: T) -> Result<(), RuntimeError> {
        if self.values.len() >= self.capacity {
            return Err(RuntimeError::StackOverflow {
                capacity: self.capacity,
            });
        }
        self.values.push(value);
        Ok(())
    }

    /// Pop a value from the stack
    pub fn pop(&mut self) -> Result<T, RuntimeError> {
        self.values.pop().ok_or(RuntimeError::StackUnderflow)
    }

    fn absolute(&self, backward_index: usize) -> Result<usize, RuntimeError> {
        self.values
            .len()
            .checked_sub(1)
            .and_then(|top| top.checked_sub(backward_index))
            .ok_or(RuntimeError::StackUnderflow)
    }

    /// Read the element `backward_index` places below the top
    pub fn peek(&self, backward_index: usize) -> Result<&T, RuntimeError> {
        let i = self.absolute(backward_index)?;
        Ok(&self.values[i])
    }

    /// Overwrite the element `backward_index` places below the top
    pub fn poke(&mut self, backward_index: usize, value: T) -> Result<(), RuntimeError> {
        let i = self.absolute(backward_index)?;
        self.values[i] = value;
        Ok(())
    }

    /// Remove the elements in an absolute index range, shifting everything
    /// above it down.
    pub fn discard(&mut self, range: Range<usize>) -> Result<(), RuntimeError> {
        if range.start > range.end || range.end > self.values.len() {
            return Err(RuntimeError::StackUnderflow);
        }
        self.values.drain(range);
        Ok(())
    }

    /// Pop every element, most recently pushed first
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.values.drain(..).rev()
    }
}

impl Stack<Value> {
    /// Pop an i32 value
    pub fn pop_i32(&mut self) -> Result<i32, RuntimeError> {
        let value = self.pop()?;
        value.as_i32().ok_or_else(|| RuntimeError::TypeMismatch {
            expected: "i32".to_string(),
            actual: value.typ().to_string(),
        })
    }
}
