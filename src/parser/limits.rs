//! Implementation limits for decoding and execution.
//!
//! Decode limits are aligned with V8's src/wasm/wasm-limits.h. They bound
//! allocations driven by counts read from untrusted input.

// =============================================================================
// Module-level limits
// =============================================================================

/// Maximum number of type definitions in a module
pub const MAX_TYPES: u32 = 1_000_000;

/// Maximum number of defined functions in a module
pub const MAX_FUNCTIONS: u32 = 1_000_000;

/// Maximum number of exports in a module
pub const MAX_EXPORTS: u32 = 1_000_000;

/// Maximum number of tables in a module
pub const MAX_TABLES: u32 = 100_000;

/// Maximum number of memories in a module
pub const MAX_MEMORIES: u32 = 1;

// =============================================================================
// Function-level limits
// =============================================================================

/// Maximum function body size in bytes
pub const MAX_FUNCTION_SIZE: u32 = 7_654_321;

/// Maximum number of function parameters
pub const MAX_FUNCTION_PARAMS: u32 = 1_000;

/// Maximum number of function return values
pub const MAX_FUNCTION_RETURNS: u32 = 1_000;

/// Maximum number of local variables in a function
pub const MAX_FUNCTION_LOCALS: u32 = 50_000;

// =============================================================================
// Interpreter defaults
// =============================================================================

/// Default data stack capacity, in values
pub const DEFAULT_DATA_STACK_CAPACITY: usize = 65_536;

/// Default call stack capacity, in frames
pub const DEFAULT_CALL_STACK_CAPACITY: usize = 1_024;

/// Upper bound on elements preallocated from a declared vector count.
///
/// A count never needs more slots than there are bytes left to describe them,
/// so callers clamp to the remaining content length as well.
pub fn preallocation(count: u32, remaining: usize) -> usize {
    (count as usize).min(remaining)
}
