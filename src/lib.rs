//! A loader and stack-machine interpreter for WebAssembly-style binary modules.
//!
//! wasmstack decodes a length-prefixed section stream into a typed
//! [`parser::module::Module`], checks its structural invariants, and runs
//! exported functions on a bytecode interpreter with explicit instruction
//! pointers, a call stack and a data stack.
//!
//! # Modules
//!
//! - [`parser`] -- Binary format decoder and validator.
//! - [`encoder`] -- Binary encoder. Serialises a `Module` back to bytes.
//! - [`runtime`] -- Interpreter, opcode table and configuration.
//!
//! # Example
//!
//! Decode a module exporting `add(i32, i32)` and call it:
//!
//! ```
//! use wasmstack::runtime::{Value, VmConfig};
//!
//! let bytes = [
//!     0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00,
//!     0x01, 0x06, 0x01, 0x60, 0x02, 0x7f, 0x7f, 0x00, // type (i32, i32) -> nil
//!     0x03, 0x02, 0x01, 0x00,                         // function 0 has type 0
//!     0x07, 0x07, 0x01, 0x03, b'a', b'd', b'd', 0x00, 0x00,
//!     0x0a, 0x09, 0x01, 0x07, 0x00, 0x20, 0x00, 0x20, 0x01, 0x6a, 0x0b,
//! ];
//! let module = wasmstack::decode(&bytes[..]).unwrap();
//! module.validate().unwrap();
//!
//! let config = VmConfig::new("add").with_initial_stack_values(vec![2, 3]);
//! let vm = wasmstack::create_vm(&config).unwrap();
//! let result = vm.execute(&module, &config).unwrap();
//! assert_eq!(result.values, vec![Value::I32(5)]);
//! ```

pub mod encoder;
pub mod parser;
pub mod runtime;

pub use parser::{decode, DecodeError};
pub use runtime::{create_vm, ExecutionError, ExecutionResult, Interpreter, VmConfig};
