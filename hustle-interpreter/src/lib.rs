//!
//! This is the interpreter for the Hustle concatenative language.
//!

/// Errors surfaced to embedders.
pub mod error;
/// The data stack.
pub mod stack;
/// The call stack and its frames.
pub mod call_stack;
/// Name to word bindings.
pub mod symbols;
/// The virtual machine: heap, stacks, symbols and globals.
pub mod vm;
/// The interpreter loop.
pub mod interpreter;
/// Definitions for all supported primitives.
pub mod primitives;
/// Stepping, break handling and state dumps.
pub mod debug;
/// A minimal reader turning source text into cells.
pub mod reader;

pub use error::VmError;
pub use vm::{Vm, VmConfig};
