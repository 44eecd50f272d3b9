//! A semispace copying collector.
//!
//! Objects are bump-allocated in the active region. When it runs low, every object reachable
//! from the roots is copied into the other region (Cheney style, breadth-first over a work
//! list) and the regions swap roles.
//!
//! The heap does not know about the interpreter. Consumers provide:
//! - A [`MarkRoots`] implementation visiting every root cell.
//! - [`Handle`]s for pointers held by native code across allocations.

pub mod error;
pub mod handles;
pub mod heap;
pub mod memory;
pub mod region;
pub mod roots;
pub mod scanning;

pub use error::GcError;
pub use handles::{CellHandle, Handle, HandleRegistry};
pub use heap::{Heap, HeapConfig, HeapStats};
pub use roots::MarkRoots;
