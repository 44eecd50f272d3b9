//! Value representation shared by the Hustle collector and interpreter.
//!
//! Every value is a single machine word (a [`Cell`]). Small integers live directly inside the
//! word, everything else is a tagged pointer to an object carrying a [`Header`].

pub mod cell;
pub mod gcref;
pub mod header;
pub mod object;
pub mod typed_cell;

pub use cell::Cell;
pub use gcref::Gc;
pub use header::{Header, HeaderState};
pub use object::{raw_slots, Array, ByteString, Construct, HeapKind, ObjectTag, PrimitiveId, Quotation, Record, Word, Wrapper};
pub use typed_cell::TypedCell;
