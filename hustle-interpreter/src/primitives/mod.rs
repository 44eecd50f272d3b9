/// Primitives shuffling the data stack.
pub mod stack;
/// Integer arithmetic, comparisons and equality.
pub mod arithmetic;
/// Calls, conditionals and loops.
pub mod control;
/// Defining and looking up words.
pub mod definition;
/// Arrays, records, strings and raw object access.
pub mod data;
/// Printing the VM state and breaking into the debugger.
pub mod debug;

use crate::error::VmError;
use crate::vm::Vm;
use once_cell::sync::Lazy;

pub type PrimitiveFn = fn(&mut Vm) -> Result<(), VmError>;

/// Name, function and whether the word runs at read time.
pub type PrimInfo = (&'static str, PrimitiveFn, bool);

/// Every primitive a fresh [`Vm`] starts with, in registration order.
pub static BUILTINS: Lazy<Box<[PrimInfo]>> = Lazy::new(|| {
    [
        self::stack::PRIMITIVES,
        self::arithmetic::PRIMITIVES,
        self::control::PRIMITIVES,
        self::definition::PRIMITIVES,
        self::data::PRIMITIVES,
        self::debug::PRIMITIVES,
    ]
    .concat()
    .into_boxed_slice()
});
