use crate::error::VmError;
use crate::primitives::PrimInfo;
use crate::vm::Vm;
use hustle_value::{raw_slots, Array, ByteString, Cell, ObjectTag, Record};
use std::collections::hash_map::DefaultHasher;
use std::hash::Hasher;

pub const PRIMITIVES: &[PrimInfo] = &[
    ("<array>", self::new_array, false),
    ("<record>", self::new_record, false),
    ("set-all", self::set_all, false),
    ("length", self::length, false),
    ("array?", self::is_array, false),
    ("string?", self::is_string, false),
    ("mark-stack", self::mark_stack, false),
    ("mark>array", self::mark_to_array, false),
    ("raw-slot", self::raw_slot, false),
    ("set-raw-slot", self::set_raw_slot, false),
    ("hash", self::hash, false),
    ("print", self::print, false),
];

fn pop_length(vm: &mut Vm) -> Result<usize, VmError> {
    let length = vm.pop_int()?;
    usize::try_from(length).map_err(|_| VmError::InvalidLength(length))
}

fn new_array(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "<array> ( n -- array )";

    let length = pop_length(vm)?;
    let array = vm.allocate::<Array>(length)?;
    vm.push(array.to_cell())
}

fn new_record(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "<record> ( n -- record )";

    let slots = pop_length(vm)?;
    let record = vm.allocate::<Record>(slots)?;
    vm.push(record.to_cell())
}

fn set_all(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "set-all ( array value -- )";

    let value = vm.pop()?;
    let mut array = vm.pop_object::<Array>()?;
    array.as_mut_slice().fill(value);
    Ok(())
}

fn length(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "length ( x -- n )";

    let x = vm.pop()?;
    let length = match x.tag() {
        _ if x.is_int() => 1,
        _ if x.is_null() => -1,
        Some(ObjectTag::String) => x.cast::<ByteString>().len() as isize,
        Some(ObjectTag::Array) => x.cast::<Array>().len() as isize,
        _ => -1,
    };
    vm.push(Cell::from_int(length))
}

fn is_array(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "array? ( x -- ? )";

    let x = vm.pop()?;
    vm.push_bool(x.is_object() && x.tag() == Some(ObjectTag::Array))
}

fn is_string(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "string? ( x -- ? )";

    let x = vm.pop()?;
    vm.push_bool(x.is_object() && x.tag() == Some(ObjectTag::String))
}

pub(crate) fn mark_stack(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "mark-stack ( -- mark )";

    let mark = vm.globals.mark.cell();
    vm.push(mark)
}

pub(crate) fn mark_to_array(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "mark>array ( mark x1 .. xn -- array )";

    let mark = vm.globals.mark.cell();
    let count = vm
        .stack
        .iter()
        .position(|cell| *cell == mark)
        .ok_or_else(|| VmError::AssertionFailed("no stack mark".to_string()))?;

    // the elements stay on the stack while the array is allocated
    let mut array = vm.allocate::<Array>(count)?;
    for index in (0..count).rev() {
        let cell = vm.pop()?;
        array.set(index, cell);
    }
    vm.pop()?;
    vm.push(array.to_cell())
}

/// Pops an object and an index, returning the addressed word after the object's header.
fn pop_slot(vm: &mut Vm) -> Result<*mut Cell, VmError> {
    let index = vm.pop_int()?;
    let object = vm.pop()?;
    if !object.is_object() || object.is_null() {
        return Err(VmError::TypeMismatch {
            expected: "object",
            found: object.kind_name(),
        });
    }
    // SAFETY: a non-null object cell taken from the stack points to a live object
    let slots = unsafe { raw_slots(object.object_ptr()) };
    assert!(
        index >= 0 && (index as usize) < slots.len(),
        "raw slot {} out of range for a {} of {} slots",
        index,
        object.kind_name(),
        slots.len()
    );
    Ok(&mut slots[index as usize])
}

fn raw_slot(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "raw-slot ( obj i -- v )";

    let slot = pop_slot(vm)?;
    // SAFETY: nothing has allocated since the slot was located
    let value = unsafe { *slot };
    vm.push(value)
}

fn set_raw_slot(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "set-raw-slot ( obj i v -- )";

    let value = vm.pop()?;
    let slot = pop_slot(vm)?;
    // SAFETY: nothing has allocated since the slot was located
    unsafe { *slot = value };
    Ok(())
}

fn hash(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "hash ( x -- n )";

    let x = vm.pop()?;
    if x.is_int() {
        return vm.push(x);
    }
    match x.try_cast::<ByteString>() {
        Some(string) if !string.is_null() => {
            let mut hasher = DefaultHasher::new();
            hasher.write(string.as_bytes());
            // ints wrap to the tagged range
            vm.push(Cell::from_int(hasher.finish() as isize))
        }
        _ => Err(VmError::TypeMismatch {
            expected: "string",
            found: x.kind_name(),
        }),
    }
}

fn print(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "print ( string -- )";

    let string = vm.pop_object::<ByteString>()?;
    println!("PRINT: '{}'", string.to_str_lossy());
    Ok(())
}
