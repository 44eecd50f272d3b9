use crate::error::VmError;
use crate::primitives::PrimInfo;
use crate::vm::Vm;
use hustle_value::{ByteString, Cell};

pub const PRIMITIVES: &[PrimInfo] = &[
    ("+", self::plus, false),
    ("-", self::minus, false),
    ("*", self::times, false),
    ("mod", self::modulo, false),
    ("and", self::bitand, false),
    ("or", self::bitor, false),
    ("<", self::lt, false),
    (">", self::gt, false),
    ("=", self::eq, false),
    ("bool", self::to_bool, false),
];

/// Pops `b` then `a`, pushes `op(a, b)`.
fn binary_op(vm: &mut Vm, op: impl FnOnce(isize, isize) -> Result<isize, VmError>) -> Result<(), VmError> {
    let b = vm.pop_int()?;
    let a = vm.pop_int()?;
    let result = op(a, b)?;
    vm.push(Cell::from_int(result))
}

fn comparison(vm: &mut Vm, op: impl FnOnce(isize, isize) -> bool) -> Result<(), VmError> {
    let b = vm.pop_int()?;
    let a = vm.pop_int()?;
    vm.push_bool(op(a, b))
}

fn plus(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "+ ( a b -- a+b )";

    binary_op(vm, |a, b| Ok(a.wrapping_add(b)))
}

fn minus(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "- ( a b -- a-b )";

    binary_op(vm, |a, b| Ok(a.wrapping_sub(b)))
}

fn times(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "* ( a b -- a*b )";

    binary_op(vm, |a, b| Ok(a.wrapping_mul(b)))
}

fn modulo(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "mod ( a b -- a%b )";

    binary_op(vm, |a, b| match b {
        0 => Err(VmError::DivisionByZero),
        _ => Ok(a.wrapping_rem(b)),
    })
}

fn bitand(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "and ( a b -- a&b )";

    binary_op(vm, |a, b| Ok(a & b))
}

fn bitor(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "or ( a b -- a|b )";

    binary_op(vm, |a, b| Ok(a | b))
}

fn lt(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "< ( a b -- ? )";

    comparison(vm, |a, b| a < b)
}

fn gt(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "> ( a b -- ? )";

    comparison(vm, |a, b| a > b)
}

fn eq(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "= ( a b -- ? )";

    let b = vm.pop()?;
    let a = vm.pop()?;
    let equal = match (a.try_cast::<ByteString>(), b.try_cast::<ByteString>()) {
        (Some(a), Some(b)) if !a.is_null() && !b.is_null() => a.as_bytes() == b.as_bytes(),
        _ => a == b,
    };
    vm.push_bool(equal)
}

fn to_bool(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "bool ( x -- ? )";

    let x = vm.pop()?;
    let truthy = !vm.is_false(x);
    vm.push_bool(truthy)
}
