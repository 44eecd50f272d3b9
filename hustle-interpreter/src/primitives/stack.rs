use crate::error::VmError;
use crate::primitives::PrimInfo;
use crate::vm::Vm;

pub const PRIMITIVES: &[PrimInfo] = &[
    ("swap", self::swap, false),
    ("dup", self::dup, false),
    ("over", self::over, false),
    ("rot", self::rot, false),
    ("pick", self::pick, false),
    ("drop", self::drop, false),
    ("dip", self::dip, false),
];

fn swap(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "swap ( a b -- b a )";

    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(b)?;
    vm.push(a)
}

fn dup(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "dup ( a -- a a )";

    let a = vm.peek()?;
    vm.push(a)
}

fn over(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "over ( a b -- a b a )";

    let a = vm.stack.get(1)?;
    vm.push(a)
}

fn rot(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "rot ( a b c -- c a b )";

    let c = vm.pop()?;
    let b = vm.pop()?;
    let a = vm.pop()?;
    vm.push(c)?;
    vm.push(a)?;
    vm.push(b)
}

fn pick(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "pick ( a b c -- a b c a )";

    let a = vm.stack.get(2)?;
    vm.push(a)
}

fn drop(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "drop ( a -- )";

    vm.pop().map(|_| ())
}

fn dip(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "dip ( x quot -- x )";

    let quote = vm.pop()?;
    let x = vm.pop()?;
    // `x` is off the stack while `quote` runs
    let x = vm.make_cell_handle(x);
    vm.call(quote)?;
    vm.push(x.cell())
}
