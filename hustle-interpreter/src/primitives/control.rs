use crate::call_stack::StackFrame;
use crate::error::VmError;
use crate::interpreter::word_frame;
use crate::primitives::PrimInfo;
use crate::vm::Vm;
use hustle_value::{ObjectTag, Quotation, Wrapper};

pub const PRIMITIVES: &[PrimInfo] = &[
    ("?", self::choose, false),
    ("call", self::call, false),
    ("while", self::while_loop, false),
    ("exit", self::exit, false),
];

fn choose(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "? ( cond t f -- t|f )";

    let f = vm.pop()?;
    let t = vm.pop()?;
    let cond = vm.pop()?;
    match vm.is_false(cond) {
        true => vm.push(f),
        false => vm.push(t),
    }
}

/// Runs the callee in place of this primitive, without nesting a native call.
fn call(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "call ( callable -- )";

    let callee = vm.pop()?;
    if callee.is_int() || callee.is_null() {
        return Err(VmError::NotCallable(callee.kind_name()));
    }
    let frame = match callee.tag() {
        Some(ObjectTag::Wrapper) => return vm.push(callee.cast::<Wrapper>().wrapped),
        Some(ObjectTag::Word) => word_frame(callee)?,
        Some(ObjectTag::Quote) => StackFrame::for_quotation(callee.cast::<Quotation>()),
        _ => return Err(VmError::NotCallable(callee.kind_name())),
    };

    // the interpreter pops one frame when a primitive returns, so the callee goes in twice
    vm.call_stack.pop()?;
    vm.call_stack.push(frame)?;
    vm.call_stack.push(frame)
}

fn while_loop(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "while ( cond-quot body-quot -- )";

    let body = vm.pop()?;
    let cond = vm.pop()?;
    let body = vm.make_cell_handle(body);
    let cond = vm.make_cell_handle(cond);

    loop {
        vm.call(cond.cell())?;
        let result = vm.pop()?;
        if vm.is_false(result) {
            return Ok(());
        }
        vm.call(body.cell())?;
    }
}

fn exit(_: &mut Vm) -> Result<(), VmError> {
    const _: &str = "exit ( -- )";

    Err(VmError::Halt)
}
