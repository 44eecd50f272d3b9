use crate::call_stack::FRAME_CELLS;
use crate::debug::dump::{backtrace, dump_stack};
use crate::debug::StepMode;
use crate::error::VmError;
use crate::primitives::PrimInfo;
use crate::vm::Vm;
use hustle_value::ByteString;
use log::debug;

pub const PRIMITIVES: &[PrimInfo] = &[
    (".s", self::print_stack, false),
    ("backtrace", self::print_backtrace, false),
    ("assert", self::assert, false),
    ("debug-break", self::debug_break, false),
];

fn print_stack(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = ".s ( -- )";

    println!("{}", dump_stack(vm, true));
    Ok(())
}

fn print_backtrace(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "backtrace ( -- )";

    println!("{}", backtrace(vm));
    Ok(())
}

fn assert(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "assert ( cond message -- )";

    let message = vm.pop()?;
    let cond = vm.pop()?;
    if !vm.is_false(cond) {
        return Ok(());
    }
    debug!("{}", dump_stack(vm, false));
    debug!("{}", backtrace(vm));
    let message = match message.try_cast::<ByteString>() {
        Some(string) if !string.is_null() => string.to_str_lossy().into_owned(),
        _ => format!("{:?}", message),
    };
    Err(VmError::AssertionFailed(message))
}

fn debug_break(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "debug-break ( -- )";

    vm.interpreter_break();
    // this primitive's frame is gone by the time stepping resumes, so "over" means the caller
    if let StepMode::Over { call_stack_sp } = vm.step_mode() {
        vm.set_step_mode(StepMode::Over {
            call_stack_sp: call_stack_sp + FRAME_CELLS,
        });
    }
    Ok(())
}
