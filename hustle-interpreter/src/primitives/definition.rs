use crate::error::VmError;
use crate::primitives::PrimInfo;
use crate::vm::{expect_object, Vm};
use hustle_value::{Array, ByteString, Quotation, Word};

pub const PRIMITIVES: &[PrimInfo] = &[
    ("def", self::def, false),
    ("defp", self::defp, false),
    ("array>quote", self::array_to_quote, false),
    ("lookup", self::lookup, false),
    ("symbol", self::symbol, false),
    ("parse-word?", self::is_parse_word, false),
];

/// Pops a string and returns its text.
fn pop_name(vm: &mut Vm) -> Result<String, VmError> {
    let name = vm.pop_object::<ByteString>()?;
    Ok(name.to_str_lossy().into_owned())
}

fn define(vm: &mut Vm, is_parse_word: bool) -> Result<(), VmError> {
    let definition = vm.pop()?;
    let name = pop_name(vm)?;
    vm.register_symbol(&name, definition, is_parse_word)?;
    Ok(())
}

fn def(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "def ( name quot -- )";

    define(vm, false)
}

fn defp(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "defp ( name quot -- )";

    define(vm, true)
}

pub(crate) fn array_to_quote(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "array>quote ( array -- quot )";

    expect_object::<Array>(vm.peek()?)?;
    // the array stays on the stack, and so rooted, until the quotation exists
    let mut quote = vm.allocate::<Quotation>(None)?;
    let array = vm.pop_object::<Array>()?;
    quote.definition.set_ptr(array);
    vm.push(quote.to_cell())
}

fn lookup(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "lookup ( name -- word )";

    let name = pop_name(vm)?;
    let word = vm.lookup_symbol(&name)?;
    vm.push(word)
}

fn symbol(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "symbol ( name -- )";

    let name = pop_name(vm)?;
    vm.make_symbol(&name)?;
    Ok(())
}

fn is_parse_word(vm: &mut Vm) -> Result<(), VmError> {
    const _: &str = "parse-word? ( word -- ? )";

    let word = vm.pop_object::<Word>()?;
    vm.push_bool(word.is_parse_word())
}
