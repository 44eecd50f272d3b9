use crate::vm::Vm;
use hustle_value::{Array, ByteString, Cell, ObjectTag, Quotation, Word, Wrapper};
use indenter::indented;
use std::fmt::{self, Write};

/// Nesting beyond which recursive dumps stop descending.
const MAX_RECURSION: usize = 8;

/// Describes every data stack slot, deepest first. With `recurse`, object contents are
/// printed below each slot, indented.
pub fn dump_stack(vm: &Vm, recurse: bool) -> String {
    let mut out = String::new();
    if vm.stack.is_empty() {
        out.push_str("** stack empty **\n");
        return out;
    }
    for (index, cell) in vm.stack.as_slice().iter().enumerate().rev() {
        // writing to a String cannot fail
        let _ = print_cell(vm, &mut out, *cell, &format!("<SP-{}> ", index), recurse, 0);
    }
    out
}

/// One short line per slot, top first, at most `max_depth` of them.
pub fn print_stack(vm: &Vm, max_depth: usize) -> String {
    vm.stack.iter().take(max_depth).map(|cell| format!("{}\n", terse(vm, *cell))).collect()
}

/// The call stack, innermost frame first, as `name+offset` lines.
pub fn backtrace(vm: &Vm) -> String {
    let mut out = String::from("======= Backtrace ======\n");
    for frame in vm.call_stack.frames() {
        let name = match (frame.is_entry(), frame.word.is_null()) {
            (true, _) => "<entry>".to_string(),
            (false, true) => "<Anonymous>".to_string(),
            (false, false) => frame.word.get().name_str().map_or_else(|| "<Anonymous>".to_string(), |name| name.into_owned()),
        };
        let _ = writeln!(out, "{}+{}", name, frame.offset);
    }
    out
}

/// A compact rendering: ints as numbers, strings quoted, words by name.
pub fn terse(vm: &Vm, cell: Cell) -> String {
    if let Some(value) = cell.as_int() {
        return value.to_string();
    }
    if cell.is_null() {
        return format!("null {}", cell.kind_name());
    }
    match cell.tag() {
        Some(ObjectTag::String) => format!("'{}'", cell.cast::<ByteString>().to_str_lossy()),
        Some(ObjectTag::Word) => word_name(cell),
        Some(ObjectTag::Wrapper) => format!("\\{}", terse(vm, cell.cast::<Wrapper>().wrapped)),
        Some(ObjectTag::Array) => format!("array[{}]", cell.cast::<Array>().len()),
        Some(ObjectTag::Quote) => match cell.cast::<Quotation>().entry() {
            Some(id) => format!("{{ <{}> }}", vm.primitive_name(id).unwrap_or("primitive")),
            None => "{ ... }".to_string(),
        },
        _ => format!("{}@{:#x}", cell.kind_name(), cell.address()),
    }
}

fn word_name(cell: Cell) -> String {
    cell.cast::<Word>().name_str().map_or_else(String::new, |name| name.into_owned())
}

fn describe(vm: &Vm, cell: Cell, recurse: bool) -> String {
    if let Some(value) = cell.as_int() {
        return value.to_string();
    }
    if cell.is_null() {
        return "nil".to_string();
    }
    let address = cell.address();
    match cell.tag() {
        Some(ObjectTag::String) => format!("@{:#x} \"{}\"", address, cell.cast::<ByteString>().to_str_lossy()),
        Some(ObjectTag::Array) => format!("@{:#x} elements={}", address, cell.cast::<Array>().len()),
        Some(ObjectTag::Word) if !recurse => format!("@{:#x} - {}", address, word_name(cell)),
        Some(ObjectTag::Quote) if !recurse => format!("@{:#x} {}", address, terse(vm, cell)),
        _ => format!("@{:#x}", address),
    }
}

fn print_cell(vm: &Vm, out: &mut dyn Write, cell: Cell, prefix: &str, recurse: bool, depth: usize) -> fmt::Result {
    writeln!(out, "{}({}) - {}", prefix, cell.kind_name(), describe(vm, cell, recurse))?;
    if !recurse || cell.is_int() || cell.is_null() {
        return Ok(());
    }
    if depth >= MAX_RECURSION {
        return writeln!(indented(out), "...");
    }

    let out = &mut indented(out);
    match cell.tag() {
        Some(ObjectTag::Array) => {
            for (index, element) in cell.cast::<Array>().as_slice().iter().enumerate() {
                print_cell(vm, out, *element, &format!("[{}] - ", index), true, depth + 1)?;
            }
        }
        Some(ObjectTag::Quote) => {
            let quote = cell.cast::<Quotation>();
            print_cell(vm, out, quote.definition.cell(), "definition: ", true, depth + 1)?;
            match quote.entry() {
                Some(id) => writeln!(out, "entry: {}", vm.primitive_name(id).unwrap_or("?"))?,
                None => writeln!(out, "entry: none")?,
            }
        }
        Some(ObjectTag::Word) => {
            let word = cell.cast::<Word>();
            print_cell(vm, out, word.name.cell(), "Name: ", true, depth + 1)?;
            print_cell(vm, out, word.definition.cell(), "Definition: ", true, depth + 1)?;
        }
        Some(ObjectTag::Wrapper) => {
            print_cell(vm, out, cell.cast::<Wrapper>().wrapped, "Wrapped: ", true, depth + 1)?;
        }
        _ => {}
    }
    Ok(())
}
