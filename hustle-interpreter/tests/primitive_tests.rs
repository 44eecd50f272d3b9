use hustle_gc::HeapConfig;
use hustle_interpreter::primitives::BUILTINS;
use hustle_interpreter::reader::read_source;
use hustle_interpreter::{Vm, VmConfig, VmError};
use hustle_value::{Array, ByteString, Cell, Quotation, Record, Word};
use rstest::{fixture, rstest};

#[fixture]
fn vm() -> Vm {
    Vm::new(VmConfig {
        stack_size: 256,
        call_frames: 256,
        heap: HeapConfig {
            region_size: 1 << 20,
            low_space_threshold: 1 << 14,
            stress: false,
        },
    })
    .expect("could not set up test vm")
}

fn run(vm: &mut Vm, source: &str) {
    if let Err(error) = read_source(vm, source) {
        panic!("`{}` failed: {}", source, error);
    }
}

/// Pops every int on the stack, top first.
fn drain_ints(vm: &mut Vm) -> Vec<isize> {
    let mut ints = Vec::new();
    while !vm.stack.is_empty() {
        ints.push(vm.pop_int().unwrap());
    }
    ints
}

#[rstest]
fn every_builtin_is_a_primitive_word(vm: Vm) {
    for (name, _, is_parse_word) in BUILTINS.iter() {
        let word = vm.lookup_symbol(name).unwrap().cast::<Word>();
        let quote = word.definition.get();
        assert!(quote.is_primitive(), "`{}` is not primitive", name);
        assert!(quote.definition.get().is_empty());
        assert_eq!(word.is_parse_word(), *is_parse_word);
        assert_eq!(word.name_str().unwrap(), *name);
    }
}

#[rstest]
fn global_symbols_push_themselves(mut vm: Vm) {
    run(&mut vm, "True False");
    assert_eq!(vm.pop().unwrap(), vm.globals.false_word.cell());
    assert_eq!(vm.pop().unwrap(), vm.globals.true_word.cell());
}

#[rstest]
#[case("1 2 +", 3)]
#[case("2 3 -", -1)]
#[case("-4 32 *", -128)]
#[case("17 5 mod", 2)]
#[case("-17 5 mod", -2)]
#[case("12 10 and", 8)]
#[case("12 3 or", 15)]
fn arithmetic(mut vm: Vm, #[case] source: &str, #[case] expected: isize) {
    run(&mut vm, source);
    assert_eq!(drain_ints(&mut vm), vec![expected]);
}

#[rstest]
fn arithmetic_wraps_to_the_int_range(mut vm: Vm) {
    vm.push(Cell::from_int(hustle_value::cell::CELL_INT_MAX)).unwrap();
    run(&mut vm, "1 +");
    assert_eq!(vm.pop_int().unwrap(), hustle_value::cell::CELL_INT_MIN);
}

#[rstest]
fn modulo_by_zero(mut vm: Vm) {
    assert_eq!(read_source(&mut vm, "1 0 mod"), Err(VmError::DivisionByZero));
}

#[rstest]
fn arithmetic_needs_ints(mut vm: Vm) {
    assert_eq!(
        read_source(&mut vm, "1 'one' +"),
        Err(VmError::TypeMismatch {
            expected: "int",
            found: "string"
        })
    );
}

#[rstest]
#[case("1 2 <", true)]
#[case("2 1 <", false)]
#[case("2 1 >", true)]
#[case("1 1 >", false)]
#[case("1 1 =", true)]
#[case("'abc' 'abc' =", true)]
#[case("'abc' 'abd' =", false)]
#[case("[ ] [ ] =", false)]
#[case("True True =", true)]
#[case("0 bool", true)]
#[case("False bool", false)]
fn comparisons(mut vm: Vm, #[case] source: &str, #[case] expected: bool) {
    run(&mut vm, source);
    assert_eq!(vm.pop().unwrap(), vm.bool_cell(expected));
    assert!(vm.stack.is_empty());
}

#[rstest]
fn swap(mut vm: Vm) {
    run(&mut vm, "2 32 swap");
    assert_eq!(drain_ints(&mut vm), vec![2, 32]);
}

#[rstest]
fn dup(mut vm: Vm) {
    run(&mut vm, "7 dup");
    assert_eq!(drain_ints(&mut vm), vec![7, 7]);
}

#[rstest]
fn over(mut vm: Vm) {
    run(&mut vm, "16 -1 over");
    assert_eq!(drain_ints(&mut vm), vec![16, -1, 16]);
}

#[rstest]
fn rot(mut vm: Vm) {
    run(&mut vm, "-42 19 1 rot");
    assert_eq!(drain_ints(&mut vm), vec![19, -42, 1]);
}

#[rstest]
fn pick(mut vm: Vm) {
    run(&mut vm, "1 2 3 pick");
    assert_eq!(drain_ints(&mut vm), vec![1, 3, 2, 1]);
}

#[rstest]
fn drop(mut vm: Vm) {
    run(&mut vm, "1 2 drop");
    assert_eq!(drain_ints(&mut vm), vec![1]);
}

#[rstest]
fn dip(mut vm: Vm) {
    run(&mut vm, "1 2 3 { + } dip");
    assert_eq!(drain_ints(&mut vm), vec![3, 3]);
}

#[rstest]
fn choose(mut vm: Vm) {
    run(&mut vm, "True 1 2 ?");
    assert_eq!(drain_ints(&mut vm), vec![1]);
    run(&mut vm, "False 1 2 ?");
    assert_eq!(drain_ints(&mut vm), vec![2]);
}

#[rstest]
fn call_runs_quotations_and_words(mut vm: Vm) {
    run(&mut vm, "1 { 2 + } call");
    assert_eq!(drain_ints(&mut vm), vec![3]);

    run(&mut vm, "'add3' { 3 + } def 5 'add3' lookup call");
    assert_eq!(drain_ints(&mut vm), vec![8]);
    assert!(vm.call_stack.is_empty());
}

#[rstest]
fn call_inside_a_definition_resumes_the_caller(mut vm: Vm) {
    run(&mut vm, "'then-double' { call 2 * } def 1 { 10 + } then-double");
    assert_eq!(drain_ints(&mut vm), vec![22]);

    run(&mut vm, "'twice' { dup dip call } def 1 { 10 + } twice");
    assert_eq!(drain_ints(&mut vm), vec![21]);
    assert!(vm.call_stack.is_empty());
}

#[rstest]
fn call_rejects_ints(mut vm: Vm) {
    assert_eq!(read_source(&mut vm, "1 call"), Err(VmError::NotCallable("int")));
}

#[rstest]
fn while_counts_down(mut vm: Vm) {
    run(&mut vm, "0 5 { dup 0 > } { 1 - swap 1 + swap } while drop");
    assert_eq!(drain_ints(&mut vm), vec![5]);
}

#[rstest]
fn exit_halts(mut vm: Vm) {
    assert_eq!(read_source(&mut vm, "1 exit 2"), Err(VmError::Halt));
    assert_eq!(drain_ints(&mut vm), vec![1]);
}

#[rstest]
fn add3_definition(mut vm: Vm) {
    run(&mut vm, "'add3' { 3 + } def");
    run(&mut vm, "5 add3");
    assert_eq!(vm.pop_int().unwrap(), 8);
    assert!(vm.stack.is_empty());
}

#[rstest]
fn redefinition_replaces_the_binding(mut vm: Vm) {
    run(&mut vm, "'f' { 1 } def 'f' { 2 } def f");
    assert_eq!(drain_ints(&mut vm), vec![2]);
}

#[rstest]
fn defp_marks_parse_words(mut vm: Vm) {
    run(&mut vm, "'now' { 1 } defp 'later' { 2 } def");
    run(&mut vm, "'now' lookup parse-word? 'later' lookup parse-word?");
    assert_eq!(vm.pop().unwrap(), vm.bool_cell(false));
    assert_eq!(vm.pop().unwrap(), vm.bool_cell(true));
}

#[rstest]
fn array_to_quote(mut vm: Vm) {
    run(&mut vm, "[ 4 dup * ] array>quote call");
    assert_eq!(drain_ints(&mut vm), vec![16]);
}

#[rstest]
fn symbol_words_push_themselves(mut vm: Vm) {
    run(&mut vm, "'Blue' symbol Blue 'Blue' lookup =");
    assert_eq!(vm.pop().unwrap(), vm.bool_cell(true));
}

#[rstest]
fn lookup_missing_symbol(mut vm: Vm) {
    assert_eq!(
        read_source(&mut vm, "'nope' lookup"),
        Err(VmError::SymbolNotFound("nope".to_string()))
    );
}

#[rstest]
fn arrays_and_records(mut vm: Vm) {
    run(&mut vm, "3 <array> dup 7 set-all");
    let array = vm.pop_object::<Array>().unwrap();
    assert_eq!(array.as_slice(), &[Cell::from_int(7); 3]);

    run(&mut vm, "2 <record>");
    let record = vm.pop_object::<Record>().unwrap();
    assert_eq!(record.slots(), &[Cell::from_int(0); 2]);

    assert_eq!(read_source(&mut vm, "-1 <array>"), Err(VmError::InvalidLength(-1)));
}

#[rstest]
#[case("5 length", 1)]
#[case("'hello' length", 5)]
#[case("[ 1 2 3 ] length", 3)]
#[case("{ 1 } length", -1)]
fn length(mut vm: Vm, #[case] source: &str, #[case] expected: isize) {
    run(&mut vm, source);
    assert_eq!(drain_ints(&mut vm), vec![expected]);
}

#[rstest]
fn kind_tests(mut vm: Vm) {
    run(&mut vm, "[ ] array? 'x' array? 'x' string? 1 string?");
    let falsy = vm.bool_cell(false);
    let truthy = vm.bool_cell(true);
    let results: Vec<Cell> = (0..4).map(|_| vm.pop().unwrap()).collect();
    assert_eq!(results, vec![falsy, truthy, falsy, truthy]);
}

#[rstest]
fn mark_to_array_keeps_push_order(mut vm: Vm) {
    run(&mut vm, "99 mark-stack 1 2 3 mark>array");
    let array = vm.pop_object::<Array>().unwrap();
    assert_eq!(array.as_slice(), &[Cell::from_int(1), Cell::from_int(2), Cell::from_int(3)]);
    assert_eq!(drain_ints(&mut vm), vec![99]);
}

#[rstest]
fn mark_to_array_without_a_mark(mut vm: Vm) {
    assert!(matches!(read_source(&mut vm, "1 mark>array"), Err(VmError::AssertionFailed(_))));
}

#[rstest]
fn raw_slots(mut vm: Vm) {
    run(&mut vm, "2 <record> dup 1 42 set-raw-slot 1 raw-slot");
    assert_eq!(drain_ints(&mut vm), vec![42]);

    // slot 0 of an array is its first element
    run(&mut vm, "[ 5 6 ] 1 raw-slot");
    assert_eq!(drain_ints(&mut vm), vec![6]);
}

#[rstest]
#[should_panic(expected = "out of range")]
fn raw_slot_out_of_range(mut vm: Vm) {
    let _ = read_source(&mut vm, "1 <record> 1 raw-slot");
}

#[rstest]
fn primitive_entry_reads_back_as_an_int(mut vm: Vm) {
    run(&mut vm, "'-' lookup 1 raw-slot 1 raw-slot");
    let entry = vm.pop().unwrap();
    assert!(entry.is_int(), "{:?}", entry);
    let index = BUILTINS.iter().position(|(name, _, _)| *name == "-").unwrap();
    assert_eq!(entry.get_int(), index as isize + 1);

    // an interpreted quotation has no entry
    run(&mut vm, "{ 1 } 1 raw-slot");
    assert_eq!(drain_ints(&mut vm), vec![0]);
}

#[rstest]
fn equal_strings_are_distinct_cells_but_equal_values(mut vm: Vm) {
    let first = vm.allocate_string("same").unwrap();
    let first = vm.make_handle(first);
    let second = vm.allocate_string("same").unwrap();
    assert_ne!(first.cell(), second.to_cell());

    vm.push(first.cell()).unwrap();
    vm.push(second.to_cell()).unwrap();
    run(&mut vm, "=");
    assert_eq!(vm.pop().unwrap(), vm.bool_cell(true));
}

#[rstest]
fn hashing(mut vm: Vm) {
    run(&mut vm, "'abc' hash 'abc' hash = 42 hash");
    assert_eq!(vm.pop_int().unwrap(), 42);
    assert_eq!(vm.pop().unwrap(), vm.bool_cell(true));

    assert!(matches!(read_source(&mut vm, "[ ] hash"), Err(VmError::TypeMismatch { .. })));
}

#[rstest]
fn print_consumes_a_string(mut vm: Vm) {
    run(&mut vm, "'hi' print");
    assert!(vm.stack.is_empty());
    assert!(read_source(&mut vm, "1 print").is_err());
}

#[rstest]
fn assertions(mut vm: Vm) {
    run(&mut vm, "1 'fine' assert");
    assert_eq!(
        read_source(&mut vm, "False 'it broke' assert"),
        Err(VmError::AssertionFailed("it broke".to_string()))
    );
}

#[rstest]
fn strings_read_as_byte_strings(mut vm: Vm) {
    run(&mut vm, "'hello world'");
    let string = vm.pop_object::<ByteString>().unwrap();
    assert_eq!(string.as_bytes(), b"hello world");
}

#[rstest]
fn quotations_nest(mut vm: Vm) {
    run(&mut vm, "{ { 1 } }");
    let outer = vm.pop_object::<Quotation>().unwrap();
    let inner = outer.definition.get().get(0);
    assert!(inner.is_a::<Quotation>());
}
