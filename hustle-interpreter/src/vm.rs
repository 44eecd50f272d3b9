use crate::call_stack::CallStack;
use crate::debug::DebugState;
use crate::error::VmError;
use crate::primitives::{self, PrimInfo, PrimitiveFn};
use crate::stack::Stack;
use crate::symbols::SymbolTable;
use hustle_gc::{CellHandle, Handle, HandleRegistry, Heap, HeapConfig, MarkRoots};
use hustle_value::{Array, ByteString, Cell, Construct, Gc, HeapKind, PrimitiveId, Quotation, TypedCell, Word, Wrapper};
use log::{debug, info, warn};

pub const DEFAULT_STACK_SIZE: usize = 4096;
pub const DEFAULT_CALL_FRAMES: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmConfig {
    /// Capacity of the data stack, in cells.
    pub stack_size: usize,
    /// Capacity of the call stack, in frames.
    pub call_frames: usize,
    pub heap: HeapConfig,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            stack_size: DEFAULT_STACK_SIZE,
            call_frames: DEFAULT_CALL_FRAMES,
            heap: HeapConfig::default(),
        }
    }
}

/// Words the interpreter itself refers to.
#[derive(Default)]
pub struct Globals {
    pub true_word: TypedCell<Word>,
    pub false_word: TypedCell<Word>,
    /// Tells the top level reader to stop.
    pub exit_bootstrap: TypedCell<Word>,
    /// Marker pushed by `mark-stack`. Not bound to any name.
    pub mark: TypedCell<Word>,
}

impl Globals {
    fn mark_globals(&mut self, visit: &mut dyn FnMut(&mut Cell)) {
        visit(self.true_word.as_cell_mut());
        visit(self.false_word.as_cell_mut());
        visit(self.exit_bootstrap.as_cell_mut());
        visit(self.mark.as_cell_mut());
    }
}

/// The virtual machine.
pub struct Vm {
    /// The data stack.
    pub stack: Stack,
    pub call_stack: CallStack,
    pub symbols: SymbolTable,
    pub globals: Globals,
    pub heap: Heap,
    handles: HandleRegistry,
    primitives: Vec<PrimInfo>,
    pub(crate) debug: DebugState,
}

/// Everything the collector has to visit, borrowed from a [`Vm`] next to its heap.
struct VmRoots<'a> {
    stack: &'a mut Stack,
    call_stack: &'a mut CallStack,
    symbols: &'a mut SymbolTable,
    globals: &'a mut Globals,
    handles: &'a HandleRegistry,
}

impl MarkRoots for VmRoots<'_> {
    fn mark_roots(&mut self, visit: &mut dyn FnMut(&mut Cell)) {
        for cell in self.stack.as_mut_slice() {
            visit(cell);
        }
        self.call_stack.mark_frames(visit);
        self.symbols.mark_symbols(visit);
        self.globals.mark_globals(visit);
        self.handles.mark_handles(visit);
    }
}

impl Vm {
    /// Creates a VM with every builtin primitive and the global symbols registered.
    pub fn new(config: VmConfig) -> Result<Self, VmError> {
        let mut vm = Vm {
            stack: Stack::new(config.stack_size),
            call_stack: CallStack::new(config.call_frames),
            symbols: SymbolTable::new(),
            globals: Globals::default(),
            heap: Heap::new(config.heap)?,
            handles: HandleRegistry::new(),
            primitives: Vec::new(),
            debug: DebugState::default(),
        };

        for &(name, function, is_parse_word) in primitives::BUILTINS.iter() {
            vm.register_primitive(name, function, is_parse_word)?;
        }

        let true_word = vm.make_symbol("True")?;
        vm.globals.true_word.set_ptr(true_word);
        let false_word = vm.make_symbol("False")?;
        vm.globals.false_word.set_ptr(false_word);
        let exit = vm.make_symbol("exit-bootstrap")?;
        vm.globals.exit_bootstrap.set_ptr(exit);
        let mark = vm.make_unregistered_symbol("<MARK>")?;
        vm.globals.mark.set_ptr(mark);

        debug!("vm ready: {} symbols, {} bytes of heap in use", vm.symbols.len(), vm.heap.bytes_used());
        Ok(vm)
    }

    fn heap_and_roots(&mut self) -> (&mut Heap, VmRoots<'_>) {
        (
            &mut self.heap,
            VmRoots {
                stack: &mut self.stack,
                call_stack: &mut self.call_stack,
                symbols: &mut self.symbols,
                globals: &mut self.globals,
                handles: &self.handles,
            },
        )
    }

    /// Allocates an object. May collect, which invalidates every `Gc` not held in a root or handle.
    pub fn allocate<T: Construct>(&mut self, init: T::Init) -> Result<Gc<T>, VmError> {
        let (heap, mut roots) = self.heap_and_roots();
        Ok(heap.allocate_object::<T>(init, &mut roots)?)
    }

    pub fn allocate_string(&mut self, text: &str) -> Result<Gc<ByteString>, VmError> {
        self.allocate::<ByteString>(text.as_bytes().to_vec())
    }

    /// Forces a collection.
    pub fn collect_garbage(&mut self) {
        let (heap, mut roots) = self.heap_and_roots();
        heap.collect(&mut roots);
    }

    pub fn make_handle<T: HeapKind>(&self, ptr: Gc<T>) -> Handle<T> {
        self.handles.make_handle(ptr)
    }

    pub fn make_cell_handle(&self, cell: Cell) -> CellHandle {
        self.handles.make_cell_handle(cell)
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    pub fn push(&mut self, cell: Cell) -> Result<(), VmError> {
        self.stack.push(cell)
    }

    pub fn pop(&mut self) -> Result<Cell, VmError> {
        self.stack.pop()
    }

    pub fn peek(&self) -> Result<Cell, VmError> {
        self.stack.peek()
    }

    pub fn pop_int(&mut self) -> Result<isize, VmError> {
        let cell = self.pop()?;
        cell.as_int().ok_or(VmError::TypeMismatch {
            expected: "int",
            found: cell.kind_name(),
        })
    }

    /// Pops a non-null object of kind `T`.
    pub fn pop_object<T: HeapKind>(&mut self) -> Result<Gc<T>, VmError> {
        let cell = self.pop()?;
        expect_object(cell)
    }

    pub fn bool_cell(&self, value: bool) -> Cell {
        match value {
            true => self.globals.true_word.cell(),
            false => self.globals.false_word.cell(),
        }
    }

    pub fn push_bool(&mut self, value: bool) -> Result<(), VmError> {
        self.push(self.bool_cell(value))
    }

    /// Only `False` is false.
    pub fn is_false(&self, cell: Cell) -> bool {
        cell == self.globals.false_word.cell()
    }

    pub fn lookup_symbol(&self, name: &str) -> Result<Cell, VmError> {
        self.symbols.get(name).ok_or_else(|| VmError::SymbolNotFound(name.to_string()))
    }

    /// Binds `name` to an existing word, replacing any previous binding.
    pub fn register_word(&mut self, name: &str, word: Gc<Word>) -> Option<Cell> {
        let previous = self.symbols.insert(name, word.to_cell());
        if let Some(previous) = previous.filter(|previous| *previous != word.to_cell()) {
            match previous.try_cast::<Word>().filter(|word| !word.is_null()).map(|word| word.definition.get()) {
                Some(quote) if !quote.is_null() && quote.is_primitive() => warn!("primitive `{}` redefined", name),
                _ => info!("redefined `{}`", name),
            }
        }
        previous
    }

    /// Binds `name` to `definition`.
    ///
    /// A word is bound as is. A quotation gets a fresh word wrapping it, marked as a parse word
    /// if asked to.
    pub fn register_symbol(&mut self, name: &str, definition: Cell, is_parse_word: bool) -> Result<Gc<Word>, VmError> {
        if let Some(word) = definition.try_cast::<Word>().filter(|word| !word.is_null()) {
            self.register_word(name, word);
            return Ok(word);
        }
        let quote = expect_object::<Quotation>(definition)?;
        let word = self.new_word(name, quote, is_parse_word)?;
        self.register_word(name, word);
        Ok(word)
    }

    /// Registers a native function under `name`.
    pub fn register_primitive(&mut self, name: &'static str, function: PrimitiveFn, is_parse_word: bool) -> Result<Gc<Word>, VmError> {
        let id = PrimitiveId::new(self.primitives.len());
        self.primitives.push((name, function, is_parse_word));

        let definition = self.allocate::<Array>(0)?;
        let definition = self.make_handle(definition);
        let mut quote = self.allocate::<Quotation>(Some(id))?;
        quote.definition.set_ptr(definition.get());

        let word = self.new_word(name, quote, is_parse_word)?;
        self.register_word(name, word);
        Ok(word)
    }

    pub(crate) fn primitive(&self, id: PrimitiveId) -> PrimitiveFn {
        match self.primitives.get(id.index()) {
            Some(&(_, function, _)) => function,
            None => panic!("unknown primitive #{}", id.index()),
        }
    }

    pub fn primitive_name(&self, id: PrimitiveId) -> Option<&'static str> {
        self.primitives.get(id.index()).map(|(name, _, _)| *name)
    }

    /// Creates and binds a word that pushes itself when called.
    pub fn make_symbol(&mut self, name: &str) -> Result<Gc<Word>, VmError> {
        let word = self.make_unregistered_symbol(name)?;
        self.register_word(name, word);
        Ok(word)
    }

    /// A word whose definition is a single wrapper around the word itself.
    pub fn make_unregistered_symbol(&mut self, name: &str) -> Result<Gc<Word>, VmError> {
        let definition = self.allocate::<Array>(1)?;
        let definition = self.make_handle(definition);
        let mut quote = self.allocate::<Quotation>(None)?;
        quote.definition.set_ptr(definition.get());

        let word = self.new_word(name, quote, false)?;
        let word = self.make_handle(word);
        let mut wrapper = self.allocate::<Wrapper>(())?;
        wrapper.wrapped = word.cell();
        definition.get().set(0, wrapper.to_cell());
        Ok(word.get())
    }

    /// Allocates a named word running `quote`.
    fn new_word(&mut self, name: &str, quote: Gc<Quotation>, is_parse_word: bool) -> Result<Gc<Word>, VmError> {
        let quote = self.make_handle(quote);
        let name = self.allocate_string(name)?;
        let name = self.make_handle(name);
        let mut word = self.allocate::<Word>(is_parse_word)?;
        word.name.set_ptr(name.get());
        word.definition.set_ptr(quote.get());
        Ok(word)
    }
}

/// Checks that `cell` is a non-null object of kind `T`.
pub fn expect_object<T: HeapKind>(cell: Cell) -> Result<Gc<T>, VmError> {
    match cell.try_cast::<T>() {
        Some(ptr) if !ptr.is_null() => Ok(ptr),
        Some(_) => Err(VmError::TypeMismatch {
            expected: T::TAG.name(),
            found: "null",
        }),
        None => Err(VmError::TypeMismatch {
            expected: T::TAG.name(),
            found: cell.kind_name(),
        }),
    }
}
