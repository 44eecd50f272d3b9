//! Roots held by native code.
//!
//! A [`Handle`] registers a cell with the registry for as long as it is alive. The collector
//! visits every registered cell, so the object stays alive and the handle sees its new address
//! after a collection. Dropping the handle unregisters it.

use hustle_value::{Cell, Gc, HeapKind};
use std::cell::RefCell;
use std::marker::PhantomData;
use std::rc::Rc;

#[derive(Default)]
struct Slots {
    cells: Vec<Option<Cell>>,
    free: Vec<usize>,
}

impl Slots {
    fn insert(&mut self, cell: Cell) -> usize {
        match self.free.pop() {
            Some(index) => {
                self.cells[index] = Some(cell);
                index
            }
            None => {
                self.cells.push(Some(cell));
                self.cells.len() - 1
            }
        }
    }

    fn remove(&mut self, index: usize) {
        debug_assert!(self.cells[index].is_some(), "handle unregistered twice");
        self.cells[index] = None;
        self.free.push(index);
    }
}

/// Every live handle of one heap.
#[derive(Clone, Default)]
pub struct HandleRegistry {
    slots: Rc<RefCell<Slots>>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn make_handle<T: HeapKind>(&self, ptr: Gc<T>) -> Handle<T> {
        Handle {
            base: self.make_cell_handle(ptr.to_cell()),
            _marker: PhantomData,
        }
    }

    pub fn make_cell_handle(&self, cell: Cell) -> CellHandle {
        let index = self.slots.borrow_mut().insert(cell);
        CellHandle {
            slots: Rc::clone(&self.slots),
            index,
        }
    }

    /// Visits every registered cell.
    pub fn mark_handles(&self, visit: &mut dyn FnMut(&mut Cell)) {
        let mut slots = self.slots.borrow_mut();
        for cell in slots.cells.iter_mut().flatten() {
            visit(cell);
        }
    }

    /// Number of live handles.
    pub fn len(&self) -> usize {
        let slots = self.slots.borrow();
        slots.cells.len() - slots.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A rooted cell of any kind.
pub struct CellHandle {
    slots: Rc<RefCell<Slots>>,
    index: usize,
}

impl CellHandle {
    pub fn cell(&self) -> Cell {
        match self.slots.borrow().cells[self.index] {
            Some(cell) => cell,
            None => unreachable!("live handle without a slot"),
        }
    }

    pub fn set(&self, cell: Cell) {
        self.slots.borrow_mut().cells[self.index] = Some(cell);
    }
}

impl Drop for CellHandle {
    fn drop(&mut self) {
        self.slots.borrow_mut().remove(self.index);
    }
}

/// A rooted pointer to an object of kind `T`.
pub struct Handle<T> {
    base: CellHandle,
    _marker: PhantomData<T>,
}

impl<T: HeapKind> Handle<T> {
    /// The current address of the object. Only valid until the next allocation.
    pub fn get(&self) -> Gc<T> {
        self.base.cell().cast::<T>()
    }

    pub fn cell(&self) -> Cell {
        self.base.cell()
    }

    pub fn set(&self, ptr: Gc<T>) {
        self.base.set(ptr.to_cell())
    }
}
