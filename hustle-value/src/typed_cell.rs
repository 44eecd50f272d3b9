use crate::cell::Cell;
use crate::gcref::Gc;
use crate::object::HeapKind;
use std::fmt::{Debug, Formatter};
use std::marker::PhantomData;

/// A cell field that may only hold objects of kind `T`, or the null of `T`.
///
/// Same representation as a plain [`Cell`], so the collector can update it in place.
#[repr(transparent)]
pub struct TypedCell<T> {
    cell: Cell,
    _marker: PhantomData<*mut T>,
}

impl<T> Clone for TypedCell<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for TypedCell<T> {}

impl<T> PartialEq for TypedCell<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cell == other.cell
    }
}

impl<T> Debug for TypedCell<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        self.cell.fmt(f)
    }
}

impl<T: HeapKind> Default for TypedCell<T> {
    fn default() -> Self {
        Self::null()
    }
}

impl<T: HeapKind> TypedCell<T> {
    pub fn null() -> Self {
        TypedCell {
            cell: Cell::null::<T>(),
            _marker: PhantomData,
        }
    }

    pub fn new(ptr: Gc<T>) -> Self {
        TypedCell {
            cell: Cell::from_object(ptr),
            _marker: PhantomData,
        }
    }

    /// Panics if `cell` is not of kind `T`.
    pub fn from_cell(cell: Cell) -> Self {
        match Self::try_from_cell(cell) {
            Some(typed) => typed,
            None => panic!("cannot store a {} where a {} is expected", cell.kind_name(), T::TAG.name()),
        }
    }

    pub fn try_from_cell(cell: Cell) -> Option<Self> {
        cell.is_a::<T>().then_some(TypedCell {
            cell,
            _marker: PhantomData,
        })
    }

    #[inline(always)]
    pub fn get(self) -> Gc<T> {
        Gc::from_raw(self.cell.address() as *mut T)
    }

    #[inline(always)]
    pub fn cell(self) -> Cell {
        self.cell
    }

    pub fn is_null(self) -> bool {
        self.cell.is_null()
    }

    pub fn set(&mut self, cell: Cell) {
        *self = Self::from_cell(cell);
    }

    pub fn set_ptr(&mut self, ptr: Gc<T>) {
        *self = Self::new(ptr);
    }

    /// Raw access for the collector. Whatever is written back must still be of kind `T`.
    pub fn as_cell_mut(&mut self) -> &mut Cell {
        &mut self.cell
    }
}
