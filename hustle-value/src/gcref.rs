use crate::cell::Cell;
use crate::header::Header;
use crate::object::HeapKind;
use std::fmt::{Debug, Formatter};
use std::ops::{Deref, DerefMut};

/// A typed pointer into the heap.
///
/// Only valid until the next allocation: a collection may move the object. Anything that must
/// survive an allocation has to be reachable from a root, typically through a handle.
pub struct Gc<T> {
    pub ptr: *mut T,
}

impl<T> Clone for Gc<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Gc<T> {}

impl<T> Debug for Gc<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match !self.is_null() {
            true => write!(f, "Gc({:p})", self.ptr),
            false => f.write_str("(empty)"),
        }
    }
}

// Placeholder for fields that get filled in after an allocation.
impl<T> Default for Gc<T> {
    fn default() -> Self {
        Gc::from_raw(std::ptr::null_mut())
    }
}

impl<T> PartialEq for Gc<T> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.ptr, other.ptr)
    }
}

impl<T> Eq for Gc<T> {}

impl<T> Deref for Gc<T> {
    type Target = T;

    fn deref(&self) -> &T {
        debug_assert!(!self.is_null(), "dereferencing an empty pointer");
        unsafe { &*self.ptr }
    }
}

impl<T> DerefMut for Gc<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        debug_assert!(!self.is_null(), "dereferencing an empty pointer");
        unsafe { &mut *self.ptr }
    }
}

impl<T> Gc<T> {
    #[inline(always)]
    pub const fn from_raw(ptr: *mut T) -> Self {
        Gc { ptr }
    }

    pub fn is_null(&self) -> bool {
        self.ptr.is_null()
    }

    pub fn header(&self) -> &Header {
        debug_assert!(!self.is_null());
        unsafe { &*(self.ptr as *const Header) }
    }
}

impl<T: HeapKind> Gc<T> {
    pub fn to_cell(self) -> Cell {
        Cell::from_object(self)
    }
}
