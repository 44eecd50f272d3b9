use crate::gcref::Gc;
use crate::header::Header;
use crate::object::{HeapKind, ObjectTag};
use std::fmt::{Debug, Formatter};

static_assertions::assert_eq_size!(Cell, usize, *const ());

/// Number of low bits reserved for the primary tag.
pub const TAG_BITS: usize = 3;

/// Mask selecting the primary tag of a cell.
pub const TAG_MASK: usize = (1 << TAG_BITS) - 1;

/// Primary tag of immediate integers. A zeroed word is therefore the integer `0`.
pub const INT_TAG: usize = 0;

/// Objects are aligned so that the tag bits of their address are always free.
pub const OBJECT_ALIGNMENT: usize = 1 << TAG_BITS;

/// Largest integer representable without wrapping.
pub const CELL_INT_MAX: isize = isize::MAX >> TAG_BITS;

/// Smallest integer representable without wrapping.
pub const CELL_INT_MIN: isize = isize::MIN >> TAG_BITS;

/// A single machine word holding either an immediate integer or a tagged object pointer.
///
/// The low `TAG_BITS` bits carry the primary tag. For objects the remaining bits are the
/// address of the object header, which may be zero: every object kind has its own null.
///
/// Equality is bitwise, which makes object comparison an identity check.
#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Cell(usize);

impl Cell {
    /// Encodes an integer. Values outside `CELL_INT_MIN..=CELL_INT_MAX` lose their top bits.
    #[inline(always)]
    pub const fn from_int(value: isize) -> Self {
        Cell(((value as usize) << TAG_BITS) | INT_TAG)
    }

    #[inline(always)]
    pub const fn from_raw(bits: usize) -> Self {
        Cell(bits)
    }

    #[inline(always)]
    pub const fn raw(self) -> usize {
        self.0
    }

    /// Encodes a pointer to an object of kind `T`. A null `Gc` yields the typed null of `T`.
    #[inline(always)]
    pub fn from_object<T: HeapKind>(ptr: Gc<T>) -> Self {
        let address = ptr.ptr as usize;
        debug_assert_eq!(address & TAG_MASK, 0, "misaligned object pointer {:#x}", address);
        Cell(address | T::TAG.cell_tag())
    }

    /// Builds a cell for an untyped object, taking the kind from its header.
    ///
    /// # Safety
    /// `header` must point to a live, non-forwarded object.
    pub unsafe fn from_header(header: *mut Header) -> Self {
        let tag = (*header).tag();
        Cell(header as usize | tag.cell_tag())
    }

    /// The null cell of kind `T`.
    pub const fn null<T: HeapKind>() -> Self {
        Cell(T::TAG.cell_tag())
    }

    #[inline(always)]
    pub const fn primary_tag(self) -> usize {
        self.0 & TAG_MASK
    }

    #[inline(always)]
    pub const fn is_int(self) -> bool {
        self.primary_tag() == INT_TAG
    }

    #[inline(always)]
    pub const fn is_object(self) -> bool {
        !self.is_int()
    }

    /// Whether this is an object cell with a zero address.
    #[inline(always)]
    pub const fn is_null(self) -> bool {
        self.is_object() && self.address() == 0
    }

    /// The object kind named by the primary tag, or `None` for integers.
    pub fn tag(self) -> Option<ObjectTag> {
        ObjectTag::from_cell_tag(self.primary_tag())
    }

    /// Decodes an integer, sign-extending from the payload bits.
    #[inline(always)]
    pub fn get_int(self) -> isize {
        assert!(self.is_int(), "expected an integer, found a {}", self.kind_name());
        (self.0 as isize) >> TAG_BITS
    }

    pub fn as_int(self) -> Option<isize> {
        self.is_int().then(|| (self.0 as isize) >> TAG_BITS)
    }

    #[inline(always)]
    pub const fn address(self) -> usize {
        self.0 & !TAG_MASK
    }

    pub fn object_ptr(self) -> *mut Header {
        assert!(self.is_object(), "expected an object, found an integer");
        self.address() as *mut Header
    }

    /// Same primary tag, different object address. Used when an object moves.
    pub fn with_address(self, header: *mut Header) -> Self {
        debug_assert!(self.is_object());
        debug_assert_eq!(header as usize & TAG_MASK, 0);
        Cell(header as usize | self.primary_tag())
    }

    /// Checks the primary tag and, for non-null objects, the tag stored in the header.
    pub fn is_a<T: HeapKind>(self) -> bool {
        if self.primary_tag() != T::TAG.cell_tag() {
            return false;
        }
        let header = self.object_ptr();
        header.is_null() || unsafe { (*header).tag() == T::TAG }
    }

    /// Unchecked in release builds beyond the `is_a` assertion: the cell must be of kind `T`.
    pub fn cast<T: HeapKind>(self) -> Gc<T> {
        assert!(self.is_a::<T>(), "expected a {}, found a {}", T::TAG.name(), self.kind_name());
        Gc::from_raw(self.address() as *mut T)
    }

    pub fn try_cast<T: HeapKind>(self) -> Option<Gc<T>> {
        self.is_a::<T>().then(|| Gc::from_raw(self.address() as *mut T))
    }

    /// Human readable kind, as used in error messages.
    pub fn kind_name(self) -> &'static str {
        if self.is_int() {
            return "int";
        }
        match self.tag() {
            Some(tag) => tag.name(),
            None => "invalid",
        }
    }
}

impl Debug for Cell {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_int() {
            return write!(f, "Cell(int {})", self.get_int());
        }
        match self.is_null() {
            true => write!(f, "Cell(null {})", self.kind_name()),
            false => write!(f, "Cell({} @ {:#x})", self.kind_name(), self.address()),
        }
    }
}

impl From<isize> for Cell {
    fn from(value: isize) -> Self {
        Cell::from_int(value)
    }
}

impl<T: HeapKind> From<Gc<T>> for Cell {
    fn from(ptr: Gc<T>) -> Self {
        Cell::from_object(ptr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::{Array, ByteString, Construct, Quotation, Record, Word, Wrapper};
    use std::ptr::NonNull;

    fn construct<T: Construct>(buffer: &mut Vec<usize>, init: T::Init) -> Gc<T> {
        let words = T::allocation_size(&init) / size_of::<usize>();
        *buffer = vec![0usize; words];
        unsafe { T::construct(NonNull::new_unchecked(buffer.as_mut_ptr() as *mut u8), init) }
    }

    #[test]
    fn default_cell_is_int_zero() {
        let cell = Cell::default();
        assert!(cell.is_int());
        assert_eq!(cell.get_int(), 0);
        assert_eq!(cell.raw(), 0);
    }

    #[test]
    fn int_round_trip() {
        for value in [0, 1, -1, 42, -12345, CELL_INT_MAX, CELL_INT_MIN] {
            let cell = Cell::from_int(value);
            assert!(cell.is_int());
            assert!(!cell.is_object());
            assert_eq!(cell.get_int(), value);
            assert_eq!(cell.as_int(), Some(value));
        }
    }

    #[test]
    fn int_wraps_at_payload_boundary() {
        assert_eq!(Cell::from_int(CELL_INT_MAX + 1).get_int(), CELL_INT_MIN);
        assert_eq!(Cell::from_int(CELL_INT_MIN - 1).get_int(), CELL_INT_MAX);
    }

    #[test]
    fn typed_nulls_differ_per_kind() {
        let null_array = Cell::null::<Array>();
        let null_string = Cell::null::<ByteString>();
        assert!(null_array.is_null());
        assert!(null_string.is_null());
        assert_ne!(null_array, null_string);
        assert!(null_array.is_a::<Array>());
        assert!(!null_array.is_a::<ByteString>());
        assert_eq!(null_array.tag(), Some(ObjectTag::Array));
        assert_eq!(null_string.kind_name(), "string");
    }

    #[test]
    fn objects_compare_by_identity() {
        let (mut first, mut second) = (Vec::new(), Vec::new());
        let a = Cell::from_object(construct::<Array>(&mut first, 2));
        let b = Cell::from_object(construct::<Array>(&mut second, 2));
        assert_ne!(a, b);
        assert_eq!(a, Cell::from_raw(a.raw()));
    }

    #[test]
    fn equal_strings_are_distinct_cells() {
        let (mut first, mut second) = (Vec::new(), Vec::new());
        let a = construct::<ByteString>(&mut first, b"same".to_vec());
        let b = construct::<ByteString>(&mut second, b"same".to_vec());
        assert_eq!(a.as_bytes(), b.as_bytes());
        assert_ne!(Cell::from_object(a), Cell::from_object(b));
        assert_eq!(Cell::from_object(a), Cell::from_object(a));
        assert_ne!(Cell::null::<ByteString>(), Cell::null::<Array>());
    }

    #[test]
    fn is_a_checks_header_tag() {
        let mut buffer = Vec::new();
        let record = construct::<Record>(&mut buffer, 1);
        let cell = Cell::from_object(record);
        assert!(cell.is_a::<Record>());
        assert!(!cell.is_a::<Array>());

        // an array primary tag on a record header
        let lying = Cell::from_raw(cell.address() | ObjectTag::Array.cell_tag());
        assert!(!lying.is_a::<Array>());
        assert!(lying.try_cast::<Array>().is_none());
    }

    #[test]
    fn from_header_recovers_kind() {
        let (mut a, mut b, mut c) = (Vec::new(), Vec::new(), Vec::new());
        let word = construct::<Word>(&mut a, false);
        let wrapper = construct::<Wrapper>(&mut b, ());
        let quote = construct::<Quotation>(&mut c, None);
        unsafe {
            assert_eq!(Cell::from_header(word.ptr as *mut Header), Cell::from_object(word));
            assert_eq!(Cell::from_header(wrapper.ptr as *mut Header).tag(), Some(ObjectTag::Wrapper));
            assert_eq!(Cell::from_header(quote.ptr as *mut Header).kind_name(), "quotation");
        }
    }

    #[test]
    #[should_panic(expected = "expected an integer")]
    fn get_int_rejects_objects() {
        Cell::null::<Word>().get_int();
    }
}
