//! Heap object layouts.
//!
//! Every object starts with a [`Header`] and is laid out `#[repr(C)]`, so a pointer to any object
//! is also a valid pointer to its header. Variable-sized kinds keep their payload directly after
//! the fixed part.

use crate::cell::{Cell, OBJECT_ALIGNMENT};
use crate::gcref::Gc;
use crate::header::Header;
use crate::typed_cell::TypedCell;
use std::borrow::Cow;
use std::ptr::NonNull;

/// The kind of a heap object, as stored in its header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ObjectTag {
    Array = 0,
    String = 1,
    Quote = 2,
    Record = 3,
    Word = 4,
    Wrapper = 5,
}

impl ObjectTag {
    pub const ALL: [ObjectTag; 6] = [
        ObjectTag::Array,
        ObjectTag::String,
        ObjectTag::Quote,
        ObjectTag::Record,
        ObjectTag::Word,
        ObjectTag::Wrapper,
    ];

    /// The primary tag used by cells pointing to objects of this kind. Zero is left for integers.
    #[inline(always)]
    pub const fn cell_tag(self) -> usize {
        self as usize + 1
    }

    pub fn from_cell_tag(tag: usize) -> Option<Self> {
        match tag {
            0 => None,
            tag => Self::from_bits(tag - 1),
        }
    }

    pub fn from_bits(bits: usize) -> Option<Self> {
        Self::ALL.get(bits).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            ObjectTag::Array => "array",
            ObjectTag::String => "string",
            ObjectTag::Quote => "quotation",
            ObjectTag::Record => "record",
            ObjectTag::Word => "word",
            ObjectTag::Wrapper => "wrapper",
        }
    }
}

/// Implemented by every object layout. Links the Rust type to the tag in its header.
pub trait HeapKind: Sized {
    const TAG: ObjectTag;
}

/// Placement construction of an object into freshly allocated memory.
///
/// `Init` never contains cells: anything referencing the heap must be stored after the allocation,
/// since allocating may move every other object.
pub trait Construct: HeapKind {
    type Init;

    /// Total size in bytes, header included, rounded up to the object alignment.
    fn allocation_size(init: &Self::Init) -> usize;

    /// # Safety
    /// `mem` must be aligned to `OBJECT_ALIGNMENT` and valid for writes of
    /// `allocation_size(&init)` bytes.
    unsafe fn construct(mem: NonNull<u8>, init: Self::Init) -> Gc<Self>;
}

pub const fn align_object_size(size: usize) -> usize {
    (size + OBJECT_ALIGNMENT - 1) & !(OBJECT_ALIGNMENT - 1)
}

/// Index of a native function in the interpreter's primitive table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct PrimitiveId(u32);

impl PrimitiveId {
    pub fn new(index: usize) -> Self {
        match u32::try_from(index) {
            Ok(index) => PrimitiveId(index),
            Err(_) => panic!("primitive index {} out of range", index),
        }
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Writes `count` zero cells after the fixed part of an object.
unsafe fn clear_slots<T>(object: *mut T, count: usize) {
    let slots = object.add(1) as *mut Cell;
    for i in 0..count {
        slots.add(i).write(Cell::default());
    }
}

unsafe fn trailing_slots<'a, T>(object: *const T, count: usize) -> &'a [Cell] {
    std::slice::from_raw_parts(object.add(1) as *const Cell, count)
}

unsafe fn trailing_slots_mut<'a, T>(object: *mut T, count: usize) -> &'a mut [Cell] {
    std::slice::from_raw_parts_mut(object.add(1) as *mut Cell, count)
}

/// Views every word after the header of an arbitrary object as a cell.
///
/// # Safety
/// `header` must point to a live object. String bytes are exposed raw; every other kind stores
/// only cells after its header.
pub unsafe fn raw_slots<'a>(header: *mut Header) -> &'a mut [Cell] {
    let count = (*header).slot_count();
    trailing_slots_mut(header, count)
}

/// A fixed-length sequence of cells.
#[repr(C)]
pub struct Array {
    header: Header,
}

impl HeapKind for Array {
    const TAG: ObjectTag = ObjectTag::Array;
}

impl Construct for Array {
    /// Number of elements, all initialised to the integer `0`.
    type Init = usize;

    fn allocation_size(count: &usize) -> usize {
        align_object_size(size_of::<Array>() + count * size_of::<Cell>())
    }

    unsafe fn construct(mem: NonNull<u8>, count: usize) -> Gc<Self> {
        let ptr = mem.as_ptr() as *mut Array;
        ptr.write(Array {
            header: Header::new(ObjectTag::Array, Self::allocation_size(&count)),
        });
        clear_slots(ptr, count);
        Gc::from_raw(ptr)
    }
}

impl Array {
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn len(&self) -> usize {
        self.header.slot_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn as_slice(&self) -> &[Cell] {
        unsafe { trailing_slots(self as *const Array, self.len()) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [Cell] {
        let len = self.len();
        unsafe { trailing_slots_mut(self as *mut Array, len) }
    }

    pub fn get(&self, index: usize) -> Cell {
        self.as_slice()[index]
    }

    pub fn set(&mut self, index: usize, cell: Cell) {
        self.as_mut_slice()[index] = cell;
    }
}

/// A length-prefixed byte string, always followed by at least one NUL byte.
#[repr(C)]
pub struct ByteString {
    header: Header,
    length: Cell,
}

impl HeapKind for ByteString {
    const TAG: ObjectTag = ObjectTag::String;
}

impl Construct for ByteString {
    type Init = Vec<u8>;

    fn allocation_size(bytes: &Vec<u8>) -> usize {
        align_object_size(size_of::<ByteString>() + bytes.len() + 1)
    }

    unsafe fn construct(mem: NonNull<u8>, bytes: Vec<u8>) -> Gc<Self> {
        let size = Self::allocation_size(&bytes);
        let ptr = mem.as_ptr() as *mut ByteString;
        ptr.write(ByteString {
            header: Header::new(ObjectTag::String, size),
            length: Cell::from_int(bytes.len() as isize),
        });
        let data = ptr.add(1) as *mut u8;
        std::ptr::copy_nonoverlapping(bytes.as_ptr(), data, bytes.len());
        std::ptr::write_bytes(data.add(bytes.len()), 0, size - size_of::<ByteString>() - bytes.len());
        Gc::from_raw(ptr)
    }
}

impl ByteString {
    pub fn len(&self) -> usize {
        self.length.get_int() as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes available for content, the terminating NUL excluded.
    pub fn capacity(&self) -> usize {
        self.header.size() - size_of::<ByteString>() - 1
    }

    pub fn as_bytes(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts((self as *const ByteString).add(1) as *const u8, self.len()) }
    }

    pub fn to_str_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(self.as_bytes())
    }
}

/// Executable code: a definition array, optionally backed by a native primitive.
#[repr(C)]
pub struct Quotation {
    header: Header,
    pub definition: TypedCell<Array>,
    /// Integer zero when interpreted, otherwise the primitive index plus one. Kept as an int
    /// cell so that raw slot reads never see a pointer tag.
    entry: Cell,
}

impl HeapKind for Quotation {
    const TAG: ObjectTag = ObjectTag::Quote;
}

impl Construct for Quotation {
    type Init = Option<PrimitiveId>;

    fn allocation_size(_: &Option<PrimitiveId>) -> usize {
        align_object_size(size_of::<Quotation>())
    }

    unsafe fn construct(mem: NonNull<u8>, entry: Option<PrimitiveId>) -> Gc<Self> {
        let ptr = mem.as_ptr() as *mut Quotation;
        ptr.write(Quotation {
            header: Header::new(ObjectTag::Quote, Self::allocation_size(&entry)),
            definition: TypedCell::null(),
            entry: Cell::from_int(0),
        });
        (*ptr).set_entry(entry);
        Gc::from_raw(ptr)
    }
}

impl Quotation {
    pub fn entry(&self) -> Option<PrimitiveId> {
        match self.entry.get_int() {
            0 => None,
            entry => Some(PrimitiveId::new(entry as usize - 1)),
        }
    }

    pub fn set_entry(&mut self, entry: Option<PrimitiveId>) {
        self.entry = Cell::from_int(entry.map_or(0, |id| id.index() as isize + 1));
    }

    pub fn is_primitive(&self) -> bool {
        self.entry != Cell::from_int(0)
    }
}

/// A named binding in the symbol table.
#[repr(C)]
pub struct Word {
    header: Header,
    pub name: TypedCell<ByteString>,
    pub definition: TypedCell<Quotation>,
    /// Free-form metadata, unused by the interpreter itself.
    pub properties: Cell,
    /// Integer cell, zero or one.
    parse_word: Cell,
}

impl HeapKind for Word {
    const TAG: ObjectTag = ObjectTag::Word;
}

impl Construct for Word {
    /// Whether the reader should execute the word while parsing.
    type Init = bool;

    fn allocation_size(_: &bool) -> usize {
        align_object_size(size_of::<Word>())
    }

    unsafe fn construct(mem: NonNull<u8>, is_parse_word: bool) -> Gc<Self> {
        let ptr = mem.as_ptr() as *mut Word;
        ptr.write(Word {
            header: Header::new(ObjectTag::Word, Self::allocation_size(&is_parse_word)),
            name: TypedCell::null(),
            definition: TypedCell::null(),
            properties: Cell::default(),
            parse_word: Cell::from_int(is_parse_word as isize),
        });
        Gc::from_raw(ptr)
    }
}

impl Word {
    pub fn is_parse_word(&self) -> bool {
        self.parse_word != Cell::from_int(0)
    }

    pub fn set_parse_word(&mut self, is_parse_word: bool) {
        self.parse_word = Cell::from_int(is_parse_word as isize);
    }

    /// The word's name, or `None` for anonymous words.
    pub fn name_str(&self) -> Option<Cow<'_, str>> {
        match self.name.is_null() {
            true => None,
            false => {
                let name = self.name.get();
                // SAFETY: the string outlives this borrow of the word as long as no allocation happens
                let name: &ByteString = unsafe { &*name.ptr };
                Some(name.to_str_lossy())
            }
        }
    }
}

/// Quotes a value so that evaluating it pushes the value instead of calling it.
#[repr(C)]
pub struct Wrapper {
    header: Header,
    pub wrapped: Cell,
}

impl HeapKind for Wrapper {
    const TAG: ObjectTag = ObjectTag::Wrapper;
}

impl Construct for Wrapper {
    type Init = ();

    fn allocation_size(_: &()) -> usize {
        align_object_size(size_of::<Wrapper>())
    }

    unsafe fn construct(mem: NonNull<u8>, _: ()) -> Gc<Self> {
        let ptr = mem.as_ptr() as *mut Wrapper;
        ptr.write(Wrapper {
            header: Header::new(ObjectTag::Wrapper, Self::allocation_size(&())),
            wrapped: Cell::default(),
        });
        Gc::from_raw(ptr)
    }
}

/// A fixed number of untyped slots.
#[repr(C)]
pub struct Record {
    header: Header,
}

impl HeapKind for Record {
    const TAG: ObjectTag = ObjectTag::Record;
}

impl Construct for Record {
    type Init = usize;

    fn allocation_size(slots: &usize) -> usize {
        align_object_size(size_of::<Record>() + slots * size_of::<Cell>())
    }

    unsafe fn construct(mem: NonNull<u8>, slots: usize) -> Gc<Self> {
        let ptr = mem.as_ptr() as *mut Record;
        ptr.write(Record {
            header: Header::new(ObjectTag::Record, Self::allocation_size(&slots)),
        });
        clear_slots(ptr, slots);
        Gc::from_raw(ptr)
    }
}

impl Record {
    pub fn slot_count(&self) -> usize {
        self.header.slot_count()
    }

    pub fn slots(&self) -> &[Cell] {
        unsafe { trailing_slots(self as *const Record, self.slot_count()) }
    }

    pub fn slots_mut(&mut self) -> &mut [Cell] {
        let count = self.slot_count();
        unsafe { trailing_slots_mut(self as *mut Record, count) }
    }
}

static_assertions::const_assert_eq!(size_of::<Array>() % OBJECT_ALIGNMENT, 0);
static_assertions::const_assert_eq!(size_of::<ByteString>() % OBJECT_ALIGNMENT, 0);
static_assertions::const_assert_eq!(size_of::<Quotation>(), 3 * size_of::<Cell>());
static_assertions::const_assert_eq!(size_of::<Word>(), 5 * size_of::<Cell>());
static_assertions::const_assert_eq!(size_of::<Wrapper>(), 2 * size_of::<Cell>());
static_assertions::const_assert_eq!(size_of::<Record>(), size_of::<Header>());
