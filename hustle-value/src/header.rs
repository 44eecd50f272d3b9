use crate::cell::Cell;
use crate::object::ObjectTag;
use std::fmt::{Debug, Formatter};

const FORWARDING_BIT: usize = 0b1;
const TAG_SHIFT: usize = 1;
const TAG_FIELD_MASK: usize = 0xff;
const SIZE_SHIFT: usize = 10;

/// Largest total object size (header included) a header can describe.
pub const MAX_OBJECT_SIZE: usize = usize::MAX >> SIZE_SHIFT;

/// The word at the start of every heap object.
///
/// Layout: bit 0 is the forwarding flag, bits 1..=8 the object tag, bits 10.. the total size in
/// bytes. Once forwarded, the whole word except bit 0 is the address of the copy.
#[repr(C)]
pub struct Header {
    word: usize,
}

static_assertions::assert_eq_size!(Header, Cell);

/// Decoded view of a header word.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HeaderState {
    Live { tag: ObjectTag, size: usize },
    Forwarded(*mut Header),
}

impl Header {
    pub fn new(tag: ObjectTag, size: usize) -> Self {
        assert!(size <= MAX_OBJECT_SIZE, "object of {} bytes is too large", size);
        Header {
            word: (size << SIZE_SHIFT) | ((tag as usize) << TAG_SHIFT),
        }
    }

    #[inline(always)]
    pub fn is_forwarding(&self) -> bool {
        self.word & FORWARDING_BIT != 0
    }

    pub fn state(&self) -> HeaderState {
        match self.is_forwarding() {
            true => HeaderState::Forwarded(self.forwarding()),
            false => HeaderState::Live {
                tag: self.tag(),
                size: self.size(),
            },
        }
    }

    pub fn tag(&self) -> ObjectTag {
        debug_assert!(!self.is_forwarding(), "reading the tag of a forwarded object");
        let bits = (self.word >> TAG_SHIFT) & TAG_FIELD_MASK;
        match ObjectTag::from_bits(bits) {
            Some(tag) => tag,
            None => panic!("corrupt object header {:#x}", self.word),
        }
    }

    /// Total size in bytes, header included.
    pub fn size(&self) -> usize {
        debug_assert!(!self.is_forwarding(), "reading the size of a forwarded object");
        self.word >> SIZE_SHIFT
    }

    /// Number of word-sized slots following the header.
    pub fn slot_count(&self) -> usize {
        (self.size() - size_of::<Header>()) / size_of::<Cell>()
    }

    pub fn forwarding(&self) -> *mut Header {
        assert!(self.is_forwarding(), "object has not been forwarded");
        (self.word & !FORWARDING_BIT) as *mut Header
    }

    /// Records where this object was copied to. Its tag and size are lost.
    pub fn forward_to(&mut self, target: *mut Header) {
        assert!(!self.is_forwarding(), "object forwarded twice");
        debug_assert_eq!(target as usize & FORWARDING_BIT, 0);
        self.word = target as usize | FORWARDING_BIT;
    }

    pub fn raw(&self) -> usize {
        self.word
    }
}

impl Debug for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.state() {
            HeaderState::Live { tag, size } => write!(f, "Header({}, {} bytes)", tag.name(), size),
            HeaderState::Forwarded(to) => write!(f, "Header(forwarded to {:p})", to),
        }
    }
}
