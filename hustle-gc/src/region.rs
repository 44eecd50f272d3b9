use crate::error::GcError;
use crate::memory::MemorySegment;
use hustle_value::cell::OBJECT_ALIGNMENT;
use std::ptr::NonNull;

/// A bump allocator over one semispace.
pub struct Region {
    memory: MemorySegment,
    /// Offset of the next free byte.
    top: usize,
}

impl Region {
    pub fn new(size: usize) -> Result<Self, GcError> {
        Ok(Region {
            memory: MemorySegment::allocate(size)?,
            top: 0,
        })
    }

    /// Hands out `size` bytes, or `None` if that would not leave at least one byte free.
    pub fn allocate(&mut self, size: usize) -> Option<NonNull<u8>> {
        debug_assert_eq!(size % OBJECT_ALIGNMENT, 0, "unaligned allocation of {} bytes", size);
        if size >= self.bytes_free() {
            return None;
        }
        let ptr = unsafe { self.memory.start().add(self.top) };
        self.top += size;
        NonNull::new(ptr)
    }

    pub fn bytes_free(&self) -> usize {
        self.memory.size() - self.top
    }

    pub fn bytes_used(&self) -> usize {
        self.top
    }

    pub fn size(&self) -> usize {
        self.memory.size()
    }

    pub fn start(&self) -> *mut u8 {
        self.memory.start()
    }

    /// Whether `ptr` falls within the allocated part of this region.
    pub fn contains(&self, ptr: *const u8) -> bool {
        let start = self.memory.start() as *const u8;
        ptr >= start && ptr < unsafe { start.add(self.top) }
    }

    /// Zeroes everything handed out so far and starts over.
    pub fn reset(&mut self) {
        unsafe { std::ptr::write_bytes(self.memory.start(), 0, self.top) };
        self.top = 0;
    }
}
