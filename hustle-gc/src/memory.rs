//! Raw memory for the semispaces.

use crate::error::GcError;
#[cfg(not(unix))]
use hustle_value::cell::OBJECT_ALIGNMENT;
use std::ptr::NonNull;

/// A zero-initialised block of memory owned by the heap, released on drop.
pub struct MemorySegment {
    base: NonNull<u8>,
    size: usize,
}

impl MemorySegment {
    #[cfg(unix)]
    pub fn allocate(size: usize) -> Result<Self, GcError> {
        if size == 0 {
            return Err(GcError::InvalidConfig("region size must be > 0"));
        }
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                size,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANONYMOUS,
                -1,
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(GcError::RegionMapFailed {
                size,
                reason: std::io::Error::last_os_error().to_string(),
            });
        }
        match NonNull::new(ptr as *mut u8) {
            Some(base) => Ok(MemorySegment { base, size }),
            None => Err(GcError::RegionMapFailed {
                size,
                reason: "mmap returned a null mapping".to_string(),
            }),
        }
    }

    #[cfg(not(unix))]
    pub fn allocate(size: usize) -> Result<Self, GcError> {
        if size == 0 {
            return Err(GcError::InvalidConfig("region size must be > 0"));
        }
        let layout = Self::layout(size)?;
        let ptr = unsafe { std::alloc::alloc_zeroed(layout) };
        match NonNull::new(ptr) {
            Some(base) => Ok(MemorySegment { base, size }),
            None => Err(GcError::RegionMapFailed {
                size,
                reason: "allocator returned null".to_string(),
            }),
        }
    }

    #[cfg(not(unix))]
    fn layout(size: usize) -> Result<std::alloc::Layout, GcError> {
        std::alloc::Layout::from_size_align(size, OBJECT_ALIGNMENT).map_err(|_| GcError::InvalidConfig("region size overflows"))
    }

    pub fn start(&self) -> *mut u8 {
        self.base.as_ptr()
    }

    pub fn end(&self) -> *mut u8 {
        unsafe { self.base.as_ptr().add(self.size) }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn contains(&self, ptr: *const u8) -> bool {
        (self.start() as *const u8..self.end() as *const u8).contains(&ptr)
    }
}

impl Drop for MemorySegment {
    #[cfg(unix)]
    fn drop(&mut self) {
        let result = unsafe { libc::munmap(self.base.as_ptr() as *mut libc::c_void, self.size) };
        if result != 0 {
            log::warn!("munmap of {} bytes at {:p} failed", self.size, self.base);
        }
    }

    #[cfg(not(unix))]
    fn drop(&mut self) {
        if let Ok(layout) = Self::layout(self.size) {
            unsafe { std::alloc::dealloc(self.base.as_ptr(), layout) }
        }
    }
}

