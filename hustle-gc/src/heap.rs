use crate::error::GcError;
use crate::region::Region;
use crate::roots::MarkRoots;
use crate::scanning::visit_fields;
use hustle_value::header::HeaderState;
use hustle_value::object::align_object_size;
use hustle_value::{Cell, Construct, Gc, Header};
use log::{debug, trace, warn};
use std::ptr::NonNull;

/// Default size of each of the two semispaces.
pub const DEFAULT_REGION_SIZE: usize = 16 * 1024 * 1024;

/// Default amount of free space below which an allocation collects first.
pub const DEFAULT_LOW_SPACE_THRESHOLD: usize = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeapConfig {
    /// Size in bytes of each semispace. The heap maps twice this amount.
    pub region_size: usize,
    /// Collect before allocating when less than this many bytes are free.
    pub low_space_threshold: usize,
    /// Collect on every allocation. Slow, but shakes out missing roots.
    pub stress: bool,
}

impl Default for HeapConfig {
    fn default() -> Self {
        Self {
            region_size: DEFAULT_REGION_SIZE,
            low_space_threshold: DEFAULT_LOW_SPACE_THRESHOLD,
            stress: false,
        }
    }
}

impl HeapConfig {
    fn validate(&self) -> Result<(), GcError> {
        if self.region_size == 0 {
            return Err(GcError::InvalidConfig("region size must be > 0"));
        }
        if self.region_size % hustle_value::cell::OBJECT_ALIGNMENT != 0 {
            return Err(GcError::InvalidConfig("region size must be a multiple of the object alignment"));
        }
        if self.low_space_threshold >= self.region_size {
            return Err(GcError::InvalidConfig("low space threshold must be smaller than the region size"));
        }
        Ok(())
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct HeapStats {
    pub collections: usize,
    pub bytes_used: usize,
    pub bytes_free: usize,
    /// Bytes copied by the most recent collection.
    pub last_survivor_bytes: usize,
    /// Objects copied by the most recent collection.
    pub last_survivor_objects: usize,
}

/// Two equally sized regions, one of which is active at a time.
pub struct Heap {
    regions: [Region; 2],
    active: usize,
    config: HeapConfig,
    collecting: bool,
    collections: usize,
    last_survivor_bytes: usize,
    last_survivor_objects: usize,
}

impl Heap {
    pub fn new(config: HeapConfig) -> Result<Self, GcError> {
        config.validate()?;
        debug!("mapping two regions of {} bytes", config.region_size);
        Ok(Heap {
            regions: [Region::new(config.region_size)?, Region::new(config.region_size)?],
            active: 0,
            config,
            collecting: false,
            collections: 0,
            last_survivor_bytes: 0,
            last_survivor_objects: 0,
        })
    }

    pub fn config(&self) -> &HeapConfig {
        &self.config
    }

    pub fn set_stress(&mut self, stress: bool) {
        self.config.stress = stress;
    }

    fn stress(&self) -> bool {
        self.config.stress || cfg!(feature = "stress_test")
    }

    fn active_region(&self) -> &Region {
        &self.regions[self.active]
    }

    /// Bump-allocates `size` bytes (rounded up to the object alignment) in the active region.
    ///
    /// Collects first if the region is running low. Every object not reachable from `roots` is
    /// freed by that, and every `Gc` pointer not held in a root is invalidated.
    pub fn allocate(&mut self, size: usize, roots: &mut dyn MarkRoots) -> Result<NonNull<u8>, GcError> {
        assert!(!self.collecting, "allocation requested while a collection is running");
        let size = align_object_size(size);

        let free = self.active_region().bytes_free();
        if self.stress() || free < self.config.low_space_threshold || free <= size {
            self.collect(roots);
        }

        let region = &mut self.regions[self.active];
        region.allocate(size).ok_or_else(|| {
            warn!("out of memory allocating {} bytes", size);
            GcError::OutOfMemory {
                requested: size,
                available: region.bytes_free(),
            }
        })
    }

    /// Allocates and constructs an object of kind `T`.
    pub fn allocate_object<T: Construct>(&mut self, init: T::Init, roots: &mut dyn MarkRoots) -> Result<Gc<T>, GcError> {
        let memory = self.allocate(T::allocation_size(&init), roots)?;
        Ok(unsafe { T::construct(memory, init) })
    }

    /// Copies everything reachable from `roots` to the inactive region and makes it active.
    pub fn collect(&mut self, roots: &mut dyn MarkRoots) {
        assert!(!self.collecting, "collection requested while one is already running");
        self.collecting = true;
        let used_before = self.bytes_used();

        let [first, second] = &mut self.regions;
        let (from, to) = match self.active {
            0 => (first, second),
            _ => (second, first),
        };
        debug_assert_eq!(to.bytes_used(), 0, "inactive region is not empty");

        let mut evacuator = Evacuator {
            from,
            to,
            work: Vec::new(),
            copied_bytes: 0,
            copied_objects: 0,
        };
        roots.mark_roots(&mut |cell: &mut Cell| evacuator.evacuate(cell));
        while let Some(object) = evacuator.work.pop() {
            unsafe { visit_fields(object, &mut |cell: &mut Cell| evacuator.evacuate(cell)) };
        }
        let (copied_bytes, copied_objects) = (evacuator.copied_bytes, evacuator.copied_objects);
        evacuator.from.reset();

        self.active ^= 1;
        self.collections += 1;
        self.last_survivor_bytes = copied_bytes;
        self.last_survivor_objects = copied_objects;
        self.collecting = false;
        debug!(
            "collection #{}: {} objects ({} bytes) survived, {} bytes freed",
            self.collections,
            copied_objects,
            copied_bytes,
            used_before - copied_bytes
        );
    }

    pub fn is_collecting(&self) -> bool {
        self.collecting
    }

    /// Whether `ptr` points into the allocated part of the active region.
    pub fn contains(&self, ptr: *const u8) -> bool {
        self.active_region().contains(ptr)
    }

    pub fn collections(&self) -> usize {
        self.collections
    }

    pub fn bytes_used(&self) -> usize {
        self.active_region().bytes_used()
    }

    pub fn bytes_free(&self) -> usize {
        self.active_region().bytes_free()
    }

    pub fn stats(&self) -> HeapStats {
        HeapStats {
            collections: self.collections,
            bytes_used: self.bytes_used(),
            bytes_free: self.bytes_free(),
            last_survivor_bytes: self.last_survivor_bytes,
            last_survivor_objects: self.last_survivor_objects,
        }
    }

    /// Walks every object in the active region, in allocation order.
    pub fn for_each_object(&self, mut f: impl FnMut(Cell)) {
        let region = self.active_region();
        let mut offset = 0;
        while offset < region.bytes_used() {
            let header = unsafe { region.start().add(offset) } as *mut Header;
            let size = unsafe { (*header).size() };
            f(unsafe { Cell::from_header(header) });
            offset += size;
        }
    }
}

struct Evacuator<'a> {
    from: &'a mut Region,
    to: &'a mut Region,
    work: Vec<*mut Header>,
    copied_bytes: usize,
    copied_objects: usize,
}

impl Evacuator<'_> {
    /// Copies the object `cell` points to, unless already copied, and updates `cell`.
    fn evacuate(&mut self, cell: &mut Cell) {
        if !cell.is_object() || cell.is_null() {
            return;
        }
        let object = cell.object_ptr();
        if !self.from.contains(object as *const u8) {
            return;
        }

        let target = match unsafe { (*object).state() } {
            HeaderState::Forwarded(target) => target,
            HeaderState::Live { tag, size } => {
                let memory = match self.to.allocate(size) {
                    Some(memory) => memory,
                    None => panic!("no room left to copy a {} of {} bytes", tag.name(), size),
                };
                let copy = memory.as_ptr() as *mut Header;
                unsafe {
                    std::ptr::copy_nonoverlapping(object as *const u8, copy as *mut u8, size);
                    (*object).forward_to(copy);
                }
                trace!("copied {} {:p} -> {:p}", tag.name(), object, copy);
                self.work.push(copy);
                self.copied_bytes += size;
                self.copied_objects += 1;
                copy
            }
        };
        *cell = cell.with_address(target);
    }
}
