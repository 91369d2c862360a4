/// Allocates and recycles `u32` slot indices, each tagged with a generation.
///
/// Backs the bindless registry: a slot index is a position in a descriptor
/// array, and the generation tells a live handle apart from one whose slot
/// was freed (and possibly reused) since it was issued.
/// Freed indices are recycled LIFO before fresh ones are handed out.
///
/// # Example
///
/// ```ignore
/// let mut slots = SlotAllocator::new(16);
/// let a = slots.alloc().unwrap();   // index 0, generation 0
/// slots.free(a);                    // index 0 now at generation 1
/// let b = slots.alloc().unwrap();   // index 0, generation 1
/// assert!(!slots.is_live(a));
/// ```
pub struct SlotAllocator {
    free_list: Vec<u32>,
    generations: Vec<u32>,
    occupied: Vec<bool>,
    capacity: u32,
    len: u32,
}

/// An allocated slot: index plus the generation it was issued at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot {
    pub index: u32,
    pub generation: u32,
}

impl SlotAllocator {
    /// Create an empty allocator holding at most `capacity` live slots
    pub fn new(capacity: u32) -> Self {
        Self {
            free_list: Vec::new(),
            generations: Vec::new(),
            occupied: Vec::new(),
            capacity,
            len: 0,
        }
    }

    /// Allocate a slot, recycling the most recently freed index first
    ///
    /// Returns None when every index below `capacity` is live.
    pub fn alloc(&mut self) -> Option<Slot> {
        let index = match self.free_list.pop() {
            Some(index) => index,
            None => {
                let index = self.high_water_mark();
                if index >= self.capacity {
                    return None;
                }
                self.generations.push(0);
                self.occupied.push(false);
                index
            }
        };
        self.occupied[index as usize] = true;
        self.len += 1;
        Some(Slot { index, generation: self.generations[index as usize] })
    }

    /// Return a slot for reuse and bump its generation
    ///
    /// Returns false (and changes nothing) when `slot` is not live.
    pub fn free(&mut self, slot: Slot) -> bool {
        if !self.is_live(slot) {
            return false;
        }
        let i = slot.index as usize;
        self.occupied[i] = false;
        self.generations[i] = self.generations[i].wrapping_add(1);
        self.free_list.push(slot.index);
        self.len -= 1;
        true
    }

    /// Whether `slot` was issued by this allocator and not freed since
    pub fn is_live(&self, slot: Slot) -> bool {
        let i = slot.index as usize;
        i < self.occupied.len() && self.occupied[i] && self.generations[i] == slot.generation
    }

    /// Highest index ever allocated + 1.
    ///
    /// This is the minimum size the backing descriptor array must have
    /// to cover all allocated indices.
    pub fn high_water_mark(&self) -> u32 {
        self.generations.len() as u32
    }

    /// Maximum number of live slots
    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// Number of currently allocated slots
    pub fn len(&self) -> u32 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
#[path = "slot_allocator_tests.rs"]
mod tests;
