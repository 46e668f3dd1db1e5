use std::sync::atomic::{AtomicUsize, Ordering};

// Past this many owners an increment aborts instead of risking a wrap to zero.
const MAX_REFCOUNT: usize = isize::MAX as usize;

/// Number of live handles sharing one allocation.
#[repr(align(64))]
pub struct RefCount {
    value: AtomicUsize,
}

impl RefCount {
    /// A fresh counter owned by exactly one handle.
    pub fn new() -> Self {
        RefCount {
            value: AtomicUsize::new(1),
        }
    }

    pub fn get(&self) -> usize {
        self.value.load(Ordering::Acquire)
    }

    /// Registers one more owner. The caller must already be an owner.
    pub fn increment(&self) {
        let previous = self.value.fetch_add(1, Ordering::Relaxed);
        if previous > MAX_REFCOUNT {
            std::process::abort();
        }
    }

    /// Drops one owner and returns `true` if it was the last one.
    pub fn decrement(&self) -> bool {
        self.value.fetch_sub(1, Ordering::AcqRel) == 1
    }

    /// Moves the count from 1 to 0 if the caller is the only owner.
    pub fn try_claim(&self) -> bool {
        self.value
            .compare_exchange(1, 0, Ordering::AcqRel, Ordering::Relaxed)
            .is_ok()
    }
}

impl Default for RefCount {
    fn default() -> Self {
        Self::new()
    }
}
