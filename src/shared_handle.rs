//! Atomically reference-counted handle with an explicit empty state.
//!
//! The value and its reference count live in two separate heap allocations, so
//! [`SharedHandle::as_ptr`] always reports the exact pointer the handle was
//! built from. Both are freed by whichever owner takes the count from 1 to 0.

use std::{
    fmt,
    marker::PhantomData,
    mem,
    ops::Deref,
    ptr::{self, NonNull},
};

use log::trace;

use crate::{HandleError, RefCount, Result};

struct Shared<T> {
    value: NonNull<T>,
    count: NonNull<RefCount>,
}

impl<T> Clone for Shared<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Shared<T> {}

impl<T> Shared<T> {
    fn count(&self) -> &RefCount {
        unsafe { self.count.as_ref() }
    }

    fn value(&self) -> &T {
        unsafe { self.value.as_ref() }
    }
}

pub struct SharedHandle<T> {
    shared: Option<Shared<T>>,
    _owns: PhantomData<T>,
}

// Moving a handle may drop `T` on another thread, and sharing one hands out `&T`.
unsafe impl<T: Send + Sync> Send for SharedHandle<T> {}
unsafe impl<T: Send + Sync> Sync for SharedHandle<T> {}

impl<T> SharedHandle<T> {
    /// A handle that owns nothing. Does not allocate.
    pub const fn empty() -> Self {
        SharedHandle {
            shared: None,
            _owns: PhantomData,
        }
    }

    pub fn new(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Takes ownership of `value` and starts a new count at 1.
    pub fn from_box(value: Box<T>) -> Self {
        let value = NonNull::from(Box::leak(value));
        let count = NonNull::from(Box::leak(Box::new(RefCount::new())));
        trace!("allocated ref count {:p} for {:p}", count, value);

        SharedHandle {
            shared: Some(Shared { value, count }),
            _owns: PhantomData,
        }
    }

    /// Takes ownership of a pointer obtained from [`Box::into_raw`].
    ///
    /// A null `ptr` is rejected with [`HandleError::NullPointer`] and nothing
    /// is allocated.
    ///
    /// # Safety
    ///
    /// A non-null `ptr` must come from `Box::<T>::into_raw` and must not be
    /// used or freed by the caller afterwards.
    pub unsafe fn from_raw(ptr: *mut T) -> Result<Self> {
        if ptr.is_null() {
            return Err(HandleError::NullPointer);
        }
        Ok(Self::from_box(unsafe { Box::from_raw(ptr) }))
    }

    // Everything past construction is an associated function so that method
    // calls through `Deref` always reach `T`.

    pub fn is_empty(this: &Self) -> bool {
        this.shared.is_none()
    }

    pub fn is_occupied(this: &Self) -> bool {
        this.shared.is_some()
    }

    pub fn get(this: &Self) -> Option<&T> {
        this.shared.as_ref().map(|shared| shared.value())
    }

    pub fn try_deref(this: &Self) -> Result<&T> {
        Self::get(this).ok_or(HandleError::NullDereference)
    }

    /// Raw pointer to the owned value, or null when empty. Ownership stays
    /// with the handle.
    pub fn as_ptr(this: &Self) -> *const T {
        match &this.shared {
            Some(shared) => shared.value.as_ptr().cast_const(),
            None => ptr::null(),
        }
    }

    /// Number of handles sharing this value, 0 when empty.
    ///
    /// Other owners may change it at any moment; use it for diagnostics only.
    pub fn use_count(this: &Self) -> usize {
        this.shared
            .as_ref()
            .map_or(0, |shared| shared.count().get())
    }

    /// Whether both handles share one allocation. Two empty handles compare equal.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.shared.map(|shared| shared.count) == other.shared.map(|shared| shared.count)
    }

    /// Moves ownership out, leaving `this` empty. The count is unchanged.
    pub fn take(this: &mut Self) -> Self {
        mem::take(this)
    }

    /// Releases ownership and leaves the handle empty.
    pub fn reset(this: &mut Self) {
        drop(Self::take(this));
    }

    /// Releases ownership, then adopts `value` with a fresh count of 1.
    pub fn reset_with(this: &mut Self, value: Box<T>) {
        Self::reset(this);
        *this = Self::from_box(value);
    }

    pub fn swap(this: &mut Self, other: &mut Self) {
        mem::swap(&mut this.shared, &mut other.shared);
    }

    /// Mutable access to the value if no other handle shares it.
    pub fn get_mut(this: &mut Self) -> Option<&mut T> {
        let shared = this.shared.as_mut()?;
        if shared.count().get() != 1 {
            return None;
        }
        Some(unsafe { shared.value.as_mut() })
    }

    /// Returns the value if this is its only owner, otherwise hands the
    /// handle back untouched.
    pub fn try_unwrap(mut this: Self) -> std::result::Result<T, Self> {
        let Some(shared) = this.shared else {
            return Err(this);
        };
        if !shared.count().try_claim() {
            return Err(this);
        }
        this.shared = None;

        trace!("unwrapping sole owner of {:p}", shared.value);
        let value = unsafe {
            drop(Box::from_raw(shared.count.as_ptr()));
            Box::from_raw(shared.value.as_ptr())
        };
        Ok(*value)
    }
}

impl<T> Default for SharedHandle<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T> From<T> for SharedHandle<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T> From<Box<T>> for SharedHandle<T> {
    fn from(value: Box<T>) -> Self {
        Self::from_box(value)
    }
}

impl<T> Clone for SharedHandle<T> {
    fn clone(&self) -> Self {
        if let Some(shared) = &self.shared {
            shared.count().increment();
        }

        Self {
            shared: self.shared,
            _owns: PhantomData,
        }
    }

    fn clone_from(&mut self, source: &Self) {
        if Self::ptr_eq(self, source) {
            return;
        }
        Self::reset(self);
        *self = source.clone();
    }
}

impl<T> Deref for SharedHandle<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        match Self::try_deref(self) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T> Drop for SharedHandle<T> {
    fn drop(&mut self) {
        let Some(shared) = self.shared.take() else {
            return;
        };

        if shared.count().decrement() {
            trace!("last owner released {:p}", shared.value);
            unsafe {
                drop(Box::from_raw(shared.count.as_ptr()));
                drop(Box::from_raw(shared.value.as_ptr()));
            }
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::get(self) {
            Some(value) => f
                .debug_struct("SharedHandle")
                .field("value", value)
                .field("use_count", &Self::use_count(self))
                .finish(),
            None => f.write_str("SharedHandle(<empty>)"),
        }
    }
}

impl<T> fmt::Pointer for SharedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Pointer::fmt(&Self::as_ptr(self), f)
    }
}
