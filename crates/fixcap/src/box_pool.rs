//! A pool of uninitialized slots that behave like `Box` once filled.
//!
//! Unlike the [object pool](crate::object_pool), a value is moved in when a
//! box is requested and dropped when the box is released.

use core::mem::MaybeUninit;
use core::{fmt, ops, ptr};

use crate::treiber::{self, OwningNodePtr, Stack};

/// A pool of boxes.
pub struct BoxPool<T>
where
    T: 'static,
{
    stack: Stack<Inner<T>>,
}

impl<T> BoxPool<T>
where
    T: 'static,
{
    /// Creates a pool with no slots.
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Self {
            stack: Stack::new(),
        }
    }

    /// Moves `value` into a free slot.
    ///
    /// Hands the value back if every slot is in use.
    pub fn request(&'static self, value: T) -> Result<Box<T>, T> {
        if let Some(mut slot) = self.stack.pop() {
            slot.data.write(value);
            Ok(Box { inner: slot })
        } else {
            debug_event!(pool = core::any::type_name::<Self>(), "pool exhausted");
            Err(value)
        }
    }

    /// Hands a slot over to the pool for good.
    pub fn manage(&'static self, slot: &'static mut Slot<T>) {
        slot.inner.data.stack = Some(&self.stack);

        trace_event!(pool = core::any::type_name::<Self>(), "slot managed");

        self.stack.push(OwningNodePtr::new(&mut slot.inner));
    }
}

/// Memory for one box, not yet given to a pool.
pub struct Slot<T>
where
    T: 'static,
{
    inner: treiber::Node<Inner<T>>,
}

impl<T> Slot<T>
where
    T: 'static,
{
    /// Creates an empty slot.
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Self {
            inner: treiber::Node::new(Inner {
                stack: None,
                data: MaybeUninit::uninit(),
            }),
        }
    }
}

struct Inner<T>
where
    T: 'static,
{
    stack: Option<&'static Stack<Inner<T>>>,
    data: MaybeUninit<T>,
}

/// A value living in a [`BoxPool`] slot.
pub struct Box<T>
where
    T: 'static,
{
    inner: OwningNodePtr<Inner<T>>,
}

impl<T> fmt::Debug for Box<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        T::fmt(self, f)
    }
}

impl<T> PartialEq for Box<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        T::eq(self, other)
    }
}

impl<T> ops::Deref for Box<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: the slot is initialized for as long as the box lives
        unsafe { self.inner.data.assume_init_ref() }
    }
}

impl<T> ops::DerefMut for Box<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: the slot is initialized for as long as the box lives
        unsafe { self.inner.data.assume_init_mut() }
    }
}

impl<T> Drop for Box<T> {
    fn drop(&mut self) {
        if let Some(stack) = self.inner.stack {
            // SAFETY: the slot is initialized and nothing can deref it after
            // this destructor
            unsafe {
                ptr::drop_in_place(self.inner.data.as_mut_ptr());
            }
            // SAFETY: we are in the destructor so `self.inner` is never used again
            let owning_ptr = unsafe { self.inner.copy() };
            stack.push(owning_ptr);
        } else {
            #[cfg(debug_assertions)]
            unreachable!()
        }
    }
}

// SAFETY: a box is uniquely owned, so moving it moves its contents
unsafe impl<T> Send for Box<T> where T: Send {}

// SAFETY: the box adds no shared mutability of its own
unsafe impl<T> Sync for Box<T> where T: Sync {}
