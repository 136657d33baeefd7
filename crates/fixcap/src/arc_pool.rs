//! A pool of reference-counted slots.
//!
//! [`Arc`] has the drop semantics of `std::sync::Arc`: the value is dropped,
//! and the slot returned to its pool, when the last clone goes away.

use core::mem::MaybeUninit;
use core::sync::atomic::{self, AtomicUsize};
use core::{fmt, ops, ptr};

use crate::treiber::{self, OwningNodePtr, SharedNodePtr, Stack};

const MAX_REFCOUNT: usize = isize::MAX as usize;

/// A pool of arcs.
pub struct ArcPool<T>
where
    T: 'static,
{
    stack: Stack<Inner<T>>,
}

impl<T> ArcPool<T>
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

    /// Moves `value` into a free slot with a strong count of one.
    ///
    /// Hands the value back if every slot is in use.
    pub fn request(&'static self, value: T) -> Result<Arc<T>, T> {
        if let Some(mut slot) = self.stack.pop() {
            slot.data.write(value);

            // the slot is exclusively ours until it is shared below
            slot.strong_count.store(1, atomic::Ordering::Relaxed);

            Ok(Arc {
                inner: slot.into_shared(),
            })
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

/// Memory for one arc, not yet given to a pool.
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
                strong_count: AtomicUsize::new(0),
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
    strong_count: AtomicUsize,
}

/// A reference-counted value living in an [`ArcPool`] slot.
pub struct Arc<T>
where
    T: 'static,
{
    inner: SharedNodePtr<Inner<T>>,
}

impl<T> Arc<T> {
    /// Number of `Arc`s pointing at this value.
    pub fn strong_count(this: &Self) -> usize {
        this.inner.strong_count.load(atomic::Ordering::Relaxed)
    }

    /// Returns `true` if both arcs point at the same slot.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        SharedNodePtr::ptr_eq(&this.inner, &other.inner)
    }
}

impl<T> Clone for Arc<T> {
    fn clone(&self) -> Self {
        let old_count = self
            .inner
            .strong_count
            .fetch_add(1, atomic::Ordering::Relaxed);

        assert!(old_count <= MAX_REFCOUNT, "reference count overflow");

        Self { inner: self.inner }
    }
}

impl<T> fmt::Debug for Arc<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        T::fmt(self, f)
    }
}

impl<T> PartialEq for Arc<T>
where
    T: PartialEq,
{
    fn eq(&self, other: &Self) -> bool {
        T::eq(self, other)
    }
}

impl<T> ops::Deref for Arc<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: the slot is initialized while any arc to it is alive
        unsafe { self.inner.data.assume_init_ref() }
    }
}

impl<T> Drop for Arc<T> {
    fn drop(&mut self) {
        if let Some(stack) = self.inner.stack {
            if self
                .inner
                .strong_count
                .fetch_sub(1, atomic::Ordering::Release)
                != 1
            {
                return;
            }

            // synchronizes with the Release decrements of the other owners so
            // their accesses happen before the value is dropped
            atomic::fence(atomic::Ordering::Acquire);

            // SAFETY: the count reached zero so this is the last shared pointer
            let mut owning_ptr = unsafe { self.inner.into_owning() };

            // SAFETY: the slot is initialized and no arc can deref it anymore
            unsafe {
                ptr::drop_in_place(owning_ptr.data.as_mut_ptr());
            }

            stack.push(owning_ptr);
        } else {
            #[cfg(debug_assertions)]
            unreachable!()
        }
    }
}

// SAFETY: sending an arc to another thread shares the value with it, so the
// value must be `Sync`; the last owner may drop it on any thread, so it must
// also be `Send`
unsafe impl<T> Send for Arc<T> where T: Send + Sync {}

// SAFETY: same bounds as `Send`, since `&Arc<T>` can be cloned into an `Arc<T>`
unsafe impl<T> Sync for Arc<T> where T: Send + Sync {}
