//! Intrusive Treiber stack over `'static` nodes.
//!
//! On ARM the top pointer is swapped with load-linked/store-conditional
//! instructions which makes the stack lock-free and immune to ABA. Other
//! architectures serialize `push`/`pop` with a spin lock.

#[cfg(target_arch = "arm")]
mod llsc;
#[cfg(not(target_arch = "arm"))]
mod spin;

use core::ptr::NonNull;
use core::sync::atomic::{self, AtomicPtr};
use core::{ops, ptr};

pub(crate) struct Stack<T> {
    top: AtomicPtr<Node<T>>,
    #[cfg(not(target_arch = "arm"))]
    lock: spin::Lock,
}

impl<T> Stack<T> {
    pub const fn new() -> Self {
        Self {
            top: AtomicPtr::new(ptr::null_mut()),
            #[cfg(not(target_arch = "arm"))]
            lock: spin::Lock::new(),
        }
    }

    #[cfg(target_arch = "arm")]
    pub fn push(&self, node: OwningNodePtr<T>) {
        let top_addr = NonNull::from(&self.top).cast::<usize>();

        loop {
            // SAFETY: `top_addr` points into `self`
            let top = unsafe { llsc::load_link(top_addr) };

            // the data dependency on `top` orders this store before the
            // conditional store below
            // SAFETY: `node` is owned and points to a live node
            unsafe {
                node.inner
                    .as_ref()
                    .next
                    .store(top as *mut _, atomic::Ordering::Relaxed);
            }

            // publishes the node's data to whoever pops it
            atomic::fence(atomic::Ordering::Release);

            // SAFETY: `top_addr` points into `self`
            if unsafe { llsc::store_conditional(top_addr, node.inner.as_ptr() as usize).is_ok() } {
                break;
            }
        }
    }

    #[cfg(target_arch = "arm")]
    pub fn pop(&self) -> Option<OwningNodePtr<T>> {
        let top_addr = NonNull::from(&self.top).cast::<usize>();

        loop {
            // SAFETY: `top_addr` points into `self`
            let top = unsafe { llsc::load_link(top_addr) };

            let Some(top) = NonNull::new(top as *mut Node<T>) else {
                llsc::clear_load_link();

                return None;
            };

            // SAFETY: only valid `'static` nodes are ever pushed
            let next = unsafe { top.as_ref().next.load(atomic::Ordering::Relaxed) };

            // SAFETY: `top_addr` points into `self`
            if unsafe { llsc::store_conditional(top_addr, next as usize).is_ok() } {
                atomic::fence(atomic::Ordering::Acquire);

                return Some(OwningNodePtr { inner: top });
            }
        }
    }

    #[cfg(not(target_arch = "arm"))]
    pub fn push(&self, node: OwningNodePtr<T>) {
        let _guard = self.lock.lock();

        let top = self.top.load(atomic::Ordering::Relaxed);
        // SAFETY: `node` is owned and points to a live node
        unsafe {
            node.inner
                .as_ref()
                .next
                .store(top, atomic::Ordering::Relaxed);
        }
        self.top
            .store(node.inner.as_ptr(), atomic::Ordering::Relaxed);
    }

    #[cfg(not(target_arch = "arm"))]
    pub fn pop(&self) -> Option<OwningNodePtr<T>> {
        let _guard = self.lock.lock();

        let top = NonNull::new(self.top.load(atomic::Ordering::Relaxed))?;
        // SAFETY: only valid `'static` nodes are ever pushed
        let next = unsafe { top.as_ref().next.load(atomic::Ordering::Relaxed) };
        self.top.store(next, atomic::Ordering::Relaxed);

        Some(OwningNodePtr { inner: top })
    }
}

// SAFETY: a `Stack` in a static moves nodes between threads, so the data must
// be `Send`
unsafe impl<T> Sync for Stack<T> where T: Send {}

/// Owning pointer to a `'static` node.
#[repr(transparent)]
pub(crate) struct OwningNodePtr<T> {
    inner: NonNull<Node<T>>,
}

impl<T> ops::Deref for OwningNodePtr<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: nodes are `'static` and the owning pointer is unique
        unsafe { &self.inner.as_ref().data }
    }
}

impl<T> ops::DerefMut for OwningNodePtr<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        // SAFETY: nodes are `'static` and the owning pointer is unique
        unsafe { &mut self.inner.as_mut().data }
    }
}

impl<T> OwningNodePtr<T> {
    pub fn new(node: &'static mut Node<T>) -> Self {
        Self {
            inner: NonNull::from(node),
        }
    }

    pub fn into_shared(self) -> SharedNodePtr<T> {
        SharedNodePtr { inner: self.inner }
    }

    /// # Safety
    /// - `self` must not be used after this call; only the copy may be
    pub unsafe fn copy(&self) -> Self {
        Self { inner: self.inner }
    }
}

/// Shared pointer to a `'static` node.
#[repr(transparent)]
pub(crate) struct SharedNodePtr<T> {
    inner: NonNull<Node<T>>,
}

impl<T> SharedNodePtr<T> {
    /// # Safety
    /// - Caller must ensure this is the last remaining shared pointer
    pub unsafe fn into_owning(self) -> OwningNodePtr<T> {
        OwningNodePtr { inner: self.inner }
    }

    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.inner == other.inner
    }
}

impl<T> Copy for SharedNodePtr<T> {}

impl<T> Clone for SharedNodePtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> ops::Deref for SharedNodePtr<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        // SAFETY: nodes are `'static` and shared pointers only hand out `&T`
        unsafe { &self.inner.as_ref().data }
    }
}

#[repr(C)]
pub(crate) struct Node<T> {
    next: AtomicPtr<Node<T>>,
    pub data: T,
}

impl<T> Node<T> {
    pub const fn new(data: T) -> Self {
        Self {
            next: AtomicPtr::new(ptr::null_mut()),
            data,
        }
    }
}
