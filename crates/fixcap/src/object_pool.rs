//! A pool of long-lived objects.
//!
//! Objects handed to the pool are never destroyed. Releasing an [`Object`]
//! puts it back as-is, so whatever state it was left in is what the next
//! requester sees.
//!
//! ```
//! use fixcap::object_pool::{ObjectPool, Unmanaged};
//!
//! static POOL: ObjectPool<[u8; 64]> = ObjectPool::new();
//!
//! POOL.manage(Box::leak(Box::new(Unmanaged::new([0; 64]))));
//!
//! let mut buffer = POOL.request().expect("pool is empty");
//! buffer[0] = 1;
//! assert!(POOL.request().is_none());
//!
//! drop(buffer);
//! assert_eq!(1, POOL.request().unwrap()[0]);
//! ```

use core::ops;

use crate::treiber::{self, OwningNodePtr, Stack};

/// A pool of objects of type `T`.
pub struct ObjectPool<T>
where
    T: 'static,
{
    stack: Stack<Inner<T>>,
}

impl<T> ObjectPool<T> {
    /// Creates a pool with no objects.
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        Self {
            stack: Stack::new(),
        }
    }

    /// Hands an object over to the pool for good.
    pub fn manage(&'static self, unmanaged: &'static mut Unmanaged<T>) {
        unmanaged.inner.data.stack = Some(&self.stack);

        trace_event!(pool = core::any::type_name::<Self>(), "object managed");

        self.stack.push(OwningNodePtr::new(&mut unmanaged.inner));
    }

    /// Takes an object out of the pool, or `None` if every object is in use.
    pub fn request(&'static self) -> Option<Object<T>> {
        let object = self.stack.pop().map(|inner| Object { inner });

        if object.is_none() {
            debug_event!(pool = core::any::type_name::<Self>(), "pool exhausted");
        }

        object
    }
}

/// An object that has not been given to a pool yet.
///
/// Dropping it runs `T`'s destructor; once managed, that never happens.
pub struct Unmanaged<T>
where
    T: 'static,
{
    inner: treiber::Node<Inner<T>>,
}

impl<T> Unmanaged<T>
where
    T: 'static,
{
    /// Wraps `data` so it can be managed by a pool.
    pub const fn new(data: T) -> Self {
        Self {
            inner: treiber::Node::new(Inner { stack: None, data }),
        }
    }
}

#[repr(C)]
struct Inner<T>
where
    T: 'static,
{
    stack: Option<&'static Stack<Inner<T>>>,
    data: T,
}

/// An object on loan from an [`ObjectPool`].
pub struct Object<T>
where
    T: 'static,
{
    inner: OwningNodePtr<Inner<T>>,
}

impl<T> ops::Deref for Object<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.inner.data
    }
}

impl<T> ops::DerefMut for Object<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner.data
    }
}

impl<T> AsRef<[u8]> for Object<T>
where
    T: AsRef<[u8]>,
{
    fn as_ref(&self) -> &[u8] {
        self.inner.data.as_ref()
    }
}

impl<T> AsMut<[u8]> for Object<T>
where
    T: AsMut<[u8]>,
{
    fn as_mut(&mut self) -> &mut [u8] {
        self.inner.data.as_mut()
    }
}

impl<T> Drop for Object<T> {
    fn drop(&mut self) {
        if let Some(stack) = self.inner.stack {
            // SAFETY: we are in the destructor so `self.inner` is never used again
            let owning_ptr = unsafe { self.inner.copy() };
            stack.push(owning_ptr);
        } else {
            #[cfg(debug_assertions)]
            unreachable!()
        }
    }
}

// SAFETY: an object is uniquely owned, so moving it moves its contents
unsafe impl<T> Send for Object<T> where T: Send {}

// SAFETY: shared access to an object only hands out `&T`
unsafe impl<T> Sync for Object<T> where T: Sync {}
