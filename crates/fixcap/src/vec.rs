//! A vector whose elements live in a caller-provided byte buffer.
//!
//! The buffer can be anything that exposes mutable bytes: an array, a
//! `&mut [u8]`, or an [`Object`](crate::object_pool::Object) borrowed from a
//! pool. The capacity is whatever fits after aligning the start of the
//! buffer.
//!
//! The vector itself is aligned like `T`, so storage held by value keeps the
//! same offset to an aligned address when the vector is moved.

use core::marker::PhantomData;
use core::{fmt, mem, ops, ptr, slice};

/// A growable array with a capacity fixed by its backing storage.
pub struct Vec<T, S>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    data: PhantomData<T>,
    _align: [T; 0],
    len: usize,
    storage: S,
}

impl<T, S> Vec<T, S>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    /// Creates an empty vector on top of `storage`.
    ///
    /// # Panics
    ///
    /// If `T` is zero-sized.
    pub const fn new(storage: S) -> Self {
        assert!(
            0 != mem::size_of::<T>(),
            "zero-sized types are not supported"
        );

        Self {
            storage,
            len: 0,
            data: PhantomData,
            _align: [],
        }
    }

    /// Appends an element, handing it back if the vector is full.
    pub fn push(&mut self, element: T) -> Result<(), T> {
        if self.is_full() {
            return Err(element);
        }

        // SAFETY: `len < capacity` so the slot lies within `storage`
        let slot = unsafe { self.aligned_storage_mut_ptr().add(self.len) };
        // SAFETY: the slot is in bounds, aligned and currently uninitialized
        unsafe {
            slot.write(element);
        }
        self.len += 1;

        Ok(())
    }

    /// Removes the last element and returns it, or `None` if empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.is_empty() {
            return None;
        }

        self.len -= 1;
        // SAFETY: index `len` held an initialized element which is now
        // outside the live range, so reading it out transfers ownership
        let value = unsafe { self.aligned_storage_mut_ptr().add(self.len).read() };

        Some(value)
    }

    /// Drops every element, keeping the storage.
    pub fn clear(&mut self) {
        let len = self.len;
        if len == 0 {
            return;
        }
        // a panicking destructor must not lead to a double drop
        self.len = 0;

        // SAFETY: the first `len` elements were initialized and are no longer
        // reachable through `self`
        unsafe {
            ptr::drop_in_place(slice::from_raw_parts_mut(
                self.aligned_storage_mut_ptr(),
                len,
            ));
        }
    }

    /// Returns `true` if another `push` would fail.
    pub fn is_full(&self) -> bool {
        self.len == self.capacity()
    }

    /// Number of elements the storage can hold.
    ///
    /// Bytes skipped at the front to reach `T`'s alignment are lost.
    pub fn capacity(&self) -> usize {
        let storage = self.storage.as_ref();
        let padding = Self::padding(storage.as_ptr() as usize);

        let Some(available) = storage.len().checked_sub(padding) else {
            return 0;
        };

        available / mem::size_of::<T>()
    }

    /// Drops every element and gives the storage back.
    pub fn into_storage(mut self) -> S {
        self.clear();
        let this = mem::ManuallyDrop::new(self);

        // SAFETY: `this` is not dropped and never used again, so `storage`
        // is moved out exactly once
        unsafe { ptr::read(&this.storage) }
    }

    fn padding(addr: usize) -> usize {
        let align = mem::align_of::<T>();
        let offset = addr % align;
        if offset == 0 {
            0
        } else {
            align - offset
        }
    }

    /// First aligned address of `storage`. May lie past its end when the
    /// capacity is zero.
    fn aligned_storage_ptr(&self) -> *const T {
        let ptr = self.storage.as_ref().as_ptr();

        ptr.wrapping_add(Self::padding(ptr as usize)).cast()
    }

    fn aligned_storage_mut_ptr(&mut self) -> *mut T {
        let ptr = self.storage.as_mut().as_mut_ptr();

        ptr.wrapping_add(Self::padding(ptr as usize)).cast()
    }
}

impl<T, S> fmt::Debug for Vec<T, S>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <[T]>::fmt(self, f)
    }
}

impl<T, S> ops::Deref for Vec<T, S>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    type Target = [T];

    fn deref(&self) -> &Self::Target {
        // SAFETY: `len` only changes through this API and never exceeds the
        // number of initialized elements
        unsafe { slice::from_raw_parts(self.aligned_storage_ptr(), self.len) }
    }
}

impl<T, S> ops::DerefMut for Vec<T, S>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    fn deref_mut(&mut self) -> &mut Self::Target {
        let len = self.len;
        // SAFETY: `len` only changes through this API and never exceeds the
        // number of initialized elements
        unsafe { slice::from_raw_parts_mut(self.aligned_storage_mut_ptr(), len) }
    }
}

impl<T, S> Drop for Vec<T, S>
where
    S: AsRef<[u8]> + AsMut<[u8]>,
{
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{self, AtomicUsize};

    use crate::object_pool::{ObjectPool, Unmanaged};

    use super::*;

    #[test]
    fn capacity_of_aligned_and_unaligned_storage() {
        #[repr(align(4))]
        struct Align4<T>(T);

        let mut storage = Align4([0; 5]);
        let aligned = &mut storage.0[..4];

        assert_eq!(4, Vec::<u8, _>::new(&mut *aligned).capacity());
        assert_eq!(2, Vec::<u16, _>::new(&mut *aligned).capacity());
        assert_eq!(1, Vec::<u32, _>::new(&mut *aligned).capacity());
        assert_eq!(0, Vec::<u64, _>::new(&mut *aligned).capacity());

        let unaligned = &mut storage.0[1..][..4];

        assert_eq!(4, Vec::<u8, _>::new(&mut *unaligned).capacity());
        assert_eq!(1, Vec::<u16, _>::new(&mut *unaligned).capacity());
        assert_eq!(0, Vec::<u32, _>::new(&mut *unaligned).capacity());
        assert_eq!(0, Vec::<u64, _>::new(&mut *unaligned).capacity());
    }

    #[test]
    fn push_pop() {
        let mut vec = Vec::new([0u8; 4]);

        assert!(vec.push(1u8).is_ok());
        assert!(vec.push(2).is_ok());

        assert_eq!([1, 2], &*vec);

        assert_eq!(Some(2), vec.pop());
        assert_eq!(Some(1), vec.pop());
        assert_eq!(None, vec.pop());
    }

    #[test]
    fn push_into_full_vec_hands_element_back() {
        let mut vec = Vec::new([0u8; 2]);

        assert_eq!(Ok(()), vec.push(1u8));
        assert_eq!(Ok(()), vec.push(2));
        assert!(vec.is_full());
        assert_eq!(Err(3), vec.push(3));
    }

    #[test]
    fn slice_access() {
        let mut vec = Vec::new([0u8; 8]);
        for i in 0..4u8 {
            vec.push(i).unwrap();
        }

        vec.reverse();
        vec[0] = 9;

        assert_eq!([9, 2, 1, 0], &*vec);
        assert_eq!("[9, 2, 1, 0]", format!("{vec:?}"));
    }

    #[test]
    fn moving_inline_storage_keeps_contents() {
        let mut vec = Vec::<[u8; 3], _>::new([0u8; 9]);
        vec.push([1, 2, 3]).unwrap();
        vec.push([4, 5, 6]).unwrap();
        let capacity = vec.capacity();

        // heap slot, so the storage address changes
        let vec = *std::boxed::Box::new(vec);
        let mut holder = std::vec::Vec::new();
        holder.push(vec);
        let vec = holder.pop().unwrap();

        assert_eq!(capacity, vec.capacity());
        assert_eq!([[1, 2, 3], [4, 5, 6]], &*vec);
    }

    #[test]
    fn empty_storage_smaller_than_padding() {
        #[repr(align(8))]
        struct Align8([u8; 4]);

        let mut storage = Align8([0; 4]);
        let mut vec = Vec::<u64, _>::new(&mut storage.0[1..]);

        assert_eq!(0, vec.capacity());
        assert!(vec.is_empty());
        assert_eq!(Err(7), vec.push(7));
        vec.clear();
    }

    #[test]
    fn contents_are_destroyed() {
        static DESTROYED: AtomicUsize = AtomicUsize::new(0);

        #[repr(C)]
        struct Evil(u8);

        impl Drop for Evil {
            fn drop(&mut self) {
                DESTROYED.fetch_add(1, atomic::Ordering::Relaxed);
            }
        }

        let mut vec = Vec::new([0u8; 4]);
        assert!(vec.push(Evil(0)).is_ok());
        assert!(vec.push(Evil(1)).is_ok());

        // not yet
        assert_eq!(0, DESTROYED.load(atomic::Ordering::Relaxed));

        drop(vec);
        assert_eq!(2, DESTROYED.load(atomic::Ordering::Relaxed));
    }

    #[test]
    fn into_storage_drops_elements() {
        static DESTROYED: AtomicUsize = AtomicUsize::new(0);

        struct Evil(#[allow(dead_code)] u16);

        impl Drop for Evil {
            fn drop(&mut self) {
                DESTROYED.fetch_add(1, atomic::Ordering::Relaxed);
            }
        }

        let mut buffer = [0u8; 8];
        let mut vec = Vec::new(&mut buffer[..]);
        vec.push(Evil(1)).ok().unwrap();
        vec.push(Evil(2)).ok().unwrap();
        vec.push(Evil(3)).ok().unwrap();

        let storage = vec.into_storage();
        assert_eq!(8, storage.len());
        assert_eq!(3, DESTROYED.load(atomic::Ordering::Relaxed));
    }

    #[test]
    fn backed_by_pool() {
        const ALLOC_SIZE: usize = 128;

        static POOL: ObjectPool<[u8; ALLOC_SIZE]> = ObjectPool::new();

        POOL.manage(Box::leak(Box::new(Unmanaged::new([0; ALLOC_SIZE]))));

        let storage = POOL.request().expect("OOM");
        let words = Vec::<u32, _>::new(storage);
        // pool nodes are `repr(C)` with pointer-aligned data
        assert_eq!(ALLOC_SIZE / mem::size_of::<u32>(), words.capacity());

        assert!(POOL.request().is_none(), "expected pool to be exhausted");

        // returns storage to the pool
        drop(words);

        assert!(POOL.request().is_some(), "expected pool to have an object");
    }
}
