//! Single-producer single-consumer channel over a fixed ring buffer.
//!
//! The channel is split once, from a `'static` location, into a [`Sender`] and
//! a [`Receiver`]. Neither half is `Clone`, so there is at most one producer
//! and one consumer for the lifetime of the program.
//!
//! ```
//! use fixcap::spsc::Channel;
//!
//! let channel: &'static mut Channel<u8, 4> = Box::leak(Box::new(Channel::new()));
//! let (tx, rx) = channel.split();
//!
//! tx.send(1).unwrap();
//! assert_eq!(Some(1), rx.recv());
//! assert_eq!(None, rx.recv());
//! ```

use core::cell::UnsafeCell;
use core::mem::MaybeUninit;
use core::ptr::NonNull;
use core::sync::atomic::{self, AtomicUsize};

type Buffer<T> = [UnsafeCell<MaybeUninit<T>>];

/// Statically sized storage for a channel of `N` elements.
pub struct Channel<T, const N: usize> {
    inner: Inner<[UnsafeCell<MaybeUninit<T>>; N]>,
}

impl<T, const N: usize> Channel<T, N> {
    /// Creates an empty channel.
    ///
    /// Fails to compile if `N` is zero.
    #[allow(clippy::new_without_default)]
    pub const fn new() -> Self {
        const {
            assert!(N > 0, "capacity must be at least one");
        }

        Self {
            inner: Inner {
                read: AtomicUsize::new(0),
                write: AtomicUsize::new(0),
                buf: [const { UnsafeCell::new(MaybeUninit::uninit()) }; N],
            },
        }
    }

    /// Splits the channel into its producer and consumer halves.
    ///
    /// Taking `&'static mut self` guarantees the storage outlives both halves
    /// and that the channel cannot be split a second time.
    pub fn split(&'static mut self) -> (Sender<T>, Receiver<T>) {
        let inner: NonNull<Inner<Buffer<T>>> = NonNull::from(&mut self.inner);

        (Sender { inner }, Receiver { inner })
    }
}

/// Producer half of a channel.
pub struct Sender<T> {
    inner: NonNull<Inner<Buffer<T>>>,
}

impl<T> Sender<T> {
    /// Sends a value.
    ///
    /// Hands the value back as `Err` if the channel is observed as full.
    pub fn send(&self, value: T) -> Result<(), T> {
        // SAFETY: `split` only accepts `'static` storage
        let inner = unsafe { self.inner.as_ref() };

        // SAFETY: `Sender` is not `Clone` so this is the only producer
        unsafe { inner.send(value) }
    }

    /// Number of elements the channel can hold.
    pub fn capacity(&self) -> usize {
        // SAFETY: `split` only accepts `'static` storage
        unsafe { self.inner.as_ref() }.buf.len()
    }
}

/// Consumer half of a channel.
pub struct Receiver<T> {
    inner: NonNull<Inner<Buffer<T>>>,
}

impl<T> Receiver<T> {
    /// Receives a value.
    ///
    /// Returns `None` if the channel is observed as empty.
    pub fn recv(&self) -> Option<T> {
        // SAFETY: `split` only accepts `'static` storage
        let inner = unsafe { self.inner.as_ref() };

        // SAFETY: `Receiver` is not `Clone` so this is the only consumer
        unsafe { inner.recv() }
    }

    /// Number of elements currently in the channel, as seen by the consumer.
    ///
    /// The producer may add elements concurrently so this is a lower bound.
    pub fn len(&self) -> usize {
        // SAFETY: `split` only accepts `'static` storage
        unsafe { self.inner.as_ref() }.len()
    }

    /// Returns `true` if no element is observed in the channel.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of elements the channel can hold.
    pub fn capacity(&self) -> usize {
        // SAFETY: `split` only accepts `'static` storage
        unsafe { self.inner.as_ref() }.buf.len()
    }
}

struct Inner<B: ?Sized> {
    read: AtomicUsize,
    write: AtomicUsize,
    buf: B,
}

impl<T> Inner<Buffer<T>> {
    fn len(&self) -> usize {
        let current_read = self.read.load(atomic::Ordering::Relaxed);
        let acquired_write = self.write.load(atomic::Ordering::Acquire);

        acquired_write.wrapping_sub(current_read)
    }

    /// # Safety
    /// - Caller must be the only producer
    unsafe fn send(&self, value: T) -> Result<(), T> {
        let current_write = self.write.load(atomic::Ordering::Relaxed);
        let capacity = self.buf.len();

        // pairs with the Release store of `read` in `recv`: the consumer is
        // done reading a slot before we are allowed to overwrite it
        let acquired_read = self.read.load(atomic::Ordering::Acquire);
        if current_write.wrapping_sub(acquired_read) == capacity {
            return Err(value);
        }

        // SAFETY: the modulo keeps the index in bounds
        let slot = unsafe { self.buf.get_unchecked(current_write % capacity) };

        // SAFETY: the slot is outside the consumer's readable window, so there
        // is no concurrent access to it
        unsafe {
            slot.get().cast::<T>().write(value);
        }

        self.write
            .store(current_write.wrapping_add(1), atomic::Ordering::Release);

        Ok(())
    }

    /// # Safety
    /// - Caller must be the only consumer
    unsafe fn recv(&self) -> Option<T> {
        let current_read = self.read.load(atomic::Ordering::Relaxed);
        let capacity = self.buf.len();

        // pairs with the Release store of `write` in `send`: the slot write is
        // visible before we read it
        let acquired_write = self.write.load(atomic::Ordering::Acquire);
        if current_read == acquired_write {
            return None;
        }

        // SAFETY: the modulo keeps the index in bounds
        let slot = unsafe { self.buf.get_unchecked(current_read % capacity) };
        // SAFETY: the write cursor is ahead of this slot so it was initialized,
        // and the producer will not touch it until `read` moves past it
        let value = unsafe { slot.get().cast::<T>().read() };

        self.read
            .store(current_read.wrapping_add(1), atomic::Ordering::Release);

        Some(value)
    }
}

// SAFETY: moving the sender to another thread lets that thread move values
// into the channel, so the values must be `Send`
unsafe impl<T> Send for Sender<T> where T: Send {}

// SAFETY: moving the receiver to another thread lets that thread take values
// out of the channel, so the values must be `Send`
unsafe impl<T> Send for Receiver<T> where T: Send {}
