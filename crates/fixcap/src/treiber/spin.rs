//! Spin lock serializing the stack on targets without exclusive access
//! instructions.

use core::hint;
use core::sync::atomic::{self, AtomicBool};

pub(super) struct Lock {
    locked: AtomicBool,
}

impl Lock {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }

    pub fn lock(&self) -> Guard<'_> {
        while self
            .locked
            .compare_exchange_weak(
                false,
                true,
                atomic::Ordering::Acquire,
                atomic::Ordering::Relaxed,
            )
            .is_err()
        {
            while self.locked.load(atomic::Ordering::Relaxed) {
                hint::spin_loop();
            }
        }

        Guard { lock: self }
    }
}

pub(super) struct Guard<'a> {
    lock: &'a Lock,
}

impl Drop for Guard<'_> {
    fn drop(&mut self) {
        self.lock.locked.store(false, atomic::Ordering::Release);
    }
}
