//! ARMv7 exclusive access primitives.

use core::arch::asm;
use core::ptr::NonNull;

/// Drops the exclusive reservation taken by [`load_link`].
pub(super) fn clear_load_link() {
    // SAFETY: `CLREX` only resets the local exclusive monitor
    unsafe { asm!("CLREX", options(nomem, nostack)) }
}

/// # Safety
/// - `ptr` must be valid for reads and aligned
pub(super) unsafe fn load_link(ptr: NonNull<usize>) -> usize {
    let value;
    // SAFETY: `ptr` is valid as per the caller contract
    unsafe {
        asm!("LDREX {}, [{}]",
             out(reg) value,
             in(reg) ptr.as_ptr(),
             options(nostack),
        )
    }
    value
}

/// Stores `value` if nothing touched `ptr` since the matching [`load_link`].
///
/// # Safety
/// - `ptr` must be valid for writes and aligned
pub(super) unsafe fn store_conditional(ptr: NonNull<usize>, value: usize) -> Result<(), ()> {
    let outcome: usize;
    // SAFETY: `ptr` is valid as per the caller contract
    unsafe {
        asm!("STREX {}, {}, [{}]",
             out(reg) outcome,
             in(reg) value,
             in(reg) ptr.as_ptr(),
             options(nostack),
        );
    }
    if outcome == 0 {
        Ok(())
    } else {
        Err(())
    }
}
