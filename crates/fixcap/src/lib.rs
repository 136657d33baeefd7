//! Fixed-capacity containers and memory pools.
//!
//! Nothing in this crate allocates. Containers either own a fixed array
//! ([`spsc::Channel`]) or borrow caller-provided bytes ([`vec::Vec`]), and the
//! pools hand out objects from `'static` memory that was given to them with
//! `manage`:
//!
//! - [`object_pool`]: objects are never destroyed, only recycled
//! - [`box_pool`]: values are moved in on request and dropped on release
//! - [`arc_pool`]: like `box_pool` but reference counted
//!
//! All three pools are built on a lock-free Treiber stack. On ARM the stack
//! uses `LDREX`/`STREX` so it is ABA free; elsewhere it falls back to a
//! spin-locked top pointer so the same API can be exercised on a host.
//!
//! Enable the `tracing` feature to get events when pools take over memory or
//! run dry.

#![deny(missing_docs)]
#![cfg_attr(not(test), no_std)]
#![deny(clippy::missing_safety_doc)]
#![deny(clippy::undocumented_unsafe_blocks)]

macro_rules! trace_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::trace!($($arg)*);
    };
}

macro_rules! debug_event {
    ($($arg:tt)*) => {
        #[cfg(feature = "tracing")]
        tracing::debug!($($arg)*);
    };
}

pub mod arc_pool;
pub mod box_pool;
pub mod object_pool;
pub mod spsc;
mod treiber;
pub mod vec;

pub use arc_pool::{Arc, ArcPool};
pub use box_pool::{Box, BoxPool};
pub use object_pool::{Object, ObjectPool, Unmanaged};
pub use spsc::{Channel, Receiver, Sender};
pub use vec::Vec;
