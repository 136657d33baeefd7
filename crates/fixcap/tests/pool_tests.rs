//! Multi-threaded tests for the pools.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use fixcap::arc_pool::{self, ArcPool};
use fixcap::box_pool::{self, BoxPool};
use fixcap::object_pool::{ObjectPool, Unmanaged};

const THREADS: usize = 4;
const ROUNDS: usize = 2_000;

fn run_on_threads(f: fn(usize)) {
    let handles: Vec<_> = (0..THREADS)
        .map(|id| thread::spawn(move || f(id)))
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }
}

#[test]
fn test_object_pool_never_lends_an_object_twice() {
    const OBJECTS: usize = 2;

    static POOL: ObjectPool<AtomicUsize> = ObjectPool::new();

    for _ in 0..OBJECTS {
        POOL.manage(Box::leak(Box::new(Unmanaged::new(AtomicUsize::new(0)))));
    }

    run_on_threads(|_| {
        for _ in 0..ROUNDS {
            if let Some(object) = POOL.request() {
                assert_eq!(0, object.fetch_add(1, Ordering::Relaxed));
                object.fetch_sub(1, Ordering::Relaxed);
            }
        }
    });

    let drained: Vec<_> = std::iter::from_fn(|| POOL.request()).collect();
    assert_eq!(OBJECTS, drained.len());
}

#[test]
fn test_box_pool_values_are_not_shared() {
    const SLOTS: usize = 3;

    static POOL: BoxPool<(usize, usize)> = BoxPool::new();

    for _ in 0..SLOTS {
        POOL.manage(Box::leak(Box::new(box_pool::Slot::new())));
    }

    run_on_threads(|id| {
        for round in 0..ROUNDS {
            if let Ok(mut boxed) = POOL.request((id, round)) {
                thread::yield_now();
                assert_eq!((id, round), *boxed);
                boxed.1 += 1;
                assert_eq!((id, round + 1), *boxed);
            }
        }
    });
}

#[test]
fn test_arc_pool_drops_each_value_once() {
    static DROPS: AtomicUsize = AtomicUsize::new(0);

    struct Counted;

    impl Drop for Counted {
        fn drop(&mut self) {
            DROPS.fetch_add(1, Ordering::Relaxed);
        }
    }

    static POOL: ArcPool<Counted> = ArcPool::new();

    POOL.manage(Box::leak(Box::new(arc_pool::Slot::new())));

    let arc = POOL.request(Counted).ok().unwrap();
    let handles: Vec<_> = (0..THREADS)
        .map(|_| {
            let arc = arc.clone();
            thread::spawn(move || {
                for _ in 0..ROUNDS {
                    drop(arc.clone());
                }
            })
        })
        .collect();
    drop(arc);

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(1, DROPS.load(Ordering::Relaxed));
    assert!(POOL.request(Counted).is_ok(), "slot went back to the pool");
}
