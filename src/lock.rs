//! Compile-time thread-safety policy.
//!
//! Every container in this crate carries a [`ThreadSafety`] type parameter,
//! defaulting to [`ThreadSafe`]. This mirrors a template parameter in the
//! library this crate's engines are modeled on: `thread_safe::yes` wraps
//! every operation in a real lock, `thread_safe::no` makes the same call
//! sites compile down to a plain [`RefCell`](core::cell::RefCell) borrow.
//! Unlike a runtime flag, the branch is resolved by the type checker, so a
//! [`NotThreadSafe`] container pays nothing for synchronization it isn't
//! using — and, because its cell is never [`Sync`], the type system also
//! refuses to let such a container be shared across threads in the first
//! place.
//!
//! This is deliberately *not* the lock-striped sharding the rest of the
//! grounding codebase uses for its concurrent variants: that design trades
//! linearizability for throughput by splitting state across N independently
//! locked segments. This crate needs one mutex guarding one consistent view
//! of the whole container, matching the single-lock model its contract
//! promises.

use core::cell::RefCell;
use core::fmt::Debug;

mod sealed {
    pub trait Sealed {}
}

/// The interior-mutability cell backing a [`ThreadSafety`] policy.
///
/// Implemented by a real mutex (when the policy is locked) or by a plain
/// `RefCell` (when it is not). Callers never see this trait directly; it is
/// only used to pick the storage behind each container.
pub(crate) trait LockCell<T> {
    fn new(value: T) -> Self;
    fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R;
}

/// A `RefCell`-backed cell with no synchronization whatsoever. Used both by
/// [`NotThreadSafe`] always, and by [`ThreadSafe`] when the `concurrent`
/// feature (and therefore `parking_lot`) isn't compiled in.
pub(crate) struct UnsyncCell<T>(RefCell<T>);

// Safety: this cell is only ever reached through `ThreadSafety::Cell`, and
// `ThreadSafe`/`NotThreadSafe` only grant `Sync` to their cell when the
// underlying storage actually synchronizes access. `UnsyncCell` never does,
// so it must stay `!Sync`; we take no unsafe shortcuts here.
impl<T> LockCell<T> for UnsyncCell<T> {
    fn new(value: T) -> Self {
        UnsyncCell(RefCell::new(value))
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        f(&mut self.0.borrow_mut())
    }
}

#[cfg(feature = "concurrent")]
impl<T> LockCell<T> for parking_lot::Mutex<T> {
    fn new(value: T) -> Self {
        parking_lot::Mutex::new(value)
    }

    fn with_mut<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }
}

/// A compile-time thread-safety policy: either [`ThreadSafe`] or
/// [`NotThreadSafe`]. Selects the cell type every container uses to guard
/// its internal engine state.
pub trait ThreadSafety: sealed::Sealed + Debug + Default + Clone + Copy + 'static {
    /// The cell type guarding engine state under this policy.
    type Cell<T>: LockCell<T>;

    /// `true` for [`ThreadSafe`], `false` for [`NotThreadSafe`]. Exposed for
    /// diagnostics only; nothing in the engines branches on this at runtime.
    const LOCKED: bool;
}

/// Every public operation acquires a real lock before touching engine
/// state. This is the default policy for every container in the crate.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ThreadSafe;

/// Locking is a compile-time no-op. The resulting container is not `Sync`;
/// the caller is responsible for any synchronization it needs.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NotThreadSafe;

impl sealed::Sealed for ThreadSafe {}
impl sealed::Sealed for NotThreadSafe {}

#[cfg(feature = "concurrent")]
impl ThreadSafety for ThreadSafe {
    type Cell<T> = parking_lot::Mutex<T>;
    const LOCKED: bool = true;
}

#[cfg(not(feature = "concurrent"))]
impl ThreadSafety for ThreadSafe {
    type Cell<T> = UnsyncCell<T>;
    const LOCKED: bool = false;
}

impl ThreadSafety for NotThreadSafe {
    type Cell<T> = UnsyncCell<T>;
    const LOCKED: bool = false;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_thread_safe_is_never_locked() {
        assert!(!NotThreadSafe::LOCKED);
    }

    #[cfg(feature = "concurrent")]
    #[test]
    fn thread_safe_is_locked_with_concurrent_feature() {
        assert!(ThreadSafe::LOCKED);
    }

    #[test]
    fn unsync_cell_round_trips() {
        let cell = UnsyncCell::new(41);
        let result = cell.with_mut(|v| {
            *v += 1;
            *v
        });
        assert_eq!(result, 42);
    }
}
