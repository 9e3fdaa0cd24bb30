//! The pending-receive flag shared with the notification handler.

use portable_atomic::{AtomicBool, Ordering};

/// Single-word "packet waiting" flag.
///
/// This is the only state shared between the asynchronous
/// packet-received notification and the bridge loop. The handler side
/// calls [`notify`](ReceiveFlag::notify) and nothing else - no buffer
/// access, no I/O - while the bridge reads and clears it inside its
/// receive-intake critical region.
pub struct ReceiveFlag(AtomicBool);

impl ReceiveFlag {
    /// Create a cleared flag. `const` so it can live in a `static`
    /// reachable from the notification handler.
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Raise the flag. Safe to call from interrupt context.
    #[inline]
    pub fn notify(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// True if a receive notification is pending.
    #[inline]
    #[must_use]
    pub fn pending(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Clear the flag after the pending packet has been consumed.
    #[inline]
    pub fn clear(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for ReceiveFlag {
    fn default() -> Self {
        Self::new()
    }
}
