//! # Critical Sections
//!
//! Interrupt-safe access to shared kernel state on the single-core
//! Cortex-M4. The scheduler, the pool and the timer registration are
//! all mutated both from thread code and from interrupt handlers; the
//! only serialization available is masking the interrupts themselves,
//! so every thread-side mutation goes through [`critical_section`].

use cortex_m::interrupt;

/// Execute a closure with interrupts disabled, restoring them on exit.
///
/// Keep the enclosed work short: the scheduler tick cannot fire while
/// a critical section is open.
#[inline]
pub fn critical_section<F, R>(f: F) -> R
where
    F: FnOnce(&interrupt::CriticalSection) -> R,
{
    interrupt::free(f)
}
