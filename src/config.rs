//! # TickOS Configuration
//!
//! Compile-time constants governing the kernel and system behavior.
//! All limits are fixed at compile time — no dynamic allocation.

/// Maximum number of threads the system can manage simultaneously.
/// This bounds the static descriptor array and the run queue. Increase
/// with care — every registered thread permanently consumes its slot
/// and its slice of the stack arena.
pub const MAX_THREADS: usize = 8;

/// Capacity of the ready queue. One slot per thread: a thread is either
/// current or queued, never both, so the queue can never overflow.
pub const RUN_QUEUE_CAPACITY: usize = MAX_THREADS;

/// Scheduler tick period in microseconds. Every tick preempts the
/// running thread and rotates the run queue.
pub const TICK_US: u32 = 900;

/// Size of the thread stack arena in bytes. Stacks are carved from the
/// top of this region downward and never returned. The sum of all
/// requested stack sizes must fit below the bootstrap scratch area.
pub const STACK_ARENA_BYTES: usize = 8 * 1024;

/// Bytes reserved at the very top of the stack arena for the bootstrap
/// context save. The first tick after scheduler start stores r4-r11
/// through an otherwise unused process stack pointer; parking PSP here
/// keeps that write inside reserved memory.
pub const BOOT_SCRATCH_BYTES: usize = 32;

/// Initial xPSR word for a freshly created thread. Only the Thumb bit
/// is set; everything else starts clear.
pub const INITIAL_XPSR: u32 = 0x0100_0000;

/// Processor clock frequency in Hz (SAM4S running from the 120 MHz PLL).
pub const SYSTEM_CLOCK_HZ: u32 = 120_000_000;

/// Slow clock frequency in Hz, the time base of the real-time timer
/// (32.768 kHz crystal).
pub const SLOW_CLOCK_HZ: u32 = 32_768;
