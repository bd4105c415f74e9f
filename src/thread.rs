//! # Thread Descriptors
//!
//! The per-thread bookkeeping record. Descriptors live in the
//! scheduler's fixed pool array; the run queue only ever holds
//! [`ThreadId`] handles into that array, so each descriptor has
//! exactly one owner.

/// Handle to a thread: its index in the scheduler's descriptor pool.
pub type ThreadId = usize;

/// Per-thread state. Created once by registration, never destroyed.
pub struct ThreadDescriptor {
    /// Human-readable label, used in log records.
    pub name: &'static str,
    /// Saved process stack pointer. Valid whenever the thread is not
    /// current; updated on every context save.
    pub sp: usize,
    /// Top address of the thread's stack slice in the arena.
    pub stack_base: usize,
    /// True until the thread has been switched in once. The initial
    /// frame is fully built at creation, so the switch only has to
    /// clear this flag.
    pub first_run: bool,
    /// Declared for future slot reclamation; nothing reads it yet.
    pub alive: bool,
}

impl ThreadDescriptor {
    /// Unregistered pool slot.
    pub const EMPTY: Self = Self {
        name: "",
        sp: 0,
        stack_base: 0,
        first_run: false,
        alive: false,
    };
}

/// Parking routine for threads whose entry function returns.
///
/// Creation wires each thread's initial `lr` here. There is no slot
/// reclamation: the thread keeps its descriptor and its run-queue
/// rotation forever, burning its quantum in this loop.
pub extern "C" fn thread_exit() -> ! {
    loop {
        #[cfg(all(target_arch = "arm", target_os = "none"))]
        cortex_m::asm::wfi();
        #[cfg(not(all(target_arch = "arm", target_os = "none")))]
        core::hint::spin_loop();
    }
}
