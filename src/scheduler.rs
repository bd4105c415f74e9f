//! # Scheduler
//!
//! Core scheduling state and the round-robin switch algorithm. One
//! [`Scheduler`] value owns every piece of mutable kernel state: the
//! descriptor pool, the stack arena mark, the run queue, the
//! current-thread slot and the tick counter. The interrupt trampolines
//! in `arch` reach it through `kernel::KERNEL_PTR`; nothing else is
//! process-global.
//!
//! ## Switch algorithm
//!
//! On every tick (and on a voluntary yield) the trampoline has already
//! pushed r4-r11 onto the running thread's stack; [`Scheduler::switch_context`]
//! then:
//!
//! 1. records the saved stack pointer into the outgoing descriptor and
//!    appends it at the run-queue tail — it runs again only after every
//!    other ready thread has had one quantum;
//! 2. dequeues the head, makes it current, clears its `first_run` flag;
//! 3. returns the incoming saved stack pointer for the trampoline to
//!    restore from.
//!
//! The very first switch after scheduler start is special: boot ran on
//! the main stack, not as a managed thread, so there is no outgoing
//! descriptor. The trampoline's save lands in the boot scratch area and
//! is discarded; the queue head simply becomes current.
//!
//! Ordering guarantee: strict FIFO round-robin, no priorities. Given K
//! ready threads and no arrivals, the current-thread sequence is
//! periodic with period K.

use crate::arena::StackArena;
use crate::config::MAX_THREADS;
use crate::error::{Error, Result};
use crate::frame;
use crate::queue::RunQueue;
use crate::thread::{thread_exit, ThreadDescriptor, ThreadId};

/// The single scheduler-context value. Stored as a global in
/// `kernel.rs`; constructed empty and given its arena by `kernel::init`.
pub struct Scheduler {
    threads: [ThreadDescriptor; MAX_THREADS],
    thread_count: usize,
    queue: RunQueue,
    current: Option<ThreadId>,
    arena: StackArena,
    tick_count: u64,
}

impl Scheduler {
    pub const fn new(arena: StackArena) -> Self {
        Self {
            threads: [ThreadDescriptor::EMPTY; MAX_THREADS],
            thread_count: 0,
            queue: RunQueue::new(),
            current: None,
            arena,
            tick_count: 0,
        }
    }

    /// Register a new thread.
    ///
    /// Carves `stack_bytes` from the arena, builds the initial
    /// 16-word context at the top of the slice (registers zero, `lr` =
    /// [`thread_exit`], `pc` = `entry`, fixed initial xPSR) and appends
    /// the thread at the run-queue tail.
    ///
    /// Fails with [`Error::PoolExhausted`] once `MAX_THREADS`
    /// descriptors exist and with [`Error::ZeroStackSize`] for an empty
    /// stack request; neither failure commits any state. Staying within
    /// the arena is the caller's responsibility (see `arena`).
    ///
    /// Must only run during single-threaded boot or inside a critical
    /// section; `kernel::create_thread` provides the latter.
    pub fn create_thread(
        &mut self,
        entry: extern "C" fn(),
        name: &'static str,
        stack_bytes: usize,
    ) -> Result<ThreadId> {
        if stack_bytes == 0 {
            return Err(Error::ZeroStackSize);
        }
        if self.thread_count >= MAX_THREADS {
            return Err(Error::PoolExhausted);
        }

        let id = self.thread_count;
        let stack_top = self.arena.carve(stack_bytes);
        let sp = unsafe {
            frame::install(
                stack_top,
                entry as usize as u32,
                thread_exit as usize as u32,
            )
        };

        self.threads[id] = ThreadDescriptor {
            name,
            sp,
            stack_base: stack_top,
            first_run: true,
            alive: true,
        };
        let queued = self.queue.enqueue(id);
        debug_assert!(queued);
        self.thread_count += 1;

        log::debug!(
            "created thread {} '{}', stack {:#010x}..{:#010x}",
            id,
            name,
            sp,
            stack_top
        );
        Ok(id)
    }

    /// Rotate the run queue and return the stack pointer to resume
    /// from. `saved_sp` is where the trampoline parked the outgoing
    /// context (or the boot scratch save on the bootstrap switch).
    pub fn switch_context(&mut self, saved_sp: usize) -> usize {
        if let Some(prev) = self.current {
            self.threads[prev].sp = saved_sp;
            let queued = self.queue.enqueue(prev);
            debug_assert!(queued);
        }

        match self.queue.dequeue() {
            Some(next) => {
                self.threads[next].first_run = false;
                self.current = Some(next);
                self.threads[next].sp
            }
            // Unreachable once a thread exists: start() refuses to arm
            // the tick over an empty pool.
            None => saved_sp,
        }
    }

    /// Tick entry: bump the monotonic counter, then switch.
    pub fn tick(&mut self, saved_sp: usize) -> usize {
        self.tick_count = self.tick_count.wrapping_add(1);
        self.switch_context(saved_sp)
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    pub fn current(&self) -> Option<ThreadId> {
        self.current
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Number of threads waiting in the run queue (the current thread
    /// is not among them).
    pub fn ready(&self) -> usize {
        self.queue.len()
    }

    pub fn descriptor(&self, id: ThreadId) -> &ThreadDescriptor {
        &self.threads[id]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{INITIAL_XPSR, MAX_THREADS};
    use crate::frame::{offset, FRAME_WORDS};

    extern "C" fn entry_a() {}
    extern "C" fn entry_b() {}
    extern "C" fn entry_c() {}

    const ENTRIES: [extern "C" fn(); 3] = [entry_a, entry_b, entry_c];

    /// Scheduler over a buffer on the test stack. The buffer must
    /// outlive the scheduler, so callers pass it in.
    fn scheduler_over(buf: &mut [u64]) -> Scheduler {
        let base = buf.as_mut_ptr() as usize;
        let top = base + core::mem::size_of_val(buf);
        Scheduler::new(StackArena::new(base, top))
    }

    const SCRATCH: usize = 0xDEAD_0000;

    #[test]
    fn queue_holds_threads_in_creation_order() {
        let mut buf = [0u64; 512];
        let mut sched = scheduler_over(&mut buf);
        for (i, entry) in ENTRIES.iter().enumerate() {
            let id = sched.create_thread(*entry, "t", 256).unwrap();
            assert_eq!(id, i);
        }
        assert_eq!(sched.ready(), 3);

        // Bootstrap plus two ticks walk the queue in creation order.
        sched.switch_context(SCRATCH);
        assert_eq!(sched.current(), Some(0));
        for expected in [1, 2] {
            let sp = sched.descriptor(sched.current().unwrap()).sp;
            sched.switch_context(sp);
            assert_eq!(sched.current(), Some(expected));
        }
    }

    #[test]
    fn bootstrap_elects_head_without_current() {
        let mut buf = [0u64; 512];
        let mut sched = scheduler_over(&mut buf);
        sched.create_thread(entry_a, "a", 256).unwrap();
        sched.create_thread(entry_b, "b", 256).unwrap();

        assert_eq!(sched.current(), None);
        let sp = sched.switch_context(SCRATCH);
        assert_eq!(sched.current(), Some(0));
        assert_eq!(sp, sched.descriptor(0).sp);
        // The scratch save was discarded, b is still queued.
        assert_eq!(sched.ready(), 1);
    }

    #[test]
    fn bootstrap_is_deterministic() {
        // Two identically built schedulers elect the same head.
        let mut buf_x = [0u64; 512];
        let mut buf_y = [0u64; 512];
        let mut x = scheduler_over(&mut buf_x);
        let mut y = scheduler_over(&mut buf_y);
        for s in [&mut x, &mut y] {
            s.create_thread(entry_a, "a", 256).unwrap();
            s.create_thread(entry_b, "b", 256).unwrap();
        }
        x.switch_context(SCRATCH);
        y.switch_context(SCRATCH);
        assert_eq!(x.current(), y.current());
    }

    #[test]
    fn round_robin_is_periodic() {
        let mut buf = [0u64; 512];
        let mut sched = scheduler_over(&mut buf);
        for entry in ENTRIES {
            sched.create_thread(entry, "t", 256).unwrap();
        }

        sched.tick(SCRATCH); // bootstrap
        let k = 3;
        let mut seen = [0usize; 3];
        let mut sequence = [0usize; 9];
        for slot in sequence.iter_mut() {
            let cur = sched.current().unwrap();
            *slot = cur;
            let sp = sched.descriptor(cur).sp;
            sched.tick(sp);
        }
        // Period K, each thread exactly once per period.
        for (i, &id) in sequence.iter().enumerate() {
            assert_eq!(id, sequence[i % k]);
            seen[id] += 1;
        }
        assert_eq!(seen, [3, 3, 3]);
        assert_eq!(sched.tick_count(), 10);
    }

    #[test]
    fn never_run_thread_restores_creation_state() {
        let mut buf = [0u64; 512];
        let mut sched = scheduler_over(&mut buf);
        sched.create_thread(entry_a, "a", 256).unwrap();
        assert!(sched.descriptor(0).first_run);

        let sp = sched.switch_context(SCRATCH);
        assert!(!sched.descriptor(0).first_run);

        let words = unsafe { core::slice::from_raw_parts(sp as *const u32, FRAME_WORDS) };
        assert_eq!(words[offset::PC], entry_a as usize as u32);
        assert_eq!(words[offset::XPSR], INITIAL_XPSR);
        for i in offset::R4..=offset::R12 {
            assert_eq!(words[i], 0);
        }
    }

    #[test]
    fn saved_sp_is_recorded_on_preemption() {
        let mut buf = [0u64; 512];
        let mut sched = scheduler_over(&mut buf);
        sched.create_thread(entry_a, "a", 256).unwrap();
        sched.create_thread(entry_b, "b", 256).unwrap();

        sched.switch_context(SCRATCH);
        let preempted_sp = sched.descriptor(0).sp - 32;
        sched.switch_context(preempted_sp);
        assert_eq!(sched.current(), Some(1));
        assert_eq!(sched.descriptor(0).sp, preempted_sp);
    }

    #[test]
    fn pool_exhaustion_leaves_state_unmodified() {
        let mut buf = [0u64; 2048];
        let mut sched = scheduler_over(&mut buf);
        for _ in 0..MAX_THREADS {
            sched.create_thread(entry_a, "t", 256).unwrap();
        }
        let before_allocated = sched.arena.allocated();

        let err = sched.create_thread(entry_b, "late", 256);
        assert_eq!(err, Err(Error::PoolExhausted));
        assert_eq!(sched.thread_count(), MAX_THREADS);
        assert_eq!(sched.ready(), MAX_THREADS);
        assert_eq!(sched.arena.allocated(), before_allocated);
    }

    #[test]
    fn zero_stack_is_rejected() {
        let mut buf = [0u64; 64];
        let mut sched = scheduler_over(&mut buf);
        assert_eq!(
            sched.create_thread(entry_a, "t", 0),
            Err(Error::ZeroStackSize)
        );
        assert_eq!(sched.thread_count(), 0);
        assert_eq!(sched.ready(), 0);
    }

    #[test]
    fn single_thread_keeps_running() {
        let mut buf = [0u64; 512];
        let mut sched = scheduler_over(&mut buf);
        sched.create_thread(entry_c, "only", 256).unwrap();
        sched.switch_context(SCRATCH);
        for _ in 0..4 {
            let sp = sched.descriptor(0).sp;
            assert_eq!(sched.switch_context(sp), sp);
            assert_eq!(sched.current(), Some(0));
        }
    }
}
