//! # Kernel
//!
//! Top-level initialization and the public API. The kernel owns the
//! single global [`Scheduler`] value, the stack arena memory behind it
//! and the installed [`Board`], and coordinates the managed part of
//! the boot sequence.
//!
//! ## Startup sequence
//!
//! ```text
//! Reset (cortex-m-rt: copy .data, zero .bss, VTOR, runtime init)
//!   └─► main()
//!         ├─► trace::init(..)        ← optional log sink
//!         ├─► kernel::init(board)    ← bring-up hook, global state
//!         ├─► kernel::create_thread  ← register threads (×N)
//!         └─► kernel::start(cp)      ← never returns
//!               ├─► exception priorities (SysTick/PendSV lowest)
//!               ├─► PSP → boot scratch
//!               ├─► arm SysTick (TICK_US period)
//!               ├─► drop to unprivileged
//!               └─► idle trap — the first tick elects the first thread
//! ```
//!
//! Boot runs on the main stack and is not a managed thread; after
//! `start` parks in the idle trap, control never meaningfully returns
//! here. Threads run unprivileged on the process stack and reach
//! hardware only through the supervisor-call gateway.

use crate::arch::cortex_m4;
use crate::arena::StackArena;
use crate::board::{Board, NullBoard};
use crate::config::{BOOT_SCRATCH_BYTES, STACK_ARENA_BYTES, TICK_US};
use crate::error::Result;
use crate::scheduler::Scheduler;
use crate::sync;
use crate::thread::ThreadId;

// ---------------------------------------------------------------------------
// Global kernel state
// ---------------------------------------------------------------------------

/// Backing memory for every thread stack plus the bootstrap scratch
/// area at its top.
#[repr(align(8))]
struct ArenaMemory([u8; STACK_ARENA_BYTES]);

static mut ARENA_MEMORY: ArenaMemory = ArenaMemory([0; STACK_ARENA_BYTES]);

/// The one scheduler-context value. All mutable kernel state lives in
/// here; see `scheduler`.
static mut KERNEL: Scheduler = Scheduler::new(StackArena::empty());

/// Raw pointer to the global scheduler for the interrupt trampolines,
/// which cannot go through references. Set once during `init()`.
pub static mut KERNEL_PTR: *mut Scheduler = core::ptr::null_mut();

/// Installed board collaborators; the gateway dispatches through this.
static mut BOARD: &'static dyn Board = &NullBoard;

// ---------------------------------------------------------------------------
// Kernel API
// ---------------------------------------------------------------------------

/// Initialize the kernel and run the hardware bring-up hook.
///
/// Must be called exactly once, from the main thread, before any other
/// kernel function. `board.init()` is invoked here — before any thread
/// exists and before the tick is armed.
pub fn init(board: &'static dyn Board) {
    unsafe {
        let base = core::ptr::addr_of_mut!(ARENA_MEMORY) as usize;
        let top = base + STACK_ARENA_BYTES - BOOT_SCRATCH_BYTES;
        KERNEL = Scheduler::new(StackArena::new(base, top));
        KERNEL_PTR = core::ptr::addr_of_mut!(KERNEL);
        BOARD = board;
    }
    board.init();
    log::info!(
        "kernel initialized, {} byte stack arena",
        STACK_ARENA_BYTES - BOOT_SCRATCH_BYTES
    );
}

/// Register a thread with the scheduler.
///
/// `entry` runs unprivileged on its own stack; if it returns, the
/// thread parks forever in `thread::thread_exit`. See
/// `Scheduler::create_thread` for the failure contract.
pub fn create_thread(
    entry: extern "C" fn(),
    name: &'static str,
    stack_bytes: usize,
) -> Result<ThreadId> {
    sync::critical_section(|_cs| unsafe {
        debug_assert!(!KERNEL_PTR.is_null(), "kernel::init not called");
        (*KERNEL_PTR).create_thread(entry, name, stack_bytes)
    })
}

/// Start preemptive scheduling. **Does not return.**
///
/// Arms SysTick at the `TICK_US` period, drops execution privilege and
/// parks. The first tick performs the bootstrap switch into the head
/// of the run queue. With an empty pool the tick is never armed and
/// boot parks privileged instead.
pub fn start(mut core_peripherals: cortex_m::Peripherals) -> ! {
    let registered = sync::critical_section(|_cs| unsafe { (*KERNEL_PTR).thread_count() });
    if registered == 0 {
        log::error!("no threads registered; parking");
        loop {
            cortex_m::asm::wfi();
        }
    }

    log::info!("starting scheduler: {} threads, {} us tick", registered, TICK_US);

    cortex_m4::set_exception_priorities();
    unsafe {
        // The first tick's context save goes through PSP before any
        // thread owns it; aim it at the reserved scratch words.
        cortex_m4::set_process_stack(boot_scratch_top());
    }
    cortex_m4::configure_systick(&mut core_peripherals.SYST);
    cortex_m4::drop_privilege();

    loop {
        cortex_m::asm::wfi();
    }
}

/// Voluntarily give up the rest of the current quantum.
///
/// Pends the context-switch exception so the regular switch path runs
/// ahead of the next tick. Dropped if a tick is already pending — the
/// switch is about to happen anyway. Privileged callers only;
/// unprivileged threads reach this through `syscall::user::yield_now`,
/// whose trap lands here via the gateway.
pub fn yield_now() {
    cortex_m4::pend_context_switch();
}

/// Monotonic scheduler tick count since start.
pub fn tick_count() -> u64 {
    sync::critical_section(|_cs| unsafe { (*KERNEL_PTR).tick_count() })
}

/// The installed board, for the gateway's dispatch path.
pub(crate) fn board() -> &'static dyn Board {
    unsafe { BOARD }
}

/// First address above the bootstrap scratch words at the arena top.
fn boot_scratch_top() -> usize {
    unsafe { core::ptr::addr_of!(ARENA_MEMORY) as usize + STACK_ARENA_BYTES }
}
