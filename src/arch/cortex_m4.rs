//! # Cortex-M4 Port
//!
//! Hardware-specific code for the ARM Cortex-M4 (Thumb-2): the SysTick
//! and PendSV context-switch trampolines, the supervisor-call trap
//! entry, tick timer configuration and processor-state helpers.
//!
//! ## Context switch mechanism
//!
//! The Cortex-M4 uses a split-stack model: the kernel and all handlers
//! run on MSP, threads run on PSP. On exception entry the hardware
//! stacks r0-r3, r12, lr, pc and xPSR onto the process stack; the
//! trampolines push the remaining r4-r11 (the software frame), hand
//! the resulting stack pointer to the portable scheduler, and unwind
//! the chosen thread's frame the same way in reverse. Returning with
//! EXC_RETURN `0xFFFFFFFD` resumes the thread on PSP.
//!
//! ## Exception priorities
//!
//! SysTick and PendSV both run at the lowest priority (0xFF), so a
//! context switch never preempts another handler, and back-to-back
//! switch requests collapse into the hardware pend bits. SVCall keeps
//! its reset priority and so outranks both.

use cortex_m::peripheral::syst::SystClkSource;

use crate::config::{SYSTEM_CLOCK_HZ, TICK_US};

// ---------------------------------------------------------------------------
// SysTick configuration
// ---------------------------------------------------------------------------

/// Arm the SysTick timer with the scheduler tick period.
///
/// Every expiry enters the `SysTick` trampoline below, which drives
/// one full save → rotate → restore cycle.
pub fn configure_systick(syst: &mut cortex_m::peripheral::SYST) {
    let reload = SYSTEM_CLOCK_HZ / 1_000_000 * TICK_US - 1;
    syst.set_reload(reload);
    syst.clear_current();
    syst.set_clock_source(SystClkSource::Core);
    syst.enable_counter();
    syst.enable_interrupt();
}

// ---------------------------------------------------------------------------
// Exception priorities and switch requests
// ---------------------------------------------------------------------------

/// Put SysTick and PendSV at the lowest exception priority.
///
/// System Handler Priority Register 3 holds both: bits [23:16] PendSV,
/// bits [31:24] SysTick.
pub fn set_exception_priorities() {
    const SHPR3: *mut u32 = 0xE000_ED20 as *mut u32;
    unsafe {
        let val = core::ptr::read_volatile(SHPR3);
        core::ptr::write_volatile(SHPR3, val | (0xFF << 16) | (0xFF << 24));
    }
}

/// Request a context switch ahead of the next tick.
///
/// Pends PendSV unless a SysTick is already pending — in that case the
/// switch is imminent anyway and the request is dropped. Both bits
/// live in the Interrupt Control and State Register, which only
/// privileged code may touch; unprivileged threads get here through
/// the gateway's yield operation.
pub fn pend_context_switch() {
    #[cfg(all(target_arch = "arm", target_os = "none"))]
    {
        const ICSR: *mut u32 = 0xE000_ED04 as *mut u32;
        const PENDSTSET: u32 = 1 << 26;
        const PENDSVSET: u32 = 1 << 28;
        unsafe {
            if core::ptr::read_volatile(ICSR) & PENDSTSET == 0 {
                core::ptr::write_volatile(ICSR, PENDSVSET);
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Processor state helpers
// ---------------------------------------------------------------------------

/// Point PSP at `top`.
///
/// # Safety
/// `top` must be the first address above writable, owned memory; the
/// next exception entry through PSP stores a frame below it.
pub unsafe fn set_process_stack(top: usize) {
    cortex_m::register::psp::write(top as u32);
    cortex_m::asm::isb();
}

/// Drop thread-mode execution to unprivileged. Handlers stay
/// privileged; threads reach hardware only through the gateway after
/// this point.
pub fn drop_privilege() {
    let mut ctrl = cortex_m::register::control::read();
    ctrl.set_npriv(cortex_m::register::control::Npriv::Unprivileged);
    unsafe {
        cortex_m::register::control::write(ctrl);
    }
    cortex_m::asm::isb();
}

// ---------------------------------------------------------------------------
// Exception trampolines
// ---------------------------------------------------------------------------
//
// The three naked handlers below are the whole machine-level surface
// of the kernel: save-current, restore-target and trap-frame location.
// They override the weak bindings in the cortex-m-rt vector table by
// exporting the matching strong symbols.

#[cfg(all(target_arch = "arm", target_os = "none"))]
mod trampolines {
    use core::arch::naked_asm;

    use crate::frame::TrapFrame;
    use crate::kernel;
    use crate::syscall;

    /// Scheduler tick: save the software frame on the running thread's
    /// stack, rotate the run queue, restore the next thread.
    ///
    /// On the first tick after scheduler start the save goes through
    /// the boot scratch PSP and `Scheduler::tick` discards it (the
    /// bootstrap case).
    #[unsafe(naked)]
    #[no_mangle]
    pub unsafe extern "C" fn SysTick() {
        naked_asm!(
            "mrs r0, psp",
            "stmdb r0!, {{r4-r11}}",
            "bl {tick}",
            "ldmia r0!, {{r4-r11}}",
            "msr psp, r0",
            "ldr r0, =0xFFFFFFFD",
            "bx r0",
            tick = sym tick_entry,
        )
    }

    /// Voluntary yield: identical switch path, no tick accounting.
    #[unsafe(naked)]
    #[no_mangle]
    pub unsafe extern "C" fn PendSV() {
        naked_asm!(
            "mrs r0, psp",
            "stmdb r0!, {{r4-r11}}",
            "bl {switch}",
            "ldmia r0!, {{r4-r11}}",
            "msr psp, r0",
            "ldr r0, =0xFFFFFFFD",
            "bx r0",
            switch = sym switch_entry,
        )
    }

    /// Supervisor-call trap: locate the stacked frame on whichever
    /// stack was active at trap time (EXC_RETURN bit 2) and hand it to
    /// the gateway. The tail branch keeps lr, so the gateway's return
    /// is the exception return.
    #[unsafe(naked)]
    #[no_mangle]
    pub unsafe extern "C" fn SVCall() {
        naked_asm!(
            "tst lr, #4",
            "ite eq",
            "mrseq r0, msp",
            "mrsne r0, psp",
            "b {gateway}",
            gateway = sym gateway_entry,
        )
    }

    extern "C" fn tick_entry(saved_sp: usize) -> usize {
        unsafe { (*kernel::KERNEL_PTR).tick(saved_sp) }
    }

    extern "C" fn switch_entry(saved_sp: usize) -> usize {
        unsafe { (*kernel::KERNEL_PTR).switch_context(saved_sp) }
    }

    /// Read the request id and arguments out of the trap frame,
    /// dispatch, and write any result back into the caller's r0.
    extern "C" fn gateway_entry(frame: *mut TrapFrame) {
        unsafe {
            let frame = &mut *frame;
            let args = [frame.r1 as usize, frame.r2 as usize, frame.r3 as usize];
            if let Some(ret) = syscall::dispatch(frame.r0, args, kernel::board()) {
                frame.r0 = ret;
            }
        }
    }
}
