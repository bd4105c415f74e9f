//! # Stack Frames
//!
//! Register-frame layout for context switching. This is a small fixed
//! binary ABI, not an ordinary data structure: the upper eight words
//! must match the Cortex-M hardware exception-entry convention exactly,
//! and the lower eight words match the order in which the switch
//! trampolines push and pop the callee-saved registers
//! (`stmdb {r4-r11}` / `ldmia {r4-r11}`).
//!
//! ## Layout (ascending addresses)
//!
//! ```text
//! sp ->  r4  r5  r6  r7  r8  r9  r10 r11     software frame (kernel-saved)
//!        r0  r1  r2  r3  r12 lr  pc  xpsr    hardware frame (CPU-saved)
//! <- top of the thread's stack slice
//! ```
//!
//! A thread that has never executed gets this full frame pre-built at
//! creation, so restoring it for the first time is indistinguishable,
//! from the CPU's perspective, from resuming a thread that was
//! preempted mid-run.

use crate::config::INITIAL_XPSR;

/// Total words in a saved context: 8 software + 8 hardware.
pub const FRAME_WORDS: usize = 16;

/// Byte size of a saved context.
pub const FRAME_BYTES: usize = FRAME_WORDS * 4;

/// Word offsets into a saved context, counted from the saved stack
/// pointer upward.
pub mod offset {
    pub const R4: usize = 0;
    pub const R5: usize = 1;
    pub const R6: usize = 2;
    pub const R7: usize = 3;
    pub const R8: usize = 4;
    pub const R9: usize = 5;
    pub const R10: usize = 6;
    pub const R11: usize = 7;
    pub const R0: usize = 8;
    pub const R1: usize = 9;
    pub const R2: usize = 10;
    pub const R3: usize = 11;
    pub const R12: usize = 12;
    pub const LR: usize = 13;
    pub const PC: usize = 14;
    pub const XPSR: usize = 15;
}

/// The hardware exception frame as stacked by the CPU on trap entry.
///
/// The supervisor-call gateway views the active stack through this
/// struct to read the request id and arguments and to write the result
/// back into the caller's r0.
#[repr(C)]
pub struct TrapFrame {
    pub r0: u32,
    pub r1: u32,
    pub r2: u32,
    pub r3: u32,
    pub r12: u32,
    pub lr: u32,
    pub pc: u32,
    pub xpsr: u32,
}

/// Build the initial context for a thread that has never run.
///
/// General-purpose registers start zeroed, `lr` points at the
/// de-scheduling routine the thread falls into if its entry function
/// returns, `pc` at the entry function, and `xpsr` carries the fixed
/// initial value (Thumb bit set).
pub fn initial_frame(entry: u32, exit: u32) -> [u32; FRAME_WORDS] {
    let mut words = [0u32; FRAME_WORDS];
    words[offset::LR] = exit;
    words[offset::PC] = entry;
    words[offset::XPSR] = INITIAL_XPSR;
    words
}

/// Write the initial context into memory so that `stack_top` sits
/// immediately above it, and return the address the saved stack
/// pointer must take.
///
/// # Safety
/// `stack_top` must be 8-byte aligned and the `FRAME_BYTES` below it
/// must be writable memory owned by the new thread's stack slice.
pub unsafe fn install(stack_top: usize, entry: u32, exit: u32) -> usize {
    debug_assert!(stack_top % 8 == 0);
    let sp = stack_top - FRAME_BYTES;
    let words = initial_frame(entry, exit);
    let dst = sp as *mut u32;
    for (i, word) in words.iter().enumerate() {
        dst.add(i).write_volatile(*word);
    }
    sp
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_frame_layout() {
        let frame = initial_frame(0x0800_1235, 0x0800_0101);
        for i in offset::R4..=offset::R12 {
            assert_eq!(frame[i], 0);
        }
        assert_eq!(frame[offset::LR], 0x0800_0101);
        assert_eq!(frame[offset::PC], 0x0800_1235);
        assert_eq!(frame[offset::XPSR], INITIAL_XPSR);
    }

    #[test]
    fn install_places_frame_below_stack_top() {
        let mut stack = [0u64; 32];
        let top = stack.as_mut_ptr() as usize + core::mem::size_of_val(&stack);
        let sp = unsafe { install(top, 0xAAAA_AAA1, 0xBBBB_BBB1) };
        assert_eq!(sp, top - FRAME_BYTES);

        let words = unsafe { core::slice::from_raw_parts(sp as *const u32, FRAME_WORDS) };
        assert_eq!(words[offset::PC], 0xAAAA_AAA1);
        assert_eq!(words[offset::LR], 0xBBBB_BBB1);
        assert_eq!(words[offset::XPSR], INITIAL_XPSR);
        assert_eq!(words[offset::R0], 0);
        assert_eq!(words[offset::R11], 0);
    }

    /// A never-run thread's frame must be byte-identical, in register
    /// layout, to the frame of a thread genuinely preempted at its
    /// first instruction with all general-purpose registers still zero.
    #[test]
    fn initial_frame_matches_preemption_frame() {
        let entry = 0x0800_4001u32;
        let exit = 0x0800_0ED1u32;
        let built = initial_frame(entry, exit);

        // What the hardware plus the save trampoline would lay down for
        // a thread interrupted before executing anything: r4-r11 pushed
        // by the kernel, r0-r3/r12/lr/pc/xpsr stacked by the CPU.
        let mut preempted = [0u32; FRAME_WORDS];
        preempted[offset::LR] = exit;
        preempted[offset::PC] = entry;
        preempted[offset::XPSR] = INITIAL_XPSR;

        assert_eq!(built, preempted);
    }
}
