//! # Periodic Callback Timer
//!
//! A real-time tick independent of the scheduler, driven by the SAM4S
//! Real-Time Timer off the 32 kHz slow clock. One callback may be
//! registered; [`set`] arms the timer and silently replaces any
//! earlier registration — no error is raised. The callback runs in
//! interrupt context, outside the thread model.
//!
//! The RTT prescaler is 16 bits wide, bounding the period at roughly
//! two seconds of slow-clock ticks.

use crate::config::SLOW_CLOCK_HZ;
use crate::sync;
use crate::vectors::Interrupt;
use cortex_m::peripheral::NVIC;

// SAM4S system-controller RTT block.
const RTT_MR: *mut u32 = 0x400E_1430 as *mut u32;
const RTT_VR: *const u32 = 0x400E_1438 as *const u32;

const RTT_MR_RTTINCIEN: u32 = 1 << 17;
const RTT_MR_RTTRST: u32 = 1 << 18;

/// The single registration. Written by threads under a critical
/// section, read by the RTT handler.
pub(crate) struct CallbackSlot {
    callback: Option<fn()>,
}

impl CallbackSlot {
    pub(crate) const fn new() -> Self {
        Self { callback: None }
    }

    /// Register `f`, silently replacing whatever was there.
    pub(crate) fn register(&mut self, f: fn()) {
        self.callback = Some(f);
    }

    pub(crate) fn registered(&self) -> Option<fn()> {
        self.callback
    }
}

static mut CALLBACK: CallbackSlot = CallbackSlot::new();

/// Prescaler value for a period of `ms` milliseconds of slow clock.
fn prescaler_for_ms(ms: u32) -> u32 {
    (ms as u64 * SLOW_CLOCK_HZ as u64 / 1000) as u32
}

/// Arm the timer: `callback` fires on every increment, every
/// `period_ms` milliseconds. Replaces any earlier registration.
pub fn set(period_ms: u32, callback: fn()) {
    sync::critical_section(|_cs| unsafe {
        (*core::ptr::addr_of_mut!(CALLBACK)).register(callback);
    });

    unsafe {
        // Restart the prescaler with the new period.
        core::ptr::write_volatile(RTT_MR, RTT_MR_RTTRST | prescaler_for_ms(period_ms));

        // The counter value is unreliable across a re-program; wait
        // out one slow-clock tick before trusting it.
        let before = core::ptr::read_volatile(RTT_VR);
        while core::ptr::read_volatile(RTT_VR) == before {}

        // Clear anything pending from an earlier registration, then
        // enable the increment interrupt. Priority stays at the reset
        // default (highest).
        NVIC::mask(Interrupt::Rtt);
        NVIC::unpend(Interrupt::Rtt);
        NVIC::unmask(Interrupt::Rtt);
        let mode = core::ptr::read_volatile(RTT_MR);
        core::ptr::write_volatile(RTT_MR, mode | RTT_MR_RTTINCIEN);
    }
}

/// Disarm the timer. The registration stays; a later [`set`] re-arms.
pub fn stop() {
    NVIC::mask(Interrupt::Rtt);
    NVIC::unpend(Interrupt::Rtt);
    unsafe {
        let mode = core::ptr::read_volatile(RTT_MR);
        core::ptr::write_volatile(RTT_MR, mode & !RTT_MR_RTTINCIEN);
    }
}

/// Running slow-clock tick counter.
pub fn read_elapsed() -> u32 {
    unsafe { core::ptr::read_volatile(RTT_VR) }
}

/// RTT increment interrupt: invoke the registered callback, but only
/// when the status register actually reports an increment.
#[cfg(all(target_arch = "arm", target_os = "none"))]
#[no_mangle]
extern "C" fn RTT() {
    const RTT_SR: *const u32 = 0x400E_143C as *const u32;
    const RTT_SR_RTTINC: u32 = 1 << 1;
    unsafe {
        let status = core::ptr::read_volatile(RTT_SR);
        if status & RTT_SR_RTTINC != 0 {
            if let Some(callback) = (*core::ptr::addr_of!(CALLBACK)).registered() {
                callback();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prescaler_matches_slow_clock() {
        assert_eq!(prescaler_for_ms(1000), SLOW_CLOCK_HZ);
        assert_eq!(prescaler_for_ms(500), SLOW_CLOCK_HZ / 2);
        assert_eq!(prescaler_for_ms(2000), 2 * SLOW_CLOCK_HZ);
    }

    #[test]
    fn later_registration_silently_replaces() {
        fn first() {}
        fn second() {}

        let mut slot = CallbackSlot::new();
        assert!(slot.registered().is_none());

        slot.register(first);
        assert_eq!(slot.registered(), Some(first as fn()));

        // No error, no refusal: the second registration wins.
        slot.register(second);
        assert_eq!(slot.registered(), Some(second as fn()));
    }
}
