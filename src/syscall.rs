//! # Supervisor Calls
//!
//! The privilege gateway's operation set and dispatch, plus the
//! unprivileged wrappers threads call.
//!
//! ## Request convention
//!
//! Every trap is `svc 0` with the operation id in r0 and up to three
//! arguments in r1-r3; value-returning operations come back in r0.
//! (The id deliberately does not travel in the instruction immediate —
//! see DESIGN.md for the recorded substitution.) The id numbering is
//! kept bit-for-bit compatible with the existing enumeration, so gaps
//! remain gaps.
//!
//! An id outside the enumerated set is never fatal: the gateway
//! renders a visible diagnostic on the display, logs a warning and
//! carries on.

use crate::board::{Board, Led};

/// Operation ids accepted by the gateway. Discriminants are a stable
/// wire format; do not renumber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum Syscall {
    Led0Off = 0,
    Led0On = 1,
    Led1Off = 2,
    Led1On = 3,
    Led2Off = 4,
    Led2On = 5,
    Led3Off = 6,
    Led3On = 7,
    ReadTemperature = 8,
    ReadLight = 9,
    WriteChar = 18,
    WriteString = 19,
    WriteStringAt = 20,
    DelayMs = 21,
    ClearScreen = 22,
    /// Give up the rest of the current quantum. Not part of the
    /// inherited numbering; appended because pending the switch
    /// exception needs privilege, so a thread's yield must trap.
    Yield = 23,
}

impl Syscall {
    /// Every defined operation, in id order. The dispatch match below
    /// is exhaustive over this set; the mapping tests check the ids
    /// round-trip.
    pub const ALL: [Syscall; 16] = [
        Syscall::Led0Off,
        Syscall::Led0On,
        Syscall::Led1Off,
        Syscall::Led1On,
        Syscall::Led2Off,
        Syscall::Led2On,
        Syscall::Led3Off,
        Syscall::Led3On,
        Syscall::ReadTemperature,
        Syscall::ReadLight,
        Syscall::WriteChar,
        Syscall::WriteString,
        Syscall::WriteStringAt,
        Syscall::DelayMs,
        Syscall::ClearScreen,
        Syscall::Yield,
    ];

    pub const fn id(self) -> u32 {
        self as u32
    }

    pub fn from_id(id: u32) -> Option<Syscall> {
        Syscall::ALL.iter().copied().find(|op| op.id() == id)
    }
}

/// Dispatch one trapped request against the installed board.
///
/// `args` are the caller's r1-r3; the return value, if any, belongs in
/// the caller's stacked r0.
///
/// # Safety
/// For the string operations, `args[0]`/`args[1]` must describe memory
/// readable for the duration of the call. The gateway trusts the
/// unprivileged caller here; there is no MPU backstop.
pub unsafe fn dispatch(id: u32, args: [usize; 3], board: &dyn Board) -> Option<u32> {
    let Some(op) = Syscall::from_id(id) else {
        log::warn!("unknown supervisor request id {}", id);
        board.display_write(0, 0, "unknown supervisor request");
        return None;
    };

    match op {
        Syscall::Led0Off => board.led_set(Led::Led0, false),
        Syscall::Led0On => board.led_set(Led::Led0, true),
        Syscall::Led1Off => board.led_set(Led::Led1, false),
        Syscall::Led1On => board.led_set(Led::Led1, true),
        Syscall::Led2Off => board.led_set(Led::Led2, false),
        Syscall::Led2On => board.led_set(Led::Led2, true),
        Syscall::Led3Off => board.led_set(Led::Led3, false),
        Syscall::Led3On => board.led_set(Led::Led3, true),
        Syscall::ReadTemperature => return Some(board.read_temperature_milli_c() as u32),
        Syscall::ReadLight => return Some(board.read_light_raw()),
        Syscall::WriteChar => {
            let byte = [args[0] as u8];
            if let Ok(text) = core::str::from_utf8(&byte) {
                board.display_write(0, 0, text);
            }
        }
        Syscall::WriteString => {
            if let Some(text) = user_str(args[0], args[1]) {
                board.display_write(args[2] as u8, 0, text);
            }
        }
        Syscall::WriteStringAt => {
            if let Some(text) = user_str(args[0], args[1]) {
                let page = (args[2] >> 8) as u8;
                let column = args[2] as u8;
                board.display_write(page, column, text);
            }
        }
        Syscall::DelayMs => board.delay_ms(args[0] as u32),
        Syscall::ClearScreen => board.display_clear(),
        Syscall::Yield => crate::kernel::yield_now(),
    }
    None
}

/// View a caller-supplied pointer/length pair as a str, rejecting null
/// pointers and invalid UTF-8 rather than faulting on them.
unsafe fn user_str<'a>(ptr: usize, len: usize) -> Option<&'a str> {
    if ptr == 0 {
        return None;
    }
    let bytes = core::slice::from_raw_parts(ptr as *const u8, len);
    core::str::from_utf8(bytes).ok()
}

// ---------------------------------------------------------------------------
// Unprivileged wrappers
// ---------------------------------------------------------------------------

/// Thread-side request API. These are the only way unprivileged code
/// reaches the hardware.
pub mod user {
    use super::Syscall;
    use crate::board::Led;

    #[cfg(all(target_arch = "arm", target_os = "none"))]
    fn trap(op: Syscall, a: usize, b: usize, c: usize) -> usize {
        let mut ret = op.id() as usize;
        unsafe {
            core::arch::asm!(
                "svc 0",
                inout("r0") ret,
                in("r1") a,
                in("r2") b,
                in("r3") c,
                options(nostack),
            );
        }
        ret
    }

    #[cfg(not(all(target_arch = "arm", target_os = "none")))]
    fn trap(op: Syscall, a: usize, b: usize, c: usize) -> usize {
        let _ = (op, a, b, c);
        unimplemented!("supervisor traps require the Cortex-M target")
    }

    /// Drive an LED channel.
    pub fn led_set(led: Led, on: bool) {
        let op = match (led, on) {
            (Led::Led0, false) => Syscall::Led0Off,
            (Led::Led0, true) => Syscall::Led0On,
            (Led::Led1, false) => Syscall::Led1Off,
            (Led::Led1, true) => Syscall::Led1On,
            (Led::Led2, false) => Syscall::Led2Off,
            (Led::Led2, true) => Syscall::Led2On,
            (Led::Led3, false) => Syscall::Led3Off,
            (Led::Led3, true) => Syscall::Led3On,
        };
        trap(op, 0, 0, 0);
    }

    /// Render a single character at the display origin.
    pub fn write_char(c: char) {
        trap(Syscall::WriteChar, c as usize, 0, 0);
    }

    /// Render `text` at the start of display page 0-3.
    pub fn write_string(text: &str, page: u8) {
        trap(
            Syscall::WriteString,
            text.as_ptr() as usize,
            text.len(),
            page as usize,
        );
    }

    /// Render `text` at an explicit page and column.
    pub fn write_string_at(text: &str, page: u8, column: u8) {
        trap(
            Syscall::WriteStringAt,
            text.as_ptr() as usize,
            text.len(),
            (page as usize) << 8 | column as usize,
        );
    }

    /// Blank the display.
    pub fn clear_screen() {
        trap(Syscall::ClearScreen, 0, 0, 0);
    }

    /// Sample the temperature sensor, in millidegrees Celsius.
    pub fn read_temperature_milli_c() -> i32 {
        trap(Syscall::ReadTemperature, 0, 0, 0) as i32
    }

    /// Raw reading from the light sensor's ADC channel.
    pub fn read_light_raw() -> u32 {
        trap(Syscall::ReadLight, 0, 0, 0) as u32
    }

    /// Busy-wait for `ms` milliseconds inside the gateway.
    pub fn delay_ms(ms: u32) {
        trap(Syscall::DelayMs, ms as usize, 0, 0);
    }

    /// Give up the rest of the current quantum. The switch runs ahead
    /// of the next tick unless a tick is already pending.
    pub fn yield_now() {
        trap(Syscall::Yield, 0, 0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::{AtomicI32, AtomicU32, AtomicUsize, Ordering};

    /// Board that counts every operation it receives.
    #[derive(Default)]
    struct RecordingBoard {
        led_calls: AtomicUsize,
        last_led: AtomicUsize, // led index * 2 + on
        writes: AtomicUsize,
        last_page: AtomicUsize,
        last_column: AtomicUsize,
        last_len: AtomicUsize,
        clears: AtomicUsize,
        temp_reads: AtomicUsize,
        light_reads: AtomicUsize,
        delays: AtomicUsize,
        last_delay: AtomicU32,
        temperature: AtomicI32,
        light: AtomicU32,
    }

    impl Board for RecordingBoard {
        fn init(&self) {}
        fn led_set(&self, led: Led, on: bool) {
            self.led_calls.fetch_add(1, Ordering::Relaxed);
            self.last_led
                .store(led as usize * 2 + on as usize, Ordering::Relaxed);
        }
        fn display_clear(&self) {
            self.clears.fetch_add(1, Ordering::Relaxed);
        }
        fn display_write(&self, page: u8, column: u8, text: &str) {
            self.writes.fetch_add(1, Ordering::Relaxed);
            self.last_page.store(page as usize, Ordering::Relaxed);
            self.last_column.store(column as usize, Ordering::Relaxed);
            self.last_len.store(text.len(), Ordering::Relaxed);
        }
        fn read_temperature_milli_c(&self) -> i32 {
            self.temp_reads.fetch_add(1, Ordering::Relaxed);
            self.temperature.load(Ordering::Relaxed)
        }
        fn read_light_raw(&self) -> u32 {
            self.light_reads.fetch_add(1, Ordering::Relaxed);
            self.light.load(Ordering::Relaxed)
        }
        fn delay_ms(&self, ms: u32) {
            self.delays.fetch_add(1, Ordering::Relaxed);
            self.last_delay.store(ms, Ordering::Relaxed);
        }
    }

    fn counts(board: &RecordingBoard) -> [usize; 6] {
        [
            board.led_calls.load(Ordering::Relaxed),
            board.writes.load(Ordering::Relaxed),
            board.clears.load(Ordering::Relaxed),
            board.temp_reads.load(Ordering::Relaxed),
            board.light_reads.load(Ordering::Relaxed),
            board.delays.load(Ordering::Relaxed),
        ]
    }

    #[test]
    fn id_mapping_is_total_and_stable() {
        for op in Syscall::ALL {
            assert_eq!(Syscall::from_id(op.id()), Some(op));
        }
        assert_eq!(Syscall::Led0Off.id(), 0);
        assert_eq!(Syscall::ReadTemperature.id(), 8);
        assert_eq!(Syscall::WriteChar.id(), 18);
        assert_eq!(Syscall::ClearScreen.id(), 22);
        assert_eq!(Syscall::Yield.id(), 23);
        // The numbering has gaps; they are not operations.
        for hole in [10, 11, 17, 24, 99] {
            assert_eq!(Syscall::from_id(hole), None);
        }
    }

    #[test]
    fn each_operation_touches_only_its_peripheral() {
        for op in Syscall::ALL {
            let board = RecordingBoard::default();
            let text = "hi";
            let args = match op {
                Syscall::WriteString => [text.as_ptr() as usize, text.len(), 1],
                Syscall::WriteStringAt => [text.as_ptr() as usize, text.len(), 2 << 8 | 87],
                Syscall::WriteChar => ['x' as usize, 0, 0],
                Syscall::DelayMs => [250, 0, 0],
                _ => [0, 0, 0],
            };
            unsafe { dispatch(op.id(), args, &board) };

            let expected = match op {
                Syscall::Led0Off
                | Syscall::Led0On
                | Syscall::Led1Off
                | Syscall::Led1On
                | Syscall::Led2Off
                | Syscall::Led2On
                | Syscall::Led3Off
                | Syscall::Led3On => [1, 0, 0, 0, 0, 0],
                Syscall::WriteChar | Syscall::WriteString | Syscall::WriteStringAt => {
                    [0, 1, 0, 0, 0, 0]
                }
                Syscall::ClearScreen => [0, 0, 1, 0, 0, 0],
                Syscall::ReadTemperature => [0, 0, 0, 1, 0, 0],
                Syscall::ReadLight => [0, 0, 0, 0, 1, 0],
                Syscall::DelayMs => [0, 0, 0, 0, 0, 1],
                // A yield pends the switch exception; no peripheral moves.
                Syscall::Yield => [0, 0, 0, 0, 0, 0],
            };
            assert_eq!(counts(&board), expected, "{:?}", op);
        }
    }

    #[test]
    fn led_channels_map_to_distinct_states() {
        let board = RecordingBoard::default();
        unsafe { dispatch(Syscall::Led2On.id(), [0, 0, 0], &board) };
        assert_eq!(board.last_led.load(Ordering::Relaxed), Led::Led2 as usize * 2 + 1);
        unsafe { dispatch(Syscall::Led3Off.id(), [0, 0, 0], &board) };
        assert_eq!(board.last_led.load(Ordering::Relaxed), Led::Led3 as usize * 2);
    }

    #[test]
    fn unknown_id_takes_only_the_diagnostic_path() {
        let board = RecordingBoard::default();
        let result = unsafe { dispatch(99, [0, 0, 0], &board) };
        assert_eq!(result, None);
        // One display write (the diagnostic), nothing else.
        assert_eq!(counts(&board), [0, 1, 0, 0, 0, 0]);
        assert_eq!(board.last_page.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn sensor_reads_return_through_r0() {
        let board = RecordingBoard::default();
        board.temperature.store(21_500, Ordering::Relaxed);
        board.light.store(0x0ABC, Ordering::Relaxed);

        let temp = unsafe { dispatch(Syscall::ReadTemperature.id(), [0, 0, 0], &board) };
        assert_eq!(temp, Some(21_500));
        let light = unsafe { dispatch(Syscall::ReadLight.id(), [0, 0, 0], &board) };
        assert_eq!(light, Some(0x0ABC));

        let none = unsafe { dispatch(Syscall::DelayMs.id(), [5, 0, 0], &board) };
        assert_eq!(none, None);
        assert_eq!(board.last_delay.load(Ordering::Relaxed), 5);
    }

    #[test]
    fn positioned_write_unpacks_page_and_column() {
        let board = RecordingBoard::default();
        let text = "VERY HOT";
        let args = [text.as_ptr() as usize, text.len(), 2 << 8 | 87];
        unsafe { dispatch(Syscall::WriteStringAt.id(), args, &board) };
        assert_eq!(board.last_page.load(Ordering::Relaxed), 2);
        assert_eq!(board.last_column.load(Ordering::Relaxed), 87);
        assert_eq!(board.last_len.load(Ordering::Relaxed), text.len());
    }

    #[test]
    fn null_or_garbage_strings_are_dropped() {
        let board = RecordingBoard::default();
        unsafe { dispatch(Syscall::WriteString.id(), [0, 12, 1], &board) };
        assert_eq!(counts(&board), [0, 0, 0, 0, 0, 0]);
    }
}
