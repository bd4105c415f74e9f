//! # TickOS Demo Firmware
//!
//! Three threads sharing the machine through the gateway:
//!
//! | Thread        | Stack | Behavior                                     |
//! |---------------|-------|----------------------------------------------|
//! | `heartbeat`   | 256 B | walks the LED channels on and off            |
//! | `temperature` | 384 B | samples the sensor, renders °C and a verdict |
//! | `light`       | 384 B | samples the ADC, renders a brightness %      |
//!
//! The periodic callback timer runs alongside the thread model,
//! counting uptime seconds from interrupt context.
//!
//! The demo installs [`tickos::board::NullBoard`]; a real port of the
//! SSD1306 display, AT30TSE temperature sensor and light-sensor ADC
//! plugs in behind `tickos::board::Board` without touching the kernel.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod firmware {
    use core::fmt::Write;
    use core::sync::atomic::{AtomicU32, Ordering};

    use cortex_m_rt::entry;
    use panic_halt as _;

    use tickos::board::{Led, NullBoard};
    use tickos::syscall::user;
    use tickos::{kernel, timer, trace};

    static BOARD: NullBoard = NullBoard;

    /// Seconds since boot, bumped by the callback timer.
    static UPTIME_SECONDS: AtomicU32 = AtomicU32::new(0);

    fn uptime_tick() {
        UPTIME_SECONDS.fetch_add(1, Ordering::Relaxed);
    }

    /// Debug text sink for the kernel log. Wire the board's serial or
    /// USB CDC console here; the demo discards records.
    fn debug_sink(_text: &str) {}

    // -----------------------------------------------------------------------
    // Threads
    // -----------------------------------------------------------------------

    /// Walks LED1..LED3 on and off forever.
    extern "C" fn heartbeat() {
        let channels = [Led::Led1, Led::Led2, Led::Led3];
        loop {
            for led in channels {
                user::led_set(led, true);
                user::delay_ms(130);
                user::led_set(led, false);
                user::delay_ms(130);
            }
        }
    }

    /// Renders the temperature and a comfort verdict on the display.
    extern "C" fn temperature() {
        loop {
            let milli = user::read_temperature_milli_c();

            let mut line = LineBuf::new();
            let _ = write!(line, "{} c", milli / 1000);
            user::write_string_at(line.as_str(), 1, 106);

            if milli > 22_000 {
                user::write_string_at("VERY HOT", 2, 87);
            } else if milli < 21_000 {
                user::write_string_at("TOO COLD", 2, 87);
            } else {
                user::write_string_at("__________", 2, 87);
            }
            user::delay_ms(500);
        }
    }

    /// Renders the ambient brightness as a percentage.
    extern "C" fn light() {
        loop {
            let raw = user::read_light_raw();
            // 12-bit conversion, inverted: dark reads high.
            let percent = 100 - raw * 100 / 4096;

            let mut line = LineBuf::new();
            let _ = write!(line, "{} %", percent);
            user::write_string_at(line.as_str(), 0, 106);

            if percent < 20 {
                user::write_string_at("VERY DARK", 2, 0);
            } else if percent > 80 {
                user::write_string_at("TOO BRIGHT", 2, 0);
            } else {
                user::write_string_at("_____________", 2, 0);
            }
            user::delay_ms(500);
        }
    }

    // -----------------------------------------------------------------------
    // Entry
    // -----------------------------------------------------------------------

    #[entry]
    fn main() -> ! {
        let cp = cortex_m::Peripherals::take().unwrap();

        trace::init(debug_sink);
        kernel::init(&BOARD);

        kernel::create_thread(heartbeat, "heartbeat", 256).expect("heartbeat thread");
        kernel::create_thread(temperature, "temperature", 384).expect("temperature thread");
        kernel::create_thread(light, "light", 384).expect("light thread");

        boot_banner();
        timer::set(1000, uptime_tick);

        kernel::start(cp)
    }

    /// One privileged display write before scheduling starts; after
    /// `kernel::start` only threads draw, through the gateway.
    fn boot_banner() {
        use tickos::board::Board;
        BOARD.display_clear();
        BOARD.display_write(0, 0, "TickOS");
    }

    // -----------------------------------------------------------------------
    // Small fixed-size line formatter
    // -----------------------------------------------------------------------

    struct LineBuf {
        buf: [u8; 16],
        len: usize,
    }

    impl LineBuf {
        const fn new() -> Self {
            Self { buf: [0; 16], len: 0 }
        }

        fn as_str(&self) -> &str {
            core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
        }
    }

    impl Write for LineBuf {
        fn write_str(&mut self, s: &str) -> core::fmt::Result {
            let room = self.buf.len() - self.len;
            let take = s.len().min(room);
            self.buf[self.len..self.len + take].copy_from_slice(&s.as_bytes()[..take]);
            self.len += take;
            Ok(())
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
