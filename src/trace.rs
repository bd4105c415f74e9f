//! # Kernel Log Facade
//!
//! Routes `log` records from kernel paths to an installable text sink.
//! The sink is the narrow interface to whatever debug channel the
//! board provides (serial, USB CDC, semihosting) — its internals are
//! out of scope here. With no sink installed, records are discarded
//! and the macros cost a level check.

use core::fmt::Write;
use log::{LevelFilter, Log, Metadata, Record};

static LOGGER: KernelLogger = KernelLogger;

static mut SINK: Option<fn(&str)> = None;

struct KernelLogger;

impl Log for KernelLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        unsafe { SINK }.is_some()
    }

    fn log(&self, record: &Record) {
        let Some(sink) = (unsafe { SINK }) else {
            return;
        };
        let mut out = SinkWriter(sink);
        let _ = write!(out, "{} [{}] {}\n", record.level(), record.target(), record.args());
    }

    fn flush(&self) {}
}

struct SinkWriter(fn(&str));

impl Write for SinkWriter {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        (self.0)(s);
        Ok(())
    }
}

/// Install `sink` and register the kernel logger at `Info`.
///
/// Call once, from the main thread, before `kernel::init` if boot
/// records are wanted. A second call is ignored by the `log` crate.
pub fn init(sink: fn(&str)) {
    unsafe {
        SINK = Some(sink);
    }
    let _ = log::set_logger(&LOGGER);
    log::set_max_level(LevelFilter::Info);
}
