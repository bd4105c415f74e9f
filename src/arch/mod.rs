//! # Architecture Port Layer
//!
//! The machine-level boundary of the kernel. Everything above this
//! module is portable: queue rotation, pool bookkeeping and syscall
//! dispatch never touch a register. Everything below is exactly the
//! save-current / restore-target trampolines, the trap-frame location
//! logic and the processor-state helpers the Cortex-M4 needs.

pub mod cortex_m4;
