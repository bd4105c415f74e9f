//! # TickOS — a minimal preemptive kernel
//!
//! A preemptive multitasking micro-kernel for single-core ARM
//! Cortex-M4 microcontrollers (SAM4S class). TickOS bootstraps the
//! processor from reset, registers a fixed pool of threads, drives a
//! strict FIFO round-robin scheduler from the SysTick interrupt, and
//! separates privilege: threads run unprivileged and reach the
//! hardware (LEDs, display, sensors, timed delay) only by trapping
//! into the supervisor-call gateway.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │             Application Threads (unprivileged)          │
//! ├─────────────────────────────────────────────────────────┤
//! │   syscall::user — svc traps: LEDs · display · sensors   │
//! ├────────────────────────────┬────────────────────────────┤
//! │   Kernel API (kernel.rs)   │  Privilege Gateway         │
//! │   init · create_thread     │  (syscall.rs dispatch)     │
//! │   start · yield_now        │                            │
//! ├────────────────────────────┴────────────────────────────┤
//! │   Scheduler (scheduler.rs)                              │
//! │   pool (thread.rs) · ring (queue.rs) · arena (arena.rs) │
//! ├─────────────────────────────────────────────────────────┤
//! │   Arch Port (arch/cortex_m4.rs) · Vectors (vectors.rs)  │
//! │   SysTick/PendSV trampolines · SVCall trap · SHPR3      │
//! ├─────────────────────────────────────────────────────────┤
//! │   ARM Cortex-M4 (Thumb-2) · SAM4S peripherals           │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling model
//!
//! - One execution unit; concurrency is time-slicing at a fixed
//!   ~900 µs tick. No priorities, no blocking primitives.
//! - The run queue rotates on every tick: outgoing thread to the tail,
//!   head becomes current. Given K ready threads the schedule is
//!   periodic with period K.
//! - A thread whose entry function returns parks forever; its slot is
//!   never reclaimed.
//! - Boot is not a thread: the first tick after `kernel::start` elects
//!   the queue head from scratch.
//!
//! ## Memory model
//!
//! - **No heap, no `alloc`**: all state is statically allocated.
//! - Thread stacks are carved from one static arena, top downward,
//!   and never returned.
//! - Shared kernel state lives in a single scheduler context reached
//!   through a critical section or from the (mutually serialized)
//!   interrupt handlers.

#![no_std]

pub mod arch;
pub mod arena;
pub mod board;
pub mod config;
pub mod error;
pub mod frame;
pub mod kernel;
pub mod queue;
pub mod scheduler;
pub mod sync;
pub mod syscall;
pub mod thread;
pub mod timer;
pub mod trace;
pub mod vectors;
