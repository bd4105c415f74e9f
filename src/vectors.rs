//! # Exception & Interrupt Vectors
//!
//! The device half of the vector table plus the fault policy.
//!
//! `cortex-m-rt` owns slots 0-15 (initial MSP, reset, core
//! exceptions); the kernel binds SVCall, PendSV and SysTick there by
//! exporting strong symbols from the arch port. This module supplies
//! the 35 SAM4S peripheral slots. Every handler is PROVIDEd as
//! `DefaultHandler` in `device.x`, so an unused slot lands in the
//! diagnostic handler below; the real-time timer overrides its slot in
//! `timer.rs`.
//!
//! Faults are not resumable here: nothing in this kernel can repair
//! arbitrary faulted register state, so each fault handler reports
//! once and parks the machine.

use cortex_m::interrupt::InterruptNumber;
use cortex_m_rt::{exception, ExceptionFrame};

/// SAM4S peripheral interrupt numbers the kernel touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    /// Real-Time Timer increment/alarm.
    Rtt = 3,
}

unsafe impl InterruptNumber for Interrupt {
    fn number(self) -> u16 {
        self as u16
    }
}

// ---------------------------------------------------------------------------
// Peripheral vector table (slots 16..51)
// ---------------------------------------------------------------------------

#[cfg(all(target_arch = "arm", target_os = "none"))]
extern "C" {
    fn SUPC();
    fn RSTC();
    fn RTC();
    fn RTT();
    fn WDT();
    fn PMC();
    fn EFC0();
    fn EFC1();
    fn UART0();
    fn UART1();
    fn SMC();
    fn PIOA();
    fn PIOB();
    fn PIOC();
    fn USART0();
    fn USART1();
    fn HSMCI();
    fn TWI0();
    fn TWI1();
    fn SPI();
    fn SSC();
    fn TC0();
    fn TC1();
    fn TC2();
    fn TC3();
    fn TC4();
    fn TC5();
    fn ADC();
    fn DACC();
    fn PWM();
    fn CRCCU();
    fn ACC();
    fn UDP();
}

#[doc(hidden)]
pub union Vector {
    _handler: unsafe extern "C" fn(),
    _reserved: usize,
}

#[cfg(all(target_arch = "arm", target_os = "none"))]
#[doc(hidden)]
#[link_section = ".vector_table.interrupts"]
#[no_mangle]
pub static __INTERRUPTS: [Vector; 35] = [
    Vector { _handler: SUPC },   // 0  Supply Controller
    Vector { _handler: RSTC },   // 1  Reset Controller
    Vector { _handler: RTC },    // 2  Real Time Clock
    Vector { _handler: RTT },    // 3  Real Time Timer
    Vector { _handler: WDT },    // 4  Watchdog Timer
    Vector { _handler: PMC },    // 5  Power Management Controller
    Vector { _handler: EFC0 },   // 6  Flash Controller 0
    Vector { _handler: EFC1 },   // 7  Flash Controller 1
    Vector { _handler: UART0 },  // 8
    Vector { _handler: UART1 },  // 9
    Vector { _handler: SMC },    // 10 Static Memory Controller
    Vector { _handler: PIOA },   // 11 Parallel IO A
    Vector { _handler: PIOB },   // 12 Parallel IO B
    Vector { _handler: PIOC },   // 13 Parallel IO C
    Vector { _handler: USART0 }, // 14
    Vector { _handler: USART1 }, // 15
    Vector { _reserved: 0 },     // 16
    Vector { _reserved: 0 },     // 17
    Vector { _handler: HSMCI },  // 18 Multimedia Card Interface
    Vector { _handler: TWI0 },   // 19 Two-Wire Interface 0
    Vector { _handler: TWI1 },   // 20 Two-Wire Interface 1
    Vector { _handler: SPI },    // 21
    Vector { _handler: SSC },    // 22 Synchronous Serial Controller
    Vector { _handler: TC0 },    // 23 Timer Counter 0
    Vector { _handler: TC1 },    // 24 Timer Counter 1
    Vector { _handler: TC2 },    // 25 Timer Counter 2
    Vector { _handler: TC3 },    // 26 Timer Counter 3
    Vector { _handler: TC4 },    // 27 Timer Counter 4
    Vector { _handler: TC5 },    // 28 Timer Counter 5
    Vector { _handler: ADC },    // 29 ADC Controller
    Vector { _handler: DACC },   // 30 DAC Controller
    Vector { _handler: PWM },    // 31
    Vector { _handler: CRCCU },  // 32 CRC Calculation Unit
    Vector { _handler: ACC },    // 33 Analog Comparator
    Vector { _handler: UDP },    // 34 USB Device Port
];

// ---------------------------------------------------------------------------
// Fault policy
// ---------------------------------------------------------------------------

#[exception]
unsafe fn HardFault(frame: &ExceptionFrame) -> ! {
    log::error!("hard fault at pc={:#010x}", frame.pc());
    loop {}
}

#[exception]
unsafe fn MemoryManagement() -> ! {
    log::error!("memory management fault");
    loop {}
}

#[exception]
unsafe fn BusFault() -> ! {
    log::error!("bus fault");
    loop {}
}

#[exception]
unsafe fn UsageFault() -> ! {
    log::error!("usage fault");
    loop {}
}

#[exception]
unsafe fn NonMaskableInt() -> ! {
    log::error!("non-maskable interrupt");
    loop {}
}

/// Everything not explicitly bound ends up here.
#[exception]
unsafe fn DefaultHandler(irqn: i16) -> ! {
    log::error!("unexpected exception or interrupt {}", irqn);
    loop {}
}
