//! # ARMv7-A port (RealView PB-A8)
//!
//! The hardware half of the kernel: MMIO drivers for the SP804 dual
//! timer, the GICv1 interrupt controller and the PL011 UART, plus the
//! three `extern "C"` entry points the assembly trampoline jumps to.
//!
//! ## Trampoline contract
//!
//! The external exception vector saves the user register file into a
//! [`Context`] record, masks IRQs, and calls one of:
//!
//! - `rst_handler(ctx)` once at power-on
//! - `irq_handler(ctx)` on every IRQ
//! - `svc_handler(ctx, id)` on every supervisor call
//!
//! On return it reloads the (possibly rewritten) record and drops
//! back to user mode. Handlers therefore run atomically with respect
//! to user code and to each other.
//!
//! ## Interrupt plumbing
//!
//! Timer1 of the SP804 block fires GIC source 36 roughly once a
//! second. `irq_handler` acknowledges through `IAR`, clears the
//! timer, runs the scheduler, and signs off through `EOIR`. Unknown
//! sources are acknowledged and otherwise ignored.

use core::ptr::{addr_of, addr_of_mut, read_volatile, write_volatile};

use crate::config::{STACK_OFFSET, TIMER_PERIOD};
use crate::context::Context;
use crate::kernel::{BootInfo, Kernel};
use crate::serial::Serial;

// ---------------------------------------------------------------------------
// Register maps
// ---------------------------------------------------------------------------

// PL011 UART0
const UART0_BASE: usize = 0x1000_9000;
const UART_DR: usize = 0x000; // data register
const UART_FR: usize = 0x018; // flag register
const UART_FR_TXFF: u32 = 1 << 5; // transmit FIFO full

// SP804 dual timer, Timer1 half
const TIMER0_BASE: usize = 0x1001_1000;
const TIMER1_LOAD: usize = 0x000;
const TIMER1_CTRL: usize = 0x008;
const TIMER1_INTCLR: usize = 0x00C;

const TIMER_CTRL_32BIT: u32 = 0x002;
const TIMER_CTRL_IE: u32 = 0x020;
const TIMER_CTRL_PERIODIC: u32 = 0x040;
const TIMER_CTRL_ENABLE: u32 = 0x080;

// GICv1: CPU interface and distributor
const GICC_BASE: usize = 0x1E00_0000;
const GICC_CTLR: usize = 0x000;
const GICC_PMR: usize = 0x004;
const GICC_IAR: usize = 0x00C;
const GICC_EOIR: usize = 0x010;

const GICD_BASE: usize = 0x1E00_1000;
const GICD_CTLR: usize = 0x000;
const GICD_ISENABLER: usize = 0x100;

/// Interrupt source of the SP804 Timer0/1 pair on the PB-A8.
pub const GIC_SOURCE_TIMER0: u32 = 36;

// ---------------------------------------------------------------------------
// Peripheral drivers
// ---------------------------------------------------------------------------

/// Timer1 of the SP804 block, programmed as the scheduling tick.
pub struct Timer;

impl Timer {
    /// Load the tick period and start the timer: 32-bit, periodic,
    /// interrupt on wrap, enabled.
    ///
    /// # Safety
    /// MMIO to the SP804 block; call once at reset with IRQs masked.
    pub unsafe fn start_periodic() {
        write_volatile((TIMER0_BASE + TIMER1_LOAD) as *mut u32, TIMER_PERIOD);
        write_volatile(
            (TIMER0_BASE + TIMER1_CTRL) as *mut u32,
            TIMER_CTRL_32BIT | TIMER_CTRL_PERIODIC | TIMER_CTRL_IE | TIMER_CTRL_ENABLE,
        );
    }

    /// Drop the pending timer interrupt.
    ///
    /// # Safety
    /// MMIO to the SP804 block; call from the IRQ handler.
    pub unsafe fn clear_irq() {
        write_volatile((TIMER0_BASE + TIMER1_INTCLR) as *mut u32, 0x01);
    }
}

/// The GIC pair: distributor plus this core's CPU interface.
pub struct Gic;

impl Gic {
    /// Unmask the timer source and switch both halves on.
    ///
    /// # Safety
    /// MMIO to the GIC blocks; call once at reset with IRQs masked.
    pub unsafe fn enable_timer_irq() {
        // accept all priorities, then route source 36 (bit 4 of the
        // second enable register) to this core
        write_volatile((GICC_BASE + GICC_PMR) as *mut u32, 0x0000_00F0);
        let isenabler1 = (GICD_BASE + GICD_ISENABLER + 4) as *mut u32;
        write_volatile(isenabler1, read_volatile(isenabler1) | 0x0000_0010);
        write_volatile((GICC_BASE + GICC_CTLR) as *mut u32, 0x0000_0001);
        write_volatile((GICD_BASE + GICD_CTLR) as *mut u32, 0x0000_0001);
    }

    /// Read the identifier of the interrupt being taken.
    ///
    /// # Safety
    /// MMIO read with side effects; exactly once per IRQ entry.
    pub unsafe fn acknowledge() -> u32 {
        read_volatile((GICC_BASE + GICC_IAR) as *const u32)
    }

    /// Signal completion of the interrupt read from `acknowledge`.
    ///
    /// # Safety
    /// MMIO write; must pair with the matching `acknowledge`.
    pub unsafe fn complete(id: u32) {
        write_volatile((GICC_BASE + GICC_EOIR) as *mut u32, id);
    }
}

/// The PL011 UART as the kernel's serial sink.
pub struct Pl011;

impl Serial for Pl011 {
    fn putc(&mut self, byte: u8) {
        // Safety: MMIO to the UART block; the busy-wait keeps the
        // one-byte data register from being overrun.
        unsafe {
            while read_volatile((UART0_BASE + UART_FR) as *const u32) & UART_FR_TXFF != 0 {}
            write_volatile((UART0_BASE + UART_DR) as *mut u32, byte as u32);
        }
    }
}

// ---------------------------------------------------------------------------
// Kernel singleton and trampoline entry points
// ---------------------------------------------------------------------------

extern "C" {
    /// Entry point of the console user program, linked into the image.
    fn main_console();
    /// Linker-placed top of the console stack.
    static tos_console: u8;
    /// Linker-placed top of the general stack region.
    static tos_general: u8;
}

/// The one kernel instance. Handlers run with IRQs masked from
/// trampoline entry to exit, so access is serialized by construction.
static mut KERNEL: Kernel<Pl011> = Kernel::new(BootInfo::empty(), Pl011);

/// Reset: program the tick source, open the interrupt path, then hand
/// over to the kernel to build its tables and dispatch the console.
///
/// # Safety
/// Called exactly once by the trampoline with IRQs masked; `ctx`
/// points at the saved register file.
#[no_mangle]
pub unsafe extern "C" fn rst_handler(ctx: *mut Context) {
    Timer::start_periodic();
    Gic::enable_timer_irq();
    cortex_ar::interrupt::enable();

    let kernel = &mut *addr_of_mut!(KERNEL);
    kernel.boot = BootInfo {
        console_entry: main_console as usize,
        tos_console: addr_of!(tos_console) as usize,
        tos_general: addr_of!(tos_general) as usize,
        stack_offset: STACK_OFFSET,
    };
    kernel.reset(&mut *ctx);
}

/// IRQ: decode the source, tick the scheduler on the timer, and
/// acknowledge everything else untouched.
///
/// # Safety
/// Called by the trampoline with IRQs masked; `ctx` points at the
/// saved register file.
#[no_mangle]
pub unsafe extern "C" fn irq_handler(ctx: *mut Context) {
    let id = Gic::acknowledge();

    if id == GIC_SOURCE_TIMER0 {
        Timer::clear_irq();
        let kernel = &mut *addr_of_mut!(KERNEL);
        kernel.schedule(&mut *ctx);
    }

    Gic::complete(id);
}

/// Supervisor call: forward the immediate and the caller's context.
///
/// # Safety
/// Called by the trampoline with IRQs masked; `ctx` points at the
/// saved register file.
#[no_mangle]
pub unsafe extern "C" fn svc_handler(ctx: *mut Context, id: u32) {
    let kernel = &mut *addr_of_mut!(KERNEL);
    kernel.svc(&mut *ctx, id);
}
