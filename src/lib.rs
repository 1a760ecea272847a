//! # FairOS
//!
//! A minimal preemptive multitasking kernel for the single-core
//! ARMv7-A RealView PB-A8 board. Scheduling is priority-with-aging:
//! every process carries a base priority, a user-tunable niceness and
//! an age that grows while it waits, so any runnable process
//! eventually wins the CPU no matter how it is biased.
//!
//! ## Architecture
//!
//! ```text
//! +-------------------------------------------------------+
//! |                  User processes                        |
//! |        console, forked children, pipe peers            |
//! +-------------------------------------------------------+
//! |        Assembly trampoline (external, lolevel)         |
//! |   saves the register file, calls rst/irq/svc below     |
//! +-------------------------------------------------------+
//! |            Entry points (arch/armv7a.rs)               |
//! |      rst_handler . irq_handler . svc_handler           |
//! +--------------+--------------------+-------------------+
//! |  Scheduler   |  Syscall surface   |  Pipe IPC         |
//! | scheduler.rs |  syscall.rs        |  pipe.rs / fd.rs  |
//! |  - schedule()|  - yield/fork/exec |  - ring buffer    |
//! |  - aging     |  - read/write/pipe |  - fd table       |
//! +--------------+--------------------+-------------------+
//! |          Kernel state (kernel.rs)                      |
//! |    PCB table . executing cursor . dispatch()           |
//! +-------------------------------------------------------+
//! |     SP804 timer . GICv1 . PL011 (arch/armv7a.rs)       |
//! +-------------------------------------------------------+
//! ```
//!
//! ## Execution model
//!
//! The kernel runs only inside exception handlers. The trampoline
//! enters with IRQs masked and hands over a mutable [`Context`]; the
//! handlers mutate it (and the kernel tables) and return, which is how
//! a context switch happens. Preemption comes from the periodic SP804
//! tick; cooperation comes from the `yield` syscall. Pipes are
//! non-blocking on both ends, so user code polls with `yield`.
//!
//! ## Memory model
//!
//! - No heap, no `alloc`: the PCB table, descriptor table and every
//!   pipe ring live in one statically allocated [`kernel::Kernel`]
//!   record.
//! - Process stacks are carved from linker-provided regions
//!   (`tos_console`, `tos_general`) and copied on fork.
//! - Handlers run with IRQs masked end to end, so kernel state needs
//!   no further locking on this single core.
//!
//! [`Context`]: context::Context

#![cfg_attr(not(test), no_std)]

#[cfg(target_arch = "arm")]
use panic_halt as _;

pub mod arch;
pub mod config;
pub mod context;
pub mod fd;
pub mod kernel;
pub mod pipe;
pub mod process;
pub mod scheduler;
pub mod serial;
pub mod syscall;

/// Shared fixtures for the host-side tests: a capturing serial sink
/// and a kernel booted against a leaked arena, so stack copies and
/// user buffers hit real memory.
#[cfg(test)]
pub(crate) mod testkit {
    use crate::config::STACK_OFFSET;
    use crate::context::Context;
    use crate::kernel::{BootInfo, Kernel};
    use crate::serial::Serial;

    /// Serial sink that records every byte for assertions.
    pub struct TraceLog {
        pub log: Vec<u8>,
    }

    impl TraceLog {
        pub fn new() -> Self {
            Self { log: Vec::new() }
        }
    }

    impl Serial for TraceLog {
        fn putc(&mut self, byte: u8) {
            self.log.push(byte);
        }
    }

    /// Arena large enough for the console stack plus every general
    /// stack slot the PCB table can hand out.
    pub const ARENA: usize = 0x22000;

    /// Fake console entry point installed into PCB[0].
    pub const CONSOLE_ENTRY: usize = 0x8000;

    /// Boot a kernel against a fresh arena and run the reset handler.
    /// Returns the kernel and the live context the trampoline would
    /// own.
    pub fn boot() -> (Kernel<TraceLog>, Context) {
        let arena: &'static mut [u8; ARENA] = Box::leak(Box::new([0u8; ARENA]));
        let base = arena.as_ptr() as usize;
        let boot = BootInfo {
            console_entry: CONSOLE_ENTRY,
            tos_console: base + 0x1000,
            tos_general: base + ARENA,
            stack_offset: STACK_OFFSET,
        };
        let mut kernel = Kernel::new(boot, TraceLog::new());
        let mut ctx = Context::zeroed();
        kernel.reset(&mut ctx);
        (kernel, ctx)
    }

    /// The trace emitted so far, as a string.
    pub fn trace(kernel: &Kernel<TraceLog>) -> String {
        String::from_utf8_lossy(&kernel.serial.log).into_owned()
    }

    /// Handler-return invariant: exactly one slot is EXECUTING and
    /// the cursor names it.
    pub fn assert_single_executing<S: Serial>(kernel: &Kernel<S>) {
        use crate::config::MAX_PROCS;
        use crate::process::Status;

        let executing: Vec<usize> = (0..MAX_PROCS)
            .filter(|&i| kernel.procs[i].status == Status::Executing)
            .collect();
        assert_eq!(executing.len(), 1, "exactly one EXECUTING slot");
        let cursor = kernel.executing.expect("cursor set");
        assert_eq!(kernel.procs[cursor].pid, kernel.procs[executing[0]].pid);
    }
}
