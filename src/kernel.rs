//! # Kernel state and dispatch
//!
//! All kernel singletons live in one [`Kernel`] record: the PCB
//! table, the descriptor table with its pipe arena, the `executing`
//! cursor and the fork bookkeeping. The trampoline's entry points in
//! `arch::armv7a` own the single instance and feed it the live
//! [`Context`] on every exception.
//!
//! ## Reset sequence
//!
//! Peripherals are programmed by the arch layer first (timer, GIC,
//! CPU IRQ unmask); [`Kernel::reset`] then blanks the tables, builds
//! PCB[0] around the console program and dispatches into it. From
//! that point the system is driven entirely by timer IRQs and
//! supervisor calls.
//!
//! ## Trace stream
//!
//! The kernel narrates itself on the serial sink: `A` at reset, one
//! letter per syscall that has one, and `[p->n]` on every dispatch,
//! with the pids as ASCII digits.

use crate::config::{DEFAULT_PRIORITY, MAX_PROCS, STACK_OFFSET};
use crate::context::{Context, CPSR_USR};
use crate::fd::FdTable;
use crate::process::{Pcb, Status};
use crate::serial::Serial;

/// Addresses the kernel cannot know at compile time: the console
/// program's entry point and the linker-placed stack regions. The
/// arch layer fills this in from the image symbols before reset runs.
pub struct BootInfo {
    /// Entry point installed as PCB[0]'s program counter.
    pub console_entry: usize,
    /// Top of the console stack, PCB[0]'s `tos`.
    pub tos_console: usize,
    /// Top of the region fresh forks carve stacks from.
    pub tos_general: usize,
    /// Descent between consecutive fresh stacks.
    pub stack_offset: usize,
}

impl BootInfo {
    /// Placeholder for the static instance; overwritten at reset.
    pub const fn empty() -> Self {
        Self {
            console_entry: 0,
            tos_console: 0,
            tos_general: 0,
            stack_offset: STACK_OFFSET,
        }
    }
}

/// The consolidated kernel state record.
pub struct Kernel<S: Serial> {
    /// Fixed PCB table; a live slot's pid equals its index.
    pub procs: [Pcb; MAX_PROCS],
    /// Descriptor table and pipe arena.
    pub fds: FdTable,
    /// Slot currently holding the CPU; None only before the first
    /// dispatch.
    pub executing: Option<usize>,
    /// High-water mark of slots ever handed out. Grows on every fork,
    /// never shrinks, even when a fork reuses a terminated slot.
    pub active_procs: usize,
    /// Image addresses supplied by the arch layer.
    pub boot: BootInfo,
    /// Byte sink for trace tokens and stdout.
    pub serial: S,
}

impl<S: Serial> Kernel<S> {
    pub const fn new(boot: BootInfo, serial: S) -> Self {
        Self {
            procs: [Pcb::EMPTY; MAX_PROCS],
            fds: FdTable::new(),
            executing: None,
            active_procs: 1,
            boot,
            serial,
        }
    }

    /// Reset-time table initialisation, run once with peripherals
    /// already programmed: invalidate every PCB, reserve the standard
    /// streams, stand up the console process in slot 0 and dispatch
    /// into it.
    pub fn reset(&mut self, ctx: &mut Context) {
        self.serial.putc(b'A');

        for pcb in self.procs.iter_mut() {
            *pcb = Pcb::EMPTY;
        }
        self.fds.reset();
        self.active_procs = 1;
        self.executing = None;

        let console = &mut self.procs[0];
        console.pid = 0;
        console.status = Status::Ready;
        console.tos = self.boot.tos_console;
        console.ctx.cpsr = CPSR_USR;
        console.ctx.pc = self.boot.console_entry;
        console.ctx.sp = self.boot.tos_console;
        console.priority = DEFAULT_PRIORITY;
        console.age = 0;
        console.niceness = 0;

        self.dispatch(ctx, None, 0);
        self.procs[0].status = Status::Executing;
    }

    /// Swap execution contexts: save the live register file into
    /// `prev` (when there is one), load `next`'s saved file into the
    /// live one, move the `executing` cursor, and emit the `[p->n]`
    /// trace token. Status transitions stay with the caller.
    pub fn dispatch(&mut self, ctx: &mut Context, prev: Option<usize>, next: usize) {
        let prev_digit = match prev {
            Some(slot) => {
                self.procs[slot].ctx = *ctx;
                pid_digit(self.procs[slot].pid)
            }
            None => b'?',
        };
        *ctx = self.procs[next].ctx;
        let next_digit = pid_digit(self.procs[next].pid);

        self.serial.putc(b'[');
        self.serial.putc(prev_digit);
        self.serial.putc(b'-');
        self.serial.putc(b'>');
        self.serial.putc(next_digit);
        self.serial.putc(b']');

        self.executing = Some(next);
    }

    /// Number of table slots the scheduler and fork bookkeeping may
    /// look at. `active_procs` itself never shrinks, so it can pass
    /// the table size on long fork/exit workloads; indexing must not.
    #[inline]
    pub(crate) fn live_slots(&self) -> usize {
        self.active_procs.min(MAX_PROCS)
    }
}

fn pid_digit(pid: usize) -> u8 {
    b'0' + pid as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_FDS;
    use crate::fd::FdEntry;
    use crate::testkit::{assert_single_executing, boot, trace, CONSOLE_ENTRY};

    #[test]
    fn reset_traces_and_stands_up_the_console() {
        let (kernel, ctx) = boot();
        assert_eq!(trace(&kernel), "A[?->0]");

        assert_eq!(kernel.procs[0].status, Status::Executing);
        assert_eq!(kernel.procs[0].pid, 0);
        assert_eq!(kernel.procs[0].priority, 15);
        assert_eq!(kernel.procs[0].niceness, 0);
        assert_single_executing(&kernel);

        // the live context now runs the console program
        assert_eq!(ctx.pc, CONSOLE_ENTRY);
        assert_eq!(ctx.sp, kernel.procs[0].tos);
        assert_eq!(ctx.cpsr, CPSR_USR);

        // everything else is untouched
        for i in 1..MAX_PROCS {
            assert_eq!(kernel.procs[i].status, Status::Invalid);
        }
        for fd in 3..MAX_FDS {
            assert_eq!(kernel.fds.entry(fd), FdEntry::Free);
        }
    }

    #[test]
    fn dispatch_saves_and_restores_contexts() {
        let (mut kernel, mut ctx) = boot();

        // fabricate a second process with a distinctive context
        kernel.procs[1] = Pcb::EMPTY;
        kernel.procs[1].pid = 1;
        kernel.procs[1].status = Status::Ready;
        kernel.procs[1].ctx.pc = 0x4444;
        kernel.procs[1].ctx.gpr[7] = 0x99;

        ctx.gpr[3] = 0x1234;
        kernel.serial.log.clear();
        kernel.dispatch(&mut ctx, Some(0), 1);

        assert_eq!(trace(&kernel), "[0->1]");
        assert_eq!(kernel.executing, Some(1));
        // the old live context went into PCB[0]
        assert_eq!(kernel.procs[0].ctx.gpr[3], 0x1234);
        // the live context is now PCB[1]'s
        assert_eq!(ctx.pc, 0x4444);
        assert_eq!(ctx.gpr[7], 0x99);
    }

    #[test]
    fn dispatch_leaves_status_to_the_caller() {
        let (mut kernel, mut ctx) = boot();
        kernel.procs[1] = Pcb::EMPTY;
        kernel.procs[1].pid = 1;
        kernel.procs[1].status = Status::Ready;

        kernel.dispatch(&mut ctx, Some(0), 1);
        // dispatch itself moved the cursor but not the statuses
        assert_eq!(kernel.procs[0].status, Status::Executing);
        assert_eq!(kernel.procs[1].status, Status::Ready);
    }
}
