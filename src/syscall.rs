//! # Supervisor-call surface
//!
//! The trampoline decodes the `svc` immediate and forwards it here
//! with the caller's live context. Arguments travel in `gpr[0..=2]`,
//! the return value goes back in `gpr[0]`, encoded as a signed word
//! with -1 for failure. Unknown identifiers return with no effect.
//!
//! | id   | call  | args (r0..r2) | returns           |
//! |------|-------|---------------|-------------------|
//! | 0x00 | yield | -             | -                 |
//! | 0x01 | write | fd, buf, n    | progress or -1    |
//! | 0x02 | read  | fd, buf, n    | progress or -1    |
//! | 0x03 | fork  | -             | child pid / 0     |
//! | 0x04 | exit  | code          | does not return   |
//! | 0x05 | exec  | entry         | -                 |
//! | 0x06 | kill  | pid           | -                 |
//! | 0x07 | nice  | pid, bias     | -                 |
//! | 0x08 | pipe  | out[2]        | 0 or -1           |
//!
//! Only `yield`, `exit` and `kill` reschedule; every other call
//! returns straight to the caller. Pipe transfers never block, so
//! the progress value a caller sees on a full or empty ring is its
//! cue to `yield` and retry.

use crate::config::{DEFAULT_PRIORITY, MAX_PROCS, NICE_MAX, NICE_MIN};
use crate::context::Context;
use crate::kernel::Kernel;
use crate::process::{Pcb, Status};
use crate::serial::Serial;

/// The syscall identifiers the trampoline can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    Yield,
    Write,
    Read,
    Fork,
    Exit,
    Exec,
    Kill,
    Nice,
    Pipe,
}

impl Syscall {
    /// Decode an `svc` immediate. None for identifiers outside the
    /// table, which the dispatcher ignores.
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            0x00 => Some(Self::Yield),
            0x01 => Some(Self::Write),
            0x02 => Some(Self::Read),
            0x03 => Some(Self::Fork),
            0x04 => Some(Self::Exit),
            0x05 => Some(Self::Exec),
            0x06 => Some(Self::Kill),
            0x07 => Some(Self::Nice),
            0x08 => Some(Self::Pipe),
            _ => None,
        }
    }
}

impl<S: Serial> Kernel<S> {
    /// Supervisor-call entry point.
    pub fn svc(&mut self, ctx: &mut Context, id: u32) {
        let Some(call) = Syscall::from_id(id) else {
            return;
        };
        match call {
            Syscall::Yield => {
                self.serial.putc(b'Y');
                self.schedule(ctx);
            }
            Syscall::Write => self.sys_write(ctx),
            Syscall::Read => self.sys_read(ctx),
            Syscall::Fork => self.sys_fork(ctx),
            Syscall::Exit => self.sys_exit(ctx),
            Syscall::Exec => self.sys_exec(ctx),
            Syscall::Kill => self.sys_kill(ctx),
            Syscall::Nice => self.sys_nice(ctx),
            Syscall::Pipe => self.sys_pipe(ctx),
        }
    }

    /// write(fd, buf, n). Stdout drains to the serial sink and
    /// reports the full count; stdin accepts nothing; stderr is the
    /// preserved -1 defect. A pipe takes bytes until it fills and
    /// reports the last index moved (0 when nothing moved), never
    /// blocking.
    fn sys_write(&mut self, ctx: &mut Context) {
        let fd = ctx.gpr[0] as isize;
        let buf = ctx.gpr[1] as *const u8;
        let n = ctx.gpr[2] as usize;

        let ret: isize = if fd == 0 {
            0
        } else if fd == 1 {
            for i in 0..n {
                // Safety: buf names n readable bytes in the caller's
                // address range; single address space, no remapping.
                let byte = unsafe { buf.add(i).read() };
                self.serial.putc(byte);
            }
            n as isize
        } else if fd < 0 || fd == 2 {
            -1
        } else {
            match self.fds.pipe_mut(fd as usize) {
                Some(pipe) => {
                    let mut progress: isize = 0;
                    for i in 0..n {
                        if pipe.is_full() {
                            break;
                        }
                        // Safety: as above.
                        let byte = unsafe { buf.add(i).read() };
                        pipe.push(byte);
                        progress = i as isize;
                    }
                    progress
                }
                None => -1,
            }
        };
        ctx.gpr[0] = ret as usize;
    }

    /// read(fd, buf, n). The standard streams produce nothing (fd 2
    /// again -1); a pipe yields bytes until it drains, with the same
    /// progress indexing and non-blocking contract as `sys_write`.
    fn sys_read(&mut self, ctx: &mut Context) {
        let fd = ctx.gpr[0] as isize;
        let buf = ctx.gpr[1] as *mut u8;
        let n = ctx.gpr[2] as usize;

        let ret: isize = if fd == 0 || fd == 1 {
            0
        } else if fd < 0 || fd == 2 {
            -1
        } else {
            match self.fds.pipe_mut(fd as usize) {
                Some(pipe) => {
                    let mut progress: isize = 0;
                    for i in 0..n {
                        let Some(byte) = pipe.pop() else {
                            break;
                        };
                        // Safety: buf names n writable bytes in the
                        // caller's address range.
                        unsafe { buf.add(i).write(byte) };
                        progress = i as isize;
                    }
                    progress
                }
                None => -1,
            }
        };
        ctx.gpr[0] = ret as usize;
    }

    /// fork(). Clone the caller into a fresh or recycled slot: same
    /// register file, stack copied byte for byte with `sp` translated
    /// into the child's region, niceness inherited, priority and age
    /// back to defaults. Parent receives the child pid, the child
    /// wakes with 0. Descriptors are shared, not duplicated; pipe
    /// ends survive the fork, which the pipe workloads rely on.
    fn sys_fork(&mut self, ctx: &mut Context) {
        self.serial.putc(b'F');

        let Some(parent) = self.executing else {
            return;
        };

        // recycled terminated slot first, lowest index wins
        let mut child = None;
        for i in 1..MAX_PROCS {
            if self.procs[i].status == Status::Terminated {
                child = Some(i);
                break;
            }
        }
        let child = match child {
            Some(slot) => slot,
            None => {
                let fresh = self.active_procs;
                if fresh >= MAX_PROCS {
                    ctx.gpr[0] = -1isize as usize;
                    return;
                }
                self.procs[fresh] = Pcb::EMPTY;
                self.procs[fresh].tos =
                    self.boot.tos_general - self.boot.stack_offset * (fresh - 1);
                fresh
            }
        };
        self.active_procs += 1;

        let parent_tos = self.procs[parent].tos;
        let parent_nice = self.procs[parent].niceness;

        let pcb = &mut self.procs[child];
        pcb.pid = child;
        pcb.status = Status::Ready;
        pcb.priority = DEFAULT_PRIORITY;
        pcb.age = 0;
        pcb.niceness = parent_nice;
        pcb.ctx = *ctx;

        // relocate the stack: same depth below the child's own top
        let size = parent_tos - ctx.sp;
        pcb.ctx.sp = pcb.tos - size;
        // Safety: stack regions of live slots are disjoint, and size
        // is the caller's in-use depth within its own region.
        unsafe {
            core::ptr::copy_nonoverlapping(ctx.sp as *const u8, pcb.ctx.sp as *mut u8, size);
        }

        pcb.ctx.gpr[0] = 0;
        ctx.gpr[0] = child;
    }

    /// exit(code). The status argument is accepted and discarded.
    fn sys_exit(&mut self, ctx: &mut Context) {
        self.serial.putc(b'E');
        let _status = ctx.gpr[0];
        if let Some(cursor) = self.executing {
            self.procs[cursor].status = Status::Terminated;
        }
        self.schedule(ctx);
    }

    /// exec(entry). Restart the calling process at `entry` on a fresh
    /// stack; pid and slot are unchanged.
    fn sys_exec(&mut self, ctx: &mut Context) {
        self.serial.putc(b'X');
        ctx.pc = ctx.gpr[0];
        if let Some(cursor) = self.executing {
            ctx.sp = self.procs[cursor].tos;
        }
    }

    /// kill(pid). Out-of-range pids are ignored; either way the
    /// scheduler runs, so self-kill deschedules immediately.
    fn sys_kill(&mut self, ctx: &mut Context) {
        self.serial.putc(b'K');
        let pid = ctx.gpr[0];
        if pid < MAX_PROCS {
            self.procs[pid].status = Status::Terminated;
        }
        self.schedule(ctx);
    }

    /// nice(pid, bias). Clamp the bias into [-20, 19] and store it.
    /// Higher bias means more favoured; out-of-range pids are
    /// ignored.
    fn sys_nice(&mut self, ctx: &mut Context) {
        let pid = ctx.gpr[0];
        let bias = ctx.gpr[1] as isize;
        let clamped = bias.max(NICE_MIN as isize).min(NICE_MAX as isize) as i32;
        if pid < MAX_PROCS {
            self.procs[pid].niceness = clamped;
        }
    }

    /// pipe(out). Allocate a ring and two descriptors; on success
    /// store {read_fd, write_fd} through `out` and return 0, else -1.
    fn sys_pipe(&mut self, ctx: &mut Context) {
        self.serial.putc(b'P');
        let out = ctx.gpr[0] as *mut i32;
        match self.fds.open_pipe() {
            Some((read_fd, write_fd)) => {
                // Safety: out names two writable ints in the caller's
                // address range.
                unsafe {
                    out.write(read_fd as i32);
                    out.add(1).write(write_fd as i32);
                }
                ctx.gpr[0] = 0;
            }
            None => {
                ctx.gpr[0] = -1isize as usize;
            }
        }
    }
}
