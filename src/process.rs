//! # Process control block
//!
//! One [`Pcb`] per table slot. The pid of a live process equals its
//! slot index; slot 0 is the console process created at reset.
//!
//! ## Lifecycle
//!
//! ```text
//!   +---------+  reset / fork   +-------+  schedule()  +-----------+
//!   | Invalid | --------------> | Ready | -----------> | Executing |
//!   +---------+                 +-------+ <----------- +-----------+
//!                                   ^       preempt          |
//!                                   |                        | exit / kill
//!                                   |   fork (slot reuse)    v
//!                                   +----------------- +------------+
//!                                                      | Terminated |
//!                                                      +------------+
//! ```
//!
//! Terminated slots are preferred by `fork` before the table grows;
//! a reused slot keeps the stack region it was first given.

use crate::config::DEFAULT_PRIORITY;
use crate::context::Context;

/// Scheduling state of a table slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Slot has never held a process.
    Invalid,
    /// Runnable, waiting for selection.
    Ready,
    /// Currently owns the CPU. At most one slot at a time.
    Executing,
    /// Exited or killed; slot is up for reuse.
    Terminated,
}

/// Process control block.
pub struct Pcb {
    /// Process identifier; equals the slot index for live slots.
    pub pid: usize,
    /// Scheduling state.
    pub status: Status,
    /// Top of this process's stack region, fixed at creation.
    pub tos: usize,
    /// Saved register file, valid while the process is not executing.
    pub ctx: Context,
    /// Base priority, [`DEFAULT_PRIORITY`] unless inherited otherwise.
    pub priority: i32,
    /// Ticks spent waiting since last selected. Reset on selection.
    pub age: i32,
    /// User bias in [-20, 19], higher is more favoured. Inherited on
    /// fork.
    pub niceness: i32,
}

impl Pcb {
    /// An invalid slot, used to blank the table at reset.
    pub const EMPTY: Pcb = Pcb {
        pid: 0,
        status: Status::Invalid,
        tos: 0,
        ctx: Context::zeroed(),
        priority: DEFAULT_PRIORITY,
        age: 0,
        niceness: 0,
    };

    /// Whether the scheduler may select this slot.
    #[inline]
    pub fn is_runnable(&self) -> bool {
        matches!(self.status, Status::Ready | Status::Executing)
    }

    /// Score the scheduler ranks by: base priority plus accumulated
    /// age plus the niceness bias. Aging makes this grow without
    /// bound while the process waits, which is the starvation bound.
    #[inline]
    pub fn effective_priority(&self) -> i32 {
        self.priority + self.age + self.niceness
    }
}
