//! # FairOS configuration
//!
//! Compile-time constants governing table sizes and scheduling
//! defaults. All limits are fixed at build time; nothing here is
//! tunable at run time.

/// Capacity of the PCB table. `pid` equals the table index, so this
/// also bounds the pid space. Each fresh fork consumes a
/// `STACK_OFFSET`-sized stack slot below `tos_general`.
pub const MAX_PROCS: usize = 32;

/// Capacity of the descriptor table. Slots 0..=2 are the reserved
/// standard streams; everything above is pipe-end territory.
pub const MAX_FDS: usize = 128;

/// Capacity of the pipe arena. Every pipe consumes two descriptor
/// slots, so the arena can never outgrow the table.
pub const MAX_PIPES: usize = (MAX_FDS - 3) / 2;

/// Ring-buffer capacity of a single pipe, in bytes.
pub const BUFFER_SIZE: usize = 64;

/// Base priority given to PCB[0] at reset and to every forked child.
pub const DEFAULT_PRIORITY: i32 = 15;

/// Clamp bounds for the `nice` syscall. The sign convention is
/// inverted relative to Unix: higher niceness means a higher
/// effective priority.
pub const NICE_MIN: i32 = -20;
pub const NICE_MAX: i32 = 19;

/// Distance between the stack tops handed to consecutive fresh forks,
/// descending from `tos_general`.
pub const STACK_OFFSET: usize = 0x1000;

/// SP804 Timer1 reload value: 2^20 ticks, roughly one second on the
/// PB-A8 reference clock.
pub const TIMER_PERIOD: u32 = 0x0010_0000;
