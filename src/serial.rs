//! # Serial sink seam
//!
//! The kernel's only output path is a byte-at-a-time serial sink: the
//! trace tokens of the dispatcher and the stdout arm of `write` both
//! funnel through it. On hardware the sink is the PL011 UART in
//! `arch::armv7a`; the trait keeps the kernel logic independent of
//! the register block behind it.

/// Blocking byte sink.
pub trait Serial {
    /// Emit one byte, blocking until the device accepts it.
    fn putc(&mut self, byte: u8);
}
