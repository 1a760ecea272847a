//! # Saved execution context
//!
//! The register file the trampoline spills on exception entry and
//! reloads on exit. The kernel receives a mutable reference to the
//! live copy; overwriting it is what performs a context switch.
//!
//! ## Layout
//!
//! `#[repr(C)]`, field order fixed by the trampoline's store/load
//! sequence (the offsets are baked into its assembly):
//!
//! ```text
//! +0x00  cpsr        saved status word
//! +0x04  gpr[0..13]  r0-r12 (r0-r2 carry syscall args, r0 the return)
//! +0x38  lr          user link register
//! +0x3c  sp          user stack pointer
//! +0x40  pc          resume address
//! ```
//!
//! Registers are machine words, 32 bits wide on the ARMv7-A target.

/// CPSR value installed into fresh processes: USR mode with IRQs
/// enabled.
pub const CPSR_USR: usize = 0x50;

/// One saved register file, as spilled by the trampoline.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Context {
    pub cpsr: usize,
    pub gpr: [usize; 13],
    pub lr: usize,
    pub sp: usize,
    pub pc: usize,
}

impl Context {
    /// An all-zero register file.
    pub const fn zeroed() -> Self {
        Self {
            cpsr: 0,
            gpr: [0; 13],
            lr: 0,
            sp: 0,
            pc: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_is_seventeen_words() {
        // cpsr + r0-r12 + lr + sp + pc, nothing padded in between
        assert_eq!(
            core::mem::size_of::<Context>(),
            17 * core::mem::size_of::<usize>()
        );
    }

    #[test]
    fn zeroed_context_is_blank() {
        let ctx = Context::zeroed();
        assert_eq!(ctx.cpsr, 0);
        assert_eq!(ctx.gpr, [0; 13]);
        assert_eq!(ctx.pc, 0);
    }
}
