//! # Architecture port layer
//!
//! Hardware bindings for the platforms the kernel runs on. The
//! ARMv7-A port targets the RealView PB-A8 and is only compiled for
//! `target_arch = "arm"`; the rest of the crate is portable and
//! carries the host-side tests.

#[cfg(target_arch = "arm")]
pub mod armv7a;
