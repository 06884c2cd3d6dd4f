//! CHIP-8 / Super-CHIP interpreter core.
//!
//! [`Chip8`] owns the whole machine. A host loads a program, calls [`Chip8::cpu_cycle`] as often
//! as it likes and [`Chip8::timers_cycle`] at 60Hz, then reads the framebuffer and timers back.
//! [`Chip8Runner`] does that pacing for a typical redraw loop.

pub mod debugger;
pub mod emu;
mod nibble;

pub use emu::*;
pub use nibble::u4;
