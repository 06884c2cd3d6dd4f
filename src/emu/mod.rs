mod chip8;
mod config;
mod display;
mod execute;
mod font;
mod keypad;
mod opcode;
mod runner;
mod stack;
mod types;

pub use chip8::*;
pub use config::*;
pub use display::*;
pub use font::*;
pub use keypad::*;
pub use opcode::*;
pub use runner::*;
pub use stack::*;
pub use types::*;
