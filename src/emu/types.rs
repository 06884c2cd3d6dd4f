use std::io;

/// Result type for CHIP-8 CPU cycle execution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Result {
    /// The instruction executed, continue with the next one.
    Continue,
    /// A sprite was drawn (or the screen was cleared/scrolled), the host may want to redraw.
    Drew,
    /// FX0A is spinning in place until a key is pressed.
    WaitingForKey,
    /// The fetched word is not an instruction of the active instruction set.
    /// It was skipped and the program counter advanced past it.
    DecodeFault { opcode: u16 },
    /// The program executed 00FD, the interpreter is halted until the next reset.
    Exited,
}

/// Reasons a program image could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("ROM is too large ({size} bytes), max size is {max_size} bytes")]
    TooLarge { size: usize, max_size: usize },

    #[error("ROM could not be read: {0}")]
    Unreadable(#[from] io::Error),
}

/// Error types that can occur during CHIP-8 emulation
///
/// Apart from `Load`, these are fatal to the running program. The VM is left exactly as it was
/// before the faulting cycle.
#[derive(Debug, thiserror::Error)]
pub enum Chip8Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Memory access out of bounds at address {address:#06X}")]
    MemoryOutOfBounds { address: usize },

    #[error("Stack overflow: call to {address:#05X} with a full call stack")]
    StackOverflow { address: u16 },

    #[error("Stack underflow: attempted to return from a subroutine with empty call stack")]
    StackUnderflow,
}

pub const DISPLAY_X: usize = 64;
pub const DISPLAY_Y: usize = 32;
pub const HIRES_DISPLAY_X: usize = 128;
pub const HIRES_DISPLAY_Y: usize = 64;

/// A type alias for the display backing store, sized for the largest resolution
pub type Display<T> = [[T; HIRES_DISPLAY_X]; HIRES_DISPLAY_Y];

/// Active framebuffer geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Resolution {
    /// Standard CHIP-8 64x32
    #[default]
    Low,
    /// Super-CHIP 128x64
    High,
}

impl Resolution {
    pub fn width(self) -> usize {
        match self {
            Resolution::Low => DISPLAY_X,
            Resolution::High => HIRES_DISPLAY_X,
        }
    }

    pub fn height(self) -> usize {
        match self {
            Resolution::Low => DISPLAY_Y,
            Resolution::High => HIRES_DISPLAY_Y,
        }
    }
}
