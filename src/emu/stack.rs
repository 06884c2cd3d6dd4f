use super::Chip8Error;

pub const STACK_DEPTH: usize = 16;

/// Bounded call stack holding subroutine return addresses.
#[derive(Debug, Clone, Default)]
pub struct CallStack {
    entries: [u16; STACK_DEPTH],
    depth: usize,
}

impl CallStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a return address. `target` is only used to describe the fault.
    pub fn push(&mut self, return_address: u16, target: u16) -> Result<(), Chip8Error> {
        let slot = self
            .entries
            .get_mut(self.depth)
            .ok_or(Chip8Error::StackOverflow { address: target })?;
        *slot = return_address;
        self.depth += 1;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<u16, Chip8Error> {
        if self.depth == 0 {
            return Err(Chip8Error::StackUnderflow);
        }
        self.depth -= 1;
        Ok(self.entries[self.depth])
    }

    pub fn is_full(&self) -> bool {
        self.depth == STACK_DEPTH
    }

    pub fn len(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.depth == 0
    }

    /// Return addresses from the outermost call to the innermost.
    pub fn as_slice(&self) -> &[u16] {
        &self.entries[..self.depth]
    }

    pub fn clear(&mut self) {
        self.depth = 0;
    }
}
