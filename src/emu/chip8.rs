use std::io::Read;

use rand::{SeedableRng, rngs::StdRng};

use super::{
    BIG_FONT, BIG_FONT_END_ADDRESS, BIG_FONT_START_ADDRESS, CallStack, Chip8Config, Chip8Error,
    Chip8Result, FONT, FONT_END_ADDRESS, FONT_START_ADDRESS, Framebuffer, Keypad, LoadError,
    Opcode, Quirks, Resolution,
};
use crate::u4;

// Standard CHIP-8 memory map
pub const ROM_START_ADDRESS: usize = 0x200;
pub const MEMORY_SIZE: usize = 4096;
pub const MAX_ROM_SIZE: usize = MEMORY_SIZE - ROM_START_ADDRESS;

/// CHIP-8 virtual machine state
pub struct Chip8 {
    /// 4KB memory array
    pub(crate) memory: [u8; MEMORY_SIZE],
    /// Monochrome framebuffer, 64x32 or 128x64
    pub(crate) display: Framebuffer,

    /// Program counter: address of the next instruction to execute
    pub(crate) pc: u16,
    /// Index register: used for memory operations
    pub(crate) i: u16,
    /// General-purpose registers V0-VF (VF is used as a flag register)
    pub(crate) v: [u8; 16],
    /// Call stack for subroutine returns
    pub(crate) stack: CallStack,

    /// Delay timer: decrements at 60Hz until it reaches 0
    pub(crate) delay_timer: u8,
    /// Sound timer: decrements at 60Hz, beeps while non-zero
    pub(crate) sound_timer: u8,

    /// Keypad state, written by the host
    pub(crate) keypad: Keypad,
    /// Super-CHIP RPL user flags (FX75/FX85)
    pub(crate) rpl_flags: [u8; 16],

    /// Super-CHIP instruction set enabled
    pub(crate) extended: bool,
    /// Set by 00FD, cleared by reset
    pub(crate) halted: bool,
    /// Number of unknown instruction words skipped since the last reset
    pub(crate) decode_faults: u64,

    pub(crate) quirks: Quirks,
    pub(crate) rng: StdRng,
}

impl Chip8 {
    pub fn new() -> Self {
        Self::with_config(Chip8Config::default())
    }

    pub fn with_config(config: Chip8Config) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        let mut chip8 = Chip8 {
            memory: [0; MEMORY_SIZE],
            display: Framebuffer::default(),
            pc: ROM_START_ADDRESS as u16,
            i: 0,
            v: [0; 16],
            stack: CallStack::new(),
            delay_timer: 0,
            sound_timer: 0,
            keypad: Keypad::new(config.keypad_mode),
            rpl_flags: [0; 16],
            extended: config.extended,
            halted: false,
            decode_faults: 0,
            quirks: config.quirks,
            rng,
        };
        chip8.reset();
        chip8
    }

    /// Reinitializes everything except the mode flag, quirks and the keypad.
    ///
    /// Memory is cleared as well, so a program has to be loaded again afterwards.
    pub fn reset(&mut self) {
        self.memory = [0; MEMORY_SIZE];
        self.memory[FONT_START_ADDRESS..FONT_END_ADDRESS].copy_from_slice(&FONT);
        self.memory[BIG_FONT_START_ADDRESS..BIG_FONT_END_ADDRESS].copy_from_slice(&BIG_FONT);

        self.display.set_resolution(if self.extended {
            Resolution::High
        } else {
            Resolution::Low
        });

        self.pc = ROM_START_ADDRESS as u16;
        self.i = 0;
        self.v = [0; 16];
        self.stack.clear();
        self.delay_timer = 0;
        self.sound_timer = 0;
        self.rpl_flags = [0; 16];
        self.halted = false;
        self.decode_faults = 0;

        log::debug!(
            "reset, extended mode {}, {}x{} display",
            self.extended,
            self.display.width(),
            self.display.height()
        );
    }

    /// Copies a program image into memory at 0x200.
    ///
    /// Registers, timers and the display are left alone, call `reset` first.
    /// An oversized image is rejected without touching memory.
    pub fn load(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(LoadError::TooLarge {
                size: rom.len(),
                max_size: MAX_ROM_SIZE,
            }
            .into());
        }

        let rom_end = ROM_START_ADDRESS + rom.len();
        self.memory[ROM_START_ADDRESS..rom_end].copy_from_slice(rom);

        log::debug!("loaded {} byte program at {:#05X}", rom.len(), ROM_START_ADDRESS);
        Ok(())
    }

    /// Reads a program image from `reader` and loads it.
    ///
    /// Reads at most one byte past the maximum size, so an endless reader is still rejected.
    pub fn load_reader<R: Read>(&mut self, reader: R) -> Result<(), Chip8Error> {
        let mut rom = Vec::with_capacity(MAX_ROM_SIZE);
        reader
            .take(MAX_ROM_SIZE as u64 + 1)
            .read_to_end(&mut rom)
            .map_err(LoadError::from)?;

        self.load(&rom)
    }

    /// Selects the instruction set. The display geometry follows on the next `reset`.
    pub fn set_extended_mode(&mut self, extended: bool) {
        log::debug!("extended mode set to {extended}");
        self.extended = extended;
    }

    pub fn is_extended_mode(&self) -> bool {
        self.extended
    }

    /// Executes a single CPU cycle (fetch, decode, execute).
    ///
    /// On error the VM is left exactly as it was before the cycle.
    pub fn cpu_cycle(&mut self) -> Result<Chip8Result, Chip8Error> {
        if self.halted {
            return Ok(Chip8Result::Exited);
        }

        let pc = self.pc;
        let opcode = self.fetch()?;
        let decoded_opcode = Opcode::decode(opcode, self.extended);
        log::trace!("{pc:03X}: {opcode:04X} {decoded_opcode}");

        let result = self.execute(decoded_opcode);
        if result.is_err() {
            self.pc = pc;
        }
        result
    }

    /// Updates the delay and sound timers. Should be called at 60Hz.
    pub fn timers_cycle(&mut self) {
        self.delay_timer = self.delay_timer.saturating_sub(1);
        self.sound_timer = self.sound_timer.saturating_sub(1);
    }

    /// Returns true if the sound timer is greater than zero, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.sound_timer > 0
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.keypad.set_key(key, pressed);
    }

    pub fn keypad(&self) -> &Keypad {
        &self.keypad
    }

    pub fn keypad_mut(&mut self) -> &mut Keypad {
        &mut self.keypad
    }

    pub fn framebuffer(&self) -> &Framebuffer {
        &self.display
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn get_display_pixel(&self, y: usize, x: usize) -> bool {
        self.display.pixel(x, y)
    }

    pub fn delay_timer(&self) -> u8 {
        self.delay_timer
    }

    pub fn sound_timer(&self) -> u8 {
        self.sound_timer
    }

    pub fn pc(&self) -> u16 {
        self.pc
    }

    pub fn i(&self) -> u16 {
        self.i
    }

    pub fn v(&self) -> &[u8; 16] {
        &self.v
    }

    pub fn stack(&self) -> &[u16] {
        self.stack.as_slice()
    }

    pub fn memory(&self) -> &[u8; MEMORY_SIZE] {
        &self.memory
    }

    pub fn rpl_flags(&self) -> &[u8; 16] {
        &self.rpl_flags
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn decode_faults(&self) -> u64 {
        self.decode_faults
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// Fetches the next 16-bit opcode from memory.
    fn fetch(&self) -> Result<u16, Chip8Error> {
        let bytes = self.mem_slice(self.pc, 2)?;
        Ok(u16::from_be_bytes([bytes[0], bytes[1]]))
    }

    /// Bounds checked view of `len` bytes starting at `addr`.
    pub(crate) fn mem_slice(&self, addr: u16, len: usize) -> Result<&[u8], Chip8Error> {
        let start = addr as usize;
        self.memory
            .get(start..start + len)
            .ok_or(Chip8Error::MemoryOutOfBounds {
                address: start.max(MEMORY_SIZE),
            })
    }

    /// Mutable counterpart of `mem_slice`.
    pub(crate) fn mem_slice_mut(&mut self, addr: u16, len: usize) -> Result<&mut [u8], Chip8Error> {
        let start = addr as usize;
        self.memory
            .get_mut(start..start + len)
            .ok_or(Chip8Error::MemoryOutOfBounds {
                address: start.max(MEMORY_SIZE),
            })
    }
}

impl Default for Chip8 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emu::{DISPLAY_X, HIRES_DISPLAY_X};

    #[test]
    fn new_machine_has_fonts_and_starts_at_0x200() {
        let chip8 = Chip8::new();
        assert_eq!(chip8.pc(), 0x200);
        assert_eq!(&chip8.memory()[FONT_START_ADDRESS..FONT_END_ADDRESS], &FONT);
        assert_eq!(
            &chip8.memory()[BIG_FONT_START_ADDRESS..BIG_FONT_END_ADDRESS],
            &BIG_FONT
        );
        assert!(BIG_FONT_END_ADDRESS <= ROM_START_ADDRESS);
    }

    #[test]
    fn load_copies_image_verbatim() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x12, 0x34, 0x56]).unwrap();
        assert_eq!(&chip8.memory()[0x200..0x203], &[0x12, 0x34, 0x56]);
        assert_eq!(chip8.pc(), 0x200);
    }

    #[test]
    fn load_accepts_exactly_max_size() {
        let mut chip8 = Chip8::new();
        let rom = vec![0xAB; MAX_ROM_SIZE];
        chip8.load(&rom).unwrap();
        assert_eq!(chip8.memory()[MEMORY_SIZE - 1], 0xAB);
    }

    #[test]
    fn oversized_load_is_rejected_and_memory_untouched() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x60, 0x05]).unwrap();
        let before = *chip8.memory();

        let err = chip8.load(&vec![0xFF; MAX_ROM_SIZE + 1]).unwrap_err();
        assert!(matches!(
            err,
            Chip8Error::Load(LoadError::TooLarge {
                size,
                max_size: MAX_ROM_SIZE,
            }) if size == MAX_ROM_SIZE + 1
        ));
        assert_eq!(chip8.memory(), &before);
    }

    #[test]
    fn load_reader_reports_unreadable_source() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("disk on fire"))
            }
        }

        let mut chip8 = Chip8::new();
        let err = chip8.load_reader(Broken).unwrap_err();
        assert!(matches!(err, Chip8Error::Load(LoadError::Unreadable(_))));
    }

    #[test]
    fn load_reader_rejects_endless_source() {
        let mut chip8 = Chip8::new();
        let err = chip8.load_reader(std::io::repeat(0x00)).unwrap_err();
        assert!(matches!(err, Chip8Error::Load(LoadError::TooLarge { .. })));
    }

    #[test]
    fn reset_clears_the_program_region() {
        let mut chip8 = Chip8::new();
        chip8.load(&[0x60, 0x05]).unwrap();
        chip8.reset();
        assert_eq!(&chip8.memory()[0x200..0x202], &[0, 0]);
        assert_eq!(&chip8.memory()[FONT_START_ADDRESS..FONT_END_ADDRESS], &FONT);
    }

    #[test]
    fn reset_restores_initial_state_but_keeps_mode() {
        let mut chip8 = Chip8::new();
        chip8.set_extended_mode(true);
        chip8.v[3] = 9;
        chip8.i = 0x300;
        chip8.pc = 0x400;
        chip8.delay_timer = 10;
        chip8.sound_timer = 10;
        chip8.stack.push(0x202, 0x300).unwrap();
        chip8.halted = true;

        chip8.reset();

        assert!(chip8.is_extended_mode());
        assert_eq!(chip8.framebuffer().width(), HIRES_DISPLAY_X);
        assert_eq!(chip8.v(), &[0; 16]);
        assert_eq!(chip8.i(), 0);
        assert_eq!(chip8.pc(), 0x200);
        assert_eq!(chip8.delay_timer(), 0);
        assert_eq!(chip8.sound_timer(), 0);
        assert!(chip8.stack().is_empty());
        assert!(!chip8.is_halted());
    }

    #[test]
    fn extended_mode_takes_effect_on_reset() {
        let mut chip8 = Chip8::new();
        chip8.set_extended_mode(true);
        assert_eq!(chip8.framebuffer().width(), DISPLAY_X);
        chip8.reset();
        assert_eq!(chip8.framebuffer().width(), HIRES_DISPLAY_X);
    }

    #[test]
    fn timers_floor_at_zero() {
        let mut chip8 = Chip8::new();
        chip8.delay_timer = 2;
        chip8.sound_timer = 1;
        assert!(chip8.should_beep());

        for _ in 0..5 {
            chip8.timers_cycle();
        }

        assert_eq!(chip8.delay_timer(), 0);
        assert_eq!(chip8.sound_timer(), 0);
        assert!(!chip8.should_beep());
    }

    #[test]
    fn fetch_past_end_of_memory_faults() {
        let mut chip8 = Chip8::new();
        chip8.pc = (MEMORY_SIZE - 1) as u16;
        assert!(matches!(
            chip8.cpu_cycle(),
            Err(Chip8Error::MemoryOutOfBounds { address: MEMORY_SIZE })
        ));
        assert_eq!(chip8.pc(), (MEMORY_SIZE - 1) as u16);
    }
}
