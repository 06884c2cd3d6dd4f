use super::KeypadMode;

/// Behaviour switches for instructions that differ between interpreters.
///
/// Everything defaults to off, which gives the common modern behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Quirks {
    /// 8XY6/8XYE shift VY and store the result in VX, instead of shifting VX in place.
    pub shift_uses_vy: bool,
    /// FX55/FX65 leave I pointing past the last register transferred.
    pub load_store_increments_i: bool,
    /// 8XY1/8XY2/8XY3 reset VF to 0.
    pub logic_resets_vf: bool,
    /// BXNN jumps to XNN + VX instead of NNN + V0.
    pub jump_offset_uses_vx: bool,
    /// Sprite pixels past the right or bottom edge are dropped instead of wrapped.
    pub clip_sprites: bool,
    /// Drawing a sprite ends the current frame.
    pub display_wait: bool,
}

/// Settings fixed when the VM is created.
#[derive(Debug, Clone, Default)]
pub struct Chip8Config {
    /// Enables the Super-CHIP instructions and starts in high resolution.
    pub extended: bool,
    pub quirks: Quirks,
    pub keypad_mode: KeypadMode,
    /// Seed for CXNN. `None` seeds from the OS.
    pub seed: Option<u64>,
}
