use std::fmt;

use crate::u4;

/// A decoded instruction word.
///
/// Operands keep their usual names: `x`/`y` register indices, `n` a nibble, `nn` a byte and
/// `nnn` a 12-bit address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    // Flow control
    Jump { nnn: u16 },
    /// BNNN. Offset by V0, or by VX under `Quirks::jump_offset_uses_vx`.
    JumpWithOffset { x: u4, nnn: u16 },
    Call { nnn: u16 },
    Return,

    // Conditional skips, each jumps over one instruction
    SkipRegEqualImm { x: u4, nn: u8 },
    SkipRegNotEqualImm { x: u4, nn: u8 },
    SkipRegEqualReg { x: u4, y: u4 },
    SkipRegNotEqualReg { x: u4, y: u4 },

    // Registers
    SetRegImm { x: u4, nn: u8 },
    /// 7XNN, wraps and leaves VF alone.
    AddRegImm { x: u4, nn: u8 },
    SetIndexImm { nnn: u16 },
    AddIndexReg { x: u4 },
    ALU { x: u4, y: u4, op: OpcodeALU },
    Random { x: u4, nn: u8 },

    // Display
    ClearDisplay,
    /// DXYN. N = 0 is a 16x16 sprite with the Super-CHIP set and draws nothing otherwise.
    Draw { x: u4, y: u4, n: u4 },

    // Keypad
    SkipIfPressed { x: u4 },
    SkipIfNotPressed { x: u4 },
    /// FX0A, repeats until a key is held.
    WaitForKey { x: u4 },

    // Timers
    ReadDelayTimer { x: u4 },
    SetDelayTimer { x: u4 },
    SetSoundTimer { x: u4 },

    // Memory
    FontChar { x: u4 },
    BCD { x: u4 },
    StoreRegs { x: u4 },
    LoadRegs { x: u4 },

    // Super-CHIP only
    ScrollDown { n: u4 },
    ScrollRight,
    ScrollLeft,
    Exit,
    LowRes,
    HighRes,
    BigFontChar { x: u4 },
    StoreFlags { x: u4 },
    LoadFlags { x: u4 },

    /// Any word outside the active instruction set.
    Unknown(u16),
}

/// The 8XYN register-to-register operations, selected by N.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpcodeALU {
    Set,
    Or,
    And,
    Xor,
    /// VF = carry
    Add,
    /// VX - VY, VF = no borrow
    Sub,
    ShiftRight,
    /// VY - VX, VF = no borrow
    SubReverse,
    ShiftLeft,
}

impl Opcode {
    /// Splits `opcode` into nibbles and matches it against the instruction table.
    ///
    /// Super-CHIP words only decode when `extended` is set, they are `Unknown` otherwise.
    pub fn decode(opcode: u16, extended: bool) -> Self {
        let [high, low] = opcode.to_be_bytes();
        let nibbles = (high >> 4, high & 0x0F, low >> 4, low & 0x0F);

        let x = u4::low(high);
        let y = u4::low(low >> 4);
        let n = u4::low(low);
        let nn = low;
        let nnn = opcode & 0x0FFF;

        match nibbles {
            (0x0, 0x0, 0xE, 0x0) => Opcode::ClearDisplay,
            (0x0, 0x0, 0xE, 0xE) => Opcode::Return,
            (0x0, 0x0, 0xC, _) if extended => Opcode::ScrollDown { n },
            (0x0, 0x0, 0xF, 0xB) if extended => Opcode::ScrollRight,
            (0x0, 0x0, 0xF, 0xC) if extended => Opcode::ScrollLeft,
            (0x0, 0x0, 0xF, 0xD) if extended => Opcode::Exit,
            (0x0, 0x0, 0xF, 0xE) if extended => Opcode::LowRes,
            (0x0, 0x0, 0xF, 0xF) if extended => Opcode::HighRes,
            (0x1, _, _, _) => Opcode::Jump { nnn },
            (0x2, _, _, _) => Opcode::Call { nnn },
            (0x3, _, _, _) => Opcode::SkipRegEqualImm { x, nn },
            (0x4, _, _, _) => Opcode::SkipRegNotEqualImm { x, nn },
            (0x5, _, _, 0x0) => Opcode::SkipRegEqualReg { x, y },
            (0x6, _, _, _) => Opcode::SetRegImm { x, nn },
            (0x7, _, _, _) => Opcode::AddRegImm { x, nn },
            (0x8, _, _, _) => Opcode::ALU {
                x,
                y,
                op: match nibbles.3 {
                    0x0 => OpcodeALU::Set,
                    0x1 => OpcodeALU::Or,
                    0x2 => OpcodeALU::And,
                    0x3 => OpcodeALU::Xor,
                    0x4 => OpcodeALU::Add,
                    0x5 => OpcodeALU::Sub,
                    0x6 => OpcodeALU::ShiftRight,
                    0x7 => OpcodeALU::SubReverse,
                    0xE => OpcodeALU::ShiftLeft,
                    _ => return Opcode::Unknown(opcode),
                },
            },
            (0x9, _, _, 0x0) => Opcode::SkipRegNotEqualReg { x, y },
            (0xA, _, _, _) => Opcode::SetIndexImm { nnn },
            (0xB, _, _, _) => Opcode::JumpWithOffset { x, nnn },
            (0xC, _, _, _) => Opcode::Random { x, nn },
            (0xD, _, _, _) => Opcode::Draw { x, y, n },
            (0xE, _, 0x9, 0xE) => Opcode::SkipIfPressed { x },
            (0xE, _, 0xA, 0x1) => Opcode::SkipIfNotPressed { x },
            (0xF, _, 0x0, 0xA) => Opcode::WaitForKey { x },
            (0xF, _, 0x0, 0x7) => Opcode::ReadDelayTimer { x },
            (0xF, _, 0x1, 0x5) => Opcode::SetDelayTimer { x },
            (0xF, _, 0x1, 0x8) => Opcode::SetSoundTimer { x },
            (0xF, _, 0x1, 0xE) => Opcode::AddIndexReg { x },
            (0xF, _, 0x2, 0x9) => Opcode::FontChar { x },
            (0xF, _, 0x3, 0x0) if extended => Opcode::BigFontChar { x },
            (0xF, _, 0x3, 0x3) => Opcode::BCD { x },
            (0xF, _, 0x5, 0x5) => Opcode::StoreRegs { x },
            (0xF, _, 0x6, 0x5) => Opcode::LoadRegs { x },
            (0xF, _, 0x7, 0x5) if extended => Opcode::StoreFlags { x },
            (0xF, _, 0x8, 0x5) if extended => Opcode::LoadFlags { x },

            _ => Opcode::Unknown(opcode),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Opcode::Jump { nnn } => write!(f, "JP {nnn:#05X}"),
            Opcode::JumpWithOffset { nnn, .. } => write!(f, "JP V0, {nnn:#05X}"),
            Opcode::Call { nnn } => write!(f, "CALL {nnn:#05X}"),
            Opcode::Return => write!(f, "RET"),
            Opcode::SkipRegEqualImm { x, nn } => write!(f, "SE V{x}, {nn:#04X}"),
            Opcode::SkipRegNotEqualImm { x, nn } => write!(f, "SNE V{x}, {nn:#04X}"),
            Opcode::SkipRegEqualReg { x, y } => write!(f, "SE V{x}, V{y}"),
            Opcode::SkipRegNotEqualReg { x, y } => write!(f, "SNE V{x}, V{y}"),
            Opcode::SetRegImm { x, nn } => write!(f, "LD V{x}, {nn:#04X}"),
            Opcode::AddRegImm { x, nn } => write!(f, "ADD V{x}, {nn:#04X}"),
            Opcode::SetIndexImm { nnn } => write!(f, "LD I, {nnn:#05X}"),
            Opcode::AddIndexReg { x } => write!(f, "ADD I, V{x}"),
            Opcode::ALU { x, y, op } => {
                let mnemonic = match op {
                    OpcodeALU::Set => "LD",
                    OpcodeALU::Or => "OR",
                    OpcodeALU::And => "AND",
                    OpcodeALU::Xor => "XOR",
                    OpcodeALU::Add => "ADD",
                    OpcodeALU::Sub => "SUB",
                    OpcodeALU::ShiftRight => "SHR",
                    OpcodeALU::SubReverse => "SUBN",
                    OpcodeALU::ShiftLeft => "SHL",
                };
                write!(f, "{mnemonic} V{x}, V{y}")
            }
            Opcode::Random { x, nn } => write!(f, "RND V{x}, {nn:#04X}"),
            Opcode::ClearDisplay => write!(f, "CLS"),
            Opcode::Draw { x, y, n } => write!(f, "DRW V{x}, V{y}, {n}"),
            Opcode::SkipIfPressed { x } => write!(f, "SKP V{x}"),
            Opcode::SkipIfNotPressed { x } => write!(f, "SKNP V{x}"),
            Opcode::WaitForKey { x } => write!(f, "LD V{x}, K"),
            Opcode::ReadDelayTimer { x } => write!(f, "LD V{x}, DT"),
            Opcode::SetDelayTimer { x } => write!(f, "LD DT, V{x}"),
            Opcode::SetSoundTimer { x } => write!(f, "LD ST, V{x}"),
            Opcode::FontChar { x } => write!(f, "LD F, V{x}"),
            Opcode::BCD { x } => write!(f, "LD B, V{x}"),
            Opcode::StoreRegs { x } => write!(f, "LD [I], V{x}"),
            Opcode::LoadRegs { x } => write!(f, "LD V{x}, [I]"),
            Opcode::ScrollDown { n } => write!(f, "SCD {n}"),
            Opcode::ScrollRight => write!(f, "SCR"),
            Opcode::ScrollLeft => write!(f, "SCL"),
            Opcode::Exit => write!(f, "EXIT"),
            Opcode::LowRes => write!(f, "LOW"),
            Opcode::HighRes => write!(f, "HIGH"),
            Opcode::BigFontChar { x } => write!(f, "LD HF, V{x}"),
            Opcode::StoreFlags { x } => write!(f, "LD R, V{x}"),
            Opcode::LoadFlags { x } => write!(f, "LD V{x}, R"),
            Opcode::Unknown(opcode) => write!(f, "DW {opcode:#06X}"),
        }
    }
}
