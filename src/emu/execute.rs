use rand::Rng;

use super::{
    Chip8, Chip8Error, Chip8Result, Opcode, OpcodeALU, Resolution, big_glyph_address,
    glyph_address,
};
use crate::u4;

impl Chip8 {
    pub(crate) fn execute(&mut self, opcode: Opcode) -> Result<Chip8Result, Chip8Error> {
        self.pc = self.pc.wrapping_add(2);

        match opcode {
            Opcode::ClearDisplay => {
                self.display.clear();
                return Ok(Chip8Result::Drew);
            }
            Opcode::Jump { nnn } => {
                self.pc = nnn;
            }
            Opcode::JumpWithOffset { x, nnn } => {
                self.pc = if self.quirks.jump_offset_uses_vx {
                    nnn.wrapping_add(self.v[x].into())
                } else {
                    nnn.wrapping_add(self.v[0].into())
                };
            }
            Opcode::Call { nnn } => {
                self.stack.push(self.pc, nnn)?;
                self.pc = nnn;
            }
            Opcode::Return => {
                self.pc = self.stack.pop()?;
            }
            Opcode::SkipRegEqualImm { x, nn } => {
                if self.v[x] == nn {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::SkipRegNotEqualImm { x, nn } => {
                if self.v[x] != nn {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::SkipRegEqualReg { x, y } => {
                if self.v[x] == self.v[y] {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::SkipRegNotEqualReg { x, y } => {
                if self.v[x] != self.v[y] {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::SetRegImm { x, nn } => {
                self.v[x] = nn;
            }
            Opcode::AddRegImm { x, nn } => {
                self.v[x] = self.v[x].wrapping_add(nn);
            }
            Opcode::ALU { x, y, op } => {
                self.execute_alu(x, y, op);
            }
            Opcode::Random { x, nn } => {
                let rand_byte: u8 = self.rng.random();
                self.v[x] = rand_byte & nn;
            }
            Opcode::SetIndexImm { nnn } => {
                self.i = nnn;
            }
            Opcode::AddIndexReg { x } => {
                self.i = self.i.wrapping_add(self.v[x].into());
            }
            Opcode::Draw { x, y, n } => {
                return self.execute_draw(x, y, n);
            }
            Opcode::SkipIfPressed { x } => {
                if self.keypad.is_pressed(u4::low(self.v[x])) {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::SkipIfNotPressed { x } => {
                if !self.keypad.is_pressed(u4::low(self.v[x])) {
                    self.pc = self.pc.wrapping_add(2);
                }
            }
            Opcode::WaitForKey { x } => {
                return Ok(self.execute_wait_for_key(x));
            }
            Opcode::ReadDelayTimer { x } => {
                self.v[x] = self.delay_timer;
            }
            Opcode::SetDelayTimer { x } => {
                self.delay_timer = self.v[x];
            }
            Opcode::SetSoundTimer { x } => {
                self.sound_timer = self.v[x];
            }
            Opcode::FontChar { x } => {
                self.i = glyph_address(self.v[x]);
            }
            Opcode::BigFontChar { x } => {
                self.i = big_glyph_address(self.v[x]);
            }
            Opcode::BCD { x } => {
                let value = self.v[x];
                let digits = self.mem_slice_mut(self.i, 3)?;
                digits[0] = value / 100;
                digits[1] = (value / 10) % 10;
                digits[2] = value % 10;
            }
            Opcode::StoreRegs { x } => {
                let count = usize::from(x) + 1;
                let regs = self.v;
                self.mem_slice_mut(self.i, count)?
                    .copy_from_slice(&regs[..count]);
                if self.quirks.load_store_increments_i {
                    self.i = self.i.wrapping_add(count as u16);
                }
            }
            Opcode::LoadRegs { x } => {
                let count = usize::from(x) + 1;
                let mut regs = [0u8; 16];
                regs[..count].copy_from_slice(self.mem_slice(self.i, count)?);
                self.v[..count].copy_from_slice(&regs[..count]);
                if self.quirks.load_store_increments_i {
                    self.i = self.i.wrapping_add(count as u16);
                }
            }
            Opcode::StoreFlags { x } => {
                for reg in x.up_to() {
                    self.rpl_flags[reg] = self.v[reg];
                }
            }
            Opcode::LoadFlags { x } => {
                for reg in x.up_to() {
                    self.v[reg] = self.rpl_flags[reg];
                }
            }
            Opcode::ScrollDown { n } => {
                self.display.scroll_down(n.into());
                return Ok(Chip8Result::Drew);
            }
            Opcode::ScrollRight => {
                self.display.scroll_right();
                return Ok(Chip8Result::Drew);
            }
            Opcode::ScrollLeft => {
                self.display.scroll_left();
                return Ok(Chip8Result::Drew);
            }
            Opcode::LowRes => {
                self.display.set_resolution(Resolution::Low);
                return Ok(Chip8Result::Drew);
            }
            Opcode::HighRes => {
                self.display.set_resolution(Resolution::High);
                return Ok(Chip8Result::Drew);
            }
            Opcode::Exit => {
                log::debug!("program exited at {:#05X}", self.pc.wrapping_sub(2));
                self.halted = true;
                return Ok(Chip8Result::Exited);
            }
            Opcode::Unknown(opcode) => {
                self.decode_faults += 1;
                log::warn!(
                    "skipping unknown opcode {opcode:#06X} at {:#05X}",
                    self.pc.wrapping_sub(2)
                );
                return Ok(Chip8Result::DecodeFault { opcode });
            }
        };

        Ok(Chip8Result::Continue)
    }

    fn execute_alu(&mut self, x: u4, y: u4, op: OpcodeALU) {
        // VF is always written last so that it holds the flag even when x is F
        match op {
            OpcodeALU::Set => self.v[x] = self.v[y],
            OpcodeALU::Or => {
                self.v[x] |= self.v[y];
                if self.quirks.logic_resets_vf {
                    self.v[0xF] = 0;
                }
            }
            OpcodeALU::And => {
                self.v[x] &= self.v[y];
                if self.quirks.logic_resets_vf {
                    self.v[0xF] = 0;
                }
            }
            OpcodeALU::Xor => {
                self.v[x] ^= self.v[y];
                if self.quirks.logic_resets_vf {
                    self.v[0xF] = 0;
                }
            }
            OpcodeALU::Add => {
                let (res, overflow) = self.v[x].overflowing_add(self.v[y]);
                self.v[x] = res;
                self.v[0xF] = if overflow { 1 } else { 0 };
            }
            OpcodeALU::Sub => {
                let (res, borrow) = self.v[x].overflowing_sub(self.v[y]);
                self.v[x] = res;
                self.v[0xF] = if borrow { 0 } else { 1 }; // Notice that borrow is inverted
            }
            OpcodeALU::SubReverse => {
                let (res, borrow) = self.v[y].overflowing_sub(self.v[x]);
                self.v[x] = res;
                self.v[0xF] = if borrow { 0 } else { 1 };
            }
            OpcodeALU::ShiftRight => {
                let source = self.shift_source(x, y);
                self.v[x] = source >> 1;
                self.v[0xF] = source & 1;
            }
            OpcodeALU::ShiftLeft => {
                let source = self.shift_source(x, y);
                self.v[x] = source << 1;
                self.v[0xF] = (source >> 7) & 1;
            }
        }
    }

    fn shift_source(&self, x: u4, y: u4) -> u8 {
        if self.quirks.shift_uses_vy {
            self.v[y]
        } else {
            self.v[x]
        }
    }

    fn execute_draw(&mut self, x: u4, y: u4, n: u4) -> Result<Chip8Result, Chip8Error> {
        let (sprite_width, rows) = match usize::from(n) {
            0 if self.extended => (16, 16),
            // Zero height sprite outside of Super-CHIP draws nothing
            0 => return Ok(Chip8Result::Continue),
            rows => (8, rows),
        };

        // Read the whole sprite first so a bad I faults before the screen changes
        let len = rows * sprite_width / 8;
        let mut sprite = [0u8; 32];
        sprite[..len].copy_from_slice(self.mem_slice(self.i, len)?);

        let any_erased = self.display.draw_sprite(
            self.v[x].into(),
            self.v[y].into(),
            &sprite[..len],
            sprite_width,
            self.quirks.clip_sprites,
        );

        self.v[0xF] = if any_erased { 1 } else { 0 };
        Ok(Chip8Result::Drew)
    }

    fn execute_wait_for_key(&mut self, x: u4) -> Chip8Result {
        match self.keypad.first_pressed() {
            Some(key) => {
                self.v[x] = key.into();
                Chip8Result::Continue
            }
            None => {
                // Repeat this instruction until a key is pressed
                self.pc = self.pc.wrapping_sub(2);
                Chip8Result::WaitingForKey
            }
        }
    }
}
