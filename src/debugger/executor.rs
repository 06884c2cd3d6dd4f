use super::commands::{
    BreakpointAction, Command, CommandError, CommandResult, KeyState, RegisterSnapshot, SetTarget,
};
use crate::emu::{Chip8Error, Chip8Result, Chip8Runner, Chip8RunnerResult, MEMORY_SIZE, Opcode};
use std::collections::HashSet;

pub struct Executor {
    is_running: bool,
    runner: Chip8Runner,
    breakpoints: HashSet<u16>,
    /// Program image reloaded by `reset`
    rom: Vec<u8>,
}

impl Executor {
    /// `runner` must already have `rom` loaded.
    pub fn new(runner: Chip8Runner, rom: Vec<u8>) -> Self {
        Self {
            is_running: false,
            runner,
            breakpoints: HashSet::new(),
            rom,
        }
    }

    pub fn poll(&mut self, dt: f32) -> Result<Chip8RunnerResult, Chip8Error> {
        if !self.is_running {
            return Ok(Chip8RunnerResult::Ok);
        }

        let result = self
            .runner
            .update_with_breakpoints(dt, Some(&self.breakpoints));

        if matches!(
            result,
            Err(_) | Ok(Chip8RunnerResult::HitBreakpoint | Chip8RunnerResult::Exited)
        ) {
            self.is_running = false;
        }

        result
    }

    pub fn execute(&mut self, command: Command) -> Result<CommandResult, CommandError> {
        match command {
            Command::Run => {
                self.is_running = true;
                Ok(CommandResult::Ok)
            }
            Command::Pause => {
                self.pause();
                Ok(CommandResult::Ok)
            }
            Command::Step { count } => self.execute_step(count),
            Command::Tick { count } => {
                for _ in 0..count {
                    self.runner.chip8_mut().timers_cycle();
                }
                Ok(CommandResult::Ok)
            }
            Command::Breakpoint { action } => Ok(self.handle_breakpoint(action)),
            Command::Set { target, value } => self.handle_set(target, value),
            Command::Key { key, state } => {
                self.runner.set_key(key, state == KeyState::Down);
                Ok(CommandResult::Ok)
            }
            Command::Speed { value } => {
                self.runner.set_speed(value);
                Ok(CommandResult::Ok)
            }
            Command::Reset => self.execute_reset(),
            Command::Regs => Ok(CommandResult::Registers(self.snapshot())),
            Command::Screen => Ok(CommandResult::Screen(
                self.runner.chip8_ref().framebuffer().to_string(),
            )),
            Command::Mem { start, len } => self.handle_mem(start, len),
            Command::Disasm { start, len } => self.handle_disasm(start, len),
            Command::Quit => Ok(CommandResult::Quit),
        }
    }

    pub fn pause(&mut self) {
        self.is_running = false;
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn snapshot(&self) -> RegisterSnapshot {
        let chip8 = self.runner.chip8_ref();
        RegisterSnapshot {
            pc: chip8.pc(),
            i: chip8.i(),
            v: *chip8.v(),
            stack: chip8.stack().to_vec(),
            delay_timer: chip8.delay_timer(),
            sound_timer: chip8.sound_timer(),
        }
    }

    pub fn runner(&self) -> &Chip8Runner {
        &self.runner
    }

    pub fn runner_mut(&mut self) -> &mut Chip8Runner {
        &mut self.runner
    }

    fn execute_step(&mut self, count: u32) -> Result<CommandResult, CommandError> {
        for _ in 0..count {
            if self.runner.chip8_mut().cpu_cycle()? == Chip8Result::Exited {
                break;
            }
        }
        Ok(CommandResult::Ok)
    }

    fn execute_reset(&mut self) -> Result<CommandResult, CommandError> {
        self.is_running = false;
        let chip8 = self.runner.chip8_mut();
        chip8.reset();
        chip8.load(&self.rom)?;
        Ok(CommandResult::Ok)
    }

    fn handle_breakpoint(&mut self, action: BreakpointAction) -> CommandResult {
        match action {
            BreakpointAction::Set { addr } => {
                self.breakpoints.insert(addr);
            }
            BreakpointAction::Clear { addr } => {
                self.breakpoints.remove(&addr);
            }
            BreakpointAction::ClearAll => {
                self.breakpoints.clear();
            }
            BreakpointAction::List => {
                let mut bps: Vec<u16> = self.breakpoints.iter().cloned().collect();
                bps.sort();
                return CommandResult::Breakpoints(bps);
            }
        };

        CommandResult::Ok
    }

    fn handle_set(&mut self, target: SetTarget, value: u16) -> Result<CommandResult, CommandError> {
        let chip8 = self.runner.chip8_mut();
        let byte = || u8::try_from(value).map_err(|_| CommandError::ValueOutOfRange);

        match target {
            SetTarget::V(reg) => {
                chip8.v[reg] = byte()?;
            }
            SetTarget::I => {
                chip8.i = value;
            }
            SetTarget::Pc => {
                if usize::from(value) >= MEMORY_SIZE {
                    return Err(CommandError::ValueOutOfRange);
                }
                chip8.pc = value;
            }
            SetTarget::Delay => {
                chip8.delay_timer = byte()?;
            }
            SetTarget::Sound => {
                chip8.sound_timer = byte()?;
            }
        }

        Ok(CommandResult::Ok)
    }

    fn memory_range(&self, start: u16, len: usize) -> Result<&[u8], CommandError> {
        self.runner
            .chip8_ref()
            .memory()
            .get(usize::from(start)..usize::from(start) + len)
            .ok_or(CommandError::AddressOutOfRange {
                start,
                len: len as u16,
            })
    }

    fn handle_mem(&self, start: u16, len: u16) -> Result<CommandResult, CommandError> {
        Ok(CommandResult::MemDump {
            data: self.memory_range(start, len.into())?.to_vec(),
            offset: start,
        })
    }

    fn handle_disasm(&self, start: u16, len: u16) -> Result<CommandResult, CommandError> {
        let extended = self.runner.chip8_ref().is_extended_mode();
        let bytes = self.memory_range(start, usize::from(len) * 2)?;

        let instructions = bytes
            .chunks_exact(2)
            .map(|word| {
                let opcode = u16::from_be_bytes([word[0], word[1]]);
                (opcode, Opcode::decode(opcode, extended))
            })
            .collect::<Vec<_>>();

        Ok(CommandResult::Disasm {
            instructions,
            offset: start,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::Cli;
    use crate::emu::Chip8;
    use clap::Parser;

    fn executor_with(program: &[u16]) -> Executor {
        let rom: Vec<u8> = program.iter().flat_map(|op| op.to_be_bytes()).collect();
        let mut chip8 = Chip8::new();
        chip8.load(&rom).unwrap();
        Executor::new(Chip8Runner::new(chip8), rom)
    }

    fn exec(executor: &mut Executor, line: &str) -> Result<CommandResult, CommandError> {
        let cli = Cli::try_parse_from(line.split_whitespace()).unwrap();
        executor.execute(cli.command)
    }

    #[test]
    fn step_executes_requested_count() {
        let mut executor = executor_with(&[0x7001, 0x7001, 0x7001]);
        exec(&mut executor, "step 2").unwrap();
        assert_eq!(executor.snapshot().v[0], 2);
        assert_eq!(executor.snapshot().pc, 0x204);
    }

    #[test]
    fn step_surfaces_faults() {
        let mut executor = executor_with(&[0x00EE]);
        assert!(matches!(
            exec(&mut executor, "step"),
            Err(CommandError::Chip8Error(Chip8Error::StackUnderflow))
        ));
    }

    #[test]
    fn run_stops_at_breakpoint() {
        let mut executor = executor_with(&[0x7001; 8]);
        exec(&mut executor, "b s 0x206").unwrap();
        exec(&mut executor, "run").unwrap();
        assert!(executor.is_running());

        assert_eq!(
            executor.poll(0.0).unwrap(),
            Chip8RunnerResult::HitBreakpoint
        );
        assert!(!executor.is_running());
        assert_eq!(executor.snapshot().pc, 0x206);
    }

    #[test]
    fn paused_executor_does_not_run() {
        let mut executor = executor_with(&[0x7001]);
        executor.poll(1.0).unwrap();
        assert_eq!(executor.snapshot().pc, 0x200);
    }

    #[test]
    fn breakpoints_are_listed_sorted() {
        let mut executor = executor_with(&[]);
        exec(&mut executor, "b s 0x300").unwrap();
        exec(&mut executor, "b s 0x200").unwrap();
        exec(&mut executor, "b s 0x250").unwrap();
        exec(&mut executor, "b c 0x250").unwrap();
        match exec(&mut executor, "b l").unwrap() {
            CommandResult::Breakpoints(bps) => assert_eq!(bps, vec![0x200, 0x300]),
            _ => panic!("expected breakpoint list"),
        }
    }

    #[test]
    fn set_rejects_values_too_large_for_a_register() {
        let mut executor = executor_with(&[]);
        exec(&mut executor, "set v3 0xFF").unwrap();
        assert_eq!(executor.snapshot().v[3], 0xFF);
        assert!(matches!(
            exec(&mut executor, "set v3 0x100"),
            Err(CommandError::ValueOutOfRange)
        ));
        exec(&mut executor, "set i 0xFFF").unwrap();
        assert_eq!(executor.snapshot().i, 0xFFF);
    }

    #[test]
    fn key_and_tick_commands_reach_the_machine() {
        let mut executor = executor_with(&[0xF50A]);
        exec(&mut executor, "set dt 3").unwrap();
        exec(&mut executor, "tick 2").unwrap();
        assert_eq!(executor.snapshot().delay_timer, 1);

        exec(&mut executor, "key 0xC down").unwrap();
        exec(&mut executor, "step").unwrap();
        assert_eq!(executor.snapshot().v[5], 0xC);
    }

    #[test]
    fn reset_reloads_the_program() {
        let mut executor = executor_with(&[0x6042]);
        exec(&mut executor, "step").unwrap();
        exec(&mut executor, "reset").unwrap();
        assert_eq!(executor.snapshot().v[0], 0);
        assert_eq!(executor.snapshot().pc, 0x200);
        exec(&mut executor, "step").unwrap();
        assert_eq!(executor.snapshot().v[0], 0x42);
    }

    #[test]
    fn mem_and_disasm_read_program() {
        let mut executor = executor_with(&[0x00E0, 0xA22A]);
        match exec(&mut executor, "mem 0x200 4").unwrap() {
            CommandResult::MemDump { data, offset } => {
                assert_eq!(offset, 0x200);
                assert_eq!(data, vec![0x00, 0xE0, 0xA2, 0x2A]);
            }
            _ => panic!("expected memory dump"),
        }
        match exec(&mut executor, "disasm 0x200 2").unwrap() {
            CommandResult::Disasm { instructions, .. } => {
                assert_eq!(instructions[0], (0x00E0, Opcode::ClearDisplay));
                assert_eq!(instructions[1], (0xA22A, Opcode::SetIndexImm { nnn: 0x22A }));
            }
            _ => panic!("expected disassembly"),
        }
        assert!(matches!(
            exec(&mut executor, "mem 0xFFF 2"),
            Err(CommandError::AddressOutOfRange { .. })
        ));
    }
}
