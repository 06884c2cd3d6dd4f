use clap::{Parser, Subcommand, ValueEnum};
use clap_num::maybe_hex;

use crate::emu::{Chip8Error, Opcode};
use crate::u4;

#[derive(Parser)]
#[command(multicall = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone)]
pub enum Command {
    #[command(visible_alias = "r")]
    Run,

    #[command(visible_alias = "p")]
    Pause,

    /// Execute instructions one at a time
    #[command(visible_alias = "s")]
    Step {
        #[arg(default_value = "1")]
        count: u32,
    },

    /// Tick the delay and sound timers
    #[command(visible_alias = "t")]
    Tick {
        #[arg(default_value = "1")]
        count: u32,
    },

    #[command(visible_alias = "b")]
    Breakpoint {
        #[command(subcommand)]
        action: BreakpointAction,
    },

    Set {
        #[arg(value_parser = parse_set_target)]
        target: SetTarget,
        #[arg(value_parser = maybe_hex::<u16>)]
        value: u16,
    },

    /// Press or release a keypad key
    #[command(visible_alias = "k")]
    Key {
        #[arg(value_parser = parse_key)]
        key: u4,
        state: KeyState,
    },

    /// Instructions per frame while running
    Speed {
        #[arg(value_parser = clap::value_parser!(u8).range(1..=10))]
        value: u8,
    },

    Reset,

    #[command(visible_alias = "reg")]
    Regs,

    /// Print the framebuffer
    #[command(visible_alias = "sc")]
    Screen,

    #[command(visible_alias = "m")]
    Mem {
        #[arg(default_value = "0x200", value_parser = maybe_hex::<u16>)]
        start: u16,
        #[arg(default_value = "16", value_parser = maybe_hex::<u16>)]
        len: u16,
    },

    #[command(visible_alias = "d")]
    Disasm {
        #[arg(default_value = "0x200", value_parser = maybe_hex::<u16>)]
        start: u16,
        #[arg(default_value = "16", value_parser = maybe_hex::<u16>)]
        len: u16,
    },

    #[command(visible_alias = "q")]
    Quit,
}

pub enum CommandResult {
    Ok,
    Breakpoints(Vec<u16>),
    MemDump {
        data: Vec<u8>,
        offset: u16,
    },
    Disasm {
        instructions: Vec<(u16, Opcode)>,
        offset: u16,
    },
    Registers(RegisterSnapshot),
    Screen(String),
    Quit,
}

/// Copy of the programmer visible state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterSnapshot {
    pub pc: u16,
    pub i: u16,
    pub v: [u8; 16],
    pub stack: Vec<u16>,
    pub delay_timer: u8,
    pub sound_timer: u8,
}

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Error while executing cpu instruction: {0}")]
    Chip8Error(#[from] Chip8Error),
    #[error("Value out of range")]
    ValueOutOfRange,
    #[error("Address range {start:#05X}+{len:#X} is outside memory")]
    AddressOutOfRange { start: u16, len: u16 },
}

#[derive(Subcommand, Clone)]
pub enum BreakpointAction {
    #[command(visible_alias = "s")]
    Set {
        #[arg(value_parser = maybe_hex::<u16>)]
        addr: u16,
    },

    #[command(visible_alias = "c")]
    Clear {
        #[arg(value_parser = maybe_hex::<u16>)]
        addr: u16,
    },

    #[command(visible_alias = "l")]
    List,

    #[command(visible_alias = "ca")]
    ClearAll,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum KeyState {
    Down,
    Up,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SetTarget {
    V(u4),
    I,
    Pc,
    Delay,
    Sound,
}

fn parse_set_target(s: &str) -> Result<SetTarget, String> {
    let lower = s.to_lowercase();

    match lower.as_str() {
        "index" | "i" => Ok(SetTarget::I),
        "pc" => Ok(SetTarget::Pc),
        "dt" | "delay" => Ok(SetTarget::Delay),
        "st" | "sound" => Ok(SetTarget::Sound),

        _ if lower.starts_with('v') => {
            let hex_str = &lower[1..];
            match u8::from_str_radix(hex_str, 16).ok().map(u4::try_from) {
                Some(Ok(reg)) => Ok(SetTarget::V(reg)),
                _ => Err(format!("Invalid register: '{}'", s)),
            }
        }

        _ => Err(format!("Unknown set target: '{}'", s)),
    }
}

fn parse_key(s: &str) -> Result<u4, String> {
    let value = maybe_hex::<u8>(s)?;
    u4::try_from(value).map_err(|v| format!("Key {v:#X} is not on the keypad"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(line: &str) -> Command {
        Cli::try_parse_from(line.split_whitespace())
            .unwrap_or_else(|e| panic!("{line}: {e}"))
            .command
    }

    #[test]
    fn parses_aliases_and_defaults() {
        assert!(matches!(parse("s"), Command::Step { count: 1 }));
        assert!(matches!(parse("step 5"), Command::Step { count: 5 }));
        assert!(matches!(
            parse("m"),
            Command::Mem {
                start: 0x200,
                len: 16
            }
        ));
        assert!(matches!(
            parse("b s 0x20A"),
            Command::Breakpoint {
                action: BreakpointAction::Set { addr: 0x20A }
            }
        ));
    }

    #[test]
    fn parses_set_targets() {
        match parse("set vA 0x1F") {
            Command::Set { target, value } => {
                assert_eq!(target, SetTarget::V(u4::new(0xA)));
                assert_eq!(value, 0x1F);
            }
            _ => panic!("expected set"),
        }
        assert!(parse_set_target("vg").is_err());
        assert!(parse_set_target("v10").is_err());
        assert_eq!(parse_set_target("DT"), Ok(SetTarget::Delay));
    }

    #[test]
    fn parses_keys() {
        match parse("key 0xB down") {
            Command::Key { key, state } => {
                assert_eq!(key, u4::new(0xB));
                assert_eq!(state, KeyState::Down);
            }
            _ => panic!("expected key"),
        }
        assert!(Cli::try_parse_from("key 16 up".split_whitespace()).is_err());
    }

    #[test]
    fn speed_is_range_checked() {
        assert!(matches!(parse("speed 10"), Command::Speed { value: 10 }));
        assert!(Cli::try_parse_from("speed 11".split_whitespace()).is_err());
    }
}
