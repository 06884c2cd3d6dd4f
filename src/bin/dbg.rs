use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
};

use anyhow::Context;
use clap::Parser;

use schip8::{
    debugger::{Cli, Command, CommandResult, Executor},
    emu::{Chip8, Chip8Config, Chip8Runner, Chip8RunnerResult, DEFAULT_SPEED, TIMER_HZ},
};

struct App {
    executor: Executor,
    last_command: Option<Command>,
    /// Frames `run` may execute before handing control back to the prompt
    run_frames: u32,
    should_quit: bool,
}

impl App {
    fn new(rom: Vec<u8>, args: &Args) -> anyhow::Result<Self> {
        let mut chip8 = Chip8::with_config(Chip8Config {
            extended: args.extended,
            seed: args.seed,
            ..Chip8Config::default()
        });
        chip8
            .load(&rom)
            .context("Failed to load ROM into CHIP-8 memory")?;

        Ok(Self {
            executor: Executor::new(Chip8Runner::with_speed(chip8, args.speed), rom),
            last_command: None,
            run_frames: args.run_frames,
            should_quit: false,
        })
    }

    fn handle_line(&mut self, line: &str) {
        if line.trim().is_empty() {
            if let Some(command) = self.last_command.clone() {
                self.execute_command(command);
            }
            return;
        }

        match Cli::try_parse_from(line.split_whitespace()) {
            Ok(cli) => {
                self.last_command = Some(cli.command.clone());
                self.execute_command(cli.command);
            }
            Err(e) => {
                println!("{e}");
                self.last_command = None;
            }
        }
    }

    fn execute_command(&mut self, command: Command) {
        match self.executor.execute(command) {
            Ok(result) => match result {
                CommandResult::Ok => {
                    println!("OK");
                }
                CommandResult::Quit => {
                    self.should_quit = true;
                }
                CommandResult::Breakpoints(breakpoints) => {
                    println!("Breakpoints: {:03X?}", breakpoints);
                }
                CommandResult::MemDump { data, offset } => {
                    for (i, byte) in data.iter().enumerate() {
                        if i % 16 == 0 {
                            print!("\n{:03X}: ", offset as usize + i);
                        }
                        print!("{:02X} ", byte);
                    }
                    println!();
                }
                CommandResult::Disasm {
                    instructions,
                    offset,
                } => {
                    for (i, (word, opcode)) in instructions.iter().enumerate() {
                        println!("{:03X}: {:04X} - {}", offset as usize + i * 2, word, opcode);
                    }
                }
                CommandResult::Registers(regs) => {
                    println!(
                        "PC: {:03X}  I: {:03X}  DT: {:02X}  ST: {:02X}",
                        regs.pc, regs.i, regs.delay_timer, regs.sound_timer
                    );
                    for (idx, value) in regs.v.iter().enumerate() {
                        print!("V{idx:X}: {value:02X} ");
                    }
                    println!("\nStack: {:03X?}", regs.stack);
                }
                CommandResult::Screen(screen) => {
                    print!("{screen}");
                }
            },
            Err(e) => {
                println!("{e}");
            }
        }

        self.drive();
    }

    /// Runs frames while the executor is in running mode.
    fn drive(&mut self) {
        let mut frames = 0;
        while self.executor.is_running() {
            if frames == self.run_frames {
                self.executor.pause();
                println!("Paused after {frames} frames");
                break;
            }
            frames += 1;

            match self.executor.poll(1.0 / TIMER_HZ) {
                Ok(Chip8RunnerResult::HitBreakpoint) => {
                    println!("Hit breakpoint at {:03X}", self.executor.snapshot().pc);
                }
                Ok(Chip8RunnerResult::Exited) => {
                    println!("Program exited");
                }
                Ok(Chip8RunnerResult::Ok) => {}
                Err(e) => {
                    println!("{e}");
                }
            }
        }
    }
}

/// Line based debugger for CHIP-8
#[derive(Parser)]
struct Args {
    /// Path to the ROM file to load
    rom_path: PathBuf,

    /// Enable the Super-CHIP instruction set
    #[arg(long)]
    extended: bool,

    /// Instructions per frame
    #[arg(long, default_value_t = DEFAULT_SPEED, value_parser = clap::value_parser!(u8).range(1..=10))]
    speed: u8,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Frames executed by `run` before returning to the prompt
    #[arg(long, default_value_t = 600)]
    run_frames: u32,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rom = std::fs::read(&args.rom_path).context("Failed to read ROM file")?;
    let mut app = App::new(rom, &args).context("Failed to initialize application")?;

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    while !app.should_quit {
        print!("> ");
        io::stdout().flush().context("Failed to flush stdout")?;

        let Some(line) = lines.next() else {
            break;
        };
        app.handle_line(&line.context("Failed to read command")?);
    }

    Ok(())
}
