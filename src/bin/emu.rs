use std::path::PathBuf;

use anyhow::Context;
use clap::{Args as ClapArgs, Parser, ValueEnum};
use clap_num::maybe_hex;

use schip8::{
    Chip8, Chip8Config, Chip8Runner, Chip8RunnerResult, DEFAULT_SPEED, KeypadMode, Quirks,
    TIMER_HZ, u4,
};

/// Quirk switches, see `schip8::Quirks`.
#[derive(ClapArgs, Debug)]
struct QuirkArgs {
    /// 8XY6/8XYE shift VY into VX
    #[arg(long)]
    quirk_shift_vy: bool,
    /// FX55/FX65 increment I
    #[arg(long)]
    quirk_load_store_i: bool,
    /// 8XY1/8XY2/8XY3 reset VF
    #[arg(long)]
    quirk_vf_reset: bool,
    /// BXNN jumps to XNN + VX
    #[arg(long)]
    quirk_jump_vx: bool,
    /// Clip sprites at the screen edge instead of wrapping
    #[arg(long)]
    quirk_clip: bool,
    /// End the frame after every draw
    #[arg(long)]
    quirk_display_wait: bool,
}

impl From<&QuirkArgs> for Quirks {
    fn from(args: &QuirkArgs) -> Self {
        Quirks {
            shift_uses_vy: args.quirk_shift_vy,
            load_store_increments_i: args.quirk_load_store_i,
            logic_resets_vf: args.quirk_vf_reset,
            jump_offset_uses_vx: args.quirk_jump_vx,
            clip_sprites: args.quirk_clip,
            display_wait: args.quirk_display_wait,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum KeypadArg {
    Independent,
    Exclusive,
}

impl From<KeypadArg> for KeypadMode {
    fn from(arg: KeypadArg) -> Self {
        match arg {
            KeypadArg::Independent => KeypadMode::Independent,
            KeypadArg::Exclusive => KeypadMode::Exclusive,
        }
    }
}

/// Headless CHIP-8 / Super-CHIP runner.
///
/// Runs a ROM for a number of 60Hz frames, then prints the screen and the registers.
#[derive(Parser, Debug)]
#[command(about)]
struct Args {
    /// Path to the CHIP-8 ROM file
    rom_path: PathBuf,

    /// Enable the Super-CHIP instruction set (starts in 128x64)
    #[arg(long)]
    extended: bool,

    /// Instructions per frame
    #[arg(long, default_value_t = DEFAULT_SPEED, value_parser = clap::value_parser!(u8).range(1..=10))]
    speed: u8,

    /// Number of frames to run
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Seed for the random number instruction
    #[arg(long)]
    seed: Option<u64>,

    /// Keys held down for the whole run (0-F)
    #[arg(long = "hold", value_parser = parse_key)]
    held_keys: Vec<u4>,

    #[arg(long, value_enum, default_value = "independent")]
    keypad: KeypadArg,

    #[command(flatten)]
    quirks: QuirkArgs,
}

fn parse_key(s: &str) -> Result<u4, String> {
    let value = maybe_hex::<u8>(s)?;
    u4::try_from(value).map_err(|v| format!("Key {v:#X} is not on the keypad"))
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rom = std::fs::read(&args.rom_path).context("Failed to read ROM file")?;

    let mut chip8 = Chip8::with_config(Chip8Config {
        extended: args.extended,
        quirks: (&args.quirks).into(),
        keypad_mode: args.keypad.into(),
        seed: args.seed,
    });
    chip8
        .load(&rom)
        .context("Failed to load ROM into CHIP-8 memory")?;

    let mut runner = Chip8Runner::with_speed(chip8, args.speed);
    for &key in &args.held_keys {
        runner.set_key(key, true);
    }

    let mut beep_frames = 0;
    let mut frames_run = 0;
    for _ in 0..args.frames {
        let result = runner
            .update(1.0 / TIMER_HZ)
            .with_context(|| format!("Chip8 Execution error at frame {frames_run}"))?;
        frames_run += 1;

        if runner.should_beep() {
            beep_frames += 1;
        }
        if result == Chip8RunnerResult::Exited {
            log::info!("program exited after {frames_run} frames");
            break;
        }
    }

    let chip8 = runner.chip8_ref();
    print!("{}", chip8.framebuffer());
    println!(
        "frames: {frames_run}  beep frames: {beep_frames}  decode faults: {}",
        chip8.decode_faults()
    );
    println!(
        "PC: {:03X}  I: {:03X}  DT: {:02X}  ST: {:02X}  stack: {:03X?}",
        chip8.pc(),
        chip8.i(),
        chip8.delay_timer(),
        chip8.sound_timer(),
        chip8.stack()
    );
    for (idx, value) in chip8.v().iter().enumerate() {
        print!("V{idx:X}: {value:02X} ");
    }
    println!();

    Ok(())
}
