use schip8::{
    Chip8, Chip8Config, Chip8Error, Chip8Result, Chip8Runner, HIRES_DISPLAY_X, HIRES_DISPLAY_Y,
    KeypadMode, u4,
};

fn rom(program: &[u16]) -> Vec<u8> {
    program.iter().flat_map(|op| op.to_be_bytes()).collect()
}

fn boot(config: Chip8Config, program: &[u16]) -> Chip8 {
    let mut chip8 = Chip8::with_config(config);
    chip8.reset();
    chip8.load(&rom(program)).unwrap();
    chip8
}

#[test]
fn clear_screen_program() {
    let mut chip8 = boot(Chip8Config::default(), &[0x00E0]);
    chip8.cpu_cycle().unwrap();

    assert_eq!(chip8.framebuffer().lit_pixels(), 0);
    assert_eq!(chip8.pc(), 0x202);
}

#[test]
fn load_then_add_program() {
    let mut chip8 = boot(Chip8Config::default(), &[0x6005, 0x7003]);
    chip8.cpu_cycle().unwrap();
    chip8.cpu_cycle().unwrap();

    assert_eq!(chip8.v()[0], 8);
    assert_eq!(chip8.pc(), 0x204);
    assert_eq!(chip8.v()[0xF], 0);
}

#[test]
fn zero_height_draw_is_a_noop_in_standard_mode() {
    let mut chip8 = boot(Chip8Config::default(), &[0xA300, 0xD005, 0xD000]);
    chip8.cpu_cycle().unwrap();
    chip8.cpu_cycle().unwrap();
    let lit = chip8.framebuffer().lit_pixels();

    assert_eq!(chip8.cpu_cycle().unwrap(), Chip8Result::Continue);
    assert_eq!(chip8.framebuffer().lit_pixels(), lit);
    assert_eq!(chip8.pc(), 0x206);
}

#[test]
fn reset_after_load_erases_program() {
    let mut chip8 = boot(Chip8Config::default(), &[0x6005]);
    chip8.reset();
    chip8.cpu_cycle().unwrap();
    assert_eq!(chip8.v()[0], 0);
    assert_eq!(chip8.decode_faults(), 1);
}

#[test]
fn sixteen_nested_calls_then_overflow_and_underflow() {
    // 0x200: call 0x200 recursively
    let mut chip8 = boot(Chip8Config::default(), &[0x2200]);
    for _ in 0..16 {
        chip8.cpu_cycle().unwrap();
    }
    assert_eq!(chip8.stack().len(), 16);
    assert!(matches!(
        chip8.cpu_cycle(),
        Err(Chip8Error::StackOverflow { address: 0x200 })
    ));

    let mut chip8 = boot(Chip8Config::default(), &[0x00EE]);
    assert!(matches!(chip8.cpu_cycle(), Err(Chip8Error::StackUnderflow)));
    // The fault is reproducible, nothing moved
    assert!(matches!(chip8.cpu_cycle(), Err(Chip8Error::StackUnderflow)));
}

#[test]
fn timers_drop_by_tick_count_only() {
    let mut chip8 = boot(Chip8Config::default(), &[0x6009, 0xF015, 0xF018, 0x1206]);
    for _ in 0..100 {
        chip8.cpu_cycle().unwrap();
    }
    assert_eq!(chip8.delay_timer(), 9);

    for n in 1..=12u8 {
        chip8.timers_cycle();
        assert_eq!(chip8.delay_timer(), 9u8.saturating_sub(n));
        assert_eq!(chip8.sound_timer(), 9u8.saturating_sub(n));
    }
}

#[test]
fn counter_program_renders_digits() {
    // V0 = 0x7B, BCD to 0x300, load V0..V2, draw the hundreds/tens/ones glyphs
    let program = [
        0x607B, 0xA300, 0xF033, 0xF265, 0x6300, 0x6400, 0xF029, 0xD345, 0x6305, 0xF129, 0xD345,
        0x630A, 0xF229, 0xD345, 0x121C,
    ];
    let mut chip8 = boot(Chip8Config::default(), &program);
    for _ in 0..20 {
        chip8.cpu_cycle().unwrap();
    }

    assert_eq!(&chip8.v()[..3], &[1, 2, 3]);
    assert_eq!(chip8.v()[0xF], 0);
    let screen = chip8.framebuffer().to_string();
    let top: Vec<&str> = screen.lines().take(5).collect();
    // "1" starts with 0x20, "2" with 0xF0, "3" with 0xF0
    assert!(top[0].starts_with("..#..####.####"));
}

#[test]
fn super_chip_program_draws_large_digit_in_high_resolution() {
    let config = Chip8Config {
        extended: true,
        ..Chip8Config::default()
    };
    // LOW, HIGH, V0 = 8, I = big glyph 8, V1 = 124 V2 = 58, draw 10 rows at the corner
    let program = [0x00FE, 0x00FF, 0x6008, 0xF030, 0x617C, 0x623A, 0xD12A, 0x00FD];
    let mut chip8 = boot(config, &program);
    let mut results = Vec::new();
    for _ in 0..10 {
        results.push(chip8.cpu_cycle().unwrap());
    }

    assert_eq!(chip8.framebuffer().width(), HIRES_DISPLAY_X);
    assert_eq!(chip8.framebuffer().height(), HIRES_DISPLAY_Y);
    assert_eq!(results[7], Chip8Result::Exited);
    assert_eq!(results[9], Chip8Result::Exited);
    // Bottom-right corner, wrapping to the left edge and to the top rows
    assert!(chip8.get_display_pixel(58, 126));
    assert!(chip8.get_display_pixel(58, 0));
    assert!(chip8.get_display_pixel(0, 2));
    assert!(!chip8.get_display_pixel(0, 0));
}

#[test]
fn exclusive_keypad_mirrors_single_key_hosts() {
    let config = Chip8Config {
        keypad_mode: KeypadMode::Exclusive,
        ..Chip8Config::default()
    };
    // Wait for key, then skip if key 1 is pressed
    let mut chip8 = boot(config, &[0xF00A, 0x6101, 0xE19E, 0x6AAA, 0x6BBB]);
    chip8.set_key(u4::new(1), true);
    chip8.set_key(u4::new(2), true);
    chip8.cpu_cycle().unwrap();
    assert_eq!(chip8.v()[0], 2);

    chip8.cpu_cycle().unwrap();
    chip8.cpu_cycle().unwrap();
    chip8.cpu_cycle().unwrap();
    assert_eq!(chip8.v()[0xA], 0xAA);
}

#[test]
fn runner_ticks_timers_for_elapsed_time() {
    let chip8 = boot(Chip8Config::default(), &[0x603C, 0xF015, 0x1204]);
    let mut runner = Chip8Runner::with_speed(chip8, 10);
    runner.update(0.0).unwrap();
    assert_eq!(runner.chip8_ref().delay_timer(), 60);

    // One second of 16ms frames plus a little slack
    for _ in 0..63 {
        runner.update(0.016).unwrap();
    }
    assert!(runner.chip8_ref().delay_timer() <= 1);
}
