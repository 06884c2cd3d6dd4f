use super::{Chip8, Chip8Error, Chip8Result};
use crate::u4;
use std::collections::HashSet;

pub const TIMER_HZ: f32 = 60.0;
const TIMER_TIME_STEP: f32 = 1.0 / TIMER_HZ;

pub const MIN_SPEED: u8 = 1;
pub const MAX_SPEED: u8 = 10;
pub const DEFAULT_SPEED: u8 = 4;

/// High-level emulator runner that paces the VM for a host redraw loop.
///
/// Every frame runs `speed` instructions. Timers are ticked from the elapsed wall-clock time
/// at exactly 60Hz, whatever the speed or the host frame rate.
pub struct Chip8Runner {
    chip8: Chip8,
    speed: u8,
    timer_dt_accumulator: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Chip8RunnerResult {
    HitBreakpoint,
    /// The program executed 00FD.
    Exited,
    Ok,
}

impl Chip8Runner {
    pub fn new(chip8: Chip8) -> Self {
        Self::with_speed(chip8, DEFAULT_SPEED)
    }

    pub fn with_speed(chip8: Chip8, speed: u8) -> Self {
        Self {
            chip8,
            speed: speed.clamp(MIN_SPEED, MAX_SPEED),
            timer_dt_accumulator: 0.0,
        }
    }

    /// Instructions executed per frame.
    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn set_speed(&mut self, speed: u8) {
        self.speed = speed.clamp(MIN_SPEED, MAX_SPEED);
    }

    pub fn speed_up(&mut self) {
        self.set_speed(self.speed.saturating_add(1));
    }

    pub fn speed_down(&mut self) {
        self.set_speed(self.speed.saturating_sub(1));
    }

    /// Advance the emulator by one host frame that took `dt` seconds.
    ///
    /// Ticks the timers for the elapsed time, then runs up to `speed` CPU cycles.
    /// The frame ends early when the program waits for a key, exits, or draws with the
    /// `display_wait` quirk on.
    pub fn update(&mut self, dt: f32) -> Result<Chip8RunnerResult, Chip8Error> {
        self.update_with_breakpoints(dt, None)
    }

    /// Like `update` but checks for breakpoints after each CPU cycle.
    pub fn update_with_breakpoints(
        &mut self,
        dt: f32,
        breakpoints: Option<&HashSet<u16>>,
    ) -> Result<Chip8RunnerResult, Chip8Error> {
        self.update_timers(dt);
        self.run_frame(breakpoints)
    }

    /// Ticks the timers once for every full 1/60s accumulated.
    pub fn update_timers(&mut self, dt: f32) {
        self.timer_dt_accumulator += dt;

        while self.timer_dt_accumulator >= TIMER_TIME_STEP {
            self.timer_dt_accumulator -= TIMER_TIME_STEP;
            self.chip8.timers_cycle();
        }
    }

    /// Runs one frame worth of CPU cycles without touching the timers.
    pub fn run_frame(
        &mut self,
        breakpoints: Option<&HashSet<u16>>,
    ) -> Result<Chip8RunnerResult, Chip8Error> {
        for _ in 0..self.speed {
            let cpu_result = self.chip8.cpu_cycle()?;

            if let Some(breakpoints) = &breakpoints
                && breakpoints.contains(&self.chip8.pc)
            {
                return Ok(Chip8RunnerResult::HitBreakpoint);
            }

            match cpu_result {
                Chip8Result::Exited => return Ok(Chip8RunnerResult::Exited),
                // Spinning on FX0A won't change anything until the host updates the keypad
                Chip8Result::WaitingForKey => break,
                Chip8Result::Drew if self.chip8.quirks.display_wait => break,
                Chip8Result::Drew | Chip8Result::Continue | Chip8Result::DecodeFault { .. } => {}
            }
        }

        Ok(Chip8RunnerResult::Ok)
    }

    /// Returns true if the sound timer is active, indicating a beep should be played.
    pub fn should_beep(&self) -> bool {
        self.chip8.should_beep()
    }

    /// Set the state of a key on the keypad.
    pub fn set_key(&mut self, key: u4, pressed: bool) {
        self.chip8.set_key(key, pressed)
    }

    /// Get the state of a pixel on the display (true = on, false = off).
    pub fn get_display_pixel(&self, y: usize, x: usize) -> bool {
        self.chip8.get_display_pixel(y, x)
    }

    pub fn chip8_ref(&self) -> &Chip8 {
        &self.chip8
    }

    pub fn chip8_mut(&mut self) -> &mut Chip8 {
        &mut self.chip8
    }
}
