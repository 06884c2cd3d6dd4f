use std::fmt;

use super::{Display, HIRES_DISPLAY_X, HIRES_DISPLAY_Y, Resolution};

/// Number of pixels moved by the horizontal scroll instructions.
pub const SCROLL_X: usize = 4;

/// Monochrome framebuffer.
///
/// The backing store always has room for the high resolution. Only the top-left
/// `width() x height()` area is active, everything outside of it stays unset.
#[derive(Debug, Clone)]
pub struct Framebuffer {
    resolution: Resolution,
    pixels: Display<bool>,
}

impl Framebuffer {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            pixels: [[false; HIRES_DISPLAY_X]; HIRES_DISPLAY_Y],
        }
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Switches resolution. Always clears the screen, even if the resolution doesn't change.
    pub fn set_resolution(&mut self, resolution: Resolution) {
        self.resolution = resolution;
        self.clear();
    }

    pub fn width(&self) -> usize {
        self.resolution.width()
    }

    pub fn height(&self) -> usize {
        self.resolution.height()
    }

    pub fn clear(&mut self) {
        self.pixels = [[false; HIRES_DISPLAY_X]; HIRES_DISPLAY_Y];
    }

    /// Get the state of a pixel (true = on). Coordinates outside the active area read as off.
    pub fn pixel(&self, x: usize, y: usize) -> bool {
        x < self.width() && y < self.height() && self.pixels[y][x]
    }

    /// Active rows, each sliced to the active width.
    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        let width = self.width();
        self.pixels[..self.height()].iter().map(move |row| &row[..width])
    }

    pub fn lit_pixels(&self) -> usize {
        self.rows().flatten().filter(|&&pixel| pixel).count()
    }

    /// XORs a sprite onto the screen and returns true if any pixel got erased.
    ///
    /// `sprite_width` is 8 or 16 pixels, each row taking `sprite_width / 8` bytes.
    /// The start position wraps around the screen. Pixels running past the right or
    /// bottom edge wrap too, unless `clip` is set in which case they are dropped.
    pub fn draw_sprite(
        &mut self,
        x: usize,
        y: usize,
        sprite: &[u8],
        sprite_width: usize,
        clip: bool,
    ) -> bool {
        let (width, height) = (self.width(), self.height());
        let x_pos = x % width;
        let y_pos = y % height;
        let bytes_per_row = sprite_width / 8;

        let mut any_erased = false;
        for (row, row_bytes) in sprite.chunks(bytes_per_row).enumerate() {
            let bits = row_bytes
                .iter()
                .fold(0u32, |acc, &byte| (acc << 8) | byte as u32);

            for col in 0..sprite_width {
                if bits & (1 << (sprite_width - 1 - col)) == 0 {
                    continue;
                }

                let (mut px, mut py) = (x_pos + col, y_pos + row);
                if clip && (px >= width || py >= height) {
                    continue;
                }
                px %= width;
                py %= height;

                let pixel = &mut self.pixels[py][px];
                *pixel ^= true;
                if !*pixel {
                    any_erased = true;
                }
            }
        }

        any_erased
    }

    /// Moves the picture `n` rows down, vacated rows at the top are cleared.
    pub fn scroll_down(&mut self, n: usize) {
        let height = self.height();
        let n = n.min(height);
        for row in (0..height).rev() {
            self.pixels[row] = if row >= n {
                self.pixels[row - n]
            } else {
                [false; HIRES_DISPLAY_X]
            };
        }
    }

    /// Moves the picture `SCROLL_X` pixels right.
    pub fn scroll_right(&mut self) {
        let (width, height) = (self.width(), self.height());
        for row in self.pixels[..height].iter_mut() {
            row[..width].rotate_right(SCROLL_X);
            row[..SCROLL_X].fill(false);
        }
    }

    /// Moves the picture `SCROLL_X` pixels left.
    pub fn scroll_left(&mut self) {
        let (width, height) = (self.width(), self.height());
        for row in self.pixels[..height].iter_mut() {
            row[..width].rotate_left(SCROLL_X);
            row[width - SCROLL_X..width].fill(false);
        }
    }
}

/// Text dump, `#` for lit pixels and `.` for unset ones, one line per row.
impl fmt::Display for Framebuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.rows() {
            let line: String = row.iter().map(|&on| if on { '#' } else { '.' }).collect();
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl Default for Framebuffer {
    fn default() -> Self {
        Self::new(Resolution::Low)
    }
}
