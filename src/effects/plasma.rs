//! Palette plasma: a static sum-of-sines index field whose entries are
//! rotated through a 256-color ramp every frame.

use alloc::vec::Vec;
use core::f32::consts::PI;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};

use super::{
    Effect,
    plot,
    sample_grid,
};
use crate::{
    Error,
    error::{
        buffer_len,
        try_alloc,
    },
    sink::{
        Sink,
        rgb,
    },
};

/// Plasma tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlasmaConfig {
    /// Palette steps added to every field entry per frame.
    pub speed: u8,
    pub pixel_size: u32,
}

impl Default for PlasmaConfig {
    fn default() -> Self {
        Self {
            speed: 6,
            pixel_size: 2,
        }
    }
}

impl PlasmaConfig {
    #[must_use]
    pub const fn with_speed(mut self, speed: u8) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub const fn with_pixel_size(mut self, pixel_size: u32) -> Self {
        self.pixel_size = pixel_size;
        self
    }
}

/// Palette entry `i` as 8-bit RGB.
pub fn palette_rgb(i: u8) -> (u8, u8, u8) {
    let i = f32::from(i);
    let r = 128.0 + 128.0 * libm::sinf(PI * i / 128.0 + 1.0);
    let g = 128.0 + 128.0 * libm::sinf(PI * i / 64.0 + 1.0);
    (r as u8, g as u8, 64)
}

/// Field value at `(x, y)`: the rounded mean of three sinusoids.
pub fn noise(x: i32, y: i32) -> u8 {
    let (x, y) = (x as f32, y as f32);
    let v1 = 128.0 + 128.0 * libm::sinf(x / 32.0);
    let v2 = 128.0 + 128.0 * libm::sinf(y / 24.0);
    let v3 = 128.0 + 128.0 * libm::sinf(libm::sqrtf(x * x + y * y) / 24.0);
    libm::roundf((v1 + v2 + v3) / 3.0) as u8
}

fn full_grid(screen: Size, stride: u32) -> impl Iterator<Item = Point> {
    sample_grid(Rectangle::new(Point::zero(), screen), screen, stride)
}

/// Running plasma effect.
pub struct Plasma {
    palette: Vec<Rgb565>,
    field: Vec<u8>,
    speed: u8,
    pixel_size: u32,
    screen: Size,
}

impl Plasma {
    pub const NAME: &'static str = "PALETTE PLASMA";

    /// Current palette index at `point`.
    pub fn index(&self, point: Point) -> u8 {
        self.field[point.y as usize * self.screen.width as usize + point.x as usize]
    }

    pub fn palette(&self) -> &[Rgb565] {
        &self.palette
    }
}

impl Effect for Plasma {
    type Config = PlasmaConfig;

    fn init(config: &PlasmaConfig, screen: Size) -> Result<Self, Error> {
        let mut palette = try_alloc(256, Rgb565::BLACK)?;
        let mut field = try_alloc(buffer_len(screen.width, screen.height, 1)?, 0u8)?;
        let pixel_size = config.pixel_size.max(1);

        for (i, entry) in palette.iter_mut().enumerate() {
            let (r, g, b) = palette_rgb(i as u8);
            *entry = rgb(r, g, b);
        }
        for point in full_grid(screen, pixel_size) {
            field[point.y as usize * screen.width as usize + point.x as usize] = noise(point.x, point.y);
        }

        Ok(Self {
            palette,
            field,
            speed: config.speed,
            pixel_size,
            screen,
        })
    }

    fn animate(&mut self) {
        let width = self.screen.width as usize;
        for point in full_grid(self.screen, self.pixel_size) {
            let entry = &mut self.field[point.y as usize * width + point.x as usize];
            *entry = entry.wrapping_add(self.speed);
        }
    }

    fn render<S: Sink>(&self, sink: &mut S) {
        for point in sample_grid(sink.clip(), self.screen, self.pixel_size) {
            let color = self.palette[usize::from(self.index(point))];
            plot(sink, point, self.pixel_size, color);
        }
    }
}
