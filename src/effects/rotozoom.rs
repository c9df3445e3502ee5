//! Rotozoom: the texture rotated around the screen origin while the zoom
//! breathes with the same angle.

use embedded_graphics::prelude::*;

use super::{
    Effect,
    plot,
    sample_grid,
    warp::{
        TrigTable,
        fold,
    },
};
use crate::{
    Error,
    sink::Sink,
    texture::Texture,
};

/// Rotozoom tuning.
#[derive(Debug, Clone)]
pub struct RotozoomConfig<'t> {
    pub texture: &'t Texture,
    /// Degrees added to the angle per frame.
    pub speed: u16,
    /// Zoom is `zoom · sin(angle)`.
    pub zoom: f32,
    pub pixel_size: u32,
}

impl<'t> RotozoomConfig<'t> {
    pub const fn new(texture: &'t Texture) -> Self {
        Self {
            texture,
            speed: 2,
            zoom: 1.2,
            pixel_size: 2,
        }
    }

    #[must_use]
    pub const fn with_speed(mut self, speed: u16) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub const fn with_pixel_size(mut self, pixel_size: u32) -> Self {
        self.pixel_size = pixel_size;
        self
    }
}

/// Running rotozoom effect.
pub struct Rotozoom<'t> {
    texture: &'t Texture,
    trig: TrigTable,
    angle: u16,
    speed: u16,
    zoom: f32,
    pixel_size: u32,
    screen: Size,
}

impl Rotozoom<'_> {
    pub const NAME: &'static str = "ROTOZOOM";

    /// Current angle in degrees.
    pub const fn angle(&self) -> u16 {
        self.angle
    }

    /// Texture coordinate sampled for the display pixel at `point`.
    pub fn texel(&self, point: Point) -> (u32, u32) {
        let (s, c) = self.trig.sin_cos(self.angle);
        let z = s * self.zoom;
        let (x, y) = (point.x as f32, point.y as f32);
        let u = ((x * c - y * s) * z) as i32;
        let v = ((x * s + y * c) * z) as i32;
        (fold(u, self.texture.width()), fold(v, self.texture.height()))
    }
}

impl<'t> Effect for Rotozoom<'t> {
    type Config = RotozoomConfig<'t>;

    fn init(config: &RotozoomConfig<'t>, screen: Size) -> Result<Self, Error> {
        Ok(Self {
            texture: config.texture,
            trig: TrigTable::new(),
            angle: 0,
            speed: config.speed % 360,
            zoom: config.zoom,
            pixel_size: config.pixel_size.max(1),
            screen,
        })
    }

    fn animate(&mut self) {
        self.angle = (self.angle + self.speed) % 360;
    }

    fn render<S: Sink>(&self, sink: &mut S) {
        for point in sample_grid(sink.clip(), self.screen, self.pixel_size) {
            let (u, v) = self.texel(point);
            plot(sink, point, self.pixel_size, self.texture.at(u, v));
        }
    }
}
