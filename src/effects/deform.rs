//! Plane deformation: every display pixel looks up a precomputed texture
//! offset, and the whole plane scrolls by adding a frame counter.
//!
//! After Iñigo Quílez's "deform" article.

use core::f32::consts::PI;

use embedded_graphics::prelude::*;

use super::{
    Effect,
    plot,
    sample_grid,
    warp::WarpTable,
};
use crate::{
    Error,
    sink::Sink,
    texture::Texture,
};

/// Closed-form `(x, y) -> (u, v)` mapping baked into the warp table.
///
/// `x` and `y` are normalised to `[-1, 1)`; `r` and `a` below are their polar
/// radius and angle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeformMapping {
    /// `u = cos a / r`, `v = sin a / r`.
    #[default]
    PolarInversion,
    /// `u = a / 2π`, `v = sin 7r`.
    Tunnel,
    /// Rotation by `2r`.
    Swirl,
    /// `u = 1 / (r + ½ + ½ sin 5a)`, `v = 3a / π`.
    Flower,
    /// `u = x / |y|`, `v = 1 / |y|`.
    Floor,
}

impl DeformMapping {
    /// Apply the mapping. Singular points come back as `NaN`/`inf` and are
    /// handled by the table builder.
    pub fn map(self, x: f32, y: f32) -> (f32, f32) {
        let r = libm::sqrtf(x * x + y * y);
        let a = libm::atan2f(y, x);
        match self {
            Self::PolarInversion => {
                if r == 0.0 {
                    return (0.0, 0.0);
                }
                (libm::cosf(a) / r, libm::sinf(a) / r)
            }
            Self::Tunnel => (0.5 * a / PI, libm::sinf(7.0 * r)),
            Self::Swirl => {
                let (s, c) = (libm::sinf(2.0 * r), libm::cosf(2.0 * r));
                (x * c - y * s, y * c + x * s)
            }
            Self::Flower => (1.0 / (r + 0.5 + 0.5 * libm::sinf(5.0 * a)), 3.0 * a / PI),
            Self::Floor => {
                let ay = libm::fabsf(y);
                (x / ay, 1.0 / ay)
            }
        }
    }
}

/// Deform tuning.
#[derive(Debug, Clone)]
pub struct DeformConfig<'t> {
    /// Source image, at most 128×128.
    pub texture: &'t Texture,
    pub mapping: DeformMapping,
    /// Frame counter increment per step.
    pub speed: u32,
    pub pixel_size: u32,
}

impl<'t> DeformConfig<'t> {
    pub const fn new(texture: &'t Texture) -> Self {
        Self {
            texture,
            mapping: DeformMapping::PolarInversion,
            speed: 2,
            pixel_size: 1,
        }
    }

    #[must_use]
    pub const fn with_mapping(mut self, mapping: DeformMapping) -> Self {
        self.mapping = mapping;
        self
    }

    #[must_use]
    pub const fn with_speed(mut self, speed: u32) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub const fn with_pixel_size(mut self, pixel_size: u32) -> Self {
        self.pixel_size = pixel_size;
        self
    }
}

/// Running deform effect.
pub struct Deform<'t> {
    texture: &'t Texture,
    table: WarpTable,
    frame: u32,
    speed: u32,
    pixel_size: u32,
}

impl Deform<'_> {
    pub const NAME: &'static str = "PLANE DEFORM";

    pub const fn frame(&self) -> u32 {
        self.frame
    }

    /// Texture coordinate sampled for the display pixel at `point`.
    pub fn texel(&self, point: Point) -> (u32, u32) {
        let (tx, ty) = self.table.offset(point);
        let frame = self.frame as i32;
        let u = i32::from(tx).wrapping_add(frame).unsigned_abs() % self.texture.width();
        let v = i32::from(ty).wrapping_add(frame).unsigned_abs() % self.texture.height();
        (u, v)
    }
}

impl<'t> Effect for Deform<'t> {
    type Config = DeformConfig<'t>;

    fn init(config: &DeformConfig<'t>, screen: Size) -> Result<Self, Error> {
        let mapping = config.mapping;
        let pixel_size = config.pixel_size.max(1);
        let table = WarpTable::build(screen, config.texture.size(), pixel_size, |x, y| mapping.map(x, y))?;
        Ok(Self {
            texture: config.texture,
            table,
            frame: 0,
            speed: config.speed,
            pixel_size,
        })
    }

    fn animate(&mut self) {
        self.frame = self.frame.wrapping_add(self.speed);
    }

    fn render<S: Sink>(&self, sink: &mut S) {
        for point in sample_grid(sink.clip(), self.table.screen(), self.pixel_size) {
            let (u, v) = self.texel(point);
            plot(sink, point, self.pixel_size, self.texture.at(u, v));
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use embedded_graphics::{
        pixelcolor::Rgb565,
        primitives::Rectangle,
    };

    use super::*;
    use crate::sink::Framebuffer;

    const MAPPINGS: [DeformMapping; 5] = [
        DeformMapping::PolarInversion,
        DeformMapping::Tunnel,
        DeformMapping::Swirl,
        DeformMapping::Flower,
        DeformMapping::Floor,
    ];

    #[test]
    fn centre_pixel_uses_fallback() {
        let tex = Texture::xor_pattern(64, 64).unwrap();
        let fx = Deform::init(&DeformConfig::new(&tex), Size::new(32, 24)).unwrap();
        assert_eq!(fx.table.offset(Point::new(16, 12)), (0, 0));
        assert_eq!(fx.texel(Point::new(16, 12)), (0, 0));
    }

    #[test]
    fn polar_inversion_matches_formula() {
        let tex = Texture::xor_pattern(64, 64).unwrap();
        let fx = Deform::init(&DeformConfig::new(&tex), Size::new(32, 24)).unwrap();
        // i = 24 → x = 0.5, j = 12 → y = 0: u = 1 / 0.5 = 2, v = 0, and
        // two texture widths fold back to the origin.
        assert_eq!(fx.table.offset(Point::new(24, 12)), (0, 0));
        // i = 16 → x = 0, j = 18 → y = 0.5: u = 0, v = 2.
        assert_eq!(fx.table.offset(Point::new(16, 18)), (0, 0));
        // i = 20 → x = 0.25, j = 12: u = 4 · 64 = 256 → 0.
        let (tx, _) = fx.table.offset(Point::new(20, 12));
        assert_eq!(tx, 0);
        // i = 28 → x = 0.75: u = 64 / 0.75 = 85 → 21.
        let (tx, _) = fx.table.offset(Point::new(28, 12));
        assert_eq!(tx, 21);
    }

    #[test]
    fn texels_stay_inside_texture_for_any_frame() {
        let tex = Texture::xor_pattern(40, 24).unwrap();
        let screen = Size::new(48, 32);
        for mapping in MAPPINGS {
            let mut fx = Deform::init(&DeformConfig::new(&tex).with_mapping(mapping), screen).unwrap();
            for frame in [0, 1, 2, 127, 128, 1000, u32::MAX - 1, u32::MAX] {
                fx.frame = frame;
                for y in 0..32 {
                    for x in 0..48 {
                        let (u, v) = fx.texel(Point::new(x, y));
                        assert!(u < 40 && v < 24, "{mapping:?} frame {frame}");
                    }
                }
            }
        }
    }

    #[test]
    fn frame_counter_wraps() {
        let tex = Texture::xor_pattern(8, 8).unwrap();
        let mut fx = Deform::init(&DeformConfig::new(&tex).with_speed(3), Size::new(4, 4)).unwrap();
        fx.frame = u32::MAX - 1;
        fx.animate();
        assert_eq!(fx.frame(), 1);
    }

    #[test]
    fn oversized_texture_fails_init() {
        let tex = Texture::xor_pattern(200, 16).unwrap();
        let err = Deform::init(&DeformConfig::new(&tex), Size::new(8, 8)).err();
        assert_eq!(
            err,
            Some(Error::TextureTooLarge {
                width: 200,
                height: 16
            })
        );
    }

    #[test]
    fn render_scrolls_with_frame() {
        let tex = Texture::generate(8, 8, |u, v| if u == 2 && v == 2 { Rgb565::RED } else { Rgb565::BLACK })
            .unwrap();
        let mut fx = Deform::init(&DeformConfig::new(&tex), Size::new(8, 8)).unwrap();
        fx.animate();
        let mut buf = vec![Rgb565::BLUE; 64];
        let mut fb = Framebuffer::new(&mut buf, Size::new(8, 8)).unwrap();
        fx.render(&mut fb);

        // The centre offset is (0, 0), so after one step it samples (2, 2).
        assert_eq!(fb.pixel(Point::new(4, 4)), Some(Rgb565::RED));
        assert!(!fb.pixels().contains(&Rgb565::BLUE));
    }

    #[test]
    fn render_honours_clip() {
        let tex = Texture::xor_pattern(16, 16).unwrap();
        let fx = Deform::init(&DeformConfig::new(&tex), Size::new(8, 8)).unwrap();
        let mut buf = vec![Rgb565::BLUE; 64];
        let mut fb = Framebuffer::new(&mut buf, Size::new(8, 8)).unwrap();
        fb.set_clip(Rectangle::new(Point::new(2, 2), Size::new(3, 3)));
        fx.render(&mut fb);

        let blue = fb.pixels().iter().filter(|&&c| c == Rgb565::BLUE).count();
        assert!(blue >= 64 - 9);
        assert_eq!(fb.pixel(Point::new(0, 0)), Some(Rgb565::BLUE));
    }
}
