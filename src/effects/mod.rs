//! Effect modules and the lifecycle they share.
//!
//! Each effect is created by [`Effect::init`], stepped with
//! [`Effect::animate`], drawn with [`Effect::render`] and torn down with
//! [`Effect::close`]. `close` consumes the effect, so a closed effect cannot
//! be animated or rendered again, and an effect that failed to initialise
//! never exists at all.

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};

use crate::{
    Error,
    sink::Sink,
};

pub mod deform;
pub mod metaballs;
pub mod plasma;
pub mod rotozoom;
pub mod warp;

pub use deform::{
    Deform,
    DeformConfig,
    DeformMapping,
};
pub use metaballs::{
    Metaballs,
    MetaballsConfig,
};
pub use plasma::{
    Plasma,
    PlasmaConfig,
};
pub use rotozoom::{
    Rotozoom,
    RotozoomConfig,
};

/// Lifecycle shared by every effect.
pub trait Effect: Sized {
    type Config;

    /// Allocate and populate all state for a `screen` sized display.
    fn init(config: &Self::Config, screen: Size) -> Result<Self, Error>;

    /// Advance by one time step.
    fn animate(&mut self);

    /// Draw into the sink's current clip window.
    fn render<S: Sink>(&self, sink: &mut S);

    /// Release all buffers.
    fn close(self) {}
}

/// Sample points of `clip ∩ screen`, row by row, on a grid aligned to
/// multiples of `stride`.
pub(crate) fn sample_grid(clip: Rectangle, screen: Size, stride: u32) -> impl Iterator<Item = Point> {
    let stride = stride.max(1) as i32;
    let area = clip.intersection(&Rectangle::new(Point::zero(), screen));
    let (start, end) = match area.bottom_right() {
        Some(br) => (area.top_left, br),
        None => (Point::zero(), Point::new(-1, -1)),
    };
    let x0 = start.x - start.x.rem_euclid(stride);
    let y0 = start.y - start.y.rem_euclid(stride);
    (y0..=end.y)
        .step_by(stride as usize)
        .flat_map(move |y| (x0..=end.x).step_by(stride as usize).map(move |x| Point::new(x, y)))
}

/// Write one sample: a pixel, or a `stride`×`stride` block.
#[inline]
pub(crate) fn plot<S: Sink>(sink: &mut S, point: Point, stride: u32, color: Rgb565) {
    if stride <= 1 {
        sink.put_pixel(point, color);
    } else {
        sink.fill_rect(&Rectangle::new(point, Size::new(stride, stride)), color);
    }
}

/// Playlist entry: which effect to run and how it is configured.
#[derive(Debug, Clone)]
pub enum EffectConfig<'t> {
    Metaballs(MetaballsConfig),
    Plasma(PlasmaConfig),
    Rotozoom(RotozoomConfig<'t>),
    Deform(DeformConfig<'t>),
}

impl<'t> EffectConfig<'t> {
    /// Initialise the effect this entry describes.
    pub fn init(&self, screen: Size) -> Result<ActiveEffect<'t>, Error> {
        Ok(match self {
            Self::Metaballs(c) => ActiveEffect::Metaballs(Metaballs::init(c, screen)?),
            Self::Plasma(c) => ActiveEffect::Plasma(Plasma::init(c, screen)?),
            Self::Rotozoom(c) => ActiveEffect::Rotozoom(Rotozoom::init(c, screen)?),
            Self::Deform(c) => ActiveEffect::Deform(Deform::init(c, screen)?),
        })
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Metaballs(_) => Metaballs::NAME,
            Self::Plasma(_) => Plasma::NAME,
            Self::Rotozoom(_) => Rotozoom::NAME,
            Self::Deform(_) => Deform::NAME,
        }
    }
}

/// The effect currently on screen.
pub enum ActiveEffect<'t> {
    Metaballs(Metaballs),
    Plasma(Plasma),
    Rotozoom(Rotozoom<'t>),
    Deform(Deform<'t>),
}

impl ActiveEffect<'_> {
    pub fn animate(&mut self) {
        match self {
            Self::Metaballs(fx) => fx.animate(),
            Self::Plasma(fx) => fx.animate(),
            Self::Rotozoom(fx) => fx.animate(),
            Self::Deform(fx) => fx.animate(),
        }
    }

    pub fn render<S: Sink>(&self, sink: &mut S) {
        match self {
            Self::Metaballs(fx) => fx.render(sink),
            Self::Plasma(fx) => fx.render(sink),
            Self::Rotozoom(fx) => fx.render(sink),
            Self::Deform(fx) => fx.render(sink),
        }
    }

    pub fn close(self) {
        match self {
            Self::Metaballs(fx) => fx.close(),
            Self::Plasma(fx) => fx.close(),
            Self::Rotozoom(fx) => fx.close(),
            Self::Deform(fx) => fx.close(),
        }
    }

    pub const fn name(&self) -> &'static str {
        match self {
            Self::Metaballs(_) => Metaballs::NAME,
            Self::Plasma(_) => Plasma::NAME,
            Self::Rotozoom(_) => Rotozoom::NAME,
            Self::Deform(_) => Deform::NAME,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn grid_is_aligned_to_stride() {
        let clip = Rectangle::new(Point::new(3, 5), Size::new(4, 3));
        let points: Vec<_> = sample_grid(clip, Size::new(16, 16), 2).collect();
        assert_eq!(points.first(), Some(&Point::new(2, 4)));
        assert!(points.iter().all(|p| p.x % 2 == 0 && p.y % 2 == 0));
        assert_eq!(points.len(), 3 * 2);
    }

    #[test]
    fn grid_stays_on_screen() {
        let clip = Rectangle::new(Point::new(-4, -4), Size::new(100, 100));
        let points: Vec<_> = sample_grid(clip, Size::new(4, 3), 1).collect();
        assert_eq!(points.len(), 12);
        assert_eq!(points.last(), Some(&Point::new(3, 2)));
    }

    #[test]
    fn empty_clip_yields_nothing() {
        let clip = Rectangle::new(Point::new(2, 2), Size::zero());
        assert_eq!(sample_grid(clip, Size::new(8, 8), 1).count(), 0);
    }
}
