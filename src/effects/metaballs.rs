//! Metaballs: blobs bouncing around the screen, blended through an
//! inverse-square density field and banded into three colors.

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};
use palette::{
    Srgb,
    named,
};

use super::{
    Effect,
    plot,
    sample_grid,
};
use crate::{
    Error,
    rng::Rng,
    sink::{
        Sink,
        srgb,
    },
};

/// Fixed size of the particle pool.
pub const MAX_PARTICLES: usize = 16;

/// Smallest squared distance used in the density sum.
pub const DENSITY_EPSILON: f32 = 0.0001;

/// Field thresholds for color bands 0, 1 and 2.
pub const THRESHOLDS: [f32; 3] = [0.65, 0.5, 0.4];

/// One blob.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Particle {
    pub position: Point,
    pub velocity: Point,
    pub radius: u16,
    /// Index into the color ramp this particle was assigned.
    pub color: u8,
}

/// Metaballs tuning.
#[derive(Debug, Clone, PartialEq)]
pub struct MetaballsConfig {
    /// Number of particles, at most [`MAX_PARTICLES`].
    pub count: usize,
    pub min_radius: u16,
    pub max_radius: u16,
    /// Per-axis speed range in pixels per step.
    pub min_velocity: u16,
    pub max_velocity: u16,
    /// Bounce box. `None` uses the whole screen.
    pub bounds: Option<Rectangle>,
    /// Colors for the three bands, densest first.
    pub colors: [Srgb<u8>; 3],
    /// Color below the last threshold. `None` leaves those pixels alone.
    pub background: Option<Srgb<u8>>,
    pub pixel_size: u32,
    pub seed: u32,
}

impl Default for MetaballsConfig {
    fn default() -> Self {
        Self {
            count: 2,
            min_radius: 22,
            max_radius: 53,
            min_velocity: 3,
            max_velocity: 7,
            bounds: None,
            colors: [named::BLACK, named::WHITE, named::LIME],
            background: Some(named::BLACK),
            pixel_size: 2,
            seed: 0x5eed,
        }
    }
}

impl MetaballsConfig {
    #[must_use]
    pub const fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    #[must_use]
    pub const fn with_radius(mut self, min: u16, max: u16) -> Self {
        self.min_radius = min;
        self.max_radius = max;
        self
    }

    #[must_use]
    pub const fn with_velocity(mut self, min: u16, max: u16) -> Self {
        self.min_velocity = min;
        self.max_velocity = max;
        self
    }

    #[must_use]
    pub const fn with_bounds(mut self, bounds: Rectangle) -> Self {
        self.bounds = Some(bounds);
        self
    }

    #[must_use]
    pub const fn with_pixel_size(mut self, pixel_size: u32) -> Self {
        self.pixel_size = pixel_size;
        self
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: u32) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self) -> Result<(), Error> {
        if self.count > MAX_PARTICLES {
            return Err(Error::InvalidConfig("particle count exceeds pool capacity"));
        }
        if self.min_radius == 0 || self.min_radius > self.max_radius {
            return Err(Error::InvalidConfig("radius range"));
        }
        if self.min_velocity > self.max_velocity {
            return Err(Error::InvalidConfig("velocity range"));
        }
        Ok(())
    }
}

/// Running metaballs effect.
pub struct Metaballs {
    particles: [Particle; MAX_PARTICLES],
    count: usize,
    min: Point,
    max: Point,
    colors: [Rgb565; 3],
    background: Option<Rgb565>,
    pixel_size: u32,
    screen: Size,
}

impl Metaballs {
    pub const NAME: &'static str = "3 METABALLS";

    /// Live particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles[..self.count]
    }

    /// Mutable access to the live particles, e.g. to place them by hand.
    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles[..self.count]
    }

    /// Density at `point`: `Σ r² / d²` with `d²` clamped to
    /// [`DENSITY_EPSILON`].
    pub fn field(&self, point: Point) -> f32 {
        self.particles()
            .iter()
            .map(|p| {
                let dx = (point.x - p.position.x) as f32;
                let dy = (point.y - p.position.y) as f32;
                let d2 = (dx * dx + dy * dy).max(DENSITY_EPSILON);
                let r = f32::from(p.radius);
                r * r / d2
            })
            .sum()
    }

    /// Color band for a field value: 0 is densest, 3 is background.
    pub fn band(sum: f32) -> usize {
        THRESHOLDS
            .iter()
            .position(|&t| sum > t)
            .unwrap_or(THRESHOLDS.len())
    }
}

impl Effect for Metaballs {
    type Config = MetaballsConfig;

    fn init(config: &MetaballsConfig, screen: Size) -> Result<Self, Error> {
        config.validate()?;

        let bounds = config
            .bounds
            .unwrap_or_else(|| Rectangle::new(Point::zero(), screen));
        let min = bounds.top_left;
        let max = bounds.top_left + bounds.size;

        let mut rng = Rng::new(config.seed);
        let mut particles = [Particle::default(); MAX_PARTICLES];
        for (i, p) in particles.iter_mut().take(config.count).enumerate() {
            p.radius = rng.range(i32::from(config.min_radius), i32::from(config.max_radius)) as u16;
            // The box's far edge is exclusive.
            p.position = Point::new(
                rng.range(min.x, (max.x - 1).max(min.x)),
                rng.range(min.y, (max.y - 1).max(min.y)),
            );
            p.velocity = Point::new(
                rng.range(i32::from(config.min_velocity), i32::from(config.max_velocity)),
                rng.range(i32::from(config.min_velocity), i32::from(config.max_velocity)),
            );
            p.color = (i % 3) as u8;
        }

        Ok(Self {
            particles,
            count: config.count,
            min,
            max,
            colors: config.colors.map(srgb),
            background: config.background.map(srgb),
            pixel_size: config.pixel_size.max(1),
            screen,
        })
    }

    fn animate(&mut self) {
        let (min, max) = (self.min, self.max);
        for p in self.particles_mut() {
            p.position += p.velocity;

            // Strict comparisons: a ball may sit one step past the edge before
            // it turns around.
            if p.position.x < min.x || p.position.x > max.x {
                p.velocity.x = -p.velocity.x;
            }
            if p.position.y < min.y || p.position.y > max.y {
                p.velocity.y = -p.velocity.y;
            }
        }
    }

    fn render<S: Sink>(&self, sink: &mut S) {
        for point in sample_grid(sink.clip(), self.screen, self.pixel_size) {
            let color = match Self::band(self.field(point)) {
                band @ 0..=2 => self.colors[band],
                _ => match self.background {
                    Some(bg) => bg,
                    None => continue,
                },
            };
            plot(sink, point, self.pixel_size, color);
        }
    }
}
