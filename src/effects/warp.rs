//! Texture-space warping shared by the rotozoom and deform effects.
//!
//! [`WarpTable`] holds one signed `(du, dv)` byte pair per display pixel,
//! computed once from a closed-form mapping. Renderers add a per-frame offset
//! and [`fold`] the result back into the texture.

use alloc::vec::Vec;

use embedded_graphics::prelude::*;

use crate::{
    Error,
    error::{
        buffer_len,
        try_alloc,
    },
};

/// Largest texture dimension whose offsets fit the table's `i8` entries.
pub const MAX_WARP_TEXTURE: u32 = 128;

/// Reduce `value` into `0..dim`, folding negatives back into range.
#[inline]
pub fn fold(value: i32, dim: u32) -> u32 {
    value.rem_euclid(dim as i32) as u32
}

/// Sine and cosine for every integer degree.
pub struct TrigTable {
    sin: [f32; 360],
    cos: [f32; 360],
}

impl TrigTable {
    pub fn new() -> Self {
        let mut sin = [0.0; 360];
        let mut cos = [0.0; 360];
        for deg in 0..360 {
            let rad = deg as f32 * core::f32::consts::PI / 180.0;
            sin[deg] = libm::sinf(rad);
            cos[deg] = libm::cosf(rad);
        }
        Self { sin, cos }
    }

    /// `(sin, cos)` of `degrees`, taken modulo 360.
    #[inline]
    pub fn sin_cos(&self, degrees: u16) -> (f32, f32) {
        let i = usize::from(degrees % 360);
        (self.sin[i], self.cos[i])
    }
}

impl Default for TrigTable {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-pixel texture offsets for a `screen` sized display.
pub struct WarpTable {
    screen: Size,
    offsets: Vec<i8>,
}

impl WarpTable {
    /// Build the table for `texture` sized source images.
    ///
    /// `mapping` receives normalised display coordinates in `[-1, 1)` and
    /// returns texture coordinates in texture widths/heights. Only pixels on
    /// the `stride` grid are computed; the rest stay zero. Mapping results that
    /// are not finite (the singular centre of a polar inversion, for one) map
    /// to offset `(0, 0)`.
    pub fn build(
        screen: Size,
        texture: Size,
        stride: u32,
        mut mapping: impl FnMut(f32, f32) -> (f32, f32),
    ) -> Result<Self, Error> {
        if texture.width > MAX_WARP_TEXTURE || texture.height > MAX_WARP_TEXTURE {
            return Err(Error::TextureTooLarge {
                width: texture.width,
                height: texture.height,
            });
        }

        let mut offsets = try_alloc(buffer_len(screen.width, screen.height, 2)?, 0i8)?;
        let stride = stride.max(1) as usize;
        let (tw, th) = (texture.width as i32, texture.height as i32);
        let (w, h) = (screen.width as f32, screen.height as f32);

        for j in (0..screen.height as usize).step_by(stride) {
            for i in (0..screen.width as usize).step_by(stride) {
                let x = -1.0 + 2.0 * i as f32 / w;
                let y = -1.0 + 2.0 * j as f32 / h;
                let (u, v) = mapping(x, y);
                let (tx, ty) = if u.is_finite() && v.is_finite() {
                    ((tw as f32 * u) as i32 % tw, (th as f32 * v) as i32 % th)
                } else {
                    (0, 0)
                };
                let at = (j * screen.width as usize + i) * 2;
                offsets[at] = tx as i8;
                offsets[at + 1] = ty as i8;
            }
        }

        Ok(Self { screen, offsets })
    }

    /// Offset pair stored for the display pixel at `point`.
    #[inline]
    pub fn offset(&self, point: Point) -> (i8, i8) {
        let at = (point.y as usize * self.screen.width as usize + point.x as usize) * 2;
        (self.offsets[at], self.offsets[at + 1])
    }

    pub const fn screen(&self) -> Size {
        self.screen
    }
}
