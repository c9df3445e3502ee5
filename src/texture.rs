//! Read-only source images sampled by the warp effects.

use alloc::vec::Vec;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
};
use tinybmp::Bmp;

use crate::{
    Error,
    error::{
        buffer_len,
        try_alloc,
    },
    sink::Framebuffer,
};

/// Row-major RGB565 image with fixed dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Texture {
    width: u32,
    height: u32,
    pixels: Vec<Rgb565>,
}

impl Texture {
    /// Wrap existing pixel data.
    pub fn new(width: u32, height: u32, pixels: Vec<Rgb565>) -> Result<Self, Error> {
        let len = buffer_len(width, height, 1).ok();
        if width == 0 || height == 0 || len != Some(pixels.len()) {
            return Err(Error::InvalidTexture {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build a texture from a `(u, v) -> color` function.
    pub fn generate(
        width: u32,
        height: u32,
        mut shader: impl FnMut(u32, u32) -> Rgb565,
    ) -> Result<Self, Error> {
        let mut pixels = try_alloc(buffer_len(width, height, 1)?, Rgb565::BLACK)?;
        let row = width as usize;
        for v in 0..height {
            for u in 0..width {
                pixels[v as usize * row + u as usize] = shader(u, v);
            }
        }
        Self::new(width, height, pixels)
    }

    /// Classic XOR pattern, 5-bit intensity in a blue/purple ramp.
    pub fn xor_pattern(width: u32, height: u32) -> Result<Self, Error> {
        Self::generate(width, height, |u, v| {
            let c = ((u ^ v) & 0x1f) as u8;
            Rgb565::new(c, (c / 2) << 1, 31 - c / 2)
        })
    }

    /// Decode an uncompressed 16-, 24- or 32-bit BMP.
    ///
    /// The image is drawn into a scratch framebuffer, which places rows
    /// correctly for both bottom-up and top-down files.
    pub fn from_bmp(data: &[u8]) -> Result<Self, Error> {
        let bmp: Bmp<'_, Rgb565> = Bmp::from_slice(data).map_err(|_| Error::Texture)?;
        let size = bmp.size();
        let mut pixels = try_alloc(buffer_len(size.width, size.height, 1)?, Rgb565::BLACK)?;
        let mut fb = Framebuffer::new(&mut pixels, size)?;
        let _ = bmp.draw(&mut fb);
        Self::new(size.width, size.height, pixels)
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Sample at `(u, v)`. Coordinates must already be folded into range.
    #[inline]
    pub fn at(&self, u: u32, v: u32) -> Rgb565 {
        self.pixels[v as usize * self.width as usize + u as usize]
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    /// 2×2 24-bit BMP: bottom row blue/white, top row red/green.
    const BMP_2X2: &[u8] = &[
        b'B', b'M', 70, 0, 0, 0, 0, 0, 0, 0, 54, 0, 0, 0, // file header
        40, 0, 0, 0, 2, 0, 0, 0, 2, 0, 0, 0, 1, 0, 24, 0, 0, 0, 0, 0, 16, 0, 0, 0, 0x13, 0x0b,
        0, 0, 0x13, 0x0b, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // info header
        0xff, 0, 0, 0xff, 0xff, 0xff, 0, 0, // bottom row (BGR) + padding
        0, 0, 0xff, 0, 0xff, 0, 0, 0, // top row (BGR) + padding
    ];

    #[test]
    fn mismatched_pixel_count_is_rejected() {
        let err = Texture::new(4, 4, vec![Rgb565::BLACK; 3]).unwrap_err();
        assert_eq!(
            err,
            Error::InvalidTexture {
                width: 4,
                height: 4,
                len: 3
            }
        );
        assert!(Texture::new(0, 4, vec![]).is_err());
    }

    #[test]
    fn generated_texture_is_row_major() {
        let tex = Texture::generate(3, 2, |u, v| if (u, v) == (2, 1) { Rgb565::RED } else { Rgb565::BLACK })
            .unwrap();
        assert_eq!(tex.at(2, 1), Rgb565::RED);
        assert_eq!(tex.at(0, 0), Rgb565::BLACK);
    }

    #[test]
    fn xor_pattern_varies() {
        let tex = Texture::xor_pattern(32, 32).unwrap();
        assert_ne!(tex.at(0, 0), tex.at(31, 0));
        assert_eq!(tex.at(5, 9), tex.at(9, 5));
    }

    #[test]
    fn bmp_is_decoded_top_down() {
        let tex = Texture::from_bmp(BMP_2X2).unwrap();
        assert_eq!(tex.size(), Size::new(2, 2));
        assert_eq!(tex.at(0, 0), Rgb565::RED);
        assert_eq!(tex.at(1, 0), Rgb565::GREEN);
        assert_eq!(tex.at(0, 1), Rgb565::BLUE);
        assert_eq!(tex.at(1, 1), Rgb565::WHITE);
    }

    /// The same image stored top-down (negative height).
    const BMP_2X2_TOP_DOWN: &[u8] = &[
        b'B', b'M', 70, 0, 0, 0, 0, 0, 0, 0, 54, 0, 0, 0, // file header
        40, 0, 0, 0, 2, 0, 0, 0, 0xfe, 0xff, 0xff, 0xff, 1, 0, 24, 0, 0, 0, 0, 0, 16, 0, 0, 0,
        0x13, 0x0b, 0, 0, 0x13, 0x0b, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, // info header
        0, 0, 0xff, 0, 0xff, 0, 0, 0, // top row (BGR) + padding
        0xff, 0, 0, 0xff, 0xff, 0xff, 0, 0, // bottom row (BGR) + padding
    ];

    #[test]
    fn top_down_bmp_matches_bottom_up() {
        let tex = Texture::from_bmp(BMP_2X2_TOP_DOWN).unwrap();
        assert_eq!(tex, Texture::from_bmp(BMP_2X2).unwrap());
    }

    #[test]
    fn oversized_texture_fails_to_allocate() {
        let err = Texture::generate(u32::MAX, u32::MAX, |_, _| Rgb565::BLACK).unwrap_err();
        assert!(matches!(err, Error::Allocation { .. }));
    }

    #[test]
    fn garbage_bmp_is_an_error() {
        assert_eq!(Texture::from_bmp(b"not a bitmap"), Err(Error::Texture));
    }
}
