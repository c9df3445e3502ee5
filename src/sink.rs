//! Pixel sink abstraction and the in-memory RGB565 framebuffer.

use embedded_graphics::{
    pixelcolor::{
        Rgb565,
        Rgb888,
    },
    prelude::*,
    primitives::Rectangle,
};
use palette::Srgb;

use crate::{
    Error,
    error::buffer_len,
};

/// Where effects draw.
///
/// Coordinates are screen pixels. Writes outside the current clip window are
/// dropped by the sink.
pub trait Sink {
    /// Write one pixel.
    fn put_pixel(&mut self, point: Point, color: Rgb565);

    /// Fill `area` (clipped) with one color.
    fn fill_rect(&mut self, area: &Rectangle, color: Rgb565);

    /// Restrict subsequent writes to `area`.
    fn set_clip(&mut self, area: Rectangle);

    /// Current clip window.
    fn clip(&self) -> Rectangle;

    /// Build a native color from 8-bit channels.
    fn make_color(r: u8, g: u8, b: u8) -> Rgb565
    where
        Self: Sized,
    {
        rgb(r, g, b)
    }
}

/// 8-bit channels to RGB565, dropping the low bits.
#[must_use]
pub fn rgb(r: u8, g: u8, b: u8) -> Rgb565 {
    Rgb565::from(Rgb888::new(r, g, b))
}

/// Convert an sRGB triple from configuration into the panel format.
#[must_use]
pub fn srgb(color: Srgb<u8>) -> Rgb565 {
    rgb(color.red, color.green, color.blue)
}

/// Flat row-major RGB565 framebuffer over a borrowed pixel slice.
pub struct Framebuffer<'a> {
    pixels: &'a mut [Rgb565],
    size: Size,
    clip: Rectangle,
}

impl<'a> Framebuffer<'a> {
    /// Wrap `pixels` as a `size` framebuffer. The clip window starts as the
    /// whole buffer.
    pub fn new(pixels: &'a mut [Rgb565], size: Size) -> Result<Self, Error> {
        let needed = buffer_len(size.width, size.height, 1).unwrap_or(usize::MAX);
        if pixels.len() < needed {
            return Err(Error::BufferTooSmall {
                needed,
                len: pixels.len(),
            });
        }
        Ok(Self {
            pixels: &mut pixels[..needed],
            size,
            clip: Rectangle::new(Point::zero(), size),
        })
    }

    pub const fn width(&self) -> u32 {
        self.size.width
    }

    pub const fn height(&self) -> u32 {
        self.size.height
    }

    /// Pixel data, row-major.
    pub fn pixels(&self) -> &[Rgb565] {
        self.pixels
    }

    /// Read back one pixel, ignoring the clip window.
    pub fn pixel(&self, point: Point) -> Option<Rgb565> {
        self.index(point).map(|i| self.pixels[i])
    }

    /// Fill the whole buffer, ignoring the clip window.
    pub fn clear_all(&mut self, color: Rgb565) {
        self.pixels.fill(color);
    }

    /// Push the whole buffer to `display`. Returns the number of bytes sent.
    pub fn flush_to<D>(&self, display: &mut D) -> Result<usize, D::Error>
    where
        D: DrawTarget<Color = Rgb565>,
    {
        let area = Rectangle::new(Point::zero(), self.size);
        display.fill_contiguous(&area, self.pixels.iter().copied())?;
        Ok(self.pixels.len() * core::mem::size_of::<u16>())
    }

    fn index(&self, point: Point) -> Option<usize> {
        let Point { x, y } = point;
        if x < 0 || y < 0 || x >= self.size.width as i32 || y >= self.size.height as i32 {
            return None;
        }
        Some(y as usize * self.size.width as usize + x as usize)
    }
}

impl Sink for Framebuffer<'_> {
    fn put_pixel(&mut self, point: Point, color: Rgb565) {
        if !self.clip.contains(point) {
            return;
        }
        if let Some(i) = self.index(point) {
            self.pixels[i] = color;
        }
    }

    fn fill_rect(&mut self, area: &Rectangle, color: Rgb565) {
        let area = area.intersection(&self.clip);
        let Some(bottom_right) = area.bottom_right() else {
            return;
        };
        let width = self.size.width as usize;
        let (x0, x1) = (area.top_left.x as usize, bottom_right.x as usize);
        for y in area.top_left.y..=bottom_right.y {
            let row = y as usize * width;
            self.pixels[row + x0..=row + x1].fill(color);
        }
    }

    fn set_clip(&mut self, area: Rectangle) {
        self.clip = area.intersection(&Rectangle::new(Point::zero(), self.size));
    }

    fn clip(&self) -> Rectangle {
        self.clip
    }
}

impl DrawTarget for Framebuffer<'_> {
    type Color = Rgb565;
    type Error = core::convert::Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            self.put_pixel(point, color);
        }
        Ok(())
    }

    fn fill_solid(&mut self, area: &Rectangle, color: Self::Color) -> Result<(), Self::Error> {
        self.fill_rect(area, color);
        Ok(())
    }
}

impl OriginDimensions for Framebuffer<'_> {
    fn size(&self) -> Size {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use embedded_graphics::mock_display::MockDisplay;

    use super::*;

    #[test]
    fn short_slice_is_rejected() {
        let mut buf = vec![Rgb565::BLACK; 10];
        let err = Framebuffer::new(&mut buf, Size::new(4, 4)).err();
        assert_eq!(
            err,
            Some(Error::BufferTooSmall {
                needed: 16,
                len: 10
            })
        );
    }

    #[test]
    fn oversized_size_is_rejected_not_wrapped() {
        let mut buf = vec![Rgb565::BLACK; 16];
        // 2^16 x 2^16 wraps to zero in u32 math.
        let err = Framebuffer::new(&mut buf, Size::new(1 << 16, 1 << 16)).err();
        assert!(matches!(err, Some(Error::BufferTooSmall { len: 16, .. })));
        let err = Framebuffer::new(&mut buf, Size::new(u32::MAX, u32::MAX)).err();
        assert!(matches!(err, Some(Error::BufferTooSmall { len: 16, .. })));
    }

    #[test]
    fn put_pixel_respects_clip() {
        let mut buf = vec![Rgb565::BLACK; 16];
        let mut fb = Framebuffer::new(&mut buf, Size::new(4, 4)).unwrap();
        fb.set_clip(Rectangle::new(Point::new(1, 1), Size::new(2, 2)));

        fb.put_pixel(Point::new(0, 0), Rgb565::RED);
        fb.put_pixel(Point::new(1, 1), Rgb565::RED);
        fb.put_pixel(Point::new(9, 9), Rgb565::RED);

        assert_eq!(fb.pixel(Point::new(0, 0)), Some(Rgb565::BLACK));
        assert_eq!(fb.pixel(Point::new(1, 1)), Some(Rgb565::RED));
        assert_eq!(fb.pixel(Point::new(9, 9)), None);
    }

    #[test]
    fn fill_rect_is_clipped_to_window() {
        let mut buf = vec![Rgb565::BLACK; 36];
        let mut fb = Framebuffer::new(&mut buf, Size::new(6, 6)).unwrap();
        fb.set_clip(Rectangle::new(Point::new(0, 2), Size::new(6, 2)));
        fb.fill_rect(&Rectangle::new(Point::new(-2, -2), Size::new(20, 20)), Rgb565::GREEN);

        let green = fb.pixels().iter().filter(|&&c| c == Rgb565::GREEN).count();
        assert_eq!(green, 12);
        assert_eq!(fb.pixel(Point::new(3, 1)), Some(Rgb565::BLACK));
        assert_eq!(fb.pixel(Point::new(3, 2)), Some(Rgb565::GREEN));
    }

    #[test]
    fn clip_is_limited_to_buffer() {
        let mut buf = vec![Rgb565::BLACK; 16];
        let mut fb = Framebuffer::new(&mut buf, Size::new(4, 4)).unwrap();
        fb.set_clip(Rectangle::new(Point::new(-5, -5), Size::new(100, 100)));
        assert_eq!(fb.clip(), Rectangle::new(Point::zero(), Size::new(4, 4)));
    }

    #[test]
    fn flush_writes_every_pixel() {
        let mut buf = vec![Rgb565::BLUE; 16];
        let fb = Framebuffer::new(&mut buf, Size::new(4, 4)).unwrap();
        let mut display = MockDisplay::<Rgb565>::new();

        let bytes = fb.flush_to(&mut display).unwrap();

        assert_eq!(bytes, 32);
        assert_eq!(display.get_pixel(Point::new(3, 3)), Some(Rgb565::BLUE));
    }

    #[test]
    fn make_color_scales_channels() {
        let white = Framebuffer::make_color(255, 255, 255);
        assert_eq!(white, Rgb565::WHITE);
        assert_eq!(srgb(Srgb::new(0, 0, 0)), Rgb565::BLACK);
    }
}
