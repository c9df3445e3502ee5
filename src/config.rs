//! Screen geometry and frame pipeline settings.

use embassy_time::Duration;
use embedded_graphics::{
    prelude::*,
    primitives::Rectangle,
};

/// Panel width in pixels (landscape).
pub const WIDTH: u32 = 320;

/// Panel height in pixels (landscape).
pub const HEIGHT: u32 = 170;

/// Rows reserved at the top and bottom of the screen for the HUD.
pub const HUD_BAND: u32 = 20;

/// Full panel size.
pub const SCREEN: Size = Size::new(WIDTH, HEIGHT);

/// Frame pipeline settings.
///
/// Built with [`Default`] and tweaked with the `with_*` methods:
///
/// ```rust
/// use badge_fx::PipelineConfig;
/// use embassy_time::Duration;
///
/// let config = PipelineConfig::default()
///     .with_double_buffered(false)
///     .with_switch_interval(Duration::from_secs(5));
/// assert!(!config.double_buffered);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PipelineConfig {
    /// Wait for the flush task before rendering. When off the soft vsync is
    /// skipped and the renderer overwrites frames the panel has not shown yet.
    pub double_buffered: bool,
    /// Upper bound on the soft vsync wait.
    pub vsync_timeout: Duration,
    /// Extra delay after the flush has started, absorbing SPI latency jitter.
    pub vsync_settle: Duration,
    /// Time each effect stays on screen.
    pub switch_interval: Duration,
    /// Window effects are allowed to draw into.
    pub clip: Rectangle,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            double_buffered: true,
            vsync_timeout: Duration::from_secs(10),
            vsync_settle: Duration::from_millis(18),
            switch_interval: Duration::from_secs(10),
            clip: effect_window(SCREEN),
        }
    }
}

impl PipelineConfig {
    #[must_use]
    pub const fn with_double_buffered(mut self, double_buffered: bool) -> Self {
        self.double_buffered = double_buffered;
        self
    }

    #[must_use]
    pub const fn with_vsync_timeout(mut self, timeout: Duration) -> Self {
        self.vsync_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn with_vsync_settle(mut self, settle: Duration) -> Self {
        self.vsync_settle = settle;
        self
    }

    #[must_use]
    pub const fn with_switch_interval(mut self, interval: Duration) -> Self {
        self.switch_interval = interval;
        self
    }

    #[must_use]
    pub const fn with_clip(mut self, clip: Rectangle) -> Self {
        self.clip = clip;
        self
    }
}

/// The part of a `screen` left to effects once the HUD bands are taken.
#[must_use]
pub fn effect_window(screen: Size) -> Rectangle {
    let band = HUD_BAND.min(screen.height / 2);
    Rectangle::new(
        Point::new(0, band as i32),
        Size::new(screen.width, screen.height - 2 * band),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_window_leaves_hud_bands() {
        let clip = effect_window(SCREEN);
        assert_eq!(clip.top_left, Point::new(0, 20));
        assert_eq!(clip.bottom_right(), Some(Point::new(319, 149)));
    }

    #[test]
    fn effect_window_on_tiny_screen_is_empty_not_negative() {
        let clip = effect_window(Size::new(8, 10));
        assert_eq!(clip.size, Size::new(8, 0));
    }
}
