//! Effect playlist: which effect is on screen and how the next one takes
//! over.

use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    signal::Signal,
};
use embassy_time::{
    Duration,
    Timer,
};
use embedded_graphics::prelude::*;

use crate::{
    Error,
    effects::{
        ActiveEffect,
        EffectConfig,
    },
    sink::Sink,
};

/// Raised by the switch timer, consumed by the render task at a frame
/// boundary.
pub type SwitchSignal = Signal<CriticalSectionRawMutex, ()>;

/// Owns the active effect and cycles through a fixed playlist.
///
/// The scheduler lives inside the render task, so `close` and `init` can
/// only run between two frames.
pub struct Scheduler<'t> {
    playlist: &'t [EffectConfig<'t>],
    screen: Size,
    index: usize,
    active: Option<ActiveEffect<'t>>,
}

impl<'t> Scheduler<'t> {
    /// Start with the first playlist entry that initialises.
    pub fn new(playlist: &'t [EffectConfig<'t>], screen: Size) -> Result<Self, Error> {
        let mut scheduler = Self {
            playlist,
            screen,
            index: playlist.len().saturating_sub(1),
            active: None,
        };
        scheduler.advance()?;
        Ok(scheduler)
    }

    /// Close the active effect and initialise the next one.
    ///
    /// Entries that fail to initialise are skipped. If none succeeds nothing
    /// is active afterwards and [`Error::NoEffect`] is returned.
    pub fn advance(&mut self) -> Result<(), Error> {
        if let Some(effect) = self.active.take() {
            effect.close();
        }

        for _ in 0..self.playlist.len() {
            self.index = (self.index + 1) % self.playlist.len();
            let entry = &self.playlist[self.index];
            match entry.init(self.screen) {
                Ok(effect) => {
                    info!("Effect: {}", entry.name());
                    self.active = Some(effect);
                    return Ok(());
                }
                Err(e) => error!("{} init failed: {}", entry.name(), e),
            }
        }

        Err(Error::NoEffect)
    }

    pub fn animate(&mut self) {
        if let Some(effect) = self.active.as_mut() {
            effect.animate();
        }
    }

    pub fn render<S: Sink>(&self, sink: &mut S) {
        if let Some(effect) = self.active.as_ref() {
            effect.render(sink);
        }
    }

    /// Playlist position of the active effect.
    pub const fn index(&self) -> usize {
        self.index
    }

    pub const fn active(&self) -> Option<&ActiveEffect<'t>> {
        self.active.as_ref()
    }

    /// Display name of the active effect, empty when none is active.
    pub fn name(&self) -> &'static str {
        self.active.as_ref().map_or("", ActiveEffect::name)
    }
}

/// Request an effect switch every `interval`.
pub async fn run_switch_timer(request: &SwitchSignal, interval: Duration) -> ! {
    loop {
        Timer::after(interval).await;
        request.signal(());
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::{
        effects::{
            DeformConfig,
            MetaballsConfig,
            PlasmaConfig,
            RotozoomConfig,
        },
        texture::Texture,
    };

    const SCREEN: Size = Size::new(32, 24);

    #[test]
    fn cycles_through_playlist() {
        let tex = Texture::xor_pattern(16, 16).unwrap();
        let playlist = [
            EffectConfig::Metaballs(MetaballsConfig::default()),
            EffectConfig::Plasma(PlasmaConfig::default()),
            EffectConfig::Rotozoom(RotozoomConfig::new(&tex)),
            EffectConfig::Deform(DeformConfig::new(&tex)),
        ];
        let mut scheduler = Scheduler::new(&playlist, SCREEN).unwrap();

        let mut names = vec![scheduler.name()];
        for _ in 0..4 {
            scheduler.advance().unwrap();
            names.push(scheduler.name());
        }
        assert_eq!(
            names,
            ["3 METABALLS", "PALETTE PLASMA", "ROTOZOOM", "PLANE DEFORM", "3 METABALLS"]
        );
        assert_eq!(scheduler.index(), 0);
    }

    #[test]
    fn failing_entry_is_skipped() {
        let big = Texture::xor_pattern(256, 16).unwrap();
        let playlist = [
            EffectConfig::Plasma(PlasmaConfig::default()),
            EffectConfig::Deform(DeformConfig::new(&big)),
            EffectConfig::Metaballs(MetaballsConfig::default()),
        ];
        let mut scheduler = Scheduler::new(&playlist, SCREEN).unwrap();
        scheduler.advance().unwrap();
        assert_eq!(scheduler.index(), 2);
        assert_eq!(scheduler.name(), "3 METABALLS");
    }

    #[test]
    fn nothing_initialises() {
        let big = Texture::xor_pattern(256, 16).unwrap();
        let playlist = [EffectConfig::Deform(DeformConfig::new(&big))];
        assert!(matches!(Scheduler::new(&playlist, SCREEN), Err(Error::NoEffect)));
        assert!(matches!(Scheduler::new(&[], SCREEN), Err(Error::NoEffect)));
    }

    #[test]
    fn animate_and_render_reach_active_effect() {
        let playlist = [EffectConfig::Plasma(PlasmaConfig::default().with_pixel_size(1))];
        let mut scheduler = Scheduler::new(&playlist, SCREEN).unwrap();
        scheduler.animate();

        let mut buf = vec![embedded_graphics::pixelcolor::Rgb565::BLACK; 32 * 24];
        let mut fb = crate::sink::Framebuffer::new(&mut buf, SCREEN).unwrap();
        scheduler.render(&mut fb);

        let Some(ActiveEffect::Plasma(plasma)) = scheduler.active() else {
            panic!("plasma should be active");
        };
        let p = Point::new(5, 5);
        assert_eq!(fb.pixel(p), Some(plasma.palette()[usize::from(plasma.index(p))]));
    }
}
