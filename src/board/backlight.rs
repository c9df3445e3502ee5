//! Panel backlight.

use esp_hal::gpio::{
    Level,
    Output,
    OutputConfig,
};

use super::BacklightResources;

pub struct Backlight {
    pin: Output<'static>,
}

impl From<BacklightResources<'static>> for Backlight {
    fn from(res: BacklightResources<'static>) -> Self {
        // Lit from the start; the first flush is a blank frame anyway.
        Self {
            pin: Output::new(res.led, Level::High, OutputConfig::default()),
        }
    }
}

impl Backlight {
    pub fn on(&mut self) {
        self.pin.set_high();
    }
}
