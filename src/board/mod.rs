//! Badge bring-up: clocks, pin assignments and the panel.
//!
//! Only the peripherals the renderer needs are claimed here.

mod backlight;
mod display;

pub use backlight::Backlight;
pub use display::Display;
use esp_hal::{
    assign_resources,
    clock::{
        Clock,
        CpuClock,
    },
    rom,
};

/// Failures while bringing up the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error, defmt::Format)]
pub enum BoardError {
    #[error("DMA buffer setup failed")]
    Dma,
    #[error("SPI bus setup failed")]
    Spi,
    #[error("panel init failed")]
    Panel,
}

// ── Pin / peripheral assignments ────────────────────────────────────────────

assign_resources! {
    pub Resources<'d> {
        display: DisplayResources<'d> {
            dc: GPIO15,
            rst: GPIO7,
            sck: GPIO4,
            cs: GPIO6,
            miso: GPIO16,
            mosi: GPIO5,
            spi: SPI2,
            dma: DMA_CH0,
        },
        backlight: BacklightResources<'d> {
            led: GPIO19,
        },
    }
}

// ── Board initialisation ────────────────────────────────────────────────────

/// ESP32-S3 clock switch. The PLL must pass through an intermediate
/// frequency before reaching the target.
fn set_cpu_clock(cpu_clock_speed: CpuClock) {
    let _ = esp_hal::peripherals::SYSTEM::regs()
        .sysclk_conf()
        .modify(|_, w| unsafe { w.soc_clk_sel().bits(1) });
    let _ = esp_hal::peripherals::SYSTEM::regs()
        .cpu_per_conf()
        .modify(|_, w| unsafe {
            let _ = w.pll_freq_sel().set_bit();
            w.cpuperiod_sel().bits(match cpu_clock_speed {
                CpuClock::_80MHz => 0,
                CpuClock::_160MHz => 1,
                _ => 2,
            })
        });

    rom::ets_update_cpu_frequency_rom(cpu_clock_speed.frequency().as_mhz());
}

/// Initialise the badge at full CPU speed and return the raw peripherals.
///
/// Call once at the top of `main`, then split with [`split_resources!`].
#[must_use]
pub fn init() -> esp_hal::peripherals::Peripherals {
    set_cpu_clock(CpuClock::_160MHz);
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    esp_hal::init(config)
}
