//! Effect playlist on the badge panel, double-buffered and dual-core.
//!
//! Core 0: renders the active effect plus the HUD into the back buffer and
//! switches effects on a timer.
//! Core 1: pushes finished frames to the ST7789 over SPI/DMA.

#![no_std]
#![no_main]

extern crate alloc;

use alloc::format;

use badge_fx::{
    Flusher,
    Framebuffer,
    Metrics,
    Pipeline,
    PipelineConfig,
    Renderer,
    SCREEN,
    Scheduler,
    Texture,
    board::{
        self,
        Backlight,
        Display,
    },
    config::HUD_BAND,
    effects::{
        DeformConfig,
        EffectConfig,
        MetaballsConfig,
        PlasmaConfig,
        RotozoomConfig,
    },
    mk_static,
    scheduler::run_switch_timer,
    split_resources,
};
use defmt::{
    info,
    unwrap,
};
use embassy_executor::Spawner;
use embassy_time::{
    Duration,
    Instant,
    Timer,
};
use embedded_graphics::{
    mono_font::{
        MonoTextStyle,
        MonoTextStyleBuilder,
        iso_8859_1::FONT_10X20,
    },
    pixelcolor::Rgb565,
    prelude::*,
    text::{
        Alignment,
        Baseline,
        Text,
        TextStyleBuilder,
    },
};
use esp_backtrace as _;
use esp_hal::timer::timg::TimerGroup;
use esp_println as _;
use static_cell::ConstStaticCell;

esp_bootloader_esp_idf::esp_app_desc!();

const PIXELS: usize = (SCREEN.width * SCREEN.height) as usize;

static FRONT: ConstStaticCell<[Rgb565; PIXELS]> = ConstStaticCell::new([Rgb565::BLACK; PIXELS]);
static BACK: ConstStaticCell<[Rgb565; PIXELS]> = ConstStaticCell::new([Rgb565::BLACK; PIXELS]);

// ── HUD ─────────────────────────────────────────────────────────────────────

fn hud_style() -> MonoTextStyle<'static, Rgb565> {
    MonoTextStyleBuilder::new()
        .font(&FONT_10X20)
        .text_color(Rgb565::WHITE)
        .background_color(Rgb565::BLACK)
        .build()
}

/// Effect name top-left, frame rate bottom-left, throughput bottom-right.
fn draw_hud(fb: &mut Framebuffer<'_>, name: &str, metrics: &Metrics) {
    let style = hud_style();
    let bottom = SCREEN.height as i32 - HUD_BAND as i32;
    let right = TextStyleBuilder::new()
        .alignment(Alignment::Right)
        .baseline(Baseline::Top)
        .build();
    let left = TextStyleBuilder::new().baseline(Baseline::Top).build();

    let fps = format!("{:5.1} FPS", metrics.fps());
    let kbps = format!("{:7.1} KBPS", metrics.bytes_per_second() / 1024.0);

    let _ = Text::with_text_style(name, Point::zero(), style, left).draw(fb);
    let _ = Text::with_text_style(&fps, Point::new(0, bottom), style, left).draw(fb);
    let _ = Text::with_text_style(&kbps, Point::new(SCREEN.width as i32, bottom), style, right).draw(fb);
}

// ── Tasks ───────────────────────────────────────────────────────────────────

#[embassy_executor::task]
async fn render_task(renderer: Renderer<'static, 'static, 'static>, metrics: &'static Metrics) {
    info!("Render task running on core 0");
    // Only returns once no effect initialises anymore; the error is logged.
    let _ = renderer
        .run_with(|fb, scheduler| draw_hud(fb, scheduler.name(), metrics))
        .await;
    core::future::pending::<()>().await;
}

#[embassy_executor::task]
async fn switch_task(pipeline: &'static Pipeline<'static>, interval: Duration) {
    run_switch_timer(pipeline.switch(), interval).await
}

#[embassy_executor::task]
async fn flush_task(flusher: Flusher<'static, 'static, Display<'static>>) {
    info!("Flush task running on core 1");
    flusher.run().await
}

// ── Entry point ─────────────────────────────────────────────────────────────

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = board::init();
    let resources = split_resources!(peripherals);

    // Deform's warp table is the largest single allocation.
    esp_alloc::heap_allocator!(size: 128 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    esp_rtos::start(timg0.timer0);

    let front = unwrap!(Framebuffer::new(FRONT.take(), SCREEN));
    let back = unwrap!(Framebuffer::new(BACK.take(), SCREEN));
    let pipeline: &'static Pipeline<'static> = mk_static!(Pipeline<'static>, Pipeline::new(back));

    let texture: &'static Texture = mk_static!(Texture, unwrap!(Texture::xor_pattern(64, 64)));
    let seed = Instant::now().as_ticks() as u32;
    let playlist = mk_static!(
        [EffectConfig<'static>; 4],
        [
            EffectConfig::Metaballs(MetaballsConfig::default().with_seed(seed)),
            EffectConfig::Plasma(PlasmaConfig::default()),
            EffectConfig::Rotozoom(RotozoomConfig::new(texture)),
            EffectConfig::Deform(DeformConfig::new(texture)),
        ]
    );

    let config = PipelineConfig::default();
    let scheduler = unwrap!(Scheduler::new(playlist, SCREEN));
    let renderer = Renderer::new(pipeline, scheduler, config);

    // Start second core for the flush task
    use esp_hal::interrupt::software::SoftwareInterruptControl;
    let sw_ints = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);

    let core1_stack = mk_static!(
        esp_hal::system::Stack<8192>,
        esp_hal::system::Stack::new()
    );

    esp_rtos::start_second_core::<8192>(
        peripherals.CPU_CTRL,
        sw_ints.software_interrupt0,
        sw_ints.software_interrupt1,
        core1_stack,
        move || {
            let executor = mk_static!(
                esp_rtos::embassy::Executor,
                esp_rtos::embassy::Executor::new()
            );
            executor.run(|spawner| {
                let display: Display<'static> = unwrap!(resources.display.try_into());
                let backlight = mk_static!(Backlight, resources.backlight.into());
                backlight.on();
                spawner.must_spawn(flush_task(Flusher::new(pipeline, front, display)));
            });
        },
    );

    spawner.must_spawn(render_task(renderer, pipeline.metrics()));
    spawner.must_spawn(switch_task(pipeline, config.switch_interval));

    loop {
        Timer::after(Duration::from_secs(600)).await;
    }
}
