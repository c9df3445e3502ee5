//! # badge-fx
//!
//! Demoscene effects for the Disobey 2026 badge, rendered into an off-screen
//! framebuffer and pushed to the 320×170 ST7789 panel by a second task.
//!
//! - **Effects**: metaballs, palette plasma, rotozoom and plane deform, all
//!   behind one [`Effect`](effects::Effect) lifecycle
//! - **Scheduler**: cycles the playlist on a timer, one effect active at a
//!   time
//! - **Pipeline**: double-buffered render/flush hand-off with a soft vsync
//! - **Metrics**: frames and bytes per second of the flush side
//!
//! The renderer is hardware-agnostic: everything draws into a [`Sink`], and
//! the flusher accepts any `embedded-graphics` draw target. Board bring-up
//! lives in `board`, behind the `esp32s3` feature.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! let pipeline = mk_static!(Pipeline<'static>, Pipeline::new(back));
//! let scheduler = Scheduler::new(playlist, SCREEN)?;
//! let renderer = Renderer::new(pipeline, scheduler, PipelineConfig::default());
//! let flusher = Flusher::new(pipeline, front, display);
//! ```

#![cfg_attr(not(test), no_std)]

extern crate alloc;

// This must go first so the log macros are visible to the other modules.
#[macro_use]
mod fmt;

pub mod config;
pub mod effects;
mod error;
pub mod metrics;
pub mod pipeline;
pub mod rng;
pub mod scheduler;
pub mod sink;
pub mod texture;

#[cfg(feature = "esp32s3")]
pub mod board;

pub use config::{
    HEIGHT,
    PipelineConfig,
    SCREEN,
    WIDTH,
};
pub use effects::{
    ActiveEffect,
    Effect,
    EffectConfig,
};
pub use error::Error;
pub use metrics::Metrics;
pub use pipeline::{
    Flusher,
    Pipeline,
    Renderer,
};
pub use scheduler::Scheduler;
pub use sink::{
    Framebuffer,
    Sink,
};
pub use texture::Texture;

/// StaticCell helper: allocates a value into a `static` exactly once.
#[cfg(feature = "esp32s3")]
#[macro_export]
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write($val);
        x
    }};
}
