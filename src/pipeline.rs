//! Render/flush hand-off with a soft vsync.
//!
//! The render task draws into a back buffer while the flush task pushes the
//! front buffer to the panel. Two edge-triggered flags carry the handshake:
//!
//! - `RENDER_FINISHED` is raised by the renderer after a frame is complete and
//!   taken by the flusher with a zero-timeout check.
//! - `FLUSH_STARTED` is raised by the flusher once it owns the new frame and
//!   taken by the renderer's soft vsync wait before it starts drawing again.
//!
//! Buffers change hands through a [`SwapChain`], so each task only ever
//! touches the buffer it currently owns.

use core::cell::RefCell;

use embassy_futures::yield_now;
use embassy_sync::{
    blocking_mutex::{
        Mutex,
        raw::CriticalSectionRawMutex,
    },
    signal::Signal,
};
use embassy_time::{
    Duration,
    Timer,
    with_timeout,
};
use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
};

use crate::{
    Error,
    config::PipelineConfig,
    metrics::Metrics,
    scheduler::{
        Scheduler,
        SwitchSignal,
    },
    sink::{
        Framebuffer,
        Sink,
    },
};

/// The two handshake flags.
pub struct SyncFlags {
    render_finished: Signal<CriticalSectionRawMutex, ()>,
    flush_started: Signal<CriticalSectionRawMutex, ()>,
}

impl SyncFlags {
    pub const fn new() -> Self {
        Self {
            render_finished: Signal::new(),
            flush_started: Signal::new(),
        }
    }

    /// Renderer: a complete frame has been submitted.
    pub fn finish_render(&self) {
        self.render_finished.signal(());
    }

    /// Flusher: check and clear `RENDER_FINISHED` without waiting.
    pub fn take_render_finished(&self) -> bool {
        self.render_finished.try_take().is_some()
    }

    /// Flusher: the submitted frame is now the front buffer.
    pub fn start_flush(&self) {
        self.flush_started.signal(());
    }

    /// Renderer: wait for and clear `FLUSH_STARTED`. Returns `false` if
    /// `timeout` ran out first.
    pub async fn wait_flush_started(&self, timeout: Duration) -> bool {
        with_timeout(timeout, self.flush_started.wait()).await.is_ok()
    }
}

impl Default for SyncFlags {
    fn default() -> Self {
        Self::new()
    }
}

struct Slots<'a> {
    /// Frame submitted by the renderer, not yet picked up by the flusher.
    ready: Option<Framebuffer<'a>>,
    /// Buffer released by the flusher, free for the next frame.
    free: Option<Framebuffer<'a>>,
}

/// Hand-over point for the two framebuffers.
///
/// The flusher always holds the front buffer. The back buffer is either held
/// by the renderer or parked in one of the two slots.
pub struct SwapChain<'a> {
    slots: Mutex<CriticalSectionRawMutex, RefCell<Slots<'a>>>,
}

impl<'a> SwapChain<'a> {
    /// `back` starts out free for the renderer.
    pub fn new(back: Framebuffer<'a>) -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Slots {
                ready: None,
                free: Some(back),
            })),
        }
    }

    /// Renderer: take a buffer to draw into.
    ///
    /// Prefers the buffer the flusher released. If the flusher has not picked
    /// up the last submitted frame yet, that frame is taken back and will be
    /// overwritten.
    pub fn acquire(&self) -> Option<Framebuffer<'a>> {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            if let Some(free) = slots.free.take() {
                return Some(free);
            }
            let reclaimed = slots.ready.take();
            if reclaimed.is_some() {
                warn!("frame dropped before flush");
            }
            reclaimed
        })
    }

    /// Renderer: hand over a finished frame.
    pub fn submit(&self, frame: Framebuffer<'a>) {
        self.slots.lock(|slots| slots.borrow_mut().ready = Some(frame));
    }

    /// Flusher: swap in the submitted frame, releasing the old front buffer.
    /// Returns `false` when no frame is waiting.
    pub fn exchange(&self, front: &mut Framebuffer<'a>) -> bool {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            match slots.ready.take() {
                Some(ready) => {
                    slots.free = Some(core::mem::replace(front, ready));
                    true
                }
                None => false,
            }
        })
    }
}

/// State shared by the render, flush and switch tasks.
pub struct Pipeline<'a> {
    flags: SyncFlags,
    swap: SwapChain<'a>,
    metrics: Metrics,
    switch: SwitchSignal,
}

impl<'a> Pipeline<'a> {
    pub fn new(back: Framebuffer<'a>) -> Self {
        Self {
            flags: SyncFlags::new(),
            swap: SwapChain::new(back),
            metrics: Metrics::new(),
            switch: SwitchSignal::new(),
        }
    }

    pub const fn flags(&self) -> &SyncFlags {
        &self.flags
    }

    pub const fn swap_chain(&self) -> &SwapChain<'a> {
        &self.swap
    }

    pub const fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Signal raised to request the next effect.
    pub const fn switch(&self) -> &SwitchSignal {
        &self.switch
    }
}

/// The render task: animates and draws the active effect every frame.
pub struct Renderer<'p, 'a, 't> {
    pipeline: &'p Pipeline<'a>,
    scheduler: Scheduler<'t>,
    config: PipelineConfig,
    /// Buffers still to be wiped after an effect switch.
    pending_clears: u8,
}

impl<'p, 'a, 't> Renderer<'p, 'a, 't> {
    /// Raises `RENDER_FINISHED` once so the first soft vsync does not stall.
    pub fn new(pipeline: &'p Pipeline<'a>, scheduler: Scheduler<'t>, config: PipelineConfig) -> Self {
        pipeline.flags.finish_render();
        Self {
            pipeline,
            scheduler,
            config,
            pending_clears: 2,
        }
    }

    pub const fn scheduler(&self) -> &Scheduler<'t> {
        &self.scheduler
    }

    /// Render one frame.
    pub async fn frame(&mut self) -> Result<(), Error> {
        self.frame_with(|_, _| {}).await
    }

    /// Render one frame, letting `overlay` draw on top before it is
    /// submitted. The overlay draws with the clip window reset to the whole
    /// buffer.
    pub async fn frame_with<F>(&mut self, overlay: F) -> Result<(), Error>
    where
        F: FnOnce(&mut Framebuffer<'a>, &Scheduler<'t>),
    {
        if self.pipeline.switch.try_take().is_some() {
            self.scheduler.advance()?;
            self.pipeline.metrics.reset();
            self.pending_clears = 2;
        }

        self.scheduler.animate();
        self.soft_vsync().await;

        let Some(mut frame) = self.pipeline.swap.acquire() else {
            warn!("no back buffer available, skipping frame");
            return Ok(());
        };
        if self.pending_clears > 0 {
            frame.clear_all(Rgb565::BLACK);
            self.pending_clears -= 1;
        }

        frame.set_clip(self.config.clip);
        self.scheduler.render(&mut frame);

        let full = frame.bounding_box();
        frame.set_clip(full);
        overlay(&mut frame, &self.scheduler);

        self.pipeline.swap.submit(frame);
        self.pipeline.flags.finish_render();
        Ok(())
    }

    /// Render forever. Returns only if no effect can be initialised anymore.
    pub async fn run_with<F>(mut self, mut overlay: F) -> Error
    where
        F: FnMut(&mut Framebuffer<'a>, &Scheduler<'t>),
    {
        info!("Render task running");
        loop {
            if let Err(e) = self.frame_with(&mut overlay).await {
                error!("render task halted: {}", e);
                return e;
            }
        }
    }

    /// Wait until the flusher has taken the previous frame, then let the panel
    /// settle. No-op without double buffering.
    async fn soft_vsync(&self) {
        if !self.config.double_buffered {
            return;
        }
        if !self.pipeline.flags.wait_flush_started(self.config.vsync_timeout).await {
            warn!("soft vsync timed out");
        }
        if self.config.vsync_settle > Duration::from_ticks(0) {
            Timer::after(self.config.vsync_settle).await;
        }
    }
}

/// The flush task: pushes finished frames to the panel.
pub struct Flusher<'p, 'a, D> {
    pipeline: &'p Pipeline<'a>,
    front: Framebuffer<'a>,
    display: D,
    /// Set once the start-up flush has released the renderer.
    primed: bool,
}

impl<'p, 'a, D> Flusher<'p, 'a, D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub const fn new(pipeline: &'p Pipeline<'a>, front: Framebuffer<'a>, display: D) -> Self {
        Self {
            pipeline,
            front,
            display,
            primed: false,
        }
    }

    pub const fn display(&self) -> &D {
        &self.display
    }

    /// One non-blocking pass. Returns the bytes written if a flush happened.
    pub fn poll(&mut self) -> Option<usize> {
        if !self.pipeline.flags.take_render_finished() {
            return None;
        }

        // Only the start-up flush goes out without a new frame. An empty slot
        // later means the renderer took its frame back, so FLUSH_STARTED must
        // stay low.
        if !self.pipeline.swap.exchange(&mut self.front) && self.primed {
            debug!("submitted frame was reclaimed, nothing to flush");
            return None;
        }
        self.primed = true;
        self.pipeline.flags.start_flush();

        match self.front.flush_to(&mut self.display) {
            Ok(bytes) => {
                self.pipeline.metrics.record_flush(bytes);
                Some(bytes)
            }
            Err(_) => {
                error!("panel write failed");
                None
            }
        }
    }

    /// Poll forever, yielding between passes.
    pub async fn run(mut self) -> ! {
        info!("Flush task running");
        loop {
            self.poll();
            yield_now().await;
        }
    }
}
