// src/renderer.rs

//! The render loop: decides when a frame is due, has the painter fill the frame buffer,
//! and hands the buffer to the window for one blit.
//!
//! Scheduling is level-triggered. Any number of invalidations before the next tick collapse
//! into a single `PaintScheduled` state, and a tick with nothing dirty never touches the
//! window surface. Painter and blit failures drop the frame and leave the loop `Idle`.

use crate::dirty::{DirtyRegion, DirtyRegionTracker, Rect};
use crate::event::WindowEvent;
use crate::framebuffer::FrameBuffer;
use crate::platform::backends::x11::X11Backend;
use crate::platform::backends::DisplayBackend;
use crate::platform::os::epoll::{EventMonitor, Interest};
use crate::platform::waker::{EventFdWaker, EventLoopWaker};
use crate::window::Window;

use anyhow::{Context, Result};
use log::{debug, error, info, trace, warn};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(test)]
mod tests;

const DISPLAY_TOKEN: u64 = 1;
const WAKER_TOKEN: u64 = 2;

/// Render loop state. `Painting` is only observable from inside a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Idle,
    PaintScheduled,
    Painting,
}

/// What a single `tick` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Nothing was dirty; the surface was not touched.
    Idle,
    /// The frame was painted and blitted. `dirty` is the region handed to the painter.
    Presented { dirty: DirtyRegion },
    /// The window has no area (or no longer accepts blits); the dirty region was consumed.
    Skipped,
    /// The painter or the blit failed. The dirty region is lost.
    Dropped,
}

/// Fills a frame buffer sized to the window.
///
/// `dirty` is already clipped to the buffer. Painting all of `target` is always correct;
/// restricting work to `dirty` is an optimization.
pub trait Painter {
    fn paint(&mut self, target: &mut FrameBuffer, dirty: &DirtyRegion) -> Result<()>;
}

impl<F> Painter for F
where
    F: FnMut(&mut FrameBuffer, &DirtyRegion) -> Result<()>,
{
    fn paint(&mut self, target: &mut FrameBuffer, dirty: &DirtyRegion) -> Result<()> {
        self(target, dirty)
    }
}

/// Requests repaints from any thread.
#[derive(Clone)]
pub struct InvalidationHandle {
    tracker: Arc<DirtyRegionTracker>,
    waker: Arc<dyn EventLoopWaker>,
}

impl InvalidationHandle {
    /// Adds `rect` to the pending region and wakes the loop if it is sleeping.
    pub fn invalidate(&self, rect: Rect) {
        self.tracker.invalidate(rect);
        if let Err(e) = self.waker.wake() {
            warn!("Failed to wake render loop after invalidation: {:#}", e);
        }
    }
}

impl std::fmt::Debug for InvalidationHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvalidationHandle")
            .field("tracker", &self.tracker)
            .finish_non_exhaustive()
    }
}

pub struct RenderLoop<P: Painter, B: DisplayBackend = X11Backend> {
    window: Window<B>,
    tracker: Arc<DirtyRegionTracker>,
    waker: Arc<EventFdWaker>,
    painter: P,
    frame: FrameBuffer,
    state: FrameState,
    min_frame_interval: Duration,
    last_frame: Option<Instant>,
}

impl<P: Painter, B: DisplayBackend> RenderLoop<P, B> {
    /// Takes ownership of `window` and schedules the first frame.
    ///
    /// Resize invalidates the new bounds and expose invalidates the exposed rectangle. These
    /// handlers are subscribed before any the caller adds later.
    pub fn new(mut window: Window<B>, painter: P, min_frame_interval: Duration) -> Result<Self> {
        let tracker = Arc::new(DirtyRegionTracker::new());
        let waker = Arc::new(EventFdWaker::new().context("Failed to create render loop waker")?);

        let on_event = Arc::clone(&tracker);
        window.subscribe(move |event| match event {
            WindowEvent::Resize { width, height } => {
                on_event.invalidate(Rect::from_size(*width, *height));
            }
            WindowEvent::Expose { rect } => on_event.invalidate(*rect),
            _ => {}
        });

        tracker.invalidate(window.bounds());
        let state = if tracker.is_dirty() {
            FrameState::PaintScheduled
        } else {
            FrameState::Idle
        };
        let frame = FrameBuffer::new(window.width(), window.height());
        debug!(
            "RenderLoop created for {}x{} window (min frame interval {:?})",
            window.width(),
            window.height(),
            min_frame_interval
        );
        Ok(Self {
            window,
            tracker,
            waker,
            painter,
            frame,
            state,
            min_frame_interval,
            last_frame: None,
        })
    }

    pub fn window(&self) -> &Window<B> {
        &self.window
    }

    pub fn window_mut(&mut self) -> &mut Window<B> {
        &mut self.window
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Handle for invalidating from other threads or from event handlers.
    pub fn invalidation_handle(&self) -> InvalidationHandle {
        InvalidationHandle {
            tracker: Arc::clone(&self.tracker),
            waker: Arc::clone(&self.waker) as Arc<dyn EventLoopWaker>,
        }
    }

    pub fn invalidate(&mut self, rect: Rect) {
        self.tracker.invalidate(rect);
        self.sync_state();
    }

    // Invalidations from handles and event handlers only reach the tracker.
    fn sync_state(&mut self) {
        if self.state == FrameState::Idle && self.tracker.is_dirty() {
            trace!("RenderLoop: Idle -> PaintScheduled");
            self.state = FrameState::PaintScheduled;
        }
    }

    /// Runs one pass of the state machine. Always leaves the loop `Idle`.
    pub fn tick(&mut self) -> FrameOutcome {
        self.sync_state();
        if self.state != FrameState::PaintScheduled {
            return FrameOutcome::Idle;
        }
        self.state = FrameState::Painting;
        let outcome = self.paint_frame();
        self.state = FrameState::Idle;
        if outcome != FrameOutcome::Idle {
            self.last_frame = Some(Instant::now());
        }
        trace!("RenderLoop tick: {:?}", outcome);
        outcome
    }

    fn paint_frame(&mut self) -> FrameOutcome {
        let dirty = self.tracker.take_dirty();
        if dirty.is_empty() {
            return FrameOutcome::Idle;
        }
        let (width, height) = self.window.size();
        if width == 0 || height == 0 || self.window.is_closed() {
            debug!("Skipping frame for {}x{} window", width, height);
            return FrameOutcome::Skipped;
        }

        self.frame.resize(width, height);
        let dirty = dirty.clipped_to(&self.frame.bounds());
        if dirty.is_empty() {
            return FrameOutcome::Skipped;
        }

        let painter = &mut self.painter;
        let frame = &mut self.frame;
        match panic::catch_unwind(AssertUnwindSafe(|| painter.paint(frame, &dirty))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!("Painter failed; dropping frame: {:#}", e);
                return FrameOutcome::Dropped;
            }
            Err(_) => {
                error!("Painter panicked; dropping frame");
                return FrameOutcome::Dropped;
            }
        }

        match self.window.draw_pixels(
            self.frame.as_bytes(),
            self.frame.width(),
            self.frame.height(),
            self.frame.stride(),
        ) {
            Ok(()) => FrameOutcome::Presented { dirty },
            Err(e) => {
                warn!("Blit failed; dropping frame: {}", e);
                FrameOutcome::Dropped
            }
        }
    }

    fn frame_due(&self) -> bool {
        self.last_frame
            .map_or(true, |last| last.elapsed() >= self.min_frame_interval)
    }

    /// Milliseconds to sleep before the next useful action; -1 blocks until an fd is ready.
    fn wait_timeout_ms(&self) -> i32 {
        if !self.tracker.is_dirty() {
            return -1;
        }
        let remaining = self.last_frame.map_or(Duration::ZERO, |last| {
            self.min_frame_interval.saturating_sub(last.elapsed())
        });
        // Round up so a wake-up never lands just before the frame is due.
        let ms = remaining.as_micros().div_ceil(1000);
        i32::try_from(ms).unwrap_or(i32::MAX)
    }

    /// Pumps window events and paints due frames until the window stops running or closes.
    ///
    /// Sleeps on the display connection and the invalidation waker between frames.
    pub fn run(&mut self) -> Result<()> {
        let display_fd = self
            .window
            .get_file_descriptor()
            .context("Window has no display connection")?;
        self.window
            .start_running()
            .context("Cannot run a closed window")?;

        let mut monitor = EventMonitor::new()?;
        monitor.add(display_fd, DISPLAY_TOKEN, Interest::READABLE)?;
        monitor.add(self.waker.fd(), WAKER_TOKEN, Interest::READABLE)?;
        info!("RenderLoop running (display fd {})", display_fd);

        loop {
            self.window.process_events();
            if self.window.is_closed() {
                info!("RenderLoop: window closed");
                break;
            }
            if self.frame_due() {
                self.tick();
            }
            if !self.window.is_running() {
                info!("RenderLoop: window stopped");
                break;
            }
            // A blit can pull events into the client-side queue, where they no longer make
            // the descriptor readable.
            if self.window.has_pending_events() {
                trace!("RenderLoop: events queued during the frame; skipping wait");
                continue;
            }

            let timeout = self.wait_timeout_ms();
            for ready in monitor.wait(timeout)? {
                match ready.token {
                    WAKER_TOKEN => self.waker.drain(),
                    DISPLAY_TOKEN => {
                        if ready.flags.intersects(Interest::ERROR | Interest::HANGUP) {
                            anyhow::bail!("Display connection lost (fd {})", display_fd);
                        }
                    }
                    other => trace!("RenderLoop: ignoring readiness for token {}", other),
                }
            }
        }
        Ok(())
    }
}

impl<P: Painter, B: DisplayBackend> std::fmt::Debug for RenderLoop<P, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("window", &self.window)
            .field("state", &self.state)
            .field("min_frame_interval", &self.min_frame_interval)
            .finish_non_exhaustive()
    }
}
