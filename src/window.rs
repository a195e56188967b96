// src/window.rs

//! The native window: lifecycle, event decoding, and the pixel blit.
//!
//! `Window` owns a `DisplayBackend` (the display connection plus one surface), pulls
//! `RawEvent`s from it, decodes them into `WindowEvent`s and hands those to its subscribers.
//! All calls must stay on the thread that opened the window.
//!
//! Lifecycle: `Created -> Shown <-> Hidden -> Closed`. The running flag is orthogonal: `show`
//! and `run` set it, `stop` and the close handshake clear it. Once `Closed`, imperative calls
//! fail with `WindowError::Closed` and no further protocol requests are issued apart from the
//! one-time teardown.

use crate::dirty::Rect;
use crate::error::WindowError;
use crate::event::{Subscribers, SubscriptionId, WindowEvent};
use crate::input::{
    button_for, key_for_keysym, keysym_for, modifiers_for, scroll_delta_for, text_for_keysym,
};
use crate::keys::Modifiers;
use crate::platform::backends::x11::X11Backend;
use crate::platform::backends::{DisplayBackend, RawEvent, WindowHandle};
use log::{debug, info, trace};
use std::cell::Cell;
use std::os::unix::io::RawFd;
use std::rc::Rc;


/// Window lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    Shown,
    Hidden,
    /// Terminal.
    Closed,
}

/// Clears a window's running flag from inside an event handler.
///
/// Same-thread only; the window it came from is usually mutably borrowed by `run`.
#[derive(Debug, Clone)]
pub struct StopHandle(Rc<Cell<bool>>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.0.get()
    }
}

pub struct Window<B: DisplayBackend = X11Backend> {
    backend: B,
    title: String,
    width: u32,
    height: u32,
    lifecycle: Lifecycle,
    running: Rc<Cell<bool>>,
    disposed: bool,
    close_atom: u64,
    // Bounding box of the expose burst in progress.
    expose_burst: Option<Rect>,
    subscribers: Subscribers,
}

impl Window<X11Backend> {
    /// Opens a window on the display named by `$DISPLAY`.
    pub fn open(title: &str, width: u32, height: u32) -> Result<Self, WindowError> {
        Self::open_on(None, title, width, height)
    }

    /// Opens a window on `display_name`, or `$DISPLAY` when `None`.
    pub fn open_on(
        display_name: Option<&str>,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Self, WindowError> {
        let backend = X11Backend::open(display_name, title, width, height)?;
        Ok(Self::with_backend(backend, title, width, height))
    }
}

impl<B: DisplayBackend> Window<B> {
    /// Wraps a backend whose surface was created at `width` x `height`.
    pub fn with_backend(backend: B, title: &str, width: u32, height: u32) -> Self {
        let close_atom = backend.close_atom();
        info!(
            "Window '{}' created: {}x{}, handle {:?}",
            title,
            width,
            height,
            backend.handle()
        );
        Self {
            backend,
            title: title.to_string(),
            width,
            height,
            lifecycle: Lifecycle::Created,
            running: Rc::new(Cell::new(false)),
            disposed: false,
            close_atom,
            expose_burst: None,
            subscribers: Subscribers::new(),
        }
    }

    // --- Getters ---

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Last size confirmed by the server.
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn is_closed(&self) -> bool {
        self.lifecycle == Lifecycle::Closed
    }

    /// Opaque identity of the window; `None` after disposal.
    pub fn handle(&self) -> Option<WindowHandle> {
        (!self.disposed).then(|| self.backend.handle())
    }

    /// Readiness descriptor of the display connection, for multiplexing with other sources.
    pub fn get_file_descriptor(&self) -> Option<RawFd> {
        if self.disposed {
            return None;
        }
        self.backend.connection_fd()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle(Rc::clone(&self.running))
    }

    #[cfg(test)]
    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    // --- Subscriptions ---

    /// Registers `handler`. Handlers run in subscription order.
    pub fn subscribe(&mut self, handler: impl FnMut(&WindowEvent) + 'static) -> SubscriptionId {
        self.subscribers.subscribe(Box::new(handler))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.unsubscribe(id)
    }

    // --- Lifecycle ---

    fn ensure_open(&self) -> Result<(), WindowError> {
        if self.is_closed() {
            Err(WindowError::Closed)
        } else {
            Ok(())
        }
    }

    /// Maps the surface, sets the running flag and flushes.
    pub fn show(&mut self) -> Result<(), WindowError> {
        self.ensure_open()?;
        self.backend.map();
        self.backend.flush();
        self.lifecycle = Lifecycle::Shown;
        self.running.set(true);
        debug!("Window '{}' shown", self.title);
        Ok(())
    }

    pub fn hide(&mut self) -> Result<(), WindowError> {
        self.ensure_open()?;
        self.backend.unmap();
        self.backend.flush();
        self.lifecycle = Lifecycle::Hidden;
        debug!("Window '{}' hidden", self.title);
        Ok(())
    }

    /// Asks the server for a new size. `width()`/`height()` change only when the server
    /// confirms with a structure event, which may report a different size.
    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), WindowError> {
        self.ensure_open()?;
        self.backend.request_resize(width, height);
        self.backend.flush();
        Ok(())
    }

    pub fn set_title(&mut self, title: &str) -> Result<(), WindowError> {
        self.ensure_open()?;
        self.backend.set_title(title)?;
        self.title = title.to_string();
        Ok(())
    }

    /// Sets the running flag for a loop driven outside `run`.
    pub(crate) fn start_running(&mut self) -> Result<(), WindowError> {
        self.ensure_open()?;
        self.running.set(true);
        Ok(())
    }

    /// Clears the running flag. The window stays open.
    pub fn stop(&mut self) {
        self.running.set(false);
    }

    /// Closes the window from the host side and releases native resources.
    pub fn close(&mut self) {
        self.dispose();
    }

    /// Destroys the surface, then closes the connection. Runs once; later calls are no-ops.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        self.lifecycle = Lifecycle::Closed;
        self.running.set(false);
        self.backend.destroy_surface();
        self.backend.close_connection();
        info!("Window '{}' disposed", self.title);
    }

    // --- Event pump ---

    /// Drains every queued event without blocking. Returns the number of notifications raised.
    pub fn process_events(&mut self) -> usize {
        let mut raised = 0;
        while !self.is_closed() && self.backend.pending() > 0 {
            let raw = self.backend.next_event();
            raised += self.dispatch(raw);
        }
        raised
    }

    /// True when events are queued client-side or readable from the connection, so a
    /// `process_events` call would make progress without waiting.
    pub fn has_pending_events(&mut self) -> bool {
        !self.is_closed() && self.backend.pending() > 0
    }

    /// Blocks dispatching one event at a time until `stop` is called or the close handshake
    /// fires.
    pub fn run(&mut self) -> Result<(), WindowError> {
        self.start_running()?;
        info!("Window '{}' entering event loop", self.title);
        while self.running.get() && !self.is_closed() {
            let raw = self.backend.next_event();
            self.dispatch(raw);
        }
        info!("Window '{}' left event loop", self.title);
        Ok(())
    }

    /// Decodes one raw event and notifies subscribers. Returns the number of notifications.
    fn dispatch(&mut self, raw: RawEvent) -> usize {
        trace!("RawEvent: {:?}", raw);
        match raw {
            RawEvent::KeyPress { keycode, state } => {
                let modifiers = modifiers_for(state);
                let keysym =
                    keysym_for(&self.backend, keycode, modifiers.contains(Modifiers::SHIFT));
                let key = key_for_keysym(keysym);
                // The state mask predates the event; a modifier key counts as held once down.
                let modifiers = modifiers | key.held_modifier().unwrap_or_default();
                self.raise(WindowEvent::KeyDown { key, modifiers });
                match text_for_keysym(keysym) {
                    Some(ch) => {
                        self.raise(WindowEvent::TextInput { ch });
                        2
                    }
                    None => 1,
                }
            }
            RawEvent::KeyRelease { keycode, state } => {
                let modifiers = modifiers_for(state);
                let keysym =
                    keysym_for(&self.backend, keycode, modifiers.contains(Modifiers::SHIFT));
                let key = key_for_keysym(keysym);
                let modifiers = modifiers - key.held_modifier().unwrap_or_default();
                self.raise(WindowEvent::KeyUp { key, modifiers });
                1
            }
            RawEvent::ButtonPress { button, x, y, state } => {
                let modifiers = modifiers_for(state);
                match scroll_delta_for(button) {
                    Some(delta) => self.raise(WindowEvent::Scroll {
                        delta,
                        x,
                        y,
                        modifiers,
                    }),
                    None => self.raise(WindowEvent::PointerDown {
                        button: button_for(button),
                        x,
                        y,
                        modifiers,
                    }),
                }
                1
            }
            RawEvent::ButtonRelease { button, x, y, state } => {
                // A wheel notch is a press/release pair; the press already scrolled.
                if scroll_delta_for(button).is_some() {
                    return 0;
                }
                self.raise(WindowEvent::PointerUp {
                    button: button_for(button),
                    x,
                    y,
                    modifiers: modifiers_for(state),
                });
                1
            }
            RawEvent::Motion { x, y, state } => {
                self.raise(WindowEvent::PointerMove {
                    x,
                    y,
                    modifiers: modifiers_for(state),
                });
                1
            }
            RawEvent::Enter { x, y } => {
                self.raise(WindowEvent::PointerEntered { x, y });
                1
            }
            RawEvent::Leave { x, y } => {
                self.raise(WindowEvent::PointerLeft { x, y });
                1
            }
            RawEvent::Expose {
                x,
                y,
                width,
                height,
                count,
            } => {
                let rect = Rect::new(x, y, width.max(0) as u32, height.max(0) as u32);
                let burst = self.expose_burst.map_or(rect, |b| b.union(&rect));
                if count > 0 {
                    self.expose_burst = Some(burst);
                    return 0;
                }
                self.expose_burst = None;
                let rect = if burst.is_empty() { self.bounds() } else { burst };
                self.raise(WindowEvent::Expose { rect });
                1
            }
            RawEvent::Configure { width, height } => {
                let (width, height) = (width.max(0) as u32, height.max(0) as u32);
                if (width, height) == (self.width, self.height) {
                    trace!("ConfigureNotify without size change ({}x{})", width, height);
                    return 0;
                }
                debug!(
                    "Window resized from {}x{} to {}x{}",
                    self.width, self.height, width, height
                );
                self.width = width;
                self.height = height;
                self.raise(WindowEvent::Resize { width, height });
                1
            }
            RawEvent::ClientMessage { data0, .. } => {
                if self.close_atom == 0 || data0 != self.close_atom {
                    trace!("Ignoring client message (data0: {})", data0);
                    return 0;
                }
                info!("Close handshake received for window '{}'", self.title);
                self.running.set(false);
                self.lifecycle = Lifecycle::Closed;
                self.raise(WindowEvent::Close);
                1
            }
            RawEvent::FocusIn => {
                self.raise(WindowEvent::FocusGained);
                1
            }
            RawEvent::FocusOut => {
                self.raise(WindowEvent::FocusLost);
                1
            }
            RawEvent::Other { .. } => 0,
        }
    }

    fn raise(&mut self, event: WindowEvent) {
        self.subscribers.dispatch(&event);
    }

    // --- Blit ---

    /// Copies `pixels` (`height` rows, `stride` bytes apart, 4 bytes per pixel) onto the
    /// surface and flushes. The buffer is not referenced after this returns.
    ///
    /// A zero-sized blit is a no-op.
    pub fn draw_pixels(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<(), WindowError> {
        self.ensure_open()?;
        if width == 0 || height == 0 {
            return Ok(());
        }
        let row_bytes = width as usize * 4;
        if stride < row_bytes {
            return Err(WindowError::InvalidStride { stride, width });
        }
        let required = stride
            .checked_mul(height as usize - 1)
            .and_then(|n| n.checked_add(row_bytes));
        if required.map_or(true, |n| pixels.len() < n) {
            return Err(WindowError::BufferTooSmall {
                len: pixels.len(),
                width,
                height,
                stride,
            });
        }
        self.backend.put_image(pixels, width, height, stride)?;
        self.backend.flush();
        trace!("Blitted {}x{} (stride {})", width, height, stride);
        Ok(())
    }
}

impl<B: DisplayBackend> Drop for Window<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<B: DisplayBackend> std::fmt::Debug for Window<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Window")
            .field("title", &self.title)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("lifecycle", &self.lifecycle)
            .field("running", &self.running.get())
            .field("disposed", &self.disposed)
            .finish()
    }
}
