// src/platform/backends/x11/mod.rs

//! Xlib implementation of `DisplayBackend`.
//!
//! - `connection`: owns the `Display` pointer and default screen resources.
//! - `event`: copies native `XEvent` records into `RawEvent`.
//! - `image`: scratch `XImage` construction for blits.
//!
//! `X11Backend` owns one window on one connection. Teardown destroys the window before
//! closing the display and runs at most once, whether triggered explicitly or from `Drop`.

pub mod connection;
pub mod event;
pub mod image;

use crate::error::WindowError;
use crate::input::{KeysymLookup, NO_SYMBOL};
use crate::platform::backends::{DisplayBackend, RawEvent, WindowHandle};
use connection::Connection;
use image::ScratchImage;
use log::{debug, info, trace, warn};
use std::ffi::CString;
use std::mem;
use std::os::unix::io::RawFd;
use std::ptr;
use std::sync::Once;

use libc::{c_char, c_int, c_uint};
use x11::xlib;

static INSTALL_ERROR_HANDLER: Once = Once::new();

/// Logs protocol errors instead of letting Xlib's default handler exit the process.
unsafe extern "C" fn log_x_error(
    _display: *mut xlib::Display,
    event: *mut xlib::XErrorEvent,
) -> c_int {
    if let Some(err) = event.as_ref() {
        warn!(
            "X protocol error: code {}, request {}.{}, resource 0x{:X}",
            err.error_code, err.request_code, err.minor_code, err.resourceid
        );
    }
    0
}

/// An X11 window and the connection it lives on.
#[derive(Debug)]
pub struct X11Backend {
    connection: Connection,
    window: xlib::Window,
    gc: xlib::GC,
    wm_delete_window: xlib::Atom,
}

impl X11Backend {
    /// Opens the display, creates a `width` x `height` window registered for every input,
    /// exposure, structure and focus class, and arms the `WM_DELETE_WINDOW` handshake.
    pub fn open(
        display_name: Option<&str>,
        title: &str,
        width: u32,
        height: u32,
    ) -> Result<Self, WindowError> {
        INSTALL_ERROR_HANDLER.call_once(|| unsafe {
            xlib::XSetErrorHandler(Some(log_x_error));
        });

        let connection = Connection::open(display_name)?;
        let display = connection.display();
        info!("Creating X11 window: {}x{}px", width, height);

        // SAFETY: `display` is open; the root window and screen come from it.
        let window = unsafe {
            let black = xlib::XBlackPixel(display, connection.screen());
            xlib::XCreateSimpleWindow(
                display,
                connection.root(),
                0,
                0,
                width.max(1) as c_uint,
                height.max(1) as c_uint,
                0,
                black,
                black,
            )
        };
        if window == 0 {
            // `connection` drops here and closes the display.
            return Err(WindowError::SurfaceCreationFailed);
        }

        // From here on Drop tears down the window and the connection.
        let mut backend = Self {
            connection,
            window,
            gc: ptr::null_mut(),
            wm_delete_window: 0,
        };

        unsafe {
            xlib::XSelectInput(display, window, event::EVENT_MASK);

            backend.wm_delete_window = xlib::XInternAtom(
                display,
                b"WM_DELETE_WINDOW\0".as_ptr() as *const c_char,
                xlib::False,
            );
            if backend.wm_delete_window != 0 {
                let mut protocols = [backend.wm_delete_window];
                xlib::XSetWMProtocols(display, window, protocols.as_mut_ptr(), 1);
                debug!("WM_PROTOCOLS (WM_DELETE_WINDOW) registered.");
            } else {
                warn!("Failed to intern WM_DELETE_WINDOW. Window close events will not be received.");
            }

            backend.gc = xlib::XCreateGC(display, window, 0, ptr::null_mut());
        }
        if backend.gc.is_null() {
            return Err(WindowError::SurfaceCreationFailed);
        }

        backend.set_title(title)?;
        debug!("X window created (ID: {})", window);
        Ok(backend)
    }

    /// Display pointer while both the connection and the window are alive.
    fn live_display(&self) -> Option<*mut xlib::Display> {
        (self.connection.is_open() && self.window != 0).then(|| self.connection.display())
    }

    fn intern(&self, name: &[u8]) -> xlib::Atom {
        match self.live_display() {
            Some(display) => unsafe {
                xlib::XInternAtom(display, name.as_ptr() as *const c_char, xlib::False)
            },
            None => 0,
        }
    }
}

impl KeysymLookup for X11Backend {
    fn keycode_to_keysym(&self, keycode: u8, index: i32) -> u64 {
        if !self.connection.is_open() {
            return NO_SYMBOL;
        }
        // SAFETY: the display is open.
        unsafe { xlib::XKeycodeToKeysym(self.connection.display(), keycode, index) as u64 }
    }
}

impl DisplayBackend for X11Backend {
    fn handle(&self) -> WindowHandle {
        WindowHandle {
            connection: self.connection.display() as usize as u64,
            surface: self.window,
        }
    }

    fn close_atom(&self) -> u64 {
        self.wm_delete_window
    }

    fn pending(&mut self) -> usize {
        if !self.connection.is_open() {
            return 0;
        }
        // SAFETY: the display is open. XPending flushes and reads without blocking.
        unsafe { xlib::XPending(self.connection.display()) }.max(0) as usize
    }

    fn next_event(&mut self) -> RawEvent {
        if !self.connection.is_open() {
            warn!("next_event called on a closed X display.");
            return RawEvent::Other { kind: 0 };
        }
        let mut xevent: xlib::XEvent = unsafe { mem::zeroed() };
        // SAFETY: the display is open and `xevent` is a valid destination.
        unsafe { xlib::XNextEvent(self.connection.display(), &mut xevent) };
        event::translate(&xevent)
    }

    fn map(&mut self) {
        if let Some(display) = self.live_display() {
            debug!("Mapping window ID: {}", self.window);
            unsafe { xlib::XMapWindow(display, self.window) };
        }
    }

    fn unmap(&mut self) {
        if let Some(display) = self.live_display() {
            debug!("Unmapping window ID: {}", self.window);
            unsafe { xlib::XUnmapWindow(display, self.window) };
        }
    }

    fn request_resize(&mut self, width: u32, height: u32) {
        if let Some(display) = self.live_display() {
            debug!("Requesting resize of window {} to {}x{}", self.window, width, height);
            unsafe {
                xlib::XResizeWindow(
                    display,
                    self.window,
                    width.max(1) as c_uint,
                    height.max(1) as c_uint,
                );
            }
        }
    }

    fn set_title(&mut self, title: &str) -> Result<(), WindowError> {
        let Some(display) = self.live_display() else {
            return Err(WindowError::Closed);
        };
        let title_c_str = CString::new(title).map_err(|_| WindowError::InvalidTitle)?;
        trace!("Setting window title to '{}' for window ID: {}", title, self.window);
        let net_wm_name_atom = self.intern(b"_NET_WM_NAME\0");
        let utf8_string_atom = self.intern(b"UTF8_STRING\0");
        // SAFETY: the display is open; `title_c_str` outlives both calls.
        unsafe {
            xlib::XStoreName(display, self.window, title_c_str.as_ptr() as *mut c_char);
            if net_wm_name_atom != 0 && utf8_string_atom != 0 {
                xlib::XChangeProperty(
                    display,
                    self.window,
                    net_wm_name_atom,
                    utf8_string_atom,
                    8, // format is 8-bit for UTF8_STRING
                    xlib::PropModeReplace,
                    title_c_str.as_ptr() as *const u8,
                    title_c_str.as_bytes().len() as c_int,
                );
            }
        }
        self.flush();
        Ok(())
    }

    fn flush(&mut self) {
        if self.connection.is_open() {
            unsafe { xlib::XFlush(self.connection.display()) };
        }
    }

    fn put_image(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<(), WindowError> {
        let Some(display) = self.live_display() else {
            return Err(WindowError::Closed);
        };
        let image = ScratchImage::create(&self.connection, pixels, width, height, stride)?;
        // SAFETY: the display, window, GC and image are all live for the call.
        unsafe {
            xlib::XPutImage(
                display,
                self.window,
                self.gc,
                image.as_ptr(),
                0,
                0,
                0,
                0,
                width as c_uint,
                height as c_uint,
            );
        }
        Ok(())
    }

    fn connection_fd(&self) -> Option<RawFd> {
        self.connection.get_event_fd()
    }

    fn destroy_surface(&mut self) {
        let Some(display) = self.live_display() else {
            return;
        };
        info!("Destroying X11 window (ID: {}).", self.window);
        unsafe {
            if !self.gc.is_null() {
                xlib::XFreeGC(display, self.gc);
            }
            xlib::XDestroyWindow(display, self.window);
            xlib::XFlush(display);
        }
        self.gc = ptr::null_mut();
        self.window = 0;
    }

    fn close_connection(&mut self) {
        self.connection.close();
    }
}

impl Drop for X11Backend {
    fn drop(&mut self) {
        self.destroy_surface();
        self.close_connection();
    }
}
