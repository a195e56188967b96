// src/platform/backends/x11/connection.rs
#![allow(non_snake_case)] // Allow non-snake case for X11 types

use crate::error::WindowError;
use log::{debug, info, warn};
use std::ffi::CString;
use std::os::unix::io::RawFd;
use std::ptr;

// X11 library imports
use libc::{c_int, c_uint};
use x11::xlib;

/// Owns an X11 `Display` pointer and closes it exactly once.
#[derive(Debug)]
struct ManagedDisplay {
    ptr: *mut xlib::Display,
}

impl ManagedDisplay {
    /// Opens a connection to `name`, or to `$DISPLAY` when `name` is `None`.
    fn open(name: Option<&str>) -> Result<Self, WindowError> {
        let c_name = name
            .map(CString::new)
            .transpose()
            .map_err(|_| WindowError::DisplayUnavailable("display name contains NUL".into()))?;
        let name_ptr = c_name.as_ref().map_or(ptr::null(), |n| n.as_ptr());
        let display_ptr = unsafe { xlib::XOpenDisplay(name_ptr) };
        if display_ptr.is_null() {
            Err(WindowError::DisplayUnavailable(format!(
                "XOpenDisplay({}) failed. Check DISPLAY environment variable or X server status.",
                name.unwrap_or("$DISPLAY")
            )))
        } else {
            debug!("X display opened: {:p}", display_ptr);
            Ok(Self { ptr: display_ptr })
        }
    }

    #[inline]
    fn raw(&self) -> *mut xlib::Display {
        self.ptr
    }

    /// Closes the display if still open. Idempotent.
    fn close(&mut self) {
        if self.ptr.is_null() {
            return;
        }
        info!("Closing X11 display connection: {:p}", self.ptr);
        let status = unsafe { xlib::XCloseDisplay(self.ptr) };
        if status != 0 {
            warn!(
                "XCloseDisplay returned non-zero status: {}. Display may not have closed cleanly.",
                status
            );
        }
        self.ptr = ptr::null_mut();
    }
}

impl Drop for ManagedDisplay {
    fn drop(&mut self) {
        self.close();
    }
}

/// Connection to the X server plus the default screen resources windows are created on.
#[derive(Debug)]
pub struct Connection {
    managed_display: ManagedDisplay,
    screen: c_int,
    root: xlib::Window,
    visual: *mut xlib::Visual,
    depth: c_uint,
}

impl Connection {
    /// Opens the display and derives the default screen, root window, visual and depth.
    ///
    /// Fails with `DisplayUnavailable` when no server is reachable. If a later step fails
    /// the display is closed before returning.
    pub fn open(display_name: Option<&str>) -> Result<Self, WindowError> {
        info!("Establishing X11 server connection.");
        let managed_display = ManagedDisplay::open(display_name)?;
        let display = managed_display.raw();

        let screen = unsafe { xlib::XDefaultScreen(display) };
        let root = unsafe { xlib::XRootWindow(display, screen) };
        let visual = unsafe { xlib::XDefaultVisual(display, screen) };
        if visual.is_null() {
            return Err(WindowError::DisplayUnavailable(format!(
                "no default visual for screen {}",
                screen
            )));
        }
        let depth = unsafe { xlib::XDefaultDepth(display, screen) }.max(0) as c_uint;
        debug!(
            "Default screen {}: root {}, visual {:p}, depth {}",
            screen, root, visual, depth
        );

        info!("X11 server connection established successfully.");
        Ok(Connection {
            managed_display,
            screen,
            root,
            visual,
            depth,
        })
    }

    /// Closes the connection. Idempotent; later calls to `display()` return null.
    pub fn close(&mut self) {
        self.managed_display.close();
    }

    pub fn is_open(&self) -> bool {
        !self.managed_display.raw().is_null()
    }

    /// Raw display pointer; null once closed.
    #[inline]
    pub fn display(&self) -> *mut xlib::Display {
        self.managed_display.raw()
    }

    #[inline]
    pub fn screen(&self) -> c_int {
        self.screen
    }

    #[inline]
    pub fn root(&self) -> xlib::Window {
        self.root
    }

    #[inline]
    pub fn visual(&self) -> *mut xlib::Visual {
        self.visual
    }

    #[inline]
    pub fn depth(&self) -> c_uint {
        self.depth
    }

    /// File descriptor of the X connection, readable when events are pending.
    pub fn get_event_fd(&self) -> Option<RawFd> {
        if !self.is_open() {
            warn!("get_event_fd called on a closed X display.");
            None
        } else {
            // SAFETY: XConnectionNumber is safe to call with a valid, non-null display.
            Some(unsafe { xlib::XConnectionNumber(self.display()) })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_connection() -> Connection {
        Connection {
            managed_display: ManagedDisplay {
                ptr: ptr::null_mut(),
            },
            screen: 0,
            root: 0,
            visual: ptr::null_mut(),
            depth: 24,
        }
    }

    #[test]
    fn it_should_treat_close_on_a_closed_display_as_a_no_op() {
        let mut conn = closed_connection();
        conn.close();
        conn.close();
        assert!(!conn.is_open());
        assert!(conn.display().is_null());
    }

    #[test]
    fn it_should_report_no_event_fd_once_closed() {
        assert!(closed_connection().get_event_fd().is_none());
    }

    #[test]
    fn it_should_reject_display_names_with_interior_nul() {
        let err = ManagedDisplay::open(Some("bad\0name")).unwrap_err();
        assert!(matches!(err, WindowError::DisplayUnavailable(_)));
    }
}
