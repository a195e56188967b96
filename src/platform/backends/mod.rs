// src/platform/backends/mod.rs

//! Defines the `DisplayBackend` trait, the protocol binding that `Window` drives, and
//! `RawEvent`, the protocol-shaped event record it pulls off the connection.
//!
//! A backend is a thin declarative mapping: it issues protocol requests and copies native
//! event fields into `RawEvent` without interpreting them. Decoding (keysyms, button tables,
//! expose coalescing, resize suppression, the close handshake) lives in `Window`.

use crate::error::WindowError;
use crate::input::KeysymLookup;
use std::os::unix::io::RawFd;

#[cfg(test)]
pub mod mock;
pub mod x11;

/// Opaque identity of a window: (connection, surface). Valid until disposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowHandle {
    pub connection: u64,
    pub surface: u64,
}

/// A native event with its fields copied out of the protocol's record layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawEvent {
    KeyPress {
        keycode: u32,
        state: u32,
    },
    KeyRelease {
        keycode: u32,
        state: u32,
    },
    ButtonPress {
        button: u32,
        x: i32,
        y: i32,
        state: u32,
    },
    ButtonRelease {
        button: u32,
        x: i32,
        y: i32,
        state: u32,
    },
    Motion {
        x: i32,
        y: i32,
        state: u32,
    },
    Enter {
        x: i32,
        y: i32,
    },
    Leave {
        x: i32,
        y: i32,
    },
    /// `count` is the number of expose events still queued behind this one.
    Expose {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        count: i32,
    },
    /// Structure change; `width`/`height` are the server-applied size.
    Configure {
        width: i32,
        height: i32,
    },
    ClientMessage {
        message_type: u64,
        data0: u64,
    },
    FocusIn,
    FocusOut,
    /// Anything the window does not register for or care about.
    Other {
        kind: i32,
    },
}

/// The protocol operations a `Window` needs. All calls must come from the thread that
/// opened the connection.
///
/// Implementations own the connection and surface; `destroy_surface` and
/// `close_connection` must be idempotent.
pub trait DisplayBackend: KeysymLookup {
    fn handle(&self) -> WindowHandle;

    /// Atom compared against the first data word of every client message.
    fn close_atom(&self) -> u64;

    /// Number of events that can be read without blocking.
    fn pending(&mut self) -> usize;

    /// Blocks until an event is available.
    fn next_event(&mut self) -> RawEvent;

    fn map(&mut self);
    fn unmap(&mut self);
    fn request_resize(&mut self, width: u32, height: u32);
    fn set_title(&mut self, title: &str) -> Result<(), WindowError>;
    fn flush(&mut self);

    /// Copies `pixels` into a native image and composites it at the surface origin.
    ///
    /// The caller has already checked that `pixels` holds `height` rows of `stride` bytes.
    /// No reference to `pixels` outlives the call.
    fn put_image(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<(), WindowError>;

    /// Readiness descriptor of the connection, `None` once closed.
    fn connection_fd(&self) -> Option<RawFd>;

    fn destroy_surface(&mut self);
    fn close_connection(&mut self);
}
