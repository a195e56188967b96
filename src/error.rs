// src/error.rs

//! Error taxonomy for the window/blit substrate.
//!
//! Construction failures (`DisplayUnavailable`, `SurfaceCreationFailed`) are fatal to
//! `Window::open`. Everything else is per-call: the render loop drops the frame, logs, and
//! goes back to idle. Unknown key or button codes are never errors; they normalize to the
//! `KeySymbol::Unknown` / `MouseButton::None` sentinels.

/// Errors surfaced by `Window` and its protocol backends.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum WindowError {
    /// No display server could be reached.
    #[error("display server unavailable: {0}")]
    DisplayUnavailable(String),

    /// The server handed back a null window handle.
    #[error("failed to create window surface")]
    SurfaceCreationFailed,

    /// Scratch memory or the native image for a blit could not be allocated.
    #[error("failed to allocate blit scratch image ({bytes} bytes)")]
    BlitAllocationFailed { bytes: usize },

    /// The default visual cannot take 32-bit pixels directly.
    #[error("unsupported visual: depth {depth}, {bits_per_pixel} bits per pixel")]
    UnsupportedVisual { depth: u32, bits_per_pixel: u32 },

    /// The caller's buffer ends before the last row described by width/height/stride.
    #[error("pixel buffer of {len} bytes is too small for {width}x{height} at stride {stride}")]
    BufferTooSmall {
        len: usize,
        width: u32,
        height: u32,
        stride: usize,
    },

    /// The stride is shorter than one row of pixels.
    #[error("stride {stride} is shorter than a {width} pixel row")]
    InvalidStride { stride: usize, width: u32 },

    /// Titles are passed to the server as C strings.
    #[error("window title contains an interior NUL byte")]
    InvalidTitle,

    /// The window has been closed or disposed; no protocol calls are issued.
    #[error("window is closed")]
    Closed,
}
