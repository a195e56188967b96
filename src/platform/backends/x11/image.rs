// src/platform/backends/x11/image.rs

//! Scratch `XImage` construction for blits.
//!
//! The caller's pixels are copied into a Rust-owned scratch buffer, wrapped in an
//! `XImage`, and both are released when the guard drops, on every exit path.

use super::connection::Connection;
use crate::error::WindowError;
use log::trace;
use std::ptr;

use libc::{c_char, c_int, c_uint};
use x11::xlib;

const BYTES_PER_PIXEL: usize = 4;
const BITMAP_PAD: c_int = 32;

/// Copies `rows` rows of `row_bytes` from `src` (rows `src_stride` apart) into the packed `dst`.
///
/// Every row is range-checked against `src`; nothing is read past its end.
pub fn copy_rows(
    src: &[u8],
    src_stride: usize,
    dst: &mut [u8],
    row_bytes: usize,
    rows: usize,
) -> Result<(), WindowError> {
    if row_bytes == 0 || rows == 0 {
        return Ok(());
    }
    let too_small = || WindowError::BufferTooSmall {
        len: src.len(),
        width: (row_bytes / BYTES_PER_PIXEL) as u32,
        height: rows as u32,
        stride: src_stride,
    };
    if dst.len() < row_bytes * rows {
        return Err(too_small());
    }
    for (row, dst_row) in dst.chunks_exact_mut(row_bytes).take(rows).enumerate() {
        let start = row.checked_mul(src_stride).ok_or_else(too_small)?;
        let end = start.checked_add(row_bytes).ok_or_else(too_small)?;
        let src_row = src.get(start..end).ok_or_else(too_small)?;
        dst_row.copy_from_slice(src_row);
    }
    Ok(())
}

/// A native ZPixmap image backed by a scratch copy of the caller's pixels.
pub struct ScratchImage {
    image: *mut xlib::XImage,
    // Referenced by `image.data`; must outlive it.
    _scratch: Vec<u8>,
}

impl ScratchImage {
    pub fn create(
        connection: &Connection,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<Self, WindowError> {
        let row_bytes = width as usize * BYTES_PER_PIXEL;
        let bytes = row_bytes
            .checked_mul(height as usize)
            .ok_or(WindowError::BlitAllocationFailed { bytes: usize::MAX })?;

        let mut scratch = Vec::new();
        scratch
            .try_reserve_exact(bytes)
            .map_err(|_| WindowError::BlitAllocationFailed { bytes })?;
        scratch.resize(bytes, 0);
        copy_rows(pixels, stride, &mut scratch, row_bytes, height as usize)?;

        // SAFETY: `scratch` holds `height` packed rows of `row_bytes`, matching the
        // bytes_per_line we pass. Ownership of the memory stays with `scratch`.
        let image = unsafe {
            xlib::XCreateImage(
                connection.display(),
                connection.visual(),
                connection.depth(),
                xlib::ZPixmap,
                0,
                scratch.as_mut_ptr() as *mut c_char,
                width as c_uint,
                height as c_uint,
                BITMAP_PAD,
                row_bytes as c_int,
            )
        };
        if image.is_null() {
            return Err(WindowError::BlitAllocationFailed { bytes });
        }
        let guard = Self {
            image,
            _scratch: scratch,
        };

        let bits_per_pixel = unsafe { (*image).bits_per_pixel };
        if bits_per_pixel != 32 {
            return Err(WindowError::UnsupportedVisual {
                depth: connection.depth(),
                bits_per_pixel: bits_per_pixel.max(0) as u32,
            });
        }
        trace!("Scratch XImage {}x{} ({} bytes)", width, height, bytes);
        Ok(guard)
    }

    #[inline]
    pub fn as_ptr(&self) -> *mut xlib::XImage {
        self.image
    }
}

impl Drop for ScratchImage {
    fn drop(&mut self) {
        // SAFETY: `image` came from XCreateImage and is destroyed once. Detach the data first
        // so XDestroyImage doesn't free memory owned by `_scratch`.
        unsafe {
            (*self.image).data = ptr::null_mut();
            xlib::XDestroyImage(self.image);
        }
    }
}
