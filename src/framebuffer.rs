// src/framebuffer.rs

//! Off-window pixel buffer painted by the view tree and lent to the window for one blit.

use crate::dirty::Rect;
use log::debug;

/// 32-bit pixel layouts, stored as little-endian `0xAARRGGBB` words.
///
/// This is the byte order of a depth-24/32 TrueColor ZPixmap, so both formats blit
/// without conversion; `Xrgb8888` leaves the top byte undefined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    #[default]
    Xrgb8888,
    Argb8888,
}

impl PixelFormat {
    pub const fn bytes_per_pixel(self) -> usize {
        4
    }
}

/// Contiguous pixel storage with explicit row stride.
#[derive(Debug, Clone, Default)]
pub struct FrameBuffer {
    width: u32,
    height: u32,
    stride: usize,
    format: PixelFormat,
    data: Vec<u8>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_format(width, height, PixelFormat::default())
    }

    pub fn with_format(width: u32, height: u32, format: PixelFormat) -> Self {
        let mut buffer = Self {
            format,
            ..Self::default()
        };
        buffer.resize(width, height);
        buffer
    }

    /// Resizes to `width` x `height` with a packed stride, reusing the allocation where possible.
    /// Contents are cleared whenever the size changes.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width == width && self.height == height && !self.data.is_empty() {
            return;
        }
        let stride = width as usize * self.format.bytes_per_pixel();
        let len = stride * height as usize;
        debug!(
            "FrameBuffer resize {}x{} -> {}x{} ({} bytes)",
            self.width, self.height, width, height, len
        );
        self.data.clear();
        self.data.resize(len, 0);
        self.width = width;
        self.height = height;
        self.stride = stride;
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.stride
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Writes one `0xAARRGGBB` pixel; out-of-bounds writes are ignored.
    pub fn put_pixel(&mut self, x: u32, y: u32, argb: u32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = y as usize * self.stride + x as usize * 4;
        self.data[offset..offset + 4].copy_from_slice(&argb.to_le_bytes());
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let offset = y as usize * self.stride + x as usize * 4;
        let bytes: [u8; 4] = self.data[offset..offset + 4].try_into().ok()?;
        Some(u32::from_le_bytes(bytes))
    }

    /// Fills `rect` clipped to the buffer.
    pub fn fill_rect(&mut self, rect: &Rect, argb: u32) {
        let Some(clip) = rect.intersection(&self.bounds()) else {
            return;
        };
        let pixel = argb.to_le_bytes();
        let (x0, y0) = (clip.x as usize, clip.y as usize);
        for row in y0..y0 + clip.height as usize {
            let start = row * self.stride + x0 * 4;
            let end = start + clip.width as usize * 4;
            for chunk in self.data[start..end].chunks_exact_mut(4) {
                chunk.copy_from_slice(&pixel);
            }
        }
    }

    pub fn clear(&mut self, argb: u32) {
        self.fill_rect(&self.bounds(), argb);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_size_the_buffer_from_width_height_and_stride() {
        let fb = FrameBuffer::new(800, 600);
        assert_eq!(fb.stride(), 800 * 4);
        assert_eq!(fb.as_bytes().len(), 800 * 4 * 600);
        assert_eq!(fb.format(), PixelFormat::Xrgb8888);
    }

    #[test]
    fn it_should_clip_fills_to_the_buffer() {
        let mut fb = FrameBuffer::new(10, 10);
        fb.fill_rect(&Rect::new(-5, 8, 8, 8), 0x00FF_0000);
        assert_eq!(fb.pixel(0, 9), Some(0x00FF_0000));
        assert_eq!(fb.pixel(2, 9), Some(0x00FF_0000));
        assert_eq!(fb.pixel(3, 9), Some(0));
        assert_eq!(fb.pixel(0, 7), Some(0));
        assert_eq!(fb.pixel(10, 0), None);
    }

    #[test]
    fn it_should_keep_its_format_and_alpha_across_resizes() {
        let mut fb = FrameBuffer::with_format(4, 4, PixelFormat::Argb8888);
        fb.resize(8, 2);
        assert_eq!(fb.format(), PixelFormat::Argb8888);
        assert_eq!(fb.stride(), 8 * 4);
        fb.put_pixel(7, 1, 0x80FF_0000);
        assert_eq!(fb.pixel(7, 1), Some(0x80FF_0000));
        assert_eq!(&fb.as_bytes()[fb.stride() + 28..], &[0x00, 0x00, 0xFF, 0x80]);
    }

    #[test]
    fn it_should_handle_zero_sized_buffers() {
        let mut fb = FrameBuffer::new(0, 0);
        assert!(fb.is_empty());
        fb.clear(0xFFFF_FFFF);
        fb.put_pixel(0, 0, 1);
        assert!(fb.as_bytes().is_empty());
    }
}
