// src/lib.rs

//! Native window bridge: an Xlib window that decodes protocol events into `WindowEvent`s,
//! and a render loop that repaints invalidated regions into a software frame buffer and
//! blits it to the window.

pub mod config;
pub mod dirty;
pub mod error;
pub mod event;
pub mod framebuffer;
pub mod input;
pub mod keys;
pub mod platform;
pub mod renderer;
pub mod window;

pub use dirty::{DirtyRegion, DirtyRegionTracker, Rect};
pub use error::WindowError;
pub use event::{SubscriptionId, WindowEvent};
pub use framebuffer::{FrameBuffer, PixelFormat};
pub use keys::{KeySymbol, Modifiers, MouseButton};
pub use renderer::{FrameOutcome, FrameState, InvalidationHandle, Painter, RenderLoop};
pub use window::{Lifecycle, StopHandle, Window};
