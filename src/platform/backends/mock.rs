// src/platform/backends/mock.rs

use crate::error::WindowError;
use crate::input::{KeysymLookup, NO_SYMBOL};
use crate::platform::backends::{DisplayBackend, RawEvent, WindowHandle};
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::os::unix::io::RawFd;
use std::rc::Rc;

pub const MOCK_CLOSE_ATOM: u64 = 0x1234;

/// Protocol requests recorded by `MockBackend`, in issue order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    Map,
    Unmap,
    RequestResize { width: u32, height: u32 },
    SetTitle(String),
    Flush,
    PutImage {
        width: u32,
        height: u32,
        stride: usize,
        len: usize,
    },
    DestroySurface,
    CloseConnection,
}

/// Scripted backend: events are queued by the test, calls are recorded into a shared log
/// so they stay observable after the window that owns the backend is dropped.
pub struct MockBackend {
    events: VecDeque<RawEvent>,
    keymap: HashMap<(u8, i32), u64>,
    calls: Rc<RefCell<Vec<BackendCall>>>,
    fail_put_image: Option<WindowError>,
    on_put_image: Vec<RawEvent>,
    fd: RawFd,
    surface_alive: bool,
    connection_open: bool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            events: VecDeque::new(),
            keymap: HashMap::new(),
            calls: Rc::new(RefCell::new(Vec::new())),
            fail_put_image: None,
            on_put_image: Vec::new(),
            fd: 42,
            surface_alive: true,
            connection_open: true,
        }
    }

    pub fn push_event(&mut self, event: RawEvent) {
        self.events.push_back(event);
    }

    pub fn map_key(&mut self, keycode: u8, index: i32, keysym: u64) {
        self.keymap.insert((keycode, index), keysym);
    }

    /// Makes every later `put_image` fail with `err`.
    pub fn fail_put_image(&mut self, err: WindowError) {
        self.fail_put_image = Some(err);
    }

    /// Queues `event` when the next `put_image` runs, like a blit that reads the socket.
    pub fn queue_on_put_image(&mut self, event: RawEvent) {
        self.on_put_image.push(event);
    }

    /// Reports `fd` as the connection descriptor instead of the inert default.
    pub fn set_fd(&mut self, fd: RawFd) {
        self.fd = fd;
    }

    pub fn call_log(&self) -> Rc<RefCell<Vec<BackendCall>>> {
        Rc::clone(&self.calls)
    }

    fn record(&self, call: BackendCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl KeysymLookup for MockBackend {
    fn keycode_to_keysym(&self, keycode: u8, index: i32) -> u64 {
        self.keymap
            .get(&(keycode, index))
            .copied()
            .unwrap_or(NO_SYMBOL)
    }
}

impl DisplayBackend for MockBackend {
    fn handle(&self) -> WindowHandle {
        WindowHandle {
            connection: 1,
            surface: 2,
        }
    }

    fn close_atom(&self) -> u64 {
        MOCK_CLOSE_ATOM
    }

    fn pending(&mut self) -> usize {
        self.events.len()
    }

    fn next_event(&mut self) -> RawEvent {
        self.events
            .pop_front()
            .expect("MockBackend::next_event would block forever: event script exhausted")
    }

    fn map(&mut self) {
        self.record(BackendCall::Map);
    }

    fn unmap(&mut self) {
        self.record(BackendCall::Unmap);
    }

    fn request_resize(&mut self, width: u32, height: u32) {
        self.record(BackendCall::RequestResize { width, height });
    }

    fn set_title(&mut self, title: &str) -> Result<(), WindowError> {
        if title.contains('\0') {
            return Err(WindowError::InvalidTitle);
        }
        self.record(BackendCall::SetTitle(title.to_string()));
        Ok(())
    }

    fn flush(&mut self) {
        self.record(BackendCall::Flush);
    }

    fn put_image(
        &mut self,
        pixels: &[u8],
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<(), WindowError> {
        if let Some(err) = &self.fail_put_image {
            return Err(err.clone());
        }
        self.record(BackendCall::PutImage {
            width,
            height,
            stride,
            len: pixels.len(),
        });
        self.events.extend(self.on_put_image.drain(..));
        Ok(())
    }

    fn connection_fd(&self) -> Option<RawFd> {
        self.connection_open.then_some(self.fd)
    }

    fn destroy_surface(&mut self) {
        if self.surface_alive {
            self.surface_alive = false;
            self.record(BackendCall::DestroySurface);
        }
    }

    fn close_connection(&mut self) {
        if self.connection_open {
            self.connection_open = false;
            self.record(BackendCall::CloseConnection);
        }
    }
}
