// src/platform/waker.rs
//! EventLoopWaker - Cross-thread signaling to wake the render loop.
//!
//! Threads that invalidate regions of a window call `wake()` so the loop leaves its
//! blocking poll and schedules a paint.

use anyhow::{Context, Result};
use log::{debug, trace, warn};
use std::io;
use std::os::unix::io::RawFd;

/// Wakes a blocked event loop from any thread.
pub trait EventLoopWaker: Send + Sync {
    fn wake(&self) -> Result<()>;
}

/// `eventfd`-backed waker. The loop polls `fd()` for readability and calls `drain()`.
#[derive(Debug)]
pub struct EventFdWaker {
    fd: RawFd,
}

impl EventFdWaker {
    pub fn new() -> Result<Self> {
        let fd = unsafe { libc::eventfd(0, libc::EFD_NONBLOCK | libc::EFD_CLOEXEC) };
        if fd == -1 {
            return Err(io::Error::last_os_error()).context("Failed to create eventfd");
        }
        debug!("EventFdWaker created with fd: {}", fd);
        Ok(Self { fd })
    }

    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Resets the counter so the descriptor stops polling readable.
    pub fn drain(&self) {
        let mut value: u64 = 0;
        let n = unsafe {
            libc::read(
                self.fd,
                &mut value as *mut u64 as *mut libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if n > 0 {
            trace!("EventFdWaker drained {} wake(s)", value);
        }
    }
}

impl EventLoopWaker for EventFdWaker {
    fn wake(&self) -> Result<()> {
        let one: u64 = 1;
        let n = unsafe {
            libc::write(
                self.fd,
                &one as *const u64 as *const libc::c_void,
                std::mem::size_of::<u64>(),
            )
        };
        if n == -1 {
            let err = io::Error::last_os_error();
            // Counter saturated: the loop has a wake pending already.
            if err.kind() == io::ErrorKind::WouldBlock {
                return Ok(());
            }
            return Err(err).context("Failed to write to eventfd");
        }
        Ok(())
    }
}

impl Drop for EventFdWaker {
    fn drop(&mut self) {
        if unsafe { libc::close(self.fd) } == -1 {
            warn!(
                "Failed to close eventfd {}: {}",
                self.fd,
                io::Error::last_os_error()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn it_should_accept_wakes_from_other_threads() {
        let waker = Arc::new(EventFdWaker::new().unwrap());
        let remote = Arc::clone(&waker);
        thread::spawn(move || remote.wake().unwrap())
            .join()
            .unwrap();
        waker.wake().unwrap();
        waker.drain();
    }
}
