// src/platform/os/epoll.rs

//! Readiness multiplexing over raw `epoll`.
//!
//! The render loop registers the display connection and its waker here and sleeps in
//! `wait` until either becomes readable or the frame timer runs out.

use anyhow::{Context, Result};
use bitflags::bitflags;
use log::{debug, trace, warn};
use std::io;
use std::os::unix::io::RawFd;

const MAX_READY: usize = 8;

bitflags! {
    /// Readiness conditions, mirroring the kernel's `EPOLL*` bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Interest: u32 {
        const READABLE = libc::EPOLLIN as u32;
        const ERROR = libc::EPOLLERR as u32;
        const HANGUP = libc::EPOLLHUP as u32;
    }
}

/// A descriptor reported ready by `EventMonitor::wait`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ready {
    pub token: u64,
    pub flags: Interest,
}

#[derive(Debug)]
pub struct EventMonitor {
    epoll_fd: RawFd,
    buffer: [libc::epoll_event; MAX_READY],
}

impl EventMonitor {
    pub fn new() -> Result<Self> {
        let epoll_fd = unsafe { libc::epoll_create1(libc::EPOLL_CLOEXEC) };
        if epoll_fd == -1 {
            return Err(io::Error::last_os_error())
                .context("Failed to create epoll instance (epoll_create1)");
        }
        debug!("EventMonitor created with epoll_fd: {}", epoll_fd);
        Ok(Self {
            epoll_fd,
            buffer: [libc::epoll_event { events: 0, u64: 0 }; MAX_READY],
        })
    }

    fn ctl(&self, op: libc::c_int, fd: RawFd, token: u64, interest: Interest) -> io::Result<()> {
        let mut event = libc::epoll_event {
            events: interest.bits(),
            u64: token,
        };
        if unsafe { libc::epoll_ctl(self.epoll_fd, op, fd, &mut event) } == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Watches `fd`; readiness is reported with `token`.
    pub fn add(&self, fd: RawFd, token: u64, interest: Interest) -> Result<()> {
        self.ctl(libc::EPOLL_CTL_ADD, fd, token, interest)
            .with_context(|| format!("Failed to add fd {} to epoll (token: {})", fd, token))?;
        trace!(
            "Added fd {} to epoll_fd {} with token {} and interest {:?}",
            fd,
            self.epoll_fd,
            token,
            interest
        );
        Ok(())
    }

    pub fn delete(&self, fd: RawFd) -> Result<()> {
        self.ctl(libc::EPOLL_CTL_DEL, fd, 0, Interest::empty())
            .with_context(|| format!("Failed to delete fd {} from epoll", fd))?;
        trace!("Deleted fd {} from epoll_fd {}", fd, self.epoll_fd);
        Ok(())
    }

    /// Blocks for up to `timeout_ms` (negative waits forever). An interrupted wait
    /// reports nothing ready.
    pub fn wait(&mut self, timeout_ms: i32) -> Result<Vec<Ready>> {
        let count = unsafe {
            libc::epoll_wait(
                self.epoll_fd,
                self.buffer.as_mut_ptr(),
                MAX_READY as libc::c_int,
                timeout_ms,
            )
        };
        if count == -1 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                trace!("EventMonitor: epoll_wait interrupted (EINTR)");
                return Ok(Vec::new());
            }
            return Err(err).context("epoll_wait failed in EventMonitor");
        }
        Ok(self.buffer[..count as usize]
            .iter()
            .map(|event| Ready {
                token: event.u64,
                flags: Interest::from_bits_truncate(event.events),
            })
            .collect())
    }
}

impl Drop for EventMonitor {
    fn drop(&mut self) {
        if unsafe { libc::close(self.epoll_fd) } == -1 {
            warn!(
                "Failed to close epoll_fd {} in EventMonitor::drop: {}",
                self.epoll_fd,
                io::Error::last_os_error()
            );
        } else {
            debug!("Closed epoll_fd {} in EventMonitor::drop", self.epoll_fd);
        }
    }
}
