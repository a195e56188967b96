// src/platform/os/mod.rs

pub mod epoll;
