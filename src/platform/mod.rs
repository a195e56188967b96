// src/platform/mod.rs

//! Operating-system and display-protocol plumbing.

pub mod backends;
pub mod os;
pub mod waker;
