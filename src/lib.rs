//! twincam library crate.
//!
//! This module exposes the internal components for integration testing.

pub mod camera;
pub mod compositor;
pub mod config;
pub mod input;
pub mod preview;
pub mod stats;
