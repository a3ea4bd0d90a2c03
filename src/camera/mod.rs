//! Camera capture module.
//!
//! This module provides the capture side of the preview loop:
//! - Device enumeration via [`list_devices`]
//! - Lockstep multi-camera capture via [`CameraRig`]

mod device;
mod rig;
mod types;
mod worker;

pub use device::list_devices;
pub use rig::{validate_geometry, CameraRig};
pub use types::{CameraDescriptor, CameraError, CameraInfo, CameraSettings, Resolution};
pub use worker::Capture;
