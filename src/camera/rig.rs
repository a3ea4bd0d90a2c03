//! Multi-camera rig: opens N cameras and drives them in lockstep.

use super::types::{CameraDescriptor, CameraError, CameraSettings, Resolution};
use super::worker::{CameraWorker, Capture};

/// A fixed set of cameras read in lockstep.
///
/// Opening the rig spawns one worker thread per device, waits for every
/// camera to come up, and validates that all of them negotiated the same
/// frame geometry. After that, [`CameraRig::grab_all`] is the per-iteration
/// fan-out/fan-in barrier: every camera captures in parallel and the call
/// returns only once all frames are in.
pub struct CameraRig {
    workers: Vec<CameraWorker>,
    descriptors: Vec<CameraDescriptor>,
    resolution: Resolution,
}

impl CameraRig {
    /// Open `count` cameras at indices `0..count`.
    ///
    /// Fails fast: the first camera that cannot be opened aborts the whole
    /// rig, and the error names the failing device index. A camera whose
    /// geometry differs from camera 0's is rejected the same way.
    pub fn open(count: usize, exposure_seconds: f64, scale: f64) -> Result<Self, CameraError> {
        // Spawn all workers first so the devices open in parallel.
        let mut workers: Vec<CameraWorker> = (0..count)
            .map(|i| {
                CameraWorker::spawn(CameraSettings {
                    index: i as u32,
                    exposure_seconds,
                    scale,
                    ..Default::default()
                })
            })
            .collect();

        let mut descriptors = Vec::with_capacity(count);
        for worker in &mut workers {
            descriptors.push(worker.wait_ready()?);
        }

        let resolution = validate_geometry(&descriptors)?;

        for d in &descriptors {
            match d.exposure_before {
                Some(before) => log::info!(
                    "camera {}: {} @ {} fps, exposure {} -> configured value",
                    d.index,
                    d.resolution,
                    d.reported_fps,
                    before
                ),
                None => log::info!(
                    "camera {}: {} @ {} fps, no exposure control",
                    d.index,
                    d.resolution,
                    d.reported_fps
                ),
            }
        }

        Ok(Self {
            workers,
            descriptors,
            resolution,
        })
    }

    /// Number of cameras in the rig.
    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    /// The frame geometry shared by every camera.
    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    /// Open-time descriptors, in device-index order.
    pub fn descriptors(&self) -> &[CameraDescriptor] {
        &self.descriptors
    }

    /// Capture one frame from every camera in parallel.
    ///
    /// Fan-out: a grab command goes to every worker before any result is
    /// awaited. Fan-in: results are collected in index order, so the
    /// returned vector lines up with the rig's slot assignment. Any worker
    /// failure ends the grab with that camera's error.
    pub fn grab_all(&mut self) -> Result<Vec<Capture>, CameraError> {
        for worker in &self.workers {
            worker.request_grab()?;
        }

        let mut captures = Vec::with_capacity(self.workers.len());
        for worker in &self.workers {
            captures.push(worker.recv_capture()?);
        }
        Ok(captures)
    }

    /// Stop every worker and wait for the threads to exit.
    pub fn shutdown(mut self) {
        for worker in &mut self.workers {
            worker.stop();
        }
    }
}

/// Check that every camera negotiated the same geometry as camera 0.
/// An empty descriptor list is rejected rather than defaulted: a rig of
/// zero cameras has no geometry and would produce a zero-slot composite.
pub fn validate_geometry(descriptors: &[CameraDescriptor]) -> Result<Resolution, CameraError> {
    let first = match descriptors.first() {
        Some(d) => d.resolution,
        None => return Err(CameraError::EmptyRig),
    };

    for d in descriptors.iter().skip(1) {
        if d.resolution != first {
            return Err(CameraError::GeometryMismatch {
                index: d.index,
                expected: first,
                actual: d.resolution,
            });
        }
    }
    Ok(first)
}
