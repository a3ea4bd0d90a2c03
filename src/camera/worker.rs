//! Per-camera worker thread.
//!
//! A `nokhwa::Camera` is not `Send`, so each camera is owned by a dedicated
//! thread for its whole lifetime. The main loop drives the worker over a
//! command channel: one `Grab` produces exactly one resized monochrome frame.

use image::imageops::{self, FilterType};
use image::GrayImage;
use nokhwa::pixel_format::LumaFormat;
use nokhwa::utils::{
    CameraFormat, CameraIndex, ControlValueSetter, FrameFormat, KnownCameraControl,
    RequestedFormat, RequestedFormatType,
};
use nokhwa::Camera;
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use super::types::{CameraDescriptor, CameraError, CameraSettings, Resolution};
use crate::compositor::scaled_dims;

/// Commands sent to a camera worker thread.
enum WorkerCommand {
    /// Pull one frame, resize it, and reply with a [`Capture`].
    Grab,
    /// Stop the stream and exit the thread.
    Stop,
}

/// One frame's worth of output from a worker.
#[derive(Debug)]
pub struct Capture {
    /// Downscaled monochrome frame
    pub image: GrayImage,
    /// Driver-reported frame rate at grab time, in Hz
    pub device_fps: u32,
}

/// Handle to a camera worker thread.
pub struct CameraWorker {
    index: u32,
    cmd_tx: Sender<WorkerCommand>,
    capture_rx: Receiver<Result<Capture, CameraError>>,
    ready_rx: Option<Receiver<Result<CameraDescriptor, CameraError>>>,
    handle: Option<JoinHandle<()>>,
}

impl CameraWorker {
    /// Spawn the worker thread. The camera is opened inside the thread;
    /// call [`CameraWorker::wait_ready`] to learn whether the open succeeded.
    pub fn spawn(settings: CameraSettings) -> Self {
        let index = settings.index;
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (capture_tx, capture_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let handle = thread::spawn(move || run_worker(settings, cmd_rx, capture_tx, ready_tx));

        Self {
            index,
            cmd_tx,
            capture_rx,
            ready_rx: Some(ready_rx),
            handle: Some(handle),
        }
    }

    /// Block until the worker has opened (or failed to open) its camera.
    pub fn wait_ready(&mut self) -> Result<CameraDescriptor, CameraError> {
        let ready_rx = self
            .ready_rx
            .take()
            .ok_or(CameraError::Disconnected { index: self.index })?;
        ready_rx
            .recv()
            .map_err(|_| CameraError::Disconnected { index: self.index })?
    }

    /// Ask the worker to pull and resize one frame.
    pub fn request_grab(&self) -> Result<(), CameraError> {
        self.cmd_tx
            .send(WorkerCommand::Grab)
            .map_err(|_| CameraError::Disconnected { index: self.index })
    }

    /// Block until the frame requested by [`CameraWorker::request_grab`] arrives.
    pub fn recv_capture(&self) -> Result<Capture, CameraError> {
        self.capture_rx
            .recv()
            .map_err(|_| CameraError::Disconnected { index: self.index })?
    }

    /// Ask the worker to stop and wait for the thread to finish.
    pub fn stop(&mut self) {
        let _ = self.cmd_tx.send(WorkerCommand::Stop);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for CameraWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Worker thread body: open, report readiness, serve grab commands, clean up.
fn run_worker(
    settings: CameraSettings,
    cmd_rx: Receiver<WorkerCommand>,
    capture_tx: Sender<Result<Capture, CameraError>>,
    ready_tx: Sender<Result<CameraDescriptor, CameraError>>,
) {
    let index = settings.index;

    let mut camera = match open_camera_with_fallback(&settings) {
        Ok(cam) => cam,
        Err(e) => {
            let _ = ready_tx.send(Err(e));
            return;
        }
    };

    if let Err(e) = camera.open_stream() {
        let _ = ready_tx.send(Err(CameraError::StreamFailed {
            index,
            message: e.to_string(),
        }));
        return;
    }

    // Read the factory exposure before overriding it; the prior value is
    // reported for diagnostics and never restored.
    let exposure_before = read_exposure(&camera);
    apply_exposure(&mut camera, index, settings.exposure_micros());

    let res = camera.resolution();
    let descriptor = CameraDescriptor {
        index,
        resolution: Resolution::new(res.width(), res.height()),
        reported_fps: camera.frame_rate(),
        exposure_before,
    };
    if ready_tx.send(Ok(descriptor)).is_err() {
        let _ = camera.stop_stream();
        return;
    }

    while let Ok(cmd) = cmd_rx.recv() {
        match cmd {
            WorkerCommand::Grab => {
                let result = grab_one(&mut camera, index, settings.scale);
                if capture_tx.send(result).is_err() {
                    break;
                }
            }
            WorkerCommand::Stop => break,
        }
    }

    let _ = camera.stop_stream();
}

/// Pull one frame, decode to monochrome, and downscale it.
fn grab_one(camera: &mut Camera, index: u32, scale: f64) -> Result<Capture, CameraError> {
    let buffer = camera.frame().map_err(|e| CameraError::FrameFailed {
        index,
        message: e.to_string(),
    })?;

    let gray = buffer
        .decode_image::<LumaFormat>()
        .map_err(|e| CameraError::DecodeFailed {
            index,
            message: e.to_string(),
        })?;

    let (target_w, target_h) = scaled_dims(
        Resolution::new(gray.width(), gray.height()),
        scale,
    );
    let image = imageops::resize(&gray, target_w, target_h, FilterType::Triangle);

    Ok(Capture {
        image,
        device_fps: camera.frame_rate(),
    })
}

/// Try to open a camera with multiple format fallback strategies.
fn open_camera_with_fallback(settings: &CameraSettings) -> Result<Camera, CameraError> {
    let index = CameraIndex::Index(settings.index);
    let resolution = nokhwa::utils::Resolution::new(
        settings.resolution.width,
        settings.resolution.height,
    );

    // Strategies in order of preference:
    // 1. Native monochrome (industrial sensors deliver GRAY directly)
    // 2. MJPEG (widely supported, decoded to luma)
    // 3. Highest resolution available (let the camera pick the format)
    let format_attempts: Vec<RequestedFormat> = vec![
        RequestedFormat::new::<LumaFormat>(RequestedFormatType::Closest(CameraFormat::new(
            resolution,
            FrameFormat::GRAY,
            settings.fps,
        ))),
        RequestedFormat::new::<LumaFormat>(RequestedFormatType::Closest(CameraFormat::new(
            resolution,
            FrameFormat::MJPEG,
            settings.fps,
        ))),
        RequestedFormat::new::<LumaFormat>(RequestedFormatType::AbsoluteHighestResolution),
    ];

    let mut last_error = None;

    for requested in format_attempts {
        match Camera::new(index.clone(), requested) {
            Ok(cam) => return Ok(cam),
            Err(e) => {
                last_error = Some(e);
                continue;
            }
        }
    }

    Err(CameraError::OpenFailed {
        index: settings.index,
        message: last_error
            .map(|e| e.to_string())
            .unwrap_or_else(|| "no capture format accepted".to_string()),
    })
}

/// Read the current exposure value, if the device exposes the control.
fn read_exposure(camera: &Camera) -> Option<f64> {
    let control = camera.camera_control(KnownCameraControl::Exposure).ok()?;
    match control.description().value() {
        ControlValueSetter::Integer(v) => Some(v as f64),
        ControlValueSetter::Float(v) => Some(v),
        _ => None,
    }
}

/// Set the exposure time in microseconds. Devices without an exposure
/// control keep their default; the preview still works, so this only warns.
fn apply_exposure(camera: &mut Camera, index: u32, micros: i64) {
    if let Err(e) = camera.set_camera_control(
        KnownCameraControl::Exposure,
        ControlValueSetter::Integer(micros),
    ) {
        log::warn!(
            "camera {}: could not set exposure to {}us: {}",
            index,
            micros,
            e
        );
    }
}
