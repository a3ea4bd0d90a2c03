//! Camera types and data structures.

use std::fmt;

/// Information about an available camera device.
#[derive(Debug, Clone)]
pub struct CameraInfo {
    /// Device index for selection
    pub index: u32,
    /// Human-readable device name
    pub name: String,
    /// Device description
    pub description: String,
}

impl fmt::Display for CameraInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.index, self.name, self.description)
    }
}

/// Frame geometry in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// VGA (640x480), the typical free-run resolution of the rigs we drive.
    pub const VGA: Resolution = Resolution {
        width: 640,
        height: 480,
    };

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Resolution {
    fn default() -> Self {
        Self::VGA
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Settings for one camera of the rig.
#[derive(Debug, Clone)]
pub struct CameraSettings {
    /// Camera device index
    pub index: u32,
    /// Requested capture resolution (the device may negotiate another one)
    pub resolution: Resolution,
    /// Target FPS (actual may vary)
    pub fps: u32,
    /// Exposure time in seconds, applied at open
    pub exposure_seconds: f64,
    /// Downscale factor applied to every captured frame (0 < scale <= 1)
    pub scale: f64,
}

impl CameraSettings {
    /// Exposure time converted to microseconds, the unit camera drivers speak.
    pub fn exposure_micros(&self) -> i64 {
        (self.exposure_seconds * 1_000_000.0) as i64
    }
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            index: 0,
            resolution: Resolution::default(),
            fps: 30,
            exposure_seconds: 0.06,
            scale: 0.4,
        }
    }
}

/// What a camera reported at open time.
#[derive(Debug, Clone)]
pub struct CameraDescriptor {
    /// Device index this descriptor belongs to
    pub index: u32,
    /// Negotiated frame geometry
    pub resolution: Resolution,
    /// Driver-reported frame rate in Hz
    pub reported_fps: u32,
    /// Exposure value the driver reported before we overrode it,
    /// in driver units (microseconds on most backends). `None` if the
    /// device does not expose an exposure control.
    pub exposure_before: Option<f64>,
}

/// Errors that can occur during camera operations.
#[derive(Debug)]
pub enum CameraError {
    /// Failed to query camera devices
    QueryFailed(String),
    /// Failed to open the camera at the given index
    OpenFailed { index: u32, message: String },
    /// Failed to start the video stream
    StreamFailed { index: u32, message: String },
    /// Failed to pull a frame from an open stream
    FrameFailed { index: u32, message: String },
    /// A captured frame could not be decoded to monochrome
    DecodeFailed { index: u32, message: String },
    /// The camera worker thread went away mid-run
    Disconnected { index: u32 },
    /// A rig was opened with no cameras in it
    EmptyRig,
    /// A camera's geometry does not match camera 0's
    GeometryMismatch {
        index: u32,
        expected: Resolution,
        actual: Resolution,
    },
}

impl fmt::Display for CameraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CameraError::QueryFailed(msg) => write!(f, "Failed to query cameras: {}", msg),
            CameraError::OpenFailed { index, message } => {
                write!(f, "Cannot open camera {}: {}", index, message)
            }
            CameraError::StreamFailed { index, message } => {
                write!(f, "Failed to start stream on camera {}: {}", index, message)
            }
            CameraError::FrameFailed { index, message } => {
                write!(f, "Failed to read frame from camera {}: {}", index, message)
            }
            CameraError::DecodeFailed { index, message } => {
                write!(f, "Failed to decode frame from camera {}: {}", index, message)
            }
            CameraError::Disconnected { index } => {
                write!(f, "Camera {} worker stopped unexpectedly", index)
            }
            CameraError::EmptyRig => {
                write!(f, "At least one camera is required")
            }
            CameraError::GeometryMismatch {
                index,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "Camera {} reports {} but camera 0 reports {}; all cameras must share one frame geometry",
                    index, actual, expected
                )
            }
        }
    }
}

impl std::error::Error for CameraError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_info_display() {
        let info = CameraInfo {
            index: 0,
            name: "Test Camera".to_string(),
            description: "Built-in".to_string(),
        };
        assert_eq!(format!("{}", info), "[0] Test Camera (Built-in)");
    }

    #[test]
    fn test_resolution_default_is_vga() {
        let res = Resolution::default();
        assert_eq!(res, Resolution::VGA);
        assert_eq!(format!("{}", res), "640x480");
    }

    #[test]
    fn test_camera_settings_default() {
        let settings = CameraSettings::default();
        assert_eq!(settings.index, 0);
        assert_eq!(settings.resolution.width, 640);
        assert_eq!(settings.resolution.height, 480);
        assert_eq!(settings.fps, 30);
        assert!((settings.exposure_seconds - 0.06).abs() < 1e-9);
        assert!((settings.scale - 0.4).abs() < 1e-9);
    }

    #[test]
    fn test_exposure_micros_conversion() {
        let settings = CameraSettings {
            exposure_seconds: 0.06,
            ..Default::default()
        };
        assert_eq!(settings.exposure_micros(), 60_000);
    }

    #[test]
    fn test_camera_error_display() {
        assert_eq!(
            format!("{}", CameraError::QueryFailed("test".to_string())),
            "Failed to query cameras: test"
        );
        assert_eq!(
            format!(
                "{}",
                CameraError::OpenFailed {
                    index: 1,
                    message: "busy".to_string()
                }
            ),
            "Cannot open camera 1: busy"
        );
        assert!(format!("{}", CameraError::Disconnected { index: 3 }).contains("3"));
    }

    #[test]
    fn test_geometry_mismatch_names_index_and_sizes() {
        let err = CameraError::GeometryMismatch {
            index: 1,
            expected: Resolution::new(640, 480),
            actual: Resolution::new(1280, 720),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Camera 1"));
        assert!(msg.contains("640x480"));
        assert!(msg.contains("1280x720"));
    }
}
