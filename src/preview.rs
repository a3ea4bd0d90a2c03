//! On-screen preview surface.
//!
//! The composite image is streamed to an `mpv` window as raw monochrome
//! video over stdin. mpv owns the window; we own the pipe. The window sits
//! at a fixed screen position and is sized by the composite geometry, both
//! decided once at startup.

use image::GrayImage;
use std::io::Write;
use std::process::{Child, ChildStdin, Command, Stdio};

/// Errors that can occur while presenting the preview.
#[derive(Debug, thiserror::Error)]
pub enum PreviewError {
    #[error("mpv not found. Please install it with:\n\n    brew install mpv\n")]
    MpvNotFound,
    #[error("failed to spawn mpv: {0}")]
    SpawnFailed(std::io::Error),
    #[error("preview window closed: {0}")]
    Disconnected(std::io::Error),
}

/// A live preview window backed by an mpv process.
pub struct PreviewWindow {
    child: Child,
    stdin: Option<ChildStdin>,
    frame_len: usize,
}

impl PreviewWindow {
    /// Open the preview window for frames of `width` x `height` at the given
    /// screen position, expecting roughly `fps` frames per second.
    pub fn open(
        width: u32,
        height: u32,
        fps: u32,
        position: (u32, u32),
        title: &str,
    ) -> Result<Self, PreviewError> {
        let mut child = Command::new("mpv")
            .args([
                "--no-cache",
                "--untimed",
                "--no-terminal",
                "--force-seekable=no",
            ])
            .arg(format!("--title={}", title))
            .arg(format!("--geometry=+{}+{}", position.0, position.1))
            .arg("--demuxer=rawvideo")
            .arg(format!("--demuxer-rawvideo-w={}", width))
            .arg(format!("--demuxer-rawvideo-h={}", height))
            .arg("--demuxer-rawvideo-mp-format=y8")
            .arg(format!("--demuxer-rawvideo-fps={}", fps.max(1)))
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PreviewError::MpvNotFound
                } else {
                    PreviewError::SpawnFailed(e)
                }
            })?;

        let stdin = child.stdin.take();
        Ok(Self {
            child,
            stdin,
            frame_len: width as usize * height as usize,
        })
    }

    /// Push one composite frame to the window.
    pub fn present(&mut self, frame: &GrayImage) -> Result<(), PreviewError> {
        debug_assert_eq!(frame.as_raw().len(), self.frame_len);

        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| PreviewError::Disconnected(std::io::Error::other("stdin closed")))?;
        stdin
            .write_all(frame.as_raw())
            .map_err(PreviewError::Disconnected)
    }

    /// Close the window and reap the mpv process.
    pub fn shutdown(&mut self) {
        // Dropping stdin sends EOF; kill in case mpv lingers on it.
        self.stdin.take();
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for PreviewWindow {
    fn drop(&mut self) {
        self.shutdown();
    }
}
