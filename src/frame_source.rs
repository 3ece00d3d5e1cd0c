use crate::device_camera::interface::DeviceCamera;
use image::{imageops, RgbImage};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
#[error("frame capture failed: {0}")]
pub struct CaptureError(pub String);

/// A single mirrored snapshot of the camera stream.
#[derive(Clone)]
pub struct Frame {
    pub image: RgbImage,
    pub captured_at: Instant,
}

impl Frame {
    /// Mirrors `image` horizontally so the picture matches what the user sees
    /// in a mirror.
    pub fn mirrored(image: &RgbImage) -> Self {
        Self {
            image: imageops::flip_horizontal(image),
            captured_at: Instant::now(),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

#[derive(Clone)]
pub struct FrameSource {
    camera: Arc<dyn DeviceCamera + Send + Sync>,
    width: u32,
    height: u32,
}

impl FrameSource {
    pub fn new(camera: Arc<dyn DeviceCamera + Send + Sync>, width: u32, height: u32) -> Self {
        Self {
            camera,
            width,
            height,
        }
    }

    pub fn capture(&self) -> Result<Frame, CaptureError> {
        let image = self
            .camera
            .capture_frame()
            .map_err(|e| CaptureError(e.to_string()))?;

        if image.dimensions() == (self.width, self.height) {
            Ok(Frame::mirrored(&image))
        } else {
            let resized = imageops::resize(
                &image,
                self.width,
                self.height,
                imageops::FilterType::Triangle,
            );
            Ok(Frame::mirrored(&resized))
        }
    }
}
