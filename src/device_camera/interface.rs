use image::RgbImage;

/// A live camera stream. `capture_frame` returns whatever the stream
/// currently holds, unmirrored, at the camera's native resolution.
pub trait DeviceCamera {
    fn start(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn stop(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
    fn capture_frame(&self) -> Result<RgbImage, Box<dyn std::error::Error + Send + Sync>>;
}
