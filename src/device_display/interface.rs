use image::RgbImage;
use std::error::Error;

/// A fixed-size drawing surface with a set of named regions that can each be
/// shown or hidden.
pub trait DeviceDisplay: Send {
    /// Prepare the surface and register the regions it hosts.
    fn init(
        &mut self,
        width: u32,
        height: u32,
        regions: &[String],
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Fill the surface with black.
    fn clear(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Draw `image` with its top-left corner at the surface origin.
    fn draw_frame(&mut self, image: &RgbImage) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Draw `text` centred along the bottom edge.
    fn draw_label(&mut self, text: &str) -> Result<(), Box<dyn Error + Send + Sync>>;

    fn set_region_visible(
        &mut self,
        region: &str,
        visible: bool,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;

    /// Push everything drawn since the last `clear` to the screen.
    fn present(&mut self) -> Result<(), Box<dyn Error + Send + Sync>>;
}
