use image::{imageops, RgbImage};
use tract_onnx::prelude::*;

/// Crops the centred square of `image` and scales it to `size`x`size`.
pub fn center_square(image: &RgbImage, size: u32) -> RgbImage {
    let (w, h) = image.dimensions();
    let side = w.min(h);
    let x_offset = (w - side) / 2;
    let y_offset = (h - side) / 2;

    let cropped = imageops::crop_imm(image, x_offset, y_offset, side, side).to_image();

    if side == size {
        cropped
    } else {
        imageops::resize(&cropped, size, size, imageops::FilterType::Triangle)
    }
}

/// NCHW tensor with channels scaled linearly into `[low, high]`.
fn image_to_tensor(
    image: &RgbImage,
    [low, high]: [f32; 2],
) -> Result<Tensor, Box<dyn std::error::Error + Send + Sync>> {
    let (w, h) = (image.width() as usize, image.height() as usize);
    let scale = (high - low) / 255.0;
    let tensor = tract_ndarray::Array4::from_shape_fn((1, 3, h, w), |(_, c, y, x)| {
        image.get_pixel(x as u32, y as u32)[c] as f32 * scale + low
    });

    Ok(tensor.into_tensor())
}

pub fn frame_to_tensor(
    image: &RgbImage,
    size: u32,
    input_range: [f32; 2],
) -> Result<Tensor, Box<dyn std::error::Error + Send + Sync>> {
    let square = center_square(image, size);
    image_to_tensor(&square, input_range)
}
