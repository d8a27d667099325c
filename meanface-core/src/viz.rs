use crate::buffer::{BufferError, CropBuffer};
use crate::geometry::Point;
use image::{Rgb, RgbImage};
use imageproc::drawing::draw_cross_mut;

/// Render a 3-channel crop with its crop-space landmarks marked, for debug
/// dumps and enrollment screenshots.
pub fn annotate_crop(crop: &CropBuffer, landmarks: &[Point]) -> Result<RgbImage, BufferError> {
    let mut canvas = crop.to_rgb()?;
    let red = Rgb([255, 0, 0]);
    for point in landmarks {
        draw_cross_mut(&mut canvas, red, point.x as i32, point.y as i32);
    }
    Ok(canvas)
}
