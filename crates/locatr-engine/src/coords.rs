//! Letterboxing between a device's native resolution and the resolution a
//! vision model sees.

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, Rgba, RgbaImage};
use locatr_common::{Point, Resolution};
use std::io::Cursor;

/// Placement of the scaled content inside the target frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub scale: f64,
    pub content: Resolution,
    pub pad_x: u32,
    pub pad_y: u32,
}

impl Letterbox {
    /// A zero-sized original maps one-to-one.
    pub fn new(original: Resolution, target: Resolution) -> Self {
        if original.width == 0 || original.height == 0 {
            return Self {
                scale: 1.0,
                content: original,
                pad_x: 0,
                pad_y: 0,
            };
        }
        let scale = (target.width as f64 / original.width as f64)
            .min(target.height as f64 / original.height as f64);
        let content = Resolution::new(
            (original.width as f64 * scale).round() as u32,
            (original.height as f64 * scale).round() as u32,
        );
        Self {
            scale,
            content,
            pad_x: target.width.saturating_sub(content.width) / 2,
            pad_y: target.height.saturating_sub(content.height) / 2,
        }
    }

    fn contains(&self, point: Point) -> bool {
        let (x0, y0) = (self.pad_x as f64, self.pad_y as f64);
        point.x >= x0
            && point.x < x0 + self.content.width as f64
            && point.y >= y0
            && point.y < y0 + self.content.height as f64
    }
}

/// Map a point on the letterboxed image back to original coordinates.
/// Returns `None` when the point lies on the padding.
pub fn remap_point(point: Point, original: Resolution, target: Resolution) -> Option<Point> {
    let letterbox = Letterbox::new(original, target);
    if !letterbox.contains(point) {
        return None;
    }
    let clamp = |v: f64, max: u32| v.max(0.0).min(max.saturating_sub(1) as f64);
    let x = ((point.x - letterbox.pad_x as f64) / letterbox.scale).round();
    let y = ((point.y - letterbox.pad_y as f64) / letterbox.scale).round();
    Some(Point::new(clamp(x, original.width), clamp(y, original.height)))
}

/// Map an original-coordinate point onto the letterboxed image.
pub fn remap_point_inverse(point: Point, original: Resolution, target: Resolution) -> Point {
    let letterbox = Letterbox::new(original, target);
    Point::new(
        letterbox.pad_x as f64 + point.x * letterbox.scale,
        letterbox.pad_y as f64 + point.y * letterbox.scale,
    )
}

/// Fit `img` into `target` preserving aspect ratio, centered on black.
pub fn scale_and_pad(img: &DynamicImage, target: Resolution) -> RgbaImage {
    let (width, height) = img.dimensions();
    let letterbox = Letterbox::new(Resolution::new(width, height), target);

    let mut canvas = RgbaImage::from_pixel(target.width, target.height, Rgba([0, 0, 0, 255]));
    if letterbox.content.width == 0 || letterbox.content.height == 0 {
        return canvas;
    }
    let resized = imageops::resize(
        img,
        letterbox.content.width,
        letterbox.content.height,
        FilterType::Nearest,
    );
    imageops::replace(
        &mut canvas,
        &resized,
        letterbox.pad_x as i64,
        letterbox.pad_y as i64,
    );
    canvas
}

/// Decode a screenshot, letterbox it into `target` and re-encode it as PNG.
/// Also returns the screenshot's original resolution.
pub fn letterbox_png(
    bytes: &[u8],
    target: Resolution,
) -> Result<(Vec<u8>, Resolution), image::ImageError> {
    let img = image::load_from_memory(bytes)?;
    let (width, height) = img.dimensions();
    let padded = DynamicImage::ImageRgba8(scale_and_pad(&img, target));

    let mut buffer = Cursor::new(Vec::new());
    padded.write_to(&mut buffer, ImageFormat::Png)?;
    Ok((buffer.into_inner(), Resolution::new(width, height)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn portrait_into_landscape_pads_horizontally() {
        let lb = Letterbox::new(Resolution::new(400, 800), Resolution::new(1280, 800));
        assert_eq!(lb.scale, 1.0);
        assert_eq!(lb.content, Resolution::new(400, 800));
        assert_eq!((lb.pad_x, lb.pad_y), (440, 0));
    }

    #[test]
    fn degenerate_original_is_identity() {
        let lb = Letterbox::new(Resolution::new(0, 10), Resolution::new(100, 100));
        assert_eq!(lb.scale, 1.0);
        assert_eq!((lb.pad_x, lb.pad_y), (0, 0));
    }
}
