//! Conversion of grabbed screen images into encoder frames.

use image::imageops::{self, FilterType};
use image::{DynamicImage, RgbImage, RgbaImage};

/// Output frame size for a first sample of `width` x `height`.
///
/// yuv420p needs even dimensions, so odd sizes lose their last row/column.
pub fn output_dimensions(width: u32, height: u32) -> (u32, u32) {
    ((width & !1).max(2), (height & !1).max(2))
}

/// Drops alpha and forces the image to exactly `width` x `height`.
///
/// A source at most one pixel larger per axis is cropped; any other size
/// difference (a resized window) is resampled.
pub fn normalize(image: RgbaImage, width: u32, height: u32) -> RgbImage {
    let rgb = DynamicImage::ImageRgba8(image).into_rgb8();
    let (w, h) = rgb.dimensions();

    if (w, h) == (width, height) {
        return rgb;
    }

    let parity_only = w >= width && h >= height && w - width <= 1 && h - height <= 1;
    if parity_only {
        return imageops::crop_imm(&rgb, 0, 0, width, height).to_image();
    }

    imageops::resize(&rgb, width, height, FilterType::Triangle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_output_dimensions_are_even() {
        assert_eq!(output_dimensions(800, 600), (800, 600));
        assert_eq!(output_dimensions(801, 599), (800, 598));
        assert_eq!(output_dimensions(1, 1), (2, 2));
    }

    #[test]
    fn test_normalize_drops_alpha_and_keeps_channels() {
        let image = RgbaImage::from_pixel(4, 2, Rgba([10, 20, 30, 0]));
        let frame = normalize(image, 4, 2);
        assert_eq!(frame.dimensions(), (4, 2));
        assert_eq!(frame.get_pixel(3, 1).0, [10, 20, 30]);
        assert_eq!(frame.as_raw().len(), 4 * 2 * 3);
    }

    #[test]
    fn test_normalize_resamples_resized_source() {
        let image = RgbaImage::from_pixel(1024, 700, Rgba([200, 100, 50, 255]));
        let frame = normalize(image, 800, 600);
        assert_eq!(frame.dimensions(), (800, 600));
        assert_eq!(frame.get_pixel(400, 300).0, [200, 100, 50]);
    }

    #[test]
    fn test_normalize_upscales_shrunk_source() {
        let image = RgbaImage::new(300, 200);
        assert_eq!(normalize(image, 800, 600).dimensions(), (800, 600));
    }

    #[test]
    fn test_normalize_crops_odd_parity() {
        let mut image = RgbaImage::new(801, 601);
        image.put_pixel(0, 0, Rgba([1, 2, 3, 255]));
        let frame = normalize(image, 800, 600);
        assert_eq!(frame.dimensions(), (800, 600));
        assert_eq!(frame.get_pixel(0, 0).0, [1, 2, 3]);
    }
}
