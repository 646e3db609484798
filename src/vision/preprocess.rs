//! Decoding and tensor preparation for classifier input.

use std::path::Path;

use image::imageops::FilterType;
use image::RgbImage;

use super::VisionError;

/// Square input edge expected by DenseNet/ViT style backbones.
pub const INPUT_SIZE: u32 = 224;

/// ImageNet channel statistics.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Read a stored image and convert it to RGB.
///
/// The format is sniffed from content, not from the file extension:
/// stored names always carry a fixed extension regardless of source format.
pub fn decode_rgb(path: &Path) -> Result<RgbImage, VisionError> {
    let bytes = std::fs::read(path)?;
    decode_rgb_bytes(&bytes)
}

pub fn decode_rgb_bytes(bytes: &[u8]) -> Result<RgbImage, VisionError> {
    let img = image::load_from_memory(bytes)
        .map_err(|e| VisionError::InvalidImage(e.to_string()))?;
    Ok(img.to_rgb8())
}

/// Resize to `INPUT_SIZE`², scale to [0, 1] and normalize per channel.
///
/// Returns a flat `[1, 3, H, W]` (NCHW) buffer.
pub fn to_input_tensor(img: &RgbImage) -> Vec<f32> {
    let resized = image::imageops::resize(img, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    let plane = (INPUT_SIZE * INPUT_SIZE) as usize;
    let mut tensor = vec![0.0f32; 3 * plane];

    for (x, y, pixel) in resized.enumerate_pixels() {
        let offset = (y * INPUT_SIZE + x) as usize;
        for c in 0..3 {
            let value = f32::from(pixel[c]) / 255.0;
            tensor[c * plane + offset] = (value - IMAGENET_MEAN[c]) / IMAGENET_STD[c];
        }
    }

    tensor
}

/// Global luminance statistics, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageStats {
    pub mean: f32,
    pub std_dev: f32,
    /// Mean absolute difference between neighbouring pixels.
    pub edge_energy: f32,
}

pub fn image_stats(img: &RgbImage) -> ImageStats {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return ImageStats {
            mean: 0.0,
            std_dev: 0.0,
            edge_energy: 0.0,
        };
    }

    let luma: Vec<f32> = img
        .pixels()
        .map(|p| {
            (0.299 * f32::from(p[0]) + 0.587 * f32::from(p[1]) + 0.114 * f32::from(p[2])) / 255.0
        })
        .collect();

    let n = luma.len() as f32;
    let mean = luma.iter().sum::<f32>() / n;
    let variance = luma.iter().map(|v| (v - mean).powi(2)).sum::<f32>() / n;

    let mut edge_sum = 0.0f32;
    let mut edge_count = 0u32;
    for y in 0..h {
        for x in 0..w {
            let here = luma[(y * w + x) as usize];
            if x + 1 < w {
                edge_sum += (luma[(y * w + x + 1) as usize] - here).abs();
                edge_count += 1;
            }
            if y + 1 < h {
                edge_sum += (luma[((y + 1) * w + x) as usize] - here).abs();
                edge_count += 1;
            }
        }
    }
    let edge_energy = if edge_count > 0 {
        edge_sum / edge_count as f32
    } else {
        0.0
    };

    ImageStats {
        mean,
        std_dev: variance.sqrt(),
        edge_energy,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, ImageOutputFormat, Rgb};
    use std::io::Cursor;

    fn png_bytes(img: RgbImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, ImageOutputFormat::Png)
            .unwrap();
        buf.into_inner()
    }

    #[test]
    fn decodes_png_bytes_to_rgb() {
        let bytes = png_bytes(RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])));
        let img = decode_rgb_bytes(&bytes).unwrap();
        assert_eq!(img.dimensions(), (10, 10));
    }

    #[test]
    fn garbage_bytes_are_invalid_image() {
        let err = decode_rgb_bytes(b"definitely not an image").unwrap_err();
        assert!(matches!(err, VisionError::InvalidImage(_)));
    }

    #[test]
    fn decode_ignores_misleading_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.jpg");
        std::fs::write(&path, png_bytes(RgbImage::from_pixel(3, 3, Rgb([9, 9, 9])))).unwrap();
        assert!(decode_rgb(&path).is_ok());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = decode_rgb(Path::new("/nonexistent/xray.png")).unwrap_err();
        assert!(matches!(err, VisionError::Io(_)));
    }

    #[test]
    fn tensor_has_nchw_shape_and_normalization() {
        let img = RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]));
        let tensor = to_input_tensor(&img);
        let plane = (INPUT_SIZE * INPUT_SIZE) as usize;
        assert_eq!(tensor.len(), 3 * plane);
        let expected_r = (1.0 - IMAGENET_MEAN[0]) / IMAGENET_STD[0];
        assert!((tensor[0] - expected_r).abs() < 0.05);
        let expected_b = (1.0 - IMAGENET_MEAN[2]) / IMAGENET_STD[2];
        assert!((tensor[2 * plane] - expected_b).abs() < 0.05);
    }

    #[test]
    fn stats_of_black_image_are_zero() {
        let stats = image_stats(&RgbImage::from_pixel(10, 10, Rgb([0, 0, 0])));
        assert_eq!(stats.mean, 0.0);
        assert_eq!(stats.std_dev, 0.0);
        assert_eq!(stats.edge_energy, 0.0);
    }

    #[test]
    fn stats_detect_contrast() {
        let mut img = RgbImage::from_pixel(4, 4, Rgb([0, 0, 0]));
        for y in 0..4 {
            img.put_pixel(0, y, Rgb([255, 255, 255]));
        }
        let stats = image_stats(&img);
        assert!(stats.mean > 0.2 && stats.mean < 0.3);
        assert!(stats.std_dev > 0.0);
        assert!(stats.edge_energy > 0.0);
    }
}
