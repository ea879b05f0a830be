//! Image resize pipeline
//!
//! [`resize_to_fit`] is a pure bytes-in, bytes-out function: it decodes an
//! upload, scales it down into a bounding box when needed and re-encodes it.
//! Callers decide where the result is stored.

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};

use crate::config::ImageBox;

/// JPEG quality used for re-encoded images
pub const JPEG_QUALITY: u8 = 75;

/// Error types for image processing
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    /// The payload is not a decodable image
    #[error("Upload a valid image. The file you uploaded was either not an image or a corrupted image.")]
    Invalid,

    /// Re-encoding the scaled image failed
    #[error("Failed to encode image: {0}")]
    Encode(String),
}

/// Result of running an upload through the pipeline
#[derive(Debug, Clone)]
pub struct ProcessedImage {
    /// Bytes to store
    pub bytes: Vec<u8>,
    /// File extension matching `bytes`, without the dot
    pub extension: &'static str,
    pub width: u32,
    pub height: u32,
    /// Whether the image was scaled and re-encoded
    pub resized: bool,
}

/// Decode `data` and make sure it fits into `bounds`.
///
/// Images larger than the box in either dimension are scaled down keeping
/// their aspect ratio, converted to RGB and re-encoded as JPEG. Images that
/// already fit are returned unchanged with the extension of their format.
pub fn resize_to_fit(data: &[u8], bounds: ImageBox) -> Result<ProcessedImage, ImageError> {
    let format = image::guess_format(data).map_err(|_| ImageError::Invalid)?;
    let decoded =
        image::load_from_memory_with_format(data, format).map_err(|_| ImageError::Invalid)?;
    let (width, height) = decoded.dimensions();

    if width <= bounds.width && height <= bounds.height {
        return Ok(ProcessedImage {
            bytes: data.to_vec(),
            extension: extension_for(format),
            width,
            height,
            resized: false,
        });
    }

    let scaled = decoded.resize(bounds.width, bounds.height, FilterType::Lanczos3);
    let rgb = DynamicImage::ImageRgb8(scaled.to_rgb8());
    let (new_width, new_height) = rgb.dimensions();

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ImageError::Encode(e.to_string()))?;

    tracing::debug!(
        "Resized image from {}x{} to {}x{}",
        width,
        height,
        new_width,
        new_height
    );

    Ok(ProcessedImage {
        bytes,
        extension: "jpeg",
        width: new_width,
        height: new_height,
        resized: true,
    })
}

fn extension_for(format: ImageFormat) -> &'static str {
    match format {
        ImageFormat::Jpeg => "jpeg",
        other => other.extensions_str().first().copied().unwrap_or("img"),
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{jpeg, png, png_with_alpha};
    use super::*;

    const THUMBNAIL: ImageBox = ImageBox::new(800, 600);

    #[test]
    fn test_small_image_unchanged() {
        let data = png(10, 10);
        let result = resize_to_fit(&data, THUMBNAIL).unwrap();

        assert!(!result.resized);
        assert_eq!(result.bytes, data);
        assert_eq!(result.extension, "png");
        assert_eq!((result.width, result.height), (10, 10));
    }

    #[test]
    fn test_exact_box_is_not_resized() {
        let result = resize_to_fit(&jpeg(800, 600), THUMBNAIL).unwrap();
        assert!(!result.resized);
        assert_eq!(result.extension, "jpeg");
    }

    #[test]
    fn test_wide_image_scaled_into_box() {
        let result = resize_to_fit(&png(1600, 400), THUMBNAIL).unwrap();

        assert!(result.resized);
        assert_eq!(result.extension, "jpeg");
        assert_eq!((result.width, result.height), (800, 200));

        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert_eq!(image::guess_format(&result.bytes).unwrap(), ImageFormat::Jpeg);
        assert_eq!(decoded.dimensions(), (800, 200));
    }

    #[test]
    fn test_tall_image_scaled_into_box() {
        let result = resize_to_fit(&png(300, 1200), THUMBNAIL).unwrap();
        assert_eq!((result.width, result.height), (150, 600));
    }

    #[test]
    fn test_alpha_converted_to_rgb() {
        let result = resize_to_fit(&png_with_alpha(1000, 1000), THUMBNAIL).unwrap();
        let decoded = image::load_from_memory(&result.bytes).unwrap();
        assert!(!decoded.color().has_alpha());
        assert_eq!(decoded.dimensions(), (600, 600));
    }

    #[test]
    fn test_non_image_rejected() {
        assert!(matches!(
            resize_to_fit(b"definitely not an image", THUMBNAIL),
            Err(ImageError::Invalid)
        ));
        assert!(matches!(resize_to_fit(&[], THUMBNAIL), Err(ImageError::Invalid)));
    }

    #[test]
    fn test_truncated_image_rejected() {
        let data = png(50, 50);
        let truncated = &data[..data.len() / 2];
        assert!(matches!(
            resize_to_fit(truncated, THUMBNAIL),
            Err(ImageError::Invalid)
        ));
    }
}

#[cfg(test)]
mod property_tests {
    use super::fixtures::png;
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Whatever goes in, what comes out fits the box
        #[test]
        fn output_fits_bounds(
            width in 1u32..300,
            height in 1u32..300,
            box_w in 8u32..120,
            box_h in 8u32..120,
        ) {
            let bounds = ImageBox::new(box_w, box_h);
            let result = resize_to_fit(&png(width, height), bounds).expect("valid image");

            let decoded = image::load_from_memory(&result.bytes).expect("decodable output");
            let (w, h) = decoded.dimensions();
            prop_assert!(w <= box_w && h <= box_h);
            prop_assert_eq!((w, h), (result.width, result.height));
            prop_assert_eq!(result.resized, width > box_w || height > box_h);
        }
    }
}
