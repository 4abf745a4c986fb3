//! Picture format detection and pixel dimensions.

use crate::{OoxmlError, OoxmlResult, EMU_PER_INCH};
use image::GenericImageView;

/// Picture formats that can be embedded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ImageFormat::Png => "png",
            ImageFormat::Jpeg => "jpeg",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
        }
    }
}

/// Format and pixel size of a decoded picture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub format: ImageFormat,
    pub width_px: u32,
    pub height_px: u32,
}

impl ImageInfo {
    /// Detects the format and decodes the whole picture, so a valid header over a truncated or
    /// corrupt body is rejected before it reaches a package.
    ///
    /// # Errors
    ///
    /// Returns `OoxmlError::UnsupportedImage` if the bytes are not PNG or JPEG, fail to decode,
    /// or report a zero dimension.
    pub fn inspect(bytes: &[u8]) -> OoxmlResult<Self> {
        let format = match image::guess_format(bytes) {
            Ok(image::ImageFormat::Png) => ImageFormat::Png,
            Ok(image::ImageFormat::Jpeg) => ImageFormat::Jpeg,
            Ok(other) => {
                return Err(OoxmlError::UnsupportedImage(format!(
                    "{other:?} is not PNG or JPEG"
                )))
            }
            Err(_) => {
                return Err(OoxmlError::UnsupportedImage(
                    "unrecognised image data".into(),
                ))
            }
        };

        let decoded = image::load_from_memory_with_format(bytes, format.into()).map_err(|e| {
            OoxmlError::UnsupportedImage(format!(
                "{} does not decode: {e}",
                format.extension().to_uppercase()
            ))
        })?;
        let (width_px, height_px) = decoded.dimensions();
        if width_px == 0 || height_px == 0 {
            return Err(OoxmlError::UnsupportedImage(
                "image has a zero dimension".into(),
            ));
        }

        Ok(Self {
            format,
            width_px,
            height_px,
        })
    }

    /// Extent in EMU that fits inside `max_cx` x `max_cy`, keeping the aspect ratio.
    pub fn fit(&self, max_cx: u64, max_cy: u64) -> (u64, u64) {
        let w = u64::from(self.width_px);
        let h = u64::from(self.height_px);
        let cx = max_cx;
        let cy = cx * h / w;
        if cy <= max_cy {
            return (cx.max(1), cy.max(1));
        }
        ((max_cy * w / h).max(1), max_cy.max(1))
    }

    /// Extent in EMU for a fixed width in inches, keeping the aspect ratio.
    pub fn extent_for_width_inches(&self, inches: f64) -> (u64, u64) {
        let cx = (inches * EMU_PER_INCH as f64) as u64;
        self.fit(cx, u64::MAX / 2)
    }
}

impl From<ImageFormat> for image::ImageFormat {
    fn from(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{jpeg_bytes, png_bytes};

    #[test]
    fn test_inspect_png() {
        let info = ImageInfo::inspect(&png_bytes(640, 480)).unwrap();
        assert_eq!(info.format, ImageFormat::Png);
        assert_eq!((info.width_px, info.height_px), (640, 480));
    }

    #[test]
    fn test_inspect_jpeg() {
        let info = ImageInfo::inspect(&jpeg_bytes(320, 200)).unwrap();
        assert_eq!(info.format, ImageFormat::Jpeg);
        assert_eq!((info.width_px, info.height_px), (320, 200));
    }

    #[test]
    fn test_inspect_rejects_text() {
        let err = ImageInfo::inspect(b"<html>not an image</html>").unwrap_err();
        assert!(matches!(err, OoxmlError::UnsupportedImage(_)));
    }

    #[test]
    fn test_inspect_rejects_truncated_png() {
        let truncated = &png_bytes(10, 10)[..14];
        assert!(matches!(
            ImageInfo::inspect(truncated),
            Err(OoxmlError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_inspect_rejects_header_without_pixel_data() {
        // Signature and a complete IHDR chunk, then nothing.
        let header_only = &png_bytes(10, 10)[..33];
        let err = ImageInfo::inspect(header_only).unwrap_err();
        assert!(matches!(err, OoxmlError::UnsupportedImage(_)));
    }

    #[test]
    fn test_inspect_rejects_unsupported_format() {
        let gif = b"GIF89a\x01\x00\x01\x00\x00\x00\x00;";
        assert!(matches!(
            ImageInfo::inspect(gif),
            Err(OoxmlError::UnsupportedImage(_))
        ));
    }

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let info = ImageInfo {
            format: ImageFormat::Png,
            width_px: 200,
            height_px: 100,
        };
        assert_eq!(info.fit(1000, 1000), (1000, 500));
        // Height-bound: shrink width to match.
        assert_eq!(info.fit(1000, 250), (500, 250));
    }

    #[test]
    fn test_extent_for_width_inches() {
        let info = ImageInfo {
            format: ImageFormat::Png,
            width_px: 100,
            height_px: 50,
        };
        let (cx, cy) = info.extent_for_width_inches(2.0);
        assert_eq!(cx, 2 * EMU_PER_INCH);
        assert_eq!(cy, EMU_PER_INCH);
    }
}
