//! Texture acquisition.
//!
//! The registry only needs "path in, RGBA8 pixels out at a fixed size".
//! [`ImageFileSource`] does that with the `image` crate; tests and
//! procedural content can plug in any closure instead.

use std::path::Path;

use image::imageops::FilterType;

use crate::util::Result;

/// Produces `width * height * 4` RGBA8 bytes for a texture path.
pub trait TextureSource: Send {
    fn load_rgba8(&self, path: &str, width: u32, height: u32) -> Result<Vec<u8>>;
}

impl<F> TextureSource for F
where
    F: Fn(&str, u32, u32) -> Result<Vec<u8>> + Send,
{
    fn load_rgba8(&self, path: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        self(path, width, height)
    }
}

/// Loads textures from disk, resizes them to the atlas size and flips
/// them vertically so row 0 is the bottom of the image.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageFileSource {
    /// Resampling filter used when the file size differs from the atlas.
    pub filter: Option<FilterType>,
}

impl TextureSource for ImageFileSource {
    #[tracing::instrument(skip(self), level = "debug")]
    fn load_rgba8(&self, path: &str, width: u32, height: u32) -> Result<Vec<u8>> {
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let img = image::ImageReader::open(Path::new(path))?
            .with_guessed_format()?
            .decode()?;

        let img = if img.width() == width && img.height() == height {
            img
        } else {
            img.resize_exact(width, height, self.filter.unwrap_or(FilterType::Triangle))
        };

        Ok(img.flipv().into_rgba8().into_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_resizes_and_flips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gradient.png");

        // 2x2: top row red, bottom row blue
        let mut img = image::RgbaImage::new(2, 2);
        for x in 0..2 {
            img.put_pixel(x, 0, image::Rgba([255, 0, 0, 255]));
            img.put_pixel(x, 1, image::Rgba([0, 0, 255, 255]));
        }
        img.save(&path).unwrap();

        let pixels = ImageFileSource::default()
            .load_rgba8(path.to_str().unwrap(), 2, 2)
            .unwrap();
        assert_eq!(pixels.len(), 2 * 2 * 4);
        // Flipped: first row is now blue
        assert_eq!(&pixels[0..4], &[0, 0, 255, 255]);
        assert_eq!(&pixels[8..12], &[255, 0, 0, 255]);

        let scaled = ImageFileSource::default()
            .load_rgba8(path.to_str().unwrap(), 4, 8)
            .unwrap();
        assert_eq!(scaled.len(), 4 * 8 * 4);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = ImageFileSource::default().load_rgba8("does/not/exist.png", 4, 4);
        assert!(result.is_err());
    }

    #[test]
    fn test_closure_source() {
        let source = |_: &str, w: u32, h: u32| -> Result<Vec<u8>> { Ok(vec![7u8; (w * h * 4) as usize]) };
        assert_eq!(source.load_rgba8("any", 2, 1).unwrap(), vec![7u8; 8]);
    }
}
