//! Rectangular pixel arrays and their JPEG encoding.

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, GrayImage, RgbImage, RgbaImage};

use super::ImageError;

/// Longest side allowed for an encoded pixel array.
pub const MAX_DIMENSION: u32 = 800;
/// JPEG quality used for pixel arrays.
pub const JPEG_QUALITY: u8 = 85;

/// Element storage of a pixel array, row-major and channel-interleaved.
#[derive(Debug, Clone, PartialEq)]
pub enum PixelData {
    /// 8-bit channels.
    U8(Vec<u8>),
    /// 16-bit channels.
    U16(Vec<u16>),
    /// Single-precision channels.
    F32(Vec<f32>),
    /// Double-precision channels.
    F64(Vec<f64>),
}

impl PixelData {
    fn len(&self) -> usize {
        match self {
            Self::U8(data) => data.len(),
            Self::U16(data) => data.len(),
            Self::F32(data) => data.len(),
            Self::F64(data) => data.len(),
        }
    }

    /// Convert to 8-bit channels.
    ///
    /// Data whose maximum is at most 1.0 is scaled linearly by 255; anything else is cast directly.
    fn to_u8(&self) -> Vec<u8> {
        match self {
            Self::U8(data) => data.clone(),
            Self::U16(data) => {
                let unit = data.iter().all(|&value| value <= 1);
                data.iter()
                    .map(|&value| if unit { (value * 255) as u8 } else { value as u8 })
                    .collect()
            }
            Self::F32(data) => floats_to_u8(data.iter().map(|&value| f64::from(value))),
            Self::F64(data) => floats_to_u8(data.iter().copied()),
        }
    }
}

fn floats_to_u8(values: impl Iterator<Item = f64> + Clone) -> Vec<u8> {
    let max = values.clone().fold(f64::NEG_INFINITY, f64::max);
    let scale = if max <= 1.0 { 255.0 } else { 1.0 };
    values.map(|value| (value * scale) as u8).collect()
}

/// `height × width × channels` pixel array in OpenCV channel order.
///
/// Three-channel data is read as BGR, four-channel data as BGRA, one channel as grayscale.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelArray {
    height: u32,
    width: u32,
    channels: u8,
    data: PixelData,
}

impl PixelArray {
    /// Validate dimensions against the storage length.
    pub fn new(height: u32, width: u32, channels: u8, data: PixelData) -> Result<Self, ImageError> {
        if height == 0 || width == 0 {
            return Err(ImageError::InvalidShape(format!(
                "dimensions must be non-zero, got {height}x{width}"
            )));
        }
        if !matches!(channels, 1 | 3 | 4) {
            return Err(ImageError::InvalidShape(format!(
                "expected 1, 3 or 4 channels, got {channels}"
            )));
        }
        let expected = height as usize * width as usize * usize::from(channels);
        if data.len() != expected {
            return Err(ImageError::InvalidShape(format!(
                "expected {expected} elements for {height}x{width}x{channels}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            height,
            width,
            channels,
            data,
        })
    }

    /// Number of rows.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Channels per pixel.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Convert into an 8-bit image with RGB or RGBA channel order.
    pub fn to_image(&self) -> Result<DynamicImage, ImageError> {
        let mut buffer = self.data.to_u8();
        let invalid = || ImageError::InvalidShape("buffer does not match dimensions".into());

        let image = match self.channels {
            1 => DynamicImage::ImageLuma8(
                GrayImage::from_raw(self.width, self.height, buffer).ok_or_else(invalid)?,
            ),
            3 => {
                for pixel in buffer.chunks_exact_mut(3) {
                    pixel.swap(0, 2);
                }
                DynamicImage::ImageRgb8(
                    RgbImage::from_raw(self.width, self.height, buffer).ok_or_else(invalid)?,
                )
            }
            _ => {
                for pixel in buffer.chunks_exact_mut(4) {
                    pixel.swap(0, 2);
                }
                DynamicImage::ImageRgba8(
                    RgbaImage::from_raw(self.width, self.height, buffer).ok_or_else(invalid)?,
                )
            }
        };
        Ok(image)
    }

    /// Normalize, downsize, and encode as JPEG.
    pub fn encode_jpeg(&self) -> Result<Vec<u8>, ImageError> {
        let mut image = self.to_image()?;

        let (width, height) = target_dimensions(self.width, self.height);
        if (width, height) != (self.width, self.height) {
            tracing::debug!(
                from_width = self.width,
                from_height = self.height,
                width,
                height,
                "Downsizing pixel array"
            );
            image = image.thumbnail_exact(width, height);
        }

        if image.color().has_alpha() {
            image = DynamicImage::ImageRgb8(image.to_rgb8());
        }

        let mut bytes = Vec::new();
        image.write_with_encoder(JpegEncoder::new_with_quality(&mut bytes, JPEG_QUALITY))?;
        Ok(bytes)
    }
}

/// Dimensions after fitting the longer side into [`MAX_DIMENSION`], preserving aspect ratio.
pub fn target_dimensions(width: u32, height: u32) -> (u32, u32) {
    if width <= MAX_DIMENSION && height <= MAX_DIMENSION {
        return (width, height);
    }
    let scale = f64::from(MAX_DIMENSION) / f64::from(width.max(height));
    let scaled = |side: u32| ((f64::from(side) * scale) as u32).max(1);
    (scaled(width), scaled(height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GenericImageView;

    #[test]
    fn large_array_is_downsized_preserving_aspect() {
        let array = PixelArray::new(500, 1000, 3, PixelData::U8(vec![0; 500 * 1000 * 3]))
            .expect("valid array");
        let jpeg = array.encode_jpeg().expect("encodes");

        let decoded = image::load_from_memory(&jpeg).expect("decodes");
        assert_eq!(decoded.dimensions(), (800, 400));
    }

    #[test]
    fn small_arrays_keep_their_size() {
        assert_eq!(target_dimensions(80, 50), (80, 50));
        assert_eq!(target_dimensions(800, 800), (800, 800));
        assert_eq!(target_dimensions(400, 1600), (200, 800));
        assert_eq!(target_dimensions(10_000, 3), (800, 1));
    }

    #[test]
    fn unit_floats_are_rescaled() {
        let data = PixelData::F32(vec![0.0, 0.5, 1.0]);
        assert_eq!(data.to_u8(), vec![0, 127, 255]);

        let data = PixelData::F64(vec![0.0, 128.7, 300.0]);
        assert_eq!(data.to_u8(), vec![0, 128, 255]);
    }

    #[test]
    fn three_channels_are_read_as_bgr() {
        let array =
            PixelArray::new(1, 1, 3, PixelData::U8(vec![10, 20, 30])).expect("valid array");
        let image = array.to_image().expect("converts");
        assert_eq!(image.to_rgb8().get_pixel(0, 0).0, [30, 20, 10]);
    }

    #[test]
    fn four_channels_are_read_as_bgra() {
        let array =
            PixelArray::new(1, 1, 4, PixelData::U8(vec![10, 20, 30, 40])).expect("valid array");
        let image = array.to_image().expect("converts");
        assert_eq!(image.to_rgba8().get_pixel(0, 0).0, [30, 20, 10, 40]);
    }

    #[test]
    fn shape_mismatch_is_rejected() {
        let err = PixelArray::new(2, 2, 3, PixelData::U8(vec![0; 5])).expect_err("mismatch");
        assert!(matches!(err, ImageError::InvalidShape(_)));

        let err = PixelArray::new(2, 2, 2, PixelData::U8(vec![0; 8])).expect_err("channels");
        assert!(matches!(err, ImageError::InvalidShape(_)));
    }

    #[test]
    fn rgba_arrays_encode_without_alpha() {
        let array = PixelArray::new(4, 4, 4, PixelData::U16(vec![1; 64])).expect("valid array");
        let jpeg = array.encode_jpeg().expect("encodes");
        assert_eq!(image::guess_format(&jpeg).expect("format"), image::ImageFormat::Jpeg);
    }
}
