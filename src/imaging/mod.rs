//! Image ingestion: classify an image input and produce uploadable bytes.
//!
//! Unlike JSON normalization, ingestion never degrades silently. There is no lossless
//! fallback for binary image data, so every failure is returned to the caller.

mod pixels;
mod types;

pub use pixels::{JPEG_QUALITY, MAX_DIMENSION, PixelArray, PixelData, target_dimensions};
pub use types::{EncodedImage, ImageError};

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Plotting figure that can render itself to PNG.
pub trait Figure: Send + Sync {
    /// Render the figure as PNG bytes.
    fn render_png(&self) -> Result<Vec<u8>, String>;
}

/// Supported image inputs.
pub enum ImageInput {
    /// Path to an existing image file, uploaded as-is.
    Path(PathBuf),
    /// Already-encoded image bytes.
    Bytes(Vec<u8>),
    /// Raw pixel array, re-encoded as JPEG.
    Pixels(PixelArray),
    /// Plotting figure rendered to PNG.
    Figure(Box<dyn Figure>),
    /// Decoded image object, re-encoded as PNG.
    Image(DynamicImage),
}

impl fmt::Debug for ImageInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Pixels(array) => f
                .debug_struct("Pixels")
                .field("height", &array.height())
                .field("width", &array.width())
                .field("channels", &array.channels())
                .finish(),
            Self::Figure(_) => f.write_str("Figure"),
            Self::Image(image) => f
                .debug_tuple("Image")
                .field(&image.dimensions())
                .finish(),
        }
    }
}

impl From<PathBuf> for ImageInput {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for ImageInput {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<Vec<u8>> for ImageInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<PixelArray> for ImageInput {
    fn from(array: PixelArray) -> Self {
        Self::Pixels(array)
    }
}

impl From<DynamicImage> for ImageInput {
    fn from(image: DynamicImage) -> Self {
        Self::Image(image)
    }
}

/// Convert an image input into encoded bytes plus a file name.
///
/// `filename_hint` overrides the detected name for every input kind.
pub fn process_image_input(
    input: ImageInput,
    filename_hint: Option<&str>,
) -> Result<EncodedImage, ImageError> {
    let (bytes, detected) = match input {
        ImageInput::Path(path) => read_file(&path)?,
        ImageInput::Bytes(bytes) => {
            if bytes.is_empty() {
                return Err(ImageError::EmptyBuffer);
            }
            (bytes, "image.png".to_string())
        }
        ImageInput::Pixels(array) => (array.encode_jpeg()?, "pixels.jpg".to_string()),
        ImageInput::Figure(figure) => {
            let png = figure.render_png().map_err(ImageError::Render)?;
            if png.is_empty() {
                return Err(ImageError::Render("figure produced no output".into()));
            }
            (png, "figure.png".to_string())
        }
        ImageInput::Image(image) => (encode_png(image)?, "image.png".to_string()),
    };

    let filename = filename_hint
        .filter(|name| !name.trim().is_empty())
        .map_or(detected, str::to_string);
    let encoded = EncodedImage::new(bytes, filename);
    tracing::debug!(
        filename = %encoded.filename,
        mime_type = %encoded.mime_type,
        size = encoded.bytes.len(),
        "Processed image input"
    );
    Ok(encoded)
}

fn read_file(path: &Path) -> Result<(Vec<u8>, String), ImageError> {
    let bytes = std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            ImageError::NotFound(path.to_path_buf())
        } else {
            ImageError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image.png".to_string());
    Ok((bytes, name))
}

fn encode_png(image: DynamicImage) -> Result<Vec<u8>, ImageError> {
    let image = if image.color().has_alpha() {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbaImage;
    use std::io::Write;

    struct StaticFigure(Vec<u8>);

    impl Figure for StaticFigure {
        fn render_png(&self) -> Result<Vec<u8>, String> {
            Ok(self.0.clone())
        }
    }

    struct BrokenFigure;

    impl Figure for BrokenFigure {
        fn render_png(&self) -> Result<Vec<u8>, String> {
            Err("no backend".into())
        }
    }

    fn tiny_png() -> Vec<u8> {
        encode_png(DynamicImage::new_rgb8(2, 2)).expect("png")
    }

    #[test]
    fn missing_path_is_reported() {
        let dir = tempfile::tempdir().expect("temp dir");
        let missing = dir.path().join("absent.png");
        let err = process_image_input(ImageInput::from(missing.clone()), None)
            .expect_err("missing file");
        assert!(matches!(err, ImageError::NotFound(path) if path == missing));
    }

    #[test]
    fn existing_path_is_uploaded_verbatim() {
        let mut file = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .expect("temp file");
        let png = tiny_png();
        file.write_all(&png).expect("write");

        let encoded = process_image_input(file.path().into(), None).expect("reads");
        assert_eq!(encoded.bytes, png);
        assert!(encoded.filename.ends_with(".png"));
        assert_eq!(encoded.mime_type, "image/png");
    }

    #[test]
    fn bytes_use_hint_or_default_name() {
        let encoded = process_image_input(ImageInput::Bytes(tiny_png()), None).expect("bytes");
        assert_eq!(encoded.filename, "image.png");

        let encoded =
            process_image_input(ImageInput::Bytes(tiny_png()), Some("plot.png")).expect("bytes");
        assert_eq!(encoded.filename, "plot.png");

        let err = process_image_input(ImageInput::Bytes(Vec::new()), None).expect_err("empty");
        assert!(matches!(err, ImageError::EmptyBuffer));
    }

    #[test]
    fn pixel_arrays_become_jpeg() {
        let array = PixelArray::new(50, 80, 3, PixelData::U8(vec![0; 50 * 80 * 3])).expect("array");
        let encoded = process_image_input(array.into(), None).expect("encodes");
        assert_eq!(encoded.filename, "pixels.jpg");
        assert_eq!(encoded.mime_type, "image/jpeg");
    }

    #[test]
    fn figures_render_through_their_handle() {
        let figure = ImageInput::Figure(Box::new(StaticFigure(tiny_png())));
        let encoded = process_image_input(figure, None).expect("renders");
        assert_eq!(encoded.filename, "figure.png");

        let err = process_image_input(ImageInput::Figure(Box::new(BrokenFigure)), None)
            .expect_err("render failure");
        assert!(matches!(err, ImageError::Render(message) if message == "no backend"));
    }

    #[test]
    fn image_objects_drop_alpha() {
        let rgba = DynamicImage::ImageRgba8(RgbaImage::new(3, 2));
        let encoded = process_image_input(rgba.into(), None).expect("encodes");
        let decoded = image::load_from_memory(&encoded.bytes).expect("decodes");
        assert!(!decoded.color().has_alpha());
        assert_eq!(decoded.dimensions(), (3, 2));
    }
}
