//! Decoding response bodies and re-encoding them as PNG.

use std::{borrow::Cow, fmt, sync::Arc};

use image::{
    ColorType, DynamicImage,
    codecs::png::{CompressionType, FilterType, PngEncoder},
};

use crate::error::{DecodeError, PersistError};

/// An in-memory raster image produced by a single decode.
///
/// Clones share the same pixel buffer.
#[derive(Clone)]
pub struct DecodedImage {
    inner: Arc<DynamicImage>,
}

impl DecodedImage {
    pub fn new(image: DynamicImage) -> Self {
        Self {
            inner: Arc::new(image),
        }
    }

    pub fn width(&self) -> u32 {
        self.inner.width()
    }

    pub fn height(&self) -> u32 {
        self.inner.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width(), self.height())
    }

    pub fn color(&self) -> ColorType {
        self.inner.color()
    }

    /// Raw pixel bytes in the image's native color layout.
    pub fn as_bytes(&self) -> &[u8] {
        self.inner.as_bytes()
    }

    pub fn as_dynamic(&self) -> &DynamicImage {
        &self.inner
    }

    /// Take the pixel buffer, copying only if other clones are still alive.
    pub fn into_dynamic(self) -> DynamicImage {
        Arc::try_unwrap(self.inner).unwrap_or_else(|shared| (*shared).clone())
    }
}

impl fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("color", &self.color())
            .finish()
    }
}

impl PartialEq for DecodedImage {
    fn eq(&self, other: &Self) -> bool {
        self.dimensions() == other.dimensions()
            && self.color() == other.color()
            && self.as_bytes() == other.as_bytes()
    }
}

impl From<DynamicImage> for DecodedImage {
    fn from(image: DynamicImage) -> Self {
        Self::new(image)
    }
}

/// Decode a response body, guessing the format from its content.
pub fn decode(data: &[u8]) -> Result<DecodedImage, DecodeError> {
    let img = image::load_from_memory(data)?;

    let (width, height) = (img.width(), img.height());
    if width == 0 || height == 0 {
        return Err(DecodeError::EmptyImage { width, height });
    }

    Ok(DecodedImage::new(img))
}

/// Encode losslessly as PNG with the strongest compression setting.
pub fn encode_png(image: &DecodedImage) -> Result<Vec<u8>, PersistError> {
    // PNG has no float sample format
    let source = match image.color() {
        ColorType::Rgb32F => {
            Cow::Owned(DynamicImage::ImageRgb16(image.as_dynamic().to_rgb16()))
        }
        ColorType::Rgba32F => Cow::Owned(DynamicImage::ImageRgba16(
            image.as_dynamic().to_rgba16(),
        )),
        _ => Cow::Borrowed(image.as_dynamic()),
    };

    let mut out = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        &mut out,
        CompressionType::Best,
        FilterType::Adaptive,
    );
    source
        .write_with_encoder(encoder)
        .map_err(PersistError::Encode)?;

    Ok(out)
}
