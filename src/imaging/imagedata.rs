//! Source image bytes and their detected type

use std::fmt;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::ImageError;

/// Image container type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageType {
    Jpeg,
    Png,
    WebP,
    Gif,
}

impl ImageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
            Self::WebP => "webp",
            Self::Gif => "gif",
        }
    }

    /// Whether the decoder can shrink the image while decoding it.
    pub fn supports_scale_on_load(&self) -> bool {
        matches!(self, Self::Jpeg | Self::WebP)
    }

    pub(crate) fn to_image_format(self) -> image::ImageFormat {
        match self {
            Self::Jpeg => image::ImageFormat::Jpeg,
            Self::Png => image::ImageFormat::Png,
            Self::WebP => image::ImageFormat::WebP,
            Self::Gif => image::ImageFormat::Gif,
        }
    }

    fn from_image_format(format: image::ImageFormat) -> Option<Self> {
        match format {
            image::ImageFormat::Jpeg => Some(Self::Jpeg),
            image::ImageFormat::Png => Some(Self::Png),
            image::ImageFormat::WebP => Some(Self::WebP),
            image::ImageFormat::Gif => Some(Self::Gif),
            _ => None,
        }
    }
}

impl fmt::Display for ImageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageType {
    type Err = ImageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ImageType::Jpeg),
            "png" => Ok(ImageType::Png),
            "webp" => Ok(ImageType::WebP),
            "gif" => Ok(ImageType::Gif),
            _ => Err(ImageError::unsupported_format(s)),
        }
    }
}

/// Immutable image bytes together with their declared type.
///
/// Cloning is cheap: the bytes are reference counted.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    data: Bytes,
    image_type: ImageType,
}

impl ImageData {
    /// Wrap bytes with an already known type. The bytes are not inspected.
    pub fn new(data: impl Into<Bytes>, image_type: ImageType) -> Self {
        Self {
            data: data.into(),
            image_type,
        }
    }

    /// Wrap bytes, detecting the type from the magic bytes.
    pub fn from_bytes(data: impl Into<Bytes>) -> Result<Self, ImageError> {
        let data = data.into();
        let format = image::guess_format(&data)
            .map_err(|e| ImageError::unsupported_format(e.to_string()))?;
        let image_type = ImageType::from_image_format(format)
            .ok_or_else(|| ImageError::unsupported_format(format!("{:?}", format)))?;

        Ok(Self { data, image_type })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn image_type(&self) -> ImageType {
        self.image_type
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl fmt::Debug for ImageData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageData")
            .field("len", &self.data.len())
            .field("image_type", &self.image_type)
            .finish()
    }
}
