//! Pixel extraction from the editing surface.
//!
//! The editor never probes for optional export hooks: anything that can turn
//! a surface into bytes implements [`RenderSurface`] and reports
//! [`ExtractionError`] when it cannot.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, ImageFormat, RgbaImage};
use serde::Deserialize;
use thiserror::Error;

use crate::editor::ImageSurface;

const DEFAULT_JPEG_QUALITY: u8 = 90;

#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("surface is tainted by cross-origin content and cannot be read back")]
    Tainted,
    #[error("surface has no pixels to extract ({width}x{height})")]
    EmptyFrame { width: u32, height: u32 },
    #[error("failed to encode {format} image: {source}")]
    Encode {
        format: &'static str,
        #[source]
        source: image::ImageError,
    },
}

pub type RenderResult<T> = std::result::Result<T, ExtractionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormatKind {
    #[default]
    Png,
    Jpeg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg { quality: u8 },
}

impl ExportFormat {
    pub fn from_kind(kind: ExportFormatKind, jpeg_quality: u8) -> Self {
        match kind {
            ExportFormatKind::Png => Self::Png,
            ExportFormatKind::Jpeg => Self::Jpeg {
                quality: jpeg_quality.clamp(1, 100),
            },
        }
    }

    /// Picks a format from a file extension; unknown extensions fall back to PNG.
    pub fn from_extension(extension: &str) -> Self {
        match extension.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Self::Jpeg {
                quality: DEFAULT_JPEG_QUALITY,
            },
            _ => Self::Png,
        }
    }

    pub const fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg { .. } => "image/jpeg",
        }
    }

    pub const fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpg",
        }
    }

    const fn label(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg { .. } => "jpeg",
        }
    }
}

/// Encoded output of one extraction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub format: ExportFormat,
    pub width: u32,
    pub height: u32,
}

impl EncodedImage {
    pub const fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

pub trait RenderSurface {
    fn extract(&self, surface: &ImageSurface) -> RenderResult<EncodedImage>;
}

/// CPU renderer: composites the surface at display size and encodes it.
#[derive(Debug, Clone, Copy, Default)]
pub struct RasterRenderer {
    format: ExportFormat,
}

impl RasterRenderer {
    pub const fn new(format: ExportFormat) -> Self {
        Self { format }
    }

    pub const fn format(&self) -> ExportFormat {
        self.format
    }
}

impl RenderSurface for RasterRenderer {
    fn extract(&self, surface: &ImageSurface) -> RenderResult<EncodedImage> {
        if surface.is_tainted() {
            return Err(ExtractionError::Tainted);
        }
        let frame = surface.render_frame();
        let bytes = encode_image(&frame, self.format)?;
        Ok(EncodedImage {
            bytes,
            format: self.format,
            width: frame.width(),
            height: frame.height(),
        })
    }
}

pub fn encode_image(image: &RgbaImage, format: ExportFormat) -> RenderResult<Vec<u8>> {
    if image.width() == 0 || image.height() == 0 {
        return Err(ExtractionError::EmptyFrame {
            width: image.width(),
            height: image.height(),
        });
    }

    let mut bytes = Vec::new();
    let result = match format {
        ExportFormat::Png => image.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png),
        ExportFormat::Jpeg { quality } => {
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            JpegEncoder::new_with_quality(&mut bytes, quality).encode_image(&rgb)
        }
    };
    result.map_err(|source| ExtractionError::Encode {
        format: format.label(),
        source,
    })?;
    Ok(bytes)
}
