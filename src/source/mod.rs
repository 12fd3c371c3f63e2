//! Loading the image a session edits, from a URL or from raw bytes.

use std::path::{Path, PathBuf};

use image::RgbaImage;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Url(String),
    Blob(Vec<u8>),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("unsupported image url: {url}")]
    UnsupportedScheme { url: String },
    #[error("failed to fetch image: {url}")]
    Fetch {
        url: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),
    #[error("image has no pixels ({width}x{height})")]
    EmptyImage { width: u32, height: u32 },
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
    /// Content from another origin taints the surface and blocks export.
    pub cross_origin: bool,
}

pub trait ImageFetcher {
    fn fetch(&self, url: &str) -> LoadResult<FetchedImage>;
}

/// Reads `file://` URLs and bare paths. With an origin root configured,
/// files outside that directory count as cross-origin.
#[derive(Debug, Clone, Default)]
pub struct FileFetcher {
    origin: Option<PathBuf>,
}

impl FileFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_origin(origin: impl Into<PathBuf>) -> Self {
        Self {
            origin: Some(origin.into()),
        }
    }

    fn is_cross_origin(&self, path: &Path) -> bool {
        let Some(origin) = &self.origin else {
            return false;
        };
        match (path.canonicalize(), origin.canonicalize()) {
            (Ok(path), Ok(origin)) => !path.starts_with(origin),
            _ => true,
        }
    }
}

impl ImageFetcher for FileFetcher {
    fn fetch(&self, url: &str) -> LoadResult<FetchedImage> {
        let path = local_path(url).ok_or_else(|| LoadError::UnsupportedScheme {
            url: url.to_string(),
        })?;
        let bytes = std::fs::read(&path).map_err(|source| LoadError::Fetch {
            url: url.to_string(),
            source,
        })?;
        Ok(FetchedImage {
            bytes,
            cross_origin: self.is_cross_origin(&path),
        })
    }
}

fn local_path(url: &str) -> Option<PathBuf> {
    if let Some(rest) = url.strip_prefix("file://") {
        return (!rest.is_empty()).then(|| PathBuf::from(rest));
    }
    if url.is_empty() || url.contains("://") {
        return None;
    }
    Some(PathBuf::from(url))
}

/// Decoded bitmap plus whether it came from another origin.
#[derive(Debug, Clone)]
pub struct LoadedImage {
    pub bitmap: RgbaImage,
    pub tainted: bool,
}

pub fn load_image<F: ImageFetcher>(source: &ImageSource, fetcher: &F) -> LoadResult<LoadedImage> {
    let (bytes, tainted) = match source {
        ImageSource::Url(url) => {
            let fetched = fetcher.fetch(url)?;
            (fetched.bytes, fetched.cross_origin)
        }
        ImageSource::Blob(bytes) => (bytes.clone(), false),
    };
    let bitmap = decode_image(&bytes)?;
    tracing::debug!(
        width = bitmap.width(),
        height = bitmap.height(),
        tainted,
        "image loaded"
    );
    Ok(LoadedImage { bitmap, tainted })
}

pub fn decode_image(bytes: &[u8]) -> LoadResult<RgbaImage> {
    let bitmap = image::load_from_memory(bytes)
        .map_err(LoadError::Decode)?
        .to_rgba8();
    if bitmap.width() == 0 || bitmap.height() == 0 {
        return Err(LoadError::EmptyImage {
            width: bitmap.width(),
            height: bitmap.height(),
        });
    }
    Ok(bitmap)
}
