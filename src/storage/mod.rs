use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Serialize;
use thiserror::Error;

const MEDIA_SUBDIR: &str = "Pictures/retouch";
const CACHE_BUST_PARAM: &str = "t";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("missing HOME environment variable")]
    MissingHomeDirectory,
    #[error("upload has no bytes")]
    EmptyUpload,
    #[error("system clock is before the unix epoch")]
    ClockSkew,
    #[error("failed to write media metadata: {0}")]
    Metadata(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Encoded image plus the caption metadata handed over on save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaUpload {
    pub bytes: Vec<u8>,
    pub mime: String,
    pub caption: Option<String>,
    pub alt_text: Option<String>,
}

/// Persists uploads and returns a locator for the stored resource.
pub trait MediaStorage {
    fn store(&self, upload: &MediaUpload) -> StorageResult<String>;
}

#[derive(Debug, Serialize)]
struct MediaSidecar<'a> {
    mime: &'a str,
    caption: Option<&'a str>,
    alt_text: Option<&'a str>,
    size: usize,
}

/// Writes `<id>.<ext>` and a `<id>.json` sidecar into one directory.
#[derive(Debug, Clone)]
pub struct FileMediaStorage {
    media_dir: PathBuf,
}

impl FileMediaStorage {
    pub fn with_paths(media_dir: PathBuf) -> Self {
        Self { media_dir }
    }

    pub fn with_default_paths() -> StorageResult<Self> {
        let home = std::env::var("HOME").map_err(|_| StorageError::MissingHomeDirectory)?;
        let mut media_dir = PathBuf::from(home);
        media_dir.push(MEDIA_SUBDIR);
        Ok(Self::with_paths(media_dir))
    }

    pub fn media_dir(&self) -> &Path {
        &self.media_dir
    }

    fn allocate_id() -> StorageResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| StorageError::ClockSkew)?;
        Ok(format!("image-{}", now.as_nanos()))
    }
}

impl MediaStorage for FileMediaStorage {
    fn store(&self, upload: &MediaUpload) -> StorageResult<String> {
        if upload.bytes.is_empty() {
            return Err(StorageError::EmptyUpload);
        }
        fs::create_dir_all(&self.media_dir)?;

        let id = Self::allocate_id()?;
        let target = self
            .media_dir
            .join(format!("{id}.{}", extension_for_mime(&upload.mime)));
        fs::write(&target, &upload.bytes)?;

        let sidecar = MediaSidecar {
            mime: &upload.mime,
            caption: upload.caption.as_deref(),
            alt_text: upload.alt_text.as_deref(),
            size: upload.bytes.len(),
        };
        let sidecar_path = self.media_dir.join(format!("{id}.json"));
        fs::write(&sidecar_path, serde_json::to_vec_pretty(&sidecar)?)?;

        tracing::info!(path = %target.display(), "media stored");
        Ok(format!("file://{}", target.display()))
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        _ => "bin",
    }
}

/// Appends (or replaces) a `t=<millis>` query parameter so hosts reload
/// the image instead of showing a cached copy.
pub fn cache_busted_locator(locator: &str, unix_millis: u128) -> String {
    let (base, query) = match locator.split_once('?') {
        Some((base, query)) => (base, Some(query)),
        None => (locator, None),
    };
    let mut params: Vec<&str> = query
        .into_iter()
        .flat_map(|query| query.split('&'))
        .filter(|param| !param.is_empty() && param.split('=').next() != Some(CACHE_BUST_PARAM))
        .collect();
    let stamp = format!("{CACHE_BUST_PARAM}={unix_millis}");
    params.push(&stamp);
    format!("{base}?{}", params.join("&"))
}
