use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::editor::tools::{BlurOptions, CropOptions, ResizeOptions};
use crate::render::{ExportFormat, ExportFormatKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "retouch";
const APP_CONFIG_FILE: &str = "config.json";

/// Editor settings from `config.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history_capacity: usize,
    pub crop_padding: f64,
    pub min_display_width: f64,
    pub brush_radius: f64,
    pub blur_strength: f32,
    pub resize_min_size: f64,
    pub keep_aspect_ratio: bool,
    pub export_format: ExportFormatKind,
    pub jpeg_quality: u8,
    pub media_dir: Option<PathBuf>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: crate::history::DEFAULT_HISTORY_CAPACITY,
            crop_padding: crate::editor::tools::DEFAULT_CROP_PADDING,
            min_display_width: 300.0,
            brush_radius: 20.0,
            blur_strength: 8.0,
            resize_min_size: 32.0,
            keep_aspect_ratio: true,
            export_format: ExportFormatKind::Png,
            jpeg_quality: 90,
            media_dir: None,
        }
    }
}

impl EditorConfig {
    pub fn crop_options(&self) -> CropOptions {
        CropOptions {
            padding: self.crop_padding.max(0.0),
        }
    }

    pub fn resize_options(&self) -> ResizeOptions {
        ResizeOptions {
            min_size: self.resize_min_size,
            keep_aspect_ratio: self.keep_aspect_ratio,
        }
    }

    pub fn blur_options(&self) -> BlurOptions {
        BlurOptions {
            brush_radius: self.brush_radius.max(0.0),
            strength: self.blur_strength.max(0.0),
        }
    }

    pub fn export_format(&self) -> ExportFormat {
        ExportFormat::from_kind(self.export_format, self.jpeg_quality)
    }
}

pub fn load_editor_config() -> EditorConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_editor_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_editor_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> EditorConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return EditorConfig::default(),
    };
    load_editor_config_from(&path)
}

pub fn load_editor_config_from(path: &Path) -> EditorConfig {
    if !path.exists() {
        return EditorConfig::default();
    }
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            EditorConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            EditorConfig::default()
        }
    }
}

pub(crate) fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub(crate) fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}
