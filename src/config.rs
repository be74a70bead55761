//! Persisted cropper settings.
//!
//! Settings are stored as pretty-printed JSON. Every field has a default so
//! partial files load cleanly.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{LevelFilter, debug};
use serde::{Deserialize, Serialize};

use crate::{
    aspect::AspectRatio,
    error::{CropError, Result},
};

/// Environment variable naming the settings file used by the desktop app.
pub const SETTINGS_ENV: &str = "CROP_STUDIO_SETTINGS";
const DEFAULT_SETTINGS_FILE: &str = "crop_studio_settings.json";

/// Colours and sizes for the crop overlay, in canvas pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayStyle {
    /// RGBA, painted over everything outside the crop window.
    pub mask_color: [u8; 4],
    pub border_color: [u8; 4],
    pub border_width: u32,
    pub grid_color: [u8; 4],
    pub handle_size: u32,
    pub handle_fill: [u8; 4],
    pub handle_stroke: [u8; 4],
}

impl Default for OverlayStyle {
    fn default() -> Self {
        Self {
            mask_color: [0, 0, 0, 128],
            border_color: [255, 255, 255, 255],
            border_width: 2,
            grid_color: [255, 255, 255, 179],
            handle_size: 10,
            handle_fill: [255, 255, 255, 255],
            handle_stroke: [0, 0, 0, 255],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CropperSettings {
    pub default_aspect_ratio: AspectRatio,
    /// Handle hit radius in canvas pixels.
    pub handle_tolerance: f32,
    /// Longest edge of the canvas backing buffer. Images are never upscaled.
    pub max_canvas_edge: u32,
    pub overlay: OverlayStyle,
    pub log_level: String,
}

impl Default for CropperSettings {
    fn default() -> Self {
        Self {
            default_aspect_ratio: AspectRatio::Original,
            handle_tolerance: 20.0,
            max_canvas_edge: 1600,
            overlay: OverlayStyle::default(),
            log_level: "info".to_owned(),
        }
    }
}

impl CropperSettings {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|err| {
            CropError::Settings(format!("failed to read {}: {err}", path.display()))
        })?;
        serde_json::from_str(&text).map_err(|err| {
            CropError::Settings(format!("failed to parse {}: {err}", path.display()))
        })
    }

    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}; using defaults", path.display());
            return Ok(Self::default());
        }
        Self::load(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)
            .map_err(|err| CropError::Settings(format!("failed to serialize settings: {err}")))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                CropError::Settings(format!("failed to create {}: {err}", parent.display()))
            })?;
        }
        fs::write(path, text).map_err(|err| {
            CropError::Settings(format!("failed to write {}: {err}", path.display()))
        })
    }

    /// Parsed log level; unknown names fall back to `Info`.
    pub fn log_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}

/// Settings path from [`SETTINGS_ENV`], or a file in the working directory.
pub fn default_settings_path() -> PathBuf {
    std::env::var_os(SETTINGS_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_FILE))
}
