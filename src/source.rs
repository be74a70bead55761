//! Source bitmaps and background decoding.

use std::{
    path::PathBuf,
    sync::{Arc, mpsc},
};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{DynamicImage, RgbaImage};
use log::{error, info};

use crate::{
    error::{CropError, Result},
    geometry::ImageSize,
};

/// Immutable decoded bitmap bound to a crop session.
#[derive(Debug)]
pub struct SourceImage {
    pixels: RgbaImage,
}

impl SourceImage {
    pub fn new(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self::new(image.into_rgba8())
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.pixels.width(), self.pixels.height())
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }
}

/// Where a source image comes from.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    /// `data:image/<fmt>;base64,<payload>`
    DataUri(String),
}

impl ImageSource {
    pub fn describe(&self) -> String {
        match self {
            ImageSource::Path(path) => path.display().to_string(),
            ImageSource::Bytes(bytes) => format!("{} in-memory bytes", bytes.len()),
            ImageSource::DataUri(uri) => format!("data URI ({} chars)", uri.len()),
        }
    }

    pub fn decode(&self) -> Result<SourceImage> {
        let image = match self {
            ImageSource::Path(path) => image::open(path)
                .map_err(|err| CropError::load(format!("{}: {err}", path.display())))?,
            ImageSource::Bytes(bytes) => {
                image::load_from_memory(bytes).map_err(CropError::load)?
            }
            ImageSource::DataUri(uri) => {
                let bytes = decode_data_uri(uri)?;
                image::load_from_memory(&bytes).map_err(CropError::load)?
            }
        };
        Ok(SourceImage::from_dynamic(image))
    }
}

fn decode_data_uri(uri: &str) -> Result<Vec<u8>> {
    let rest = uri
        .strip_prefix("data:")
        .ok_or_else(|| CropError::load("data URI must start with 'data:'"))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| CropError::load("data URI has no payload"))?;
    if !header.ends_with(";base64") {
        return Err(CropError::load("only base64 data URIs are supported"));
    }
    BASE64
        .decode(payload.trim())
        .map_err(|err| CropError::load(format!("invalid base64 payload: {err}")))
}

/// Result of one background decode, tagged with the request generation.
#[derive(Debug)]
pub struct LoadMessage {
    pub generation: u64,
    pub result: Result<Arc<SourceImage>>,
}

/// Decodes `source` on the rayon pool and posts the result to `tx`.
pub fn spawn_load(source: ImageSource, generation: u64, tx: mpsc::Sender<LoadMessage>) {
    info!("Loading image {} (generation {generation})", source.describe());
    rayon::spawn(move || {
        let result = source.decode().map(Arc::new);
        if tx.send(LoadMessage { generation, result }).is_err() {
            error!("Dropped load result for generation {generation}; receiver closed");
        }
    });
}
