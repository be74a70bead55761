//! Pixel-exact extraction of the committed crop.

use std::{fs, path::Path};

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use image::{
    ExtendedColorType, ImageEncoder, RgbaImage,
    codecs::png::{CompressionType, FilterType, PngEncoder},
    imageops,
};
use log::debug;

use crate::{
    error::{CropError, Result},
    geometry::CropRect,
    source::SourceImage,
};

/// Output of a successful commit.
#[derive(Debug, Clone, PartialEq)]
pub struct CroppedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: RgbaImage,
    /// PNG encoding of `pixels`.
    pub png: Vec<u8>,
}

impl CroppedImage {
    pub fn to_data_uri(&self) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(&self.png))
    }

    /// Writes the PNG bytes to `path`.
    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, &self.png).map_err(|err| {
            CropError::RasterizationFailure(format!("failed to write {}: {err}", path.display()))
        })
    }
}

/// Copies `rect` out of `source` at 1:1 scale and encodes it as PNG.
pub fn rasterize(source: &SourceImage, rect: &CropRect) -> Result<CroppedImage> {
    let region = rect.to_pixels(source.size())?;
    let pixels = imageops::crop_imm(
        source.pixels(),
        region.x,
        region.y,
        region.width,
        region.height,
    )
    .to_image();

    let png = encode_png(&pixels)?;
    debug!(
        "Rasterized {}x{} crop at ({}, {}) into {} PNG bytes",
        region.width,
        region.height,
        region.x,
        region.y,
        png.len()
    );
    Ok(CroppedImage {
        width: region.width,
        height: region.height,
        pixels,
        png,
    })
}

fn encode_png(pixels: &RgbaImage) -> Result<Vec<u8>> {
    let mut png = Vec::new();
    PngEncoder::new_with_quality(&mut png, CompressionType::Default, FilterType::Adaptive)
        .write_image(
            pixels.as_raw(),
            pixels.width(),
            pixels.height(),
            ExtendedColorType::Rgba8,
        )
        .map_err(|err| CropError::RasterizationFailure(err.to_string()))?;
    Ok(png)
}
