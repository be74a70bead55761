//! Rectangles and sizes expressed in image-natural pixels.

use eframe::egui::{Pos2, pos2};

use crate::error::{CropError, Result};

/// Smallest allowed crop edge in natural pixels.
pub const MIN_SIZE: f32 = 50.0;

/// Natural dimensions of a source bitmap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn w(&self) -> f32 {
        self.width as f32
    }

    pub fn h(&self) -> f32 {
        self.height as f32
    }

    pub fn ratio(&self) -> f32 {
        self.w() / self.h()
    }

    /// Returns an error when the image has no area.
    pub fn ensure_nonempty(&self) -> Result<()> {
        if self.is_empty() {
            return Err(CropError::DegenerateGeometry {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }

    /// Minimum crop extent per axis. Images narrower than [`MIN_SIZE`] cap it
    /// at their own edge so the rectangle can still fit.
    pub fn min_extent(&self) -> (f32, f32) {
        (MIN_SIZE.min(self.w()), MIN_SIZE.min(self.h()))
    }
}

/// Backing bitmap resolution of the rendering surface.
pub type CanvasSize = ImageSize;

/// Crop selection in image-natural pixels.
///
/// Floating point while a gesture is in flight; see [`CropRect::to_pixels`]
/// for the integer form used at commit time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropRect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn full(image: ImageSize) -> Self {
        Self::new(0.0, 0.0, image.w(), image.h())
    }

    pub fn origin(&self) -> Pos2 {
        pos2(self.x, self.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Strict containment; points on the border are not inside.
    pub fn contains_strict(&self, p: Pos2) -> bool {
        p.x > self.x && p.x < self.right() && p.y > self.y && p.y < self.bottom()
    }

    /// Keeps the rectangle inside the image. Position wins over size, so the
    /// rectangle never leaves the image even if that trims an exact ratio.
    pub fn clamp_to(mut self, image: ImageSize) -> Self {
        self.x = self.x.min(image.w() - self.width).max(0.0);
        self.y = self.y.min(image.h() - self.height).max(0.0);
        self.width = self.width.min(image.w() - self.x);
        self.height = self.height.min(image.h() - self.y);
        self
    }

    /// True when the rectangle satisfies every bounds and minimum-size
    /// invariant for `image`. A small epsilon absorbs float drift.
    pub fn is_valid_for(&self, image: ImageSize) -> bool {
        const EPS: f32 = 1e-3;
        let (min_w, min_h) = image.min_extent();
        self.x >= -EPS
            && self.y >= -EPS
            && self.right() <= image.w() + EPS
            && self.bottom() <= image.h() + EPS
            && self.width >= min_w - EPS
            && self.height >= min_h - EPS
    }

    /// Integer form used by the rasterizer: width and height are floored and
    /// the origin is clamped so the region stays inside the image.
    pub fn to_pixels(&self, image: ImageSize) -> Result<PixelRect> {
        image.ensure_nonempty()?;
        let width = (self.width.max(0.0).floor() as u32).min(image.width);
        let height = (self.height.max(0.0).floor() as u32).min(image.height);
        if width == 0 || height == 0 {
            return Err(CropError::DegenerateGeometry { width, height });
        }
        let x = (self.x.max(0.0).floor() as u32).min(image.width - width);
        let y = (self.y.max(0.0).floor() as u32).min(image.height - height);
        Ok(PixelRect {
            x,
            y,
            width,
            height,
        })
    }
}

/// Integer crop region, always non-empty and inside its image.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}
