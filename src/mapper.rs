//! Coordinate transformations between display, canvas and image space.
//!
//! Pointer events arrive in display pixels (the on-screen size of the canvas),
//! the overlay is painted in canvas pixels (the backing bitmap), and all crop
//! geometry lives in image-natural pixels. Nothing here mutates state; zero
//! sized inputs return the position unchanged.

use eframe::egui::{Pos2, Rect, Vec2, pos2, vec2};

use crate::geometry::{CanvasSize, CropRect, ImageSize};

/// Letterbox placement of the image inside the canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LetterboxFit {
    /// Canvas pixels per natural pixel.
    pub scale: f32,
    /// Top-left of the drawn image in canvas pixels.
    pub offset: Vec2,
    /// Size of the drawn image in canvas pixels.
    pub draw_size: Vec2,
}

impl LetterboxFit {
    pub fn compute(image: ImageSize, canvas: CanvasSize) -> Self {
        if image.is_empty() || canvas.is_empty() {
            return Self::identity();
        }
        let scale = (canvas.w() / image.w()).min(canvas.h() / image.h());
        let draw_size = vec2(image.w() * scale, image.h() * scale);
        let offset = vec2(
            (canvas.w() - draw_size.x) / 2.0,
            (canvas.h() - draw_size.y) / 2.0,
        );
        Self {
            scale,
            offset,
            draw_size,
        }
    }

    pub fn identity() -> Self {
        Self {
            scale: 1.0,
            offset: Vec2::ZERO,
            draw_size: Vec2::ZERO,
        }
    }

    pub fn canvas_to_image(&self, pos: Pos2) -> Pos2 {
        if self.scale <= 0.0 {
            return pos;
        }
        ((pos - self.offset).to_vec2() / self.scale).to_pos2()
    }

    pub fn image_to_canvas(&self, pos: Pos2) -> Pos2 {
        pos2(
            pos.x.mul_add(self.scale, self.offset.x),
            pos.y.mul_add(self.scale, self.offset.y),
        )
    }

    /// Projects a crop rectangle into canvas space. The result is derived and
    /// never stored as state.
    pub fn rect_to_canvas(&self, rect: &CropRect) -> Rect {
        Rect::from_min_size(
            self.image_to_canvas(rect.origin()),
            vec2(rect.width * self.scale, rect.height * self.scale),
        )
    }

    /// Converts a length in canvas pixels to natural pixels.
    pub fn canvas_len_to_image(&self, len: f32) -> f32 {
        if self.scale <= 0.0 { len } else { len / self.scale }
    }
}

/// Scales a display-space position into canvas-pixel space.
pub fn display_to_canvas(pos: Pos2, displayed: Vec2, canvas: CanvasSize) -> Pos2 {
    if displayed.x <= 0.0 || displayed.y <= 0.0 || canvas.is_empty() {
        return pos;
    }
    pos2(
        pos.x * canvas.w() / displayed.x,
        pos.y * canvas.h() / displayed.y,
    )
}

/// Full display → natural mapping for one canvas/image pairing.
///
/// Rebuild it whenever the canvas is resized or the image changes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoordinateMapper {
    pub canvas: CanvasSize,
    pub fit: LetterboxFit,
}

impl CoordinateMapper {
    pub fn new(image: ImageSize, canvas: CanvasSize) -> Self {
        Self {
            canvas,
            fit: LetterboxFit::compute(image, canvas),
        }
    }

    pub fn display_to_image(&self, pos: Pos2, displayed: Vec2) -> Pos2 {
        self.fit
            .canvas_to_image(display_to_canvas(pos, displayed, self.canvas))
    }
}

/// Canvas size for an image whose longest edge is capped at `max_edge`.
/// Images are never scaled up.
pub fn canvas_size_for(image: ImageSize, max_edge: u32) -> CanvasSize {
    let longest = image.width.max(image.height);
    if max_edge == 0 || longest <= max_edge {
        return image;
    }
    let scale = max_edge as f32 / longest as f32;
    CanvasSize::new(
        ((image.w() * scale).round() as u32).max(1),
        ((image.h() * scale).round() as u32).max(1),
    )
}
