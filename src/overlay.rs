//! Crop overlay painting.
//!
//! The overlay is a pure projection of `(source, rect, canvas size)`. Every
//! call repaints the whole canvas; only the letterboxed copy of the source is
//! cached, since it depends on nothing but the image and the canvas size.

use image::{
    Pixel, Rgba, RgbaImage,
    imageops::{self, FilterType},
};
use imageproc::{
    drawing::{Blend, draw_filled_rect_mut, draw_hollow_rect_mut, draw_line_segment_mut},
    rect::Rect,
};
use log::debug;

use crate::{
    config::OverlayStyle,
    geometry::{CanvasSize, CropRect, ImageSize},
    mapper::LetterboxFit,
    source::SourceImage,
};

/// Renders the overlay into a fresh canvas.
pub fn render_overlay(
    source: &SourceImage,
    rect: &CropRect,
    canvas: CanvasSize,
    style: &OverlayStyle,
) -> RgbaImage {
    let fit = LetterboxFit::compute(source.size(), canvas);
    let base = letterbox(source, canvas, &fit);
    paint_overlay(base, &fit, rect, style)
}

/// Owns the canvas backing buffer between repaints.
#[derive(Default)]
pub struct OverlayRenderer {
    canvas: RgbaImage,
    base: Option<(ImageSize, CanvasSize, RgbaImage)>,
}

impl OverlayRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops the cached letterboxed image. Call when the source changes.
    pub fn reset(&mut self) {
        self.base = None;
        self.canvas = RgbaImage::default();
    }

    pub fn canvas(&self) -> &RgbaImage {
        &self.canvas
    }

    pub fn render(
        &mut self,
        source: &SourceImage,
        rect: &CropRect,
        canvas: CanvasSize,
        style: &OverlayStyle,
    ) -> &RgbaImage {
        let fit = LetterboxFit::compute(source.size(), canvas);
        let stale = !matches!(&self.base, Some((image, size, _)) if *image == source.size() && *size == canvas);
        if stale {
            debug!(
                "Fitting {}x{} image into {}x{} canvas",
                source.size().width,
                source.size().height,
                canvas.width,
                canvas.height
            );
            self.base = Some((source.size(), canvas, letterbox(source, canvas, &fit)));
        }
        let base = match &self.base {
            Some((_, _, base)) => base.clone(),
            None => RgbaImage::new(canvas.width, canvas.height),
        };
        self.canvas = paint_overlay(base, &fit, rect, style);
        &self.canvas
    }
}

/// Source scaled into a transparent canvas at the letterbox offset.
fn letterbox(source: &SourceImage, canvas: CanvasSize, fit: &LetterboxFit) -> RgbaImage {
    let mut base = RgbaImage::new(canvas.width, canvas.height);
    if canvas.is_empty() || source.size().is_empty() {
        return base;
    }
    let draw_w = (fit.draw_size.x.round() as u32).max(1);
    let draw_h = (fit.draw_size.y.round() as u32).max(1);
    let offset_x = fit.offset.x.round() as i64;
    let offset_y = fit.offset.y.round() as i64;
    if (draw_w, draw_h) == source.pixels().dimensions() {
        imageops::replace(&mut base, source.pixels(), offset_x, offset_y);
    } else {
        let scaled = imageops::resize(source.pixels(), draw_w, draw_h, FilterType::Triangle);
        imageops::replace(&mut base, &scaled, offset_x, offset_y);
    }
    base
}

/// Paints mask, border, thirds grid and corner handles over `base`.
fn paint_overlay(
    base: RgbaImage,
    fit: &LetterboxFit,
    rect: &CropRect,
    style: &OverlayStyle,
) -> RgbaImage {
    let (cw, ch) = base.dimensions();
    if cw == 0 || ch == 0 {
        return base;
    }
    let mut base = base;
    let window = fit.rect_to_canvas(rect);

    let left = window.left().round().clamp(0.0, cw as f32) as i32;
    let top = window.top().round().clamp(0.0, ch as f32) as i32;
    let right = window.right().round().clamp(0.0, cw as f32) as i32;
    let bottom = window.bottom().round().clamp(0.0, ch as f32) as i32;
    let (cw, ch) = (cw as i32, ch as i32);

    // Dim everything outside the crop window.
    let mask = Rgba(style.mask_color);
    dim_span(&mut base, (0, 0), (cw, top), mask);
    dim_span(&mut base, (0, bottom), (cw, ch), mask);
    dim_span(&mut base, (0, top), (left, bottom), mask);
    dim_span(&mut base, (right, top), (cw, bottom), mask);

    let mut canvas = Blend(base);

    let border = Rgba(style.border_color);
    let width = style.border_width as i32;
    for ring in 0..width {
        let d = ring - width / 2;
        let w = right - left - 2 * d;
        let h = bottom - top - 2 * d;
        if w > 0 && h > 0 {
            draw_hollow_rect_mut(
                &mut canvas,
                Rect::at(left + d, top + d).of_size(w as u32, h as u32),
                border,
            );
        }
    }

    let grid = Rgba(style.grid_color);
    for third in [1.0 / 3.0, 2.0 / 3.0] {
        let x = window.left() + window.width() * third;
        let y = window.top() + window.height() * third;
        draw_line_segment_mut(&mut canvas, (x, window.top()), (x, window.bottom()), grid);
        draw_line_segment_mut(&mut canvas, (window.left(), y), (window.right(), y), grid);
    }

    let size = style.handle_size.max(1);
    let half = (size / 2) as i32;
    for (cx, cy) in [
        (window.left(), window.top()),
        (window.right(), window.top()),
        (window.left(), window.bottom()),
        (window.right(), window.bottom()),
    ] {
        let glyph = Rect::at(cx.round() as i32 - half, cy.round() as i32 - half).of_size(size, size);
        draw_filled_rect_mut(&mut canvas, glyph, Rgba(style.handle_fill));
        draw_hollow_rect_mut(&mut canvas, glyph, Rgba(style.handle_stroke));
    }

    canvas.0
}

/// Blends `color` over the span. Pixels that already carry image content keep
/// their alpha; only the empty letterbox margins take the mask's alpha.
fn dim_span(image: &mut RgbaImage, min: (i32, i32), max: (i32, i32), color: Rgba<u8>) {
    let (w, h) = (max.0 - min.0, max.1 - min.1);
    if w <= 0 || h <= 0 {
        return;
    }
    for y in min.1.max(0) as u32..max.1 as u32 {
        for x in min.0.max(0) as u32..max.0 as u32 {
            let pixel = image.get_pixel_mut(x, y);
            let alpha = pixel.0[3];
            pixel.blend(&color);
            if alpha > 0 {
                pixel.0[3] = alpha;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILL: Rgba<u8> = Rgba([200, 120, 40, 255]);

    fn source(w: u32, h: u32) -> SourceImage {
        SourceImage::new(RgbaImage::from_pixel(w, h, FILL))
    }

    fn render(rect: CropRect) -> RgbaImage {
        render_overlay(
            &source(400, 300),
            &rect,
            CanvasSize::new(400, 300),
            &OverlayStyle::default(),
        )
    }

    #[test]
    fn outside_is_dimmed_and_inside_untouched() {
        let out = render(CropRect::new(100.0, 100.0, 200.0, 100.0));
        let outside = out.get_pixel(10, 10);
        assert!(outside.0[0] < FILL.0[0]);
        assert_eq!(outside.0[3], 255);
        assert_eq!(out.get_pixel(150, 120), &FILL);
    }

    #[test]
    fn every_dimmed_image_pixel_stays_opaque() {
        let out = render(CropRect::new(100.0, 100.0, 200.0, 100.0));
        for (x, y) in [(0, 0), (399, 0), (0, 299), (399, 299), (50, 150), (350, 150), (200, 50), (200, 250)] {
            let pixel = out.get_pixel(x, y);
            assert_eq!(pixel.0[3], 255, "({x}, {y})");
            assert!(pixel.0[0] < FILL.0[0], "({x}, {y})");
        }
    }

    #[test]
    fn border_and_handles_are_painted() {
        let out = render(CropRect::new(100.0, 100.0, 200.0, 100.0));
        assert_eq!(out.get_pixel(200, 100), &Rgba([255, 255, 255, 255]));
        // inside the south-east handle glyph, away from its outline
        assert_eq!(out.get_pixel(302, 202), &Rgba([255, 255, 255, 255]));
        // glyph outline
        assert_eq!(out.get_pixel(295, 203), &Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn thirds_grid_is_drawn() {
        let out = render(CropRect::new(0.0, 0.0, 300.0, 300.0));
        let on_line = out.get_pixel(100, 150);
        assert_ne!(on_line, &FILL);
        assert!(on_line.0[0] >= FILL.0[0]);
    }

    #[test]
    fn letterbox_margins_are_masked() {
        let out = render_overlay(
            &source(100, 200),
            &CropRect::new(0.0, 0.0, 100.0, 200.0),
            CanvasSize::new(400, 400),
            &OverlayStyle::default(),
        );
        assert_eq!(out.dimensions(), (400, 400));
        let margin_alpha = out.get_pixel(20, 200).0[3];
        assert!((127..=128).contains(&margin_alpha));
        let inside = out.get_pixel(200, 200);
        for (got, want) in inside.0.iter().zip(FILL.0) {
            assert!(got.abs_diff(want) <= 1);
        }
    }

    #[test]
    fn renderer_repaints_on_every_call() {
        let src = source(400, 300);
        let style = OverlayStyle::default();
        let mut renderer = OverlayRenderer::new();
        let first = renderer
            .render(&src, &CropRect::new(0.0, 0.0, 100.0, 100.0), CanvasSize::new(400, 300), &style)
            .clone();
        let second = renderer
            .render(&src, &CropRect::new(200.0, 100.0, 100.0, 100.0), CanvasSize::new(400, 300), &style)
            .clone();
        assert_ne!(first, second);
        assert_eq!(second.get_pixel(250, 120), &FILL);
        assert_ne!(second.get_pixel(50, 50), &FILL);
    }
}
