//! Crop region state machine.
//!
//! `CropState` is a small `Copy` value and every transition consumes it and
//! returns the next state, so gestures can be replayed deterministically
//! without a pointer device.

use eframe::egui::{Pos2, Vec2};

use crate::{
    aspect::AspectRatio,
    error::Result,
    geometry::{CropRect, ImageSize},
    hit_test::{Corner, HitResult},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DragState {
    Idle,
    /// Whole-region move; `offset` is pointer minus rectangle origin at drag start.
    Moving { offset: Vec2 },
    Resizing { corner: Corner },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum CropEvent {
    Begin { hit: HitResult, pos: Pos2 },
    Update { pos: Pos2 },
    End,
    ChangeAspectRatio(AspectRatio),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropState {
    pub image: ImageSize,
    pub rect: CropRect,
    pub aspect: AspectRatio,
    pub drag: DragState,
}

impl CropState {
    /// Starts idle with the largest centered rectangle for `aspect`.
    pub fn new(image: ImageSize, aspect: AspectRatio) -> Result<Self> {
        image.ensure_nonempty()?;
        Ok(Self {
            image,
            rect: aspect.centered_rect(image),
            aspect,
            drag: DragState::Idle,
        })
    }

    pub fn is_dragging(&self) -> bool {
        self.drag != DragState::Idle
    }

    pub fn apply(self, event: CropEvent) -> Self {
        match event {
            CropEvent::Begin { hit, pos } => self.begin(hit, pos),
            CropEvent::Update { pos } => self.update(pos),
            CropEvent::End => self.end(),
            CropEvent::ChangeAspectRatio(ratio) => self.change_aspect_ratio(ratio),
        }
    }

    /// Enters a dragging state. Ignored while another gesture is active.
    pub fn begin(mut self, hit: HitResult, pos: Pos2) -> Self {
        if self.is_dragging() {
            return self;
        }
        self.drag = match hit {
            HitResult::Move => DragState::Moving {
                offset: pos - self.rect.origin(),
            },
            HitResult::Corner(corner) => DragState::Resizing { corner },
            HitResult::None => DragState::Idle,
        };
        self
    }

    /// Moves or resizes the rectangle towards `pos`. No-op when idle.
    pub fn update(mut self, pos: Pos2) -> Self {
        let next = match self.drag {
            DragState::Idle => return self,
            DragState::Moving { offset } => {
                let origin = pos - offset;
                CropRect {
                    x: origin.x,
                    y: origin.y,
                    ..self.rect
                }
            }
            DragState::Resizing { corner } => {
                resize_from_corner(self.rect, corner, pos, self.image, self.aspect.ratio())
            }
        };
        self.rect = next.clamp_to(self.image);
        self
    }

    pub fn end(mut self) -> Self {
        self.drag = DragState::Idle;
        self
    }

    /// Replaces the rectangle with the largest centered one for `ratio`.
    /// Only honoured while idle.
    pub fn change_aspect_ratio(mut self, ratio: AspectRatio) -> Self {
        if self.is_dragging() {
            return self;
        }
        self.aspect = ratio;
        self.rect = ratio.centered_rect(self.image);
        self
    }
}

/// Resizes `rect` by moving `corner` to `pointer` while the opposite corner
/// stays put.
///
/// Minimum size is applied first, then the ratio (width primary), then the
/// room left between the fixed corner and the image edge.
fn resize_from_corner(
    rect: CropRect,
    corner: Corner,
    pointer: Pos2,
    image: ImageSize,
    ratio: Option<f32>,
) -> CropRect {
    let fixed = corner.opposite().of(&rect);
    let (min_w, min_h) = image.min_extent();
    let west = corner.is_west();
    let north = corner.is_north();

    let max_w = if west { fixed.x } else { image.w() - fixed.x };
    let max_h = if north { fixed.y } else { image.h() - fixed.y };

    let mut width = (if west { fixed.x - pointer.x } else { pointer.x - fixed.x }).max(min_w);
    let mut height = (if north { fixed.y - pointer.y } else { pointer.y - fixed.y }).max(min_h);

    match ratio {
        Some(ratio) => {
            height = width / ratio;
            if height < min_h {
                height = min_h;
                width = height * ratio;
            }
            if width > max_w {
                width = max_w;
                height = width / ratio;
            }
            if height > max_h {
                height = max_h;
                width = height * ratio;
            }
        }
        None => {
            width = width.min(max_w);
            height = height.min(max_h);
        }
    }

    CropRect {
        x: if west { fixed.x - width } else { fixed.x },
        y: if north { fixed.y - height } else { fixed.y },
        width,
        height,
    }
}
