//! Modal crop session.
//!
//! A session is bound to one source image at a time. It accepts pointer input
//! in display pixels, runs it through the coordinate mapper and the crop state
//! machine, repaints the overlay on demand and rasterizes on commit.

use std::sync::{Arc, mpsc};

use eframe::egui::{Pos2, Vec2};
use image::RgbaImage;
use log::{debug, info, warn};

use crate::{
    aspect::AspectRatio,
    config::CropperSettings,
    error::{CropError, Result},
    geometry::{CanvasSize, CropRect},
    hit_test::{HitResult, hit_test},
    mapper::{CoordinateMapper, canvas_size_for},
    overlay::OverlayRenderer,
    rasterize::{CroppedImage, rasterize},
    source::{ImageSource, LoadMessage, SourceImage, spawn_load},
    state::CropState,
};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionPhase {
    /// Waiting for the decode tagged `generation`. A fresh session waits on
    /// generation 0 until an image is supplied.
    Loading { generation: u64 },
    Ready,
    Failed(CropError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    Applied,
    Failed(CropError),
    /// Superseded by a newer request and ignored.
    Stale,
}

pub struct CropSession {
    settings: CropperSettings,
    aspect: AspectRatio,
    generation: u64,
    phase: SessionPhase,
    source: Option<Arc<SourceImage>>,
    state: Option<CropState>,
    canvas: CanvasSize,
    renderer: OverlayRenderer,
    dirty: bool,
}

impl CropSession {
    /// Creates a session with no image yet.
    pub fn new(settings: CropperSettings, aspect: AspectRatio) -> Self {
        Self {
            settings,
            aspect,
            generation: 0,
            phase: SessionPhase::Loading { generation: 0 },
            source: None,
            state: None,
            canvas: CanvasSize::new(0, 0),
            renderer: OverlayRenderer::new(),
            dirty: true,
        }
    }

    /// Opens a session over an already decoded image.
    pub fn open(
        source: Arc<SourceImage>,
        aspect: AspectRatio,
        settings: CropperSettings,
    ) -> Result<Self> {
        let mut session = Self::new(settings, aspect);
        session.install(source)?;
        Ok(session)
    }

    /// Starts a new load generation. Results of earlier generations become stale.
    pub fn begin_load(&mut self) -> u64 {
        self.generation += 1;
        self.phase = SessionPhase::Loading {
            generation: self.generation,
        };
        self.source = None;
        self.state = None;
        self.renderer.reset();
        self.dirty = true;
        self.generation
    }

    /// Begins a load and decodes `source` in the background.
    pub fn load(&mut self, source: ImageSource, tx: mpsc::Sender<LoadMessage>) -> u64 {
        let generation = self.begin_load();
        spawn_load(source, generation, tx);
        generation
    }

    /// Applies a finished decode if it belongs to the latest request.
    pub fn finish_load(&mut self, message: LoadMessage) -> LoadOutcome {
        let awaiting = match self.phase {
            SessionPhase::Loading { generation } => Some(generation),
            _ => None,
        };
        if awaiting != Some(message.generation) {
            warn!(
                "Ignoring stale image load (generation {}, current {})",
                message.generation, self.generation
            );
            return LoadOutcome::Stale;
        }

        match message.result.and_then(|source| self.install(source)) {
            Ok(()) => LoadOutcome::Applied,
            Err(err) => {
                warn!("Image load failed: {err}");
                self.phase = SessionPhase::Failed(err.clone());
                LoadOutcome::Failed(err)
            }
        }
    }

    fn install(&mut self, source: Arc<SourceImage>) -> Result<()> {
        let size = source.size();
        let state = CropState::new(size, self.aspect)?;
        self.canvas = canvas_size_for(size, self.settings.max_canvas_edge);
        info!(
            "Crop session ready on {}x{} image ({} canvas {}x{})",
            size.width, size.height, self.aspect, self.canvas.width, self.canvas.height
        );
        self.state = Some(state);
        self.source = Some(source);
        self.renderer.reset();
        self.phase = SessionPhase::Ready;
        self.dirty = true;
        Ok(())
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    pub fn crop_rect(&self) -> Option<CropRect> {
        self.state.map(|s| s.rect)
    }

    pub fn aspect_ratio(&self) -> AspectRatio {
        self.aspect
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_some_and(|s| s.is_dragging())
    }

    pub fn canvas_size(&self) -> CanvasSize {
        self.canvas
    }

    /// Resizes the canvas backing buffer. Triggers a repaint.
    pub fn set_canvas_size(&mut self, canvas: CanvasSize) {
        if canvas != self.canvas {
            self.canvas = canvas;
            self.dirty = true;
        }
    }

    fn mapper(&self) -> Option<CoordinateMapper> {
        let state = self.state.as_ref()?;
        Some(CoordinateMapper::new(state.image, self.canvas))
    }

    /// Handle radius in natural pixels.
    ///
    /// A downscaled canvas widens the zone, but never past a quarter of the
    /// rectangle's short side (or the configured radius, whichever is larger),
    /// so the centre of a small rectangle still moves it.
    fn handle_tolerance(&self, mapper: &CoordinateMapper, rect: &CropRect) -> f32 {
        let tolerance = self.settings.handle_tolerance;
        let scaled = mapper.fit.canvas_len_to_image(tolerance);
        scaled.min(tolerance.max(rect.width.min(rect.height) / 4.0))
    }

    /// Starts a gesture. A second pointer-down during a gesture is ignored.
    pub fn pointer_down(&mut self, pos: Pos2, displayed: Vec2) -> HitResult {
        let Some(mapper) = self.mapper() else {
            return HitResult::None;
        };
        let Some(state) = self.state else {
            return HitResult::None;
        };
        if state.is_dragging() {
            debug!("Ignoring pointer-down during an active gesture");
            return HitResult::None;
        }

        let natural = mapper.display_to_image(pos, displayed);
        let tolerance = self.handle_tolerance(&mapper, &state.rect);
        let hit = hit_test(natural, &state.rect, tolerance);
        debug!("Pointer down at ({:.1}, {:.1}) -> {hit:?}", natural.x, natural.y);
        self.state = Some(state.begin(hit, natural));
        hit
    }

    /// Continues the active gesture. Returns `true` if the rectangle changed.
    pub fn pointer_move(&mut self, pos: Pos2, displayed: Vec2) -> bool {
        let (Some(mapper), Some(state)) = (self.mapper(), self.state) else {
            return false;
        };
        if !state.is_dragging() {
            return false;
        }
        let next = state.update(mapper.display_to_image(pos, displayed));
        let changed = next.rect != state.rect;
        self.state = Some(next);
        self.dirty |= changed;
        changed
    }

    pub fn pointer_up(&mut self) {
        if let Some(state) = self.state {
            if state.is_dragging() {
                let rect = state.rect;
                debug!(
                    "Gesture ended at {{{:.1}, {:.1}, {:.1}, {:.1}}}",
                    rect.x, rect.y, rect.width, rect.height
                );
            }
            self.state = Some(state.end());
        }
    }

    /// Switches the ratio and recenters the rectangle. Ignored mid-gesture.
    pub fn change_aspect_ratio(&mut self, ratio: AspectRatio) {
        if self.is_dragging() {
            debug!("Ignoring aspect ratio change to {ratio} during a gesture");
            return;
        }
        self.aspect = ratio;
        if let Some(state) = self.state {
            self.state = Some(state.change_aspect_ratio(ratio));
        }
        self.dirty = true;
    }

    pub fn needs_repaint(&self) -> bool {
        self.dirty
    }

    /// Returns the overlay canvas, repainting it first if state changed.
    pub fn render(&mut self) -> Option<&RgbaImage> {
        let (Some(source), Some(state)) = (self.source.as_ref(), self.state.as_ref()) else {
            return None;
        };
        if self.dirty {
            self.renderer
                .render(source, &state.rect, self.canvas, &self.settings.overlay);
            self.dirty = false;
        }
        Some(self.renderer.canvas())
    }

    /// Rasterizes the current rectangle. On failure the session stays open.
    pub fn commit(&self) -> Result<CroppedImage> {
        match &self.phase {
            SessionPhase::Failed(err) => return Err(err.clone()),
            SessionPhase::Loading { .. } => return Err(CropError::NotReady),
            SessionPhase::Ready => {}
        }
        let (Some(source), Some(state)) = (self.source.as_ref(), self.state.as_ref()) else {
            return Err(CropError::NotReady);
        };
        match rasterize(source, &state.rect) {
            Ok(output) => {
                info!("Committed {}x{} crop", output.width, output.height);
                Ok(output)
            }
            Err(err) => {
                warn!("Commit failed: {err}");
                Err(err)
            }
        }
    }

    /// Discards the session without producing output.
    pub fn cancel(self) {
        info!("Crop session cancelled");
    }
}
