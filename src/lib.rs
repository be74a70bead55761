//! Interactive crop engine.
//!
//! The engine tracks a crop rectangle in image-natural pixels, drives it from
//! pointer gestures through a pure state machine, paints a dimmed overlay with
//! a thirds grid and corner handles, and rasterizes the final selection into
//! a PNG.

/// Aspect ratio presets and centered default rectangles.
pub mod aspect;
/// Persisted settings.
pub mod config;
pub mod error;
/// Crop rectangles, image sizes and integer normalization.
pub mod geometry;
/// Corner and body hit testing.
pub mod hit_test;
/// Display, canvas and image coordinate mapping.
pub mod mapper;
/// Overlay painting onto the canvas backing buffer.
pub mod overlay;
/// Pixel-exact crop extraction and PNG encoding.
pub mod rasterize;
/// Crop session lifecycle.
pub mod session;
/// Source images and background decoding.
pub mod source;
/// Gesture state machine.
pub mod state;

use log::LevelFilter;

pub use aspect::AspectRatio;
pub use config::{CropperSettings, OverlayStyle, default_settings_path};
pub use error::{CropError, Result};
pub use geometry::{CanvasSize, CropRect, ImageSize, MIN_SIZE, PixelRect};
pub use hit_test::{Corner, HitResult, hit_test};
pub use mapper::{CoordinateMapper, LetterboxFit, canvas_size_for, display_to_canvas};
pub use overlay::{OverlayRenderer, render_overlay};
pub use rasterize::{CroppedImage, rasterize};
pub use session::{CropSession, LoadOutcome, SessionPhase};
pub use source::{ImageSource, LoadMessage, SourceImage, spawn_load};
pub use state::{CropEvent, CropState, DragState};

/// Initialize logging once.
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. Repeated
/// calls are ignored.
pub fn init_logging(default_filter: LevelFilter) {
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(default_filter.as_str()),
    );
    if builder.try_init().is_err() {
        // Logger already initialized; nothing to do.
    }
}
